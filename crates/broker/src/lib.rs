pub mod error;
pub mod paper;
pub mod remote;
pub mod traits;

pub use error::BrokerError;
pub use paper::PaperBroker;
pub use traits::{Broker, NewsFeed};
