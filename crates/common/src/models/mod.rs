pub mod news;
pub mod order;
pub mod position;
pub mod quote;
pub mod sentiment;

pub use news::NewsItem;
pub use order::{OrderAck, OrderSpec, Side};
pub use position::PositionSize;
pub use quote::Quote;
pub use sentiment::{SentimentLabel, SentimentScore};
