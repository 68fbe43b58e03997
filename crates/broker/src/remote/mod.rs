pub mod alpaca_client;
pub mod responses;

pub use alpaca_client::AlpacaClient;
