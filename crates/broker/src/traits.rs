use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::BrokerError;
use common::models::{NewsItem, OrderAck, OrderSpec, Quote};

/// Brokerage primitives the strategy relies on. Live adapters call out over
/// the network; the paper broker answers from in-memory state.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Free cash available to the strategy.
    async fn cash(&self) -> Result<f64, BrokerError>;

    /// Latest traded price for a symbol, fetched fresh each call.
    async fn last_quote(&self, symbol: &str) -> Result<Quote, BrokerError>;

    /// The broker's notion of "now". Simulated brokers return virtual time.
    async fn clock(&self) -> DateTime<Utc>;

    /// Submit a bracket order (entry plus take-profit and stop-loss legs).
    async fn submit_bracket(&self, spec: &OrderSpec) -> Result<OrderAck, BrokerError>;

    /// Liquidate every open position held by the strategy.
    async fn close_all_positions(&self) -> Result<(), BrokerError>;
}

/// Headline source for the sentiment window. Date bounds are calendar days,
/// inclusive on both ends.
#[async_trait]
pub trait NewsFeed: Send + Sync {
    async fn headlines(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsItem>, BrokerError>;
}
