use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info};

use crate::sentiment::SentimentScorer;
use crate::sizing::position_size;
use broker::error::BrokerError;
use broker::traits::{Broker, NewsFeed};
use common::config::Config;
use common::models::{OrderSpec, PositionSize, SentimentLabel, Side};

/// Trailing window of calendar days of news feeding each decision.
const NEWS_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone)]
pub struct StrategyParams {
    pub symbol: String,
    pub cash_risk: f64,
    pub sentiment_threshold: f64,
    pub take_profit_buy: f64,
    pub stop_loss_buy: f64,
    pub take_profit_sell: f64,
    pub stop_loss_sell: f64,
}

impl From<&Config> for StrategyParams {
    fn from(config: &Config) -> Self {
        Self {
            symbol: config.symbol.clone(),
            cash_risk: config.cash_risk,
            sentiment_threshold: config.sentiment_threshold,
            take_profit_buy: config.take_profit_buy,
            stop_loss_buy: config.stop_loss_buy,
            take_profit_sell: config.take_profit_sell,
            stop_loss_sell: config.stop_loss_sell,
        }
    }
}

/// One sentiment-driven strategy over a single symbol. Runs one iteration
/// per tick; `last_trade` is the only state carried across iterations and
/// changes only after a successful submission.
pub struct StrategyService<B, N> {
    params: StrategyParams,
    broker: Arc<B>,
    news: Arc<N>,
    scorer: SentimentScorer,
    last_trade: Option<Side>,
}

impl<B: Broker, N: NewsFeed> StrategyService<B, N> {
    pub fn new(params: StrategyParams, broker: Arc<B>, news: Arc<N>, scorer: SentimentScorer) -> Self {
        Self {
            params,
            broker,
            news,
            scorer,
            last_trade: None,
        }
    }

    pub fn last_trade(&self) -> Option<Side> {
        self.last_trade
    }

    /// Live driver: one iteration per period, each running to completion
    /// before the next tick fires.
    pub async fn start(mut self, period: Duration) {
        info!(
            "Starting sentiment strategy for {} (tick every {:?})",
            self.params.symbol, period
        );
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.on_trading_iteration().await;
        }
    }

    pub async fn on_trading_iteration(&mut self) {
        let sized = match self.position_sizing().await {
            Ok(sized) => sized,
            Err(e) => {
                error!("Broker query failed, skipping this iteration: {}", e);
                return;
            }
        };

        if sized.quantity == 0 {
            info!("Quantity is zero; skipping trade execution.");
            return;
        }
        if sized.cash < sized.last_price {
            info!("Not enough cash to open a position.");
            return;
        }

        let headlines = self.gather_headlines().await;
        let score = self.scorer.estimate(&headlines);
        debug!(
            "Sentiment for {}: {} (p={:.4}, {} headlines)",
            self.params.symbol,
            score.label,
            score.probability,
            headlines.len()
        );

        match score.label {
            SentimentLabel::Positive if score.probability >= self.params.sentiment_threshold => {
                if !self.unwind_if_opposing(Side::Buy).await {
                    return;
                }
                self.execute_trade(Side::Buy, sized.quantity, sized.last_price)
                    .await;
            }
            SentimentLabel::Negative if score.probability >= self.params.sentiment_threshold => {
                if !self.unwind_if_opposing(Side::Sell).await {
                    return;
                }
                self.execute_trade(Side::Sell, sized.quantity, sized.last_price)
                    .await;
            }
            _ => {
                info!("Sentiment not strong enough; no trade executed.");
            }
        }
    }

    async fn position_sizing(&self) -> Result<PositionSize, BrokerError> {
        let cash = self.broker.cash().await?;
        let quote = self.broker.last_quote(&self.params.symbol).await?;
        Ok(position_size(cash, self.params.cash_risk, quote.last_price))
    }

    fn news_window(&self, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        let today = now.date_naive();
        (today - chrono::Duration::days(NEWS_WINDOW_DAYS), today)
    }

    /// News failures degrade to an empty headline set, which scores neutral.
    async fn gather_headlines(&self) -> Vec<String> {
        let now = self.broker.clock().await;
        let (start, end) = self.news_window(now);
        match self.news.headlines(&self.params.symbol, start, end).await {
            Ok(items) => items.into_iter().map(|item| item.headline).collect(),
            Err(e) => {
                error!("Error getting news for {}: {}", self.params.symbol, e);
                Vec::new()
            }
        }
    }

    /// Closes all open positions before a reversing trade. Returns false if
    /// the unwind failed, in which case the new trade is abandoned for this
    /// iteration.
    async fn unwind_if_opposing(&mut self, incoming: Side) -> bool {
        let opposing = match incoming {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };
        if self.last_trade != Some(opposing) {
            return true;
        }
        match self.broker.close_all_positions().await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "Failed to close opposing position, holding off on {}: {}",
                    incoming, e
                );
                false
            }
        }
    }

    async fn execute_trade(&mut self, side: Side, quantity: u64, last_price: f64) {
        let (take_profit, stop_loss) = match side {
            Side::Buy => (
                last_price * self.params.take_profit_buy,
                last_price * self.params.stop_loss_buy,
            ),
            Side::Sell => (
                last_price * self.params.take_profit_sell,
                last_price * self.params.stop_loss_sell,
            ),
        };

        let spec = OrderSpec {
            symbol: self.params.symbol.clone(),
            quantity,
            side,
            take_profit_price: take_profit,
            stop_loss_price: stop_loss,
        };

        match self.broker.submit_bracket(&spec).await {
            Ok(ack) => {
                info!(
                    "Submitted {} bracket order for {} x{} (order {}, {})",
                    side, spec.symbol, quantity, ack.order_id, ack.status
                );
                self.last_trade = Some(side);
            }
            Err(e) => {
                // The failed attempt is not treated as having occurred.
                error!("Failed to submit {} order: {}", side, e);
            }
        }
    }
}
