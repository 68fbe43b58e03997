use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::BrokerError;
use crate::traits::{Broker, NewsFeed};
use common::models::{NewsItem, OrderAck, OrderSpec, Quote, Side};

struct PaperState {
    cash: f64,
    last_price: f64,
    clock: DateTime<Utc>,
    /// Signed share count; negative while short.
    position: i64,
    next_order_id: u64,
    submitted: Vec<OrderSpec>,
    liquidations: u32,
    headlines: Vec<NewsItem>,
    fail_submissions: bool,
    fail_news: bool,
}

/// Deterministic in-memory broker: no network I/O, no randomness. Fills are
/// immediate at the current flat price. Serves as the simulated-session
/// collaborator and as a fixture for integration tests.
pub struct PaperBroker {
    state: Mutex<PaperState>,
}

impl PaperBroker {
    pub fn new(starting_cash: f64, last_price: f64, start: NaiveDate) -> Self {
        Self {
            state: Mutex::new(PaperState {
                cash: starting_cash,
                last_price,
                clock: midnight(start),
                position: 0,
                next_order_id: 1,
                submitted: Vec::new(),
                liquidations: 0,
                headlines: Vec::new(),
                fail_submissions: false,
                fail_news: false,
            }),
        }
    }

    pub async fn set_clock(&self, date: NaiveDate) {
        self.state.lock().await.clock = midnight(date);
    }

    pub async fn set_price(&self, last_price: f64) {
        self.state.lock().await.last_price = last_price;
    }

    pub async fn set_headlines(&self, headlines: Vec<String>) {
        self.state.lock().await.headlines = headlines
            .into_iter()
            .map(|headline| NewsItem { headline })
            .collect();
    }

    pub async fn fail_submissions(&self, fail: bool) {
        self.state.lock().await.fail_submissions = fail;
    }

    pub async fn fail_news(&self, fail: bool) {
        self.state.lock().await.fail_news = fail;
    }

    pub async fn submitted_orders(&self) -> Vec<OrderSpec> {
        self.state.lock().await.submitted.clone()
    }

    pub async fn liquidation_count(&self) -> u32 {
        self.state.lock().await.liquidations
    }

    pub async fn position(&self) -> i64 {
        self.state.lock().await.position
    }

    pub async fn cash_balance(&self) -> f64 {
        self.state.lock().await.cash
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[async_trait]
impl Broker for PaperBroker {
    async fn cash(&self) -> Result<f64, BrokerError> {
        Ok(self.state.lock().await.cash)
    }

    async fn last_quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        Ok(Quote {
            symbol: symbol.to_string(),
            last_price: self.state.lock().await.last_price,
        })
    }

    async fn clock(&self) -> DateTime<Utc> {
        self.state.lock().await.clock
    }

    async fn submit_bracket(&self, spec: &OrderSpec) -> Result<OrderAck, BrokerError> {
        let mut state = self.state.lock().await;
        if state.fail_submissions {
            return Err(BrokerError::Api {
                status: 403,
                body: "simulated rejection".to_string(),
            });
        }

        let notional = spec.quantity as f64 * state.last_price;
        match spec.side {
            Side::Buy => {
                state.cash -= notional;
                state.position += spec.quantity as i64;
            }
            Side::Sell => {
                state.cash += notional;
                state.position -= spec.quantity as i64;
            }
        }

        let order_id = format!("ORD-{:06}", state.next_order_id);
        state.next_order_id += 1;
        state.submitted.push(spec.clone());

        info!(
            "Paper fill: {} {} x{} @ {:.2}",
            spec.side, spec.symbol, spec.quantity, state.last_price
        );

        Ok(OrderAck {
            order_id,
            status: "filled".to_string(),
        })
    }

    async fn close_all_positions(&self) -> Result<(), BrokerError> {
        let mut state = self.state.lock().await;
        let proceeds = state.position as f64 * state.last_price;
        state.cash += proceeds;
        state.position = 0;
        state.liquidations += 1;
        Ok(())
    }
}

#[async_trait]
impl NewsFeed for PaperBroker {
    async fn headlines(
        &self,
        _symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<NewsItem>, BrokerError> {
        let state = self.state.lock().await;
        if state.fail_news {
            return Err(BrokerError::Api {
                status: 503,
                body: "simulated news outage".to_string(),
            });
        }
        Ok(state.headlines.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(side: Side, quantity: u64) -> OrderSpec {
        OrderSpec {
            symbol: "SPY".to_string(),
            quantity,
            side,
            take_profit_price: 125.0,
            stop_loss_price: 95.0,
        }
    }

    #[tokio::test]
    async fn buy_then_liquidate_restores_cash_at_flat_price() {
        let broker = PaperBroker::new(10_000.0, 100.0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        broker.submit_bracket(&spec(Side::Buy, 50)).await.unwrap();
        assert_eq!(broker.cash_balance().await, 5_000.0);
        assert_eq!(broker.position().await, 50);

        broker.close_all_positions().await.unwrap();
        assert_eq!(broker.cash_balance().await, 10_000.0);
        assert_eq!(broker.position().await, 0);
        assert_eq!(broker.liquidation_count().await, 1);
    }

    #[tokio::test]
    async fn injected_rejection_leaves_state_untouched() {
        let broker = PaperBroker::new(10_000.0, 100.0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        broker.fail_submissions(true).await;

        let err = broker.submit_bracket(&spec(Side::Buy, 50)).await.unwrap_err();
        assert!(matches!(err, BrokerError::Api { status: 403, .. }));
        assert_eq!(broker.cash_balance().await, 10_000.0);
        assert!(broker.submitted_orders().await.is_empty());
    }

    #[tokio::test]
    async fn deterministic_order_ids() {
        let broker = PaperBroker::new(50_000.0, 100.0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let first = broker.submit_bracket(&spec(Side::Buy, 1)).await.unwrap();
        let second = broker.submit_bracket(&spec(Side::Sell, 1)).await.unwrap();
        assert_eq!(first.order_id, "ORD-000001");
        assert_eq!(second.order_id, "ORD-000002");
    }
}
