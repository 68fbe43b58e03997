use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::BrokerError;
use crate::remote::responses::{
    AccountResponse, BracketOrderRequest, LatestTradeResponse, NewsResponse, OrderResponse,
    StopLossLeg, TakeProfitLeg,
};
use crate::traits::{Broker, NewsFeed};
use common::config::AlpacaConfig;
use common::models::{NewsItem, OrderAck, OrderSpec, Quote};

const NEWS_PAGE_LIMIT: u32 = 50;

/// REST adapter for the Alpaca trading and market-data APIs. Doubles as the
/// news collaborator since headlines come from the same data host.
#[derive(Clone)]
pub struct AlpacaClient {
    client: Client,
    trading_url: String,
    data_url: String,
    api_key: String,
    api_secret: String,
}

impl AlpacaClient {
    pub fn new(config: &AlpacaConfig) -> Self {
        Self {
            client: Client::new(),
            trading_url: config.trading_url.clone(),
            data_url: config.data_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
    }

    async fn check(resp: Response) -> Result<Response, BrokerError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        error!("Alpaca request failed ({}): {}", status, body);
        Err(BrokerError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

/// Equity prices on the order endpoint must carry at most two decimals.
fn round_to_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

#[async_trait]
impl Broker for AlpacaClient {
    async fn cash(&self) -> Result<f64, BrokerError> {
        let url = format!("{}/v2/account", self.trading_url);
        let resp = Self::check(self.auth(self.client.get(&url)).send().await?).await?;
        let account = resp.json::<AccountResponse>().await?;
        account.cash.parse::<f64>().map_err(|_| {
            BrokerError::Invalid(format!("unparseable cash balance: {}", account.cash))
        })
    }

    async fn last_quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        let url = format!("{}/v2/stocks/{}/trades/latest", self.data_url, symbol);
        let resp = Self::check(self.auth(self.client.get(&url)).send().await?).await?;
        let latest = resp.json::<LatestTradeResponse>().await?;
        Ok(Quote {
            symbol: symbol.to_string(),
            last_price: latest.trade.price,
        })
    }

    async fn clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn submit_bracket(&self, spec: &OrderSpec) -> Result<OrderAck, BrokerError> {
        let body = BracketOrderRequest {
            symbol: spec.symbol.clone(),
            qty: spec.quantity.to_string(),
            side: spec.side.as_str().to_string(),
            order_type: "market".to_string(),
            time_in_force: "gtc".to_string(),
            order_class: "bracket".to_string(),
            client_order_id: Uuid::new_v4().to_string(),
            take_profit: TakeProfitLeg {
                limit_price: format!("{:.2}", round_to_cents(spec.take_profit_price)),
            },
            stop_loss: StopLossLeg {
                stop_price: format!("{:.2}", round_to_cents(spec.stop_loss_price)),
            },
        };

        info!(
            "Placing bracket order: {} {} x{}",
            spec.side, spec.symbol, spec.quantity
        );

        let url = format!("{}/v2/orders", self.trading_url);
        let resp =
            Self::check(self.auth(self.client.post(&url)).json(&body).send().await?).await?;
        let order = resp.json::<OrderResponse>().await?;
        Ok(OrderAck {
            order_id: order.id,
            status: order.status,
        })
    }

    async fn close_all_positions(&self) -> Result<(), BrokerError> {
        let url = format!("{}/v2/positions", self.trading_url);
        info!("Liquidating all open positions");
        Self::check(self.auth(self.client.delete(&url)).send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl NewsFeed for AlpacaClient {
    async fn headlines(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsItem>, BrokerError> {
        let url = format!("{}/v1beta1/news", self.data_url);
        let req = self
            .auth(self.client.get(&url))
            .query(&[
                ("symbols", symbol.to_string()),
                ("start", start.to_string()),
                ("end", end.to_string()),
                ("limit", NEWS_PAGE_LIMIT.to_string()),
            ]);
        let resp = Self::check(req.send().await?).await?;
        let page = resp.json::<NewsResponse>().await?;
        Ok(page
            .news
            .into_iter()
            .map(|article| NewsItem {
                headline: article.headline,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cent_rounding_for_order_legs() {
        assert_eq!(round_to_cents(123.4567), 123.46);
        assert_eq!(round_to_cents(99.994), 99.99);
        assert_eq!(round_to_cents(99.996), 100.0);
        assert_eq!(round_to_cents(95.0), 95.0);
    }
}
