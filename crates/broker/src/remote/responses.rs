use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    pub cash: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct LatestTradeResponse {
    pub symbol: String,
    pub trade: LatestTrade,
}

#[derive(Debug, Deserialize)]
pub struct LatestTrade {
    #[serde(rename = "p")]
    pub price: f64,
    #[serde(rename = "t")]
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    pub news: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
pub struct NewsArticle {
    pub headline: String,
}

#[derive(Debug, Serialize)]
pub struct BracketOrderRequest {
    pub symbol: String,
    pub qty: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    pub order_class: String,
    pub client_order_id: String,
    pub take_profit: TakeProfitLeg,
    pub stop_loss: StopLossLeg,
}

#[derive(Debug, Serialize)]
pub struct TakeProfitLeg {
    pub limit_price: String,
}

#[derive(Debug, Serialize)]
pub struct StopLossLeg {
    pub stop_price: String,
}
