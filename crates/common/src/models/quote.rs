#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub last_price: f64,
}
