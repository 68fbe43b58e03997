use chrono::NaiveDate;
use std::env;
use thiserror::Error;

const DEFAULT_SYMBOL: &str = "SPY";
const DEFAULT_CASH_RISK: f64 = 0.5;
const DEFAULT_SENTIMENT_THRESHOLD: f64 = 0.99;
const DEFAULT_TAKE_PROFIT_BUY: f64 = 1.25;
const DEFAULT_STOP_LOSS_BUY: f64 = 0.95;
const DEFAULT_TAKE_PROFIT_SELL: f64 = 0.75;
const DEFAULT_STOP_LOSS_SELL: f64 = 1.05;
const DEFAULT_MODEL_PATH: &str = "models/finbert.onnx";
const DEFAULT_TOKENIZER_PATH: &str = "models/finbert-tokenizer.json";
const DEFAULT_TRADING_URL: &str = "https://paper-api.alpaca.markets";
const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";
const DEFAULT_PAPER_START: &str = "2021-01-01";
const DEFAULT_PAPER_END: &str = "2024-11-30";
const DEFAULT_PAPER_CASH: f64 = 100_000.0;
const DEFAULT_PAPER_PRICE: f64 = 400.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials and endpoints for the live broker adapter.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub trading_url: String,
    pub data_url: String,
}

/// Date range and seed state for a simulated session.
#[derive(Debug, Clone)]
pub struct PaperSession {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub starting_cash: f64,
    pub flat_price: f64,
}

#[derive(Debug, Clone)]
pub enum Mode {
    Live(AlpacaConfig),
    Paper(PaperSession),
}

/// Static process configuration, loaded once at startup. No dynamic
/// reconfiguration; credentials come from the environment, never source.
#[derive(Debug, Clone)]
pub struct Config {
    pub symbol: String,
    pub cash_risk: f64,
    pub sentiment_threshold: f64,
    pub take_profit_buy: f64,
    pub stop_loss_buy: f64,
    pub take_profit_sell: f64,
    pub stop_loss_sell: f64,
    pub model_path: String,
    pub tokenizer_path: String,
    pub mode: Mode,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match var("TRADING_MODE").as_deref() {
            Some("live") => Mode::Live(AlpacaConfig {
                api_key: var("APCA_API_KEY_ID").ok_or(ConfigError::Missing("APCA_API_KEY_ID"))?,
                api_secret: var("APCA_API_SECRET_KEY")
                    .ok_or(ConfigError::Missing("APCA_API_SECRET_KEY"))?,
                trading_url: var("APCA_TRADING_URL")
                    .unwrap_or_else(|| DEFAULT_TRADING_URL.to_string()),
                data_url: var("APCA_DATA_URL").unwrap_or_else(|| DEFAULT_DATA_URL.to_string()),
            }),
            // Anything else runs against the deterministic paper broker.
            _ => Mode::Paper(PaperSession {
                start: parse_date("BACKTEST_START", var("BACKTEST_START"), DEFAULT_PAPER_START)?,
                end: parse_date("BACKTEST_END", var("BACKTEST_END"), DEFAULT_PAPER_END)?,
                starting_cash: parse_positive(
                    "PAPER_CASH",
                    var("PAPER_CASH"),
                    DEFAULT_PAPER_CASH,
                )?,
                flat_price: parse_positive("PAPER_PRICE", var("PAPER_PRICE"), DEFAULT_PAPER_PRICE)?,
            }),
        };

        Ok(Self {
            symbol: var("SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            cash_risk: parse_fraction("CASH_RISK", var("CASH_RISK"), DEFAULT_CASH_RISK)?,
            sentiment_threshold: parse_fraction(
                "SENTIMENT_THRESHOLD",
                var("SENTIMENT_THRESHOLD"),
                DEFAULT_SENTIMENT_THRESHOLD,
            )?,
            take_profit_buy: parse_positive(
                "TAKE_PROFIT_BUY",
                var("TAKE_PROFIT_BUY"),
                DEFAULT_TAKE_PROFIT_BUY,
            )?,
            stop_loss_buy: parse_positive(
                "STOP_LOSS_BUY",
                var("STOP_LOSS_BUY"),
                DEFAULT_STOP_LOSS_BUY,
            )?,
            take_profit_sell: parse_positive(
                "TAKE_PROFIT_SELL",
                var("TAKE_PROFIT_SELL"),
                DEFAULT_TAKE_PROFIT_SELL,
            )?,
            stop_loss_sell: parse_positive(
                "STOP_LOSS_SELL",
                var("STOP_LOSS_SELL"),
                DEFAULT_STOP_LOSS_SELL,
            )?,
            model_path: var("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            tokenizer_path: var("TOKENIZER_PATH")
                .unwrap_or_else(|| DEFAULT_TOKENIZER_PATH.to_string()),
            mode,
        })
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_f64(name: &'static str, raw: Option<String>, default: f64) -> Result<f64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse::<f64>()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

/// Fraction parameters must land in [0, 1].
fn parse_fraction(
    name: &'static str,
    raw: Option<String>,
    default: f64,
) -> Result<f64, ConfigError> {
    let value = parse_f64(name, raw, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Price multipliers and seed amounts must be strictly positive.
fn parse_positive(
    name: &'static str,
    raw: Option<String>,
    default: f64,
) -> Result<f64, ConfigError> {
    let value = parse_f64(name, raw, default)?;
    if value <= 0.0 || !value.is_finite() {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn parse_date(
    name: &'static str,
    raw: Option<String>,
    default: &str,
) -> Result<NaiveDate, ConfigError> {
    let v = raw.unwrap_or_else(|| default.to_string());
    NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|_| ConfigError::Invalid { name, value: v })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_defaults_when_unset() {
        let v = parse_fraction("CASH_RISK", None, 0.5).unwrap();
        assert_eq!(v, 0.5);
    }

    #[test]
    fn fraction_rejects_out_of_range() {
        assert!(parse_fraction("CASH_RISK", Some("1.5".into()), 0.5).is_err());
        assert!(parse_fraction("CASH_RISK", Some("-0.1".into()), 0.5).is_err());
    }

    #[test]
    fn fraction_rejects_garbage() {
        assert!(parse_fraction("SENTIMENT_THRESHOLD", Some("lots".into()), 0.99).is_err());
    }

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(parse_positive("TAKE_PROFIT_BUY", Some("0".into()), 1.25).is_err());
        assert!(parse_positive("TAKE_PROFIT_BUY", Some("-1.25".into()), 1.25).is_err());
        assert_eq!(
            parse_positive("TAKE_PROFIT_BUY", Some("1.25".into()), 1.0).unwrap(),
            1.25
        );
    }

    #[test]
    fn date_parses_calendar_days() {
        let d = parse_date("BACKTEST_START", Some("2021-01-01".into()), "2020-01-01").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert!(parse_date("BACKTEST_START", Some("01/01/2021".into()), "2020-01-01").is_err());
    }
}
