use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use tracing::{debug, info};

use broker::PaperBroker;
use broker::remote::AlpacaClient;
use common::config::{Config, Mode};
use common::logger;
use strategy::inference::FinbertModel;
use strategy::sentiment::SentimentScorer;
use strategy::services::{StrategyParams, StrategyService};

const TICK_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    debug!("System starting up...");

    let config = Config::from_env()?;
    info!(
        "Strategy config: symbol={} cash_risk={:.2} sentiment_threshold={:.2}",
        config.symbol, config.cash_risk, config.sentiment_threshold
    );

    info!("Loading sentiment model: {}", config.model_path);
    let model = FinbertModel::load(&config.model_path, &config.tokenizer_path)?;
    let scorer = SentimentScorer::new(Arc::new(model));
    let params = StrategyParams::from(&config);

    match &config.mode {
        Mode::Live(alpaca) => {
            let client = Arc::new(AlpacaClient::new(alpaca));
            let service = StrategyService::new(params, client.clone(), client, scorer);
            service.start(TICK_PERIOD).await;
        }
        Mode::Paper(session) => {
            info!(
                "Paper session {} -> {} (cash {:.2}, flat price {:.2})",
                session.start, session.end, session.starting_cash, session.flat_price
            );
            let broker = Arc::new(PaperBroker::new(
                session.starting_cash,
                session.flat_price,
                session.start,
            ));
            let mut service = StrategyService::new(params, broker.clone(), broker.clone(), scorer);

            let mut date = session.start;
            while date <= session.end {
                broker.set_clock(date).await;
                service.on_trading_iteration().await;
                date = match date.succ_opt() {
                    Some(next) => next,
                    None => break,
                };
            }

            info!(
                "Paper session complete: {} orders submitted, {} liquidations, final cash {:.2}",
                broker.submitted_orders().await.len(),
                broker.liquidation_count().await,
                broker.cash_balance().await
            );
        }
    }

    Ok(())
}
