use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("broker rejected request ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("{0}")]
    Invalid(String),
}
