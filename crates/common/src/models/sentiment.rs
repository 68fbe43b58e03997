#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// Aggregate sentiment for a batch of headlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub probability: f64,
    pub label: SentimentLabel,
}

impl SentimentScore {
    /// Fail-safe default: suppresses trading rather than erring.
    pub fn neutral() -> Self {
        Self {
            probability: 0.0,
            label: SentimentLabel::Neutral,
        }
    }
}
