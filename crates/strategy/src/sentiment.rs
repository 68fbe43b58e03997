use std::cmp::Ordering;
use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};
use tracing::{error, info};

use crate::inference::{CLASS_LABELS, SentimentModel};
use common::models::SentimentScore;

/// Scores a batch of headlines as one aggregate signal. Infallible by
/// contract: every failure path degrades to the neutral default.
pub struct SentimentScorer {
    model: Arc<dyn SentimentModel>,
}

impl SentimentScorer {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self { model }
    }

    pub fn estimate(&self, headlines: &[String]) -> SentimentScore {
        let filtered: Vec<String> = headlines
            .iter()
            .filter(|h| !h.trim().is_empty())
            .cloned()
            .collect();

        if filtered.is_empty() {
            info!("No scoreable headlines; defaulting to neutral sentiment.");
            return SentimentScore::neutral();
        }

        let per_headline = match self.model.logits(&filtered) {
            Ok(logits) => logits,
            Err(e) => {
                error!("Sentiment inference failed: {}", e);
                return SentimentScore::neutral();
            }
        };

        // Sum logits across the batch, then softmax the summed vector. The
        // headlines act as one aggregate signal, not as per-headline votes;
        // averaging post-softmax probabilities would change the result.
        let flat: Vec<f32> = per_headline.iter().flatten().copied().collect();
        let logits = match Array2::from_shape_vec((per_headline.len(), CLASS_LABELS.len()), flat) {
            Ok(arr) => arr,
            Err(e) => {
                error!("Malformed logit batch: {}", e);
                return SentimentScore::neutral();
            }
        };

        let probabilities = softmax(logits.sum_axis(Axis(0)));
        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal));

        match best {
            Some((index, &probability)) => SentimentScore {
                probability: probability as f64,
                label: CLASS_LABELS[index],
            },
            None => SentimentScore::neutral(),
        }
    }
}

fn softmax(mut logits: Array1<f32>) -> Array1<f32> {
    // Shift by the max for numerical stability.
    let max = logits.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    logits.mapv_inplace(|v| (v - max).exp());
    let total = logits.sum();
    logits / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceError;
    use common::models::SentimentLabel;

    struct FixedModel(Vec<[f32; 3]>);

    impl SentimentModel for FixedModel {
        fn logits(&self, texts: &[String]) -> Result<Vec<[f32; 3]>, InferenceError> {
            assert_eq!(texts.len(), self.0.len(), "unexpected filtered batch size");
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    impl SentimentModel for FailingModel {
        fn logits(&self, _texts: &[String]) -> Result<Vec<[f32; 3]>, InferenceError> {
            Err(InferenceError::Model("simulated inference failure".into()))
        }
    }

    fn scorer(model: impl SentimentModel + 'static) -> SentimentScorer {
        SentimentScorer::new(Arc::new(model))
    }

    #[test]
    fn empty_headlines_default_to_neutral() {
        let score = scorer(FixedModel(vec![])).estimate(&[]);
        assert_eq!(score, SentimentScore::neutral());
    }

    #[test]
    fn whitespace_only_headlines_default_to_neutral_without_inference() {
        let headlines = vec!["   ".to_string(), "\t\n".to_string(), String::new()];
        // FixedModel asserts on batch size; an invocation would panic here.
        let score = scorer(FixedModel(vec![])).estimate(&headlines);
        assert_eq!(score, SentimentScore::neutral());
    }

    #[test]
    fn inference_failure_is_swallowed_and_neutral() {
        let headlines = vec!["Markets rally on earnings beat".to_string()];
        let score = scorer(FailingModel).estimate(&headlines);
        assert_eq!(score, SentimentScore::neutral());
    }

    #[test]
    fn strong_positive_single_headline() {
        let headlines = vec!["Record profits announced".to_string()];
        let score = scorer(FixedModel(vec![[8.0, 0.0, 0.0]])).estimate(&headlines);
        assert_eq!(score.label, SentimentLabel::Positive);
        assert!(score.probability > 0.99);
    }

    #[test]
    fn logits_are_summed_before_softmax() {
        // Two identical rows: softmax(sum) = softmax([2, 4, 0]) gives
        // p(negative) ~= 0.8668, while averaging per-row softmax outputs
        // would give ~0.6652. The former pins the aggregation policy.
        let headlines = vec!["a".to_string(), "b".to_string()];
        let score = scorer(FixedModel(vec![[1.0, 2.0, 0.0], [1.0, 2.0, 0.0]])).estimate(&headlines);
        assert_eq!(score.label, SentimentLabel::Negative);
        assert!((score.probability - 0.86681).abs() < 1e-3);
    }

    #[test]
    fn blank_headlines_are_filtered_before_scoring() {
        let headlines = vec![
            "Guidance cut sharply".to_string(),
            "  ".to_string(),
            "Layoffs announced".to_string(),
        ];
        // Model expects exactly the two non-blank headlines.
        let score = scorer(FixedModel(vec![[0.0, 5.0, 0.0], [0.0, 5.0, 0.0]]))
            .estimate(&headlines);
        assert_eq!(score.label, SentimentLabel::Negative);
    }
}
