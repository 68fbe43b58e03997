use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tract_onnx::prelude::*;
use tracing::info;

use common::models::SentimentLabel;

/// Class order of the FinBERT sequence-classification head.
pub const CLASS_LABELS: [SentimentLabel; 3] = [
    SentimentLabel::Positive,
    SentimentLabel::Negative,
    SentimentLabel::Neutral,
];

/// BERT positional-embedding limit; longer headlines are truncated.
const MAX_SEQUENCE_LEN: usize = 512;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("model execution failed: {0}")]
    Model(String),

    #[error("unexpected model output shape: {0}")]
    OutputShape(String),
}

/// A pretrained 3-class text classifier. Returns per-input logits in
/// [`CLASS_LABELS`] order; aggregation across inputs is the scorer's job.
pub trait SentimentModel: Send + Sync {
    fn logits(&self, texts: &[String]) -> Result<Vec<[f32; 3]>, InferenceError>;
}

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// FinBERT over tract-onnx. The graph and tokenizer are loaded once at
/// process start and reused for every scoring call.
pub struct FinbertModel {
    plan: Arc<RunnableModel>,
    tokenizer: Tokenizer,
}

impl FinbertModel {
    pub fn load(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
    ) -> Result<Self, InferenceError> {
        let mut tokenizer = Tokenizer::from_file(tokenizer_path.as_ref())
            .map_err(|e| InferenceError::Tokenize(e.to_string()))?;
        tokenizer.with_padding(Some(PaddingParams::default()));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..TruncationParams::default()
            }))
            .map_err(|e| InferenceError::Tokenize(e.to_string()))?;

        info!("Loading ONNX model from {:?}", model_path.as_ref());
        let plan =
            Self::load_plan(model_path.as_ref()).map_err(|e| InferenceError::Model(e.to_string()))?;

        Ok(Self {
            plan: Arc::new(plan),
            tokenizer,
        })
    }

    fn load_plan(path: &Path) -> TractResult<RunnableModel> {
        let mut model = tract_onnx::onnx().model_for_path(path)?;
        // Batch and sequence length vary per call; keep both symbolic.
        let batch = model.symbols.sym("batch").to_dim();
        let seq = model.symbols.sym("sequence").to_dim();
        let fact = InferenceFact::dt_shape(i64::datum_type(), tvec!(batch, seq));
        model.set_input_fact(0, fact.clone())?;
        model.set_input_fact(1, fact)?;
        model.into_optimized()?.into_runnable()
    }
}

impl SentimentModel for FinbertModel {
    fn logits(&self, texts: &[String]) -> Result<Vec<[f32; 3]>, InferenceError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| InferenceError::Tokenize(e.to_string()))?;

        let rows = encodings.len();
        let cols = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = tract_ndarray::Array2::<i64>::zeros((rows, cols));
        let mut attention_mask = tract_ndarray::Array2::<i64>::zeros((rows, cols));
        for (row, encoding) in encodings.iter().enumerate() {
            for (col, (&id, &mask)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .enumerate()
            {
                input_ids[[row, col]] = id as i64;
                attention_mask[[row, col]] = mask as i64;
            }
        }

        let outputs = self
            .plan
            .run(tvec!(
                input_ids.into_tensor().into(),
                attention_mask.into_tensor().into()
            ))
            .map_err(|e| InferenceError::Model(e.to_string()))?;

        let logits = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Model(e.to_string()))?
            .into_dimensionality::<tract_ndarray::Ix2>()
            .map_err(|e| InferenceError::OutputShape(e.to_string()))?
            .to_owned();

        if logits.nrows() != rows || logits.ncols() != CLASS_LABELS.len() {
            return Err(InferenceError::OutputShape(format!(
                "expected {}x{}, got {}x{}",
                rows,
                CLASS_LABELS.len(),
                logits.nrows(),
                logits.ncols()
            )));
        }

        Ok(logits
            .outer_iter()
            .map(|row| [row[0], row[1], row[2]])
            .collect())
    }
}
