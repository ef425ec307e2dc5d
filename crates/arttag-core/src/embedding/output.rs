//! Selection of the embedding tensor among an ONNX model's outputs.
//!
//! CLIP exports do not agree on what they emit. Some produce the projected
//! cross-modal embedding (`image_embeds` / `text_embeds`), some only the pooled
//! encoder state, and some a bare token sequence. The output to read is chosen
//! once, when the session is loaded, from the declared output names.

use thiserror::Error;

/// Name of the pooled encoder output in Hugging Face exports.
const POOLER_OUTPUT: &str = "pooler_output";

/// The model output an encoder reads its embeddings from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingOutput {
    /// Projected embedding aligned across modalities.
    Projected(String),
    /// Pooled encoder output.
    Pooled(String),
    /// First declared output, used when nothing better is exported.
    First(String),
}

/// The selected output tensor does not have a usable shape.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unexpected shape {shape:?} for output {output:?} (batch of {batch})")]
pub struct OutputShapeError {
    pub output: String,
    pub shape: Vec<i64>,
    pub batch: usize,
}

impl EmbeddingOutput {
    /// Pick the output to read, in priority order: `projected`, then
    /// `pooler_output`, then the first declared output.
    ///
    /// Returns `None` only when the model declares no outputs.
    pub fn resolve<S: AsRef<str>>(output_names: &[S], projected: &str) -> Option<Self> {
        let has = |wanted: &str| output_names.iter().any(|n| n.as_ref() == wanted);

        if has(projected) {
            Some(Self::Projected(projected.to_string()))
        } else if has(POOLER_OUTPUT) {
            Some(Self::Pooled(POOLER_OUTPUT.to_string()))
        } else {
            output_names
                .first()
                .map(|n| Self::First(n.as_ref().to_string()))
        }
    }

    /// Output tensor name.
    pub fn name(&self) -> &str {
        match self {
            Self::Projected(name) | Self::Pooled(name) | Self::First(name) => name,
        }
    }

    /// Split a flat output tensor into one row per batch item.
    ///
    /// Accepts `[D]` (single item), `[N, D]`, and `[N, S, D]` token sequences,
    /// from which the first token of each item is taken. Rows are returned as
    /// produced; normalization is the caller's job.
    pub fn rows(
        &self,
        shape: &[i64],
        data: &[f32],
        batch: usize,
    ) -> Result<Vec<Vec<f32>>, OutputShapeError> {
        self.select_rows(shape, data, batch, |_| Some(0))
    }

    /// Like [`EmbeddingOutput::rows`], but a token sequence is pooled at
    /// `positions[i]` for item `i` instead of the first token.
    ///
    /// Causal encoders (CLIP text) summarize a sequence at its end token, so
    /// their callers pass the last attended position of each item.
    pub fn rows_at(
        &self,
        shape: &[i64],
        data: &[f32],
        batch: usize,
        positions: &[usize],
    ) -> Result<Vec<Vec<f32>>, OutputShapeError> {
        if positions.len() != batch {
            return Err(self.shape_error(shape, batch));
        }
        self.select_rows(shape, data, batch, |i| positions.get(i).copied())
    }

    fn shape_error(&self, shape: &[i64], batch: usize) -> OutputShapeError {
        OutputShapeError {
            output: self.name().to_string(),
            shape: shape.to_vec(),
            batch,
        }
    }

    fn select_rows(
        &self,
        shape: &[i64],
        data: &[f32],
        batch: usize,
        token: impl Fn(usize) -> Option<usize>,
    ) -> Result<Vec<Vec<f32>>, OutputShapeError> {
        let err = || self.shape_error(shape, batch);
        let dims: Vec<usize> = shape
            .iter()
            .map(|&d| usize::try_from(d).map_err(|_| err()))
            .collect::<Result<_, _>>()?;

        match dims.as_slice() {
            [dim] if batch == 1 && *dim > 0 && data.len() == *dim => Ok(vec![data.to_vec()]),
            [n, dim] if *n == batch && *dim > 0 && data.len() == n * dim => {
                Ok(data.chunks(*dim).map(<[f32]>::to_vec).collect())
            }
            [n, seq, dim] if *n == batch && *seq > 0 && *dim > 0 && data.len() == n * seq * dim => {
                (0..*n)
                    .map(|i| {
                        let t = token(i).filter(|&t| t < *seq).ok_or_else(err)?;
                        let start = (i * seq + t) * dim;
                        Ok(data[start..start + dim].to_vec())
                    })
                    .collect()
            }
            _ => Err(err()),
        }
    }
}
