//! CLIP vision encoder session management and inference.
//!
//! Loads a CLIP visual encoder exported to ONNX format and runs inference to
//! produce 512-dimensional image embedding vectors.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

use super::output::EmbeddingOutput;

/// Projected output name of CLIP vision exports.
const IMAGE_EMBEDS: &str = "image_embeds";

/// Wraps an ONNX Runtime session for CLIP visual embedding.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct ClipVisionSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    /// Output the embedding is read from.
    output: EmbeddingOutput,
}

impl ClipVisionSession {
    /// Load a CLIP visual encoder from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load vision model {:?}: {e}", model_path),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        let output =
            EmbeddingOutput::resolve(&output_names, IMAGE_EMBEDS).ok_or_else(|| {
                PipelineError::Model {
                    message: format!("Vision model {:?} declares no outputs", model_path),
                }
            })?;

        tracing::debug!(
            "Loaded CLIP vision model from {:?} (input: {:?}, outputs: {:?}, using: {:?})",
            model_path,
            input_name,
            output_names,
            output
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output,
        })
    }

    /// Run inference on a preprocessed image tensor and return the raw embedding.
    ///
    /// Input shape: \[1, 3, image_size, image_size\] (NCHW, CLIP-normalized).
    pub fn embed(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, PipelineError> {
        let embedding_error = |message: String| PipelineError::Embedding { message };

        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| embedding_error(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| embedding_error(format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| embedding_error(format!("ONNX inference failed: {e}")))?;

        let selected = outputs
            .iter()
            .find(|(name, _)| *name == self.output.name())
            .ok_or_else(|| {
                embedding_error(format!("Model did not produce {}", self.output.name()))
            })?;

        let (shape, data) = selected.1.try_extract_tensor::<f32>().map_err(|e| {
            embedding_error(format!(
                "Failed to extract {} tensor: {e}",
                self.output.name()
            ))
        })?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        self.output
            .rows(&dims, data, 1)
            .map_err(|e| embedding_error(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| embedding_error("Model returned an empty embedding".to_string()))
    }
}
