//! Embedding collaborators.
//!
//! The scorer only depends on the [`ImageEmbedder`] and [`TextEmbedder`]
//! traits. This module also provides the ONNX-backed CLIP vision encoder; the
//! matching text encoder lives in [`crate::tagging::text_encoder`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use arttag_core::embedding::{EmbeddingEngine, ImageEmbedder};
//! use arttag_core::Config;
//!
//! let config = Config::default();
//! let engine = EmbeddingEngine::load(&config.embedding, &config.model_path())?;
//! let embedding = engine.embed_image(&decoded_image)?;
//! // embedding is a Vec<f32> with 512 elements
//! ```

pub(crate) mod clip;
pub mod output;
pub(crate) mod preprocess;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::EmbeddingConfig;
use crate::error::PipelineError;

pub use self::output::EmbeddingOutput;

use self::clip::ClipVisionSession;
use self::preprocess::preprocess;

/// The visual encoder ONNX model filename.
pub const VISUAL_MODEL_FILENAME: &str = "vision_model.onnx";

/// Turns a decoded image into an embedding vector.
///
/// Implementations may return an unnormalized vector; the scorer normalizes.
pub trait ImageEmbedder: Send + Sync {
    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, PipelineError>;
}

/// Turns a batch of label strings into embedding vectors, one per input, in
/// input order.
///
/// Implementations may return unnormalized rows; the label bank normalizes.
pub trait TextEmbedder: Send + Sync {
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

/// Engine for generating image embeddings via CLIP.
pub struct EmbeddingEngine {
    session: ClipVisionSession,
    image_size: u32,
}

impl EmbeddingEngine {
    /// Load the CLIP visual encoder from the model directory.
    ///
    /// Expects the ONNX model at `{model_path}/vision_model.onnx`.
    pub fn load(config: &EmbeddingConfig, model_path: &Path) -> Result<Self, PipelineError> {
        let onnx_path = Self::onnx_path(model_path);

        if !onnx_path.exists() {
            return Err(PipelineError::Model {
                message: format!(
                    "Vision encoder not found at {:?}. Run `arttag models download` first.",
                    onnx_path
                ),
            });
        }

        tracing::info!("Loading CLIP vision model from {:?}", onnx_path);
        let session = ClipVisionSession::load(&onnx_path)?;
        tracing::info!("CLIP vision model loaded successfully");

        Ok(Self {
            session,
            image_size: config.image_size,
        })
    }

    /// Get the image input size for this model.
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Check whether the model file exists on disk.
    pub fn model_exists(model_path: &Path) -> bool {
        Self::onnx_path(model_path).exists()
    }

    /// Get the expected model file path.
    pub fn onnx_path(model_path: &Path) -> PathBuf {
        model_path.join(VISUAL_MODEL_FILENAME)
    }
}

impl ImageEmbedder for EmbeddingEngine {
    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, PipelineError> {
        let tensor = preprocess(image, self.image_size);
        self.session.embed(&tensor)
    }
}
