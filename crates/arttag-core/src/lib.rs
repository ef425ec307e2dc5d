//! Arttag Core - zero-shot art taxonomy tagging.
//!
//! Classifies an image against a fixed art taxonomy (medium, subject, style,
//! aesthetic features) by comparing its CLIP embedding with precomputed
//! embeddings of every taxonomy label.
//!
//! # Architecture
//!
//! ```text
//! startup:  Taxonomy → CLIP text encoder → TaxonomyStore (immutable)
//! request:  bytes → Decode → CLIP vision encoder → SimilarityScorer → JSON
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use arttag_core::{ArtTagger, Config};
//!
//! #[tokio::main]
//! async fn main() -> arttag_core::Result<()> {
//!     let config = Config::load()?;
//!     let tagger = ArtTagger::load(&config)?;
//!
//!     let result = tagger.analyze_file("./painting.jpg".as_ref()).await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

#[cfg(target_os = "macos")]
extern crate blas_src;

// Module declarations
pub mod config;
pub mod embedding;
pub mod error;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod tagging;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use embedding::{EmbeddingEngine, ImageEmbedder, TextEmbedder};
pub use error::{ArtTagError, ConfigError, PipelineError, PipelineResult, Result};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::ImageDecoder;
pub use tagging::{ClipTextEncoder, SimilarityScorer, Taxonomy, TaxonomyStore};
pub use types::{AnalysisResult, CategoryResult, ImageAnalysis, ScoredLabel};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;

use crate::config::LimitsConfig;
use crate::pipeline::format_to_string;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The main entry point: decodes images, embeds them and scores them against
/// the taxonomy store.
///
/// Cheap to share: the store and the vision encoder sit behind `Arc`s and are
/// never mutated after construction.
pub struct ArtTagger {
    image_embedder: Arc<dyn ImageEmbedder>,
    scorer: Arc<SimilarityScorer>,
    decoder: ImageDecoder,
    embed_timeout_ms: u64,
}

impl ArtTagger {
    /// Load the CLIP encoders from the configured model directory and
    /// pre-compute the art taxonomy.
    ///
    /// Fails if either encoder cannot be loaded. Individual categories that
    /// fail to encode are dropped from the store instead.
    pub fn load(config: &Config) -> Result<Self> {
        tracing::debug!("Initializing arttag v{}", VERSION);
        let model_path = config.model_path();

        let text_encoder = ClipTextEncoder::new(&model_path)?;
        let store = TaxonomyStore::build(&Taxonomy::art(), &text_encoder);
        drop(text_encoder);

        let engine = EmbeddingEngine::load(&config.embedding, &model_path)?;
        Ok(Self::from_parts(Arc::new(engine), store, &config.limits))
    }

    /// Assemble a tagger from an already-built store and any image embedder.
    pub fn from_parts(
        image_embedder: Arc<dyn ImageEmbedder>,
        store: TaxonomyStore,
        limits: &LimitsConfig,
    ) -> Self {
        Self {
            image_embedder,
            scorer: Arc::new(SimilarityScorer::new(store)),
            decoder: ImageDecoder::new(limits.clone()),
            embed_timeout_ms: limits.embed_timeout_ms,
        }
    }

    /// Whether at least one taxonomy category is available for scoring.
    pub fn is_ready(&self) -> bool {
        self.scorer.is_ready()
    }

    /// The pre-computed taxonomy embeddings.
    pub fn store(&self) -> &TaxonomyStore {
        self.scorer.store()
    }

    /// Analyze an encoded image held in memory (e.g. an HTTP upload).
    ///
    /// `name` labels errors only.
    pub async fn analyze_bytes(
        &self,
        bytes: Vec<u8>,
        name: &Path,
    ) -> PipelineResult<AnalysisResult> {
        if !self.is_ready() {
            return Err(PipelineError::Unavailable);
        }
        let decoded = self.decoder.decode_from_bytes(bytes, name).await?;
        self.analyze_image(decoded.image, name).await
    }

    /// Analyze an image file on disk.
    pub async fn analyze_file(&self, path: &Path) -> PipelineResult<ImageAnalysis> {
        if !self.is_ready() {
            return Err(PipelineError::Unavailable);
        }
        let start = std::time::Instant::now();
        let decoded = self.decoder.decode(path).await?;
        let analysis = self.analyze_image(decoded.image, path).await?;

        tracing::debug!(
            "Analyzed {:?} in {:?} ({}x{})",
            path,
            start.elapsed(),
            decoded.width,
            decoded.height
        );

        Ok(ImageAnalysis {
            file_path: path.to_path_buf(),
            width: decoded.width,
            height: decoded.height,
            format: format_to_string(decoded.format),
            analysis,
        })
    }

    /// Embed and score a decoded image off the async runtime, with timeout.
    async fn analyze_image(
        &self,
        image: DynamicImage,
        path: &Path,
    ) -> PipelineResult<AnalysisResult> {
        let embedder = Arc::clone(&self.image_embedder);
        let scorer = Arc::clone(&self.scorer);
        let timeout_duration = Duration::from_millis(self.embed_timeout_ms);

        let result = tokio::time::timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || scorer.analyze(embedder.as_ref(), &image)),
        )
        .await;

        match result {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(e)) => Err(PipelineError::Embedding {
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "embed".to_string(),
                timeout_ms: self.embed_timeout_ms,
            }),
        }
    }
}
