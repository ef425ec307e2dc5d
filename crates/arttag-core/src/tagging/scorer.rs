//! Zero-shot scoring of an image embedding against the taxonomy store.
//!
//! Computes dot products between a single normalized image embedding and every
//! label embedding of every stored category, weights and rounds the scores,
//! and returns the labels above the confidence threshold, best first.

use image::DynamicImage;

use crate::embedding::ImageEmbedder;
use crate::error::PipelineError;
use crate::math::{l2_normalize, round3};
use crate::types::{AnalysisResult, CategoryResult, ScoredLabel};

use super::store::TaxonomyStore;

/// Labels must score strictly above this (after weighting and rounding).
pub const CONFIDENCE_THRESHOLD: f64 = 0.22;

/// Category whose scores are boosted.
pub const MEDIUM_CATEGORY: &str = "medium";

/// Multiplier applied to every raw score of [`MEDIUM_CATEGORY`].
pub const MEDIUM_WEIGHT: f64 = 1.1;

/// Scores image embeddings against a pre-built taxonomy store.
pub struct SimilarityScorer {
    store: TaxonomyStore,
}

impl SimilarityScorer {
    pub fn new(store: TaxonomyStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    /// Whether there is anything to score against.
    pub fn is_ready(&self) -> bool {
        !self.store.is_empty()
    }

    /// Multiplier applied to a category's raw scores.
    pub fn category_weight(category: &str) -> f64 {
        if category == MEDIUM_CATEGORY {
            MEDIUM_WEIGHT
        } else {
            1.0
        }
    }

    /// Weighted confidence for a raw similarity, rounded to three decimals.
    ///
    /// Not clamped: a strong `medium` match can exceed 1.0.
    pub fn weighted_confidence(category: &str, similarity: f32) -> f64 {
        round3(f64::from(similarity) * Self::category_weight(category))
    }

    /// Embed `image` and score it.
    ///
    /// Fails as a whole if the store is empty or the embedder fails.
    pub fn analyze(
        &self,
        embedder: &dyn ImageEmbedder,
        image: &DynamicImage,
    ) -> Result<AnalysisResult, PipelineError> {
        if !self.is_ready() {
            return Err(PipelineError::Unavailable);
        }
        let embedding = embedder.embed_image(image)?;
        self.score(&embedding)
    }

    /// Score a raw image embedding against every stored category.
    ///
    /// The embedding is L2-normalized first, so each dot product is a cosine
    /// similarity. Labels at or below [`CONFIDENCE_THRESHOLD`] are dropped;
    /// the rest are sorted by descending confidence, ties in label order.
    pub fn score(&self, image_embedding: &[f32]) -> Result<AnalysisResult, PipelineError> {
        if !self.is_ready() {
            return Err(PipelineError::Unavailable);
        }
        let image_embedding = l2_normalize(image_embedding);

        let mut categories = Vec::with_capacity(self.store.len());
        for stored in self.store.categories() {
            let similarities = stored.bank().similarities(&image_embedding)?;

            let mut labels: Vec<ScoredLabel> = stored
                .labels()
                .iter()
                .zip(similarities)
                .map(|(label, similarity)| ScoredLabel {
                    label: label.clone(),
                    confidence: Self::weighted_confidence(stored.name(), similarity),
                    similarity,
                })
                .filter(|scored| scored.confidence > CONFIDENCE_THRESHOLD)
                .collect();

            // Stable: equal confidences keep label order.
            labels.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

            tracing::trace!(
                "  {}: {} of {} labels above threshold",
                stored.name(),
                labels.len(),
                stored.labels().len()
            );

            categories.push(CategoryResult {
                category: stored.name().to_string(),
                labels,
            });
        }

        Ok(AnalysisResult::new(categories))
    }
}
