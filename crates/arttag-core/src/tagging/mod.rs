//! Zero-shot art tagging via CLIP text embeddings.
//!
//! The taxonomy's labels are encoded once into a [`TaxonomyStore`]; each image
//! embedding is then scored against it by the [`SimilarityScorer`].

pub mod label_bank;
pub mod scorer;
pub mod store;
pub mod taxonomy;
pub mod text_encoder;

pub use label_bank::LabelBank;
pub use scorer::{SimilarityScorer, CONFIDENCE_THRESHOLD, MEDIUM_CATEGORY, MEDIUM_WEIGHT};
pub use store::{StoredCategory, TaxonomyStore};
pub use taxonomy::{Category, Taxonomy};
pub use text_encoder::ClipTextEncoder;
