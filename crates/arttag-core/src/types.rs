//! Core data types produced by an analysis.
//!
//! These are per-request values: they are built by the scorer, serialized by
//! the boundary layer, and dropped once the response is written.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// A taxonomy label that passed the confidence threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    /// The taxonomy label (e.g., "oil painting", "cubism")
    pub label: String,

    /// Weighted confidence, rounded to three decimal places
    pub confidence: f64,

    /// Raw cosine similarity before weighting and rounding
    #[serde(skip)]
    pub similarity: f32,
}

/// Ranked labels for one taxonomy category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryResult {
    /// Category name (e.g., "medium")
    pub category: String,

    /// Passing labels, highest confidence first
    pub labels: Vec<ScoredLabel>,
}

/// Per-category ranked labels for a single image.
///
/// Categories appear in taxonomy order. A category whose embeddings could not
/// be computed at startup is absent; a category where nothing passed the
/// threshold is present with an empty list.
///
/// Serializes as a JSON object keyed by category name:
///
/// ```json
/// {"medium": [{"label": "oil painting", "confidence": 0.281}], "style": []}
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    categories: Vec<CategoryResult>,
}

impl AnalysisResult {
    /// Create a result from already-ranked categories.
    pub fn new(categories: Vec<CategoryResult>) -> Self {
        Self { categories }
    }

    /// Ranked labels for a category, if the category was scored.
    pub fn get(&self, category: &str) -> Option<&[ScoredLabel]> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.labels.as_slice())
    }

    /// Whether the category was scored at all.
    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// All scored categories, in taxonomy order.
    pub fn categories(&self) -> &[CategoryResult] {
        &self.categories
    }

    /// Number of scored categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.category, &category.labels)?;
        }
        map.end()
    }
}

/// Analysis output for one image file, as written by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ImageAnalysis {
    /// Path of the analyzed file
    pub file_path: PathBuf,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Detected format ("jpeg", "png", "webp", etc.)
    pub format: String,

    /// Ranked labels per category
    pub analysis: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, confidence: f64) -> ScoredLabel {
        ScoredLabel {
            label: name.to_string(),
            confidence,
            similarity: confidence as f32,
        }
    }

    #[test]
    fn test_scored_label_serialization_omits_similarity() {
        let json = serde_json::to_string(&label("cubism", 0.8)).unwrap();
        assert_eq!(json, r#"{"label":"cubism","confidence":0.8}"#);
    }

    #[test]
    fn test_analysis_result_serializes_as_ordered_map() {
        let result = AnalysisResult::new(vec![
            CategoryResult {
                category: "medium".into(),
                labels: vec![label("oil painting", 0.281)],
            },
            CategoryResult {
                category: "aesthetic_features".into(),
                labels: vec![],
            },
        ]);

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"medium":[{"label":"oil painting","confidence":0.281}],"aesthetic_features":[]}"#
        );
    }

    #[test]
    fn test_analysis_result_lookup() {
        let result = AnalysisResult::new(vec![CategoryResult {
            category: "style".into(),
            labels: vec![],
        }]);
        assert!(result.contains("style"));
        assert_eq!(result.get("style"), Some(&[][..]));
        assert!(!result.contains("medium"));
        assert_eq!(result.len(), 1);
        assert!(!result.is_empty());
    }
}
