//! The fixed art taxonomy images are scored against.

use std::collections::HashSet;

use crate::error::ConfigError;

/// Built-in art taxonomy: category name and its candidate labels.
///
/// Label order is significant: it is the row order of the category's
/// label bank and the order ties are broken in.
const ART_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "medium",
        &[
            "oil painting",
            "watercolor painting",
            "acrylic painting",
            "digital art",
            "charcoal drawing",
            "pencil sketch",
            "photography",
            "ink drawing",
            "mixed media artwork",
        ],
    ),
    (
        "subject",
        &[
            "portrait",
            "landscape",
            "still life",
            "abstract art",
            "cityscape",
            "animal",
            "fantasy scene",
            "mythological scene",
            "self portrait",
        ],
    ),
    (
        "style",
        &[
            "impressionism",
            "realism",
            "surrealism",
            "cubism",
            "minimalism",
            "baroque art",
            "modern art",
            "contemporary art",
            "pop art",
            "expressionism",
        ],
    ),
    (
        "aesthetic_features",
        &[
            "high contrast",
            "soft lighting",
            "vibrant colors",
            "monochromatic palette",
            "textured brushstrokes",
            "smooth gradients",
            "geometric composition",
            "symmetrical composition",
        ],
    ),
];

/// A named group of candidate labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    labels: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Labels in definition order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Ordered set of categories with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy, rejecting duplicate category names and empty categories.
    pub fn new(categories: Vec<Category>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate taxonomy category {:?}",
                    category.name
                )));
            }
            if category.labels.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "taxonomy category {:?} has no labels",
                    category.name
                )));
            }
        }
        Ok(Self { categories })
    }

    /// The built-in art taxonomy: medium, subject, style, aesthetic features.
    pub fn art() -> Self {
        let categories = ART_TAXONOMY
            .iter()
            .map(|(name, labels)| {
                Category::new(*name, labels.iter().map(|l| l.to_string()).collect())
            })
            .collect();
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Total number of labels across all categories.
    pub fn label_count(&self) -> usize {
        self.categories.iter().map(|c| c.labels.len()).sum()
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::art()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_art_taxonomy_shape() {
        let taxonomy = Taxonomy::art();
        let names: Vec<&str> = taxonomy.categories().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["medium", "subject", "style", "aesthetic_features"]
        );
        assert_eq!(taxonomy.get("medium").unwrap().labels().len(), 9);
        assert_eq!(taxonomy.get("style").unwrap().labels().len(), 10);
        assert_eq!(taxonomy.label_count(), 36);
    }

    #[test]
    fn test_art_taxonomy_label_order() {
        let taxonomy = Taxonomy::art();
        let style = taxonomy.get("style").unwrap().labels();
        assert_eq!(style[1], "realism");
        assert_eq!(style[3], "cubism");
        assert_eq!(style[5], "baroque art");
    }

    #[test]
    fn test_art_taxonomy_passes_validation() {
        let art = Taxonomy::art();
        let rebuilt = Taxonomy::new(art.categories().to_vec()).unwrap();
        assert_eq!(rebuilt, art);
    }

    #[test]
    fn test_new_rejects_duplicate_category() {
        let err = Taxonomy::new(vec![
            Category::new("style", vec!["cubism".into()]),
            Category::new("style", vec!["realism".into()]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_new_rejects_empty_category() {
        let err = Taxonomy::new(vec![Category::new("medium", vec![])]).unwrap_err();
        assert!(err.to_string().contains("no labels"));
    }
}
