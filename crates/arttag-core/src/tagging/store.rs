//! Taxonomy embedding store, built once at startup.
//!
//! Each category of the taxonomy is encoded into its own [`LabelBank`]. A
//! category whose encoding fails is left out and the rest stay usable.

use crate::embedding::TextEmbedder;

use super::label_bank::LabelBank;
use super::taxonomy::{Category, Taxonomy};

/// A category together with its encoded labels.
#[derive(Debug, Clone)]
pub struct StoredCategory {
    category: Category,
    bank: LabelBank,
}

impl StoredCategory {
    pub fn name(&self) -> &str {
        self.category.name()
    }

    /// Labels in the same order as the rows of [`StoredCategory::bank`].
    pub fn labels(&self) -> &[String] {
        self.category.labels()
    }

    pub fn bank(&self) -> &LabelBank {
        &self.bank
    }
}

/// Read-only per-category label embeddings, in taxonomy order.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyStore {
    categories: Vec<StoredCategory>,
}

impl TaxonomyStore {
    /// Encode every category of `taxonomy` with one batched call per category.
    ///
    /// Failed categories are logged and omitted; this never fails as a whole.
    pub fn build(taxonomy: &Taxonomy, encoder: &dyn TextEmbedder) -> Self {
        tracing::info!(
            "Pre-computing taxonomy ({} categories, {} labels)...",
            taxonomy.categories().len(),
            taxonomy.label_count()
        );

        let mut categories = Vec::with_capacity(taxonomy.categories().len());
        for category in taxonomy.categories() {
            match LabelBank::try_encode(category.labels(), encoder) {
                Some(bank) => {
                    tracing::info!(
                        "Loaded {}: [{}, {}]",
                        category.name(),
                        bank.label_count(),
                        bank.embedding_dim()
                    );
                    categories.push(StoredCategory {
                        category: category.clone(),
                        bank,
                    });
                }
                None => {
                    tracing::warn!(
                        "Failed to compute embeddings for category: {}",
                        category.name()
                    );
                }
            }
        }

        if categories.is_empty() {
            tracing::warn!("Taxonomy store is empty; analysis requests will be refused");
        }

        Self { categories }
    }

    /// Stored categories, in taxonomy order.
    pub fn categories(&self) -> &[StoredCategory] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&StoredCategory> {
        self.categories.iter().find(|c| c.name() == name)
    }

    /// Names of the categories that were encoded successfully.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(StoredCategory::name).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
