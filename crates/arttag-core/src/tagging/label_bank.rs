//! Pre-computed label embeddings for one taxonomy category.
//!
//! The label bank stores an N×D matrix of unit-norm text embeddings (one row
//! per label, in label order) that is dot-producted against image embeddings.

use ndarray::{Array2, ArrayView1};

use crate::embedding::TextEmbedder;
use crate::error::PipelineError;
use crate::math::l2_normalize_in_place;

/// Pre-computed label embeddings for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBank {
    /// N × D, row-major, every row L2-normalized.
    matrix: Array2<f32>,
}

impl LabelBank {
    /// Build a label bank from raw embedding rows, normalizing each row.
    ///
    /// Rows must be non-empty and share one dimension.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, PipelineError> {
        let embedding_dim = rows.first().map(Vec::len).unwrap_or(0);
        if embedding_dim == 0 {
            return Err(PipelineError::Model {
                message: "Cannot build label bank from empty embeddings".to_string(),
            });
        }

        let label_count = rows.len();
        let mut flat = Vec::with_capacity(label_count * embedding_dim);
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() != embedding_dim {
                return Err(PipelineError::Model {
                    message: format!(
                        "Label bank dimension mismatch at row {i} ({} vs {embedding_dim})",
                        row.len()
                    ),
                });
            }
            l2_normalize_in_place(&mut row);
            flat.extend_from_slice(&row);
        }

        let matrix = Array2::from_shape_vec((label_count, embedding_dim), flat).map_err(|e| {
            PipelineError::Model {
                message: format!("Failed to shape label bank: {e}"),
            }
        })?;
        Ok(Self { matrix })
    }

    /// Encode all labels of a category in a single batched call.
    pub fn encode(labels: &[String], encoder: &dyn TextEmbedder) -> Result<Self, PipelineError> {
        let rows = encoder.embed_texts(labels)?;
        if rows.len() != labels.len() {
            return Err(PipelineError::Model {
                message: format!(
                    "Text encoder returned {} embeddings for {} labels",
                    rows.len(),
                    labels.len()
                ),
            });
        }
        Self::from_rows(rows)
    }

    /// Like [`LabelBank::encode`], but reports failure as `None` after logging it.
    pub fn try_encode(labels: &[String], encoder: &dyn TextEmbedder) -> Option<Self> {
        match Self::encode(labels, encoder) {
            Ok(bank) => Some(bank),
            Err(e) => {
                tracing::error!("Text embedding error: {e}");
                None
            }
        }
    }

    /// Cosine similarity of a unit-norm embedding against every label, in label order.
    pub fn similarities(&self, embedding: &[f32]) -> Result<Vec<f32>, PipelineError> {
        if embedding.len() != self.embedding_dim() {
            return Err(PipelineError::Analysis {
                message: format!(
                    "Image embedding has {} dims, label bank expects {}",
                    embedding.len(),
                    self.embedding_dim()
                ),
            });
        }
        Ok(self.matrix.dot(&ArrayView1::from(embedding)).to_vec())
    }

    /// The N × D embedding matrix.
    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }

    /// Embedding of the label at `index`.
    pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f32>> {
        (index < self.label_count()).then(|| self.matrix.row(index))
    }

    pub fn embedding_dim(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn label_count(&self) -> usize {
        self.matrix.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEncoder(Vec<Vec<f32>>);

    impl TextEmbedder for FixedEncoder {
        fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    struct FailingEncoder;

    impl TextEmbedder for FailingEncoder {
        fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
            Err(PipelineError::Model {
                message: "tokenizer exploded".into(),
            })
        }
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_rows_normalizes() {
        let bank = LabelBank::from_rows(vec![vec![3.0, 4.0], vec![0.0, 2.0]]).unwrap();
        assert_eq!(bank.label_count(), 2);
        assert_eq!(bank.embedding_dim(), 2);
        for row in bank.matrix().rows() {
            let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-6);
        }
        let first = bank.row(0).unwrap();
        assert!((first[0] - 0.6).abs() < 1e-6);
        assert!(bank.row(2).is_none());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = LabelBank::from_rows(vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn test_from_rows_rejects_empty() {
        assert!(LabelBank::from_rows(vec![]).is_err());
        assert!(LabelBank::from_rows(vec![vec![]]).is_err());
    }

    #[test]
    fn test_encode_rejects_row_count_mismatch() {
        let encoder = FixedEncoder(vec![vec![1.0, 0.0]]);
        let err = LabelBank::encode(&labels(&["a", "b"]), &encoder).unwrap_err();
        assert!(err.to_string().contains("1 embeddings for 2 labels"));
    }

    #[test]
    fn test_try_encode_failure_is_none() {
        assert!(LabelBank::try_encode(&labels(&["a"]), &FailingEncoder).is_none());
    }

    #[test]
    fn test_similarities_in_label_order() {
        let bank =
            LabelBank::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]]).unwrap();
        let sims = bank.similarities(&[1.0, 0.0]).unwrap();
        assert_eq!(sims, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_similarities_dimension_mismatch() {
        let bank = LabelBank::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        let err = bank.similarities(&[1.0, 0.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("3 dims"));
    }
}
