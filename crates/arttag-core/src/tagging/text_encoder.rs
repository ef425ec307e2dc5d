//! CLIP text encoder for generating label embeddings.
//!
//! Loads the CLIP text ONNX model and tokenizer, and encodes label strings to
//! 512-dimensional vectors aligned with the vision encoder's space.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::embedding::{EmbeddingOutput, TextEmbedder};
use crate::error::PipelineError;

/// Text encoder ONNX model filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// Tokenizer filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// CLIP context length.
const MAX_LENGTH: usize = 77;

/// Projected output name of CLIP text exports.
const TEXT_EMBEDS: &str = "text_embeds";

/// CLIP text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the vision encoder.
pub struct ClipTextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    output: EmbeddingOutput,
    /// Whether the model declares an `attention_mask` input.
    takes_attention_mask: bool,
}

impl ClipTextEncoder {
    /// Load the text encoder from the model directory.
    ///
    /// Expects `text_model.onnx` and `tokenizer.json` in `model_path`.
    pub fn new(model_path: &Path) -> Result<Self, PipelineError> {
        let text_model_path = model_path.join(TEXT_MODEL_FILENAME);
        let tokenizer_path = model_path.join(TOKENIZER_FILENAME);

        if !text_model_path.exists() {
            return Err(PipelineError::Model {
                message: format!(
                    "Text encoder not found at {:?}. Run `arttag models download` first.",
                    text_model_path
                ),
            });
        }

        if !tokenizer_path.exists() {
            return Err(PipelineError::Model {
                message: format!(
                    "Tokenizer not found at {:?}. Run `arttag models download` first.",
                    tokenizer_path
                ),
            });
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(&text_model_path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load text encoder model: {e}"),
            })?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            PipelineError::Model {
                message: format!("Failed to load tokenizer: {e}"),
            }
        })?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        let output = EmbeddingOutput::resolve(&output_names, TEXT_EMBEDS).ok_or_else(|| {
            PipelineError::Model {
                message: "Text encoder declares no outputs".to_string(),
            }
        })?;
        let takes_attention_mask = input_names.iter().any(|n| n == "attention_mask");

        tracing::debug!(
            "Loaded CLIP text encoder (inputs: {:?}, outputs: {:?}, using: {:?})",
            input_names,
            output_names,
            output
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            output,
            takes_attention_mask,
        })
    }

    /// Check whether the text encoder model files exist.
    pub fn model_exists(model_path: &Path) -> bool {
        Self::required_files(model_path).iter().all(|p| p.exists())
    }

    /// Paths of the files the encoder loads.
    pub fn required_files(model_path: &Path) -> [PathBuf; 2] {
        [
            model_path.join(TEXT_MODEL_FILENAME),
            model_path.join(TOKENIZER_FILENAME),
        ]
    }

    /// Pad token id from the tokenizer config, or 0 when none is configured.
    fn pad_id(&self) -> u32 {
        self.tokenizer.get_padding().map(|p| p.pad_id).unwrap_or(0)
    }
}

/// Lay out token ids as a padded `[batch, seq_len]` matrix plus attention mask.
///
/// `seq_len` is the longest sequence in the batch, capped at `max_length`.
fn pad_batch(ids: &[Vec<u32>], pad_id: u32, max_length: usize) -> (usize, Vec<i64>, Vec<i64>) {
    let seq_len = ids
        .iter()
        .map(|seq| seq.len().min(max_length))
        .max()
        .unwrap_or(0)
        .max(1);

    let mut input_ids = vec![pad_id as i64; ids.len() * seq_len];
    let mut attention_mask = vec![0i64; ids.len() * seq_len];
    for (i, seq) in ids.iter().enumerate() {
        for (j, &id) in seq.iter().take(seq_len).enumerate() {
            input_ids[i * seq_len + j] = id as i64;
            attention_mask[i * seq_len + j] = 1;
        }
    }
    (seq_len, input_ids, attention_mask)
}

/// Index of the last attended token of each sequence (the end-of-text token
/// before padding), clamped to the padded length.
///
/// A bare hidden-state output is pooled here: under causal attention the first
/// token sees nothing else, so it would give every label the same vector.
fn end_token_positions(ids: &[Vec<u32>], seq_len: usize) -> Vec<usize> {
    ids.iter()
        .map(|seq| seq.len().min(seq_len).saturating_sub(1))
        .collect()
}

impl TextEmbedder for ClipTextEncoder {
    /// Encode a batch of labels in one inference call.
    ///
    /// Returns one unnormalized vector per input, in input order.
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| PipelineError::Model {
                message: format!("Tokenization failed: {e}"),
            })?;
        let ids: Vec<Vec<u32>> = encodings.iter().map(|e| e.get_ids().to_vec()).collect();
        let (seq_len, input_ids, attention_mask) = pad_batch(&ids, self.pad_id(), MAX_LENGTH);
        let end_positions = end_token_positions(&ids, seq_len);
        let shape = vec![batch_size as i64, seq_len as i64];

        let input_ids_value = Value::from_array((shape.clone(), input_ids)).map_err(|e| {
            PipelineError::Model {
                message: format!("Failed to create input_ids tensor: {e}"),
            }
        })?;
        let attention_mask_value =
            Value::from_array((shape, attention_mask)).map_err(|e| PipelineError::Model {
                message: format!("Failed to create attention_mask tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|e| PipelineError::Model {
            message: format!("Text encoder lock poisoned: {e}"),
        })?;

        let outputs = if self.takes_attention_mask {
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => attention_mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        }
        .map_err(|e| PipelineError::Model {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let selected = outputs
            .iter()
            .find(|(name, _)| *name == self.output.name())
            .ok_or_else(|| PipelineError::Model {
                message: format!("Text encoder did not produce {}", self.output.name()),
            })?;

        let (shape, data) =
            selected
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Model {
                    message: format!("Failed to extract {}: {e}", self.output.name()),
                })?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        self.output
            .rows_at(&dims, data, batch_size, &end_positions)
            .map_err(|e| PipelineError::Model {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_batch_pads_to_longest() {
        let ids = vec![vec![49406, 320, 49407], vec![49406, 49407]];
        let (seq_len, input_ids, mask) = pad_batch(&ids, 49407, MAX_LENGTH);
        assert_eq!(seq_len, 3);
        assert_eq!(input_ids, vec![49406, 320, 49407, 49406, 49407, 49407]);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn test_pad_batch_truncates_at_max_length() {
        let ids = vec![(0..100).collect::<Vec<u32>>()];
        let (seq_len, input_ids, mask) = pad_batch(&ids, 0, MAX_LENGTH);
        assert_eq!(seq_len, MAX_LENGTH);
        assert_eq!(input_ids.len(), MAX_LENGTH);
        assert!(mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_end_token_positions_follow_unpadded_length() {
        let ids: Vec<Vec<u32>> = vec![vec![49406, 320, 1125, 49407], vec![49406, 49407], vec![]];
        assert_eq!(end_token_positions(&ids, 4), vec![3, 1, 0]);
        // Truncated sequences end at the last kept token.
        assert_eq!(end_token_positions(&[(0..100).collect()], MAX_LENGTH), vec![76]);
    }

    #[test]
    fn test_hidden_state_output_pools_at_end_token() {
        // Two labels whose first token is identical (causal BOS state) but whose
        // end tokens differ; they must not collapse to the same embedding.
        let ids: Vec<Vec<u32>> = vec![vec![49406, 320, 49407], vec![49406, 49407]];
        let (seq_len, _, _) = pad_batch(&ids, 0, MAX_LENGTH);
        let positions = end_token_positions(&ids, seq_len);
        let hidden = [
            1.0, 0.0, 0.2, 0.3, 0.9, 0.1, // label 0: BOS, "a", EOS
            1.0, 0.0, 0.1, 0.8, 0.0, 0.0, // label 1: BOS, EOS, pad
        ];
        let output = EmbeddingOutput::First("last_hidden_state".into());
        let rows = output.rows_at(&[2, 3, 2], &hidden, 2, &positions).unwrap();
        assert_eq!(rows, vec![vec![0.9, 0.1], vec![0.1, 0.8]]);
    }

    #[test]
    fn test_model_exists_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!ClipTextEncoder::model_exists(dir.path()));

        std::fs::write(dir.path().join(TEXT_MODEL_FILENAME), b"onnx").unwrap();
        assert!(!ClipTextEncoder::model_exists(dir.path()));

        std::fs::write(dir.path().join(TOKENIZER_FILENAME), b"{}").unwrap();
        assert!(ClipTextEncoder::model_exists(dir.path()));
    }

    #[test]
    fn test_new_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = match ClipTextEncoder::new(dir.path()) {
            Ok(_) => panic!("encoder should not load from an empty directory"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("arttag models download"));
    }
}
