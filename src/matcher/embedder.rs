//! Sentence embedding model for the vector strategy
//!
//! Loads a BERT-family encoder (bge-small-zh by default) from a local
//! directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
//! Uses CLS pooling and L2 normalization. Without the `embeddings` feature
//! every load reports the model as unavailable.

use crate::core::config::EmbeddingConfig;
use crate::core::error::{MenuError, Result};
use crate::matcher::vector::TextEncoder;
use std::path::Path;
use std::sync::Arc;

/// Load the configured encoder, or explain why it is unavailable
pub fn load_encoder(config: &EmbeddingConfig) -> Result<Arc<dyn TextEncoder>> {
    let dir = Path::new(&config.model_dir);
    if !dir.is_dir() {
        return Err(MenuError::EmbeddingUnavailable(format!(
            "model directory {:?} not found",
            dir
        )));
    }
    imp::BertEncoder::load(dir).map(|encoder| Arc::new(encoder) as Arc<dyn TextEncoder>)
}

#[cfg(feature = "embeddings")]
mod imp {
    use super::*;
    use candle_core::{DType, Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::{BertModel, Config, DTYPE};
    use tokenizers::Tokenizer;

    fn model_err(e: impl std::fmt::Display) -> MenuError {
        MenuError::Embedding(e.to_string())
    }

    pub struct BertEncoder {
        model: BertModel,
        tokenizer: Tokenizer,
        device: Device,
    }

    impl BertEncoder {
        pub fn load(dir: &Path) -> Result<Self> {
            tracing::info!("Loading embedding model from {:?}", dir);
            let device = Device::Cpu;

            let config: Config =
                serde_json::from_str(&std::fs::read_to_string(dir.join("config.json"))?)?;

            let tokenizer = Tokenizer::from_file(dir.join("tokenizer.json")).map_err(|e| {
                MenuError::EmbeddingUnavailable(format!("Failed to load tokenizer: {}", e))
            })?;

            let weights = dir.join("model.safetensors");
            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights], DTYPE, &device).map_err(|e| {
                    MenuError::EmbeddingUnavailable(format!("Failed to load weights: {}", e))
                })?
            };
            let model = BertModel::load(vb, &config).map_err(|e| {
                MenuError::EmbeddingUnavailable(format!("Failed to build BERT model: {}", e))
            })?;

            tracing::info!(hidden_size = config.hidden_size, "Embedding model loaded");
            Ok(Self {
                model,
                tokenizer,
                device,
            })
        }

        fn forward_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| MenuError::Embedding(format!("Tokenization failed: {}", e)))?;

            let max_len = encodings
                .iter()
                .map(|e| e.get_ids().len())
                .max()
                .unwrap_or(0);

            let mut input_ids = Vec::with_capacity(texts.len() * max_len);
            let mut attention_mask = Vec::with_capacity(texts.len() * max_len);
            let mut token_type_ids = Vec::with_capacity(texts.len() * max_len);

            for encoding in &encodings {
                let pad = max_len - encoding.get_ids().len();
                input_ids.extend_from_slice(encoding.get_ids());
                input_ids.extend(std::iter::repeat(0).take(pad));
                attention_mask.extend_from_slice(encoding.get_attention_mask());
                attention_mask.extend(std::iter::repeat(0).take(pad));
                token_type_ids.extend_from_slice(encoding.get_type_ids());
                token_type_ids.extend(std::iter::repeat(0).take(pad));
            }

            let shape = (texts.len(), max_len);
            let input_ids = Tensor::from_vec(input_ids, shape, &self.device).map_err(model_err)?;
            let attention_mask =
                Tensor::from_vec(attention_mask, shape, &self.device).map_err(model_err)?;
            let token_type_ids = Tensor::from_vec(token_type_ids, shape, &self.device)
                .and_then(|t| t.to_dtype(DType::U32))
                .map_err(model_err)?;

            let output = self
                .model
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))
                .map_err(model_err)?;

            // CLS pooling: position 0 of every sequence
            let cls = output
                .narrow(1, 0, 1)
                .and_then(|t| t.squeeze(1))
                .map_err(model_err)?;

            let norm = cls
                .sqr()
                .and_then(|t| t.sum_keepdim(1))
                .and_then(|t| t.sqrt())
                .and_then(|t| t.clamp(1e-12, f64::MAX))
                .map_err(model_err)?;
            let normalized = cls.broadcast_div(&norm).map_err(model_err)?;

            normalized.to_vec2::<f32>().map_err(model_err)
        }
    }

    impl TextEncoder for BertEncoder {
        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.forward_batch(texts)
        }
    }
}

#[cfg(not(feature = "embeddings"))]
mod imp {
    use super::*;

    pub struct BertEncoder;

    impl BertEncoder {
        pub fn load(_dir: &Path) -> Result<Self> {
            Err(MenuError::EmbeddingUnavailable(
                "built without the `embeddings` feature".into(),
            ))
        }
    }

    impl TextEncoder for BertEncoder {
        fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(MenuError::EmbeddingUnavailable(
                "built without the `embeddings` feature".into(),
            ))
        }
    }
}
