//! MiniLM sentence embedder over ONNX Runtime.
//!
//! Runs sentence-transformers/all-MiniLM-L6-v2: WordPiece tokenization, a
//! transformer forward pass, attention-mask mean pooling, then L2
//! normalization. The model is frozen and inference is single-threaded per
//! call, so the same input always produces the same vector.

use anyhow::{anyhow, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use super::EmbeddingModel;
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

const MAX_BATCH_SIZE: usize = 8;

pub struct MiniLmEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<tokenizers::Tokenizer>,
    dimension: usize,
    max_length: usize,
    cache: Arc<RwLock<lru::LruCache<u64, Vec<f32>>>>,
}

impl MiniLmEmbedder {
    /// Loads the model from `model_dir`, which must contain `model.onnx`
    /// and `tokenizer.json`.
    pub fn load(model_dir: &Path, config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Self::load_inner(model_dir, config).map_err(|e| EmbeddingError::ModelLoad(format!("{e:#}")))
    }

    fn load_inner(model_dir: &Path, config: &EmbeddingConfig) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        tracing::info!(model = %model_path.display(), "Loading MiniLM embedding model");

        ort::init().with_name("prashna_embeddings").commit();

        let model_bytes = std::fs::read(&model_path)?;
        let session = Session::builder()
            .map_err(|e| anyhow!("Session builder error: {:?}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_inter_threads(1)?
            .with_memory_pattern(true)?
            .commit_from_memory(&model_bytes)?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {:?}", e))?;

        let cache =
            lru::LruCache::new(std::num::NonZeroUsize::new(config.cache_size.max(1)).unwrap());

        tracing::info!(
            dimension = config.dimension,
            max_length = config.max_length,
            "MiniLM embedding model ready"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            dimension: config.dimension,
            max_length: config.max_length,
            cache: Arc::new(RwLock::new(cache)),
        })
    }

    fn encode(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>, Vec<i64>)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization error: {:?}", e))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();
        let mut type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&x| x as i64).collect();

        ids.truncate(self.max_length);
        mask.truncate(self.max_length);
        type_ids.truncate(self.max_length);

        Ok((ids, mask, type_ids))
    }

    /// One forward pass for up to `MAX_BATCH_SIZE` texts. Rows are padded to
    /// the longest sequence in the batch and pooled with their own mask, so
    /// padding never leaks into the vectors.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encoded: Vec<_> = texts
            .iter()
            .map(|t| self.encode(t))
            .collect::<Result<_>>()?;
        let max_len = encoded
            .iter()
            .map(|(ids, _, _)| ids.len())
            .max()
            .unwrap_or(0)
            .max(1);

        let batch = encoded.len();
        let mut ids = Vec::with_capacity(batch * max_len);
        let mut mask = Vec::with_capacity(batch * max_len);
        let mut type_ids = Vec::with_capacity(batch * max_len);
        for (row_ids, row_mask, row_types) in &encoded {
            ids.extend_from_slice(row_ids);
            ids.extend(std::iter::repeat(0i64).take(max_len - row_ids.len()));
            mask.extend_from_slice(row_mask);
            mask.extend(std::iter::repeat(0i64).take(max_len - row_mask.len()));
            type_ids.extend_from_slice(row_types);
            type_ids.extend(std::iter::repeat(0i64).take(max_len - row_types.len()));
        }

        let shape = vec![batch as i64, max_len as i64];
        let input_ids = Value::from_array((shape.clone(), ids))?;
        let attention_mask = Value::from_array((shape.clone(), mask.clone()))?;
        let token_type_ids = Value::from_array((shape, type_ids))?;

        let inputs = ort::inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids
        ];

        let mut session = self.session.lock();
        let outputs = session.run(inputs)?;
        let (out_shape, data) = outputs["last_hidden_state"].try_extract_tensor::<f32>()?;

        let seq_len = out_shape[1] as usize;
        let hidden = out_shape[2] as usize;

        let mut vectors = Vec::with_capacity(batch);
        for row in 0..batch {
            let row_mask = &mask[row * max_len..(row + 1) * max_len];
            let row_data = &data[row * seq_len * hidden..(row + 1) * seq_len * hidden];
            let mut vector = mean_pool(row_data, row_mask, seq_len, hidden);
            l2_normalize(&mut vector);
            vectors.push(vector);
        }
        Ok(vectors)
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = cache_key(text);
        if let Some(vector) = self.cache.write().get(&key) {
            return Ok(vector.clone());
        }

        let mut vectors = self
            .embed_batch(&[text])
            .map_err(|e| EmbeddingError::Inference(format!("{e:#}")))?;
        let vector = vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("model returned no output".to_string()))?;
        self.check_dimension(&vector)?;
        self.cache.write().put(key, vector.clone());
        Ok(vector)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), EmbeddingError> {
        if vector.len() != self.dimension {
            return Err(EmbeddingError::Dimension {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        Ok(())
    }
}

impl EmbeddingModel for MiniLmEmbedder {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_text(text)
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_text(text)
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut pending: Vec<usize> = Vec::new();

        {
            let mut cache = self.cache.write();
            for (i, text) in texts.iter().enumerate() {
                match cache.get(&cache_key(text)) {
                    Some(vector) => results[i] = Some(vector.clone()),
                    None => pending.push(i),
                }
            }
        }

        for batch in pending.chunks(MAX_BATCH_SIZE) {
            let batch_texts: Vec<&str> = batch.iter().map(|&i| texts[i]).collect();
            let vectors = self
                .embed_batch(&batch_texts)
                .map_err(|e| EmbeddingError::Inference(format!("{e:#}")))?;
            if vectors.len() != batch.len() {
                return Err(EmbeddingError::Inference(format!(
                    "expected {} vectors, model returned {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            let mut cache = self.cache.write();
            for (&i, vector) in batch.iter().zip(vectors) {
                self.check_dimension(&vector)?;
                cache.put(cache_key(texts[i]), vector.clone());
                results[i] = Some(vector);
            }
        }

        results
            .into_iter()
            .map(|v| v.ok_or_else(|| EmbeddingError::Inference("missing embedding".to_string())))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn mean_pool(data: &[f32], mask: &[i64], seq_len: usize, hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    let mut count = 0.0f32;
    for token in 0..seq_len {
        if mask.get(token).copied().unwrap_or(0) == 0 {
            continue;
        }
        let offset = token * hidden;
        for (i, value) in data[offset..offset + hidden].iter().enumerate() {
            pooled[i] += value;
        }
        count += 1.0;
    }
    if count > 0.0 {
        for value in &mut pooled {
            *value /= count;
        }
    }
    pooled
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector {
            *value /= norm;
        }
    }
}

fn cache_key(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_masked_tokens() {
        // 3 tokens, hidden size 2, last token is padding.
        let data = [1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let mask = [1i64, 1, 0];
        let pooled = mean_pool(&data, &mask, 3, 2);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_pool_with_empty_mask_stays_finite() {
        let data = [1.0, 2.0];
        let mask = [0i64];
        let pooled = mean_pool(&data, &mask, 1, 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    #[test]
    fn test_l2_normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_leaves_zero_vector_unchanged() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cache_key_is_stable_per_text() {
        assert_eq!(cache_key("abc"), cache_key("abc"));
        assert_ne!(cache_key("abc"), cache_key("abd"));
    }
}
