use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    pub limits: LimitsConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted upload, in bytes.
    pub max_pdf_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Upper bound on chunk length, in bytes of UTF-8.
    pub chunk_size: usize,
    /// Bytes shared between consecutive chunks.
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_dir: PathBuf,
    pub dimension: usize,
    /// Token truncation length for the encoder.
    pub max_length: usize,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_k: usize,
    /// Cosine similarity floor; a best hit below this becomes "not found".
    pub min_score: f32,
}

impl QaConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.limits.max_pdf_bytes == 0 {
            return Err("limits.max_pdf_bytes must be > 0".into());
        }
        if self.chunking.chunk_size < 50 {
            return Err("chunking.chunk_size must be >= 50".into());
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err("chunking.chunk_overlap must be < chunk_size".into());
        }
        if self.embedding.dimension == 0 {
            return Err("embedding.dimension must be > 0".into());
        }
        if self.embedding.max_length == 0 {
            return Err("embedding.max_length must be > 0".into());
        }
        if self.embedding.cache_size == 0 {
            return Err("embedding.cache_size must be > 0".into());
        }
        if self.search.default_k == 0 {
            return Err("search.default_k must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.search.min_score) {
            return Err("search.min_score must be in [0.0, 1.0]".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for QaConfig {
    fn default() -> Self {
        let model_dir = if Path::new("models").exists() {
            PathBuf::from("models")
        } else if let Ok(env_path) = std::env::var("MODEL_PATH") {
            PathBuf::from(env_path)
        } else {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prashna")
                .join("models")
        };

        Self {
            limits: LimitsConfig {
                max_pdf_bytes: 200 * 1024 * 1024,
            },
            chunking: ChunkingConfig {
                chunk_size: 500,
                chunk_overlap: 100,
            },
            embedding: EmbeddingConfig {
                model_dir,
                dimension: 384,
                max_length: 256,
                cache_size: 1000,
            },
            search: SearchConfig {
                default_k: 5,
                min_score: 0.25,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(QaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap_at_least_chunk_size() {
        let mut config = QaConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_chunks() {
        let mut config = QaConfig::default();
        config.chunking.chunk_size = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_min_score() {
        let mut config = QaConfig::default();
        config.search.min_score = 1.5;
        assert!(config.validate().is_err());
        config.search.min_score = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = QaConfig::default();
        config.limits.max_pdf_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = QaConfig::default();
        config.search.default_k = 0;
        assert!(config.validate().is_err());

        let mut config = QaConfig::default();
        config.embedding.cache_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_round_trip() {
        let path = std::env::temp_dir().join(format!("prashna_config_{}.json", std::process::id()));
        let config = QaConfig::default();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = QaConfig::from_file(&path).unwrap();
        assert_eq!(loaded.chunking.chunk_size, config.chunking.chunk_size);
        assert_eq!(loaded.search.default_k, config.search.default_k);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let path =
            std::env::temp_dir().join(format!("prashna_bad_config_{}.json", std::process::id()));
        let mut config = QaConfig::default();
        config.search.min_score = 2.0;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert!(QaConfig::from_file(&path).is_err());

        std::fs::remove_file(&path).ok();
    }
}
