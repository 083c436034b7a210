//! Auto-download the embedding model from HuggingFace
//!
//! Fetches the ONNX export of the sentence model on first run:
//! - sentence-transformers/all-MiniLM-L6-v2 (model.onnx, ~90 MB)

use anyhow::{anyhow, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::EmbeddingError;

const HF_BASE: &str = "https://huggingface.co";

/// Model file descriptor: (relative_url_path, local_filename, expected_min_bytes)
struct ModelFile {
    url_path: &'static str,
    local_name: &'static str,
    min_bytes: u64,
}

/// MiniLM sentence-transformer files (Apache 2.0 license)
const MINILM_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const MINILM_DIR: &str = "all-MiniLM-L6-v2";

const MINILM_FILES: &[ModelFile] = &[
    ModelFile {
        url_path: "onnx/model.onnx",
        local_name: "model.onnx",
        min_bytes: 10_000_000, // ~90 MB
    },
    ModelFile {
        // Tokenizer lives at the repo root, not in onnx/
        url_path: "tokenizer.json",
        local_name: "tokenizer.json",
        min_bytes: 10_000, // ~700 KB
    },
];

/// Ensure the MiniLM embedding model is present, downloading if missing.
/// Returns the model directory path.
pub fn ensure_minilm_model(model_dir: &Path) -> Result<PathBuf, EmbeddingError> {
    let target_dir = model_dir.join(MINILM_DIR);
    ensure_model_files(&target_dir, MINILM_REPO, MINILM_FILES, "MiniLM sentence model")
        .map_err(|e| EmbeddingError::ModelLoad(format!("{e:#}")))?;
    Ok(target_dir)
}

/// Files that are absent or too small (corrupt download).
fn missing_files<'a>(target_dir: &Path, files: &'a [ModelFile]) -> Vec<&'a ModelFile> {
    files
        .iter()
        .filter(|f| {
            let path = target_dir.join(f.local_name);
            match path.metadata() {
                Ok(meta) => meta.len() < f.min_bytes,
                Err(_) => true,
            }
        })
        .collect()
}

/// Check if all required files exist; download any that are missing.
fn ensure_model_files(
    target_dir: &Path,
    repo: &str,
    files: &[ModelFile],
    display_name: &str,
) -> Result<()> {
    let missing = missing_files(target_dir, files);
    if missing.is_empty() {
        return Ok(());
    }

    tracing::info!(
        model = display_name,
        missing_files = missing.len(),
        dir = %target_dir.display(),
        "Auto-downloading model files from HuggingFace"
    );

    std::fs::create_dir_all(target_dir).map_err(|e| {
        anyhow!(
            "Failed to create model directory {}: {}",
            target_dir.display(),
            e
        )
    })?;

    let client = reqwest::blocking::Client::builder()
        .user_agent("prashna/1.0")
        .timeout(std::time::Duration::from_secs(600))
        .connect_timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

    for file in &missing {
        let url = format!("{}/{}/resolve/main/{}", HF_BASE, repo, file.url_path);
        let dest = target_dir.join(file.local_name);
        download_with_retry(&client, &url, &dest, file.local_name, display_name)?;
    }

    tracing::info!(
        model = display_name,
        "All model files downloaded successfully"
    );
    Ok(())
}

/// Download a file with retry and streaming progress.
fn download_with_retry(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    filename: &str,
    model_name: &str,
) -> Result<()> {
    let max_retries = 3u32;
    let mut last_error = None;

    for attempt in 1..=max_retries {
        match download_streaming(client, url, dest, filename, model_name) {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_error = Some(e);
                if attempt < max_retries {
                    let backoff = std::time::Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        file = filename,
                        attempt,
                        "Download failed, retrying in {:?}",
                        backoff
                    );
                    std::thread::sleep(backoff);
                    // Remove partial file
                    let _ = std::fs::remove_file(dest);
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("Download failed after {} retries", max_retries)))
}

/// Stream download with periodic progress logging.
fn download_streaming(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    filename: &str,
    model_name: &str,
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .map_err(|e| anyhow!("HTTP request failed for {}: {}", filename, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!(
            "HTTP {} downloading {} from {}",
            status,
            filename,
            url
        ));
    }

    let total_size = response.content_length().unwrap_or(0);
    let total_mb = total_size as f64 / 1_048_576.0;

    tracing::info!(
        model = model_name,
        file = filename,
        size_mb = format!("{:.1}", total_mb),
        "Downloading"
    );

    // Write to a temp file first, then rename (atomic-ish)
    let tmp_dest = dest.with_extension("downloading");
    let mut file = std::fs::File::create(&tmp_dest)
        .map_err(|e| anyhow!("Failed to create {}: {}", tmp_dest.display(), e))?;

    let mut buf = [0u8; 65_536];
    let mut downloaded: u64 = 0;
    let mut last_log_pct: u64 = 0;

    loop {
        let read = response
            .read(&mut buf)
            .map_err(|e| anyhow!("Stream error downloading {}: {}", filename, e))?;
        if read == 0 {
            break;
        }
        file.write_all(&buf[..read])
            .map_err(|e| anyhow!("Write error for {}: {}", filename, e))?;
        downloaded += read as u64;

        // Log progress every 10%
        if total_size > 0 {
            let pct = (downloaded * 100) / total_size;
            if pct >= last_log_pct + 10 {
                last_log_pct = pct - (pct % 10);
                tracing::info!(
                    model = model_name,
                    file = filename,
                    progress = format!("{}%", last_log_pct),
                    downloaded_mb = format!("{:.1}", downloaded as f64 / 1_048_576.0),
                    "Download progress"
                );
            }
        }
    }

    file.flush()?;
    drop(file);

    // Rename temp file to final destination
    std::fs::rename(&tmp_dest, dest)
        .map_err(|e| anyhow!("Failed to finalize {}: {}", filename, e))?;

    tracing::info!(
        model = model_name,
        file = filename,
        size_mb = format!("{:.1}", downloaded as f64 / 1_048_576.0),
        "Download complete"
    );

    Ok(())
}
