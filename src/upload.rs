use crate::api::cloudinary::CloudinaryClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const RECORD_FILE: &str = "video_url.json";

/// What the hosting service reports after an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub url: String,
    pub public_id: String,
    pub format: Option<String>,
    pub duration: Option<f64>,
}

/// Publishes a finished video under a stable identifier.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, video: &Path) -> Result<UploadReceipt>;
    fn public_id(&self) -> &str;
}

#[async_trait]
impl Uploader for CloudinaryClient {
    async fn upload(&self, video: &Path) -> Result<UploadReceipt> {
        let resp = CloudinaryClient::upload(self, video).await?;
        Ok(UploadReceipt {
            url: resp.secure_url,
            public_id: resp.public_id,
            format: resp.format,
            duration: resp.duration,
        })
    }

    fn public_id(&self) -> &str {
        CloudinaryClient::public_id(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub url: String,
    pub public_id: String,
    pub topic: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// `YYYYmmdd_HHMMSS`, local time.
    pub date: String,
    pub format: String,
    pub duration: Option<f64>,
    pub size_mb: f64,
}

impl UploadRecord {
    pub fn new(receipt: UploadReceipt, topic: &str, at: DateTime<Local>, size_bytes: u64) -> Self {
        let size_mb = size_bytes as f64 / 1024.0 / 1024.0;
        Self {
            url: receipt.url,
            public_id: receipt.public_id,
            topic: topic.to_string(),
            timestamp: at.timestamp(),
            date: at.format("%Y%m%d_%H%M%S").to_string(),
            format: receipt.format.unwrap_or_else(|| "mp4".to_string()),
            duration: receipt.duration,
            size_mb: (size_mb * 100.0).round() / 100.0,
        }
    }

    /// `video_url.json` next to the video.
    pub fn path_for(video: &Path) -> PathBuf {
        match video.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.join(RECORD_FILE),
            _ => PathBuf::from(RECORD_FILE),
        }
    }

    /// Overwrites the record next to `video`; returns the record path.
    pub fn save_beside(&self, video: &Path) -> Result<PathBuf> {
        let path = Self::path_for(video);
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid upload record {}", path.display()))
    }
}
