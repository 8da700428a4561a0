use crate::config::PexelsConfig;
use crate::logw;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const PHOTO_TIMEOUT: Duration = Duration::from_secs(10);
const VIDEO_TIMEOUT: Duration = Duration::from_secs(30);
/// Clips shorter than this are skipped.
const MIN_VIDEO_SECONDS: u32 = 5;
const PREFERRED_HEIGHT: u32 = 1920;

#[derive(Debug, Deserialize)]
pub struct PhotoSearch {
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    pub src: PhotoSources,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSources {
    pub large2x: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoSearch {
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    pub link: String,
}

/// First HD/SD rendition at least 1920 px tall, else the first listed.
pub fn pick_video_file(files: &[VideoFile]) -> Option<&VideoFile> {
    files
        .iter()
        .find(|f| {
            matches!(f.quality.as_deref(), Some("hd") | Some("sd"))
                && f.height.unwrap_or(0) >= PREFERRED_HEIGHT
        })
        .or_else(|| files.first())
}

/// Links worth downloading, at most `count`, in search order.
pub fn usable_video_links(search: &VideoSearch, count: usize) -> Vec<String> {
    search
        .videos
        .iter()
        .filter(|v| v.duration >= MIN_VIDEO_SECONDS)
        .filter_map(|v| pick_video_file(&v.video_files))
        .map(|f| f.link.clone())
        .take(count)
        .collect()
}

pub struct PexelsClient {
    client: Client,
    cfg: PexelsConfig,
}

impl PexelsClient {
    pub fn new(client: Client, cfg: PexelsConfig) -> Self {
        Self { client, cfg }
    }

    pub fn has_key(&self) -> bool {
        !self.cfg.api_key.is_empty()
    }

    async fn search<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &str,
        per_page: usize,
        page: u32,
    ) -> Option<T> {
        let resp = self
            .client
            .get(endpoint)
            .header("Authorization", &self.cfg.api_key)
            .query(&[
                ("query", query.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
                ("orientation", "portrait".to_string()),
            ])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(err) => {
                logw(format!("Pexels request failed: {}", err));
                return None;
            }
        };
        if !resp.status().is_success() {
            logw(format!("Pexels API error: HTTP {}", resp.status().as_u16()));
            return None;
        }
        match resp.json::<T>().await {
            Ok(v) => Some(v),
            Err(err) => {
                logw(format!("Pexels response parse failed: {}", err));
                None
            }
        }
    }

    /// Raw bytes of up to `count` portrait photos.
    pub async fn photos(&self, query: &str, count: usize, page: u32) -> Vec<Vec<u8>> {
        if !self.has_key() {
            return Vec::new();
        }
        let Some(search) = self
            .search::<PhotoSearch>(&self.cfg.photos_endpoint, query, count, page)
            .await
        else {
            return Vec::new();
        };
        if search.photos.is_empty() {
            logw(format!("No photos found for '{}'", query));
        }

        let mut out = Vec::new();
        for photo in search.photos.iter().take(count) {
            match self.download(&photo.src.large2x, PHOTO_TIMEOUT).await {
                Ok(bytes) => out.push(bytes),
                Err(err) => logw(format!("Photo download failed: {:#}", err)),
            }
        }
        out
    }

    /// Downloads up to `count` portrait clips into `dir`.
    pub async fn videos(&self, query: &str, count: usize, page: u32, dir: &Path) -> Vec<PathBuf> {
        if !self.has_key() {
            return Vec::new();
        }
        let Some(search) = self
            .search::<VideoSearch>(&self.cfg.videos_endpoint, query, count * 2, page)
            .await
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for link in usable_video_links(&search, search.videos.len()) {
            if out.len() >= count {
                break;
            }
            let bytes = match self.download(&link, VIDEO_TIMEOUT).await {
                Ok(b) => b,
                Err(err) => {
                    logw(format!("Video download failed: {:#}", err));
                    continue;
                }
            };
            let path = dir.join(format!("pexels_{}.mp4", out.len()));
            if let Err(err) = fs::write(&path, &bytes).await {
                logw(format!("Failed to store {}: {}", path.display(), err));
                continue;
            }
            out.push(path);
        }
        out
    }

    async fn download(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;
        if !resp.status().is_success() {
            anyhow::bail!("HTTP {} for {}", resp.status().as_u16(), url);
        }
        Ok(resp.bytes().await.context("download body read failed")?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_JSON: &str = r#"{
        "videos": [
            {"duration": 3, "video_files": [{"quality": "hd", "height": 1920, "link": "short"}]},
            {"duration": 12, "video_files": [
                {"quality": "sd", "height": 960, "link": "small"},
                {"quality": "hd", "height": 2560, "link": "tall"}
            ]},
            {"duration": 8, "video_files": [
                {"quality": "uhd", "height": 3840, "link": "first-only"}
            ]},
            {"duration": 20, "video_files": []}
        ]
    }"#;

    #[test]
    fn skips_short_clips_and_prefers_tall_renditions() {
        let search: VideoSearch = serde_json::from_str(VIDEO_JSON).unwrap();
        assert_eq!(usable_video_links(&search, 10), vec!["tall", "first-only"]);
        assert_eq!(usable_video_links(&search, 1), vec!["tall"]);
    }

    #[test]
    fn photo_search_parses_large2x() {
        let json = r#"{"page": 1, "photos": [{"id": 1, "src": {"large2x": "https://x/1.jpg", "original": "o"}}]}"#;
        let search: PhotoSearch = serde_json::from_str(json).unwrap();
        assert_eq!(search.photos[0].src.large2x, "https://x/1.jpg");
    }

    #[test]
    fn missing_arrays_default_to_empty() {
        let search: VideoSearch = serde_json::from_str("{}").unwrap();
        assert!(search.videos.is_empty());
    }

    #[tokio::test]
    async fn no_key_means_no_requests() {
        let client = PexelsClient::new(Client::new(), PexelsConfig::default());
        assert!(client.photos("zen", 1, 1).await.is_empty());
        let dir = tempfile::tempdir().unwrap();
        assert!(client.videos("zen", 3, 1, dir.path()).await.is_empty());
    }
}
