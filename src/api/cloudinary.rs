use crate::config::CloudinaryConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);
/// Eager transform: mp4 container, automatic quality.
const EAGER: &str = "f_mp4,q_auto";

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub secure_url: String,
    pub public_id: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// The parameters covered by the signature, sorted by name. The file,
/// `api_key`, `resource_type` and `cloud_name` never take part.
pub fn upload_params(cfg: &CloudinaryConfig, timestamp: i64) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("eager", EAGER.to_string()),
        ("eager_async", "false".to_string()),
        ("folder", cfg.folder.clone()),
        ("invalidate", "true".to_string()),
        ("overwrite", "true".to_string()),
        ("public_id", cfg.public_id.clone()),
        ("timestamp", timestamp.to_string()),
    ])
}

/// Hex SHA-1 of `k1=v1&k2=v2...` followed by the API secret.
pub fn sign(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

pub struct CloudinaryClient {
    client: Client,
    cfg: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(client: Client, cfg: &CloudinaryConfig) -> Self {
        Self {
            client,
            cfg: cfg.clone(),
        }
    }

    pub fn public_id(&self) -> &str {
        &self.cfg.public_id
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/video/upload",
            self.cfg.endpoint.trim_end_matches('/'),
            self.cfg.cloud_name
        )
    }

    /// Signed multipart upload of `video`, replacing whatever sits at the
    /// configured public id.
    pub async fn upload(&self, video: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(video)
            .await
            .with_context(|| format!("Failed to read {}", video.display()))?;
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());

        let params = upload_params(&self.cfg, chrono::Utc::now().timestamp());
        let signature = sign(&params, &self.cfg.api_secret);

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .context("Invalid upload mime type")?;
        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.cfg.api_key.clone())
            .text("signature", signature);
        for (k, v) in params {
            form = form.text(k, v);
        }

        let resp = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .context("Cloudinary request failed")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            anyhow::bail!("Cloudinary upload failed HTTP {}: {}", status.as_u16(), detail);
        }

        serde_json::from_str(&body).context("Unexpected Cloudinary response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_sorted_and_exclude_credentials() {
        let params = upload_params(&CloudinaryConfig::default(), 1_700_000_000);
        let keys: Vec<_> = params.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                "eager",
                "eager_async",
                "folder",
                "invalidate",
                "overwrite",
                "public_id",
                "timestamp",
            ]
        );
        assert_eq!(params["folder"], "mindfulness_videos");
        assert_eq!(params["overwrite"], "true");
    }

    #[test]
    fn repeated_uploads_target_the_same_public_id() {
        let cfg = CloudinaryConfig::default();
        let a = upload_params(&cfg, 1);
        let b = upload_params(&cfg, 999_999);
        assert_eq!(a["public_id"], "video_ig");
        assert_eq!(a["public_id"], b["public_id"]);
    }

    #[test]
    fn signature_matches_documented_example() {
        // Cloudinary's signing walkthrough: eager=w_400,h_300,c_pad|w_260,h_200,c_crop
        // public_id=sample_image timestamp=1315060510 secret abcd
        let params = BTreeMap::from([
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
            ("public_id", "sample_image".to_string()),
            ("timestamp", "1315060510".to_string()),
        ]);
        assert_eq!(sign(&params, "abcd"), "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn signature_changes_with_secret() {
        let params = upload_params(&CloudinaryConfig::default(), 42);
        let a = sign(&params, "one");
        assert_eq!(a.len(), 40);
        assert_ne!(a, sign(&params, "two"));
    }

    #[test]
    fn upload_url_uses_cloud_name() {
        let cfg = CloudinaryConfig {
            cloud_name: "demo".into(),
            ..CloudinaryConfig::default()
        };
        let client = CloudinaryClient::new(Client::new(), &cfg);
        assert_eq!(
            client.upload_url(),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let r: UploadResponse = serde_json::from_str(
            r#"{"secure_url":"https://res.cloudinary.com/demo/video/upload/v1/mindfulness_videos/video_ig.mp4","public_id":"mindfulness_videos/video_ig"}"#,
        )
        .unwrap();
        assert!(r.duration.is_none());
        assert_eq!(r.public_id, "mindfulness_videos/video_ig");
    }
}
