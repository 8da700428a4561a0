use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Every credential and tunable the binaries need, assembled once at startup
/// (defaults, then the optional JSON file, then environment, then CLI flags)
/// and passed by reference from there on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub completion: CompletionConfig,
    pub pexels: PexelsConfig,
    pub speech: SpeechConfig,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 1.3,
            max_tokens: 1500,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PexelsConfig {
    pub api_key: String,
    pub photos_endpoint: String,
    pub videos_endpoint: String,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            photos_endpoint: "https://api.pexels.com/v1/search".to_string(),
            videos_endpoint: "https://api.pexels.com/videos/search".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub azure_key: String,
    pub azure_region: String,
    pub voice: String,
    pub rate: String,
    pub pitch: String,
    #[serde(rename = "elevenlabs_api_key")]
    pub elevenlabs_key: String,
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,
    pub fallback_lang: String,
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            azure_key: String::new(),
            azure_region: String::new(),
            voice: "es-ES-AlvaroNeural".to_string(),
            rate: "-15%".to_string(),
            pitch: "-25Hz".to_string(),
            elevenlabs_key: String::new(),
            eleven_voice_id: default_voice_id(),
            eleven_model_id: default_model_id(),
            fallback_lang: "es".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub public_id: String,
    pub endpoint: String,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: "mindfulness_videos".to_string(),
            public_id: "video_ig".to_string(),
            endpoint: "https://api.cloudinary.com/v1_1".to_string(),
        }
    }
}

impl CloudinaryConfig {
    /// `Ok(false)` when nothing is configured, `Ok(true)` when all three
    /// credentials are present, an error for anything in between.
    pub fn is_configured(&self) -> Result<bool> {
        let present = [&self.cloud_name, &self.api_key, &self.api_secret]
            .iter()
            .filter(|v| !v.is_empty())
            .count();
        match present {
            0 => Ok(false),
            3 => Ok(true),
            _ => Err(Error::Config(
                "cloudinary needs cloud name, API key and API secret together".to_string(),
            )
            .into()),
        }
    }
}

impl Config {
    /// Reads the JSON config file when it exists; a missing file yields the
    /// defaults.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::metadata(path).await.is_err() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Loads `.env`, the config file and the process environment. Only the
    /// implicit `config.json` may be absent.
    pub async fn from_sources(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = match path {
            Some(p) if fs::metadata(p).await.is_err() => {
                return Err(Error::Config(format!("config file {} not found", p.display())).into());
            }
            Some(p) => p,
            None => Path::new(DEFAULT_CONFIG_PATH),
        };
        let mut config = Self::load(path).await?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value.trim().to_string();
            }
        };

        set(&mut self.completion.api_key, "GROQ_API_KEY");
        set(&mut self.completion.model, "COMPLETION_MODEL");
        set(&mut self.pexels.api_key, "PEXELS_API_KEY");
        set(&mut self.speech.azure_key, "AZURE_SPEECH_KEY");
        set(&mut self.speech.azure_region, "AZURE_SPEECH_REGION");
        set(&mut self.speech.elevenlabs_key, "ELEVENLABS_API_KEY");
        set(&mut self.cloudinary.cloud_name, "CLOUDINARY_CLOUD_NAME");
        set(&mut self.cloudinary.api_key, "CLOUDINARY_API_KEY");
        set(&mut self.cloudinary.api_secret, "CLOUDINARY_API_SECRET");
    }

    pub fn require_completion_key(&self) -> Result<()> {
        if self.completion.api_key.is_empty() {
            return Err(Error::MissingCredential("GROQ_API_KEY").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(dir.path().join("nope.json")).await.unwrap();
        assert_eq!(cfg.completion.model, "llama-3.3-70b-versatile");
        assert_eq!(cfg.cloudinary.public_id, "video_ig");
        assert_eq!(cfg.speech.voice, "es-ES-AlvaroNeural");
    }

    #[tokio::test]
    async fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"completion": {"api_key": "k1", "temperature": 0.7},
                "speech": {"elevenlabs_api_key": "el"}}"#,
        )
        .unwrap();

        let cfg = Config::load(&path).await.unwrap();
        assert_eq!(cfg.completion.api_key, "k1");
        assert!((cfg.completion.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.completion.max_tokens, 1500);
        assert_eq!(cfg.speech.elevenlabs_key, "el");
        assert_eq!(cfg.speech.eleven_model_id, "eleven_multilingual_v2");
    }

    #[tokio::test]
    async fn explicit_config_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let typo = dir.path().join("confg.json");
        let err = Config::from_sources(Some(&typo)).await.unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::Config(msg)) => assert!(msg.contains("confg.json"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }

        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"pexels": {"api_key": "px"}}"#).unwrap();
        assert!(Config::from_sources(Some(&path)).await.is_ok());
    }

    #[test]
    fn env_overrides_non_empty_values_only() {
        let env: HashMap<&str, &str> = [
            ("GROQ_API_KEY", " gsk_123 "),
            ("PEXELS_API_KEY", ""),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.pexels.api_key = "from-file".to_string();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.completion.api_key, "gsk_123");
        assert_eq!(cfg.pexels.api_key, "from-file");
        assert_eq!(cfg.cloudinary.cloud_name, "demo");
    }

    #[test]
    fn completion_key_is_required() {
        let cfg = Config::default();
        let err = cfg.require_completion_key().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingCredential("GROQ_API_KEY"))
        ));
    }

    #[test]
    fn cloudinary_partial_credentials_are_rejected() {
        let mut c = CloudinaryConfig::default();
        assert!(!c.is_configured().unwrap());
        c.cloud_name = "demo".into();
        assert!(c.is_configured().is_err());
        c.api_key = "key".into();
        c.api_secret = "secret".into();
        assert!(c.is_configured().unwrap());
    }
}
