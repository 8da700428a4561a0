use crate::config::SpeechConfig;
use crate::speech::{SpeechProvider, rate_to_speed};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::path::Path;
use tokio::fs;

pub struct ElevenLabsVoice {
    client: Client,
    key: String,
    voice_id: String,
    model_id: String,
    speed: f32,
}

impl ElevenLabsVoice {
    pub fn new(client: Client, cfg: &SpeechConfig) -> Self {
        Self {
            client,
            key: cfg.elevenlabs_key.clone(),
            voice_id: cfg.eleven_voice_id.clone(),
            model_id: cfg.eleven_model_id.clone(),
            speed: rate_to_speed(&cfg.rate),
        }
    }

    fn body(&self, text: &str) -> Value {
        json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {"speed": self.speed},
        })
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsVoice {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str, out_mp3_path: &Path) -> Result<()> {
        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}?output_format=mp3_44100_128",
            self.voice_id
        );

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.key)
            .json(&self.body(text))
            .timeout(std::time::Duration::from_secs(60))
            .send()
            .await
            .context("ElevenLabs request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("ElevenLabs TTS failed HTTP {}", resp.status().as_u16());
        }

        let bytes = resp.bytes().await.context("ElevenLabs response read failed")?;
        if let Some(parent) = out_mp3_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }
        fs::write(out_mp3_path, &bytes).await?;
        Ok(())
    }
}
