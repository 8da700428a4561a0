use crate::config::SpeechConfig;
use crate::speech::SpeechProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Neural voice over the Azure Speech REST endpoint. Rate and pitch ride in
/// the SSML prosody element.
pub struct AzureNeuralVoice {
    client: Client,
    key: String,
    region: String,
    voice: String,
    rate: String,
    pitch: String,
}

impl AzureNeuralVoice {
    pub fn new(client: Client, cfg: &SpeechConfig) -> Self {
        Self {
            client,
            key: cfg.azure_key.clone(),
            region: cfg.azure_region.clone(),
            voice: cfg.voice.clone(),
            rate: cfg.rate.clone(),
            pitch: cfg.pitch.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Language tag of a voice name such as `es-ES-AlvaroNeural`.
fn voice_lang(voice: &str) -> String {
    voice.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
}

pub fn build_ssml(text: &str, voice: &str, rate: &str, pitch: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{}'><voice name='{}'><prosody rate='{}' pitch='{}'>{}</prosody></voice></speak>",
        voice_lang(voice),
        xml_escape(voice),
        xml_escape(rate),
        xml_escape(pitch),
        xml_escape(text)
    )
}

#[async_trait]
impl SpeechProvider for AzureNeuralVoice {
    fn name(&self) -> &'static str {
        "azure-neural"
    }

    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()> {
        let ssml = build_ssml(text, &self.voice, &self.rate, &self.pitch);
        let resp = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "mindful-shorts")
            .body(ssml)
            .timeout(std::time::Duration::from_secs(60))
            .send()
            .await
            .context("Azure speech request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Azure speech HTTP {}", resp.status().as_u16());
        }

        let bytes = resp.bytes().await.context("Azure speech response read failed")?;
        if bytes.is_empty() {
            anyhow::bail!("Azure speech returned no audio");
        }
        fs::write(out_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        Ok(())
    }
}
