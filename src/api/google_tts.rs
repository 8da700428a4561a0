use crate::speech::SpeechProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const ENDPOINT: &str = "https://translate.google.com/translate_tts";
/// The endpoint rejects longer inputs.
const MAX_CHUNK_CHARS: usize = 100;
const SLOW_SPEED: &str = "0.3";

/// Keyless fallback voice: the Translate speech endpoint, slow speed, one
/// request per chunk, mp3 frames concatenated.
pub struct GoogleTranslateVoice {
    client: Client,
    lang: String,
}

impl GoogleTranslateVoice {
    pub fn new(client: Client, lang: &str) -> Self {
        Self {
            client,
            lang: lang.to_string(),
        }
    }
}

/// Splits on whitespace into chunks of at most `max` characters; a word
/// longer than `max` is cut into `max`-sized pieces.
pub fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current.chars().count() + 1 + word_len
        };
        if needed > max {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechProvider for GoogleTranslateVoice {
    fn name(&self) -> &'static str {
        "google-translate"
    }

    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("nothing to speak");
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let resp = self
                .client
                .get(ENDPOINT)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.lang.as_str()),
                    ("ttsspeed", SLOW_SPEED),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .header("User-Agent", "Mozilla/5.0")
                .timeout(std::time::Duration::from_secs(30))
                .send()
                .await
                .context("Translate TTS request failed")?;

            if !resp.status().is_success() {
                anyhow::bail!("Translate TTS HTTP {}", resp.status().as_u16());
            }
            audio.extend_from_slice(&resp.bytes().await.context("Translate TTS read failed")?);
        }

        fs::write(out_path, &audio)
            .await
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        Ok(())
    }
}
