use crate::api::{azure, elevenlabs, google_tts};
use crate::config::SpeechConfig;
use crate::error::Error;
use crate::ffmpeg;
use crate::{logi, logw};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// A text-to-speech engine that writes an mp3 to `out_path`.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<()>;
}

/// Providers tried in order until one produces audio.
pub struct SpeechChain {
    providers: Vec<Box<dyn SpeechProvider>>,
}

impl SpeechChain {
    pub fn new(providers: Vec<Box<dyn SpeechProvider>>) -> Self {
        Self { providers }
    }

    /// Neural voice first when Azure credentials exist, ElevenLabs next when
    /// keyed, the keyless Google voice always last.
    pub fn from_config(client: &Client, cfg: &SpeechConfig) -> Self {
        let mut providers: Vec<Box<dyn SpeechProvider>> = Vec::new();
        if !cfg.azure_key.is_empty() && !cfg.azure_region.is_empty() {
            providers.push(Box::new(azure::AzureNeuralVoice::new(client.clone(), cfg)));
        }
        if !cfg.elevenlabs_key.is_empty() {
            providers.push(Box::new(elevenlabs::ElevenLabsVoice::new(client.clone(), cfg)));
        }
        providers.push(Box::new(google_tts::GoogleTranslateVoice::new(
            client.clone(),
            &cfg.fallback_lang,
        )));
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Name of the provider that succeeded.
    pub async fn synthesize(&self, text: &str, out_path: &Path) -> Result<&'static str> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.synthesize(text, out_path).await {
                Ok(()) => return Ok(provider.name()),
                Err(err) => {
                    logw(format!("{} TTS failed: {:#}", provider.name(), err));
                    failures.push(format!("{}: {:#}", provider.name(), err));
                }
            }
        }
        if failures.is_empty() {
            failures.push("no providers configured".to_string());
        }
        Err(Error::SpeechExhausted(failures.join("; ")).into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub path: PathBuf,
    pub duration: f64,
}

/// Produces a narration track and its length in seconds.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, text: &str, out_path: &Path) -> Result<Narration>;
}

/// `SpeechChain` plus an ffprobe duration measurement.
pub struct SpeechNarrator {
    chain: SpeechChain,
}

impl SpeechNarrator {
    pub fn new(chain: SpeechChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl Narrator for SpeechNarrator {
    async fn narrate(&self, text: &str, out_path: &Path) -> Result<Narration> {
        let provider = self.chain.synthesize(text, out_path).await?;
        let duration = ffmpeg::ffprobe_duration_seconds(out_path).await?;
        logi(format!("Narration via {} ({:.2}s)", provider, duration));
        Ok(Narration {
            path: out_path.to_path_buf(),
            duration,
        })
    }
}

/// ElevenLabs speed multiplier for a signed percentage such as `-15%`,
/// clamped to the 0.7..=1.2 range the API accepts.
pub fn rate_to_speed(rate: &str) -> f32 {
    let pct = rate
        .trim()
        .trim_end_matches('%')
        .parse::<f32>()
        .unwrap_or(0.0);
    (1.0 + pct / 100.0).clamp(0.7, 1.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Scripted {
        name: &'static str,
        ok: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl SpeechProvider for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn synthesize(&self, _text: &str, out_path: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(self.name);
            if self.ok {
                tokio::fs::write(out_path, b"ID3").await?;
                Ok(())
            } else {
                anyhow::bail!("{} unavailable", self.name)
            }
        }
    }

    fn chain(
        script: &[(&'static str, bool)],
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> SpeechChain {
        let providers = script
            .iter()
            .map(|&(name, ok)| {
                Box::new(Scripted {
                    name,
                    ok,
                    calls: Arc::clone(calls),
                }) as Box<dyn SpeechProvider>
            })
            .collect();
        SpeechChain::new(providers)
    }

    #[tokio::test]
    async fn falls_through_to_first_working_provider() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = chain(&[("neural", false), ("simple", true), ("never", true)], &calls);
        let dir = tempfile::tempdir().unwrap();
        let used = chain
            .synthesize("hola", &dir.path().join("a.mp3"))
            .await
            .unwrap();
        assert_eq!(used, "simple");
        assert_eq!(*calls.lock().unwrap(), vec!["neural", "simple"]);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = chain(&[("neural", false), ("simple", false)], &calls);
        let dir = tempfile::tempdir().unwrap();
        let err = chain
            .synthesize("hola", &dir.path().join("a.mp3"))
            .await
            .unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::SpeechExhausted(msg)) => {
                assert!(msg.contains("neural: neural unavailable"));
                assert!(msg.contains("simple: simple unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn config_without_keys_uses_only_the_fallback_voice() {
        let chain = SpeechChain::from_config(&Client::new(), &SpeechConfig::default());
        assert_eq!(chain.provider_names(), vec!["google-translate"]);
    }

    #[test]
    fn full_config_orders_neural_first() {
        let cfg = SpeechConfig {
            azure_key: "k".into(),
            azure_region: "westeurope".into(),
            elevenlabs_key: "e".into(),
            ..SpeechConfig::default()
        };
        let chain = SpeechChain::from_config(&Client::new(), &cfg);
        assert_eq!(
            chain.provider_names(),
            vec!["azure-neural", "elevenlabs", "google-translate"]
        );
    }

    #[test]
    fn rate_maps_to_clamped_speed() {
        assert!((rate_to_speed("-15%") - 0.85).abs() < 1e-6);
        assert!((rate_to_speed("+50%") - 1.2).abs() < 1e-6);
        assert!((rate_to_speed("garbage") - 1.0).abs() < 1e-6);
    }
}
