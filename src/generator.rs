use crate::api::completion;
use crate::config::CompletionConfig;
use crate::phrases::PhraseSet;
use crate::topics::{TOPICS, pick_topic};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Back-off after a failed generation in continuous mode.
pub const FAILURE_BACKOFF: Duration = Duration::from_secs(60);

/// Wait before the next continuous-mode iteration.
pub fn next_pause(ok: bool, interval: Duration) -> Duration {
    if ok { interval } else { FAILURE_BACKOFF }
}

pub struct PhraseGenerator {
    client: reqwest::Client,
    cfg: CompletionConfig,
    output: PathBuf,
    count: usize,
    catalog: &'static [&'static str],
    rng: StdRng,
}

impl PhraseGenerator {
    pub fn new(cfg: CompletionConfig, output: PathBuf, count: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            cfg,
            output,
            count,
            catalog: TOPICS,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Picks a topic and asks for phrases. `None` when the API gave nothing
    /// usable; the topic is discarded with it.
    pub async fn generate(&mut self) -> Result<Option<PhraseSet>> {
        let Some(topic) = pick_topic(self.catalog, &mut self.rng) else {
            logw("Topic catalog is empty");
            return Ok(None);
        };
        logi(format!("Topic selected: '{}'", topic));

        let phrases =
            completion::request_phrases(&self.client, &self.cfg, topic, self.count).await?;
        match phrases {
            Some(phrases) => {
                logok(format!("{} phrases generated about '{}'", phrases.len(), topic));
                Ok(Some(PhraseSet::new(topic, phrases)))
            }
            None => Ok(None),
        }
    }

    /// One generation, persisted on success. Returns whether it succeeded.
    pub async fn run_once(&mut self, display: bool) -> Result<bool> {
        logi(format!(
            "Phrase generation - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        let Some(set) = self.generate().await? else {
            logw("No phrases could be generated");
            return Ok(false);
        };

        if display {
            print!("{}", render_listing(&set));
        }

        set.save(&self.output)?;
        logok(format!(
            "Saved {} phrases on '{}' to {}",
            set.phrase_count,
            set.topic,
            self.output.display()
        ));
        Ok(true)
    }

    /// Generates forever, `interval` apart after a success and
    /// `FAILURE_BACKOFF` apart after a failure, until Ctrl-C.
    pub async fn run_forever(&mut self, interval: Duration) -> Result<u64> {
        logi(format!(
            "Continuous generator: every {} min, file {}, {} topics. Ctrl-C to stop.",
            interval.as_secs() / 60,
            self.output.display(),
            self.catalog.len()
        ));

        let mut iteration: u64 = 1;
        loop {
            logi(format!("Iteration #{}", iteration));

            let ok = tokio::select! {
                res = self.run_once(true) => match res {
                    Ok(ok) => ok,
                    Err(err) => {
                        logw(format!("Generation error: {:#}", err));
                        false
                    }
                },
                _ = tokio::signal::ctrl_c() => break,
            };

            let pause = next_pause(ok, interval);
            if ok {
                let step =
                    chrono::Duration::from_std(pause).unwrap_or_else(|_| chrono::Duration::zero());
                logi(format!(
                    "Waiting {} min, next run at {}",
                    pause.as_secs() / 60,
                    (Local::now() + step).format("%H:%M:%S")
                ));
            } else {
                logw("Generation failed, retrying in 1 minute");
            }

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = tokio::signal::ctrl_c() => break,
            }
            if ok {
                iteration += 1;
            }
        }

        logok(format!(
            "Generator stopped by user after {} iterations; last file: {}",
            iteration,
            self.output.display()
        ));
        Ok(iteration)
    }
}

pub fn render_listing(set: &PhraseSet) -> String {
    let rule = "=".repeat(70);
    let mut out = format!(
        "\n{rule}\nGENERATED PHRASES\n{rule}\n\nTOPIC: {}\n{rule}\n",
        set.topic
    );
    for (i, phrase) in set.phrases.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, phrase));
    }
    out.push_str(&format!("\n{rule}\n\n"));
    out
}
