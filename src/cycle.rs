use crate::assembler::VideoAssembler;
use crate::generator::PhraseGenerator;
use crate::{logi, logok, logw};
use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleOutcome {
    pub generated: bool,
    pub video: Option<PathBuf>,
    pub uploaded_url: Option<String>,
}

/// Generation followed by assembly, repeated. A failed stage is logged and
/// the next stage still runs; assembly falls back to the last saved phrases.
pub struct CycleRunner {
    generator: PhraseGenerator,
    assembler: VideoAssembler,
    interval: Duration,
}

impl CycleRunner {
    pub fn new(generator: PhraseGenerator, assembler: VideoAssembler, interval: Duration) -> Self {
        Self {
            generator,
            assembler,
            interval,
        }
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();

        logi("Stage 1/2: phrase generation");
        match self.generator.run_once(true).await {
            Ok(true) => {
                logok("Phrase generation completed");
                outcome.generated = true;
            }
            Ok(false) => logw("Phrase generation produced nothing"),
            Err(err) => logw(format!("Phrase generation failed: {:#}", err)),
        }

        logi("Stage 2/2: video assembly");
        let phrase_file = self.generator.output().to_path_buf();
        match self.assembler.run(&phrase_file, None).await {
            Ok(report) => {
                logok(format!("Video assembly completed: {}", report.video.display()));
                outcome.uploaded_url = report.record.map(|r| r.url);
                outcome.video = Some(report.video);
            }
            Err(err) => logw(format!("Video assembly failed: {:#}", err)),
        }
        outcome
    }

    /// Cycles until Ctrl-C; returns the number of completed cycles.
    pub async fn run_forever(&mut self) -> u64 {
        logi("Starting continuous cycle, Ctrl-C to stop");
        let mut completed: u64 = 0;
        loop {
            logi(format!(
                "Cycle #{} - {}",
                completed + 1,
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ));

            tokio::select! {
                _ = self.run_cycle() => {}
                _ = tokio::signal::ctrl_c() => break,
            }
            completed += 1;
            logok(format!("Cycle {} completed", completed));
            logi(format!("Waiting {} min before the next cycle", self.interval.as_secs() / 60));

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        logok(format!("Stopped after {} completed cycles", completed));
        completed
    }
}
