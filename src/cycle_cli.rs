use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use mindful_shorts::assembler::{AssemblerOptions, VideoAssembler};
use mindful_shorts::config::Config;
use mindful_shorts::cycle::{CycleRunner, DEFAULT_CYCLE_INTERVAL};
use mindful_shorts::generator::PhraseGenerator;
use mindful_shorts::init::check_ffmpeg;
use mindful_shorts::init_tracing;
use mindful_shorts::phrases::DEFAULT_PHRASE_FILE;

/// Generates phrases and builds a video from them, over and over.
#[derive(Debug, Parser)]
#[command(name = "mindful-cycle", version)]
struct Args {
    /// Phrase file shared by both stages
    #[arg(long, default_value = DEFAULT_PHRASE_FILE)]
    json: PathBuf,

    /// Minutes between cycles
    #[arg(
        long,
        default_value_t = DEFAULT_CYCLE_INTERVAL.as_secs() / 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Phrases per generation
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(3..))]
    count: u32,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn run(args: Args) -> Result<()> {
    let cfg = Config::from_sources(args.config.as_deref()).await?;
    cfg.require_completion_key()?;
    check_ffmpeg().await?;

    let generator = PhraseGenerator::new(cfg.completion.clone(), args.json, args.count as usize)?;
    let assembler = VideoAssembler::from_config(
        &cfg,
        &AssemblerOptions {
            upload: true,
            ..AssemblerOptions::default()
        },
    )?;

    let interval = Duration::from_secs(args.interval * 60);
    let mut runner = CycleRunner::new(generator, assembler, interval);
    let cycles = runner.run_forever().await;
    println!("{} cycles completed", cycles);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run(Args::parse()).await {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}
