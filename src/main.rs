use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use mindful_shorts::config::Config;
use mindful_shorts::generator::PhraseGenerator;
use mindful_shorts::init_tracing;
use mindful_shorts::phrases::DEFAULT_PHRASE_FILE;

/// Generates themed mindfulness phrases with an LLM and saves them as JSON.
#[derive(Debug, Parser)]
#[command(name = "mindful-phrases", version)]
struct Args {
    /// Phrase file to write
    #[arg(short, long, default_value = DEFAULT_PHRASE_FILE)]
    output: PathBuf,

    /// Phrases per generation
    #[arg(
        short = 'n',
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    count: u32,

    /// Minutes between generations in continuous mode
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Keep generating until Ctrl-C
    #[arg(long)]
    continuous: bool,

    /// Do not print the phrases
    #[arg(long)]
    no_display: bool,

    /// Completion API key (overrides GROQ_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn run(args: Args) -> Result<()> {
    let mut cfg = Config::from_sources(args.config.as_deref()).await?;
    if let Some(key) = args.api_key {
        cfg.completion.api_key = key;
    }
    cfg.require_completion_key()?;

    let mut generator = PhraseGenerator::new(cfg.completion, args.output, args.count as usize)?;
    if args.continuous {
        generator
            .run_forever(Duration::from_secs(args.interval * 60))
            .await?;
        return Ok(());
    }

    if !generator.run_once(!args.no_display).await? {
        anyhow::bail!("no phrases were generated");
    }
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
