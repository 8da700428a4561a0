use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use mindful_shorts::assembler::{AssemblerOptions, VideoAssembler};
use mindful_shorts::config::Config;
use mindful_shorts::init::{check_ffmpeg, ensure_parent_dir};
use mindful_shorts::init_tracing;
use mindful_shorts::media::SourcePolicy;
use mindful_shorts::phrases::DEFAULT_PHRASE_FILE;

/// Builds a narrated vertical video from a phrase file and uploads it.
#[derive(Debug, Parser)]
#[command(name = "mindful-video", version)]
struct Args {
    /// Stock media API key (overrides PEXELS_API_KEY)
    #[arg(long)]
    pexels_key: Option<String>,

    #[arg(long)]
    cloudinary_name: Option<String>,

    #[arg(long)]
    cloudinary_key: Option<String>,

    #[arg(long)]
    cloudinary_secret: Option<String>,

    /// Output video; defaults to video_<topic>_<timestamp>.mp4
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Phrase file to read
    #[arg(long, default_value = DEFAULT_PHRASE_FILE)]
    json: PathBuf,

    /// Use photos only, never stock videos
    #[arg(long, conflicts_with = "only_videos")]
    only_images: bool,

    /// Use stock videos only, never photos
    #[arg(long)]
    only_videos: bool,

    /// TrueType font for the text overlay
    #[arg(long)]
    font: Option<PathBuf>,

    /// Keep the video local
    #[arg(long)]
    no_upload: bool,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn policy(&self) -> SourcePolicy {
        SourcePolicy {
            videos: !self.only_images,
            photos: !self.only_videos,
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut cfg = Config::from_sources(args.config.as_deref()).await?;
    let overrides = [
        (&args.pexels_key, &mut cfg.pexels.api_key),
        (&args.cloudinary_name, &mut cfg.cloudinary.cloud_name),
        (&args.cloudinary_key, &mut cfg.cloudinary.api_key),
        (&args.cloudinary_secret, &mut cfg.cloudinary.api_secret),
    ];
    for (flag, target) in overrides {
        if let Some(value) = flag {
            *target = value.clone();
        }
    }

    check_ffmpeg().await?;

    let opts = AssemblerOptions {
        policy: args.policy(),
        font: args.font.clone(),
        upload: !args.no_upload,
    };
    let mut assembler = VideoAssembler::from_config(&cfg, &opts)?;

    if let Some(output) = &args.output {
        ensure_parent_dir(output).await?;
    }
    let report = assembler.run(&args.json, args.output.clone()).await?;

    println!("{}", report.video.display());
    if let Some(record) = &report.record {
        println!("{}", record.url);
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
