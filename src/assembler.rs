use crate::api::cloudinary::CloudinaryClient;
use crate::api::pexels::PexelsClient;
use crate::config::Config;
use crate::ffmpeg::FfmpegRenderer;
use crate::media::{self, MediaAsset, MediaSource, PexelsMedia, SourcePolicy};
use crate::overlay::TextOverlay;
use crate::phrases::{PhraseSet, topic_slug};
use crate::segment::{Background, Effect, SegmentJob, VideoRenderer};
use crate::speech::{Narrator, SpeechChain, SpeechNarrator};
use crate::upload::{UploadRecord, Uploader};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

pub fn intro_text(topic: &str) -> String {
    format!("Tres frases sobre {}", topic)
}

/// `video_{slug}_{YYYYmmdd_HHMMSS}.mp4`
pub fn default_output_name(topic: &str, at: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "video_{}_{}.mp4",
        topic_slug(topic),
        at.format("%Y%m%d_%H%M%S")
    ))
}

#[derive(Debug, Clone, Default)]
pub struct AssemblerOptions {
    pub policy: SourcePolicy,
    pub font: Option<PathBuf>,
    pub upload: bool,
}

#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub video: PathBuf,
    pub topic: String,
    pub segments: usize,
    pub durations: Vec<f64>,
    pub record: Option<UploadRecord>,
    pub record_path: Option<PathBuf>,
}

/// Builds one vertical video from a phrase file: an intro segment plus one
/// segment per phrase, concatenated, then optionally uploaded.
pub struct VideoAssembler {
    media: Box<dyn MediaSource>,
    narrator: Box<dyn Narrator>,
    overlay: TextOverlay,
    renderer: Box<dyn VideoRenderer>,
    uploader: Option<Box<dyn Uploader>>,
    policy: SourcePolicy,
    output_dir: PathBuf,
    rng: StdRng,
}

impl VideoAssembler {
    pub fn new(
        media: Box<dyn MediaSource>,
        narrator: Box<dyn Narrator>,
        overlay: TextOverlay,
        renderer: Box<dyn VideoRenderer>,
    ) -> Self {
        Self {
            media,
            narrator,
            overlay,
            renderer,
            uploader: None,
            policy: SourcePolicy::default(),
            output_dir: PathBuf::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_uploader(mut self, uploader: Box<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_policy(mut self, policy: SourcePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Where default-named videos go; the working directory otherwise.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Production wiring: Pexels, the speech chain, ffmpeg and Cloudinary.
    /// Half-configured Cloudinary credentials fail here, before any work.
    pub fn from_config(cfg: &Config, opts: &AssemblerOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        if cfg.pexels.api_key.is_empty() {
            logw("No Pexels key, backgrounds will be generated");
        }
        let pexels = PexelsClient::new(client.clone(), cfg.pexels.clone());
        let media = PexelsMedia::new(pexels, rand::random());

        let chain = SpeechChain::from_config(&client, &cfg.speech);
        logi(format!("Speech providers: {}", chain.provider_names().join(" -> ")));

        let mut assembler = Self::new(
            Box::new(media),
            Box::new(SpeechNarrator::new(chain)),
            TextOverlay::load(opts.font.as_deref()),
            Box::new(FfmpegRenderer),
        )
        .with_policy(opts.policy);

        let configured = cfg.cloudinary.is_configured()?;
        if opts.upload && configured {
            let uploader = CloudinaryClient::new(client, &cfg.cloudinary);
            assembler = assembler.with_uploader(Box::new(uploader));
        }
        Ok(assembler)
    }

    fn stage_background(
        &self,
        asset: MediaAsset,
        index: usize,
        work_dir: &Path,
    ) -> Result<Background> {
        match asset {
            MediaAsset::Video(path) => Ok(Background::Video(path)),
            MediaAsset::Image(img) => {
                let path = work_dir.join(format!("background_{}.png", index));
                media::save_frame(&img, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(Background::Image(path))
            }
        }
    }

    pub async fn run(
        &mut self,
        phrase_file: &Path,
        output: Option<PathBuf>,
    ) -> Result<AssemblyReport> {
        let set = PhraseSet::load(phrase_file).await?;
        let phrases = set.video_phrases(phrase_file)?.to_vec();
        logi(format!("Building video on '{}' ({} phrases)", set.topic, phrases.len()));

        let work = tempfile::Builder::new()
            .prefix("mindful_video_")
            .tempdir()
            .context("Failed to create work dir")?;
        let work_dir = work.path();

        let intro = media::intro_background(self.media.as_ref(), self.policy, &mut self.rng).await;
        let backgrounds = media::acquire_backgrounds(
            self.media.as_ref(),
            self.policy,
            phrases.len(),
            work_dir,
            &mut self.rng,
        )
        .await;

        let texts: Vec<String> = std::iter::once(intro_text(&set.topic))
            .chain(phrases.iter().cloned())
            .collect();
        let assets = std::iter::once(intro).chain(backgrounds);

        let mut segments = Vec::with_capacity(texts.len());
        let mut durations = Vec::with_capacity(texts.len());
        for (index, (text, asset)) in texts.iter().zip(assets).enumerate() {
            logi(format!("Segment {}/{} ({})", index + 1, texts.len(), asset.kind()));
            let background = self.stage_background(asset, index, work_dir)?;

            let narration = self
                .narrator
                .narrate(text, &work_dir.join(format!("narration_{}.mp3", index)))
                .await?;

            let overlay_path = work_dir.join(format!("overlay_{}.png", index));
            let overlay = self
                .overlay
                .write_png(text, &overlay_path)?
                .then_some(overlay_path);

            let mut job = SegmentJob {
                index,
                text: text.clone(),
                background,
                overlay,
                narration,
                effect: Effect::random(&mut self.rng),
                output: work_dir.join(format!("segment_{}.mp4", index)),
            };
            if let Err(err) = self.renderer.render_segment(&job).await {
                if !matches!(job.background, Background::Video(_)) {
                    return Err(err);
                }
                // Unreadable stock clip: one retry over generated art.
                logw(format!("Clip rejected, using a placeholder: {:#}", err));
                let still = MediaAsset::Image(media::generate_placeholder(&mut self.rng));
                job.background = self.stage_background(still, index, work_dir)?;
                self.renderer.render_segment(&job).await?;
            }
            durations.push(job.duration());
            segments.push(job.output);
        }

        let now = Local::now();
        let output =
            output.unwrap_or_else(|| self.output_dir.join(default_output_name(&set.topic, now)));
        self.renderer.concat(&segments, work_dir, &output).await?;
        logok(format!("Video written: {}", output.display()));

        let (record, record_path) = self.publish(&output, &set.topic, now).await;
        Ok(AssemblyReport {
            video: output,
            topic: set.topic,
            segments: segments.len(),
            durations,
            record,
            record_path,
        })
    }

    /// Upload problems are logged; the local video stays valid either way.
    async fn publish(
        &self,
        video: &Path,
        topic: &str,
        now: DateTime<Local>,
    ) -> (Option<UploadRecord>, Option<PathBuf>) {
        let Some(uploader) = &self.uploader else {
            logw(format!("Upload skipped, video kept at {}", video.display()));
            return (None, None);
        };

        logi(format!("Uploading as '{}'", uploader.public_id()));
        let receipt = match uploader.upload(video).await {
            Ok(r) => r,
            Err(err) => {
                logw(format!("Upload failed: {:#}", err));
                return (None, None);
            }
        };

        let size = tokio::fs::metadata(video).await.map(|m| m.len()).unwrap_or(0);
        let record = UploadRecord::new(receipt, topic, now, size);
        logok(format!("Uploaded: {}", record.url));
        match record.save_beside(video) {
            Ok(path) => {
                logi(format!("Upload record: {}", path.display()));
                (Some(record), Some(path))
            }
            Err(err) => {
                logw(format!("Upload record not saved: {:#}", err));
                (Some(record), None)
            }
        }
    }
}
