#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use mindful_shorts::assembler::VideoAssembler;
use mindful_shorts::media::MediaSource;
use mindful_shorts::overlay::TextOverlay;
use mindful_shorts::segment::{Background, SegmentJob, VideoRenderer};
use mindful_shorts::speech::{Narration, Narrator};
use mindful_shorts::upload::{UploadReceipt, Uploader};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct Calls {
    pub media: Arc<AtomicUsize>,
    pub narrations: Arc<Mutex<Vec<(String, f64)>>>,
    pub segments: Arc<Mutex<Vec<SegmentJob>>>,
    pub concat_inputs: Arc<Mutex<Vec<PathBuf>>>,
    pub uploads: Arc<AtomicUsize>,
}

impl Calls {
    pub fn media_calls(&self) -> usize {
        self.media.load(Ordering::SeqCst)
    }

    pub fn segments(&self) -> Vec<SegmentJob> {
        self.segments.lock().unwrap().clone()
    }

    pub fn narrations(&self) -> Vec<(String, f64)> {
        self.narrations.lock().unwrap().clone()
    }
}

/// One stock clip, then photos for every other slot.
pub struct FakeMedia {
    pub calls: Calls,
}

#[async_trait]
impl MediaSource for FakeMedia {
    async fn videos(&self, count: usize, dir: &Path) -> Vec<PathBuf> {
        self.calls.media.fetch_add(1, Ordering::SeqCst);
        let path = dir.join("pexels_0.mp4");
        std::fs::write(&path, b"clip").unwrap();
        vec![path].into_iter().take(count).collect()
    }

    async fn photos(&self, count: usize) -> Vec<DynamicImage> {
        self.calls.media.fetch_add(1, Ordering::SeqCst);
        (0..count)
            .map(|_| DynamicImage::ImageRgb8(RgbImage::new(64, 48)))
            .collect()
    }
}

/// Writes a stub mp3 and reports a length that grows with every call.
pub struct FakeNarrator {
    pub calls: Calls,
}

#[async_trait]
impl Narrator for FakeNarrator {
    async fn narrate(&self, text: &str, out_path: &Path) -> Result<Narration> {
        let mut log = self.calls.narrations.lock().unwrap();
        let duration = 2.5 + log.len() as f64 * 0.75;
        std::fs::write(out_path, text.as_bytes())?;
        log.push((text.to_string(), duration));
        Ok(Narration {
            path: out_path.to_path_buf(),
            duration,
        })
    }
}

/// With `reject_clips`, fails on stock clips the way ffprobe does on a
/// truncated download.
pub struct FakeRenderer {
    pub calls: Calls,
    pub reject_clips: bool,
}

#[async_trait]
impl VideoRenderer for FakeRenderer {
    async fn render_segment(&self, job: &SegmentJob) -> Result<()> {
        if let (true, Background::Video(path)) = (self.reject_clips, &job.background) {
            anyhow::bail!("ffprobe failed on {}", path.display());
        }
        std::fs::write(&job.output, format!("{}|{:.3}\n", job.text, job.duration()))?;
        self.calls.segments.lock().unwrap().push(job.clone());
        Ok(())
    }

    async fn concat(&self, segments: &[PathBuf], _work_dir: &Path, output: &Path) -> Result<()> {
        let mut joined = Vec::new();
        for seg in segments {
            joined.extend(std::fs::read(seg)?);
        }
        std::fs::write(output, joined)?;
        self.calls.concat_inputs.lock().unwrap().extend_from_slice(segments);
        Ok(())
    }
}

pub struct FakeUploader {
    pub calls: Calls,
    pub fail: bool,
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, video: &Path) -> Result<UploadReceipt> {
        self.calls.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("hosting unavailable");
        }
        assert!(video.exists());
        Ok(UploadReceipt {
            url: "https://res.cloudinary.com/demo/video/upload/mindfulness_videos/video_ig.mp4"
                .into(),
            public_id: self.public_id().to_string(),
            format: Some("mp4".into()),
            duration: Some(12.0),
        })
    }

    fn public_id(&self) -> &str {
        "mindfulness_videos/video_ig"
    }
}

pub fn assembler(calls: &Calls) -> VideoAssembler {
    build(calls, false)
}

pub fn assembler_rejecting_clips(calls: &Calls) -> VideoAssembler {
    build(calls, true)
}

fn build(calls: &Calls, reject_clips: bool) -> VideoAssembler {
    VideoAssembler::new(
        Box::new(FakeMedia {
            calls: calls.clone(),
        }),
        Box::new(FakeNarrator {
            calls: calls.clone(),
        }),
        TextOverlay::disabled(),
        Box::new(FakeRenderer {
            calls: calls.clone(),
            reject_clips,
        }),
    )
    .with_rng(StdRng::seed_from_u64(7))
}

pub fn assembler_with_upload(calls: &Calls, fail: bool) -> VideoAssembler {
    assembler(calls).with_uploader(Box::new(FakeUploader {
        calls: calls.clone(),
        fail,
    }))
}
