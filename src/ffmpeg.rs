use crate::error::Error;
use crate::logi;
use crate::media::{CropRect, center_crop_rect};
use crate::segment::{
    Background, Effect, FADE_SECONDS, FPS, FRAME_HEIGHT, FRAME_WIDTH, SegmentJob, VideoRenderer,
    ZOOM_RANGE,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

const VIDEO_BITRATE: &str = "5000k";
const AUDIO_BITRATE: &str = "192k";
const CONCAT_LIST: &str = "concat_list.txt";

async fn run_cmd(args: &[String]) -> Result<()> {
    let Some((program, rest)) = args.split_first() else {
        return Ok(());
    };

    let output = Command::new(program)
        .args(rest)
        .output()
        .await
        .with_context(|| format!("Failed to launch {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        let detail = tail.into_iter().rev().collect::<Vec<_>>().join(" | ");
        let msg = format!("{} exited with {}: {}", program, output.status, detail);
        return Err(Error::Ffmpeg(msg).into());
    }
    Ok(())
}

pub async fn ffprobe_video_dimensions(path: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe execution failed")?;

    if !output.status.success() {
        anyhow::bail!("ffprobe failed on {}", path.display());
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let mut parts = text.split('x');
    let w = parts.next().and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(0);
    let h = parts.next().and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(0);

    if w == 0 || h == 0 {
        return Err(Error::InvalidDimensions { width: w, height: h }.into());
    }
    Ok((w, h))
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        anyhow::bail!("ffprobe failed on {}", path.display());
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        anyhow::bail!("Invalid duration '{}' for {}", text, path.display());
    }
    Ok(duration)
}

/// How the background input is fed to the filter graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundInput {
    /// Frame-sized still, looped.
    Still,
    /// Stock clip cropped to 9:16 at the given rectangle, looped if short.
    Clip(CropRect),
}

fn frame_count(duration: f64) -> u64 {
    ((duration * f64::from(FPS)).ceil() as u64).max(1)
}

pub fn effect_filter(effect: Effect, duration: f64) -> String {
    let frames = frame_count(duration);
    let zoompan = |z: String| {
        format!(
            "zoompan=z='{}':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={}x{}:fps={}",
            z, FRAME_WIDTH, FRAME_HEIGHT, FPS
        )
    };
    match effect {
        Effect::ZoomIn => zoompan(format!("1+{:.1}*on/{}", ZOOM_RANGE, frames)),
        Effect::ZoomOut => zoompan(format!(
            "{:.1}-{:.1}*on/{}",
            1.0 + ZOOM_RANGE,
            ZOOM_RANGE,
            frames
        )),
        Effect::Fade => format!(
            "fade=t=in:st=0:d={fade},fade=t=out:st={out:.3}:d={fade}",
            fade = FADE_SECONDS,
            out = (duration - FADE_SECONDS).max(0.0)
        ),
    }
}

pub fn background_filter(input: BackgroundInput) -> String {
    let scale = format!("scale={}:{},setsar=1,fps={}", FRAME_WIDTH, FRAME_HEIGHT, FPS);
    match input {
        BackgroundInput::Still => scale,
        BackgroundInput::Clip(r) => {
            format!("crop={}:{}:{}:{},{}", r.width, r.height, r.x, r.y, scale)
        }
    }
}

/// Full `-filter_complex` graph for one segment. Input 0 is the background,
/// input 1 the overlay when present.
pub fn segment_filter(
    input: BackgroundInput,
    effect: Effect,
    duration: f64,
    overlay: bool,
) -> String {
    let base = format!(
        "[0:v]{},{}",
        background_filter(input),
        effect_filter(effect, duration)
    );
    if !overlay {
        return format!("{},format=yuv420p[v]", base);
    }
    format!(
        "{base}[bg];[1:v]format=rgba,fade=t=in:st=0:d={fade}:alpha=1,fade=t=out:st={out:.3}:d={fade}:alpha=1[ov];[bg][ov]overlay=0:0,format=yuv420p[v]",
        fade = FADE_SECONDS,
        out = (duration - FADE_SECONDS).max(0.0)
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn encode_args() -> Vec<String> {
    let mut args = vec!["-r".to_string(), FPS.to_string()];
    args.extend(strings(&[
        "-c:v",
        "libx264",
        "-preset",
        "medium",
        "-b:v",
        VIDEO_BITRATE,
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-b:a",
        AUDIO_BITRATE,
        "-ar",
        "44100",
        "-ac",
        "2",
    ]));
    args
}

pub fn segment_args(job: &SegmentJob, input: BackgroundInput) -> Vec<String> {
    let duration = job.duration();
    let fps = FPS.to_string();
    let mut args = strings(&["ffmpeg", "-y", "-hide_banner", "-loglevel", "error"]);

    let background = match &job.background {
        Background::Image(p) | Background::Video(p) => p,
    };
    match input {
        BackgroundInput::Still => args.extend(strings(&["-loop", "1", "-framerate", fps.as_str()])),
        BackgroundInput::Clip(_) => args.extend(strings(&["-stream_loop", "-1"])),
    }
    args.push("-i".to_string());
    args.push(background.display().to_string());

    let mut audio_index = 1;
    if let Some(overlay) = &job.overlay {
        args.extend(strings(&["-loop", "1", "-framerate", fps.as_str(), "-i"]));
        args.push(overlay.display().to_string());
        audio_index = 2;
    }
    args.push("-i".to_string());
    args.push(job.narration.path.display().to_string());

    args.push("-filter_complex".to_string());
    args.push(segment_filter(input, job.effect, duration, job.overlay.is_some()));
    args.extend(strings(&["-map", "[v]", "-map"]));
    args.push(format!("{}:a", audio_index));
    args.push("-t".to_string());
    args.push(format!("{:.3}", duration));
    args.extend(encode_args());
    args.push(job.output.display().to_string());
    args
}

/// Concat demuxer list; single quotes in paths are escaped for ffmpeg.
pub fn concat_list_contents(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
        .collect()
}

pub fn concat_args(list: &Path, output: &Path) -> Vec<String> {
    let mut args = strings(&[
        "ffmpeg",
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "concat",
        "-safe",
        "0",
        "-i",
    ]);
    args.push(list.display().to_string());
    args.push("-vf".to_string());
    args.push(format!("scale={}:{},setsar=1", FRAME_WIDTH, FRAME_HEIGHT));
    args.extend(encode_args());
    args.extend(strings(&["-movflags", "+faststart"]));
    args.push(output.display().to_string());
    args
}

/// Renders through the `ffmpeg`/`ffprobe` executables on `PATH`.
#[derive(Debug, Default, Clone)]
pub struct FfmpegRenderer;

impl FfmpegRenderer {
    async fn background_input(&self, background: &Background) -> Result<BackgroundInput> {
        match background {
            Background::Image(_) => Ok(BackgroundInput::Still),
            Background::Video(path) => {
                let (w, h) = ffprobe_video_dimensions(path).await?;
                Ok(BackgroundInput::Clip(center_crop_rect(w, h)?))
            }
        }
    }
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn render_segment(&self, job: &SegmentJob) -> Result<()> {
        let input = self.background_input(&job.background).await?;
        logi(format!(
            "Rendering segment {} ({:.2}s, {:?})",
            job.index,
            job.duration(),
            job.effect
        ));
        run_cmd(&segment_args(job, input))
            .await
            .with_context(|| format!("Segment {} render failed", job.index))?;
        if !job.output.exists() {
            return Err(Error::Ffmpeg(format!("segment {} produced no file", job.index)).into());
        }
        Ok(())
    }

    async fn concat(&self, segments: &[PathBuf], work_dir: &Path, output: &Path) -> Result<()> {
        let list = work_dir.join(CONCAT_LIST);
        fs::write(&list, concat_list_contents(segments))
            .await
            .with_context(|| format!("Failed to write {}", list.display()))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }

        run_cmd(&concat_args(&list, output))
            .await
            .context("Final encode failed")?;
        if !output.exists() {
            return Err(Error::Ffmpeg(format!("{} was not written", output.display())).into());
        }
        Ok(())
    }
}
