use crate::speech::Narration;
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};

pub const FRAME_WIDTH: u32 = 1080;
pub const FRAME_HEIGHT: u32 = 1920;
pub const FPS: u32 = 30;
/// Length of every fade, overlay and background alike.
pub const FADE_SECONDS: f64 = 0.3;
/// Zoom effects travel between 1.0 and 1.0 plus this.
pub const ZOOM_RANGE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    ZoomIn,
    ZoomOut,
    Fade,
}

impl Effect {
    pub const ALL: [Effect; 3] = [Effect::ZoomIn, Effect::ZoomOut, Effect::Fade];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    /// Still already normalized to the frame size.
    Image(PathBuf),
    /// Stock clip at its native size; cropped and looped while rendering.
    Video(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SegmentJob {
    pub index: usize,
    pub text: String,
    pub background: Background,
    pub overlay: Option<PathBuf>,
    pub narration: Narration,
    pub effect: Effect,
    pub output: PathBuf,
}

impl SegmentJob {
    pub fn duration(&self) -> f64 {
        self.narration.duration
    }
}

/// Turns segment jobs into clips and clips into the final video.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render_segment(&self, job: &SegmentJob) -> Result<()>;

    /// Joins `segments` in order and encodes the delivery profile into
    /// `output`. `work_dir` holds any scratch files.
    async fn concat(&self, segments: &[PathBuf], work_dir: &Path, output: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn random_effects_cover_all_variants() {
        let mut rng = StdRng::seed_from_u64(11);
        let seen: HashSet<_> = (0..100).map(|_| Effect::random(&mut rng)).collect();
        assert_eq!(seen.len(), Effect::ALL.len());
    }
}
