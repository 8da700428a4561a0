use crate::api::pexels::PexelsClient;
use crate::error::{Error, Result};
use crate::segment::{FRAME_HEIGHT, FRAME_WIDTH};
use crate::topics::SEARCH_TERMS;
use crate::{logi, logw};
use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Placeholder colors: deep purple, gold, cream.
pub const PALETTE: [Rgb<u8>; 3] = [Rgb([72, 61, 139]), Rgb([218, 165, 32]), Rgb([255, 248, 220])];
const PLACEHOLDER_CIRCLES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest 9:16 window centered in a `width`×`height` frame. Wide sources
/// lose their sides, tall ones their top and bottom.
pub fn center_crop_rect(width: u32, height: u32) -> Result<CropRect> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let (w, h) = (u64::from(width), u64::from(height));
    let (tw, th) = (u64::from(FRAME_WIDTH), u64::from(FRAME_HEIGHT));

    let rect = if w * th > h * tw {
        let cw = (h * tw / th).max(1);
        CropRect {
            x: ((w - cw) / 2) as u32,
            y: 0,
            width: cw as u32,
            height,
        }
    } else {
        let ch = (w * th / tw).max(1);
        CropRect {
            x: 0,
            y: ((h - ch) / 2) as u32,
            width,
            height: ch as u32,
        }
    };
    Ok(rect)
}

/// Center-crops to 9:16 and resizes to the frame size.
pub fn normalize_image(img: &DynamicImage) -> Result<RgbImage> {
    let rect = center_crop_rect(img.width(), img.height())?;
    let cropped = img.crop_imm(rect.x, rect.y, rect.width, rect.height);
    Ok(imageops::resize(
        &cropped.to_rgb8(),
        FRAME_WIDTH,
        FRAME_HEIGHT,
        FilterType::Lanczos3,
    ))
}

/// Writes a frame; the format follows the extension.
pub fn save_frame(img: &RgbImage, path: &Path) -> Result<()> {
    img.save(path)?;
    Ok(())
}

fn fill_circle(img: &mut RgbImage, cx: i64, cy: i64, r: i64, color: Rgb<u8>) {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    for y in (cy - r).max(0)..=(cy + r).min(h - 1) {
        let dy = y - cy;
        let span = ((r * r - dy * dy) as f64).sqrt() as i64;
        for x in (cx - span).max(0)..=(cx + span).min(w - 1) {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Abstract filler: palette background with random palette-colored discs.
pub fn generate_placeholder<R: Rng + ?Sized>(rng: &mut R) -> RgbImage {
    let mut img = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, PALETTE[0]);
    for _ in 0..PLACEHOLDER_CIRCLES {
        let cx = rng.gen_range(0..=i64::from(FRAME_WIDTH));
        let cy = rng.gen_range(0..=i64::from(FRAME_HEIGHT));
        let r = rng.gen_range(50..=300);
        let color = PALETTE[rng.gen_range(0..PALETTE.len())];
        fill_circle(&mut img, cx, cy, r, color);
    }
    img
}

#[derive(Debug, Clone)]
pub enum MediaAsset {
    Video(PathBuf),
    Image(RgbImage),
}

impl MediaAsset {
    pub fn kind(&self) -> &'static str {
        match self {
            MediaAsset::Video(_) => "video",
            MediaAsset::Image(_) => "image",
        }
    }
}

/// Which stock sources a run may use. Generated placeholders are always
/// allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePolicy {
    pub videos: bool,
    pub photos: bool,
}

impl Default for SourcePolicy {
    fn default() -> Self {
        Self {
            videos: true,
            photos: true,
        }
    }
}

/// Stock footage provider.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Up to `count` portrait clips downloaded into `dir`.
    async fn videos(&self, count: usize, dir: &Path) -> Vec<PathBuf>;
    /// Up to `count` decoded portrait photos.
    async fn photos(&self, count: usize) -> Vec<DynamicImage>;
}

/// Pexels with a random search term and page per request.
pub struct PexelsMedia {
    client: PexelsClient,
    rng: Mutex<StdRng>,
}

impl PexelsMedia {
    pub fn new(client: PexelsClient, seed: u64) -> Self {
        Self {
            client,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn term_and_page(&self, max_page: u32) -> (&'static str, u32) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let term = SEARCH_TERMS[rng.gen_range(0..SEARCH_TERMS.len())];
        (term, rng.gen_range(1..=max_page))
    }
}

#[async_trait]
impl MediaSource for PexelsMedia {
    async fn videos(&self, count: usize, dir: &Path) -> Vec<PathBuf> {
        let (term, page) = self.term_and_page(5);
        logi(format!("Searching portrait videos: '{}'", term));
        let found = self.client.videos(term, count, page, dir).await;
        logi(format!("{} videos downloaded", found.len()));
        found
    }

    async fn photos(&self, count: usize) -> Vec<DynamicImage> {
        let (term, page) = self.term_and_page(10);
        logi(format!("Searching portrait photos: '{}'", term));
        let mut out = Vec::new();
        for bytes in self.client.photos(term, count, page).await {
            match image::load_from_memory(&bytes) {
                Ok(img) => out.push(img),
                Err(err) => logw(format!("Undecodable photo skipped: {}", err)),
            }
        }
        out
    }
}

async fn one_photo(source: &dyn MediaSource) -> Option<RgbImage> {
    for img in source.photos(1).await {
        match normalize_image(&img) {
            Ok(norm) => return Some(norm),
            Err(err) => logw(format!("Photo rejected: {}", err)),
        }
    }
    None
}

/// Intro background: a stock photo when allowed and available, else filler.
pub async fn intro_background<R: Rng + Send + ?Sized>(
    source: &dyn MediaSource,
    policy: SourcePolicy,
    rng: &mut R,
) -> MediaAsset {
    if policy.photos {
        if let Some(img) = one_photo(source).await {
            return MediaAsset::Image(img);
        }
    }
    MediaAsset::Image(generate_placeholder(rng))
}

/// Exactly `count` backgrounds: stock videos first, then one photo search
/// per missing slot, then generated filler.
pub async fn acquire_backgrounds<R: Rng + Send + ?Sized>(
    source: &dyn MediaSource,
    policy: SourcePolicy,
    count: usize,
    dir: &Path,
    rng: &mut R,
) -> Vec<MediaAsset> {
    let mut assets: Vec<MediaAsset> = Vec::with_capacity(count);

    if policy.videos {
        assets.extend(
            source
                .videos(count, dir)
                .await
                .into_iter()
                .take(count)
                .map(MediaAsset::Video),
        );
    }

    while assets.len() < count {
        let photo = if policy.photos {
            one_photo(source).await
        } else {
            None
        };
        let img = match photo {
            Some(img) => img,
            None => {
                logi("Using generated background");
                generate_placeholder(rng)
            }
        };
        assets.push(MediaAsset::Image(img));
    }
    assets
}
