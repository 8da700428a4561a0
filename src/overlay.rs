use crate::segment::{FRAME_HEIGHT, FRAME_WIDTH};
use crate::{logi, logw};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use rusttype::{Font, Scale, point};
use std::path::{Path, PathBuf};

pub const FONT_SIZE: f32 = 60.0;
pub const MAX_TEXT_WIDTH: f32 = 980.0;
pub const LINE_HEIGHT: f32 = 80.0;
const SHADOW_RADIUS: i32 = 3;
const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 200]);
const TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Bold system fonts tried when no explicit font is given.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "arial.ttf",
];

/// Greedy word wrap. A word wider than `max_width` gets a line of its own.
pub fn wrap_words<F: Fn(&str) -> f32>(text: &str, max_width: f32, measure: F) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if current.is_empty() || measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Vertical centers of `count` lines stacked around `center_y`.
pub fn line_centers(count: usize, center_y: f32, line_height: f32) -> Vec<f32> {
    let total = count as f32 * line_height;
    let start = center_y - total / 2.0 + line_height / 2.0;
    (0..count).map(|i| start + i as f32 * line_height).collect()
}

/// Source-over compositing of `src` scaled by `coverage` onto `dst`.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let sa = (f32::from(src[3]) / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = f32::from(src[c]);
        let dc = f32::from(dst[c]);
        dst[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Renders centered phrase text to transparent frame-sized PNGs.
pub struct TextOverlay {
    font: Option<Font<'static>>,
}

impl TextOverlay {
    /// Tries `explicit` first, then [`FONT_CANDIDATES`]. Without a usable font
    /// the overlay is disabled and segments render without text.
    pub fn load(explicit: Option<&Path>) -> Self {
        let candidates = explicit
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
        for path in candidates {
            match Self::from_file(&path) {
                Ok(overlay) => {
                    logi(format!("Overlay font: {}", path.display()));
                    return overlay;
                }
                Err(err) => tracing::debug!("font {} unusable: {:#}", path.display(), err),
            }
        }
        logw("No usable font found, videos will have no text overlay");
        Self::disabled()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let font = Font::try_from_vec(data)
            .with_context(|| format!("{} is not a TrueType font", path.display()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn disabled() -> Self {
        Self { font: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.font.is_some()
    }

    fn scale() -> Scale {
        Scale::uniform(FONT_SIZE)
    }

    /// Advance width of `text` at the overlay size. Zero when disabled.
    pub fn measure(&self, text: &str) -> f32 {
        let Some(font) = &self.font else {
            return 0.0;
        };
        font.layout(text, Self::scale(), point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    pub fn wrap(&self, text: &str) -> Vec<String> {
        wrap_words(text, MAX_TEXT_WIDTH, |s| self.measure(s))
    }

    fn draw_line(
        &self,
        font: &Font<'static>,
        img: &mut RgbaImage,
        line: &str,
        center: (f32, f32),
        color: Rgba<u8>,
    ) {
        let scale = Self::scale();
        let v = font.v_metrics(scale);
        let x0 = center.0 - self.measure(line) / 2.0;
        // anchor on the midpoint between ascender and descender
        let baseline = center.1 + (v.ascent + v.descent) / 2.0;
        let (w, h) = (img.width() as i32, img.height() as i32);

        for glyph in font.layout(line, scale, point(x0, baseline)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let x = bb.min.x + gx as i32;
                let y = bb.min.y + gy as i32;
                if x >= 0 && y >= 0 && x < w && y < h {
                    blend(img.get_pixel_mut(x as u32, y as u32), color, coverage);
                }
            });
        }
    }

    /// Text with a dark halo centered on the frame, or `None` when disabled.
    pub fn render(&self, text: &str) -> Option<RgbaImage> {
        let font = self.font.as_ref()?;
        let mut img = RgbaImage::new(FRAME_WIDTH, FRAME_HEIGHT);
        let lines = self.wrap(text);
        let cx = FRAME_WIDTH as f32 / 2.0;
        let centers = line_centers(lines.len(), FRAME_HEIGHT as f32 / 2.0, LINE_HEIGHT);

        for (line, cy) in lines.iter().zip(centers) {
            for dx in -SHADOW_RADIUS..=SHADOW_RADIUS {
                for dy in -SHADOW_RADIUS..=SHADOW_RADIUS {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    self.draw_line(font, &mut img, line, (cx + dx as f32, cy + dy as f32), SHADOW);
                }
            }
            self.draw_line(font, &mut img, line, (cx, cy), TEXT);
        }
        Some(img)
    }

    /// Writes the overlay PNG. `Ok(false)` when disabled.
    pub fn write_png(&self, text: &str, path: &Path) -> Result<bool> {
        let Some(img) = self.render(text) else {
            return Ok(false);
        };
        img.save(path)
            .with_context(|| format!("Failed to write overlay {}", path.display()))?;
        Ok(true)
    }
}
