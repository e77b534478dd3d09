use ab_glyph::{FontArc, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FONT_PATH: &str =
    "/usr/share/fonts/truetype/liberation/LiberationSansNarrow-Regular.ttf";
pub const DEFAULT_FONT_SIZE: f32 = 25.;
/// Size the embedded fallback font is drawn at
pub const BUILTIN_FONT_SIZE: f32 = 11.;

static BUILTIN_FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

/// Which font file to draw labels with and at which pixel size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub path: PathBuf,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec {
            path: PathBuf::from(DEFAULT_FONT_PATH),
            size: DEFAULT_FONT_SIZE,
        }
    }
}

/// A font already scaled to the size labels are drawn at
#[derive(Clone)]
pub struct LabelFont {
    font: FontArc,
    scale: PxScale,
}

impl LabelFont {
    /// Loads a TrueType/OpenType font file
    pub fn from_file<P: AsRef<Path>>(path: P, size: f32) -> Result<LabelFont> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Error reading font file {}", path.display()))?;
        let font = FontArc::try_from_vec(data)
            .with_context(|| format!("Invalid font file {}", path.display()))?;
        Ok(LabelFont {
            font,
            scale: PxScale::from(size),
        })
    }

    /// The font embedded in the crate, always available
    pub fn builtin() -> LabelFont {
        let font = FontArc::try_from_slice(BUILTIN_FONT_DATA).expect("Embedded font is invalid");
        LabelFont {
            font,
            scale: PxScale::from(BUILTIN_FONT_SIZE),
        }
    }

    /// Loads the requested font, falling back to the builtin one if it can't be read
    pub fn load_or_default(spec: &FontSpec) -> LabelFont {
        match LabelFont::from_file(&spec.path, spec.size) {
            Ok(font) => font,
            Err(e) => {
                tracing::warn!(path = %spec.path.display(), "Font not found, using default font: {:#}", e);
                LabelFont::builtin()
            }
        }
    }

    pub fn size(&self) -> f32 {
        self.scale.y
    }

    /// Width and height of the rendered text, measured from the drawing origin
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        text_size(self.scale, &self.font, text)
    }

    pub fn draw_text(&self, img: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        draw_text_mut(img, color, x, y, self.scale, &self.font, text);
    }
}
