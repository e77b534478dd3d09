use anyhow::{ensure, Context, Result};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FIGURE_WIDTH_INCHES: f32 = 20.;
pub const FIGURE_HEIGHT_INCHES: f32 = 15.;
pub const FIGURE_DPI: u32 = 100;

// Axes area as fractions of the figure, measured from the left and from the top
const AXES_LEFT: f32 = 0.125;
const AXES_RIGHT: f32 = 0.9;
const AXES_TOP: f32 = 0.12;
const AXES_BOTTOM: f32 = 0.89;

const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Something a rendered figure can be shown on
pub trait DisplaySurface {
    fn show(&mut self, figure: &RgbImage) -> Result<()>;
}

/// Writes each figure shown to a png file, replacing the previous one
pub struct FigureFile {
    path: PathBuf,
}

impl FigureFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> FigureFile {
        FigureFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySurface for FigureFile {
    fn show(&mut self, figure: &RgbImage) -> Result<()> {
        figure
            .save_with_format(&self.path, ImageFormat::Png)
            .with_context(|| format!("Error saving figure to {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "figure saved");
        Ok(())
    }
}

/// Keeps the last figure shown in memory
#[derive(Default)]
pub struct FigureBuffer {
    last_figure: Option<RgbImage>,
}

impl FigureBuffer {
    pub fn new() -> FigureBuffer {
        FigureBuffer::default()
    }

    pub fn last_figure(&self) -> Option<&RgbImage> {
        self.last_figure.as_ref()
    }
}

impl DisplaySurface for FigureBuffer {
    fn show(&mut self, figure: &RgbImage) -> Result<()> {
        self.last_figure = Some(figure.clone());
        Ok(())
    }
}

/// Size of the figure an image is shown in, always drawn without grid lines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub width_in: f32,
    pub height_in: f32,
    pub dpi: u32,
}

impl Default for Figure {
    fn default() -> Self {
        Figure {
            width_in: FIGURE_WIDTH_INCHES,
            height_in: FIGURE_HEIGHT_INCHES,
            dpi: FIGURE_DPI,
        }
    }
}

impl Figure {
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f32).round() as u32,
            (self.height_in * self.dpi as f32).round() as u32,
        )
    }

    /// Places `img` in the axes area of a blank figure, scaled to fit with its
    /// aspect ratio kept, and frames it.
    pub fn render(&self, img: &RgbImage) -> Result<RgbImage> {
        let (img_width, img_height) = img.dimensions();
        ensure!(img_width > 0 && img_height > 0, "Can't display an empty image");
        let (fig_width, fig_height) = self.pixel_size();
        ensure!(
            fig_width > 0 && fig_height > 0,
            "Figure of {}x{} inches at {} dpi has no pixels",
            self.width_in,
            self.height_in,
            self.dpi
        );
        let mut canvas = RgbImage::from_pixel(fig_width, fig_height, BACKGROUND_COLOR);

        let axes_left = AXES_LEFT * fig_width as f32;
        let axes_top = AXES_TOP * fig_height as f32;
        let axes_width = (AXES_RIGHT - AXES_LEFT) * fig_width as f32;
        let axes_height = (AXES_BOTTOM - AXES_TOP) * fig_height as f32;
        let ratio = (axes_width / img_width as f32).min(axes_height / img_height as f32);
        let shown_width = ((img_width as f32 * ratio).round() as u32).max(1);
        let shown_height = ((img_height as f32 * ratio).round() as u32).max(1);

        let shown = imageops::resize(img, shown_width, shown_height, FilterType::Triangle);

        let x = (axes_left + (axes_width - shown_width as f32) / 2.).round() as i64;
        let y = (axes_top + (axes_height - shown_height as f32) / 2.).round() as i64;
        imageops::overlay(&mut canvas, &shown, x, y);
        let frame = Rect::at(x as i32 - 1, y as i32 - 1).of_size(shown_width + 2, shown_height + 2);
        draw_hollow_rect_mut(&mut canvas, frame, FRAME_COLOR);
        Ok(canvas)
    }
}

/// Shows `img` on `surface` in a 20x15 inch figure, without grid lines
pub fn display_image(img: &RgbImage, surface: &mut dyn DisplaySurface) -> Result<()> {
    let figure = Figure::default().render(img)?;
    surface.show(&figure)
}
