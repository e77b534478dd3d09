use anyhow::{ensure, Context, Result};
use image::RgbImage;
use itertools::izip;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bounding_box::{draw_bounding_box, DEFAULT_THICKNESS};
use super::colors::{color_for_class, PALETTE};
use super::fonts::{FontSpec, LabelFont};
use crate::common_structs::{BoundingBox, Detection};

pub const DEFAULT_MAX_BOXES: usize = 10;
pub const DEFAULT_MIN_SCORE: f32 = 0.1;

/// How many and which detections get drawn, and with which font and line width
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOptions {
    /// Only the first `max_boxes` detections are considered, whatever their scores
    pub max_boxes: usize,
    pub min_score: f32,
    pub thickness: u32,
    pub font: FontSpec,
}

impl Default for DrawOptions {
    fn default() -> Self {
        DrawOptions {
            max_boxes: DEFAULT_MAX_BOXES,
            min_score: DEFAULT_MIN_SCORE,
            thickness: DEFAULT_THICKNESS,
            font: FontSpec::default(),
        }
    }
}

/// Label shown above a box, like "cat: 87%"
pub fn display_label(class_name: &str, score: f32) -> String {
    format!("{}: {}%", class_name, (100. * score) as i64)
}

/// Detections that get drawn, in index order.
/// The first `max_boxes` entries are looked at and the ones scoring below `min_score` dropped.
pub fn select_detections<'a, S: AsRef<str> + 'a>(
    boxes: &'a [BoundingBox],
    class_names: &'a [S],
    scores: &'a [f32],
    max_boxes: usize,
    min_score: f32,
) -> impl Iterator<Item = (&'a BoundingBox, &'a str, f32)> + 'a {
    izip!(boxes, class_names, scores)
        .take(max_boxes)
        .filter(move |(_, _, score)| **score >= min_score)
        .map(|(bb, class_name, score)| (bb, class_name.as_ref(), *score))
}

/// Draws the selected detections onto `img`, one color per class name.
/// Fails without drawing anything if the three slices differ in length.
pub fn draw_boxes<'a, S: AsRef<str>>(
    img: &'a mut RgbImage,
    boxes: &[BoundingBox],
    class_names: &[S],
    scores: &[f32],
    options: &DrawOptions,
) -> Result<&'a mut RgbImage> {
    ensure!(
        boxes.len() == class_names.len() && boxes.len() == scores.len(),
        "Got {} boxes, {} class names and {} scores",
        boxes.len(),
        class_names.len(),
        scores.len()
    );
    let font = LabelFont::load_or_default(&options.font);

    for (bb, class_name, score) in
        select_detections(boxes, class_names, scores, options.max_boxes, options.min_score)
    {
        let label = display_label(class_name, score);
        let color = color_for_class(class_name, &PALETTE).context("Color palette is empty")?;
        debug!(%label, ?bb, "drawing box");
        draw_bounding_box(img, bb, color, &font, options.thickness, &[label]);
    }
    Ok(img)
}

/// Same as [`draw_boxes`], taking the detections as structs
pub fn draw_detections<'a>(
    img: &'a mut RgbImage,
    detections: &[Detection],
    options: &DrawOptions,
) -> Result<&'a mut RgbImage> {
    let boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
    let class_names: Vec<&str> = detections.iter().map(|d| d.class_name.as_str()).collect();
    let scores: Vec<f32> = detections.iter().map(|d| d.score).collect();
    draw_boxes(img, &boxes, &class_names, &scores, options)
}
