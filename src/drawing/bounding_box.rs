use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::fonts::LabelFont;
use super::label_layout::stack_labels;
use crate::common_structs::{BoundingBox, PixelBox};

pub const DEFAULT_THICKNESS: u32 = 4;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Rect covering (x0, y0) to (x1, y1), both corners included.
/// None if it would be empty.
fn inclusive_rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Option<Rect> {
    if x1 < x0 || y1 < y0 {
        return None;
    }
    Some(Rect::at(x0, y0).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32))
}

/// Draws the box outline `thickness` pixels wide, centered on the box edges
fn draw_outline(img: &mut RgbImage, px: &PixelBox, color: Rgb<u8>, thickness: u32) {
    let (left, top) = (px.left.round() as i32, px.top.round() as i32);
    let (right, bottom) = (px.right.round() as i32, px.bottom.round() as i32);
    let half = (thickness / 2) as i32;
    for i in 0..thickness as i32 {
        let inset = i - half;
        if let Some(rect) = inclusive_rect(left + inset, top + inset, right - inset, bottom - inset) {
            draw_hollow_rect_mut(img, rect, color);
        }
    }
}

/// Draws one box and its labels, stacked above the top edge, onto `img`
pub fn draw_bounding_box(
    img: &mut RgbImage,
    bb: &BoundingBox,
    color: Rgb<u8>,
    font: &LabelFont,
    thickness: u32,
    labels: &[String],
) {
    let (img_width, img_height) = img.dimensions();
    let px = bb.to_pixels(img_width, img_height);
    draw_outline(img, &px, color, thickness);

    let label_sizes: Vec<(u32, u32)> = labels.iter().map(|label| font.text_size(label)).collect();
    let placements = stack_labels(px.left, px.top, &label_sizes);
    for (label, placement) in labels.iter().zip(placements) {
        let (x0, y0) = placement.background_top_left;
        let (x1, y1) = placement.background_bottom_right;
        if let Some(background) = inclusive_rect(
            x0.round() as i32,
            y0.round() as i32,
            x1.round() as i32,
            y1.round() as i32,
        ) {
            draw_filled_rect_mut(img, background, color);
        }
        let (text_x, text_y) = placement.text_origin;
        font.draw_text(img, LABEL_TEXT_COLOR, text_x.round() as i32, text_y.round() as i32, label);
    }
}
