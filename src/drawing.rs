//! Drawing detections onto images: box outlines, stacked labels, class colors and fonts
pub mod bounding_box;
pub mod box_set;
pub mod colors;
pub mod fonts;
pub mod label_layout;

pub use bounding_box::{draw_bounding_box, DEFAULT_THICKNESS};
pub use box_set::{display_label, draw_boxes, draw_detections, select_detections, DrawOptions};
pub use colors::{color_for_class, named_color, PALETTE};
pub use fonts::{FontSpec, LabelFont};
