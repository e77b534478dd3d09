//! Helpers for object detection demos: download and resize an image, then draw the
//! detected boxes with their class names and scores on it.
pub mod common_structs;
pub mod display;
pub mod drawing;
pub mod image_fetching;

pub use anyhow::{Error, Result};

pub use common_structs::{load_detections, BoundingBox, Detection, PixelBox};
pub use display::{display_image, DisplaySurface, Figure, FigureBuffer, FigureFile};
pub use drawing::{
    color_for_class, display_label, draw_bounding_box, draw_boxes, draw_detections,
    named_color, DrawOptions, FontSpec, LabelFont, PALETTE,
};
pub use image_fetching::{fetch, fetch_default};
