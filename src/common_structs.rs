use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
/// Frequently used structs shared by the fetcher and the renderers

/// A Bounding Box in normalized coordinates, each edge a fraction (0 to 1)
/// of the image height (y) or width (x).
/// ymin <= ymax and xmin <= xmax is expected but not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
}

impl BoundingBox {
    pub fn new(ymin: f32, xmin: f32, ymax: f32, xmax: f32) -> Self {
        BoundingBox {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    /// Converts to absolute pixel coordinates for an image of the given size
    pub fn to_pixels(&self, img_width: u32, img_height: u32) -> PixelBox {
        PixelBox {
            left: self.xmin * img_width as f32,
            right: self.xmax * img_width as f32,
            top: self.ymin * img_height as f32,
            bottom: self.ymax * img_height as f32,
        }
    }
}

/// A Bounding Box in absolute (unrounded) pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// One model output: a box with its class name and confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_name: String,
    pub score: f32,
}

/// Reads a json array of detections, such as the ones dumped by an inference run
pub fn load_detections<P: AsRef<Path>>(json_file_path: P) -> Result<Vec<Detection>> {
    let json_file_path = json_file_path.as_ref();
    let file = File::open(json_file_path)
        .with_context(|| format!("Detections file {} not found", json_file_path.display()))?;
    let detections: Vec<Detection> = serde_json::from_reader(file)
        .with_context(|| format!("Invalid detections file {}", json_file_path.display()))?;
    Ok(detections)
}
