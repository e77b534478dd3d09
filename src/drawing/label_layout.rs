/// Margin above and below each label, as a fraction of the label height
pub const LABEL_MARGIN_RATIO: f64 = 0.05;

/// Where one label strip goes. Corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub background_top_left: (f32, f32),
    pub background_bottom_right: (f32, f32),
    pub text_origin: (f32, f32),
}

/// Lays out label strips above a box whose top-left corner is (left, top).
///
/// `label_sizes` are the (width, height) of each rendered label, in drawing order.
/// If there isn't room above `top` for every label, the stack is pushed down so its
/// first strip ends at `top` plus the reserved height.
/// Each strip moves the cursor up by its height minus both margins, so consecutive
/// strips overlap by a few pixels.
pub fn stack_labels(left: f32, top: f32, label_sizes: &[(u32, u32)]) -> Vec<LabelPlacement> {
    let left = f64::from(left);
    let top = f64::from(top);
    let heights_sum: f64 = label_sizes.iter().map(|(_, h)| f64::from(*h)).sum();
    let total_height = (1. + 2. * LABEL_MARGIN_RATIO) * heights_sum;

    let mut text_bottom = if top > total_height {
        top
    } else {
        top + total_height
    };

    label_sizes
        .iter()
        .map(|&(text_width, text_height)| {
            let (text_width, text_height) = (f64::from(text_width), f64::from(text_height));
            let margin = (LABEL_MARGIN_RATIO * text_height).ceil();
            let placement = LabelPlacement {
                background_top_left: (
                    left as f32,
                    (text_bottom - text_height - 2. * margin) as f32,
                ),
                background_bottom_right: ((left + text_width) as f32, text_bottom as f32),
                text_origin: (
                    (left + margin) as f32,
                    (text_bottom - text_height - margin) as f32,
                ),
            };
            text_bottom -= text_height - 2. * margin;
            placement
        })
        .collect()
}
