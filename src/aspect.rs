use serde::{Deserialize, Serialize};

/// Preset buttons shown in the toolbar, in display order. `None` is free cropping.
pub const PRESETS: &[(&str, Option<f32>)] = &[
    ("Free", None),
    ("1:1", Some(1.0)),
    ("16:9", Some(16.0 / 9.0)),
    ("4:3", Some(4.0 / 3.0)),
];

const RATIO_EPSILON: f32 = 1e-4;

/// Width:height pair as typed by the user. Kept as text so half-typed
/// values survive a restart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomRatio {
    pub width: String,
    pub height: String,
}

impl CustomRatio {
    pub fn new(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
        }
    }

    /// `width / height` when both sides are positive numbers.
    pub fn ratio(&self) -> Option<f32> {
        let w = parse_side(&self.width)?;
        let h = parse_side(&self.height)?;
        let ratio = w / h;
        ratio.is_finite().then_some(ratio)
    }
}

fn parse_side(text: &str) -> Option<f32> {
    text.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

pub fn ratio_matches(a: Option<f32>, b: Option<f32>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() < RATIO_EPSILON,
        _ => false,
    }
}

/// Ratio of the selection in normalised image space, where a square
/// selection of a 2:1 image has width 0.5 and height 1.0.
pub fn normalized_aspect(ratio: f32, image_width: f32, image_height: f32) -> f32 {
    ratio * (image_height / image_width)
}
