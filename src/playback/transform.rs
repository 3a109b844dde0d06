use std::sync::Arc;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::error::{MatrixError, MatrixResult};

/// Pure per-frame image transform applied just before drawing.
pub type Transform = Arc<dyn Fn(&RgbaImage) -> RgbaImage + Send + Sync>;

/// Clockwise rotation in quarter turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    /// 90 degrees clockwise.
    Cw90,
    /// 180 degrees.
    Cw180,
    /// 270 degrees clockwise.
    Cw270,
}

impl Rotation {
    /// Parse an angle in degrees; only 90, 180 and 270 are accepted.
    pub fn from_degrees(deg: u32) -> MatrixResult<Self> {
        match deg {
            90 => Ok(Self::Cw90),
            180 => Ok(Self::Cw180),
            270 => Ok(Self::Cw270),
            other => Err(MatrixError::validation(format!(
                "rotation must be 90, 180 or 270 degrees, got {other}"
            ))),
        }
    }
}

/// Rotate every frame.
pub fn rotate(r: Rotation) -> Transform {
    Arc::new(move |img: &RgbaImage| match r {
        Rotation::Cw90 => imageops::rotate90(img),
        Rotation::Cw180 => imageops::rotate180(img),
        Rotation::Cw270 => imageops::rotate270(img),
    })
}

/// Scale every frame to cover `width` x `height`, then crop the overflow around the center.
pub fn fill(width: u32, height: u32) -> Transform {
    Arc::new(move |img: &RgbaImage| {
        if img.width() == 0 || img.height() == 0 || width == 0 || height == 0 {
            return RgbaImage::new(width, height);
        }
        let scale = f64::max(
            f64::from(width) / f64::from(img.width()),
            f64::from(height) / f64::from(img.height()),
        );
        let sw = ((f64::from(img.width()) * scale).ceil() as u32).max(width);
        let sh = ((f64::from(img.height()) * scale).ceil() as u32).max(height);
        let scaled = imageops::resize(img, sw, sh, FilterType::Lanczos3);
        let x = (sw - width) / 2;
        let y = (sh - height) / 2;
        imageops::crop_imm(&scaled, x, y, width, height).to_image()
    })
}

#[cfg(test)]
#[path = "../../tests/unit/playback/transform.rs"]
mod tests;
