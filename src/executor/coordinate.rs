use crate::perception::screenshot::{ANALYSIS_HEIGHT, ANALYSIS_WIDTH};

/// Ratio between the physical display and the fixed analysis resolution
/// the model reasons over. Derived once per session; uses the full
/// display bounds, not the usable work area, because the frame the model
/// sees is the whole screen downscaled.
#[derive(Debug, Clone, Copy)]
pub struct ScreenScale {
    sx: f64,
    sy: f64,
}

impl ScreenScale {
    pub fn from_device(device_width: u32, device_height: u32) -> Self {
        Self {
            sx: device_width as f64 / ANALYSIS_WIDTH as f64,
            sy: device_height as f64 / ANALYSIS_HEIGHT as f64,
        }
    }

    pub fn identity() -> Self {
        Self { sx: 1.0, sy: 1.0 }
    }

    /// Model-space point → device-space pixel, rounded.
    pub fn to_device(&self, x: i32, y: i32) -> (i32, i32) {
        (
            (x as f64 * self.sx).round() as i32,
            (y as f64 * self.sy).round() as i32,
        )
    }
}
