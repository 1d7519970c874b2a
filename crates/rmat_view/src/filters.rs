//! Shared display filters applied to every RGB layer at render time.

use serde::{Deserialize, Serialize};

/// Brightness change per step, in percent.
pub const BRIGHTNESS_STEP: u32 = 10;
/// Upper brightness bound, in percent.
pub const BRIGHTNESS_MAX: u32 = 200;
/// Saturation change per step, in percent.
pub const SATURATION_STEP: u32 = 50;
/// Upper saturation bound, in percent.
pub const SATURATION_MAX: u32 = 800;
/// Contrast factor used while contrast enhancement is on.
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Brightness/contrast/saturation/invert state shared by all views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFilters {
    /// Brightness in percent (100 = unchanged)
    pub brightness: u32,
    /// Saturation in percent (100 = unchanged)
    pub saturation: u32,
    /// Contrast enhancement toggle
    pub contrast: bool,
    /// Colour inversion toggle
    pub invert: bool,
}

impl ImageFilters {
    pub fn new() -> Self {
        Self {
            brightness: 100,
            saturation: 100,
            contrast: false,
            invert: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn change_brightness(&mut self, up: bool) {
        self.brightness = if up {
            (self.brightness + BRIGHTNESS_STEP).min(BRIGHTNESS_MAX)
        } else {
            self.brightness.saturating_sub(BRIGHTNESS_STEP)
        };
        log::debug!("Brightness: {}%", self.brightness);
    }

    pub fn change_saturation(&mut self, up: bool) {
        self.saturation = if up {
            (self.saturation + SATURATION_STEP).min(SATURATION_MAX)
        } else {
            self.saturation.saturating_sub(SATURATION_STEP)
        };
        log::debug!("Saturation: {}%", self.saturation);
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::new()
    }

    /// Filter one RGBA pixel: invert, brightness, contrast, saturate (in
    /// that order, clamping after every stage). Alpha is left untouched.
    pub fn apply(&self, pixel: [u8; 4]) -> [u8; 4] {
        if self.is_identity() {
            return pixel;
        }

        let mut rgb = [
            f32::from(pixel[0]) / 255.0,
            f32::from(pixel[1]) / 255.0,
            f32::from(pixel[2]) / 255.0,
        ];

        if self.invert {
            for v in &mut rgb {
                *v = 1.0 - *v;
            }
        }

        let brightness = self.brightness as f32 / 100.0;
        for v in &mut rgb {
            *v = (*v * brightness).clamp(0.0, 1.0);
        }

        if self.contrast {
            for v in &mut rgb {
                *v = ((*v - 0.5) * CONTRAST_FACTOR + 0.5).clamp(0.0, 1.0);
            }
        }

        let s = self.saturation as f32 / 100.0;
        let [r, g, b] = rgb;
        let saturated = [
            (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
        ];

        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            to_byte(saturated[0]),
            to_byte(saturated[1]),
            to_byte(saturated[2]),
            pixel[3],
        ]
    }
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self::new()
    }
}
