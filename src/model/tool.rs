//! Brush state.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOOL_SIZE;

/// What a left-button drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Draw,
    Eraser,
    Move,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Draw => "draw",
            ToolKind::Eraser => "eraser",
            ToolKind::Move => "move",
        }
    }
}

/// Square brush. `size` changes continuously (wheel resizing) and is
/// rounded only when rasterising.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tool {
    pub kind: ToolKind,
    size: f64,
}

impl Tool {
    pub fn new(kind: ToolKind, size: f64) -> Self {
        Self {
            kind,
            size: size.max(1.0),
        }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Set the size, never below one pixel.
    pub fn set_size(&mut self, size: f64) {
        self.size = size.max(1.0);
    }

    /// Edge length in whole pixels.
    pub fn rounded_size(&self) -> u32 {
        round_half_up(self.size).max(1) as u32
    }

    /// Offset of the brush's top-left corner from the cursor.
    pub fn offset(&self) -> i64 {
        let size = self.rounded_size();
        if size == 1 {
            0
        } else {
            round_half_up(-f64::from(size) / 2.0)
        }
    }

    /// Grow or shrink by half the current size per wheel notch, staying
    /// within `1..=max_size`.
    pub fn resize_by_wheel(&mut self, delta: f64, max_size: u32) {
        let delta = delta.clamp(-1.0, 1.0);
        let size = self.size + delta * 0.5 * self.size;
        let size = size.clamp(1.0, f64::from(max_size.max(1)));
        self.size = round_half_up(size) as f64;
        log::debug!("Tool size: {}", self.size);
    }
}

impl Default for Tool {
    fn default() -> Self {
        Self::new(ToolKind::Draw, DEFAULT_TOOL_SIZE)
    }
}

/// Round to the nearest integer, halves towards positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
