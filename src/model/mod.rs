//! Data models for the mask editor.

mod class;
mod tool;

pub use class::{MaskClass, default_classes};
pub use tool::{Tool, ToolKind, round_half_up};
