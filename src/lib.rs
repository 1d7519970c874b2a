//! rmat - Raster Mask Annotation Tool
//!
//! Editing engine for per-pixel segmentation masks. An [`EditingSession`]
//! owns the label buffers of one image together with their undo history and
//! the prediction pipeline; the [`Editor`] routes pointer and key input to it
//! and to the `rmat_view` ports that display the result.

pub mod assist;
pub mod backend;
pub mod config;
pub mod constants;
pub mod drawing;
pub mod editor;
pub mod format;
pub mod history;
pub mod keybindings;
pub mod mask;
pub mod model;
pub mod session;

#[cfg(test)]
mod tests;

pub use backend::{BackendError, MaskStore, PredictRequest, Predictor};
pub use config::{ConfigError, LogLevel, ProjectConfig};
pub use editor::{Editor, Navigation, Notice, PointerEvent};
pub use keybindings::{Command, KeyBindings, KeyCode};
pub use session::{EditingSession, LoadOutcome, SessionError};

/// Install the global logger at `level`. Later calls are ignored.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: LogLevel) {
    let result = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .format_timestamp_millis()
        .try_init();
    if result.is_ok() {
        log::debug!("Logging at {}", level.name());
    }
}

/// Set the maximum log level; the host page installs the logger itself.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: LogLevel) {
    log::set_max_level(level.to_level_filter());
}
