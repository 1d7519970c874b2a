//! Global constants for the mask editor

/// Start and end marker of a stored mask payload
pub const MAGIC_BYTE: u8 = 254;

/// A class needs strictly more user pixels than this to take part in prediction
pub const MIN_CLASS_PIXELS: usize = 10;

/// Number of mask snapshots kept for undo
pub const DEFAULT_MAX_EPOCHS: usize = 10;

/// Share of a class's user pixels used for training
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// Upper bound of training pixels per class
pub const DEFAULT_MAX_TRAIN_PIXELS: usize = 20_000;

/// Seed of the sampling generator
pub const DEFAULT_SEED: u32 = 42;

/// Initial brush edge length in image pixels
pub const DEFAULT_TOOL_SIZE: f64 = 3.0;

/// Palette of the errors view: unevaluated, correct, incorrect
pub const ERROR_COLOURS: [[u8; 4]; 3] = [[255, 255, 255, 0], [0, 255, 0, 70], [255, 70, 70, 255]];

/// Transparent entry used for pixels without a user label
pub const TRANSPARENT: [u8; 4] = [255, 255, 255, 0];
