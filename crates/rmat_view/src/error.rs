use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Unknown view group '{0}'")]
    UnknownGroup(String),

    #[error("Unknown view '{0}'")]
    UnknownView(String),

    #[error("View position {position} out of range for group of {len} views")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Cannot remove the last view of group '{0}'")]
    EmptyGroup(String),
}

pub type Result<T> = std::result::Result<T, ViewError>;
