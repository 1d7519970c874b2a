//! Contracts of the backend services the editor talks to.
//!
//! Requests are asynchronous but the engine is single-threaded: futures are
//! awaited on the UI's executor and never need to be `Send`.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AiConfig;

/// Failure of a backend request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The server answered with an error status
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never got an answer
    #[error("Transport error: {0}")]
    Transport(String),
}

impl BackendError {
    /// Failure on the server's side (status 500 and above).
    pub fn is_server_error(&self) -> bool {
        matches!(self, BackendError::Status { status, .. } if *status >= 500)
    }
}

/// Persistent storage of mask payloads.
pub trait MaskStore {
    /// Fetch the stored payload; `Ok(None)` means no mask exists yet (404).
    fn load_mask(&self, image_id: &str)
    -> impl Future<Output = Result<Option<Vec<u8>>, BackendError>>;

    fn save_mask(
        &self,
        image_id: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), BackendError>>;
}

/// Server-side classifier.
pub trait Predictor {
    /// Train on the request's pixels and return one label per mask pixel.
    fn predict_mask(
        &self,
        image_id: &str,
        request: &PredictRequest,
    ) -> impl Future<Output = Result<Vec<u8>, BackendError>>;
}

/// Model hyper-parameters sent along with the training pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub n_estimators: u32,
    pub max_depth: u32,
    pub n_leaves: u32,
    pub include_context: bool,
}

impl From<&AiConfig> for ModelSettings {
    fn from(config: &AiConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            n_leaves: config.n_leaves,
            include_context: config.include_context,
        }
    }
}

/// Body of a prediction request: flat mask indices and their labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub user_pixels: Vec<u32>,
    pub user_labels: Vec<u8>,
    pub ai_config: ModelSettings,
}

impl PredictRequest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
