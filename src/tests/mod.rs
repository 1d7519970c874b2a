//! Scenario tests of the editing session and the editor.
//!
//! The backend is replaced by [`MemoryBackend`], an in-memory mask store and
//! predictor whose failures can be injected per test.

mod editor_tests;
mod session_tests;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::backend::{BackendError, MaskStore, PredictRequest, Predictor};

#[derive(Default)]
pub(crate) struct MemoryBackend {
    pub masks: RefCell<HashMap<String, Vec<u8>>>,
    pub load_error: RefCell<Option<BackendError>>,
    pub save_error: RefCell<Option<BackendError>>,
    pub predict_error: RefCell<Option<BackendError>>,
    /// Labels returned by the predictor
    pub prediction: RefCell<Vec<u8>>,
    pub requests: RefCell<Vec<PredictRequest>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask(image_id: &str, payload: Vec<u8>) -> Self {
        let backend = Self::new();
        backend
            .masks
            .borrow_mut()
            .insert(image_id.to_string(), payload);
        backend
    }

    pub fn stored(&self, image_id: &str) -> Option<Vec<u8>> {
        self.masks.borrow().get(image_id).cloned()
    }
}

pub(crate) fn server_error() -> BackendError {
    BackendError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

impl MaskStore for MemoryBackend {
    async fn load_mask(&self, image_id: &str) -> Result<Option<Vec<u8>>, BackendError> {
        if let Some(e) = self.load_error.borrow().clone() {
            return Err(e);
        }
        Ok(self.stored(image_id))
    }

    async fn save_mask(&self, image_id: &str, payload: Vec<u8>) -> Result<(), BackendError> {
        if let Some(e) = self.save_error.borrow().clone() {
            return Err(e);
        }
        self.masks
            .borrow_mut()
            .insert(image_id.to_string(), payload);
        Ok(())
    }
}

impl Predictor for MemoryBackend {
    async fn predict_mask(
        &self,
        _image_id: &str,
        request: &PredictRequest,
    ) -> Result<Vec<u8>, BackendError> {
        self.requests.borrow_mut().push(request.clone());
        if let Some(e) = self.predict_error.borrow().clone() {
            return Err(e);
        }
        Ok(self.prediction.borrow().clone())
    }
}
