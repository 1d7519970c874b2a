//! Image sources for RGB layers.
//!
//! Each view's bitmap is requested once per image id. Loading happens
//! elsewhere (a backend fetch, a decoder thread); completion comes back over
//! a channel, and [`SourceCache::poll`] reports which views became ready so
//! their pending layers can be rendered again.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use image::RgbaImage;

/// Completion message for one source request.
#[derive(Debug)]
pub struct SourceEvent {
    pub image_id: String,
    pub view: String,
    pub result: Result<RgbaImage, String>,
}

/// Something that can fetch the bitmap of a view.
///
/// Implementations must send exactly one [`SourceEvent`] on `done` per
/// request, either immediately or from another thread later on.
pub trait ImageSourceLoader {
    fn request(&self, image_id: &str, view: &str, done: Sender<SourceEvent>);
}

/// Loading state of one view's source.
#[derive(Debug, Clone)]
pub enum SourceState {
    Pending,
    Ready(Arc<RgbaImage>),
    Failed(String),
}

/// Per-image cache of view sources.
pub struct SourceCache {
    image_id: Option<String>,
    states: HashMap<String, SourceState>,
    loader: Option<Box<dyn ImageSourceLoader>>,
    done_tx: Sender<SourceEvent>,
    done_rx: Receiver<SourceEvent>,
}

impl SourceCache {
    pub fn new() -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            image_id: None,
            states: HashMap::new(),
            loader: None,
            done_tx,
            done_rx,
        }
    }

    pub fn set_loader(&mut self, loader: Box<dyn ImageSourceLoader>) {
        self.loader = Some(loader);
    }

    /// Switch to another image, dropping every cached source.
    pub fn set_image(&mut self, image_id: &str) {
        self.image_id = Some(image_id.to_string());
        self.states.clear();
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    /// Provide a source directly, bypassing the loader.
    pub fn insert_ready(&mut self, view: &str, image: RgbaImage) {
        self.states
            .insert(view.to_string(), SourceState::Ready(Arc::new(image)));
    }

    /// Request the source of `view` unless it was requested before.
    pub fn ensure_requested(&mut self, view: &str) {
        if self.states.contains_key(view) {
            return;
        }
        let (Some(loader), Some(image_id)) = (&self.loader, &self.image_id) else {
            return;
        };

        log::debug!("Requesting source '{}' for image '{}'", view, image_id);
        self.states.insert(view.to_string(), SourceState::Pending);
        loader.request(image_id, view, self.done_tx.clone());
    }

    pub fn state(&self, view: &str) -> Option<&SourceState> {
        self.states.get(view)
    }

    pub fn get(&self, view: &str) -> Option<&Arc<RgbaImage>> {
        match self.states.get(view) {
            Some(SourceState::Ready(image)) => Some(image),
            _ => None,
        }
    }

    pub fn is_ready(&self, view: &str) -> bool {
        self.get(view).is_some()
    }

    /// Drain completions; returns the views whose state changed.
    ///
    /// Completions for an image other than the current one are dropped.
    pub fn poll(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        loop {
            match self.done_rx.try_recv() {
                Ok(event) => {
                    if self.image_id.as_deref() != Some(event.image_id.as_str()) {
                        log::debug!(
                            "Dropping stale source '{}' of image '{}'",
                            event.view,
                            event.image_id
                        );
                        continue;
                    }
                    let state = match event.result {
                        Ok(image) => {
                            log::info!(
                                "Source '{}' ready ({}x{})",
                                event.view,
                                image.width(),
                                image.height()
                            );
                            SourceState::Ready(Arc::new(image))
                        }
                        Err(e) => {
                            log::error!("Failed to load source '{}': {}", event.view, e);
                            SourceState::Failed(e)
                        }
                    };
                    self.states.insert(event.view.clone(), state);
                    changed.push(event.view);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }
}

impl Default for SourceCache {
    fn default() -> Self {
        Self::new()
    }
}
