//! Editing session: the single owner of one image's mask state.
//!
//! All mask mutation goes through [`EditingSession`]: loading and saving via
//! the backend, brush strokes, undo/redo, resets and prediction rounds. After
//! each mutation the session records which part of the hidden raster changed;
//! the editor picks that up with [`EditingSession::take_redraw`] and asks the
//! view manager to blit it.

use std::time::Duration;

use rmat_view::{MaskOverlay, PixelRect, PreviewState};
use thiserror::Error;
use web_time::Instant;

use crate::assist::{Evaluation, TrainingSplit};
use crate::backend::{BackendError, MaskStore, PredictRequest, Predictor};
use crate::config::{AiConfig, ProjectConfig};
use crate::drawing::{self, Stroke, WorldBounds};
use crate::format::{self, PayloadError};
use crate::history::{History, HistoryEntry};
use crate::mask::{HiddenRaster, MaskArea, MaskModel, MaskViewMode, PixelCounts};
use crate::model::{MaskClass, Tool, ToolKind};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No mask has been loaded for this image yet")]
    NotLoaded,

    #[error("Prediction needs two classes with more than 10 user pixels, {qualifying} qualify")]
    NotEnoughClasses { qualifying: usize },

    #[error("Prediction has {actual} labels, expected {expected}")]
    PredictionLength { expected: usize, actual: usize },

    #[error("Unknown class index {0}")]
    UnknownClass(usize),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// How the mask of the current image came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Restored from the store
    Loaded,
    /// Nothing stored yet; started from an empty mask
    Fresh,
    /// Loading failed; started from an empty mask
    Recovered(String),
}

/// Part of the hidden raster that changed since the last redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redraw {
    #[default]
    None,
    /// Mask-local rectangle
    Region(PixelRect),
    Full,
}

impl Redraw {
    fn merge(self, other: Redraw) -> Redraw {
        match (self, other) {
            (Redraw::Full, _) | (_, Redraw::Full) => Redraw::Full,
            (Redraw::Region(a), Redraw::Region(b)) => Redraw::Region(a.union(&b)),
            (Redraw::None, r) | (r, Redraw::None) => r,
        }
    }
}

/// Result of a finished prediction round.
#[derive(Debug, Clone)]
pub struct PredictionReport {
    pub evaluation: Evaluation,
    pub recommendation: String,
    pub elapsed: Duration,
}

pub struct EditingSession {
    image_id: String,
    classes: Vec<MaskClass>,
    area: MaskArea,
    ai: AiConfig,

    model: MaskModel,
    raster: HiddenRaster,
    history: History,
    loaded: bool,

    mode: MaskViewMode,
    mask_visible: bool,
    tool: Tool,
    current_class: u8,

    last_evaluation: Option<Evaluation>,
    redraw: Redraw,
}

impl EditingSession {
    /// Session on `image_id` with an empty mask; call [`Self::load_mask`]
    /// before editing.
    pub fn new(config: &ProjectConfig, image_id: &str) -> Self {
        let area = config.mask_area();
        let model = MaskModel::empty(area.shape());
        let mut history = History::new(config.history.max_epochs);
        history.reseed(HistoryEntry::capture(&model));

        let mut session = Self {
            image_id: image_id.to_string(),
            classes: config.classes.clone(),
            area,
            ai: config.ai.clone(),
            raster: HiddenRaster::new(area.shape()),
            model,
            history,
            loaded: false,
            mode: MaskViewMode::Final,
            mask_visible: true,
            tool: Tool::default(),
            current_class: 0,
            last_evaluation: None,
            redraw: Redraw::None,
        };
        session.repaint();
        session
    }

    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn classes(&self) -> &[MaskClass] {
        &self.classes
    }

    pub fn mask_area(&self) -> MaskArea {
        self.area
    }

    pub fn model(&self) -> &MaskModel {
        &self.model
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn raster(&self) -> &HiddenRaster {
        &self.raster
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mode(&self) -> MaskViewMode {
        self.mode
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn current_class(&self) -> u8 {
        self.current_class
    }

    pub fn mask_visible(&self) -> bool {
        self.mask_visible
    }

    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last_evaluation.as_ref()
    }

    /// Replace the buffers with the stored mask of this image.
    ///
    /// Never fails: a missing mask starts empty, and a failed request or a
    /// corrupt payload also starts empty but is reported as recovered.
    pub async fn load_mask<S: MaskStore>(&mut self, store: &S) -> LoadOutcome {
        let shape = self.area.shape();
        let (model, outcome) = match store.load_mask(&self.image_id).await {
            Ok(Some(bytes)) => match format::decode_payload(&bytes, shape.len()) {
                Ok((mask, user_mask)) => {
                    log::info!("Loaded mask of '{}'", self.image_id);
                    (MaskModel::from_parts(shape, mask, user_mask), LoadOutcome::Loaded)
                }
                Err(e) => {
                    log::warn!("Discarding corrupt mask of '{}': {}", self.image_id, e);
                    (MaskModel::empty(shape), LoadOutcome::Recovered(e.to_string()))
                }
            },
            Ok(None) => {
                log::info!("No stored mask for '{}', starting empty", self.image_id);
                (MaskModel::empty(shape), LoadOutcome::Fresh)
            }
            Err(e) => {
                log::error!("Could not load mask of '{}': {}", self.image_id, e);
                (MaskModel::empty(shape), LoadOutcome::Recovered(e.to_string()))
            }
        };

        self.model = model;
        self.loaded = true;
        self.rebase();
        outcome
    }

    /// Store the current buffers.
    ///
    /// The payload is copied before the request starts; edits made while it
    /// is in flight are not part of it.
    pub async fn save_mask<S: MaskStore>(&self, store: &S) -> Result<(), SessionError> {
        if !self.loaded {
            return Err(SessionError::NotLoaded);
        }
        let payload = format::encode_payload(&self.model.mask, &self.model.user_mask)?;
        store.save_mask(&self.image_id, payload).await?;
        log::info!("Saved mask of '{}'", self.image_id);
        Ok(())
    }

    /// Discard every label and start over from an empty mask.
    pub fn reset_mask(&mut self) {
        self.model = MaskModel::empty(self.area.shape());
        self.rebase();
        log::info!("Mask of '{}' reset", self.image_id);
    }

    /// Empty errors, new history baseline, full repaint.
    fn rebase(&mut self) {
        self.model.clear_errors();
        self.last_evaluation = None;
        self.history.reseed(HistoryEntry::capture(&self.model));
        self.repaint();
    }

    fn repaint(&mut self) {
        self.raster.reload(&self.model, self.mode, &self.classes);
        self.redraw = Redraw::Full;
    }

    fn request_redraw(&mut self, redraw: Redraw) {
        self.redraw = self.redraw.merge(redraw);
    }

    /// Apply the current tool at a world-space cursor. `visible` is the part
    /// of the image shown in the ports.
    ///
    /// Returns the changed mask-local rectangle, `None` if nothing changed.
    pub fn draw(&mut self, cursor: (f64, f64), visible: WorldBounds) -> Option<PixelRect> {
        if self.tool.kind == ToolKind::Move {
            return None;
        }
        let region = drawing::brush_region(cursor, &self.tool, visible, self.area)?;
        let stroke = Stroke {
            region,
            kind: self.tool.kind,
            class: self.current_class,
            colour: self.current_colour(),
        };
        if let Some(dirty) =
            drawing::user_draws_on_mask(&mut self.model, &mut self.raster, self.mode, &stroke)
        {
            self.request_redraw(Redraw::Region(dirty));
        }

        self.history.discard_future();
        self.history.update_history(HistoryEntry::capture(&self.model));
        Some(region)
    }

    /// Colour the brush paints into the hidden raster in the current view.
    fn current_colour(&self) -> [u8; 4] {
        let Some(class) = self.classes.get(self.current_class as usize) else {
            return crate::constants::TRANSPARENT;
        };
        match self.mode {
            MaskViewMode::User => class.user_display_colour(),
            _ => class.colour,
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        entry.restore_into(&mut self.model);
        self.repaint();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        entry.restore_into(&mut self.model);
        self.repaint();
        true
    }

    pub fn set_mask_mode(&mut self, mode: MaskViewMode) {
        self.mode = mode;
        self.mask_visible = true;
        self.repaint();
    }

    pub fn set_mask_visible(&mut self, visible: bool) {
        self.mask_visible = visible;
        self.redraw = Redraw::Full;
    }

    pub fn toggle_mask(&mut self) {
        self.set_mask_visible(!self.mask_visible);
    }

    /// Select the class to paint; switches to the draw tool.
    pub fn set_class(&mut self, class: usize) -> Result<(), SessionError> {
        if class >= self.classes.len() {
            return Err(SessionError::UnknownClass(class));
        }
        self.current_class = class as u8;
        self.tool.kind = ToolKind::Draw;
        log::debug!("Class: {}", self.classes[class].name);
        Ok(())
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.tool.kind = kind;
        log::debug!("Tool: {}", kind.name());
    }

    /// Wheel resize of the brush, bounded by the larger mask side.
    pub fn resize_tool(&mut self, delta: f64) {
        let max = self.area.shape().max_side();
        self.tool.resize_by_wheel(delta, max);
    }

    /// User pixel counts per class.
    pub fn drawn_pixels(&self) -> PixelCounts {
        self.model.user_pixel_counts(self.classes.len())
    }

    /// Check the gate and sample the training pixels.
    pub fn prepare_prediction(&self) -> Result<(TrainingSplit, PredictRequest), SessionError> {
        let split = TrainingSplit::sample(&self.model, self.classes.len(), &self.ai).ok_or_else(
            || SessionError::NotEnoughClasses {
                qualifying: self.model.qualifying_classes(self.classes.len()).len(),
            },
        )?;
        let request = split.to_request(&self.ai);
        Ok((split, request))
    }

    /// Score a prediction and take its labels wherever the user did not paint.
    pub fn apply_prediction(
        &mut self,
        split: &TrainingSplit,
        prediction: &[u8],
    ) -> Result<Evaluation, SessionError> {
        let expected = self.model.len();
        if prediction.len() != expected {
            return Err(SessionError::PredictionLength {
                expected,
                actual: prediction.len(),
            });
        }

        let evaluation = Evaluation::score(split, prediction, self.classes.len());
        evaluation.mark_errors(&mut self.model);

        let MaskModel {
            mask, user_mask, ..
        } = &mut self.model;
        for ((label, &user), &predicted) in mask.iter_mut().zip(user_mask.iter()).zip(prediction)
        {
            if user == 0 {
                *label = predicted;
            }
        }

        self.repaint();
        self.history.discard_future();
        self.history.update_history(HistoryEntry::capture(&self.model));
        self.last_evaluation = Some(evaluation.clone());
        Ok(evaluation)
    }

    /// Run a full prediction round against `predictor`.
    ///
    /// Nothing is changed if the gate rejects the mask or the request fails.
    pub async fn predict_mask<P: Predictor>(
        &mut self,
        predictor: &P,
    ) -> Result<PredictionReport, SessionError> {
        let (split, request) = self.prepare_prediction()?;

        let start = Instant::now();
        let prediction = predictor.predict_mask(&self.image_id, &request).await?;
        let evaluation = self.apply_prediction(&split, &prediction)?;
        let elapsed = start.elapsed();

        log::info!(
            "Prediction for '{}' scored {}% in {:?}",
            self.image_id,
            evaluation.percent(),
            elapsed
        );
        let recommendation = evaluation.recommendation(&self.classes);
        Ok(PredictionReport {
            evaluation,
            recommendation,
            elapsed,
        })
    }

    /// Advice from the last prediction round.
    pub fn ai_recommendation(&self) -> Option<String> {
        self.last_evaluation
            .as_ref()
            .map(|e| e.recommendation(&self.classes))
    }

    /// Pending raster change, cleared by this call.
    pub fn take_redraw(&mut self) -> Redraw {
        std::mem::take(&mut self.redraw)
    }

    /// Read-only view of the hidden raster for the mask layers.
    pub fn overlay(&self) -> MaskOverlay<'_> {
        MaskOverlay {
            raster: self.raster.image(),
            origin: self.area.origin(),
            visible: self.mask_visible,
        }
    }

    /// Brush outline at a world-space cursor for the preview layers.
    pub fn preview(&self, cursor: (f64, f64)) -> PreviewState {
        let (cx, cy) = drawing::cursor_pixel(cursor);
        PreviewState {
            cursor: (cx as f64, cy as f64),
            tool_size: self.tool.rounded_size(),
            tool_offset: self.tool.offset(),
            mask_area: PixelRect::from_corners(
                self.area.x0,
                self.area.y0,
                self.area.x1,
                self.area.y1,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHOLE: WorldBounds = (0.0, 0.0, 1000.0, 1000.0);

    fn session() -> EditingSession {
        EditingSession::new(&ProjectConfig::new(8, 8), "tile")
    }

    #[test]
    fn test_draw_pushes_history_and_region() {
        let mut s = session();
        s.set_class(1).expect("class 1");
        let region = s.draw((4.0, 4.0), WHOLE).expect("inside mask");
        assert_eq!(region, PixelRect::new(3, 3, 3, 3));
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.take_redraw(), Redraw::Full);
        assert_eq!(s.take_redraw(), Redraw::None);

        s.draw((1.0, 1.0), WHOLE);
        s.draw((6.0, 1.0), WHOLE);
        assert_eq!(
            s.take_redraw(),
            Redraw::Region(PixelRect::from_corners(0, 0, 8, 3))
        );
    }

    #[test]
    fn test_move_tool_does_not_draw() {
        let mut s = session();
        s.set_tool(ToolKind::Move);
        assert!(s.draw((4.0, 4.0), WHOLE).is_none());
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.drawn_pixels().total, 0);
    }

    #[test]
    fn test_set_class_selects_draw_tool() {
        let mut s = session();
        s.set_tool(ToolKind::Eraser);
        s.set_class(2).expect("class 2");
        assert_eq!(s.tool().kind, ToolKind::Draw);
        assert!(matches!(s.set_class(9), Err(SessionError::UnknownClass(9))));
    }

    #[test]
    fn test_undo_redo_restore_buffers() {
        let mut s = session();
        s.set_class(1).expect("class 1");
        s.draw((2.0, 2.0), WHOLE);
        let after = s.model().clone();

        assert!(s.undo());
        assert!(s.model().mask.iter().all(|&v| v == 0));
        assert!(!s.undo());
        assert!(s.redo());
        assert_eq!(s.model(), &after);
    }

    #[test]
    fn test_reset_reseeds_history() {
        let mut s = session();
        s.set_class(1).expect("class 1");
        s.draw((2.0, 2.0), WHOLE);
        s.reset_mask();
        assert_eq!(s.history().len(), 1);
        assert!(!s.history().can_undo());
        assert_eq!(s.drawn_pixels().total, 0);
    }

    #[test]
    fn test_resize_tool_is_bounded_by_mask() {
        let mut s = session();
        for _ in 0..10 {
            s.resize_tool(1.0);
        }
        assert_eq!(s.tool().rounded_size(), 8);
    }

    #[test]
    fn test_prediction_length_is_checked() {
        let mut s = session();
        s.set_class(0).expect("class 0");
        s.resize_tool(1.0);
        s.draw((2.0, 4.0), WHOLE);
        s.set_class(1).expect("class 1");
        s.draw((6.0, 4.0), WHOLE);

        let (split, request) = s.prepare_prediction().expect("gate passes");
        assert!(!request.user_pixels.is_empty());
        let before = s.model().clone();
        assert!(matches!(
            s.apply_prediction(&split, &[0; 3]),
            Err(SessionError::PredictionLength {
                expected: 64,
                actual: 3
            })
        ));
        assert_eq!(s.model(), &before);
    }

    #[test]
    fn test_preview_state() {
        let s = session();
        let preview = s.preview((3.4, 5.6));
        assert_eq!(preview.cursor, (3.0, 6.0));
        assert_eq!(preview.tool_size, 3);
        assert_eq!(preview.tool_offset, -1);
        assert_eq!(preview.mask_area, PixelRect::new(0, 0, 8, 8));
    }
}
