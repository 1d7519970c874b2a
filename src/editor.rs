//! Event loop glue between input, the editing session and the view ports.
//!
//! The [`Editor`] owns one [`EditingSession`] and the [`ViewManager`]. Input
//! arrives as [`PointerEvent`]s and [`KeyCode`]s; every handler applies the
//! change and re-renders what it touched. Failures that the user should see
//! come back as [`Notice`]s.

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use rmat_view::{DEFAULT_GROUP, LayerKind, ViewManager, wheel_zoom_factor};

use crate::backend::{MaskStore, Predictor};
use crate::config::ProjectConfig;
use crate::keybindings::{Command, KeyBindings, KeyCode};
use crate::model::ToolKind;
use crate::session::{EditingSession, LoadOutcome, Redraw, SessionError};

/// Primary mouse button in a [`PointerEvent`] button mask.
pub const BUTTON_LEFT: u8 = 1;
/// Secondary mouse button.
pub const BUTTON_RIGHT: u8 = 2;
/// Wheel button.
pub const BUTTON_MIDDLE: u8 = 4;

/// Shown when prediction is asked for with too few labelled classes.
pub const NOT_ENOUGH_PIXELS: &str =
    "You need to draw at least 10 pixels for more than one class to use the AI.";

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Pointer input on one port; positions are canvas pixels of that port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter {
        port: usize,
        position: (f64, f64),
    },
    Leave {
        port: usize,
    },
    Down {
        port: usize,
        position: (f64, f64),
        buttons: u8,
    },
    Move {
        port: usize,
        position: (f64, f64),
        buttons: u8,
    },
    Up {
        port: usize,
        position: (f64, f64),
    },
    /// Positive `delta` zooms in or grows the brush
    Wheel {
        port: usize,
        position: (f64, f64),
        delta: f64,
        modifiers: Modifiers,
    },
}

impl PointerEvent {
    fn port(&self) -> usize {
        match *self {
            PointerEvent::Enter { port, .. }
            | PointerEvent::Leave { port }
            | PointerEvent::Down { port, .. }
            | PointerEvent::Move { port, .. }
            | PointerEvent::Up { port, .. }
            | PointerEvent::Wheel { port, .. } => port,
        }
    }
}

/// Message for the user, shown as a dialog by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

/// Image the host should open once the mask is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
}

/// Outcome of a key press.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub command: Option<Command>,
    pub notice: Option<Notice>,
    pub navigate: Option<Navigation>,
}

impl Response {
    fn notice(command: Command, notice: Notice) -> Self {
        Self {
            command: Some(command),
            notice: Some(notice),
            navigate: None,
        }
    }
}

pub struct Editor {
    config: ProjectConfig,
    session: EditingSession,
    views: ViewManager,
    bindings: KeyBindings,
    /// Port and canvas position of the last pointer event
    pointer: Option<(usize, (f64, f64))>,
    /// Where the config is written after view group changes
    #[cfg(not(target_arch = "wasm32"))]
    config_path: Option<PathBuf>,
}

impl Editor {
    /// Editor on `image_id`; the mask stays empty until [`Self::load`].
    pub fn new(config: ProjectConfig, image_id: &str) -> Self {
        let mut views = ViewManager::new(config.views.clone(), config.view_groups.clone())
            .with_default_layers();
        views.set_reserved_height(config.preferences.reserved_height);
        views.set_map_url(&config.preferences.map_url);
        let [width, height] = config.image_shape;
        views.set_image(image_id, (width, height));
        if let Err(e) = views.show_group(DEFAULT_GROUP) {
            log::warn!("Could not show view group '{}': {}", DEFAULT_GROUP, e);
        }

        Self {
            session: EditingSession::new(&config, image_id),
            config,
            views,
            bindings: KeyBindings::default(),
            pointer: None,
            #[cfg(not(target_arch = "wasm32"))]
            config_path: None,
        }
    }

    /// Write the config to `path` after every view group change.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn set_config_path(&mut self, path: PathBuf) {
        self.config_path = Some(path);
    }

    /// Config with the view groups as last edited.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditingSession {
        &mut self.session
    }

    pub fn views(&self) -> &ViewManager {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewManager {
        &mut self.views
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    /// Load the stored mask of the current image.
    pub async fn load<S: MaskStore>(&mut self, store: &S) -> Option<Notice> {
        let outcome = self.session.load_mask(store).await;
        self.render_all();
        match outcome {
            LoadOutcome::Loaded | LoadOutcome::Fresh => None,
            LoadOutcome::Recovered(reason) => Some(Notice::Warning(format!(
                "Could not load the mask, starting from an empty one: {reason}"
            ))),
        }
    }

    /// Switch to another image and load its mask.
    pub async fn open_image<S: MaskStore>(&mut self, image_id: &str, store: &S) -> Option<Notice> {
        self.session = EditingSession::new(&self.config, image_id);
        let [width, height] = self.config.image_shape;
        self.views.set_image(image_id, (width, height));
        self.load(store).await
    }

    /// Show view group `name`.
    pub fn show_group(&mut self, name: &str) -> Option<Notice> {
        let result = self.views.show_group(name);
        self.view_groups_changed(result)
    }

    /// Add a view to the shown group, at `position` or at the end.
    pub fn add_view(&mut self, name: &str, position: Option<usize>) -> Option<Notice> {
        let result = self.views.add_view(name, position);
        self.view_groups_changed(result)
    }

    pub fn replace_view(&mut self, position: usize, name: &str) -> Option<Notice> {
        let result = self.views.replace_view(position, name);
        self.view_groups_changed(result)
    }

    pub fn remove_view(&mut self, position: usize) -> Option<Notice> {
        let result = self.views.remove_view(position);
        self.view_groups_changed(result)
    }

    fn view_groups_changed(&mut self, result: rmat_view::Result<()>) -> Option<Notice> {
        if let Err(e) = result {
            log::warn!("View group change refused: {}", e);
            return Some(Notice::Error(e.to_string()));
        }
        self.render_all();
        self.config.view_groups = self.views.groups().to_vec();
        self.persist_config()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn persist_config(&self) -> Option<Notice> {
        let path = self.config_path.as_ref()?;
        match self.config.save_to(path) {
            Ok(()) => None,
            Err(e) => {
                log::error!("Saving the configuration failed: {}", e);
                Some(Notice::Error(format!("Could not save the configuration: {e}")))
            }
        }
    }

    /// The host page stores the config it reads from [`Self::config`].
    #[cfg(target_arch = "wasm32")]
    fn persist_config(&self) -> Option<Notice> {
        None
    }

    /// Lay the ports out for a new window size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.views.update_size(width, height);
        self.render_all();
    }

    /// Redraw image layers whose sources finished loading.
    pub fn poll_sources(&mut self) -> bool {
        !self.views.poll_sources().is_empty()
    }

    /// Handle a pointer event. Returns whether anything was redrawn.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let port = event.port();
        if !self.views.port(port).is_some_and(|p| p.receives_pointer()) {
            return false;
        }

        match event {
            PointerEvent::Enter { position, .. } => {
                self.pointer = Some((port, position));
                self.render_preview();
            }
            PointerEvent::Leave { .. } => {
                self.pointer = None;
                self.render_preview();
            }
            PointerEvent::Up { position, .. } => {
                self.pointer = Some((port, position));
                return false;
            }
            PointerEvent::Down {
                position, buttons, ..
            } => {
                self.pointer = Some((port, position));
                if buttons & BUTTON_LEFT != 0 && self.session.tool().kind != ToolKind::Move {
                    self.draw_at(port, position);
                }
                self.render_preview();
            }
            PointerEvent::Move {
                position, buttons, ..
            } => {
                let previous = self.pointer.replace((port, position));
                let left = buttons & BUTTON_LEFT != 0;
                let panning = buttons & (BUTTON_RIGHT | BUTTON_MIDDLE) != 0
                    || (left && self.session.tool().kind == ToolKind::Move);

                if panning {
                    if let Some((_, (px, py))) = previous.filter(|(p, _)| *p == port) {
                        self.pan_canvas(position.0 - px, position.1 - py);
                        return true;
                    }
                } else if left {
                    self.draw_at(port, position);
                }
                self.render_preview();
            }
            PointerEvent::Wheel {
                position,
                delta,
                modifiers,
                ..
            } => {
                self.pointer = Some((port, position));
                if modifiers.shift {
                    self.session.resize_tool(delta);
                    self.render_preview();
                } else {
                    let Some(anchor) = self.views.pointer_to_world(port, position) else {
                        return false;
                    };
                    self.views.zoom(wheel_zoom_factor(delta), anchor);
                    self.render_all();
                }
            }
        }
        true
    }

    fn draw_at(&mut self, port: usize, position: (f64, f64)) {
        let Some(world) = self.views.pointer_to_world(port, position) else {
            return;
        };
        let visible = self.views.visible_world_bounds();
        if self.session.draw(world, visible).is_some() {
            self.render_mask();
        }
    }

    /// Pan by a canvas-pixel delta.
    fn pan_canvas(&mut self, dx: f64, dy: f64) {
        let scale = self.views.transform().scale_x();
        if scale <= 0.0 {
            return;
        }
        self.views.pan(dx / scale, dy / scale);
        self.render_all();
    }

    /// Handle a key press, running backend requests where the command
    /// needs one.
    pub async fn handle_key<B>(&mut self, key: KeyCode, backend: &B) -> Response
    where
        B: MaskStore + Predictor,
    {
        let Some(command) = self.bindings.command_for_key(key) else {
            return Response::default();
        };
        log::debug!("Key {:?}: {:?}", key, command);
        self.run_command(command, backend).await
    }

    pub async fn run_command<B>(&mut self, command: Command, backend: &B) -> Response
    where
        B: MaskStore + Predictor,
    {
        let mut response = Response {
            command: Some(command),
            ..Response::default()
        };

        match command {
            Command::Save => match self.session.save_mask(backend).await {
                Ok(()) => response.notice = Some(Notice::Info("Mask saved".to_string())),
                Err(SessionError::NotLoaded) => {}
                Err(e) => response.notice = Some(save_failed(&e)),
            },
            // Navigation goes ahead when there was nothing to save yet
            Command::SaveAndNext | Command::SaveAndPrevious => {
                match self.session.save_mask(backend).await {
                    Ok(()) | Err(SessionError::NotLoaded) => {
                        response.navigate = Some(if command == Command::SaveAndNext {
                            Navigation::Next
                        } else {
                            Navigation::Previous
                        });
                    }
                    Err(e) => response.notice = Some(save_failed(&e)),
                }
            }
            Command::Predict => return self.predict(command, backend).await,
            _ => {
                if let Some(notice) = self.apply(command) {
                    response.notice = Some(notice);
                }
            }
        }
        response
    }

    async fn predict<P: Predictor>(&mut self, command: Command, predictor: &P) -> Response {
        match self.session.predict_mask(predictor).await {
            Ok(report) => {
                self.render_mask();
                Response::notice(
                    command,
                    Notice::Info(format!(
                        "Score: {}%. {}",
                        report.evaluation.percent(),
                        report.recommendation
                    )),
                )
            }
            Err(SessionError::NotEnoughClasses { .. }) => {
                Response::notice(command, Notice::Warning(NOT_ENOUGH_PIXELS.to_string()))
            }
            Err(e) => {
                log::error!("Prediction failed: {}", e);
                Response::notice(command, Notice::Error(format!("Prediction failed: {e}")))
            }
        }
    }

    /// Run a command that needs no backend.
    fn apply(&mut self, command: Command) -> Option<Notice> {
        match command {
            Command::Undo => {
                if self.session.undo() {
                    self.render_mask();
                }
            }
            Command::Redo => {
                if self.session.redo() {
                    self.render_mask();
                }
            }
            Command::SelectClass(index) => {
                if self.session.set_class(index).is_err() {
                    return None;
                }
                self.render_preview();
            }
            Command::Tool(kind) => {
                self.session.set_tool(kind);
                self.render_preview();
            }
            Command::ResetMask => {
                self.session.reset_mask();
                self.render_mask();
                return Some(Notice::Info("Mask reset".to_string()));
            }
            Command::ToggleMask => {
                self.session.toggle_mask();
                self.render_mask();
            }
            Command::MaskView(mode) => {
                self.session.set_mask_mode(mode);
                self.render_mask();
            }
            Command::ToggleContrast => {
                let filters = self.views.filters_mut();
                filters.contrast = !filters.contrast;
                self.render_images();
            }
            Command::ToggleInvert => {
                let filters = self.views.filters_mut();
                filters.invert = !filters.invert;
                self.render_images();
            }
            Command::BrightnessUp | Command::BrightnessDown => {
                self.views
                    .filters_mut()
                    .change_brightness(command == Command::BrightnessUp);
                self.render_images();
            }
            Command::SaturationUp | Command::SaturationDown => {
                self.views
                    .filters_mut()
                    .change_saturation(command == Command::SaturationUp);
                self.render_images();
            }
            Command::ResetFilters => {
                self.views.filters_mut().reset();
                self.render_images();
            }
            Command::ResetViews => {
                self.views.reset_views();
                self.render_all();
            }
            Command::NextGroup => {
                let result = self.views.show_next_group();
                return self.view_groups_changed(result);
            }
            Command::ToggleControls => self.views.toggle_controls(),
            Command::Save | Command::SaveAndNext | Command::SaveAndPrevious | Command::Predict => {}
        }
        None
    }

    /// World position under the pointer, if it is over a port.
    pub fn cursor(&self) -> Option<(f64, f64)> {
        let (port, position) = self.pointer?;
        self.views.pointer_to_world(port, position)
    }

    /// Redraw the mask layers for whatever the session changed.
    pub fn render_mask(&mut self) {
        match self.session.take_redraw() {
            Redraw::None => {}
            Redraw::Region(region) => {
                self.views.render_mask_region(region, self.session.overlay());
            }
            Redraw::Full => {
                let overlay = self.session.overlay();
                self.views.render(Some(LayerKind::Mask), Some(overlay), None);
            }
        }
    }

    fn render_preview(&mut self) {
        let preview = self.cursor().map(|c| self.session.preview(c));
        self.views
            .render(Some(LayerKind::Preview), None, preview.as_ref());
    }

    fn render_images(&mut self) {
        self.views.render(Some(LayerKind::Rgb), None, None);
    }

    /// Redraw every layer of every port.
    pub fn render_all(&mut self) {
        self.session.take_redraw();
        let preview = self.cursor().map(|c| self.session.preview(c));
        self.views
            .render(None, Some(self.session.overlay()), preview.as_ref());
    }
}

fn save_failed(error: &SessionError) -> Notice {
    log::error!("Saving failed: {}", error);
    Notice::Error(format!("Could not save the mask: {error}"))
}
