//! Keyboard shortcuts of the mask editor.
//!
//! Every key maps to at most one [`Command`]. By default digits pick
//! classes, letters switch tools and mask views, and the arrow keys adjust
//! the image filters.

use crate::mask::MaskViewMode;
use crate::model::ToolKind;

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    Enter,
    Backspace,
    Space,
    Tab,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// Maximum number of classes reachable by digit keys.
pub const MAX_CLASS_HOTKEYS: usize = 9;

const CLASS_KEYS: [KeyCode; MAX_CLASS_HOTKEYS] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
    KeyCode::Key9,
];

/// Something the editor can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    SaveAndNext,
    SaveAndPrevious,
    Undo,
    Redo,
    /// 0-based class index
    SelectClass(usize),
    Tool(ToolKind),
    ResetMask,
    Predict,
    ToggleMask,
    MaskView(MaskViewMode),
    ToggleContrast,
    ToggleInvert,
    BrightnessUp,
    BrightnessDown,
    SaturationUp,
    SaturationDown,
    ResetFilters,
    ResetViews,
    NextGroup,
    ToggleControls,
}

impl Command {
    /// Line shown in the help dialog.
    pub fn description(&self) -> String {
        let text = match self {
            Command::Save => "Save the mask",
            Command::SaveAndNext => "Save and go to the next image",
            Command::SaveAndPrevious => "Save and go to the previous image",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::SelectClass(index) => return format!("Select class {}", index + 1),
            Command::Tool(ToolKind::Draw) => "Draw tool",
            Command::Tool(ToolKind::Eraser) => "Eraser tool",
            Command::Tool(ToolKind::Move) => "Move tool",
            Command::ResetMask => "Reset the mask",
            Command::Predict => "Predict the mask from the drawn pixels",
            Command::ToggleMask => "Show or hide the mask",
            Command::MaskView(MaskViewMode::Final) => "Show the final mask",
            Command::MaskView(MaskViewMode::User) => "Show the user-drawn pixels",
            Command::MaskView(MaskViewMode::Errors) => "Show prediction errors",
            Command::ToggleContrast => "Toggle contrast",
            Command::ToggleInvert => "Toggle colour inversion",
            Command::BrightnessUp => "Increase brightness",
            Command::BrightnessDown => "Decrease brightness",
            Command::SaturationUp => "Increase saturation",
            Command::SaturationDown => "Decrease saturation",
            Command::ResetFilters => "Reset brightness, saturation, contrast and inversion",
            Command::ResetViews => "Reset zoom and pan",
            Command::NextGroup => "Show the next view group",
            Command::ToggleControls => "Show or hide the view controls",
        };
        text.to_string()
    }
}

/// Key to command table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: Vec<(KeyCode, Command)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = vec![
            (KeyCode::S, Command::Save),
            (KeyCode::Enter, Command::SaveAndNext),
            (KeyCode::Backspace, Command::SaveAndPrevious),
            (KeyCode::U, Command::Undo),
            (KeyCode::R, Command::Redo),
            (KeyCode::W, Command::Tool(ToolKind::Move)),
            (KeyCode::D, Command::Tool(ToolKind::Draw)),
            (KeyCode::E, Command::Tool(ToolKind::Eraser)),
            (KeyCode::N, Command::ResetMask),
            (KeyCode::A, Command::Predict),
            (KeyCode::Space, Command::ToggleMask),
            (KeyCode::F, Command::MaskView(MaskViewMode::Final)),
            (KeyCode::G, Command::MaskView(MaskViewMode::User)),
            (KeyCode::H, Command::MaskView(MaskViewMode::Errors)),
            (KeyCode::Z, Command::ResetViews),
            (KeyCode::C, Command::ToggleContrast),
            (KeyCode::I, Command::ToggleInvert),
            (KeyCode::ArrowUp, Command::BrightnessUp),
            (KeyCode::ArrowDown, Command::BrightnessDown),
            (KeyCode::ArrowRight, Command::SaturationUp),
            (KeyCode::ArrowLeft, Command::SaturationDown),
            (KeyCode::X, Command::ResetFilters),
            (KeyCode::Tab, Command::NextGroup),
            (KeyCode::V, Command::ToggleControls),
        ];
        bindings.extend(
            CLASS_KEYS
                .iter()
                .enumerate()
                .map(|(index, &key)| (key, Command::SelectClass(index))),
        );
        Self { bindings }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_for_key(&self, key: KeyCode) -> Option<Command> {
        self.bindings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, command)| *command)
    }

    pub fn key_for_command(&self, command: Command) -> Option<KeyCode> {
        self.bindings
            .iter()
            .find(|(_, c)| *c == command)
            .map(|(key, _)| *key)
    }

    /// Bind `key` to `command`, replacing both the command's old key and
    /// whatever `key` did before.
    pub fn set_key(&mut self, command: Command, key: KeyCode) {
        self.bindings.retain(|(k, c)| *k != key && *c != command);
        self.bindings.push((key, command));
    }

    /// What `key` is already used for, if anything.
    pub fn key_conflict(&self, key: KeyCode, exclude: Option<Command>) -> Option<String> {
        self.command_for_key(key)
            .filter(|command| Some(*command) != exclude)
            .map(|command| command.description())
    }

    /// `(key, description)` pairs for the help dialog, class keys limited to
    /// the `n_classes` that exist.
    pub fn help_entries(&self, n_classes: usize) -> Vec<(&'static str, String)> {
        self.bindings
            .iter()
            .filter(|(_, command)| match command {
                Command::SelectClass(index) => *index < n_classes,
                _ => true,
            })
            .map(|(key, command)| (key_to_string(*key), command.description()))
            .collect()
    }
}

/// Convert a KeyCode to a display string.
pub fn key_to_string(key: KeyCode) -> &'static str {
    match key {
        KeyCode::A => "A",
        KeyCode::B => "B",
        KeyCode::C => "C",
        KeyCode::D => "D",
        KeyCode::E => "E",
        KeyCode::F => "F",
        KeyCode::G => "G",
        KeyCode::H => "H",
        KeyCode::I => "I",
        KeyCode::J => "J",
        KeyCode::K => "K",
        KeyCode::L => "L",
        KeyCode::M => "M",
        KeyCode::N => "N",
        KeyCode::O => "O",
        KeyCode::P => "P",
        KeyCode::Q => "Q",
        KeyCode::R => "R",
        KeyCode::S => "S",
        KeyCode::T => "T",
        KeyCode::U => "U",
        KeyCode::V => "V",
        KeyCode::W => "W",
        KeyCode::X => "X",
        KeyCode::Y => "Y",
        KeyCode::Z => "Z",
        KeyCode::Key0 => "0",
        KeyCode::Key1 => "1",
        KeyCode::Key2 => "2",
        KeyCode::Key3 => "3",
        KeyCode::Key4 => "4",
        KeyCode::Key5 => "5",
        KeyCode::Key6 => "6",
        KeyCode::Key7 => "7",
        KeyCode::Key8 => "8",
        KeyCode::Key9 => "9",
        KeyCode::Enter => "Enter",
        KeyCode::Backspace => "Backspace",
        KeyCode::Space => "Space",
        KeyCode::Tab => "Tab",
        KeyCode::Escape => "Esc",
        KeyCode::ArrowUp => "Up",
        KeyCode::ArrowDown => "Down",
        KeyCode::ArrowLeft => "Left",
        KeyCode::ArrowRight => "Right",
    }
}
