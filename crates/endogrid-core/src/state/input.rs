use serde::{Deserialize, Serialize};

/// Key codes the grid reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Special keys
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    F2,

    // Navigation
    Home,
    End,

    // Character key
    Char(char),

    /// Shift, Meta, Alt, Control or CapsLock pressed on its own
    Modifier,

    // Unknown
    Unknown,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            "Escape" | "Esc" => Key::Escape,
            "Backspace" => Key::Backspace,
            "Delete" | "Del" => Key::Delete,
            "F2" => Key::F2,
            "Home" => Key::Home,
            "End" => Key::End,
            "Shift" | "Meta" | "Alt" | "Control" | "CapsLock" => Key::Modifier,
            "Unidentified" => Key::Unknown,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Unknown,
                }
            }
        }
    }

    /// Keys that move the selection while navigating
    pub fn is_navigation_key(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp
                | Key::ArrowDown
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::Enter
                | Key::Tab
                | Key::Home
                | Key::End
        )
    }

    pub fn is_arrow(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight
        )
    }

    /// Keys that never do anything when pressed alone
    pub fn is_ignored_alone(&self) -> bool {
        matches!(self, Key::Modifier | Key::Unknown)
    }
}

/// Host platform, used to resolve the primary modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Platform {
    Mac,
    #[default]
    Other,
}

impl Platform {
    /// Guess the platform from a `navigator.platform` / user agent string
    pub fn detect(platform: &str) -> Self {
        let platform = platform.to_ascii_lowercase();
        if platform.contains("mac") || platform.contains("iphone") || platform.contains("ipad") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }
}

/// Logical modifier state.
///
/// `primary` is the platform's command modifier: meta on macOS, ctrl
/// elsewhere. The presentation layer resolves it once with
/// [`Modifiers::from_platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub primary: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_platform(platform: Platform, shift: bool, ctrl: bool, meta: bool) -> Self {
        let primary = match platform {
            Platform::Mac => meta,
            Platform::Other => ctrl,
        };
        Self { shift, primary }
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }
}

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::new())
    }
}

/// The cell under the pointer, as hit-tested by the presentation layer.
///
/// Header cells use row `-1` and index cells use column `-1`. Pointer
/// events off the grid carry no hit at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellHit {
    pub row_index: isize,
    pub column_index: isize,
}

impl CellHit {
    pub fn new(row_index: isize, column_index: isize) -> Self {
        Self {
            row_index,
            column_index,
        }
    }

    pub fn is_column_header(&self) -> bool {
        self.row_index == -1
    }

    pub fn is_index_column(&self) -> bool {
        self.column_index == -1
    }

    pub fn is_data_cell(&self) -> bool {
        self.row_index >= 0 && self.column_index >= 0
    }
}
