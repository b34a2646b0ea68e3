//! Customizable keybindings for the annotation tools.

use serde::{Deserialize, Serialize};

use crate::keyboard::Key;

/// Keybinding configuration for the annotation tools.
///
/// Digit keys for the integer tool are fixed and not listed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Discards the shape being drawn
    #[serde(default = "default_cancel_draw")]
    pub cancel_draw: Key,
    /// Deletes the selected shape
    #[serde(default = "default_delete_selection")]
    pub delete_selection: Key,
    /// Ends the current track in the track tool
    #[serde(default = "default_end_track")]
    pub end_track: Key,
}

fn default_cancel_draw() -> Key {
    Key::Escape
}

fn default_delete_selection() -> Key {
    Key::Delete
}

fn default_end_track() -> Key {
    Key::Char('e')
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            cancel_draw: default_cancel_draw(),
            delete_selection: default_delete_selection(),
            end_track: default_end_track(),
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key is already used by any binding.
    /// Returns a description of what it's used for, if anything.
    pub fn key_conflict(&self, key: Key) -> Option<&'static str> {
        if key == self.cancel_draw {
            Some("Cancel drawing")
        } else if key == self.delete_selection {
            Some("Delete selection")
        } else if key == self.end_track {
            Some("End track")
        } else if key.digit().is_some() {
            Some("Integer label")
        } else {
            None
        }
    }
}
