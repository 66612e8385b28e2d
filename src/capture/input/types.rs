//! Input event types
//!
//! Raw events as delivered by the system-wide hook, and the validated
//! activity events the recorder consumes.

use crate::zoom::geometry::CursorPosition;
use serde::{Deserialize, Serialize};

/// Modifier flags reported with a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    /// Windows key / Command key
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn count(&self) -> usize {
        [self.shift, self.ctrl, self.alt, self.meta]
            .iter()
            .filter(|held| **held)
            .count()
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }
}

/// Event payload as emitted by the hook process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawInputEvent {
    MouseDown { x: f64, y: f64, button: u8 },
    MouseMove { x: f64, y: f64 },
    KeyDown { keycode: u16, modifiers: Modifiers },
}

/// A key, decoded from the hook's scan-code numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Letter(char),
    Digit(u8),
    /// F1 through F12
    Function(u8),
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Backspace,
    Delete,
    Tab,
    Space,
    Escape,
    Shift,
    Control,
    Alt,
    Meta,
    Other(u16),
}

const LETTER_CODES: [(u16, char); 26] = [
    (30, 'A'),
    (48, 'B'),
    (46, 'C'),
    (32, 'D'),
    (18, 'E'),
    (33, 'F'),
    (34, 'G'),
    (35, 'H'),
    (23, 'I'),
    (36, 'J'),
    (37, 'K'),
    (38, 'L'),
    (50, 'M'),
    (49, 'N'),
    (24, 'O'),
    (25, 'P'),
    (16, 'Q'),
    (19, 'R'),
    (31, 'S'),
    (20, 'T'),
    (22, 'U'),
    (47, 'V'),
    (17, 'W'),
    (45, 'X'),
    (21, 'Y'),
    (44, 'Z'),
];

impl Key {
    pub fn from_code(code: u16) -> Key {
        if let Some((_, letter)) = LETTER_CODES.iter().find(|(c, _)| *c == code) {
            return Key::Letter(*letter);
        }

        match code {
            2..=10 => Key::Digit((code - 1) as u8),
            11 => Key::Digit(0),
            59..=68 => Key::Function((code - 58) as u8),
            87 => Key::Function(11),
            88 => Key::Function(12),
            1 => Key::Escape,
            14 => Key::Backspace,
            15 => Key::Tab,
            28 | 3612 => Key::Enter,
            57 => Key::Space,
            3655 => Key::Home,
            3657 => Key::PageUp,
            3663 => Key::End,
            3665 => Key::PageDown,
            3667 => Key::Delete,
            57416 => Key::ArrowUp,
            57419 => Key::ArrowLeft,
            57421 => Key::ArrowRight,
            57424 => Key::ArrowDown,
            42 | 54 => Key::Shift,
            29 | 3613 => Key::Control,
            56 | 3640 => Key::Alt,
            3675 | 3676 => Key::Meta,
            other => Key::Other(other),
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::ArrowLeft
                | Key::ArrowRight
                | Key::ArrowUp
                | Key::ArrowDown
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }

    pub fn is_editing(&self) -> bool {
        matches!(
            self,
            Key::Enter | Key::Backspace | Key::Delete | Key::Tab | Key::Space
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }
}

/// A key press after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

/// Activity that passed the bridge filters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivityEvent {
    Move(CursorPosition),
    Click(CursorPosition),
    Key(KeyEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_decoding() {
        assert_eq!(Key::from_code(30), Key::Letter('A'));
        assert_eq!(Key::from_code(44), Key::Letter('Z'));
        assert_eq!(Key::from_code(2), Key::Digit(1));
        assert_eq!(Key::from_code(11), Key::Digit(0));
        assert_eq!(Key::from_code(59), Key::Function(1));
        assert_eq!(Key::from_code(68), Key::Function(10));
        assert_eq!(Key::from_code(88), Key::Function(12));
        assert_eq!(Key::from_code(57419), Key::ArrowLeft);
        assert_eq!(Key::from_code(3675), Key::Meta);
        assert_eq!(Key::from_code(9999), Key::Other(9999));
    }

    #[test]
    fn test_raw_event_json() {
        let event: RawInputEvent = serde_json::from_str(
            r#"{"type":"keyDown","keycode":46,"modifiers":{"ctrl":true}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            RawInputEvent::KeyDown {
                keycode: 46,
                modifiers: Modifiers {
                    ctrl: true,
                    ..Modifiers::NONE
                },
            }
        );
    }
}
