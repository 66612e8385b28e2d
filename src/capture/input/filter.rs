//! Activity filtering
//!
//! Decides which raw hook events count as user activity. Keys are filtered to
//! typing and navigation; pointer events are bounds-checked against the
//! captured display for screen sources.

use super::types::{ActivityEvent, Key, KeyEvent, Modifiers, RawInputEvent};
use crate::capture::traits::{DisplayBounds, SourceKind};
use crate::zoom::geometry::CursorPosition;

/// Whether a key press looks like typing or navigation
///
/// Function keys, bare modifiers and system shortcut chords are rejected.
/// A chord is treated as a system shortcut when it holds the OS key together
/// with another modifier or with Space, holds Ctrl+Alt, or is an Alt/OS-key +
/// Tab switcher. On Windows any OS-key chord counts.
pub fn is_typing_activity(event: &KeyEvent) -> bool {
    let KeyEvent { key, modifiers } = *event;

    if is_system_chord(key, modifiers) {
        return false;
    }

    match key {
        Key::Letter(_) | Key::Digit(_) => true,
        k if k.is_navigation() || k.is_editing() => true,
        _ => false,
    }
}

/// Win+letter opens shell UI (Win+D, Win+L, Win+R)
const OS_KEY_CHORDS_ARE_SYSTEM: bool = cfg!(target_os = "windows");

fn is_system_chord(key: Key, modifiers: Modifiers) -> bool {
    if modifiers.meta
        && (OS_KEY_CHORDS_ARE_SYSTEM || key == Key::Space || modifiers.count() > 1)
    {
        return true;
    }
    if modifiers.ctrl && modifiers.alt {
        return true;
    }
    key == Key::Tab && (modifiers.alt || modifiers.meta)
}

/// Converts raw hook events into accepted activity
#[derive(Debug, Clone, Copy)]
pub struct ActivityFilter {
    kind: SourceKind,
    display: Option<DisplayBounds>,
}

impl ActivityFilter {
    pub fn new(kind: SourceKind, display: Option<DisplayBounds>) -> Self {
        Self { kind, display }
    }

    /// Pointer events outside the captured display are dropped for screens
    fn in_bounds(&self, x: f64, y: f64) -> bool {
        match (self.kind, self.display) {
            (SourceKind::Screen, Some(bounds)) => bounds.contains(x, y),
            _ => true,
        }
    }

    pub fn accept(&self, raw: &RawInputEvent) -> Option<ActivityEvent> {
        match *raw {
            RawInputEvent::MouseMove { x, y } => self
                .in_bounds(x, y)
                .then(|| ActivityEvent::Move(CursorPosition::new(x, y))),
            RawInputEvent::MouseDown { x, y, .. } => self
                .in_bounds(x, y)
                .then(|| ActivityEvent::Click(CursorPosition::new(x, y))),
            RawInputEvent::KeyDown { keycode, modifiers } => {
                let event = KeyEvent {
                    key: Key::from_code(keycode),
                    modifiers,
                };
                is_typing_activity(&event).then_some(ActivityEvent::Key(event))
            }
        }
    }
}
