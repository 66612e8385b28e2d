//! Cursor and keyboard activity
//!
//! Typed hook events, the typing/bounds filter, and the bridge that feeds
//! accepted activity to the recorder.

pub mod bridge;
pub mod filter;
pub mod types;

pub use bridge::{ActivityBridge, ActivityHook};
pub use filter::{is_typing_activity, ActivityFilter};
pub use types::{ActivityEvent, Key, KeyEvent, Modifiers, RawInputEvent};
