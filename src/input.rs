//! Input subsystem: the event and device-state vocabulary the action core consumes, plus
//! the terminal-backed collector that produces it.

pub mod event;
pub mod keys;
pub mod raw;

// Public re-exports for convenience. Modules outside this crate should prefer importing
// from `crate::input` rather than reaching into submodules.
pub use event::{DeviceSnapshot, DeviceState, EventKind, InputEvent, Point};
pub use keys::{key_name, parse_key};
pub use raw::RawInputCollector;
pub use ratatui::crossterm::event::{KeyCode, MouseButton};
