//! Terminal monitor used by the demo binary.
//!
//! [`Monitor`] is a small application that reacts to every default action, and
//! [`MonitorTerminal`] draws it together with the current hotkey bindings.

pub mod state;
pub mod terminal;

pub use state::{LogEntry, Monitor, LOG_CAPACITY};
pub use terminal::{render, MonitorTerminal};
