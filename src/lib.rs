//! # actionmap - Frame-Based Input Action Mapping
//!
//! Maps raw input (keys, mouse buttons, cursor motion, wheel, window events) to named
//! application actions, and dispatches each triggered action to its subscribers once
//! per frame.
//!
//! ## Features
//!
//! - **Rebindable Hotkeys**: Every navigation and confirm/cancel hotkey carries a primary
//!   and an alternate key, and rebinds take effect on the next frame
//! - **Trigger Modes**: Hold, release-once and event-once semantics per action
//! - **Composite Actions**: Actions combined from other actions, such as right-drag panning
//! - **Failure Isolation**: A failing handler is reported without stopping the frame
//! - **Persistent Keymaps**: TOML keymap files behind the `config` feature
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`hotkeys`] - Observable hotkey table
//! - [`input`] - Input events, device state and terminal input collection
//! - [`action`] - Action identifiers, expressions and the definition registry
//! - [`dispatch`] - Ordered per-action callback lists
//! - [`evaluator`] - Per-frame resolution of every registered action
//! - [`handler`] - Frame facade wiring the pieces to an application
//! - [`monitor`] - Terminal view used by the demo binary

// Core modules
pub mod error;
pub mod hotkeys;
pub mod input;

// Action pipeline
pub mod action;
pub mod dispatch;
pub mod evaluator;
pub mod handler;

// Application surface
pub mod app;
#[cfg(feature = "config")]
pub mod config;
pub mod monitor;

// Re-export commonly used types for convenience
pub use error::{ActionError, Result};

// Public API surface for external usage
pub use action::{ActionContext, ActionId, ActionRegistry};
pub use app::{AppCallbacks, Direction};
pub use dispatch::{Dispatcher, HandlerResult, SubscriptionToken};
pub use evaluator::FrameEvaluator;
pub use handler::{ActionHandler, FrameReport};
pub use hotkeys::{HoldableKeySet, HotkeyId, HotkeyTable, KeyBindingPair};
pub use input::{DeviceSnapshot, DeviceState, InputEvent};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
