//! Logical actions and the expressions that define them.
//!
//! An [`ActionId`] is what the application reacts to. The [`ActionRegistry`] maps each
//! one to an [`ActionExpression`] over physical input; the evaluator turns expressions
//! into per-frame triggers with an [`ActionContext`].

pub mod context;
pub mod expression;
pub mod registry;

pub use context::ActionContext;
pub use expression::{
    ActionExpression, CompositeOp, EventPattern, InputFilter, RealtimePredicate, TriggerMode,
};
pub use registry::{ActionDefinition, ActionRegistry};

use std::fmt;

/// Every logical action the application can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionId {
    Quit,
    Resize,
    Enter,
    Escape,
    NavUp,
    NavDown,
    NavLeft,
    NavRight,
    MouseMove,
    MouseSelect,
    MouseSelectDrag,
    MouseCommand,
    MousePan,
    MouseScroll,
}

impl ActionId {
    pub const ALL: [ActionId; 14] = [
        ActionId::Quit,
        ActionId::Resize,
        ActionId::Enter,
        ActionId::Escape,
        ActionId::NavUp,
        ActionId::NavDown,
        ActionId::NavLeft,
        ActionId::NavRight,
        ActionId::MouseMove,
        ActionId::MouseSelect,
        ActionId::MouseSelectDrag,
        ActionId::MouseCommand,
        ActionId::MousePan,
        ActionId::MouseScroll,
    ];
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
