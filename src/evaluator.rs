//! Per-frame action evaluation.
//!
//! Each frame the evaluator holds the events ingested since [`FrameEvaluator::clear_events`]
//! and resolves every registered action against them and the current device state.
//! Nothing carries over between frames: held actions re-derive their state by polling.

use crate::action::{ActionContext, ActionExpression, ActionId, ActionRegistry, CompositeOp};
use crate::input::event::{DeviceState, InputEvent};
use log::warn;
use std::collections::HashMap;

/// An action that triggered this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub action: ActionId,
    pub context: ActionContext,
}

#[derive(Debug, Default)]
pub struct FrameEvaluator {
    events: Vec<InputEvent>,
}

impl FrameEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a frame by dropping the previous frame's events.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Events queued this frame, in arrival order.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Resolve every registered action, in registration order.
    ///
    /// An event-driven action triggers at most once per frame however many of its
    /// events were queued; its context folds all of them.
    pub fn evaluate(&self, registry: &ActionRegistry, device: &dyn DeviceState) -> Vec<Trigger> {
        let mut frame = FrameResolution {
            registry,
            device,
            events: &self.events,
            states: HashMap::with_capacity(registry.len()),
        };

        registry
            .actions()
            .filter_map(|action| {
                frame
                    .resolve(action)
                    .map(|context| Trigger { action, context })
            })
            .collect()
    }
}

enum Resolution {
    InProgress,
    Done(Option<ActionContext>),
}

/// Memoized resolution of one frame, so composites see the same outcome as their operands.
struct FrameResolution<'a> {
    registry: &'a ActionRegistry,
    device: &'a dyn DeviceState,
    events: &'a [InputEvent],
    states: HashMap<ActionId, Resolution>,
}

impl<'a> FrameResolution<'a> {
    fn resolve(&mut self, action: ActionId) -> Option<ActionContext> {
        match self.states.get(&action) {
            Some(Resolution::Done(outcome)) => return outcome.clone(),
            Some(Resolution::InProgress) => {
                warn!("composite cycle through {action}; treating it as idle");
                return None;
            }
            None => {}
        }

        let registry = self.registry;
        let outcome = match registry.expression(action) {
            Some(expression) => {
                self.states.insert(action, Resolution::InProgress);
                self.evaluate(expression)
            }
            None => None,
        };
        self.states.insert(action, Resolution::Done(outcome.clone()));
        outcome
    }

    fn evaluate(&mut self, expression: &'a ActionExpression) -> Option<ActionContext> {
        match expression {
            ActionExpression::RawEvent(pattern) => ActionContext::from_events(
                self.events.iter().filter(|event| pattern.matches(event)),
                self.device,
            ),
            ActionExpression::Realtime(predicate) => predicate
                .is_active(self.device)
                .then(|| ActionContext::from_realtime(predicate, self.device)),
            ActionExpression::Composite {
                op: CompositeOp::And,
                left,
                right,
            } => {
                let left = self.resolve(*left)?;
                let right = self.resolve(*right)?;
                Some(left.merge(right))
            }
            ActionExpression::Hotkey(hotkey) => {
                let registry = self.registry;
                self.evaluate(registry.hotkey_expression(*hotkey))
            }
            ActionExpression::Unbound => None,
        }
    }
}
