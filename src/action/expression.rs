//! Action expressions: what has to happen on the devices for an action to trigger.

use crate::action::ActionId;
use crate::hotkeys::{HotkeyId, KeyBindingPair};
use crate::input::event::{DeviceState, EventKind, InputEvent};
use ratatui::crossterm::event::{KeyCode, MouseButton};
use std::fmt;
use std::rc::Rc;

/// How often a triggered action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerMode {
    /// Once, on the release that ends a press.
    ReleaseOnce,
    /// Every frame while the input is held.
    Hold,
    /// Once per frame in which a matching discrete event arrived.
    EventOnce,
}

/// Restricts which events of a kind match a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFilter {
    Any,
    Key(KeyCode),
    /// Either slot of a hotkey binding. Unbound slots never match.
    Keys(KeyBindingPair),
    Button(MouseButton),
}

impl InputFilter {
    pub fn matches(&self, event: &InputEvent) -> bool {
        match self {
            InputFilter::Any => true,
            InputFilter::Key(key) => event.key() == Some(*key),
            InputFilter::Keys(pair) => event.key().is_some_and(|key| pair.contains(key)),
            InputFilter::Button(button) => event.button() == Some(*button),
        }
    }
}

/// One discrete event kind, optionally narrowed to a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPattern {
    pub kind: EventKind,
    pub filter: InputFilter,
}

impl EventPattern {
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            filter: InputFilter::Any,
        }
    }

    pub const fn with_filter(kind: EventKind, filter: InputFilter) -> Self {
        Self { kind, filter }
    }

    pub const fn key_pressed(key: KeyCode) -> Self {
        Self::with_filter(EventKind::KeyPressed, InputFilter::Key(key))
    }

    pub const fn key_released(key: KeyCode) -> Self {
        Self::with_filter(EventKind::KeyReleased, InputFilter::Key(key))
    }

    pub const fn keys_released(keys: KeyBindingPair) -> Self {
        Self::with_filter(EventKind::KeyReleased, InputFilter::Keys(keys))
    }

    pub const fn button_pressed(button: MouseButton) -> Self {
        Self::with_filter(EventKind::MouseButtonPressed, InputFilter::Button(button))
    }

    pub const fn button_released(button: MouseButton) -> Self {
        Self::with_filter(EventKind::MouseButtonReleased, InputFilter::Button(button))
    }

    pub fn matches(&self, event: &InputEvent) -> bool {
        event.kind() == self.kind && self.filter.matches(event)
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        match self.kind {
            EventKind::KeyReleased | EventKind::MouseButtonReleased => TriggerMode::ReleaseOnce,
            _ => TriggerMode::EventOnce,
        }
    }
}

/// Condition polled against device state every frame.
#[derive(Clone)]
pub enum RealtimePredicate {
    Key(KeyCode),
    /// Either slot of a hotkey binding is held.
    Keys(KeyBindingPair),
    Button(MouseButton),
    Custom(Rc<dyn Fn(&dyn DeviceState) -> bool>),
}

impl RealtimePredicate {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&dyn DeviceState) -> bool + 'static,
    {
        RealtimePredicate::Custom(Rc::new(predicate))
    }

    pub fn is_active(&self, device: &dyn DeviceState) -> bool {
        match self {
            RealtimePredicate::Key(key) => device.is_key_pressed(*key),
            RealtimePredicate::Keys(pair) => pair.keys().any(|key| device.is_key_pressed(key)),
            RealtimePredicate::Button(button) => device.is_button_pressed(*button),
            RealtimePredicate::Custom(predicate) => predicate(device),
        }
    }
}

impl fmt::Debug for RealtimePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealtimePredicate::Key(key) => f.debug_tuple("Key").field(key).finish(),
            RealtimePredicate::Keys(pair) => f.debug_tuple("Keys").field(pair).finish(),
            RealtimePredicate::Button(button) => f.debug_tuple("Button").field(button).finish(),
            RealtimePredicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Boolean operator joining two actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOp {
    And,
}

/// How an action is satisfied.
#[derive(Debug, Clone)]
pub enum ActionExpression {
    RawEvent(EventPattern),
    Realtime(RealtimePredicate),
    /// Triggered when both referenced actions trigger in the same frame.
    Composite {
        op: CompositeOp,
        left: ActionId,
        right: ActionId,
    },
    /// Whatever the hotkey's current binding resolves to.
    Hotkey(HotkeyId),
    /// Never triggers.
    Unbound,
}

impl ActionExpression {
    /// Expression for a hotkey binding under the given mode.
    pub fn for_keys(keys: KeyBindingPair, mode: TriggerMode) -> Self {
        if keys.is_unbound() {
            return ActionExpression::Unbound;
        }

        match mode {
            TriggerMode::Hold => ActionExpression::Realtime(RealtimePredicate::Keys(keys)),
            TriggerMode::ReleaseOnce => {
                ActionExpression::RawEvent(EventPattern::keys_released(keys))
            }
            TriggerMode::EventOnce => ActionExpression::RawEvent(EventPattern::with_filter(
                EventKind::KeyPressed,
                InputFilter::Keys(keys),
            )),
        }
    }

    pub fn depends_on_hotkey(&self, id: HotkeyId) -> bool {
        matches!(self, ActionExpression::Hotkey(hotkey) if *hotkey == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{DeviceSnapshot, Point};

    #[test]
    fn key_pair_filter_ignores_unbound_slot() {
        let pattern = EventPattern::keys_released(KeyBindingPair::single(KeyCode::Enter));
        assert!(pattern.matches(&InputEvent::KeyReleased(KeyCode::Enter)));
        assert!(!pattern.matches(&InputEvent::KeyPressed(KeyCode::Enter)));
        assert!(!pattern.matches(&InputEvent::KeyReleased(KeyCode::Esc)));
        assert_eq!(pattern.trigger_mode(), TriggerMode::ReleaseOnce);
    }

    #[test]
    fn button_filter_matches_only_that_button() {
        let pattern = EventPattern::button_pressed(MouseButton::Left);
        assert!(pattern.matches(&InputEvent::MouseButtonPressed {
            button: MouseButton::Left,
            position: Point::ZERO,
        }));
        assert!(!pattern.matches(&InputEvent::MouseButtonPressed {
            button: MouseButton::Right,
            position: Point::ZERO,
        }));
        assert_eq!(pattern.trigger_mode(), TriggerMode::EventOnce);
    }

    #[test]
    fn realtime_pair_polls_both_slots() {
        let predicate = RealtimePredicate::Keys(KeyBindingPair::both(
            KeyCode::Char('w'),
            KeyCode::Up,
        ));
        let mut device = DeviceSnapshot::new();
        assert!(!predicate.is_active(&device));

        device.press_key(KeyCode::Up);
        assert!(predicate.is_active(&device));
    }

    #[test]
    fn unbound_pair_builds_unbound_expression() {
        for mode in [TriggerMode::Hold, TriggerMode::ReleaseOnce, TriggerMode::EventOnce] {
            assert!(matches!(
                ActionExpression::for_keys(KeyBindingPair::unbound(), mode),
                ActionExpression::Unbound
            ));
        }
    }

    #[test]
    fn custom_predicate_sees_device() {
        let predicate =
            RealtimePredicate::custom(|device| device.cursor_position() == Point::new(1, 1));
        let mut device = DeviceSnapshot::new();
        assert!(!predicate.is_active(&device));
        device.move_cursor(Point::new(1, 1));
        assert!(predicate.is_active(&device));
        assert_eq!(format!("{predicate:?}"), "Custom(..)");
    }
}
