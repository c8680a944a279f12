//! Snapshot handed to context-aware handlers describing why an action fired.

use crate::action::expression::RealtimePredicate;
use crate::input::event::{DeviceState, InputEvent, Point};
use ratatui::crossterm::event::{KeyCode, MouseButton};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionContext {
    /// First event that matched this frame; `None` for purely polled triggers.
    pub event: Option<InputEvent>,
    pub cursor: Point,
    /// Cursor movement accumulated over the frame's matching events.
    pub delta: Point,
    /// Wheel movement accumulated over the frame's matching events.
    pub scroll: f32,
    pub button: Option<MouseButton>,
    pub key: Option<KeyCode>,
    /// New window size for resize triggers.
    pub size: Option<(u32, u32)>,
}

impl ActionContext {
    /// Context carrying only the current cursor position.
    pub fn from_device(device: &dyn DeviceState) -> Self {
        Self {
            cursor: device.cursor_position(),
            ..Self::default()
        }
    }

    /// Context for a realtime predicate that is currently true.
    pub fn from_realtime(predicate: &RealtimePredicate, device: &dyn DeviceState) -> Self {
        let mut context = Self::from_device(device);
        match predicate {
            RealtimePredicate::Key(key) => context.key = Some(*key),
            RealtimePredicate::Keys(pair) => {
                context.key = pair.keys().find(|key| device.is_key_pressed(*key));
            }
            RealtimePredicate::Button(button) => context.button = Some(*button),
            RealtimePredicate::Custom(_) => {}
        }
        context
    }

    /// Fold every matching event of one frame into a single context.
    ///
    /// Returns `None` when nothing matched.
    pub fn from_events<'a, I>(events: I, device: &dyn DeviceState) -> Option<Self>
    where
        I: IntoIterator<Item = &'a InputEvent>,
    {
        let mut events = events.into_iter();
        let first = *events.next()?;

        let mut context = Self {
            event: Some(first),
            key: first.key(),
            button: first.button(),
            ..Self::from_device(device)
        };
        context.absorb(&first);
        for event in events {
            context.absorb(event);
        }
        Some(context)
    }

    fn absorb(&mut self, event: &InputEvent) {
        if let Some(position) = event.position() {
            self.cursor = position;
        }
        match *event {
            InputEvent::MouseMoved { delta, .. } => self.delta = self.delta + delta,
            InputEvent::MouseWheelScrolled { delta, .. } => self.scroll += delta,
            InputEvent::Resized { width, height } => self.size = Some((width, height)),
            _ => {}
        }
    }

    /// Combine the contexts of both operands of a composite.
    ///
    /// The event-driven side wins on every field it sets; the other side fills gaps.
    pub fn merge(self, other: ActionContext) -> Self {
        let (primary, secondary) = if self.event.is_none() && other.event.is_some() {
            (other, self)
        } else {
            (self, other)
        };

        Self {
            event: primary.event.or(secondary.event),
            cursor: primary.cursor,
            delta: if primary.delta == Point::ZERO {
                secondary.delta
            } else {
                primary.delta
            },
            scroll: if primary.scroll == 0.0 {
                secondary.scroll
            } else {
                primary.scroll
            },
            button: primary.button.or(secondary.button),
            key: primary.key.or(secondary.key),
            size: primary.size.or(secondary.size),
        }
    }

    pub fn is_from_event(&self) -> bool {
        self.event.is_some()
    }
}
