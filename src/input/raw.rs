//! Low-level input collection: crossterm polling, translation into [`InputEvent`]s, and
//! device state tracking for realtime actions.
//!
//! Terminals are the windowing layer here. Ctrl+C stands in for the window close
//! button, and cursor deltas are computed from consecutive mouse reports.

use crate::error::Result;
use crate::input::event::{DeviceSnapshot, DeviceState, InputEvent, Point};
use log::trace;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::collections::VecDeque;
use std::time::Duration;

/// Wheel delta reported for a single scroll notch.
const WHEEL_NOTCH: f32 = 1.0;
/// Upper bound on events drained in one frame so a flood cannot stall the loop.
const MAX_EVENTS_PER_FRAME: usize = 256;

/// Collector that polls crossterm for events and keeps the device state current.
#[derive(Debug)]
pub struct RawInputCollector {
    device: DeviceSnapshot,
    pending_events: VecDeque<InputEvent>,
    last_cursor: Option<Point>,
    momentary_keys: bool,
}

impl RawInputCollector {
    pub fn new() -> Self {
        Self {
            device: DeviceSnapshot::new(),
            pending_events: VecDeque::new(),
            last_cursor: None,
            momentary_keys: false,
        }
    }

    /// Collector for terminals that never report key releases.
    ///
    /// Pressed keys are only considered down for the frame in which their press (or
    /// auto-repeat) arrived.
    pub fn with_momentary_keys() -> Self {
        Self {
            momentary_keys: true,
            ..Self::new()
        }
    }

    pub fn momentary_keys(&self) -> bool {
        self.momentary_keys
    }

    /// Current device state for realtime predicates.
    pub fn device(&self) -> &DeviceSnapshot {
        &self.device
    }

    /// Reset per-frame device state. Call before draining the frame's events.
    ///
    /// With momentary keys, every key still down is released here and a matching
    /// [`InputEvent::KeyReleased`] is queued, so release-triggered actions still fire.
    pub fn begin_frame(&mut self) {
        if !self.momentary_keys {
            return;
        }
        let held: Vec<KeyCode> = self.device.pressed_keys().collect();
        for key in held {
            self.device.release_key(key);
            self.pending_events.push_back(InputEvent::KeyReleased(key));
        }
    }

    /// Check whether the collector has no translated events waiting.
    pub fn is_idle(&self) -> bool {
        self.pending_events.is_empty()
    }

    /// Process a synthetic event (primarily used by unit tests).
    pub fn process_event(&mut self, event: Event) {
        self.enqueue_event(event);
    }

    /// Drain every event that is ready, waiting at most `timeout` for the first one.
    pub fn poll_frame(&mut self, timeout: Duration) -> Result<Vec<InputEvent>> {
        let mut wait = timeout;
        while self.pending_events.len() < MAX_EVENTS_PER_FRAME && event::poll(wait)? {
            let event = event::read()?;
            self.enqueue_event(event);
            wait = Duration::ZERO;
        }
        Ok(self.pending_events.drain(..).collect())
    }

    /// Pop the next translated event.
    pub fn pop_pending(&mut self) -> Option<InputEvent> {
        self.pending_events.pop_front()
    }

    fn enqueue_event(&mut self, event: Event) {
        let translated = match event {
            Event::Key(key_event) => self.translate_key(key_event),
            Event::Resize(width, height) => Some(InputEvent::Resized {
                width: u32::from(width),
                height: u32::from(height),
            }),
            Event::Mouse(mouse_event) => self.translate_mouse(mouse_event),
            _ => None,
        };

        if let Some(event) = translated {
            trace!("raw input {event:?}");
            self.device.apply(&event);
            self.pending_events.push_back(event);
        }
    }

    fn translate_key(&mut self, key_event: KeyEvent) -> Option<InputEvent> {
        let code = normalize_key(key_event.code);

        if key_event.modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return match key_event.kind {
                KeyEventKind::Release => None,
                _ => Some(InputEvent::Closed),
            };
        }

        match key_event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => Some(InputEvent::KeyPressed(code)),
            KeyEventKind::Release => Some(InputEvent::KeyReleased(code)),
        }
    }

    fn translate_mouse(&mut self, mouse_event: MouseEvent) -> Option<InputEvent> {
        let position = Point::new(i32::from(mouse_event.column), i32::from(mouse_event.row));

        match mouse_event.kind {
            MouseEventKind::Down(button) => {
                self.last_cursor = Some(position);
                Some(InputEvent::MouseButtonPressed { button, position })
            }
            MouseEventKind::Up(button) => {
                self.last_cursor = Some(position);
                Some(InputEvent::MouseButtonReleased { button, position })
            }
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let previous = self.last_cursor.replace(position).unwrap_or(position);
                let delta = position - previous;
                if delta == Point::ZERO && self.device.cursor_position() == position {
                    return None;
                }
                if let MouseEventKind::Drag(button) = mouse_event.kind {
                    // Drag implies the button is down even if its press was missed.
                    self.device.press_button(button);
                }
                Some(InputEvent::MouseMoved { position, delta })
            }
            MouseEventKind::ScrollUp => Some(InputEvent::MouseWheelScrolled {
                delta: WHEEL_NOTCH,
                position,
            }),
            MouseEventKind::ScrollDown => Some(InputEvent::MouseWheelScrolled {
                delta: -WHEEL_NOTCH,
                position,
            }),
            _ => None,
        }
    }
}

impl Default for RawInputCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceState for RawInputCollector {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.device.is_key_pressed(key)
    }

    fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.device.is_button_pressed(button)
    }

    fn cursor_position(&self) -> Point {
        self.device.cursor_position()
    }
}

/// Terminals report shifted letters as uppercase chars; bindings use lowercase.
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(ch) if ch.is_ascii_uppercase() => KeyCode::Char(ch.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn queues_key_events_and_tracks_state() {
        let mut collector = RawInputCollector::new();
        collector.process_event(key(KeyCode::Char('W'), KeyEventKind::Press));

        assert_eq!(
            collector.pop_pending(),
            Some(InputEvent::KeyPressed(KeyCode::Char('w')))
        );
        assert!(collector.is_key_pressed(KeyCode::Char('w')));

        collector.process_event(key(KeyCode::Char('w'), KeyEventKind::Release));
        assert_eq!(
            collector.pop_pending(),
            Some(InputEvent::KeyReleased(KeyCode::Char('w')))
        );
        assert!(!collector.is_key_pressed(KeyCode::Char('w')));
        assert!(collector.is_idle());
    }

    #[test]
    fn ctrl_c_closes() {
        let mut collector = RawInputCollector::new();
        collector.process_event(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(collector.pop_pending(), Some(InputEvent::Closed));
    }

    #[test]
    fn mouse_moves_carry_delta() {
        let mut collector = RawInputCollector::new();
        collector.process_event(mouse(MouseEventKind::Down(MouseButton::Right), 10, 5));
        collector.process_event(mouse(MouseEventKind::Drag(MouseButton::Right), 13, 4));

        assert!(matches!(
            collector.pop_pending(),
            Some(InputEvent::MouseButtonPressed {
                button: MouseButton::Right,
                ..
            })
        ));
        assert_eq!(
            collector.pop_pending(),
            Some(InputEvent::MouseMoved {
                position: Point::new(13, 4),
                delta: Point::new(3, -1),
            })
        );
        assert!(collector.is_button_pressed(MouseButton::Right));
        assert_eq!(collector.cursor_position(), Point::new(13, 4));
    }

    #[test]
    fn repeated_move_to_same_cell_is_dropped() {
        let mut collector = RawInputCollector::new();
        collector.process_event(mouse(MouseEventKind::Moved, 2, 2));
        collector.process_event(mouse(MouseEventKind::Moved, 2, 2));

        assert!(matches!(
            collector.pop_pending(),
            Some(InputEvent::MouseMoved { .. })
        ));
        assert!(collector.is_idle());
    }

    #[test]
    fn wheel_and_resize_translate() {
        let mut collector = RawInputCollector::new();
        collector.process_event(mouse(MouseEventKind::ScrollDown, 0, 0));
        collector.process_event(Event::Resize(80, 24));

        assert_eq!(
            collector.pop_pending(),
            Some(InputEvent::MouseWheelScrolled {
                delta: -1.0,
                position: Point::ZERO,
            })
        );
        assert_eq!(
            collector.pop_pending(),
            Some(InputEvent::Resized {
                width: 80,
                height: 24
            })
        );
    }

    #[test]
    fn momentary_keys_release_at_frame_start() {
        let mut collector = RawInputCollector::with_momentary_keys();
        collector.process_event(key(KeyCode::Up, KeyEventKind::Press));
        assert!(collector.is_key_pressed(KeyCode::Up));

        assert_eq!(
            collector.pop_pending(),
            Some(InputEvent::KeyPressed(KeyCode::Up))
        );

        collector.begin_frame();
        assert!(!collector.is_key_pressed(KeyCode::Up));
        assert_eq!(
            collector.pop_pending(),
            Some(InputEvent::KeyReleased(KeyCode::Up))
        );

        collector.begin_frame();
        assert!(collector.is_idle());
    }
}
