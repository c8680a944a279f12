//! Input events and device state as seen by the action core.
//!
//! The windowing layer is an external collaborator: it hands the core a sequence of
//! [`InputEvent`]s per frame and answers realtime queries through [`DeviceState`].

use ratatui::crossterm::event::{KeyCode, MouseButton};
use std::collections::HashSet;
use std::ops::{Add, Sub};

/// Integer position or offset in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

/// Payload-free discriminant of [`InputEvent`], used by event patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Closed,
    Resized,
    KeyPressed,
    KeyReleased,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
    MouseWheelScrolled,
}

/// Discrete window and device event delivered once per occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Closed,
    Resized {
        width: u32,
        height: u32,
    },
    KeyPressed(KeyCode),
    KeyReleased(KeyCode),
    MouseButtonPressed {
        button: MouseButton,
        position: Point,
    },
    MouseButtonReleased {
        button: MouseButton,
        position: Point,
    },
    /// `delta` is the offset from the previously reported cursor position.
    MouseMoved {
        position: Point,
        delta: Point,
    },
    /// Positive `delta` scrolls up (away from the user).
    MouseWheelScrolled {
        delta: f32,
        position: Point,
    },
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Closed => EventKind::Closed,
            InputEvent::Resized { .. } => EventKind::Resized,
            InputEvent::KeyPressed(_) => EventKind::KeyPressed,
            InputEvent::KeyReleased(_) => EventKind::KeyReleased,
            InputEvent::MouseButtonPressed { .. } => EventKind::MouseButtonPressed,
            InputEvent::MouseButtonReleased { .. } => EventKind::MouseButtonReleased,
            InputEvent::MouseMoved { .. } => EventKind::MouseMoved,
            InputEvent::MouseWheelScrolled { .. } => EventKind::MouseWheelScrolled,
        }
    }

    /// Key carried by keyboard events.
    pub fn key(&self) -> Option<KeyCode> {
        match self {
            InputEvent::KeyPressed(key) | InputEvent::KeyReleased(key) => Some(*key),
            _ => None,
        }
    }

    /// Button carried by mouse button events.
    pub fn button(&self) -> Option<MouseButton> {
        match self {
            InputEvent::MouseButtonPressed { button, .. }
            | InputEvent::MouseButtonReleased { button, .. } => Some(*button),
            _ => None,
        }
    }

    /// Cursor position carried by mouse events.
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::MouseButtonPressed { position, .. }
            | InputEvent::MouseButtonReleased { position, .. }
            | InputEvent::MouseMoved { position, .. }
            | InputEvent::MouseWheelScrolled { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Realtime device queries used by polled actions.
pub trait DeviceState {
    fn is_key_pressed(&self, key: KeyCode) -> bool;

    fn is_button_pressed(&self, button: MouseButton) -> bool;

    fn cursor_position(&self) -> Point;
}

/// Plain-value device state, updated from events or set directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    cursor: Point,
}

impl DeviceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn release_all_keys(&mut self) {
        self.keys.clear();
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys.iter().copied()
    }

    pub fn press_button(&mut self, button: MouseButton) {
        self.buttons.insert(button);
    }

    pub fn release_button(&mut self, button: MouseButton) {
        self.buttons.remove(&button);
    }

    pub fn move_cursor(&mut self, position: Point) {
        self.cursor = position;
    }

    /// Fold a discrete event into the tracked state.
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyPressed(key) => self.press_key(key),
            InputEvent::KeyReleased(key) => self.release_key(key),
            InputEvent::MouseButtonPressed { button, position } => {
                self.press_button(button);
                self.move_cursor(position);
            }
            InputEvent::MouseButtonReleased { button, position } => {
                self.release_button(button);
                self.move_cursor(position);
            }
            InputEvent::MouseMoved { position, .. }
            | InputEvent::MouseWheelScrolled { position, .. } => self.move_cursor(position),
            InputEvent::Closed | InputEvent::Resized { .. } => {}
        }
    }
}

impl DeviceState for DeviceSnapshot {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    fn cursor_position(&self) -> Point {
        self.cursor
    }
}
