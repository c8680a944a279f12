//! Monitor state driven by action callbacks.

use crate::action::ActionContext;
use crate::app::{AppCallbacks, Direction};
use crate::dispatch::HandlerResult;
use crate::input::event::Point;
use std::collections::VecDeque;

/// Number of log entries kept for display.
pub const LOG_CAPACITY: usize = 64;

const ZOOM_STEP: f32 = 0.1;
const ZOOM_RANGE: (f32, f32) = (0.1, 10.0);

/// One line of the action log. Consecutive identical entries collapse into a count.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub frame: u64,
    pub text: String,
    pub repeat: u32,
}

#[derive(Debug)]
pub struct Monitor {
    log: VecDeque<LogEntry>,
    frame: u64,
    bounds: (u32, u32),
    marker: Point,
    cursor: Point,
    pan: Point,
    zoom: f32,
    quit_requested: bool,
}

impl Monitor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            log: VecDeque::with_capacity(LOG_CAPACITY),
            frame: 0,
            bounds: (width, height),
            marker: Point::ZERO,
            cursor: Point::ZERO,
            pan: Point::ZERO,
            zoom: 1.0,
            quit_requested: false,
        }
    }

    /// Advance the frame counter used to stamp log entries.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.log.iter()
    }

    pub fn marker(&self) -> Point {
        self.marker
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn bounds(&self) -> (u32, u32) {
        self.bounds
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn record(&mut self, text: String) {
        if let Some(last) = self.log.back_mut() {
            if last.text == text {
                last.repeat += 1;
                last.frame = self.frame;
                return;
            }
        }

        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(LogEntry {
            frame: self.frame,
            text,
            repeat: 1,
        });
    }

    fn clamp(&self, point: Point) -> Point {
        let max_x = i32::try_from(self.bounds.0).unwrap_or(i32::MAX).max(1) - 1;
        let max_y = i32::try_from(self.bounds.1).unwrap_or(i32::MAX).max(1) - 1;
        Point::new(point.x.clamp(0, max_x), point.y.clamp(0, max_y))
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl AppCallbacks for Monitor {
    fn on_quit(&mut self) -> HandlerResult {
        self.quit_requested = true;
        self.record("quit".to_string());
        Ok(())
    }

    fn on_resize(&mut self, context: &ActionContext) -> HandlerResult {
        if let Some((width, height)) = context.size {
            self.bounds = (width, height);
            self.marker = self.clamp(self.marker);
            self.record(format!("resize {width}x{height}"));
        }
        Ok(())
    }

    fn on_escape(&mut self) -> HandlerResult {
        self.record("cancel".to_string());
        Ok(())
    }

    fn on_enter(&mut self) -> HandlerResult {
        self.record(format!("confirm at {},{}", self.marker.x, self.marker.y));
        Ok(())
    }

    fn on_nav(&mut self, direction: Direction) -> HandlerResult {
        let step = match direction {
            Direction::Up => Point::new(0, -1),
            Direction::Down => Point::new(0, 1),
            Direction::Left => Point::new(-1, 0),
            Direction::Right => Point::new(1, 0),
        };
        self.marker = self.clamp(self.marker + step);
        self.record(format!("nav {direction}"));
        Ok(())
    }

    fn on_mouse_move(&mut self, context: &ActionContext) -> HandlerResult {
        self.cursor = context.cursor;
        Ok(())
    }

    fn on_mouse_select(&mut self, context: &ActionContext) -> HandlerResult {
        self.marker = self.clamp(context.cursor);
        self.record("select".to_string());
        Ok(())
    }

    fn on_mouse_select_drag(&mut self, context: &ActionContext) -> HandlerResult {
        self.record(format!(
            "drag select {:+},{:+}",
            context.delta.x, context.delta.y
        ));
        Ok(())
    }

    fn on_mouse_command(&mut self, _context: &ActionContext) -> HandlerResult {
        self.record("command".to_string());
        Ok(())
    }

    fn on_mouse_pan(&mut self, context: &ActionContext) -> HandlerResult {
        self.pan = self.pan + context.delta;
        self.record(format!("pan {},{}", self.pan.x, self.pan.y));
        Ok(())
    }

    fn on_mouse_scroll(&mut self, context: &ActionContext) -> HandlerResult {
        self.zoom = (self.zoom + context.scroll * ZOOM_STEP).clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
        self.record(format!("zoom {:.1}", self.zoom));
        Ok(())
    }
}
