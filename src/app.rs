//! Application callback surface.
//!
//! The action core never calls into a concrete application type. Instead the host
//! implements [`AppCallbacks`] and hands it to
//! [`ActionHandler::with_app`](crate::handler::ActionHandler::with_app), which wires every
//! default action to the matching method. Every method defaults to doing nothing.

use crate::action::ActionContext;
use crate::dispatch::HandlerResult;
use std::fmt;

/// Direction of a navigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

pub trait AppCallbacks {
    fn on_quit(&mut self) -> HandlerResult {
        Ok(())
    }

    fn on_resize(&mut self, _context: &ActionContext) -> HandlerResult {
        Ok(())
    }

    fn on_escape(&mut self) -> HandlerResult {
        Ok(())
    }

    fn on_enter(&mut self) -> HandlerResult {
        Ok(())
    }

    /// Called every frame while a direction key is held.
    fn on_nav(&mut self, _direction: Direction) -> HandlerResult {
        Ok(())
    }

    fn on_mouse_move(&mut self, _context: &ActionContext) -> HandlerResult {
        Ok(())
    }

    fn on_mouse_select(&mut self, _context: &ActionContext) -> HandlerResult {
        Ok(())
    }

    fn on_mouse_select_drag(&mut self, _context: &ActionContext) -> HandlerResult {
        Ok(())
    }

    fn on_mouse_command(&mut self, _context: &ActionContext) -> HandlerResult {
        Ok(())
    }

    fn on_mouse_pan(&mut self, _context: &ActionContext) -> HandlerResult {
        Ok(())
    }

    fn on_mouse_scroll(&mut self, _context: &ActionContext) -> HandlerResult {
        Ok(())
    }
}
