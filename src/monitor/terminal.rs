//! Terminal setup and drawing for the monitor, using ratatui.

use crate::error::{ActionError, Result};
use crate::hotkeys::HotkeyTable;
use crate::monitor::state::Monitor;
use ratatui::crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::{self, Stdout};

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

const HOTKEY_PANEL_WIDTH: u16 = 30;

#[derive(Default)]
pub struct MonitorTerminal {
    terminal: Option<CrosstermTerminal>,
    /// Set as soon as raw mode is on, so a failed `initialize` is still undone.
    raw_mode: bool,
    key_releases: bool,
}

impl MonitorTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter raw mode and the alternate screen.
    ///
    /// Key release reporting is requested when the terminal supports it; the return value
    /// says whether it was enabled.
    pub fn initialize(&mut self) -> Result<bool> {
        enable_raw_mode().map_err(|err| ActionError::ui(format!("raw mode: {err}")))?;
        self.raw_mode = true;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_releases = true;
        }

        let backend = CrosstermBackend::new(stdout);
        self.terminal = Some(Terminal::new(backend)?);
        Ok(self.key_releases)
    }

    /// Restore the terminal. Safe to call after a partial or failed `initialize`.
    pub fn cleanup(&mut self) -> Result<()> {
        self.terminal = None;
        if !self.raw_mode {
            return Ok(());
        }
        self.raw_mode = false;

        let mut stdout = io::stdout();
        if std::mem::take(&mut self.key_releases) {
            execute!(stdout, PopKeyboardEnhancementFlags)?;
        }
        disable_raw_mode()?;
        execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.raw_mode
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        Ok(ratatui::crossterm::terminal::size()?)
    }

    pub fn draw(&mut self, monitor: &Monitor, hotkeys: &HotkeyTable) -> Result<()> {
        if let Some(terminal) = self.terminal.as_mut() {
            terminal.draw(|frame| render(frame, monitor, hotkeys))?;
        }
        Ok(())
    }
}

impl Drop for MonitorTerminal {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Draw the hotkey panel, the action log and the status line.
pub fn render(frame: &mut Frame, monitor: &Monitor, hotkeys: &HotkeyTable) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.size());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(HOTKEY_PANEL_WIDTH), Constraint::Min(0)])
        .split(rows[0]);

    render_hotkeys(frame, columns[0], hotkeys);
    render_log(frame, columns[1], monitor);
    render_status(frame, rows[1], monitor);
}

fn render_hotkeys(frame: &mut Frame, area: Rect, hotkeys: &HotkeyTable) {
    let name_style = Style::default().add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = hotkeys
        .iter()
        .map(|(id, keys)| {
            Line::from(vec![
                Span::styled(format!("{:<8}", id.name()), name_style),
                Span::raw(keys.to_string()),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(Block::default().title("Hotkeys").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_log(frame: &mut Frame, area: Rect, monitor: &Monitor) {
    let visible = usize::from(area.height.saturating_sub(2));
    let skip = monitor.entries().len().saturating_sub(visible);
    let lines: Vec<Line> = monitor
        .entries()
        .skip(skip)
        .map(|entry| {
            let text = if entry.repeat > 1 {
                format!("{} (x{})", entry.text, entry.repeat)
            } else {
                entry.text.clone()
            };
            Line::from(vec![
                Span::styled(
                    format!("{:>6} ", entry.frame),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(text),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(Block::default().title("Actions").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_status(frame: &mut Frame, area: Rect, monitor: &Monitor) {
    let marker = monitor.marker();
    let pan = monitor.pan();
    let status_text = format!(
        "frame {} | marker {},{} | pan {},{} | zoom {:.1} | Ctrl+C quits",
        monitor.frame(),
        marker.x,
        marker.y,
        pan.x,
        pan.y,
        monitor.zoom()
    );

    let status_style = Style::default().bg(Color::Blue).fg(Color::White);
    frame.render_widget(Paragraph::new(status_text).style(status_style), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppCallbacks, Direction as Nav};
    use crate::hotkeys::{HotkeyId, KeyBindingPair};
    use ratatui::backend::TestBackend;

    fn rendered_text(monitor: &Monitor, hotkeys: &HotkeyTable) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|frame| render(frame, monitor, hotkeys))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn hotkey_panel_shows_bindings() {
        let mut hotkeys = HotkeyTable::with_defaults();
        hotkeys.set(HotkeyId::Cancel, KeyBindingPair::unbound());

        let text = rendered_text(&Monitor::default(), &hotkeys);
        assert!(text.contains("up      W / Up"));
        assert!(text.contains("cancel  - / -"));
    }

    #[test]
    fn log_and_status_are_drawn() {
        let mut monitor = Monitor::default();
        monitor.begin_frame();
        monitor.on_nav(Nav::Down).unwrap();
        monitor.on_nav(Nav::Down).unwrap();

        let text = rendered_text(&monitor, &HotkeyTable::with_defaults());
        assert!(text.contains("nav down (x2)"));
        assert!(text.contains("frame 1 | marker 0,2"));
    }

    #[test]
    fn cleanup_restores_raw_mode_without_a_terminal() {
        // State left behind when initialize fails after enabling raw mode
        let mut terminal = MonitorTerminal {
            terminal: None,
            raw_mode: true,
            key_releases: false,
        };
        assert!(terminal.is_active());

        let _ = terminal.cleanup();
        assert!(!terminal.is_active());
        assert!(terminal.cleanup().is_ok());
    }

    #[test]
    fn uninitialized_terminal_draw_is_a_no_op() {
        let mut terminal = MonitorTerminal::new();
        assert!(terminal
            .draw(&Monitor::default(), &HotkeyTable::with_defaults())
            .is_ok());
        assert!(terminal.cleanup().is_ok());
    }
}
