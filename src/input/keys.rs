//! Human-readable key names used by the keymap file and the `--bind` flag.
//!
//! Letters are case-insensitive and map to the lowercase `KeyCode::Char`, since that is
//! what terminals report for an unshifted key press.

use crate::error::{ActionError, Result};
use ratatui::crossterm::event::KeyCode;

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Space", KeyCode::Char(' ')),
    ("Tab", KeyCode::Tab),
    ("Backspace", KeyCode::Backspace),
    ("Delete", KeyCode::Delete),
    ("Insert", KeyCode::Insert),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("BackTab", KeyCode::BackTab),
    ("CapsLock", KeyCode::CapsLock),
    ("ScrollLock", KeyCode::ScrollLock),
    ("NumLock", KeyCode::NumLock),
    ("PrintScreen", KeyCode::PrintScreen),
    ("Pause", KeyCode::Pause),
    ("Menu", KeyCode::Menu),
];

const ALIASES: &[(&str, &str)] = &[("Return", "Enter"), ("Escape", "Esc")];

/// Parse a key name such as `"W"`, `"Up"`, `"F5"` or `"Space"`.
pub fn parse_key(name: &str) -> Result<KeyCode> {
    let trimmed = name.trim();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map_or(trimmed, |(_, target)| *target);

    if let Some((_, code)) = NAMED_KEYS
        .iter()
        .find(|(key_name, _)| key_name.eq_ignore_ascii_case(canonical))
    {
        return Ok(*code);
    }

    let mut chars = canonical.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_graphic() {
            return Ok(KeyCode::Char(ch.to_ascii_lowercase()));
        }
    }

    if let Some(number) = canonical
        .strip_prefix('F')
        .or_else(|| canonical.strip_prefix('f'))
    {
        if let Ok(n @ 1..=24) = number.parse::<u8>() {
            return Ok(KeyCode::F(n));
        }
    }

    Err(ActionError::unknown_key(name))
}

/// True if `code` survives a round trip through [`key_name`] and [`parse_key`].
pub fn is_nameable(code: KeyCode) -> bool {
    parse_key(&key_name(code)).is_ok_and(|parsed| parsed == code)
}

/// Inverse of [`parse_key`] for every key it accepts; other codes use their debug form.
pub fn key_name(code: KeyCode) -> String {
    if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, named)| *named == code) {
        return (*name).to_string();
    }

    match code {
        KeyCode::Char(ch) => ch.to_ascii_uppercase().to_string(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}
