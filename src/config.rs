//! Keymap persistence.
//!
//! Bindings are stored as TOML:
//!
//! ```toml
//! [hotkeys]
//! up = ["W", "Up"]
//! confirm = ["Enter"]
//! cancel = []
//! ```
//!
//! Every name is validated here, at the settings boundary, so unknown hotkeys or keys
//! never reach the action core. Hotkeys missing from the file keep their defaults.

use crate::error::{ActionError, Result};
use crate::hotkeys::{HotkeyId, HotkeyTable, KeyBindingPair};
use crate::input::keys::{is_nameable, key_name, parse_key};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk form of the hotkey table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeymapConfig {
    #[serde(default)]
    pub hotkeys: BTreeMap<String, Vec<String>>,
}

impl KeymapConfig {
    /// Snapshot `table`, failing on any key that could not be read back.
    pub fn from_table(table: &HotkeyTable) -> Result<Self> {
        let hotkeys = table
            .iter()
            .map(|(id, keys)| Ok((id.name().to_string(), key_names(keys)?)))
            .collect::<Result<_>>()?;
        Ok(Self { hotkeys })
    }

    /// Validate every entry, returning the bindings ordered by hotkey name.
    pub fn bindings(&self) -> Result<Vec<(HotkeyId, KeyBindingPair)>> {
        self.hotkeys
            .iter()
            .map(|(name, keys)| {
                let id: HotkeyId = name.parse()?;
                let names: Vec<&str> = keys.iter().map(String::as_str).collect();
                Ok((id, pair_from_names(id, &names)?))
            })
            .collect()
    }

    /// Apply every binding to `table`, or none of them if any entry is invalid.
    pub fn apply_to(&self, table: &mut HotkeyTable) -> Result<()> {
        for (id, keys) in self.bindings()? {
            table.set(id, keys);
        }
        Ok(())
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Parse a `NAME=KEY[,KEY]` binding, as accepted by the `--bind` flag.
///
/// `NAME=` with no keys unbinds the hotkey.
pub fn parse_binding(binding: &str) -> Result<(HotkeyId, KeyBindingPair)> {
    let (name, keys) = binding
        .split_once('=')
        .ok_or_else(|| ActionError::invalid_rebind(binding))?;
    let id: HotkeyId = name.parse()?;
    let names: Vec<&str> = keys
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .collect();
    Ok((id, pair_from_names(id, &names)?))
}

fn pair_from_names(id: HotkeyId, names: &[&str]) -> Result<KeyBindingPair> {
    match names {
        [] => Ok(KeyBindingPair::unbound()),
        [primary] => Ok(KeyBindingPair::single(parse_key(primary)?)),
        [primary, alternate] => Ok(KeyBindingPair::both(
            parse_key(primary)?,
            parse_key(alternate)?,
        )),
        _ => Err(ActionError::TooManyKeys {
            hotkey: id.name().to_string(),
        }),
    }
}

/// Names for every bound key, or `UnknownKey` for one without a parseable name.
fn key_names(keys: KeyBindingPair) -> Result<Vec<String>> {
    keys.keys()
        .map(|key| {
            if is_nameable(key) {
                Ok(key_name(key))
            } else {
                Err(ActionError::unknown_key(key_name(key)))
            }
        })
        .collect()
}

/// Default keymap location under the user's configuration directory.
pub fn default_keymap_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("actionmap").join("keymap.toml"))
}

/// Hotkey table backed by an optional keymap file.
///
/// Every successful rebind is written back immediately when a path is attached.
#[derive(Debug)]
pub struct SettingsStore {
    hotkeys: HotkeyTable,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Defaults only, never written to disk.
    pub fn in_memory() -> Self {
        Self {
            hotkeys: HotkeyTable::with_defaults(),
            path: None,
        }
    }

    /// Load `path` over the defaults. A missing file is not an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut hotkeys = HotkeyTable::with_defaults();

        match fs::read_to_string(&path) {
            Ok(text) => {
                let config: KeymapConfig = toml::from_str(&text)
                    .map_err(|err| ActionError::config(&path, err.to_string()))?;
                config.apply_to(&mut hotkeys)?;
                info!("loaded keymap from {}", path.display());
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no keymap at {}, using defaults", path.display());
            }
            Err(err) => {
                return Err(ActionError::file_error(
                    format!("Failed to read keymap {}", path.display()),
                    err,
                ))
            }
        }

        Ok(Self {
            hotkeys,
            path: Some(path),
        })
    }

    pub fn hotkeys(&self) -> &HotkeyTable {
        &self.hotkeys
    }

    /// Direct table access, e.g. for attaching an action handler.
    pub fn hotkeys_mut(&mut self) -> &mut HotkeyTable {
        &mut self.hotkeys
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rebind by names, validating both the hotkey and the keys.
    pub fn rebind(&mut self, hotkey: &str, keys: &[&str]) -> Result<bool> {
        let id: HotkeyId = hotkey.parse()?;
        let pair = pair_from_names(id, keys)?;
        self.set(id, pair)
    }

    /// Store a binding, notify observers and persist. Returns false if unchanged.
    ///
    /// Keys that cannot be written to the keymap are rejected before the table changes.
    pub fn set(&mut self, id: HotkeyId, keys: KeyBindingPair) -> Result<bool> {
        key_names(keys)?;
        if !self.hotkeys.set(id, keys) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Write the current table to the attached path, if any.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let text = KeymapConfig::from_table(&self.hotkeys)?
            .to_toml()
            .map_err(|err| ActionError::config(path, err.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                ActionError::file_error(format!("Failed to create {}", parent.display()), err)
            })?;
        }
        fs::write(path, text).map_err(|err| {
            ActionError::file_error(format!("Failed to write keymap {}", path.display()), err)
        })?;
        debug!("saved keymap to {}", path.display());
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
