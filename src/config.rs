// src/config.rs

//! Defines the configuration structures for the `chisel` editor.
//!
//! The configuration is deserialized from a JSON file named by the
//! `CHISEL_CONFIG` environment variable. Every section carries defaults, so a
//! partial file (or no file at all) is valid. Variations of the editor that
//! used to be separate entry points are expressed as settings here.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::history::DEFAULT_UNDO_LIMIT;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "CHISEL_CONFIG";

// --- Top-Level Configuration Structure ---

/// Represents the complete configuration for the editor.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Raw mode and control sequence settings.
    pub terminal: TerminalConfig,
    /// Input decoding settings.
    pub input: InputConfig,
    /// Event bus settings.
    pub bus: BusConfig,
    /// Editor session settings.
    pub editor: EditorConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads the configuration from the file named by `CHISEL_CONFIG`. A
    /// missing variable yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_var(std::env::var_os(CONFIG_ENV_VAR))
    }

    /// Like `load`, but a file that fails to load is replaced by the
    /// defaults. The failure is handed back so the caller can report it once
    /// logging is set up, which itself depends on the configuration.
    pub fn load_or_default() -> (Self, Option<anyhow::Error>) {
        Self::or_default(Self::load())
    }

    fn or_default(loaded: anyhow::Result<Self>) -> (Self, Option<anyhow::Error>) {
        match loaded {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        }
    }

    fn load_from_var(path: Option<OsString>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                debug!("Config: {} not set, using defaults.", CONFIG_ENV_VAR);
                Ok(Config::default())
            }
        }
    }

    /// Reads and parses a JSON configuration file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

// --- Terminal Configuration ---

/// Settings applied when the terminal session enters raw mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerminalConfig {
    /// Put the device into raw mode. When false the session only emits the
    /// control sequences, which is useful when stdin is not a terminal.
    pub raw_mode: bool,
    /// Switch to the alternate screen buffer (and save/restore the cursor).
    pub alternate_screen: bool,
    /// Enable mouse click and drag reporting.
    pub mouse_reporting: bool,
    /// Enable focus change reporting.
    pub focus_reporting: bool,
    /// Read timeout in deciseconds (termios `VTIME`). A read that sees no
    /// input within this window returns zero bytes.
    pub read_timeout_ds: u8,
    /// Restore the terminal from a panic hook before the panic message is
    /// printed.
    pub restore_on_panic: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            raw_mode: true,
            alternate_screen: true,
            mouse_reporting: true,
            focus_reporting: true,
            read_timeout_ds: 1,
            restore_on_panic: true,
        }
    }
}

// --- Input Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum number of bytes read from the device per chunk.
    pub chunk_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig { chunk_size: 32 }
    }
}

// --- Bus Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BusConfig {
    /// Number of events the bus holds before producers block.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig { capacity: 64 }
    }
}

// --- Editor Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Draw a one-row status line after every processed event.
    pub status_line: bool,
    /// Number of edits kept for undo.
    pub undo_limit: usize,
    /// Maps a single-character key to a command name known to the registry
    /// (e.g. `"j": "move.down"`).
    pub keybindings: BTreeMap<String, String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let keybindings = [
            ("k", "move.up"),
            ("j", "move.down"),
            ("h", "move.left"),
            ("l", "move.right"),
            ("0", "move.first"),
            ("$", "move.last"),
            ("g", "move.top"),
            ("G", "move.bottom"),
            ("O", "line.insert"),
            ("o", "line.append"),
            ("d", "line.delete"),
            ("\r", "line.break"),
            ("J", "line.join"),
            ("y", "line.copy"),
            ("p", "line.paste"),
            ("u", "line.undo"),
            ("\u{12}", "line.redo"),
            ("q", "quit"),
        ]
        .into_iter()
        .map(|(key, command)| (key.to_string(), command.to_string()))
        .collect();

        EditorConfig {
            status_line: true,
            undo_limit: DEFAULT_UNDO_LIMIT,
            keybindings,
        }
    }
}

// --- Logging Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    /// Write logs to this file instead of stderr. Recommended while the
    /// terminal is on the alternate screen.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = Config::from_json(r#"{ "terminal": { "read_timeout_ds": 5 }, "bus": { "capacity": 8 } }"#)
            .unwrap();
        assert_eq!(config.terminal.read_timeout_ds, 5);
        assert!(config.terminal.raw_mode);
        assert_eq!(config.bus.capacity, 8);
        assert_eq!(config.input, InputConfig::default());
        assert_eq!(config.editor.keybindings.get("j").map(String::as_str), Some("move.down"));
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn load_from_reports_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/chisel.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read config file"));
    }

    #[test]
    fn unset_variable_is_default() -> anyhow::Result<()> {
        assert_eq!(Config::load_from_var(None)?, Config::default());
        Ok(())
    }

    #[test]
    fn malformed_file_falls_back_to_defaults_and_keeps_the_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "bus": { "capacity": "many" } }"#)?;

        let (config, error) = Config::or_default(Config::load_from_var(Some(path.into())));

        assert_eq!(config, Config::default());
        let error = error.map(|e| format!("{:#}", e)).unwrap_or_default();
        assert!(error.contains("invalid config file"), "{}", error);
        Ok(())
    }

    #[test]
    fn load_from_reads_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "logging": { "level": "debug", "file": "/tmp/chisel.log" } }"#)?;
        let config = Config::load_from(&path)?;
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/chisel.log")));
        Ok(())
    }
}
