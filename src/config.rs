//! Application settings.
//!
//! Settings live in a flat JSON file at
//! `$XDG_CONFIG_HOME/hyprfade/config.json`.  Every key is optional; a
//! minimal `{}` file is valid and all keys fall back to their compiled-in
//! defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "opacity-level": 60,
//!   "cycle-rate": 50,
//!   "debug-mode": false,
//!   "toggle-hotkey": "<Super><Alt>t",
//!   "increase-window-opacity": "<Super><Alt>Up",
//!   "decrease-window-opacity": "<Super><Alt>Down"
//! }
//! ```

use crate::command::Hotkey;
use crate::traits::SettingsStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Opacity applied by the toggle, in percent (`0` = invisible,
    /// `100` = opaque).
    pub opacity_level: u8,
    /// Interval between opacity cycle ticks (ms).
    pub cycle_rate: u64,
    /// Emit debug-level log output.
    pub debug_mode: bool,
    /// Hotkey that starts/stops the opacity cycle.  Empty disables it.
    pub toggle_hotkey: String,
    /// Hotkey that raises the focused window's opacity.
    pub increase_window_opacity: String,
    /// Hotkey that lowers the focused window's opacity.
    pub decrease_window_opacity: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            opacity_level: 50,
            cycle_rate: 1000,
            debug_mode: false,
            toggle_hotkey: "<Super><Alt>t".into(),
            increase_window_opacity: "<Super><Alt>Up".into(),
            decrease_window_opacity: "<Super><Alt>Down".into(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `path` as pretty-printed JSON, creating
    /// the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError(format!("failed to create {}: {}", parent.display(), e)))?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError(format!("failed to serialize: {}", e)))?;
        std::fs::write(path, data)
            .map_err(|e| ConfigError(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.opacity_level > 100 {
            return Err(ConfigError(format!(
                "opacity-level must be 0-100, got {}",
                self.opacity_level
            )));
        }
        if self.cycle_rate == 0 {
            return Err(ConfigError("cycle-rate must be at least 1 ms".into()));
        }
        Ok(())
    }

    /// Accelerator string configured for `hotkey`.
    pub fn hotkey(&self, hotkey: Hotkey) -> &str {
        match hotkey {
            Hotkey::Toggle => &self.toggle_hotkey,
            Hotkey::Increase => &self.increase_window_opacity,
            Hotkey::Decrease => &self.decrease_window_opacity,
        }
    }

    pub fn hotkey_mut(&mut self, hotkey: Hotkey) -> &mut String {
        match hotkey {
            Hotkey::Toggle => &mut self.toggle_hotkey,
            Hotkey::Increase => &mut self.increase_window_opacity,
            Hotkey::Decrease => &mut self.decrease_window_opacity,
        }
    }

    /// Target opacity on the `0..=255` scale for the configured
    /// `opacity-level`.
    pub fn toggle_opacity(&self) -> u8 {
        let level = self.opacity_level.min(100) as u32;
        // Rounds half up, matching `round(level / 100 * 255)`.
        ((level * 255 + 50) / 100) as u8
    }
}

/// In-memory settings, used when nothing needs persisting.
impl SettingsStore for Config {
    type Error = ConfigError;

    fn settings(&self) -> Config {
        self.clone()
    }

    fn store(&mut self, settings: Config) -> Result<(), ConfigError> {
        settings.validate()?;
        *self = settings;
        Ok(())
    }
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/hyprfade`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("hyprfade")
}

/// Default location of the settings file.
pub fn default_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Settings backed by a JSON file.
///
/// Every read goes back to the file, so edits made while the daemon runs
/// are picked up and kept by the next write.  Every write is persisted
/// immediately.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    /// Last settings successfully read or written.
    current: RefCell<Config>,
}

impl FileSettings {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or invalid.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let current = match Config::load(&path) {
            Ok(cfg) => {
                info!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                info!("no usable config file ({}), using defaults", e);
                Config::default()
            }
        };
        Self {
            path,
            current: RefCell::new(current),
        }
    }

    /// The file these settings are persisted to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettings {
    type Error = ConfigError;

    /// Re-read the file.  A missing file keeps the last known settings, and
    /// an unreadable or invalid one is logged and does the same.
    fn settings(&self) -> Config {
        if !self.path.exists() {
            return self.current.borrow().clone();
        }
        match Config::load(&self.path) {
            Ok(cfg) => {
                *self.current.borrow_mut() = cfg.clone();
                cfg
            }
            Err(e) => {
                warn!("{}, keeping previous settings", e);
                self.current.borrow().clone()
            }
        }
    }

    fn store(&mut self, settings: Config) -> Result<(), ConfigError> {
        settings.validate()?;
        settings.save(&self.path)?;
        *self.current.get_mut() = settings;
        Ok(())
    }
}

/// Error from loading, validating or saving a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
