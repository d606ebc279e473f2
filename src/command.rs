//! Commands and types used throughout hyprfade.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every action the controller can perform and
//! [`WindowInfo`] identifies the window whose opacity is being changed.
//!
//! Commands reach the daemon as JSON over the control socket.  The CLI
//! client builds them from its arguments with [`Command::from_args`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every action the opacity controller can perform.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by the
/// [`OpacityController`](crate::controller::OpacityController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Make the focused window transparent, or restore it if it already is.
    ///
    /// This is the action behind the status-bar click target.
    ToggleTransparency,

    /// Start the ping-pong opacity cycle on the focused window, or stop it
    /// if it is already running.
    CycleOpacity,

    /// Raise the focused window's opacity by one step.
    IncreaseOpacity,

    /// Lower the focused window's opacity by one step.
    DecreaseOpacity,

    /// Set the `opacity-level` setting (percent, `0..=100`).
    SetOpacityLevel(u8),

    /// Set the `cycle-rate` setting (milliseconds between ticks).
    SetCycleRate(u64),

    /// Turn debug logging on or off.
    SetDebugMode(bool),

    /// Change one of the hotkeys.  An empty accelerator disables it.
    SetHotkey { hotkey: Hotkey, accelerator: String },

    /// Stop any running cycle and shut the daemon down.
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ToggleTransparency => write!(f, "toggle"),
            Command::CycleOpacity => write!(f, "cycle"),
            Command::IncreaseOpacity => write!(f, "increase"),
            Command::DecreaseOpacity => write!(f, "decrease"),
            Command::SetOpacityLevel(level) => write!(f, "opacity-level {}", level),
            Command::SetCycleRate(ms) => write!(f, "cycle-rate {}", ms),
            Command::SetDebugMode(on) => write!(f, "debug {}", if *on { "on" } else { "off" }),
            Command::SetHotkey {
                hotkey,
                accelerator,
            } => write!(f, "{} {}", hotkey.key(), accelerator),
            Command::Quit => write!(f, "quit"),
        }
    }
}

/// The configurable hotkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hotkey {
    /// Starts and stops the opacity cycle.
    Toggle,
    Increase,
    Decrease,
}

impl Hotkey {
    pub const ALL: [Hotkey; 3] = [Hotkey::Toggle, Hotkey::Increase, Hotkey::Decrease];

    /// Settings key, also used as the CLI action name.
    pub fn key(self) -> &'static str {
        match self {
            Hotkey::Toggle => "toggle-hotkey",
            Hotkey::Increase => "increase-window-opacity",
            Hotkey::Decrease => "decrease-window-opacity",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.key() == key)
    }
}

/// Error from turning CLI arguments into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    #[error("no action given")]
    Missing,
    #[error("unknown action: {0:?}")]
    UnknownAction(String),
    #[error("{action}: missing value")]
    MissingValue { action: &'static str },
    #[error("{action}: invalid value {value:?}")]
    InvalidValue { action: &'static str, value: String },
}

impl Command {
    /// Parse a client invocation such as `["cycle"]` or
    /// `["opacity-level", "40"]`.
    ///
    /// Action names are case-insensitive; `_` and `-` are interchangeable.
    /// Hotkey actions take the rest of the arguments joined by spaces, so
    /// `toggle-hotkey Ctrl + o` works unquoted and `toggle-hotkey ""`
    /// clears the hotkey.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Command, ParseCommandError> {
        let (action, rest) = args.split_first().ok_or(ParseCommandError::Missing)?;
        let action = action.as_ref().trim().to_lowercase().replace('_', "-");
        let value = rest.first().map(|v| v.as_ref().trim());

        match action.as_str() {
            "toggle" | "toggle-transparency" => Ok(Command::ToggleTransparency),
            "cycle" | "cycle-opacity" => Ok(Command::CycleOpacity),
            "increase" | "increase-opacity" => Ok(Command::IncreaseOpacity),
            "decrease" | "decrease-opacity" => Ok(Command::DecreaseOpacity),
            "quit" => Ok(Command::Quit),
            "opacity-level" => {
                let action = "opacity-level";
                let v = value.ok_or(ParseCommandError::MissingValue { action })?;
                v.parse::<u8>()
                    .ok()
                    .filter(|n| *n <= 100)
                    .map(Command::SetOpacityLevel)
                    .ok_or_else(|| ParseCommandError::InvalidValue {
                        action,
                        value: v.to_string(),
                    })
            }
            "cycle-rate" => {
                let action = "cycle-rate";
                let v = value.ok_or(ParseCommandError::MissingValue { action })?;
                v.parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .map(Command::SetCycleRate)
                    .ok_or_else(|| ParseCommandError::InvalidValue {
                        action,
                        value: v.to_string(),
                    })
            }
            "debug" | "debug-mode" => {
                let action = "debug";
                let v = value.ok_or(ParseCommandError::MissingValue { action })?;
                match v.to_lowercase().as_str() {
                    "on" | "true" | "1" => Ok(Command::SetDebugMode(true)),
                    "off" | "false" | "0" => Ok(Command::SetDebugMode(false)),
                    _ => Err(ParseCommandError::InvalidValue {
                        action,
                        value: v.to_string(),
                    }),
                }
            }
            other => match Hotkey::from_key(other) {
                Some(hotkey) => {
                    if rest.is_empty() {
                        return Err(ParseCommandError::MissingValue {
                            action: hotkey.key(),
                        });
                    }
                    let accelerator = rest
                        .iter()
                        .map(|a| a.as_ref())
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string();
                    Ok(Command::SetHotkey {
                        hotkey,
                        accelerator,
                    })
                }
                None => Err(ParseCommandError::UnknownAction(other.to_string())),
            },
        }
    }
}

/// Minimal information about the currently focused window.
///
/// This is the *opacity target*: the controller reads and writes opacity
/// through the window manager using this value as the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Window manager address / id.
    pub address: String,
    /// Human-readable title.
    pub title: String,
    /// Whether the window currently has a compositor surface.  An unmapped
    /// window cannot have its opacity changed.
    pub mapped: bool,
}
