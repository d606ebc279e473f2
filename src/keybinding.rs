//! Global hotkeys.
//!
//! Hotkeys are configured as accelerator strings, either GTK style
//! (`<Super><Alt>t`) or plus style (`Super+Alt+T`).  [`Accelerator::parse`]
//! turns them into the `MODS, key` pair Hyprland expects, and
//! [`ShellBinding`] registers one bind per configured hotkey that runs the
//! `hyprfade` client with the matching action.
//!
//! | Setting                   | Action     | Hyprland bind flavour         |
//! |---------------------------|------------|-------------------------------|
//! | `toggle-hotkey`           | `cycle`    | `bindr` (on release, once)    |
//! | `increase-window-opacity` | `increase` | `binde` (repeats while held)  |
//! | `decrease-window-opacity` | `decrease` | `binde` (repeats while held)  |

use crate::command::{Command, Hotkey};
use crate::config::Config;
use crate::traits::WindowManager;
use log::{debug, info, warn};
use std::fmt;

/// Error from parsing an accelerator string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeybindingError {
    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),
    #[error("accelerator {0:?} has no key")]
    MissingKey(String),
    #[error("unterminated modifier in {0:?}")]
    Unterminated(String),
}

/// Keyboard modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Super,
    Ctrl,
    Alt,
    Shift,
}

impl Modifier {
    fn parse(name: &str) -> Result<Self, KeybindingError> {
        match name.trim().to_lowercase().as_str() {
            "super" | "meta" | "logo" | "mod4" | "win" => Ok(Modifier::Super),
            "ctrl" | "control" | "primary" => Ok(Modifier::Ctrl),
            "alt" | "mod1" => Ok(Modifier::Alt),
            "shift" => Ok(Modifier::Shift),
            _ => Err(KeybindingError::UnknownModifier(name.to_string())),
        }
    }

    fn hyprland_name(self) -> &'static str {
        match self {
            Modifier::Super => "SUPER",
            Modifier::Ctrl => "CTRL",
            Modifier::Alt => "ALT",
            Modifier::Shift => "SHIFT",
        }
    }
}

/// A parsed hotkey: a set of modifiers plus one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accelerator {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl Accelerator {
    /// Parse an accelerator string.
    ///
    /// Returns `Ok(None)` for an empty string, which means "no binding".
    pub fn parse(text: &str) -> Result<Option<Self>, KeybindingError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let mut modifiers = Vec::new();
        let key = if text.starts_with('<') {
            let mut rest = text;
            while let Some(stripped) = rest.strip_prefix('<') {
                let end = stripped
                    .find('>')
                    .ok_or_else(|| KeybindingError::Unterminated(text.to_string()))?;
                modifiers.push(Modifier::parse(&stripped[..end])?);
                rest = &stripped[end + 1..];
            }
            rest.trim().to_string()
        } else {
            let mut parts: Vec<&str> = text.split('+').map(str::trim).collect();
            let key = parts.pop().unwrap_or_default().to_string();
            for part in parts {
                modifiers.push(Modifier::parse(part)?);
            }
            key
        };

        if key.is_empty() {
            return Err(KeybindingError::MissingKey(text.to_string()));
        }

        modifiers.sort();
        modifiers.dedup();
        Ok(Some(Self { modifiers, key }))
    }

    /// Modifier list in Hyprland's space-separated form, e.g. `"SUPER ALT"`.
    pub fn hyprland_mods(&self) -> String {
        self.modifiers
            .iter()
            .map(|m| m.hyprland_name())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Bind flavour, mapped to Hyprland's `bind` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    /// Fire once when the key is released.
    OnRelease,
    /// Fire on press and keep firing while held.
    Repeat,
}

impl BindKind {
    fn keyword(self) -> &'static str {
        match self {
            BindKind::OnRelease => "bindr",
            BindKind::Repeat => "binde",
        }
    }
}

/// A compositor keybinding that runs a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyprBind {
    pub accelerator: Accelerator,
    pub kind: BindKind,
    /// Shell command executed when the bind fires.
    pub exec: String,
}

impl HyprBind {
    /// Arguments for `keyword bind…`, e.g. `bindr SUPER ALT,t,exec,hyprfade cycle`.
    pub fn bind_args(&self) -> String {
        format!(
            "{} {},{},exec,{}",
            self.kind.keyword(),
            self.accelerator.hyprland_mods(),
            self.accelerator.key,
            self.exec
        )
    }

    /// Arguments for `keyword unbind…`, e.g. `unbind SUPER ALT,t`.
    pub fn unbind_args(&self) -> String {
        format!(
            "unbind {},{}",
            self.accelerator.hyprland_mods(),
            self.accelerator.key
        )
    }
}

impl fmt::Display for HyprBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bind_args())
    }
}

/// Action and bind flavour behind each hotkey.
fn action_for(hotkey: Hotkey) -> (Command, BindKind) {
    match hotkey {
        Hotkey::Toggle => (Command::CycleOpacity, BindKind::OnRelease),
        Hotkey::Increase => (Command::IncreaseOpacity, BindKind::Repeat),
        Hotkey::Decrease => (Command::DecreaseOpacity, BindKind::Repeat),
    }
}

/// Build the binds for the hotkeys configured in `config`.
///
/// `client` is the command line that invokes the hyprfade client (see
/// [`client_exec`]).  Hotkeys that fail to parse are logged and skipped.
pub fn binds_for(config: &Config, client: &str) -> Vec<HyprBind> {
    let mut binds = Vec::new();
    for hotkey in Hotkey::ALL {
        let (command, kind) = action_for(hotkey);
        match Accelerator::parse(config.hotkey(hotkey)) {
            Ok(Some(accelerator)) => binds.push(HyprBind {
                accelerator,
                kind,
                exec: format!("{} {}", client, command),
            }),
            Ok(None) => debug!("{} is empty, not binding", hotkey.key()),
            Err(e) => warn!("{}: {}", hotkey.key(), e),
        }
    }
    binds
}

/// Shell word that runs the client at `path` from an `exec` bind.
///
/// Paths with characters outside `[A-Za-z0-9/._+-]` are single-quoted.
/// Hyprland splits bind arguments on commas, so a path containing one
/// falls back to `hyprfade` on `$PATH`.
pub fn client_exec(path: &str) -> String {
    if path.is_empty() || path.contains(',') || path.contains('\n') {
        warn!("cannot bind {:?} as the client, using hyprfade from PATH", path);
        return "hyprfade".into();
    }
    let plain = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._+-".contains(c));
    if plain {
        path.to_string()
    } else {
        format!("'{}'", path.replace('\'', r"'\''"))
    }
}

/// Keybindings registered with the compositor on behalf of the daemon.
///
/// Registration failures are logged and skipped; the daemon keeps running
/// without that hotkey.
#[derive(Debug, Default)]
pub struct ShellBinding {
    registered: Vec<HyprBind>,
}

impl ShellBinding {
    /// Register every bind in `binds`, remembering the ones that succeeded.
    pub fn register<W: WindowManager>(wm: &W, binds: Vec<HyprBind>) -> Self {
        let mut registered = Vec::new();
        for bind in binds {
            match wm.register_keybinding(&bind) {
                Ok(()) => {
                    info!("registered keybinding: {}", bind);
                    registered.push(bind);
                }
                Err(e) => warn!("failed to register keybinding {}: {}", bind, e),
            }
        }
        Self { registered }
    }

    /// Binds that were registered successfully.
    pub fn registered(&self) -> &[HyprBind] {
        &self.registered
    }

    /// Remove every registered bind from the compositor.
    pub fn unregister_all<W: WindowManager>(&mut self, wm: &W) {
        for bind in self.registered.drain(..) {
            if let Err(e) = wm.unregister_keybinding(&bind) {
                warn!("failed to remove keybinding {}: {}", bind, e);
            }
        }
    }
}
