//! [`WindowManager`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`,
//! avoiding any shell command invocation or third-party crate for socket
//! discovery.
//!
//! Opacity is applied with `setprop address:<addr> alpha <0..1> lock` (and
//! the same for `alphainactive`, so the window keeps its opacity when it
//! loses focus).  Hyprland does not report a window's effective alpha, so
//! [`HyprlandWm`] remembers the values it has written; a window it has not
//! touched reads as fully opaque.

use crate::command::WindowInfo;
use crate::keybinding::HyprBind;
use crate::traits::WindowManager;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Hyprland-backed window manager.
///
/// All communication happens over Hyprland's IPC socket
/// (`$XDG_RUNTIME_DIR/hypr/<instance>/.socket.sock`).  No child processes
/// are spawned.
#[derive(Default)]
pub struct HyprlandWm {
    /// Last opacity written per window address.
    opacities: RefCell<HashMap<String, u8>>,
}

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandWmError(String);

impl HyprlandWm {
    /// Create a new handle.
    ///
    /// No connection is opened eagerly; each method call opens a short-lived
    /// IPC request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the opacity cache after a write to `address`.
    ///
    /// `written` is `None` when the write failed; the window has most likely
    /// closed, so its entry is dropped.  Fully opaque windows are not kept
    /// either, since an unknown window already reads as 255.
    fn record(&self, address: &str, written: Option<u8>) {
        let mut opacities = self.opacities.borrow_mut();
        match written {
            Some(opacity) if opacity < u8::MAX => {
                opacities.insert(address.to_string(), opacity);
            }
            _ => {
                opacities.remove(address);
            }
        }
    }
}

//  Direct Hyprland IPC helpers

/// Resolve the Hyprland command socket path.
///
/// Hyprland ≥ 0.40 stores its sockets at
/// `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
fn socket_path() -> Result<PathBuf, HyprlandWmError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandWmError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandWmError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!(
        "{}/hypr/{}/.socket.sock",
        runtime_dir, his
    )))
}

/// Send a raw command to the Hyprland command socket and return the
/// response as a string.
fn ipc_request(command: &str) -> Result<String, HyprlandWmError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandWmError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandWmError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandWmError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandWmError(format!("utf-8: {}", e)))
}

/// Send a command that answers `"ok"` on success.
fn ipc_ok(command: &str) -> Result<(), HyprlandWmError> {
    let response = ipc_request(command)?;
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandWmError(format!("{}: {}", command, response.trim())))
    }
}

/// `setprop` value for an opacity on the `0..=255` scale.
fn alpha(opacity: u8) -> String {
    format!("{:.4}", opacity as f64 / 255.0)
}

//  Minimal serde structs for the JSON we care about

/// Subset of the JSON object returned by `j/activewindow`.
#[derive(Deserialize)]
struct ActiveWindowJson {
    address: String,
    title: String,
    #[serde(default = "mapped_default")]
    mapped: bool,
}

fn mapped_default() -> bool {
    true
}

/// Parse the `j/activewindow` reply.
///
/// Hyprland returns an empty object `{}` when no window is focused.
fn parse_active_window(json: &str) -> Result<Option<WindowInfo>, HyprlandWmError> {
    if json.trim() == "{}" || json.trim().is_empty() {
        return Ok(None);
    }
    let w: ActiveWindowJson =
        serde_json::from_str(json).map_err(|e| HyprlandWmError(format!("parse: {}", e)))?;
    Ok(Some(WindowInfo {
        mapped: w.mapped && !w.address.is_empty(),
        address: w.address,
        title: w.title,
    }))
}

//  WindowManager implementation

impl WindowManager for HyprlandWm {
    type Error = HyprlandWmError;

    fn active_window(&self) -> Result<Option<WindowInfo>, Self::Error> {
        parse_active_window(&ipc_request("j/activewindow")?)
    }

    fn window_opacity(&self, window: &WindowInfo) -> Result<u8, Self::Error> {
        Ok(self
            .opacities
            .borrow()
            .get(&window.address)
            .copied()
            .unwrap_or(u8::MAX))
    }

    fn set_window_opacity(&self, window: &WindowInfo, opacity: u8) -> Result<(), Self::Error> {
        let value = alpha(opacity);
        let result = ipc_ok(&format!("/setprop address:{} alpha {} lock", window.address, value))
            .and_then(|()| {
                ipc_ok(&format!(
                    "/setprop address:{} alphainactive {} lock",
                    window.address, value
                ))
            });
        self.record(&window.address, result.as_ref().ok().map(|_| opacity));
        result
    }

    fn register_keybinding(&self, bind: &HyprBind) -> Result<(), Self::Error> {
        ipc_ok(&format!("/keyword {}", bind.bind_args()))
    }

    fn unregister_keybinding(&self, bind: &HyprBind) -> Result<(), Self::Error> {
        ipc_ok(&format!("/keyword {}", bind.unbind_args()))
    }
}
