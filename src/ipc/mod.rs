//! Control socket.
//!
//! The daemon accepts newline-delimited JSON commands on a Unix socket.
//! Hotkeys, bar click handlers and scripts reach it through the `hyprfade`
//! client ([`client::send`]) or any tool that can write to the socket.

pub mod client;
pub mod listener;

/// Default socket path (`$XDG_RUNTIME_DIR/hyprfade.sock`).
pub fn default_socket_path() -> std::path::PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    std::path::PathBuf::from(runtime).join("hyprfade.sock")
}
