//! **hyprfade**: toggle or cycle the opacity of the focused window.
//!
//! A click (via `hyprfade toggle`) makes the focused window transparent at
//! the configured `opacity-level` and a second click restores it.  A hotkey
//! starts a ping-pong fade that keeps running until the hotkey is pressed
//! again, and two more hotkeys nudge the opacity up or down.
//!
//! # Architecture
//!
//! The crate is organised around a few core traits:
//!
//! * [`traits::WindowManager`]: focus lookup, opacity reads/writes and
//!   keybinding registration, so the state machine is not coupled to any
//!   specific compositor.
//! * [`traits::Scheduler`]: the repeating timer behind the fade.
//! * [`traits::SettingsStore`]: where `opacity-level`, `cycle-rate` and
//!   friends are read from and written to.
//! * [`traits::CommandSource`]: the transport that delivers user intent.
//!
//! [`controller::OpacityController`] is the state machine itself.  Concrete
//! implementations live in [`hyprland`] (Hyprland IPC), [`scheduler`]
//! (deadline queue for [`event_loop`]), [`config`] (JSON settings file) and
//! [`ipc`] (Unix-socket listener and client).

pub mod command;
pub mod config;
pub mod controller;
pub mod event_loop;
pub mod hyprland;
pub mod ipc;
pub mod keybinding;
pub mod logging;
pub mod scheduler;
pub mod traits;
pub mod wave;
