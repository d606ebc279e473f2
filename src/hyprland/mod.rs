//! Hyprland-specific implementations.
//!
//! This module provides the concrete backend for the
//! [`WindowManager`](crate::traits::WindowManager) trait, powered by
//! Hyprland's IPC socket.
//!
//! Nothing outside this module talks to the Hyprland socket directly.

pub mod wm;
