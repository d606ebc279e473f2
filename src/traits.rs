//! Core traits that decouple hyprfade from any specific compositor,
//! timer mechanism, settings backend or transport.
//!
//! Every concrete backend (Hyprland, the event-loop scheduler, the JSON
//! settings file, a Unix-socket listener, a test harness, …) implements one
//! of these traits.  The [`OpacityController`](crate::controller::OpacityController)
//! only depends on these abstractions.

use crate::command::{Command, WindowInfo};
use crate::config::Config;
use crate::keybinding::HyprBind;
use std::sync::mpsc;
use std::time::Duration;

/// Abstraction over a window manager that knows which window is focused
/// and can change a window's opacity.
///
/// An implementation might talk to Hyprland via IPC, or it might be a
/// recording stub used in tests.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Return information about the currently focused window, or `None` if
    /// no window is focused.
    fn active_window(&self) -> Result<Option<WindowInfo>, Self::Error>;

    /// Current opacity of `window` on the `0..=255` scale.
    fn window_opacity(&self, window: &WindowInfo) -> Result<u8, Self::Error>;

    /// Set the opacity of `window` on the `0..=255` scale.
    fn set_window_opacity(&self, window: &WindowInfo, opacity: u8) -> Result<(), Self::Error>;

    /// Register a global keybinding with the compositor.
    fn register_keybinding(&self, bind: &HyprBind) -> Result<(), Self::Error>;

    /// Remove a keybinding previously added with
    /// [`register_keybinding`](WindowManager::register_keybinding).
    fn unregister_keybinding(&self, bind: &HyprBind) -> Result<(), Self::Error>;
}

//  Scheduler

/// Opaque handle to a repeating timer started by a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a scheduler-assigned id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The scheduler-assigned id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A repeating-timer primitive.
///
/// The scheduler does not run callbacks itself; whoever drives it delivers
/// each expiry to [`OpacityController::tick`](crate::controller::OpacityController::tick)
/// together with the handle that expired.
///
/// # Contract
///
/// * After [`stop`](Scheduler::stop) returns, the handle never expires again.
/// * Stopping an unknown or already stopped handle is a no-op.
pub trait Scheduler {
    /// Start a timer that expires every `interval`.
    fn start(&mut self, interval: Duration) -> TimerHandle;

    /// Cancel the timer identified by `handle`.
    fn stop(&mut self, handle: TimerHandle);
}

//  Settings

/// Persistent key/value settings.
///
/// Reads return a snapshot so callers always see the latest stored values;
/// writes replace the whole snapshot.
pub trait SettingsStore {
    /// The error type produced when persisting settings fails.
    type Error: std::error::Error + Send + 'static;

    /// The current settings.
    fn settings(&self) -> Config;

    /// Replace the stored settings.
    fn store(&mut self, settings: Config) -> Result<(), Self::Error>;
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, an in-memory
/// channel, …) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    //  Mock WindowManager

    /// A test double that records every opacity write.
    #[derive(Debug, Default)]
    struct MockWm {
        opacities: RefCell<HashMap<String, u8>>,
        writes: RefCell<Vec<(String, u8)>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    impl WindowManager for MockWm {
        type Error = MockError;

        fn active_window(&self) -> Result<Option<WindowInfo>, MockError> {
            Ok(Some(WindowInfo {
                address: "0xdead".into(),
                title: "mock".into(),
                mapped: true,
            }))
        }

        fn window_opacity(&self, window: &WindowInfo) -> Result<u8, MockError> {
            Ok(self
                .opacities
                .borrow()
                .get(&window.address)
                .copied()
                .unwrap_or(255))
        }

        fn set_window_opacity(&self, window: &WindowInfo, opacity: u8) -> Result<(), MockError> {
            self.opacities
                .borrow_mut()
                .insert(window.address.clone(), opacity);
            self.writes
                .borrow_mut()
                .push((window.address.clone(), opacity));
            Ok(())
        }

        fn register_keybinding(&self, _bind: &HyprBind) -> Result<(), MockError> {
            Err(MockError)
        }

        fn unregister_keybinding(&self, _bind: &HyprBind) -> Result<(), MockError> {
            Ok(())
        }
    }

    #[test]
    fn mock_wm_records_writes() {
        let wm = MockWm::default();
        let win = wm.active_window().unwrap().unwrap();
        assert_eq!(wm.window_opacity(&win).unwrap(), 255);
        wm.set_window_opacity(&win, 42).unwrap();
        assert_eq!(wm.window_opacity(&win).unwrap(), 42);
        assert_eq!(wm.writes.borrow()[0], ("0xdead".into(), 42));
    }

    //  Mock Scheduler

    #[derive(Debug, Default)]
    struct MockScheduler {
        next: u64,
        live: Vec<TimerHandle>,
    }

    impl Scheduler for MockScheduler {
        fn start(&mut self, _interval: Duration) -> TimerHandle {
            self.next += 1;
            let handle = TimerHandle::new(self.next);
            self.live.push(handle);
            handle
        }

        fn stop(&mut self, handle: TimerHandle) {
            self.live.retain(|h| *h != handle);
        }
    }

    #[test]
    fn mock_scheduler_hands_out_distinct_handles() {
        let mut s = MockScheduler::default();
        let a = s.start(Duration::from_millis(10));
        let b = s.start(Duration::from_millis(10));
        assert_ne!(a, b);
        s.stop(a);
        s.stop(a);
        assert_eq!(s.live, vec![b]);
    }

    //  Mock CommandSource

    /// A test double that emits a fixed sequence of commands.
    struct MockSource {
        commands: Vec<Command>,
    }

    impl CommandSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), MockError> {
            for cmd in self.commands.drain(..) {
                let _ = sink.send(cmd);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_commands() {
        let mut src = MockSource {
            commands: vec![Command::CycleOpacity, Command::SetOpacityLevel(20)],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], Command::CycleOpacity);
        assert_eq!(cmds[1], Command::SetOpacityLevel(20));
    }
}
