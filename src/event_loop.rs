//! Single-threaded event loop.
//!
//! Commands arrive over an [`mpsc`] channel from the command-source
//! threads.  Between commands the loop sleeps until the next
//! [`LoopScheduler`] deadline and delivers expired timers to
//! [`OpacityController::tick`].  Commands and ticks are therefore handled
//! strictly one after another on the calling thread.

use crate::command::Command;
use crate::controller::OpacityController;
use crate::scheduler::LoopScheduler;
use crate::traits::{SettingsStore, WindowManager};
use log::{debug, error, info};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;

/// Run until every command sender is dropped or a [`Command::Quit`]
/// arrives, then shut the controller down.
pub fn run<W, C>(
    controller: &mut OpacityController<W, LoopScheduler, C>,
    cmd_rx: &mpsc::Receiver<Command>,
) where
    W: WindowManager,
    C: SettingsStore,
{
    info!("hyprfade running");
    loop {
        let next = match controller.scheduler().next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                cmd_rx.recv_timeout(wait)
            }
            None => cmd_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match next {
            Ok(Command::Quit) => {
                info!("quit requested");
                break;
            }
            Ok(cmd) => {
                debug!("command: {:?}", cmd);
                if let Err(e) = controller.handle(cmd) {
                    error!("command error: {}", e);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("all command sources closed, exiting");
                break;
            }
        }

        let due = controller.scheduler_mut().take_due(Instant::now());
        for handle in due {
            if let Err(e) = controller.tick(handle) {
                error!("cycle tick error: {}", e);
            }
        }
    }
    controller.shutdown();
}
