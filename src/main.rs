//! Entry point for **hyprfade**.
//!
//! Without arguments the binary runs the daemon: it loads the settings,
//! registers the hotkeys with Hyprland, spawns the socket listener on a
//! background thread and processes commands and fade ticks on the main
//! thread.
//!
//! With an action (`hyprfade toggle`, `hyprfade cycle`, …) it acts as a
//! client and forwards that command to the running daemon.

use hyprfade::command::Command;
use hyprfade::config::{self, FileSettings};
use hyprfade::controller::OpacityController;
use hyprfade::event_loop;
use hyprfade::hyprland::wm::HyprlandWm;
use hyprfade::ipc::{self, client, listener::UnixSocketListener};
use hyprfade::keybinding;
use hyprfade::logging;
use hyprfade::scheduler::LoopScheduler;
use hyprfade::traits::{CommandSource, SettingsStore};
use log::{error, info};
use std::sync::mpsc;

const USAGE: &str = "\
usage: hyprfade                      run the daemon
       hyprfade toggle               toggle transparency of the focused window
       hyprfade cycle                start/stop the opacity cycle
       hyprfade increase|decrease    nudge the focused window's opacity
       hyprfade opacity-level <0-100>
       hyprfade cycle-rate <ms>
       hyprfade debug <on|off>
       hyprfade toggle-hotkey|increase-window-opacity|decrease-window-opacity <accel>
       hyprfade quit";

//  Main

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return;
    }

    if args.is_empty() {
        run_daemon();
    } else {
        run_client(&args);
    }
}

/// Daemon mode.
fn run_daemon() {
    let settings = FileSettings::open(config::default_path());
    logging::init(settings.settings().debug_mode);
    info!("settings file: {}", settings.path().display());

    let mut controller = OpacityController::new(HyprlandWm::new(), LoopScheduler::new(), settings);
    controller.bind_hotkeys(client_command());

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx);

    // Hotkeys are removed by the controller's shutdown when the loop exits.
    event_loop::run(&mut controller, &cmd_rx);
    info!("hyprfade stopped");
}

/// Client mode: send one command to the daemon.
fn run_client(args: &[String]) {
    logging::init(false);

    let cmd = match Command::from_args(args) {
        Ok(cmd) => cmd,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let path = ipc::default_socket_path();
    if let Err(e) = client::send(&path, &cmd) {
        error!("failed to reach hyprfade at {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

//  Helpers

/// Command line hotkeys run to reach the daemon.
fn client_command() -> String {
    match std::env::current_exe() {
        Ok(path) => keybinding::client_exec(&path.display().to_string()),
        Err(_) => "hyprfade".into(),
    }
}

fn spawn_command_sources(tx: mpsc::Sender<Command>) {
    let path = ipc::default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
