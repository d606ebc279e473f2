//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! "ToggleTransparency"
//! "CycleOpacity"
//! "IncreaseOpacity"
//! {"SetOpacityLevel":40}
//! {"SetDebugMode":true}
//! ```

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited JSON
/// commands.  When the connection closes, the listener waits for the
/// next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener and client.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the connection loop should do after a client disconnects.
enum Next {
    Accept,
    Shutdown,
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called
    /// and removed once the daemon stops consuming commands.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forward every command on one connection.
    fn serve(stream: UnixStream, sink: &mpsc::Sender<Command>) -> Next {
        for line in BufReader::new(stream).lines() {
            let text = match line {
                Ok(text) => text,
                Err(e) => {
                    error!("read error: {}", e);
                    return Next::Accept;
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Command>(&text) {
                Ok(cmd) => {
                    debug!("received {:?}", cmd);
                    let quit = cmd == Command::Quit;
                    if sink.send(cmd).is_err() || quit {
                        return Next::Shutdown;
                    }
                }
                Err(e) => error!("bad command: {}: {}", text, e),
            }
        }
        Next::Accept
    }
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the receiving side hangs up or a
    /// [`Command::Quit`] is forwarded.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    if let Next::Shutdown = Self::serve(stream, &sink) {
                        info!("command sink closed, shutting down listener");
                        break;
                    }
                    debug!("client disconnected");
                }
                Err(e) => error!("accept error: {}", e),
            }
        }

        let _ = std::fs::remove_file(&self.path);
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::client;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// Helper: create a unique temporary socket path for each test.
    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "hyprfade-test-{}-{}.sock",
            std::process::id(),
            id
        ))
    }

    fn spawn_listener(path: &Path) -> (mpsc::Receiver<Command>, std::thread::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        let handle = std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&path);
            let _ = listener.run(tx);
        });
        // Give the listener a moment to bind.
        std::thread::sleep(Duration::from_millis(150));
        (rx, handle)
    }

    #[test]
    fn commands_arrive_in_order() {
        let path = tmp_socket_path();
        let (rx, _handle) = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#""CycleOpacity""#).unwrap();
            writeln!(stream, r#"{{"SetOpacityLevel":40}}"#).unwrap();
            writeln!(stream).unwrap();
            writeln!(stream, r#""DecreaseOpacity""#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(
            cmds,
            vec![
                Command::CycleOpacity,
                Command::SetOpacityLevel(40),
                Command::DecreaseOpacity,
            ]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_json_does_not_crash() {
        let path = tmp_socket_path();
        let (rx, _handle) = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "not json at all").unwrap();
            writeln!(stream, r#""Fade""#).unwrap();
            writeln!(stream, r#""ToggleTransparency""#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let cmds: Vec<Command> = rx.try_iter().collect();
        // Only the valid command should have arrived.
        assert_eq!(cmds, vec![Command::ToggleTransparency]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn client_commands_reach_listener() {
        let path = tmp_socket_path();
        let (rx, _handle) = spawn_listener(&path);

        client::send(&path, &Command::IncreaseOpacity).unwrap();
        client::send(&path, &Command::SetDebugMode(true)).unwrap();

        std::thread::sleep(Duration::from_millis(150));
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds, vec![Command::IncreaseOpacity, Command::SetDebugMode(true)]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn quit_stops_listener_and_removes_socket() {
        let path = tmp_socket_path();
        let (rx, handle) = spawn_listener(&path);

        client::send(&path, &Command::Quit).unwrap();
        handle.join().unwrap();

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Command::Quit]);
        assert!(!path.exists());
    }
}
