//! Client side of the control socket, used by `hyprfade <action>`.

use super::listener::UnixSocketError;
use crate::command::Command;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::Path;

/// Send one command to the daemon listening on `path`.
pub fn send(path: &Path, command: &Command) -> Result<(), UnixSocketError> {
    let mut line = serde_json::to_string(command)?;
    line.push('\n');

    let mut stream = UnixStream::connect(path)?;
    stream.write_all(line.as_bytes())?;
    stream.shutdown(std::net::Shutdown::Write)?;
    Ok(())
}
