use std::io::Read;

use ssh2::{Channel, Session};

use crate::error::Error;

/// Run one non-interactive command over a fresh channel and return its
/// standard output.
///
/// The channel is always closed, success or not. A channel that cannot be
/// opened is a `Channel` error; a command that exits non-zero (or a channel
/// that breaks mid-transfer) is a `Command` error carrying the remote detail.
pub fn run(session: &Session, command: &str) -> Result<String, Error> {
    let mut channel = session.channel_session().map_err(Error::Channel)?;
    let collected = collect_output(&mut channel, command);
    let _ = channel.close();
    let _ = channel.wait_close();

    let (stdout, stderr) = collected?;
    let status = channel
        .exit_status()
        .map_err(|e| Error::Command(format!("'{command}': {e}")))?;
    if status != 0 {
        let detail = if stderr.trim().is_empty() {
            format!("'{command}' exited with status {status}")
        } else {
            format!("'{command}' exited with status {status}: {}", stderr.trim())
        };
        return Err(Error::Command(detail));
    }
    Ok(stdout)
}

fn collect_output(channel: &mut Channel, command: &str) -> Result<(String, String), Error> {
    channel.exec(command).map_err(Error::Channel)?;

    let mut stdout = String::new();
    channel
        .read_to_string(&mut stdout)
        .map_err(|e| Error::Command(format!("'{command}': channel broke mid-transfer: {e}")))?;

    // Best-effort: stderr only feeds the failure message.
    let mut stderr = String::new();
    let _ = channel.stderr().read_to_string(&mut stderr);

    Ok((stdout, stderr))
}
