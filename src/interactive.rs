use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ssh2::{Channel, PtyModes, PtyModeOpcode, Session};

use crate::error::Error;

const TERM: &str = "xterm-256color";
const PTY_COLS: u32 = 80;
const PTY_ROWS: u32 = 40;
/// Fixed baud-rate-equivalent speed for the PTY modes.
const PTY_SPEED: u32 = 14400;

/// How long the pump waits for a local key before checking the channel again.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Hand the local terminal to a remote interactive process until it exits.
///
/// Opens a channel on `session`, requests a fixed-geometry PTY, then either
/// execs `command` or starts a login shell, and pumps bytes between the
/// channel and the local terminal. The caller owns the hand-off discipline:
/// the UI loop must already have left the alternate screen and paused its
/// event thread, and resumes both only after this returns.
///
/// Dynamic resize is not supported; the remote side sees 80x40 regardless of
/// the local window.
pub fn run(session: &Session, command: Option<&str>) -> Result<(), Error> {
    let mut channel = session
        .channel_session()
        .map_err(|e| Error::session(format!("open channel: {e}")))?;

    let mut modes = PtyModes::new();
    modes.set_boolean(PtyModeOpcode::ECHO, true);
    modes.set_u32(PtyModeOpcode::TTY_OP_ISPEED, PTY_SPEED);
    modes.set_u32(PtyModeOpcode::TTY_OP_OSPEED, PTY_SPEED);
    channel
        .request_pty(TERM, Some(modes), Some((PTY_COLS, PTY_ROWS, 0, 0)))
        .map_err(|e| Error::session(format!("pty request: {e}")))?;

    match command {
        Some(cmd) => channel
            .exec(cmd)
            .map_err(|e| Error::session(format!("start '{cmd}': {e}")))?,
        None => channel
            .shell()
            .map_err(|e| Error::session(format!("start shell: {e}")))?,
    }

    enable_raw_mode().map_err(Error::session)?;
    session.set_blocking(false);
    let result = pump(&mut channel);
    session.set_blocking(true);
    let _ = disable_raw_mode();

    let _ = channel.close();
    let _ = channel.wait_close();
    result
}

/// Copy remote output to the local terminal and local keys to the remote,
/// until the remote process closes its end.
fn pump(channel: &mut Channel) -> Result<(), Error> {
    let mut stdout = io::stdout();
    let mut buf = [0u8; 8192];

    loop {
        // Remote -> local. With a PTY stderr is folded into the main stream,
        // but drain the stderr stream too in case the server splits them.
        drain(&mut channel.stream(0), &mut stdout, &mut buf)?;
        drain(&mut channel.stderr(), &mut stdout, &mut buf)?;
        stdout.flush().map_err(Error::session)?;

        if channel.eof() {
            return Ok(());
        }

        // Local -> remote.
        if event::poll(POLL_INTERVAL).map_err(Error::session)? {
            match event::read().map_err(Error::session)? {
                Event::Key(key) => {
                    if let Some(bytes) = encode_key(&key) {
                        write_nonblocking(channel, &bytes)?;
                    }
                }
                Event::Paste(text) => write_nonblocking(channel, text.as_bytes())?,
                // Fixed PTY geometry: local resizes are not forwarded.
                _ => {}
            }
        }
    }
}

fn drain(
    source: &mut impl Read,
    stdout: &mut impl Write,
    buf: &mut [u8],
) -> Result<(), Error> {
    loop {
        match source.read(buf) {
            Ok(0) => return Ok(()),
            Ok(n) => stdout.write_all(&buf[..n]).map_err(Error::session)?,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(Error::session(format!("read from remote: {e}"))),
        }
    }
}

fn write_nonblocking(channel: &mut Channel, mut bytes: &[u8]) -> Result<(), Error> {
    while !bytes.is_empty() {
        match channel.write(bytes) {
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => return Err(Error::session(format!("write to remote: {e}"))),
        }
    }
    Ok(())
}

/// Translate a crossterm key event into the byte sequence an xterm would
/// send for it. Returns `None` for key releases and keys with no terminal
/// representation.
pub fn encode_key(key: &KeyEvent) -> Option<Vec<u8>> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let mut bytes = match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                let lower = c.to_ascii_lowercase();
                if lower.is_ascii_lowercase() {
                    vec![(lower as u8) - b'a' + 1]
                } else if c == ' ' {
                    vec![0x00]
                } else {
                    c.to_string().into_bytes()
                }
            } else {
                c.to_string().into_bytes()
            }
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::F(n) => match n {
            1 => b"\x1bOP".to_vec(),
            2 => b"\x1bOQ".to_vec(),
            3 => b"\x1bOR".to_vec(),
            4 => b"\x1bOS".to_vec(),
            5 => b"\x1b[15~".to_vec(),
            6 => b"\x1b[17~".to_vec(),
            7 => b"\x1b[18~".to_vec(),
            8 => b"\x1b[19~".to_vec(),
            9 => b"\x1b[20~".to_vec(),
            10 => b"\x1b[21~".to_vec(),
            11 => b"\x1b[23~".to_vec(),
            12 => b"\x1b[24~".to_vec(),
            _ => return None,
        },
        _ => return None,
    };

    // Alt sends an ESC prefix ahead of the key itself.
    if key.modifiers.contains(KeyModifiers::ALT) && !matches!(key.code, KeyCode::Esc) {
        bytes.insert(0, 0x1b);
    }

    Some(bytes)
}
