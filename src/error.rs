use thiserror::Error;

/// Everything that can go wrong between the operator and a remote shell.
///
/// Each variant maps to one failure domain: the host list on disk, the
/// transport dial, a channel on a live connection, a remote command that ran
/// but failed, and the interactive PTY session. The connection manager and
/// the command runner return these without retrying; whatever reaches the
/// state machine puts it into `Failed` and gets rendered verbatim.
#[derive(Debug, Error)]
pub enum Error {
    /// Host list is missing, malformed, or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// Transport could not be established (resolve, TCP, handshake, auth).
    #[error("could not connect to {addr}: {reason}")]
    Dial { addr: String, reason: String },

    /// A channel could not be opened on an otherwise-live connection.
    #[error("could not open channel: {0}")]
    Channel(#[source] ssh2::Error),

    /// The remote command ran but exited non-zero, or the channel broke
    /// mid-transfer.
    #[error("remote command failed: {0}")]
    Command(String),

    /// PTY request or interactive process start/run failure.
    #[error("interactive session failed: {0}")]
    Session(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn dial(addr: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Dial {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }

    pub fn session(msg: impl std::fmt::Display) -> Self {
        Error::Session(msg.to_string())
    }
}
