//! Error taxonomy shared by the engine, the controller and the binary.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity, DNS or TLS failure while talking to the monitoring port.
    #[error("could not get stats from server: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("stats request failed {status}: {body:?}")]
    Protocol { status: u16, body: String },

    /// The response body was not the JSON we expected.
    #[error("could not decode stats json: {0}")]
    Decode(#[from] serde_json::Error),

    /// Unrecognized sort key or unparsable limit.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or malformed connection target, TLS material, profile.
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // Keep the full source chain; reqwest's top-level message is often just "error sending request".
        let mut msg = e.to_string();
        let mut src = std::error::Error::source(&e);
        while let Some(s) = src {
            msg.push_str(": ");
            msg.push_str(&s.to_string());
            src = s.source();
        }
        Error::Transport(msg)
    }
}
