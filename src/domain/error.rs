use thiserror::Error;

/// ConfCtl unified error type
#[derive(Error, Debug)]
pub enum ConfCtlError {
    /// TCP connect, read or write failure. Never retried.
    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Device not connected")]
    NotConnected,

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfCtlError {
    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub(crate) fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for failures of the underlying socket.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Io(_))
    }
}

pub type ConfCtlResult<T> = Result<T, ConfCtlError>;
