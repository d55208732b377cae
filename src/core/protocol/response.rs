use std::fmt;
use std::time::SystemTime;

/// Size of the buffer used for a single socket read.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Text published to observers when a session is closed.
pub const CONNECTION_TERMINATED: &str = "Connection terminated";

/// Text read back from the device.
///
/// A response is whatever arrived inside the read window. It is not
/// guaranteed to be the complete reply to the command that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    text: String,
    kind: ResponseKind,
    received_at: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Greeting sent by the device right after connect.
    Banner,
    /// Data read after a command was written.
    Reply,
    /// Synthetic notification emitted on close.
    Terminated,
}

impl Response {
    pub fn new(kind: ResponseKind, bytes: &[u8]) -> Self {
        Self {
            text: decode_ascii(bytes),
            kind,
            received_at: SystemTime::now(),
        }
    }

    pub fn terminated() -> Self {
        Self::new(ResponseKind::Terminated, CONNECTION_TERMINATED.as_bytes())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.kind == ResponseKind::Terminated
    }

    /// Response lines with surrounding whitespace and blank lines removed.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|line| !line.is_empty())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Decode bytes as 7-bit ASCII. Anything above 0x7F becomes `?`.
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}
