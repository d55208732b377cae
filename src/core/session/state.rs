use std::fmt;
use std::time::SystemTime;

/// Session lifecycle: `Unopened -> Open -> Closed`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet connected
    Unopened,
    /// Connected, commands may be executed
    Open,
    /// Closed; a new session is needed to reconnect
    Closed,
}

impl SessionState {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unopened => write!(f, "Unopened"),
            SessionState::Open => write!(f, "Open"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatistics {
    /// Commands written to the device
    pub commands_sent: u64,
    /// Total bytes written
    pub bytes_sent: u64,
    /// Total bytes read, banner included
    pub bytes_received: u64,
    /// Reads that ended at the deadline with nothing received
    pub empty_responses: u64,
    /// Late bytes dropped before a write so they are not attributed to the next command
    pub stale_bytes_discarded: u64,
    /// When the session was opened
    pub opened_at: Option<SystemTime>,
    /// When the last command was written
    pub last_activity: Option<SystemTime>,
}

impl SessionStatistics {
    pub(crate) fn record_opened(&mut self, banner_len: usize) {
        let now = SystemTime::now();
        self.opened_at = Some(now);
        self.last_activity = Some(now);
        self.bytes_received += banner_len as u64;
    }

    pub(crate) fn record_exchange(&mut self, sent: usize, received: usize) {
        self.commands_sent += 1;
        self.bytes_sent += sent as u64;
        self.bytes_received += received as u64;
        if received == 0 {
            self.empty_responses += 1;
        }
        self.last_activity = Some(SystemTime::now());
    }

    pub(crate) fn record_stale(&mut self, discarded: usize) {
        self.stale_bytes_discarded += discarded as u64;
        self.bytes_received += discarded as u64;
    }
}
