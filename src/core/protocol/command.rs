use crate::domain::error::{ConfCtlError, ConfCtlResult};
use std::fmt;

/// Line terminator appended to every command.
pub const LINE_TERMINATOR: &str = "\n";

/// Outbound command for the device command shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `dial addressbook "<entry>"`
    DialAddressBook(String),
    /// `dial auto <speed> "<address>"`
    DialAuto { speed_kbps: u32, address: String },
    /// `getcallstate`
    GetCallState,
    /// `hangup all`
    HangupAll,
    /// `reboot now`
    Reboot,
    /// Any other single-line API command, sent verbatim. Unlike dial
    /// arguments it may contain double quotes.
    Raw(String),
}

impl Command {
    /// Dial an entry that exists in the device's address book.
    pub fn dial_address_book(entry: impl Into<String>) -> Self {
        Command::DialAddressBook(entry.into())
    }

    /// Dial an IP address or hostname at the requested speed in kbps.
    pub fn dial_auto(speed_kbps: u32, address: impl Into<String>) -> Self {
        Command::DialAuto {
            speed_kbps,
            address: address.into(),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Command::Raw(text.into())
    }

    /// Leading keyword, used for logging.
    pub fn keyword(&self) -> &str {
        match self {
            Command::DialAddressBook(_) | Command::DialAuto { .. } => "dial",
            Command::GetCallState => "getcallstate",
            Command::HangupAll => "hangup",
            Command::Reboot => "reboot",
            Command::Raw(text) => text.split_whitespace().next().unwrap_or(""),
        }
    }

    /// Reject arguments that would break the single-line, double-quoted framing.
    pub fn validate(&self) -> ConfCtlResult<()> {
        match self {
            Command::DialAddressBook(entry) => check_quoted("address book entry", entry),
            Command::DialAuto { address, .. } => check_quoted("dial address", address),
            Command::Raw(text) => {
                if text.trim().is_empty() {
                    return Err(ConfCtlError::InvalidInput("empty command".to_string()));
                }
                check_single_line("command", text)
            }
            Command::GetCallState | Command::HangupAll | Command::Reboot => Ok(()),
        }
    }

    /// Command text without the terminator.
    pub fn text(&self) -> String {
        match self {
            Command::DialAddressBook(entry) => format!("dial addressbook \"{}\"", entry),
            Command::DialAuto {
                speed_kbps,
                address,
            } => format!("dial auto {} \"{}\"", speed_kbps, address),
            Command::GetCallState => "getcallstate".to_string(),
            Command::HangupAll => "hangup all".to_string(),
            Command::Reboot => "reboot now".to_string(),
            Command::Raw(text) => text.clone(),
        }
    }

    /// Validated wire bytes, terminated by exactly one newline.
    pub fn to_wire(&self) -> ConfCtlResult<Vec<u8>> {
        self.validate()?;
        let mut line = self.text();
        line.push_str(LINE_TERMINATOR);
        if !line.is_ascii() {
            return Err(ConfCtlError::InvalidInput(format!(
                "command is not ASCII: {}",
                line.trim_end()
            )));
        }
        Ok(line.into_bytes())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn check_quoted(what: &str, value: &str) -> ConfCtlResult<()> {
    if value.is_empty() {
        return Err(ConfCtlError::InvalidInput(format!("{} is empty", what)));
    }
    if value.contains('"') {
        return Err(ConfCtlError::InvalidInput(format!(
            "{} contains a double quote: {}",
            what, value
        )));
    }
    check_single_line(what, value)
}

fn check_single_line(what: &str, value: &str) -> ConfCtlResult<()> {
    if value.contains(['\r', '\n']) {
        return Err(ConfCtlError::InvalidInput(format!(
            "{} spans more than one line",
            what
        )));
    }
    Ok(())
}
