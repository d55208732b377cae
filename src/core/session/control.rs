use crate::core::protocol::{Command, Response};
use crate::core::session::communicator::Communicator;
use crate::domain::error::ConfCtlResult;

/// Call control commands.
impl Communicator {
    /// Dial an address book entry. The name must match an entry on the device.
    pub async fn dial_address_book(&self, entry: &str) -> ConfCtlResult<Response> {
        self.execute(Command::dial_address_book(entry)).await
    }

    /// Dial an IP address or hostname at `speed_kbps`.
    pub async fn dial_address(&self, speed_kbps: u32, address: &str) -> ConfCtlResult<Response> {
        self.execute(Command::dial_auto(speed_kbps, address)).await
    }

    pub async fn get_call_state(&self) -> ConfCtlResult<Response> {
        self.execute(Command::GetCallState).await
    }

    /// Disconnect all calls.
    pub async fn hangup_all(&self) -> ConfCtlResult<Response> {
        self.execute(Command::HangupAll).await
    }

    pub async fn reboot(&self) -> ConfCtlResult<Response> {
        self.execute(Command::Reboot).await
    }

    /// Send any other single-line command from the device API.
    pub async fn send_command(&self, text: &str) -> ConfCtlResult<Response> {
        self.execute(Command::raw(text)).await
    }
}
