use crate::domain::error::ConfCtlResult;
use async_trait::async_trait;
use std::net::SocketAddr;

/// Byte-level connection to a device command shell.
///
/// The communicator drives every command through this trait, so a session can
/// run over TCP or over any in-memory stream.
#[async_trait]
pub trait Transport: Send {
    /// Write the whole buffer and flush it.
    async fn write_all(&mut self, data: &[u8]) -> ConfCtlResult<()>;

    /// Read whatever is available into `buf`. Returns 0 when the peer has closed.
    async fn read(&mut self, buf: &mut [u8]) -> ConfCtlResult<usize>;

    /// Close the write side of the connection.
    async fn shutdown(&mut self) -> ConfCtlResult<()>;

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}
