use crate::core::transport::Transport;
use crate::domain::config::EndpointConfig;
use crate::domain::error::{ConfCtlError, ConfCtlResult};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

/// Transport over any async byte stream.
pub struct StreamTransport<S> {
    stream: S,
    peer_addr: Option<SocketAddr>,
}

/// Transport over a TCP connection to the device.
pub type TcpTransport = StreamTransport<TcpStream>;

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            peer_addr: None,
        }
    }
}

impl TcpTransport {
    /// Connect to the endpoint's command shell.
    pub async fn connect(endpoint: &EndpointConfig) -> ConfCtlResult<Self> {
        let host = endpoint.address.as_str();
        let port = endpoint.port;

        // Connect with timeout
        let stream = tokio::time::timeout(
            endpoint.connect_timeout(),
            TcpStream::connect((host, port)),
        )
        .await
        .map_err(|_| ConfCtlError::connection(format!("Connection timeout to {}:{}", host, port)))?
        .map_err(|e| ConfCtlError::connection(format!("Failed to connect to {}:{}: {}", host, port, e)))?;

        // Commands are short lines; don't let Nagle hold them back
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let peer_addr = stream.peer_addr().ok();
        info!("TCP connection established to {}:{}", host, port);

        Ok(Self { stream, peer_addr })
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> ConfCtlResult<()> {
        self.stream.write_all(data).await.map_err(|e| {
            error!("Failed to write to stream: {}", e);
            ConfCtlError::connection(format!("Write failed: {}", e))
        })?;
        self.stream.flush().await.map_err(|e| {
            error!("Failed to flush stream: {}", e);
            ConfCtlError::connection(format!("Flush failed: {}", e))
        })?;
        debug!("Sent {} bytes", data.len());
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> ConfCtlResult<usize> {
        let n = self.stream.read(buf).await.map_err(|e| {
            error!("Failed to read from stream: {}", e);
            ConfCtlError::connection(format!("Read failed: {}", e))
        })?;
        if n == 0 {
            info!("Connection closed by peer");
        } else {
            debug!("Received {} bytes", n);
        }
        Ok(n)
    }

    async fn shutdown(&mut self) -> ConfCtlResult<()> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| ConfCtlError::connection(format!("Shutdown failed: {}", e)))
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}
