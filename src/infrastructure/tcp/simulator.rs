//! Scripted stand-in for a conferencing endpoint's command shell.
//!
//! Sends a greeting banner, then reads newline-terminated command lines and
//! answers each one from a script of `(prefix, delay, text)` rules. Every
//! received line is recorded so tests can check exactly what went on the wire.

use crate::domain::config::EndpointConfig;
use crate::domain::error::{ConfCtlError, ConfCtlResult};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
struct ScriptedReply {
    prefix: String,
    delay: Duration,
    text: String,
}

/// How the simulated device answers.
#[derive(Debug, Clone, Default)]
pub struct DeviceScript {
    banner: Option<String>,
    replies: Vec<ScriptedReply>,
    fallback: Option<String>,
}

impl DeviceScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text sent as soon as a client connects.
    pub fn banner(mut self, text: impl Into<String>) -> Self {
        self.banner = Some(text.into());
        self
    }

    /// Answer lines starting with `prefix` immediately.
    pub fn reply(self, prefix: impl Into<String>, text: impl Into<String>) -> Self {
        self.reply_after(prefix, Duration::ZERO, text)
    }

    /// Answer lines starting with `prefix` after `delay`. Several rules for the
    /// same line are played in order, each after its own delay.
    pub fn reply_after(
        mut self,
        prefix: impl Into<String>,
        delay: Duration,
        text: impl Into<String>,
    ) -> Self {
        self.replies.push(ScriptedReply {
            prefix: prefix.into(),
            delay,
            text: text.into(),
        });
        self
    }

    /// Answer for lines no rule matches.
    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Serve one client over `stream` on a background task.
    pub fn spawn_on<S>(self, stream: S) -> SimulatedDevice
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);
        let handle = tokio::spawn(async move {
            if let Err(e) = self.serve(stream, log).await {
                error!("Simulated device failed: {}", e);
            }
        });
        SimulatedDevice { received, handle }
    }

    async fn serve<S>(&self, stream: S, received: Arc<Mutex<Vec<String>>>) -> ConfCtlResult<()>
    where
        S: AsyncRead + AsyncWrite,
    {
        let (reader, mut writer) = tokio::io::split(stream);

        if let Some(banner) = &self.banner {
            writer.write_all(banner.as_bytes()).await?;
            writer.flush().await?;
        }

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim_end_matches('\r').to_string();
            debug!("Simulated device received {:?}", line);
            received.lock().await.push(line.clone());

            let mut matched = false;
            for reply in self.replies.iter().filter(|r| line.starts_with(&r.prefix)) {
                matched = true;
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                writer.write_all(reply.text.as_bytes()).await?;
                writer.flush().await?;
            }

            if !matched {
                if let Some(fallback) = &self.fallback {
                    writer.write_all(fallback.as_bytes()).await?;
                    writer.flush().await?;
                }
            }
        }

        debug!("Simulated device client disconnected");
        Ok(())
    }
}

/// A device task serving one stream.
pub struct SimulatedDevice {
    received: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl SimulatedDevice {
    /// Command lines received so far, terminators stripped.
    pub async fn received_commands(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// TCP listener that serves the script to every client it accepts.
pub struct DeviceSimulator {
    bind_addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    server_handle: JoinHandle<()>,
}

impl DeviceSimulator {
    /// Listen on an ephemeral localhost port.
    pub async fn start(script: DeviceScript) -> ConfCtlResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| ConfCtlError::connection(format!("Failed to bind simulator: {}", e)))?;
        let bind_addr = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        info!("Device simulator listening on {}", bind_addr);

        let server_handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        info!("Simulator client connected: {}", addr);
                        let script = script.clone();
                        let log = Arc::clone(&log);
                        tokio::spawn(async move {
                            if let Err(e) = script.serve(stream, log).await {
                                error!("Error serving simulator client {}: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            bind_addr,
            received,
            server_handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Endpoint configuration pointing at this simulator.
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::new(self.bind_addr.ip().to_string()).with_port(self.bind_addr.port())
    }

    /// Command lines received from all clients, terminators stripped.
    pub async fn received_commands(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }

    /// Stop accepting clients.
    pub fn shutdown(&self) {
        self.server_handle.abort();
    }
}

impl Drop for DeviceSimulator {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}
