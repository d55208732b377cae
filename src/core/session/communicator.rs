//! Command/response driver for one device session.
//!
//! The device shell has no request/response framing: no sequence numbers and
//! no end-of-reply marker. Two read strategies approximate it:
//!
//! - [`ReadMode::FixedDelay`] sleeps for the pacing delay before the write and
//!   again before a single read into a 1024-byte buffer. A reply that arrives
//!   after the read surfaces in the next command's response.
//! - [`ReadMode::Quiescent`] drops stale bytes before each write, then reads
//!   until the device goes idle, prints its prompt, or the deadline passes.

use crate::core::protocol::response::decode_ascii;
use crate::core::protocol::{Command, Response, ResponseKind, READ_BUFFER_SIZE};
use crate::core::session::observer::{ObserverId, ObserverRegistry};
use crate::core::session::state::{SessionState, SessionStatistics};
use crate::core::transport::Transport;
use crate::domain::config::{EndpointConfig, ReadMode};
use crate::domain::error::{ConfCtlError, ConfCtlResult};
use crate::infrastructure::tcp::TcpTransport;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, trace, warn};

struct Inner {
    state: SessionState,
    transport: Option<Box<dyn Transport>>,
    last_response: Option<Response>,
    statistics: SessionStatistics,
}

/// One session with a conferencing endpoint.
///
/// Methods take `&self`; share the communicator with `Arc` to issue commands
/// from several tasks. Commands are serialized: each one holds the session
/// for its whole write/read/notify cycle.
pub struct Communicator {
    id: String,
    endpoint: EndpointConfig,
    inner: Mutex<Inner>,
    observers: RwLock<ObserverRegistry>,
}

impl Communicator {
    /// Create an unopened session for the endpoint.
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            id: format!("session_{}", uuid::Uuid::new_v4().simple()),
            endpoint,
            inner: Mutex::new(Inner {
                state: SessionState::Unopened,
                transport: None,
                last_response: None,
                statistics: SessionStatistics::default(),
            }),
            observers: RwLock::new(ObserverRegistry::new()),
        }
    }

    /// Create a session and open it over TCP.
    pub async fn connect(endpoint: EndpointConfig) -> ConfCtlResult<Self> {
        let communicator = Self::new(endpoint);
        communicator.open().await?;
        Ok(communicator)
    }

    pub fn session_id(&self) -> &str {
        &self.id
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Most recent response published to observers.
    pub async fn last_response(&self) -> Option<Response> {
        self.inner.lock().await.last_response.clone()
    }

    pub async fn statistics(&self) -> SessionStatistics {
        self.inner.lock().await.statistics.clone()
    }

    pub async fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner
            .lock()
            .await
            .transport
            .as_ref()
            .and_then(|transport| transport.peer_addr())
    }

    /// Register a callback for every response, in registration order.
    pub async fn add_observer<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.observers.write().await.register(callback)
    }

    pub async fn remove_observer(&self, id: ObserverId) -> bool {
        self.observers.write().await.unregister(id)
    }

    /// Channel carrying every response, for callers that prefer to drain one.
    pub async fn subscribe(&self) -> broadcast::Receiver<Response> {
        self.observers.read().await.subscribe()
    }

    /// Connect over TCP and drain the greeting banner.
    pub async fn open(&self) -> ConfCtlResult<Response> {
        self.endpoint.validate()?;
        let mut inner = self.inner.lock().await;
        Self::check_openable(inner.state)?;

        let transport = TcpTransport::connect(&self.endpoint).await?;
        self.attach(&mut inner, Box::new(transport)).await
    }

    /// Open the session over an already connected transport.
    pub async fn open_with<T>(&self, transport: T) -> ConfCtlResult<Response>
    where
        T: Transport + 'static,
    {
        let mut inner = self.inner.lock().await;
        Self::check_openable(inner.state)?;
        self.attach(&mut inner, Box::new(transport)).await
    }

    fn check_openable(state: SessionState) -> ConfCtlResult<()> {
        match state {
            SessionState::Unopened => Ok(()),
            SessionState::Open => Err(ConfCtlError::session("Session is already open")),
            SessionState::Closed => Err(ConfCtlError::session(
                "Session is closed; create a new session to reconnect",
            )),
        }
    }

    async fn attach(
        &self,
        inner: &mut Inner,
        mut transport: Box<dyn Transport>,
    ) -> ConfCtlResult<Response> {
        // The session only becomes Open once the banner has been read
        let banner = match self.read_banner(transport.as_mut()).await {
            Ok(banner) => banner,
            Err(e) => {
                warn!(session = %self.id, "Failed to read banner: {}", e);
                if let Err(shutdown_err) = transport.shutdown().await {
                    warn!(session = %self.id, "Failed to shut down connection: {}", shutdown_err);
                }
                return Err(e);
            }
        };

        inner.state = SessionState::Open;
        inner.transport = Some(transport);
        info!(
            session = %self.id,
            "Opened session to {}:{}", self.endpoint.address, self.endpoint.port
        );

        inner.statistics.record_opened(banner.len());
        let response = Response::new(ResponseKind::Banner, &banner);
        debug!(session = %self.id, "Banner: {:?}", response.text());
        self.publish(inner, response.clone()).await;
        Ok(response)
    }

    async fn read_banner(&self, transport: &mut dyn Transport) -> ConfCtlResult<Vec<u8>> {
        match self.endpoint.read_mode {
            ReadMode::FixedDelay { .. } => {
                sleep(self.endpoint.pacing_delay()).await;
                read_once(transport, self.endpoint.read_mode.deadline()).await
            }
            ReadMode::Quiescent { idle_gap_ms, .. } => {
                read_until_quiescent(
                    transport,
                    Duration::from_millis(idle_gap_ms),
                    self.endpoint.read_mode.deadline(),
                    self.endpoint.prompt.as_deref(),
                )
                .await
            }
        }
    }

    /// Write a command and collect the device's response.
    pub async fn execute(&self, command: Command) -> ConfCtlResult<Response> {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_open() {
            return Err(ConfCtlError::NotConnected);
        }
        let wire = command.to_wire()?;
        let transport = inner
            .transport
            .as_mut()
            .ok_or(ConfCtlError::NotConnected)?;

        debug!(session = %self.id, command = %command, "Executing command");
        trace!(session = %self.id, wire = %hex::encode(&wire), "Command bytes");

        let (received, stale) = match self.endpoint.read_mode {
            ReadMode::FixedDelay { .. } => {
                sleep(self.endpoint.pacing_delay()).await;
                transport.write_all(&wire).await?;
                sleep(self.endpoint.pacing_delay()).await;
                let received =
                    read_once(transport.as_mut(), self.endpoint.read_mode.deadline()).await?;
                (received, 0)
            }
            ReadMode::Quiescent { idle_gap_ms, .. } => {
                let stale = drain_stale(transport.as_mut()).await?;
                if !stale.is_empty() {
                    warn!(
                        session = %self.id,
                        "Discarding {} late bytes before '{}': {:?}",
                        stale.len(),
                        command.keyword(),
                        decode_ascii(&stale)
                    );
                }
                transport.write_all(&wire).await?;
                let received = read_until_quiescent(
                    transport.as_mut(),
                    Duration::from_millis(idle_gap_ms),
                    self.endpoint.read_mode.deadline(),
                    self.endpoint.prompt.as_deref(),
                )
                .await?;
                (received, stale.len())
            }
        };

        if stale > 0 {
            inner.statistics.record_stale(stale);
        }
        inner.statistics.record_exchange(wire.len(), received.len());

        let response = Response::new(ResponseKind::Reply, &received);
        debug!(
            session = %self.id,
            "Response to '{}' ({} bytes)", command.keyword(), received.len()
        );
        self.publish(&mut inner, response.clone()).await;
        Ok(response)
    }

    /// Close the session. Closing an unopened or closed session does nothing.
    pub async fn close(&self) -> ConfCtlResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_open() {
            debug!(session = %self.id, "Close on {} session ignored", inner.state);
            return Ok(());
        }

        if let Some(mut transport) = inner.transport.take() {
            if let Err(e) = transport.shutdown().await {
                warn!(session = %self.id, "Failed to shut down connection: {}", e);
            }
        }
        inner.state = SessionState::Closed;
        info!(session = %self.id, "Closed session");

        self.publish(&mut inner, Response::terminated()).await;
        Ok(())
    }

    async fn publish(&self, inner: &mut Inner, response: Response) {
        self.observers.read().await.notify(&response);
        inner.last_response = Some(response);
    }
}

/// Single read bounded by `deadline`. Nothing read yields an empty buffer.
async fn read_once(transport: &mut dyn Transport, deadline: Duration) -> ConfCtlResult<Vec<u8>> {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    match timeout(deadline, transport.read(&mut buf)).await {
        Ok(Ok(n)) => Ok(buf[..n].to_vec()),
        Ok(Err(e)) => Err(e),
        Err(_) => {
            warn!("No response within {:?}", deadline);
            Ok(Vec::new())
        }
    }
}

/// Read until an idle gap, the prompt, end of stream, or the deadline.
async fn read_until_quiescent(
    transport: &mut dyn Transport,
    idle_gap: Duration,
    deadline: Duration,
    prompt: Option<&str>,
) -> ConfCtlResult<Vec<u8>> {
    let started = Instant::now();
    let mut collected = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        let remaining = deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        // Wait the whole deadline for the first byte, then only an idle gap
        let wait = if collected.is_empty() {
            remaining
        } else {
            idle_gap.min(remaining)
        };

        match timeout(wait, transport.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                collected.extend_from_slice(&buf[..n]);
                if ends_with_prompt(&collected, prompt) {
                    break;
                }
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => break,
        }
    }

    if collected.is_empty() {
        warn!("No response within {:?}", deadline);
    }
    Ok(collected)
}

/// Take whatever is already buffered without waiting.
async fn drain_stale(transport: &mut dyn Transport) -> ConfCtlResult<Vec<u8>> {
    let mut stale = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        match timeout(Duration::ZERO, transport.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => stale.extend_from_slice(&buf[..n]),
            Ok(Err(e)) => return Err(e),
            Err(_) => break,
        }
    }
    Ok(stale)
}

/// The prompt must be the exact tail of what was read, trailing space included.
fn ends_with_prompt(collected: &[u8], prompt: Option<&str>) -> bool {
    match prompt {
        Some(prompt) if !prompt.is_empty() => collected.ends_with(prompt.as_bytes()),
        _ => false,
    }
}
