//! ConfCtl Library
//!
//! Remote-control client for video-conferencing endpoints that expose a
//! line-oriented command shell over TCP (port 24 by default). A
//! [`Communicator`] owns one session: it writes newline-terminated commands,
//! collects the device's free-form ASCII replies and publishes every reply to
//! registered observers.

pub mod core;
pub mod domain;
pub mod infrastructure;

pub use domain::error::{ConfCtlError, ConfCtlResult};
pub use domain::config::{ConfCtlConfig, EndpointConfig, ReadMode, DEFAULT_PORT};
pub use core::protocol::{Command, Response, ResponseKind, CONNECTION_TERMINATED};
pub use core::session::{Communicator, ObserverId, SessionState, SessionStatistics};
pub use core::transport::Transport;
pub use infrastructure::tcp::{DeviceScript, DeviceSimulator, StreamTransport, TcpTransport};
