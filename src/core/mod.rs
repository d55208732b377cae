// Core module - Command protocol driver
pub mod protocol;
pub mod session;
pub mod transport;

pub use protocol::{Command, Response, ResponseKind};
pub use session::{Communicator, SessionState};
pub use transport::Transport;
