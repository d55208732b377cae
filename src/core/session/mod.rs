// Session module - Device session lifecycle and command driver
pub mod communicator;
pub mod control;
pub mod observer;
pub mod state;

pub use communicator::Communicator;
pub use observer::{ObserverId, ObserverRegistry};
pub use state::{SessionState, SessionStatistics};
