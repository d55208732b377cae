// TCP module - Device shell connection and simulator
pub mod client;
pub mod simulator;

pub use client::{StreamTransport, TcpTransport};
pub use simulator::{DeviceScript, DeviceSimulator, SimulatedDevice};
