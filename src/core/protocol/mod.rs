// Protocol module - Command vocabulary and response decoding
pub mod command;
pub mod response;

pub use command::Command;
pub use response::{Response, ResponseKind, CONNECTION_TERMINATED, READ_BUFFER_SIZE};
