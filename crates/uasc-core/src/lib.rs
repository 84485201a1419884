pub mod config;
pub mod error;
pub mod types;

pub use error::{UascError, UascResult};
pub use types::{ChannelRole, MessageSecurityMode};
