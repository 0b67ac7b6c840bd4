pub mod args;
pub mod config;
pub mod env_info;
pub mod error;
pub mod fetch;
pub mod install;
pub mod log;
pub mod manifest;
pub mod materialize;
pub mod runner;
pub mod scaffold;
pub mod validate;

pub use config::{Invocation, Mode, Settings};
pub use error::Rejection;
pub use runner::{Runner, SystemRunner, ToolCall};
