//! Shared utilities and error types

pub mod error;

pub use error::{BindError, ConfigError, NetworkError, RenderError, Result, SegueError};
