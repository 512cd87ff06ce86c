//! Shared types, config, and error definitions for the weather gateway.

pub mod config;
pub mod error;
pub mod types;

pub use config::GatewayConfig;
pub use error::{BadRequestReason, GatewayError};
pub use types::*;
