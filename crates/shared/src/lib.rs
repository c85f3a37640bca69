//! Relaydesk Shared Types and Utilities
//!
//! This crate contains the wire payloads and error taxonomy shared across
//! the Relaydesk platform.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
