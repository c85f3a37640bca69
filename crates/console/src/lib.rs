//! Relaydesk Agent Console Library
//!
//! This crate contains the live-agent chat session coordinator and the
//! REST clients for the tenant, chat, and AI collaborator services.

pub mod clients;
pub mod config;
pub mod session;

pub use config::Config;
