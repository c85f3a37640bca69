//! Relaydesk STOMP client
//!
//! A minimal STOMP 1.2 client over WebSocket, covering the subset of the
//! protocol the chat broker speaks: CONNECT/CONNECTED negotiation,
//! SUBSCRIBE with selectable ack mode, SEND, ACK, DISCONNECT, and inbound
//! MESSAGE/ERROR frames. One frame per WebSocket text message.

pub mod client;
pub mod frame;

pub use client::{connect, AckHandle, BrokerSession, InboundMessage, SessionEvent};
pub use frame::{AckMode, Command, Frame, FrameError};

use thiserror::Error;

/// Error type for STOMP client operations
#[derive(Debug, Error)]
pub enum StompError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("broker rejected connection: {0}")]
    ConnectRefused(String),

    #[error("timed out waiting for CONNECTED")]
    ConnectTimeout,

    #[error("connection closed")]
    Closed,
}

/// Result type for STOMP client operations
pub type StompResult<T> = Result<T, StompError>;
