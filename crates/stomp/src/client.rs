//! Async STOMP client over WebSocket
//!
//! `connect` performs the WebSocket handshake and STOMP CONNECT/CONNECTED
//! negotiation, then bridges the socket with a writer task (outbound frame
//! channel -> sink) and a reader task (stream -> typed `SessionEvent`s).
//! The caller owns the event receiver; when it yields `Closed` the
//! transport is gone and a new session must be established.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use uuid::Uuid;

use crate::frame::{AckMode, Command, Frame};
use crate::{StompError, StompResult};

/// Timeout for the CONNECT/CONNECTED exchange
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Inbound event delivered to the session consumer
#[derive(Debug)]
pub enum SessionEvent {
    /// A MESSAGE frame from one of our subscriptions
    Message(InboundMessage),
    /// Broker-reported ERROR frame; the connection stays nominally active
    ProtocolError { message: String, body: String },
    /// Transport closed; no further events will arrive
    Closed,
}

/// A MESSAGE frame, decoded to its delivery envelope
#[derive(Debug)]
pub struct InboundMessage {
    pub destination: String,
    pub subscription: String,
    pub body: String,
    /// Present only for subscriptions in a manual ack mode
    pub ack: Option<AckHandle>,
}

/// Handle for acknowledging one delivered message.
///
/// Acking consumes the handle; a handle whose transport has gone away
/// reports `StompError::Closed`.
#[derive(Debug)]
pub struct AckHandle {
    ack_id: String,
    outbound: mpsc::UnboundedSender<Frame>,
}

impl AckHandle {
    pub fn new(ack_id: impl Into<String>, outbound: mpsc::UnboundedSender<Frame>) -> Self {
        Self {
            ack_id: ack_id.into(),
            outbound,
        }
    }

    pub fn ack_id(&self) -> &str {
        &self.ack_id
    }

    /// Send the ACK frame for this delivery
    pub fn ack(self) -> StompResult<()> {
        self.outbound
            .send(Frame::ack(&self.ack_id))
            .map_err(|_| StompError::Closed)
    }
}

/// An established broker session
#[derive(Debug)]
pub struct BrokerSession {
    outbound: mpsc::UnboundedSender<Frame>,
    next_subscription: u64,
}

impl BrokerSession {
    /// Clone of the outbound frame channel, for queuing layers above
    pub fn sender(&self) -> mpsc::UnboundedSender<Frame> {
        self.outbound.clone()
    }

    /// Issue a SUBSCRIBE and return the subscription id
    pub fn subscribe(&mut self, destination: &str, ack: AckMode) -> StompResult<String> {
        let id = format!("sub-{}", self.next_subscription);
        self.next_subscription += 1;
        self.outbound
            .send(Frame::subscribe(&id, destination, ack))
            .map_err(|_| StompError::Closed)?;
        tracing::debug!(subscription = %id, destination = %destination, "Subscribed");
        Ok(id)
    }

    /// Queue a frame for transmission
    pub fn send(&self, frame: Frame) -> StompResult<()> {
        self.outbound.send(frame).map_err(|_| StompError::Closed)
    }

    /// Graceful DISCONNECT; the socket closes once the writer drains
    pub fn disconnect(self) -> StompResult<()> {
        let receipt = Uuid::new_v4().to_string();
        self.outbound
            .send(Frame::disconnect(&receipt))
            .map_err(|_| StompError::Closed)
    }
}

/// Connect to the broker and negotiate a STOMP session
pub async fn connect(
    url: &str,
) -> StompResult<(BrokerSession, mpsc::UnboundedReceiver<SessionEvent>)> {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string());

    let (mut ws, _response) = connect_async(url).await?;

    // CONNECT / CONNECTED exchange
    ws.send(Message::Text(Frame::connect(&host).encode()))
        .await?;
    tokio::time::timeout(CONNECT_TIMEOUT, await_connected(&mut ws))
        .await
        .map_err(|_| StompError::ConnectTimeout)??;

    let (mut sink, mut stream) = ws.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();

    // Writer: outbound frame channel -> socket
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let disconnecting = frame.command == Command::Disconnect;
            if let Err(e) = sink.send(Message::Text(frame.encode())).await {
                tracing::warn!(error = %e, "Broker write failed, dropping transport");
                break;
            }
            if disconnecting {
                let _ = sink.close().await;
                break;
            }
        }
    });

    // Reader: socket -> typed events
    let ack_tx = outbound_tx.clone();
    tokio::spawn(async move {
        while let Some(next) = stream.next().await {
            let msg = match next {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "Broker read failed");
                    break;
                }
            };
            match msg {
                Message::Text(text) => {
                    if let Some(event) = decode_server_frame(&text, &ack_tx) {
                        if event_tx.send(event).is_err() {
                            break; // Consumer gone
                        }
                    }
                }
                Message::Close(_) => break,
                // Transport-level ping/pong is handled by tungstenite
                _ => {}
            }
        }
        let _ = event_tx.send(SessionEvent::Closed);
    });

    Ok((
        BrokerSession {
            outbound: outbound_tx,
            next_subscription: 0,
        },
        event_rx,
    ))
}

async fn await_connected(
    ws: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
) -> StompResult<()> {
    while let Some(next) = ws.next().await {
        let text = match next? {
            Message::Text(t) => t,
            Message::Close(_) => return Err(StompError::Closed),
            _ => continue,
        };
        let frame = match Frame::parse(&text) {
            Ok(f) => f,
            Err(crate::FrameError::Empty) => continue, // heart-beat
            Err(e) => return Err(e.into()),
        };
        return match frame.command {
            Command::Connected => Ok(()),
            Command::Error => Err(StompError::ConnectRefused(
                frame.header("message").unwrap_or("no reason given").to_string(),
            )),
            other => Err(StompError::ConnectRefused(format!(
                "unexpected {other} frame before CONNECTED"
            ))),
        };
    }
    Err(StompError::Closed)
}

/// Decode a server frame into a session event; heart-beats and frames we
/// do not route (RECEIPT) yield `None`
fn decode_server_frame(
    text: &str,
    ack_tx: &mpsc::UnboundedSender<Frame>,
) -> Option<SessionEvent> {
    let frame = match Frame::parse(text) {
        Ok(f) => f,
        Err(crate::FrameError::Empty) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unparseable broker frame");
            return None;
        }
    };

    match frame.command {
        Command::Message => {
            let destination = frame.header("destination")?.to_string();
            let subscription = frame.header("subscription").unwrap_or_default().to_string();
            let ack = frame
                .header("ack")
                .map(|id| AckHandle::new(id, ack_tx.clone()));
            Some(SessionEvent::Message(InboundMessage {
                destination,
                subscription,
                body: frame.body,
                ack,
            }))
        }
        Command::Error => Some(SessionEvent::ProtocolError {
            message: frame
                .header("message")
                .unwrap_or("no reason given")
                .to_string(),
            body: frame.body,
        }),
        Command::Receipt => {
            tracing::debug!(receipt = ?frame.header("receipt-id"), "Receipt acknowledged");
            None
        }
        other => {
            tracing::debug!(command = %other, "Ignoring unexpected server frame");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]  // Allow unwrap() in tests for cleaner test code
mod tests {
    use super::*;

    #[test]
    fn test_ack_handle_sends_ack_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = AckHandle::new("ack-7", tx);

        handle.ack().unwrap();

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.command, Command::Ack);
        assert_eq!(frame.header("id"), Some("ack-7"));
    }

    #[test]
    fn test_ack_handle_reports_closed_transport() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handle = AckHandle::new("ack-8", tx);
        assert!(matches!(handle.ack(), Err(StompError::Closed)));
    }

    #[test]
    fn test_subscription_ids_are_sequential() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = BrokerSession {
            outbound: tx,
            next_subscription: 0,
        };

        let a = session.subscribe("/topic/t1.new_customer", AckMode::Auto).unwrap();
        let b = session
            .subscribe("/topic/t1.customer_waiting", AckMode::ClientIndividual)
            .unwrap();
        assert_eq!(a, "sub-0");
        assert_eq!(b, "sub-1");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.header("destination"), Some("/topic/t1.new_customer"));
        assert!(first.header("ack").is_none());
        let second = rx.try_recv().unwrap();
        assert_eq!(second.header("ack"), Some("client-individual"));
    }

    #[test]
    fn test_decode_message_with_manual_ack() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let raw = "MESSAGE\ndestination:/topic/t1.customer_waiting\nsubscription:sub-1\nmessage-id:9\nack:ack-9\n\n{\"customer_id\":\"c1\",\"tenant_id\":\"t1\"}\0";

        match decode_server_frame(raw, &tx) {
            Some(SessionEvent::Message(msg)) => {
                assert_eq!(msg.destination, "/topic/t1.customer_waiting");
                assert_eq!(msg.ack.as_ref().map(|a| a.ack_id()), Some("ack-9"));
            }
            other => panic!("expected Message event, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_skips_heartbeat_and_receipt() {
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(decode_server_frame("\n", &tx).is_none());
        assert!(decode_server_frame("RECEIPT\nreceipt-id:r1\n\n\0", &tx).is_none());
    }

    #[test]
    fn test_decode_error_frame() {
        let (tx, _rx) = mpsc::unbounded_channel();
        match decode_server_frame("ERROR\nmessage:bad destination\n\ndetails\0", &tx) {
            Some(SessionEvent::ProtocolError { message, body }) => {
                assert_eq!(message, "bad destination");
                assert_eq!(body, "details");
            }
            other => panic!("expected ProtocolError, got {other:?}"),
        }
    }
}
