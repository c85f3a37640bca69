//! Outbound connection manager
//!
//! Owns the link to the active broker session and the FIFO queue of frames
//! published while disconnected. The queue is drained exactly once,
//! immediately after a link is attached, and discarded on shutdown; there
//! is no durability across sessions.

use std::collections::VecDeque;

use relaydesk_stomp::Frame;
use tokio::sync::mpsc;

/// Queues outbound frames while disconnected, forwards them while
/// connected
#[derive(Debug, Default)]
pub struct ConnectionManager {
    link: Option<mpsc::UnboundedSender<Frame>>,
    queue: VecDeque<Frame>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Publish a frame: forwarded immediately over the live link, queued in
    /// FIFO order otherwise. A link that turns out to be dead demotes the
    /// manager to disconnected and queues the frame instead of losing it.
    pub fn dispatch(&mut self, frame: Frame) {
        match self.link.as_ref() {
            Some(link) => {
                if let Err(e) = link.send(frame) {
                    tracing::warn!("Broker link lost, queuing frame");
                    self.link = None;
                    self.queue.push_back(e.0);
                }
            }
            None => {
                tracing::debug!(queued = self.queue.len() + 1, "Queued frame while disconnected");
                self.queue.push_back(frame);
            }
        }
    }

    /// Attach a freshly connected session link and drain the queue in the
    /// order the frames were published. If the link dies mid-drain the
    /// remaining frames stay queued for the next attach.
    pub fn attach(&mut self, link: mpsc::UnboundedSender<Frame>) {
        let pending = self.queue.len();
        while let Some(frame) = self.queue.pop_front() {
            if let Err(e) = link.send(frame) {
                tracing::warn!("Broker link died while draining the outbound queue");
                self.queue.push_front(e.0);
                return;
            }
        }
        if pending > 0 {
            tracing::info!(drained = pending, "Drained outbound queue after reconnect");
        }
        self.link = Some(link);
    }

    /// Drop the link on transport failure; queued frames are kept for the
    /// next reconnect.
    pub fn detach(&mut self) {
        self.link = None;
    }

    /// Final teardown: unsent frames are discarded, not flushed.
    pub fn shutdown(&mut self) {
        if !self.queue.is_empty() {
            tracing::info!(discarded = self.queue.len(), "Discarding unsent frames on shutdown");
        }
        self.queue.clear();
        self.link = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]  // Allow unwrap() in tests for cleaner test code
mod tests {
    use super::*;

    fn frame(n: usize) -> Frame {
        Frame::send_text("/app/chat.sendMessage", format!(r#"{{"n":{n}}}"#))
    }

    #[test]
    fn test_queue_drained_fifo_on_attach() {
        let mut conn = ConnectionManager::new();
        conn.dispatch(frame(1));
        conn.dispatch(frame(2));
        conn.dispatch(frame(3));
        assert_eq!(conn.queued(), 3);
        assert!(!conn.is_connected());

        let (tx, mut rx) = mpsc::unbounded_channel();
        conn.attach(tx);
        assert!(conn.is_connected());
        assert_eq!(conn.queued(), 0);

        for n in 1..=3 {
            let f = rx.try_recv().unwrap();
            assert_eq!(f.body, format!(r#"{{"n":{n}}}"#));
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_connected_dispatch_bypasses_queue() {
        let mut conn = ConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        conn.attach(tx);

        conn.dispatch(frame(1));
        assert_eq!(conn.queued(), 0);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_dead_link_requeues_frame() {
        let mut conn = ConnectionManager::new();
        let (tx, rx) = mpsc::unbounded_channel();
        conn.attach(tx);
        drop(rx);

        conn.dispatch(frame(1));
        assert!(!conn.is_connected());
        assert_eq!(conn.queued(), 1);

        // The frame survives to the next attach, still in order
        conn.dispatch(frame(2));
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        conn.attach(tx2);
        assert_eq!(rx2.try_recv().unwrap().body, r#"{"n":1}"#);
        assert_eq!(rx2.try_recv().unwrap().body, r#"{"n":2}"#);
    }

    #[test]
    fn test_queue_preserved_across_detach() {
        let mut conn = ConnectionManager::new();
        conn.dispatch(frame(1));
        conn.detach();
        assert_eq!(conn.queued(), 1);
    }

    #[test]
    fn test_shutdown_discards_queue() {
        let mut conn = ConnectionManager::new();
        conn.dispatch(frame(1));
        conn.dispatch(frame(2));
        conn.shutdown();
        assert_eq!(conn.queued(), 0);
        assert!(!conn.is_connected());
    }
}
