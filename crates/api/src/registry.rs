//! Live socket registry. At most one connection per user id; a fresh
//! connection for the same user replaces the previous entry, and the
//! replaced writer task winds down on its own once its channel closes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kormo_domain::messaging::Message;
use kormo_domain::ports::BoxFuture;
use kormo_domain::ports::messages::LiveDelivery;
use tokio::sync::{RwLock, mpsc};

use crate::wire::{MessageView, WsServerEvent};

struct ConnectionEntry {
    conn_id: u64,
    sender: mpsc::UnboundedSender<WsServerEvent>,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<String, ConnectionEntry>>>,
    next_conn_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its id. An existing entry for
    /// the same user is replaced.
    pub async fn register(
        &self,
        user_id: &str,
        sender: mpsc::UnboundedSender<WsServerEvent>,
    ) -> u64 {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let replaced = self
            .connections
            .write()
            .await
            .insert(user_id.to_string(), ConnectionEntry { conn_id, sender });
        if replaced.is_some() {
            tracing::debug!(user_id, conn_id, "replaced existing live connection");
        }
        conn_id
    }

    /// Removes the entry only when it still belongs to `conn_id`. A
    /// handler tearing down after being replaced must not evict its
    /// successor.
    pub async fn deregister(&self, user_id: &str, conn_id: u64) {
        let mut connections = self.connections.write().await;
        if connections
            .get(user_id)
            .is_some_and(|entry| entry.conn_id == conn_id)
        {
            connections.remove(user_id);
        }
    }

    /// Hands the event to the user's writer channel. Returns false when
    /// the user has no live connection or the channel is already closed.
    pub async fn push(&self, user_id: &str, event: WsServerEvent) -> bool {
        let sender = {
            let connections = self.connections.read().await;
            match connections.get(user_id) {
                Some(entry) => entry.sender.clone(),
                None => return false,
            }
        };
        sender.send(event).is_ok()
    }
}

impl LiveDelivery for ConnectionRegistry {
    fn notify(&self, user_id: &str, message: &Message) -> BoxFuture<'_, bool> {
        let user_id = user_id.to_string();
        let event = WsServerEvent::NewMessage(MessageView::from_message(message));
        Box::pin(async move { self.push(&user_id, event).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        mpsc::UnboundedSender<WsServerEvent>,
        mpsc::UnboundedReceiver<WsServerEvent>,
    ) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn push_reaches_registered_connection() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel();
        registry.register("alice", tx).await;

        assert!(registry.push("alice", WsServerEvent::Pong).await);
        assert_eq!(rx.recv().await, Some(WsServerEvent::Pong));
    }

    #[tokio::test]
    async fn push_to_absent_user_reports_not_delivered() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.push("nobody", WsServerEvent::Pong).await);
    }

    #[tokio::test]
    async fn push_after_receiver_dropped_reports_not_delivered() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = channel();
        registry.register("alice", tx).await;
        drop(rx);

        assert!(!registry.push("alice", WsServerEvent::Pong).await);
    }

    #[tokio::test]
    async fn second_connection_replaces_first() {
        let registry = ConnectionRegistry::new();
        let (old_tx, mut old_rx) = channel();
        let (new_tx, mut new_rx) = channel();
        registry.register("alice", old_tx).await;
        registry.register("alice", new_tx).await;

        assert!(registry.push("alice", WsServerEvent::Pong).await);
        assert_eq!(new_rx.recv().await, Some(WsServerEvent::Pong));
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_deregister_leaves_newer_connection_alone() {
        let registry = ConnectionRegistry::new();
        let (old_tx, _old_rx) = channel();
        let (new_tx, mut new_rx) = channel();
        let old_conn = registry.register("alice", old_tx).await;
        let new_conn = registry.register("alice", new_tx).await;

        registry.deregister("alice", old_conn).await;
        assert!(registry.push("alice", WsServerEvent::Pong).await);
        assert_eq!(new_rx.recv().await, Some(WsServerEvent::Pong));

        registry.deregister("alice", new_conn).await;
        assert!(!registry.push("alice", WsServerEvent::Pong).await);
    }

    #[tokio::test]
    async fn notify_wraps_message_in_new_message_frame() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel();
        registry.register("bob", tx).await;

        let message = Message {
            message_id: "m1".into(),
            sender_id: "alice".into(),
            receiver_id: "bob".into(),
            job_id: "job1".into(),
            body: "hello".into(),
            sent_at_ms: 0,
            read: false,
        };
        assert!(registry.notify("bob", &message).await);
        match rx.recv().await {
            Some(WsServerEvent::NewMessage(view)) => {
                assert_eq!(view.id, "m1");
                assert_eq!(view.message, "hello");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
