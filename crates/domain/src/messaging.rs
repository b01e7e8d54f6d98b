use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::ports::messages::{LiveDelivery, MessageRepository};
use crate::ports::users::UserRepository;
use crate::util::now_ms;

/// Hard cap on a single history fetch; callers page externally.
pub const HISTORY_LIMIT: usize = 1000;

/// One record in the append-only message log. Everything except `read` is
/// immutable after creation, and nothing in this service flips `read`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub job_id: String,
    pub body: String,
    pub sent_at_ms: i64,
    pub read: bool,
}

#[derive(Clone, Debug)]
pub struct MessageSendInput {
    pub sender_id: String,
    pub receiver_id: String,
    pub job_id: String,
    pub body: String,
}

/// Derived per-counterpart view; recomputed on every request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationSummary {
    pub counterpart_id: String,
    pub counterpart_name: String,
    pub last_message: Message,
}

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    delivery: Arc<dyn LiveDelivery>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        delivery: Arc<dyn LiveDelivery>,
    ) -> Self {
        Self {
            messages,
            users,
            delivery,
        }
    }

    /// Appends the message to the durable log, then attempts a live push to
    /// the receiver. The push is advisory: an offline receiver or a broken
    /// channel never fails the send. A store failure propagates and no push
    /// is attempted.
    pub async fn send(&self, input: MessageSendInput) -> DomainResult<Message> {
        let message = Message {
            message_id: crate::util::uuid_v7_without_dashes(),
            sender_id: input.sender_id,
            receiver_id: input.receiver_id,
            job_id: input.job_id,
            body: input.body,
            sent_at_ms: now_ms(),
            read: false,
        };
        let message = self.messages.create(&message).await?;
        let _delivered_live = self
            .delivery
            .notify(&message.receiver_id, &message)
            .await;
        Ok(message)
    }

    /// Both directions of the pair, oldest first. Symmetric in its
    /// arguments and capped at [`HISTORY_LIMIT`] records.
    pub async fn history(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> DomainResult<Vec<Message>> {
        self.messages
            .list_between(user_id, other_user_id, HISTORY_LIMIT)
            .await
    }

    /// Latest message per counterpart, most recent conversation first.
    /// Timestamp ties break on `message_id` descending, so the result is
    /// deterministic. Counterparts that no longer resolve in the user
    /// directory are dropped silently.
    pub async fn conversations(&self, user_id: &str) -> DomainResult<Vec<ConversationSummary>> {
        let log = self.messages.list_involving(user_id).await?;

        // `log` is descending by (sent_at_ms, message_id): the first record
        // seen for a counterpart is that conversation's latest message.
        let mut summaries: Vec<ConversationSummary> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for message in log {
            let counterpart_id = if message.sender_id == user_id {
                message.receiver_id.clone()
            } else {
                message.sender_id.clone()
            };
            if seen.iter().any(|id| id == &counterpart_id) {
                continue;
            }
            seen.push(counterpart_id.clone());

            let Some(counterpart) = self.users.get(&counterpart_id).await? else {
                continue;
            };
            summaries.push(ConversationSummary {
                counterpart_id,
                counterpart_name: counterpart.name,
                last_message: message,
            });
        }
        Ok(summaries)
    }
}
