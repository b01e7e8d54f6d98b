use crate::DomainResult;
use crate::messaging::Message;

pub trait MessageRepository: Send + Sync {
    /// Appends to the message log; records are immutable once written.
    fn create(&self, message: &Message) -> crate::ports::BoxFuture<'_, DomainResult<Message>>;

    /// Every message exchanged between the pair, in either direction,
    /// ascending by `(sent_at_ms, message_id)`, capped at `limit`.
    fn list_between(
        &self,
        user_id: &str,
        other_user_id: &str,
        limit: usize,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Vec<Message>>>;

    /// Every message where the user is sender or receiver, descending by
    /// `(sent_at_ms, message_id)`.
    fn list_involving(
        &self,
        user_id: &str,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Vec<Message>>>;
}

/// Best-effort push to a recipient's open live channel. The durable log is
/// the source of truth; the returned hint only says whether a handle was
/// present and accepted the frame, never that the client received it.
pub trait LiveDelivery: Send + Sync {
    fn notify(
        &self,
        user_id: &str,
        message: &Message,
    ) -> crate::ports::BoxFuture<'_, bool>;
}

/// Delivery sink for deployments without a live channel (tests, workers).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLiveDelivery;

impl LiveDelivery for NoLiveDelivery {
    fn notify(&self, _user_id: &str, _message: &Message) -> crate::ports::BoxFuture<'_, bool> {
        Box::pin(async { false })
    }
}
