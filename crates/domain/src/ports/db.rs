use thiserror::Error;

use super::BoxFuture;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Liveness view of the persistence substrate, consumed by the health
/// endpoint. Repositories talk to the store directly; this only answers
/// "is it reachable".
pub trait DbAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn health_check(&self) -> BoxFuture<'_, Result<(), DbError>>;
}
