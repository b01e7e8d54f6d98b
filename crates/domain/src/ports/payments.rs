use crate::DomainResult;
use crate::payments::Transaction;

pub trait TransactionRepository: Send + Sync {
    fn create(
        &self,
        transaction: &Transaction,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Transaction>>;
}
