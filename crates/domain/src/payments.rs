use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::payments::TransactionRepository;
use crate::ports::users::UserRepository;
use crate::util::now_ms;

/// Paise charged for one additional job posting.
pub const JOB_POSTING_PRICE_PAISE: i64 = 5_000;

/// Mock gateway order. Nothing here talks to a real payment provider; the
/// order id is fabricated and verification always succeeds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub transaction_id: String,
    pub employer_id: String,
    pub amount: i64,
    pub order_id: String,
    pub payment_id: String,
    pub status: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct PaymentVerifyInput {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Clone)]
pub struct PaymentService {
    users: Arc<dyn UserRepository>,
    transactions: Arc<dyn TransactionRepository>,
}

impl PaymentService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        transactions: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            users,
            transactions,
        }
    }

    pub fn create_order(&self, amount: i64) -> PaymentOrder {
        PaymentOrder {
            order_id: format!("order_demo_{}", now_ms()),
            amount,
            currency: "INR".to_string(),
            status: "created".to_string(),
        }
    }

    /// Mock verification: accepts the gateway fields verbatim, credits one
    /// posting to the employer's quota and appends a ledger record.
    pub async fn verify(
        &self,
        employer_id: &str,
        input: PaymentVerifyInput,
    ) -> DomainResult<Transaction> {
        self.users
            .get(employer_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        self.users.adjust_free_jobs(employer_id, 1).await?;

        let transaction = Transaction {
            transaction_id: crate::util::uuid_v7_without_dashes(),
            employer_id: employer_id.to_string(),
            amount: JOB_POSTING_PRICE_PAISE,
            order_id: input.order_id,
            payment_id: input.payment_id,
            status: "success".to_string(),
            created_at_ms: now_ms(),
        };
        let _signature = input.signature;
        self.transactions.create(&transaction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::BoxFuture;
    use crate::users::UserRole;
    use crate::users::tests::{MockUserRepo, sample_user};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MockTransactionRepo {
        store: Arc<RwLock<Vec<Transaction>>>,
    }

    impl TransactionRepository for MockTransactionRepo {
        fn create(
            &self,
            transaction: &Transaction,
        ) -> BoxFuture<'_, DomainResult<Transaction>> {
            let transaction = transaction.clone();
            let store = self.store.clone();
            Box::pin(async move {
                store.write().await.push(transaction.clone());
                Ok(transaction)
            })
        }
    }

    #[tokio::test]
    async fn verify_credits_quota_and_records_ledger_entry() {
        let users = Arc::new(MockUserRepo::default());
        let employer = sample_user("emp-1", UserRole::Employer);
        users
            .store
            .write()
            .await
            .insert(employer.user_id.clone(), employer);
        let transactions = Arc::new(MockTransactionRepo::default());
        let service = PaymentService::new(users.clone(), transactions.clone());

        let transaction = service
            .verify(
                "emp-1",
                PaymentVerifyInput {
                    order_id: "order_demo_1".to_string(),
                    payment_id: "pay_1".to_string(),
                    signature: "sig".to_string(),
                },
            )
            .await
            .expect("transaction");
        assert_eq!(transaction.status, "success");
        assert_eq!(transaction.amount, JOB_POSTING_PRICE_PAISE);
        assert_eq!(
            users.store.read().await["emp-1"].free_jobs_remaining,
            crate::users::FREE_JOB_QUOTA + 1
        );
        assert_eq!(transactions.store.read().await.len(), 1);
    }

    #[tokio::test]
    async fn verify_rejects_unknown_employer() {
        let service = PaymentService::new(
            Arc::new(MockUserRepo::default()),
            Arc::new(MockTransactionRepo::default()),
        );
        let err = service
            .verify(
                "ghost",
                PaymentVerifyInput {
                    order_id: "o".to_string(),
                    payment_id: "p".to_string(),
                    signature: "s".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn create_order_mocks_a_created_inr_order() {
        let service = PaymentService::new(
            Arc::new(MockUserRepo::default()),
            Arc::new(MockTransactionRepo::default()),
        );
        let order = service.create_order(5_000);
        assert!(order.order_id.starts_with("order_demo_"));
        assert_eq!(order.currency, "INR");
        assert_eq!(order.status, "created");
    }
}
