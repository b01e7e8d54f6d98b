//! In-process repositories backing the `memory` data backend. Used by the
//! test suite and by local development without a SurrealDB instance.

use std::collections::HashMap;
use std::sync::Arc;

use kormo_domain::DomainResult;
use kormo_domain::applications::{Application, ApplicationStatus};
use kormo_domain::error::DomainError;
use kormo_domain::jobs::{Job, JobFilter, JobStatus, job_matches_filter};
use kormo_domain::messaging::Message;
use kormo_domain::payments::Transaction;
use kormo_domain::ports::BoxFuture;
use kormo_domain::ports::applications::ApplicationRepository;
use kormo_domain::ports::jobs::JobRepository;
use kormo_domain::ports::messages::MessageRepository;
use kormo_domain::ports::payments::TransactionRepository;
use kormo_domain::ports::users::UserRepository;
use kormo_domain::users::User;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, user: &User) -> BoxFuture<'_, DomainResult<User>> {
        let user = user.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&user.user_id) {
                return Err(DomainError::Conflict("user already exists".into()));
            }
            store.insert(user.user_id.clone(), user.clone());
            Ok(user)
        })
    }

    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&user_id).cloned()) })
    }

    fn update(&self, user: &User) -> BoxFuture<'_, DomainResult<User>> {
        let user = user.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if !store.contains_key(&user.user_id) {
                return Err(DomainError::NotFound);
            }
            store.insert(user.user_id.clone(), user.clone());
            Ok(user)
        })
    }

    fn find_by_phone(&self, phone: &str) -> BoxFuture<'_, DomainResult<Option<User>>> {
        let phone = phone.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .values()
                .find(|user| user.phone == phone)
                .cloned())
        })
    }

    fn adjust_free_jobs(&self, user_id: &str, delta: i64) -> BoxFuture<'_, DomainResult<User>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let user = store.get_mut(&user_id).ok_or(DomainError::NotFound)?;
            user.free_jobs_remaining += delta;
            Ok(user.clone())
        })
    }
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    store: Arc<RwLock<HashMap<String, Job>>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRepository for InMemoryJobRepository {
    fn create(&self, job: &Job) -> BoxFuture<'_, DomainResult<Job>> {
        let job = job.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&job.job_id) {
                return Err(DomainError::Conflict("job already exists".into()));
            }
            store.insert(job.job_id.clone(), job.clone());
            Ok(job)
        })
    }

    fn get(&self, job_id: &str) -> BoxFuture<'_, DomainResult<Option<Job>>> {
        let job_id = job_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&job_id).cloned()) })
    }

    fn list_active(
        &self,
        filter: &JobFilter,
        limit: usize,
    ) -> BoxFuture<'_, DomainResult<Vec<Job>>> {
        let filter = filter.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut jobs: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|job| job.status == JobStatus::Active)
                .filter(|job| job_matches_filter(job, &filter))
                .cloned()
                .collect();
            jobs.sort_by(|a, b| {
                b.posted_at_ms
                    .cmp(&a.posted_at_ms)
                    .then_with(|| b.job_id.cmp(&a.job_id))
            });
            jobs.truncate(limit);
            Ok(jobs)
        })
    }

    fn list_by_employer(&self, employer_id: &str) -> BoxFuture<'_, DomainResult<Vec<Job>>> {
        let employer_id = employer_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut jobs: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|job| job.employer_id == employer_id)
                .cloned()
                .collect();
            jobs.sort_by(|a, b| {
                b.posted_at_ms
                    .cmp(&a.posted_at_ms)
                    .then_with(|| b.job_id.cmp(&a.job_id))
            });
            Ok(jobs)
        })
    }

    fn set_status(&self, job_id: &str, status: JobStatus) -> BoxFuture<'_, DomainResult<bool>> {
        let job_id = job_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            match store.get_mut(&job_id) {
                Some(job) => {
                    job.status = status;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn increment_applications(&self, job_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let job_id = job_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            if let Some(job) = store.write().await.get_mut(&job_id) {
                job.applications_count += 1;
            }
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct InMemoryApplicationRepository {
    store: Arc<RwLock<HashMap<String, Application>>>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn create(&self, application: &Application) -> BoxFuture<'_, DomainResult<Application>> {
        let application = application.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .insert(application.application_id.clone(), application.clone());
            Ok(application)
        })
    }

    fn find_by_job_and_seeker(
        &self,
        job_id: &str,
        seeker_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Application>>> {
        let job_id = job_id.to_string();
        let seeker_id = seeker_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .values()
                .find(|app| app.job_id == job_id && app.seeker_id == seeker_id)
                .cloned())
        })
    }

    fn list_by_job(&self, job_id: &str) -> BoxFuture<'_, DomainResult<Vec<Application>>> {
        let job_id = job_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut apps: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|app| app.job_id == job_id)
                .cloned()
                .collect();
            apps.sort_by(|a, b| {
                b.applied_at_ms
                    .cmp(&a.applied_at_ms)
                    .then_with(|| b.application_id.cmp(&a.application_id))
            });
            Ok(apps)
        })
    }

    fn list_by_seeker(&self, seeker_id: &str) -> BoxFuture<'_, DomainResult<Vec<Application>>> {
        let seeker_id = seeker_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut apps: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|app| app.seeker_id == seeker_id)
                .cloned()
                .collect();
            apps.sort_by(|a, b| {
                b.applied_at_ms
                    .cmp(&a.applied_at_ms)
                    .then_with(|| b.application_id.cmp(&a.application_id))
            });
            Ok(apps)
        })
    }

    fn set_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let application_id = application_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            match store.get_mut(&application_id) {
                Some(app) => {
                    app.status = status;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    // Append-only; insertion order is creation order.
    store: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ascending(a: &Message, b: &Message) -> std::cmp::Ordering {
    a.sent_at_ms
        .cmp(&b.sent_at_ms)
        .then_with(|| a.message_id.cmp(&b.message_id))
}

impl MessageRepository for InMemoryMessageRepository {
    fn create(&self, message: &Message) -> BoxFuture<'_, DomainResult<Message>> {
        let message = message.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.push(message.clone());
            Ok(message)
        })
    }

    fn list_between(
        &self,
        user_id: &str,
        other_user_id: &str,
        limit: usize,
    ) -> BoxFuture<'_, DomainResult<Vec<Message>>> {
        let a = user_id.to_string();
        let b = other_user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut messages: Vec<_> = store
                .read()
                .await
                .iter()
                .filter(|m| {
                    (m.sender_id == a && m.receiver_id == b)
                        || (m.sender_id == b && m.receiver_id == a)
                })
                .cloned()
                .collect();
            messages.sort_by(ascending);
            messages.truncate(limit);
            Ok(messages)
        })
    }

    fn list_involving(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Message>>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut messages: Vec<_> = store
                .read()
                .await
                .iter()
                .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
                .cloned()
                .collect();
            messages.sort_by(|a, b| ascending(b, a));
            Ok(messages)
        })
    }
}

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    store: Arc<RwLock<Vec<Transaction>>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionRepository for InMemoryTransactionRepository {
    fn create(&self, transaction: &Transaction) -> BoxFuture<'_, DomainResult<Transaction>> {
        let transaction = transaction.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store.write().await.push(transaction.clone());
            Ok(transaction)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kormo_domain::messaging::HISTORY_LIMIT;

    fn message(id: &str, from: &str, to: &str, at_ms: i64) -> Message {
        Message {
            message_id: id.to_string(),
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            job_id: String::new(),
            body: String::new(),
            sent_at_ms: at_ms,
            read: false,
        }
    }

    #[tokio::test]
    async fn list_between_is_pair_scoped_sorted_and_capped() {
        let repo = InMemoryMessageRepository::new();
        repo.create(&message("m2", "u2", "u1", 200)).await.expect("m2");
        repo.create(&message("m1", "u1", "u2", 100)).await.expect("m1");
        repo.create(&message("mx", "u1", "u3", 150)).await.expect("mx");

        let between = repo.list_between("u1", "u2", HISTORY_LIMIT).await.expect("rows");
        let ids: Vec<_> = between.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);

        let capped = repo.list_between("u1", "u2", 1).await.expect("rows");
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].message_id, "m1");
    }

    #[tokio::test]
    async fn list_involving_orders_newest_first_with_id_tiebreak() {
        let repo = InMemoryMessageRepository::new();
        repo.create(&message("aaa", "u1", "u2", 500)).await.expect("aaa");
        repo.create(&message("zzz", "u3", "u1", 500)).await.expect("zzz");
        repo.create(&message("old", "u1", "u2", 10)).await.expect("old");

        let rows = repo.list_involving("u1").await.expect("rows");
        let ids: Vec<_> = rows.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, ["zzz", "aaa", "old"]);
    }

    #[tokio::test]
    async fn adjust_free_jobs_is_cumulative() {
        let repo = InMemoryUserRepository::new();
        let mut user = kormo_domain::users::User {
            user_id: "u1".to_string(),
            phone: "9000".to_string(),
            role: kormo_domain::users::UserRole::Employer,
            name: "n".to_string(),
            business_name: None,
            location: String::new(),
            languages: vec![],
            skills: vec![],
            free_jobs_remaining: 2,
            created_at_ms: 0,
        };
        user = repo.create(&user).await.expect("user");
        repo.adjust_free_jobs(&user.user_id, -1).await.expect("dec");
        let user = repo.adjust_free_jobs(&user.user_id, 3).await.expect("inc");
        assert_eq!(user.free_jobs_remaining, 4);
    }
}
