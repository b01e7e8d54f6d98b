use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::users::UserRepository;
use crate::util::now_ms;

/// Free job postings credited to every newly registered account.
pub const FREE_JOB_QUOTA: i64 = 2;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Employer,
    Seeker,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub phone: String,
    pub role: UserRole,
    pub name: String,
    pub business_name: Option<String>,
    pub location: String,
    pub languages: Vec<String>,
    pub skills: Vec<String>,
    pub free_jobs_remaining: i64,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct UserCreate {
    pub phone: String,
    pub role: UserRole,
    pub name: String,
    pub business_name: Option<String>,
    pub location: String,
    pub languages: Vec<String>,
    pub skills: Vec<String>,
}

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn register(&self, input: UserCreate) -> DomainResult<User> {
        let input = validate_user_create(input)?;
        let user = User {
            user_id: crate::util::uuid_v7_without_dashes(),
            phone: input.phone,
            role: input.role,
            name: input.name,
            business_name: input.business_name,
            location: input.location,
            languages: input.languages,
            skills: input.skills,
            free_jobs_remaining: FREE_JOB_QUOTA,
            created_at_ms: now_ms(),
        };
        self.repository.create(&user).await
    }

    pub async fn get(&self, user_id: &str) -> DomainResult<User> {
        self.repository
            .get(user_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn update(&self, user_id: &str, input: UserCreate) -> DomainResult<User> {
        let input = validate_user_create(input)?;
        let existing = self.get(user_id).await?;
        let user = User {
            user_id: existing.user_id,
            phone: input.phone,
            role: input.role,
            name: input.name,
            business_name: input.business_name,
            location: input.location,
            languages: input.languages,
            skills: input.skills,
            free_jobs_remaining: existing.free_jobs_remaining,
            created_at_ms: existing.created_at_ms,
        };
        self.repository.update(&user).await
    }

    pub async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<User>> {
        self.repository.find_by_phone(phone.trim()).await
    }
}

fn validate_user_create(mut input: UserCreate) -> DomainResult<UserCreate> {
    input.phone = input.phone.trim().to_string();
    input.name = input.name.trim().to_string();
    if input.phone.is_empty() {
        return Err(DomainError::Validation("phone is required".into()));
    }
    if input.name.is_empty() {
        return Err(DomainError::Validation("name is required".into()));
    }
    Ok(input)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub(crate) struct MockUserRepo {
        pub(crate) store: Arc<RwLock<HashMap<String, User>>>,
    }

    impl UserRepository for MockUserRepo {
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
            Box::pin(async move {
                let store = store.read().await;
                Ok(store.get(&user_id).cloned())
            })
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
                let store = store.read().await;
                Ok(store.values().find(|user| user.phone == phone).cloned())
            })
        }

        fn adjust_free_jobs(
            &self,
            user_id: &str,
            delta: i64,
        ) -> BoxFuture<'_, DomainResult<User>> {
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

    pub(crate) fn sample_user(user_id: &str, role: UserRole) -> User {
        User {
            user_id: user_id.to_string(),
            phone: format!("9{user_id}"),
            role,
            name: format!("{user_id}-name"),
            business_name: None,
            location: "Kolkata".to_string(),
            languages: vec!["bn".to_string()],
            skills: vec!["driving".to_string()],
            free_jobs_remaining: FREE_JOB_QUOTA,
            created_at_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn register_credits_free_job_quota() {
        let service = UserService::new(Arc::new(MockUserRepo::default()));
        let user = service
            .register(UserCreate {
                phone: "9830012345".to_string(),
                role: UserRole::Employer,
                name: "Arun".to_string(),
                business_name: Some("Arun Logistics".to_string()),
                location: "Howrah".to_string(),
                languages: vec!["bn".to_string(), "hi".to_string()],
                skills: vec![],
            })
            .await
            .expect("user");
        assert_eq!(user.free_jobs_remaining, FREE_JOB_QUOTA);
        assert!(!user.user_id.is_empty());
    }

    #[tokio::test]
    async fn update_preserves_quota_and_creation_time() {
        let repo = Arc::new(MockUserRepo::default());
        let service = UserService::new(repo.clone());
        let mut seeded = sample_user("u-1", UserRole::Seeker);
        seeded.free_jobs_remaining = 1;
        repo.store
            .write()
            .await
            .insert(seeded.user_id.clone(), seeded.clone());

        let updated = service
            .update(
                "u-1",
                UserCreate {
                    phone: seeded.phone.clone(),
                    role: UserRole::Seeker,
                    name: "Renamed".to_string(),
                    business_name: None,
                    location: "Salt Lake".to_string(),
                    languages: vec![],
                    skills: vec!["cooking".to_string()],
                },
            )
            .await
            .expect("updated");
        assert_eq!(updated.free_jobs_remaining, 1);
        assert_eq!(updated.created_at_ms, seeded.created_at_ms);
        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn register_rejects_blank_phone() {
        let service = UserService::new(Arc::new(MockUserRepo::default()));
        let err = service
            .register(UserCreate {
                phone: "   ".to_string(),
                role: UserRole::Seeker,
                name: "x".to_string(),
                business_name: None,
                location: String::new(),
                languages: vec![],
                skills: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
