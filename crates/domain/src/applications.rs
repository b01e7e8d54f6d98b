use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::applications::ApplicationRepository;
use crate::ports::jobs::JobRepository;
use crate::ports::users::UserRepository;
use crate::users::UserRole;
use crate::util::now_ms;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Shortlisted,
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    pub application_id: String,
    pub job_id: String,
    pub cover_letter: Option<String>,
    pub seeker_id: String,
    pub seeker_name: String,
    pub seeker_phone: String,
    pub seeker_skills: Vec<String>,
    pub status: ApplicationStatus,
    pub applied_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct ApplicationCreate {
    pub job_id: String,
    pub cover_letter: Option<String>,
}

#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserRepository>,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            applications,
            jobs,
            users,
        }
    }

    pub async fn apply(
        &self,
        seeker_id: &str,
        input: ApplicationCreate,
    ) -> DomainResult<Application> {
        let seeker = self
            .users
            .get(seeker_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if seeker.role != UserRole::Seeker {
            return Err(DomainError::Forbidden(
                "only job seekers can apply".into(),
            ));
        }
        if self
            .applications
            .find_by_job_and_seeker(&input.job_id, seeker_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict("already applied to this job".into()));
        }

        let application = Application {
            application_id: crate::util::uuid_v7_without_dashes(),
            job_id: input.job_id.clone(),
            cover_letter: input.cover_letter,
            seeker_id: seeker.user_id,
            seeker_name: seeker.name,
            seeker_phone: seeker.phone,
            seeker_skills: seeker.skills,
            status: ApplicationStatus::Pending,
            applied_at_ms: now_ms(),
        };
        let application = self.applications.create(&application).await?;
        self.jobs.increment_applications(&input.job_id).await?;
        Ok(application)
    }

    pub async fn list_by_job(&self, job_id: &str) -> DomainResult<Vec<Application>> {
        self.applications.list_by_job(job_id).await
    }

    pub async fn list_by_seeker(&self, seeker_id: &str) -> DomainResult<Vec<Application>> {
        self.applications.list_by_seeker(seeker_id).await
    }

    pub async fn set_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
    ) -> DomainResult<()> {
        let updated = self.applications.set_status(application_id, status).await?;
        if updated { Ok(()) } else { Err(DomainError::NotFound) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobFilter;
    use crate::ports::BoxFuture;
    use crate::users::tests::{MockUserRepo, sample_user};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MockApplicationRepo {
        store: Arc<RwLock<HashMap<String, Application>>>,
    }

    impl ApplicationRepository for MockApplicationRepo {
        fn create(
            &self,
            application: &Application,
        ) -> BoxFuture<'_, DomainResult<Application>> {
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
                apps.sort_by(|a, b| b.applied_at_ms.cmp(&a.applied_at_ms));
                Ok(apps)
            })
        }

        fn list_by_seeker(
            &self,
            seeker_id: &str,
        ) -> BoxFuture<'_, DomainResult<Vec<Application>>> {
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
                apps.sort_by(|a, b| b.applied_at_ms.cmp(&a.applied_at_ms));
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

    use crate::jobs::tests::MockJobRepo;
    use crate::jobs::{Job, JobStatus};

    async fn seeded_service() -> (ApplicationService, Arc<MockJobRepo>) {
        let users = Arc::new(MockUserRepo::default());
        let seeker = sample_user("skr-1", UserRole::Seeker);
        users
            .store
            .write()
            .await
            .insert(seeker.user_id.clone(), seeker);
        let jobs = Arc::new(MockJobRepo::default());
        jobs.store.write().await.insert(
            "j-1".to_string(),
            Job {
                job_id: "j-1".to_string(),
                title: "Rider".to_string(),
                category: "delivery".to_string(),
                description: String::new(),
                salary: String::new(),
                location: String::new(),
                job_type: String::new(),
                experience: String::new(),
                education: String::new(),
                languages: vec![],
                skills: vec![],
                employer_id: "emp-1".to_string(),
                employer_name: String::new(),
                employer_phone: String::new(),
                business_name: None,
                posted_at_ms: 0,
                status: JobStatus::Active,
                is_paid: false,
                applications_count: 0,
            },
        );
        let service =
            ApplicationService::new(Arc::new(MockApplicationRepo::default()), jobs.clone(), users);
        (service, jobs)
    }

    #[tokio::test]
    async fn apply_snapshots_seeker_and_bumps_job_counter() {
        let (service, jobs) = seeded_service().await;
        let application = service
            .apply(
                "skr-1",
                ApplicationCreate {
                    job_id: "j-1".to_string(),
                    cover_letter: None,
                },
            )
            .await
            .expect("application");
        assert_eq!(application.seeker_name, "skr-1-name");
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(
            jobs.list_active(&JobFilter::default(), 10).await.expect("jobs")[0]
                .applications_count,
            1
        );
    }

    #[tokio::test]
    async fn apply_twice_to_same_job_conflicts() {
        let (service, _jobs) = seeded_service().await;
        let input = ApplicationCreate {
            job_id: "j-1".to_string(),
            cover_letter: Some("keen".to_string()),
        };
        service.apply("skr-1", input.clone()).await.expect("first");
        let err = service.apply("skr-1", input).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn apply_requires_known_seeker() {
        let (service, _jobs) = seeded_service().await;
        let err = service
            .apply(
                "ghost",
                ApplicationCreate {
                    job_id: "j-1".to_string(),
                    cover_letter: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }
}
