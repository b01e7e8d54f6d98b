use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::jobs::JobRepository;
use crate::ports::users::UserRepository;
use crate::users::UserRole;
use crate::util::now_ms;

pub const MAX_JOBS_PER_LISTING: usize = 100;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Filled,
    Closed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub job_id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub salary: String,
    pub location: String,
    pub job_type: String,
    pub experience: String,
    pub education: String,
    pub languages: Vec<String>,
    pub skills: Vec<String>,
    pub employer_id: String,
    pub employer_name: String,
    pub employer_phone: String,
    pub business_name: Option<String>,
    pub posted_at_ms: i64,
    pub status: JobStatus,
    pub is_paid: bool,
    pub applications_count: i64,
}

#[derive(Clone, Debug)]
pub struct JobCreate {
    pub title: String,
    pub category: String,
    pub description: String,
    pub salary: String,
    pub location: String,
    pub job_type: String,
    pub experience: String,
    pub education: String,
    pub languages: Vec<String>,
    pub skills: Vec<String>,
}

/// Listing filters; text fields match case-insensitively as substrings,
/// the rest are exact equality.
#[derive(Clone, Debug, Default)]
pub struct JobFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub language: Option<String>,
    pub skill: Option<String>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserRepository>,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { jobs, users }
    }

    /// Posts a job against the employer's freemium quota. The quota is
    /// decremented before the insert, matching the ledger-then-post order
    /// of the platform's billing flow.
    pub async fn post(&self, employer_id: &str, input: JobCreate) -> DomainResult<Job> {
        let input = validate_job_create(input)?;
        let employer = self
            .users
            .get(employer_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if employer.role != UserRole::Employer {
            return Err(DomainError::Forbidden(
                "only employers can post jobs".into(),
            ));
        }
        if employer.free_jobs_remaining <= 0 {
            return Err(DomainError::PaymentRequired);
        }
        self.users.adjust_free_jobs(employer_id, -1).await?;

        let job = Job {
            job_id: crate::util::uuid_v7_without_dashes(),
            title: input.title,
            category: input.category,
            description: input.description,
            salary: input.salary,
            location: input.location,
            job_type: input.job_type,
            experience: input.experience,
            education: input.education,
            languages: input.languages,
            skills: input.skills,
            employer_id: employer.user_id,
            employer_name: employer.name,
            employer_phone: employer.phone,
            business_name: employer.business_name,
            posted_at_ms: now_ms(),
            status: JobStatus::Active,
            is_paid: false,
            applications_count: 0,
        };
        self.jobs.create(&job).await
    }

    pub async fn list(&self, filter: JobFilter) -> DomainResult<Vec<Job>> {
        self.jobs.list_active(&filter, MAX_JOBS_PER_LISTING).await
    }

    pub async fn get(&self, job_id: &str) -> DomainResult<Job> {
        self.jobs.get(job_id).await?.ok_or(DomainError::NotFound)
    }

    pub async fn list_by_employer(&self, employer_id: &str) -> DomainResult<Vec<Job>> {
        self.jobs.list_by_employer(employer_id).await
    }

    pub async fn set_status(&self, job_id: &str, status: JobStatus) -> DomainResult<()> {
        let updated = self.jobs.set_status(job_id, status).await?;
        if updated { Ok(()) } else { Err(DomainError::NotFound) }
    }
}

fn validate_job_create(mut input: JobCreate) -> DomainResult<JobCreate> {
    input.title = input.title.trim().to_string();
    if input.title.is_empty() {
        return Err(DomainError::Validation("title is required".into()));
    }
    Ok(input)
}

/// Shared by the in-memory repository and tests; the Surreal backend
/// expresses the same predicate in its query.
pub fn job_matches_filter(job: &Job, filter: &JobFilter) -> bool {
    fn contains_ci(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    if let Some(category) = &filter.category {
        if &job.category != category {
            return false;
        }
    }
    if let Some(location) = &filter.location {
        if !contains_ci(&job.location, location) {
            return false;
        }
    }
    if let Some(job_type) = &filter.job_type {
        if &job.job_type != job_type {
            return false;
        }
    }
    if let Some(experience) = &filter.experience {
        if &job.experience != experience {
            return false;
        }
    }
    if let Some(education) = &filter.education {
        if &job.education != education {
            return false;
        }
    }
    if let Some(language) = &filter.language {
        if !job.languages.iter().any(|item| item == language) {
            return false;
        }
    }
    if let Some(skill) = &filter.skill {
        if !job.skills.iter().any(|item| contains_ci(item, skill)) {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        if !contains_ci(&job.title, search) && !contains_ci(&job.description, search) {
            return false;
        }
    }
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::BoxFuture;
    use crate::users::FREE_JOB_QUOTA;
    use crate::users::tests::{MockUserRepo, sample_user};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub(crate) struct MockJobRepo {
        pub(crate) store: Arc<RwLock<HashMap<String, Job>>>,
    }

    impl JobRepository for MockJobRepo {
        fn create(&self, job: &Job) -> BoxFuture<'_, DomainResult<Job>> {
            let job = job.clone();
            let store = self.store.clone();
            Box::pin(async move {
                store.write().await.insert(job.job_id.clone(), job.clone());
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
                jobs.sort_by(|a, b| b.posted_at_ms.cmp(&a.posted_at_ms));
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
                jobs.sort_by(|a, b| b.posted_at_ms.cmp(&a.posted_at_ms));
                Ok(jobs)
            })
        }

        fn set_status(
            &self,
            job_id: &str,
            status: JobStatus,
        ) -> BoxFuture<'_, DomainResult<bool>> {
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

    fn sample_create(title: &str) -> JobCreate {
        JobCreate {
            title: title.to_string(),
            category: "delivery".to_string(),
            description: "two wheeler delivery rider".to_string(),
            salary: "15000".to_string(),
            location: "Kolkata".to_string(),
            job_type: "Full-time".to_string(),
            experience: "fresher".to_string(),
            education: "secondary".to_string(),
            languages: vec!["bn".to_string()],
            skills: vec!["driving".to_string()],
        }
    }

    async fn service_with_employer() -> (JobService, Arc<MockUserRepo>) {
        let users = Arc::new(MockUserRepo::default());
        let employer = sample_user("emp-1", UserRole::Employer);
        users
            .store
            .write()
            .await
            .insert(employer.user_id.clone(), employer);
        let service = JobService::new(Arc::new(MockJobRepo::default()), users.clone());
        (service, users)
    }

    #[tokio::test]
    async fn post_decrements_quota_and_snapshots_employer() {
        let (service, users) = service_with_employer().await;
        let job = service.post("emp-1", sample_create("Rider")).await.expect("job");
        assert_eq!(job.employer_name, "emp-1-name");
        assert_eq!(job.status, JobStatus::Active);
        assert!(!job.is_paid);
        let remaining = users.store.read().await["emp-1"].free_jobs_remaining;
        assert_eq!(remaining, FREE_JOB_QUOTA - 1);
    }

    #[tokio::test]
    async fn post_requires_payment_once_quota_exhausted() {
        let (service, _users) = service_with_employer().await;
        for n in 0..FREE_JOB_QUOTA {
            service
                .post("emp-1", sample_create(&format!("Job {n}")))
                .await
                .expect("within quota");
        }
        let err = service.post("emp-1", sample_create("One more")).await.unwrap_err();
        assert!(matches!(err, DomainError::PaymentRequired));
    }

    #[tokio::test]
    async fn post_rejects_seekers() {
        let users = Arc::new(MockUserRepo::default());
        let seeker = sample_user("skr-1", UserRole::Seeker);
        users
            .store
            .write()
            .await
            .insert(seeker.user_id.clone(), seeker);
        let service = JobService::new(Arc::new(MockJobRepo::default()), users);
        let err = service.post("skr-1", sample_create("Rider")).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn filter_matches_substrings_case_insensitively() {
        let job = Job {
            job_id: "j-1".to_string(),
            title: "Delivery Rider".to_string(),
            category: "delivery".to_string(),
            description: "north kolkata routes".to_string(),
            salary: "15000".to_string(),
            location: "Kolkata North".to_string(),
            job_type: "Full-time".to_string(),
            experience: "fresher".to_string(),
            education: "secondary".to_string(),
            languages: vec!["bn".to_string()],
            skills: vec!["Two Wheeler Driving".to_string()],
            employer_id: "emp-1".to_string(),
            employer_name: "n".to_string(),
            employer_phone: "p".to_string(),
            business_name: None,
            posted_at_ms: 0,
            status: JobStatus::Active,
            is_paid: false,
            applications_count: 0,
        };
        let filter = JobFilter {
            location: Some("kolkata".to_string()),
            skill: Some("driving".to_string()),
            search: Some("RIDER".to_string()),
            ..JobFilter::default()
        };
        assert!(job_matches_filter(&job, &filter));
        let miss = JobFilter {
            language: Some("hi".to_string()),
            ..JobFilter::default()
        };
        assert!(!job_matches_filter(&job, &miss));
    }
}
