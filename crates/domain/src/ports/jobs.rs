use crate::DomainResult;
use crate::jobs::{Job, JobFilter, JobStatus};

pub trait JobRepository: Send + Sync {
    fn create(&self, job: &Job) -> crate::ports::BoxFuture<'_, DomainResult<Job>>;

    fn get(&self, job_id: &str) -> crate::ports::BoxFuture<'_, DomainResult<Option<Job>>>;

    /// Active postings matching the filter, newest first, up to `limit`.
    fn list_active(
        &self,
        filter: &JobFilter,
        limit: usize,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Vec<Job>>>;

    fn list_by_employer(
        &self,
        employer_id: &str,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Vec<Job>>>;

    /// Returns false when no posting carries `job_id`.
    fn set_status(
        &self,
        job_id: &str,
        status: JobStatus,
    ) -> crate::ports::BoxFuture<'_, DomainResult<bool>>;

    fn increment_applications(
        &self,
        job_id: &str,
    ) -> crate::ports::BoxFuture<'_, DomainResult<()>>;
}
