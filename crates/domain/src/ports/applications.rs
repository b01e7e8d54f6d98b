use crate::DomainResult;
use crate::applications::{Application, ApplicationStatus};

pub trait ApplicationRepository: Send + Sync {
    fn create(
        &self,
        application: &Application,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Application>>;

    fn find_by_job_and_seeker(
        &self,
        job_id: &str,
        seeker_id: &str,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Option<Application>>>;

    fn list_by_job(
        &self,
        job_id: &str,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Vec<Application>>>;

    fn list_by_seeker(
        &self,
        seeker_id: &str,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Vec<Application>>>;

    fn set_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
    ) -> crate::ports::BoxFuture<'_, DomainResult<bool>>;
}
