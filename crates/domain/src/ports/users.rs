use crate::DomainResult;
use crate::users::User;

pub trait UserRepository: Send + Sync {
    fn create(&self, user: &User) -> crate::ports::BoxFuture<'_, DomainResult<User>>;

    fn get(&self, user_id: &str) -> crate::ports::BoxFuture<'_, DomainResult<Option<User>>>;

    fn update(&self, user: &User) -> crate::ports::BoxFuture<'_, DomainResult<User>>;

    fn find_by_phone(
        &self,
        phone: &str,
    ) -> crate::ports::BoxFuture<'_, DomainResult<Option<User>>>;

    /// Atomic counter adjustment of the freemium posting quota.
    fn adjust_free_jobs(
        &self,
        user_id: &str,
        delta: i64,
    ) -> crate::ports::BoxFuture<'_, DomainResult<User>>;
}
