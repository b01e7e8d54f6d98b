pub mod applications;
pub mod error;
pub mod jobs;
pub mod messaging;
pub mod payments;
pub mod ports;
pub mod users;
pub mod util;

pub type DomainResult<T> = Result<T, error::DomainError>;
