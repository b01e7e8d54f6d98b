use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod applications;
pub mod db;
pub mod jobs;
pub mod messages;
pub mod payments;
pub mod users;
