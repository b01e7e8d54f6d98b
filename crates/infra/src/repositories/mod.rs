mod memory;
mod surreal;

pub use memory::{
    InMemoryApplicationRepository, InMemoryJobRepository, InMemoryMessageRepository,
    InMemoryTransactionRepository, InMemoryUserRepository,
};
pub use surreal::{
    SurrealApplicationRepository, SurrealJobRepository, SurrealMessageRepository,
    SurrealTransactionRepository, SurrealUserRepository, connect,
};
