use std::sync::Arc;

use kormo_domain::ports::applications::ApplicationRepository;
use kormo_domain::ports::db::DbAdapter;
use kormo_domain::ports::jobs::JobRepository;
use kormo_domain::ports::messages::MessageRepository;
use kormo_domain::ports::payments::TransactionRepository;
use kormo_domain::ports::users::UserRepository;
use kormo_infra::config::AppConfig;
use kormo_infra::db::{DbConfig, MemoryAdapter, SurrealAdapter};
use kormo_infra::repositories::{
    InMemoryApplicationRepository, InMemoryJobRepository, InMemoryMessageRepository,
    InMemoryTransactionRepository, InMemoryUserRepository, SurrealApplicationRepository,
    SurrealJobRepository, SurrealMessageRepository, SurrealTransactionRepository,
    SurrealUserRepository, connect,
};

use crate::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub registry: ConnectionRegistry,
    pub adapter: Arc<dyn DbAdapter>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        if config.data_backend.eq_ignore_ascii_case("surreal") {
            let db_config = DbConfig::from_app_config(&config);
            let client = connect(&db_config).await?;
            return Ok(Self {
                users: Arc::new(SurrealUserRepository::with_client(client.clone())),
                jobs: Arc::new(SurrealJobRepository::with_client(client.clone())),
                applications: Arc::new(SurrealApplicationRepository::with_client(client.clone())),
                messages: Arc::new(SurrealMessageRepository::with_client(client.clone())),
                transactions: Arc::new(SurrealTransactionRepository::with_client(client)),
                registry: ConnectionRegistry::new(),
                adapter: Arc::new(SurrealAdapter::new(db_config)),
                config,
            });
        }

        Ok(Self::with_memory_backend(config))
    }

    pub fn with_memory_backend(config: AppConfig) -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            jobs: Arc::new(InMemoryJobRepository::new()),
            applications: Arc::new(InMemoryApplicationRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            transactions: Arc::new(InMemoryTransactionRepository::new()),
            registry: ConnectionRegistry::new(),
            adapter: Arc::new(MemoryAdapter),
            config,
        }
    }
}
