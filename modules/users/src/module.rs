use std::sync::Arc;

use axum::Router;
use tracing::{debug, info};
use userbase_db::DbHandle;

use crate::api::rest::routes;
use crate::config::UsersConfig;
use crate::domain::repo::UsersRepository;
use crate::domain::service::Service;
use crate::infra::storage::schema::ensure_schema;
use crate::infra::storage::SqliteUsersRepository;

/// The users module: repository, domain service and REST routes wired together.
#[derive(Clone)]
pub struct UsersModule {
    service: Arc<Service>,
}

impl UsersModule {
    pub const NAME: &'static str = "users";

    /// Bootstrap the schema (if enabled) and wire the SQLite repository.
    pub async fn init(db: DbHandle, cfg: &UsersConfig) -> anyhow::Result<Self> {
        info!("Initializing users module");
        debug!("Loaded users config: bootstrap_schema={}", cfg.bootstrap_schema);

        if cfg.bootstrap_schema {
            ensure_schema(&db).await?;
        }

        let repo = SqliteUsersRepository::new(db);
        Ok(Self::with_repository(Arc::new(repo)))
    }

    /// Wire the module over any repository implementation.
    pub fn with_repository(repo: Arc<dyn UsersRepository>) -> Self {
        Self {
            service: Arc::new(Service::new(repo)),
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn register_rest(&self, router: Router) -> Router {
        info!("Registering users REST routes");
        routes::register_routes(router, self.service.clone())
    }
}
