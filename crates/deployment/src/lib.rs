use async_trait::async_trait;
use config::{Config, ConfigError};
use db::{DBService, DbErr};
use services::services::job_payment::JobPaymentService;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Everything a request handler needs, shared across the router as state.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    /// Reads configuration from the environment and opens the database.
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn job_payments(&self) -> &JobPaymentService;
}
