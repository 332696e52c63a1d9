use std::sync::Arc;

use async_trait::async_trait;
use config::Config;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{job_payment::JobPaymentService, payout::PayoutCalculator};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    job_payments: JobPaymentService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Config::from_env()?;
        Self::with_config(config).await
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn job_payments(&self) -> &JobPaymentService {
        &self.job_payments
    }
}

impl LocalDeployment {
    pub async fn with_config(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        Ok(Self::from_parts(config, db))
    }

    pub fn from_parts(config: Config, db: DBService) -> Self {
        tracing::info!(company_cut = config.company_cut, "Payout calculator configured");
        let job_payments = JobPaymentService::new(PayoutCalculator::new(config.company_cut));
        Self {
            config: Arc::new(config),
            db,
            job_payments,
        }
    }
}
