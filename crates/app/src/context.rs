//! Application context - wiring of the push engine

use std::sync::Arc;
use std::time::Duration;

use punchsync_core::{ProgressSink, PushCredentialStore, PushSyncService};
use punchsync_domain::{ApiConfig, Config, PayrollConfig, Result};
use punchsync_infra::{DbManager, HttpBatchTransport, HttpClient, PayrollTokenManager, SqliteSyncStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub store: Arc<SqliteSyncStore>,
    pub tokens: Arc<PayrollTokenManager>,
    pub transport: Arc<HttpBatchTransport>,
}

impl AppContext {
    /// Open the database, apply migrations and seed payroll settings.
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let store = Arc::new(SqliteSyncStore::new(Arc::clone(&db)));
        seed_api_config(&store, &config.payroll).await?;

        let http = HttpClient::new()?;

        let tokens = Arc::new(
            PayrollTokenManager::new(store.clone(), http.clone())
                .with_login_timeout(Duration::from_secs(config.payroll.login_timeout_secs)),
        );
        let transport = Arc::new(
            HttpBatchTransport::new(http, store.clone(), tokens.clone())
                .with_push_timeout(Duration::from_secs(config.payroll.push_timeout_secs)),
        );

        Ok(Self { config, db, store, tokens, transport })
    }

    pub fn push_service(
        &self,
        progress: Arc<dyn ProgressSink>,
        cancellation: CancellationToken,
    ) -> PushSyncService {
        PushSyncService::new(
            self.store.clone(),
            self.store.clone(),
            self.tokens.clone(),
            self.transport.clone(),
        )
        .with_config(&self.config.sync)
        .with_progress_sink(progress)
        .with_cancellation(cancellation)
    }
}

/// Values from the configuration win over what the store holds; unset values
/// keep the stored ones.
async fn seed_api_config(store: &SqliteSyncStore, payroll: &PayrollConfig) -> Result<()> {
    if payroll.push_url.is_none()
        && payroll.push_username.is_none()
        && payroll.push_password.is_none()
    {
        return Ok(());
    }

    let existing = store.get_api_config().await?.unwrap_or_default();
    let merged = ApiConfig {
        push_url: payroll.push_url.clone().or_else(|| existing.push_url.clone()),
        push_username: payroll.push_username.clone().or_else(|| existing.push_username.clone()),
        push_password: payroll.push_password.clone().or_else(|| existing.push_password.clone()),
    };

    if merged != existing {
        store.save_api_config(&merged).await?;
        info!(push_url = ?merged.push_url, "payroll settings updated from configuration");
    }
    Ok(())
}
