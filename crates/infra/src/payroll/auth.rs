//! Payroll login and token caching

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use punchsync_core::sync::friendly_http_error;
use punchsync_core::{PushCredentialStore, TokenProvider};
use punchsync_domain::constants::{DEFAULT_PAYROLL_BASE_URL, LOGIN_PATH, LOGIN_TIMEOUT_SECS};
use punchsync_domain::{AuthToken, Credentials, PunchSyncError, Result};
use reqwest::Method;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::wire::{LoginRequest, LoginResponse};
use crate::http::HttpClient;

/// Issues payroll tokens and caches them in the local store.
///
/// Tokens carry no expiry; a cached token is trusted until the service answers
/// 401, at which point the batch transport invalidates it.
pub struct PayrollTokenManager {
    store: Arc<dyn PushCredentialStore>,
    http: HttpClient,
    login_timeout: Duration,
    // Serializes read-authenticate-write so callers never log in twice.
    lock: Mutex<()>,
}

impl PayrollTokenManager {
    pub fn new(store: Arc<dyn PushCredentialStore>, http: HttpClient) -> Self {
        Self {
            store,
            http,
            login_timeout: Duration::from_secs(LOGIN_TIMEOUT_SECS),
            lock: Mutex::new(()),
        }
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    async fn authenticate_locked(&self, credentials: Option<Credentials>) -> Result<AuthToken> {
        let config = self.store.get_api_config().await?;

        let credentials = match credentials {
            Some(credentials) => credentials,
            None => config
                .as_ref()
                .ok_or_else(|| PunchSyncError::Config("API configuration not found".into()))?
                .credentials()
                .ok_or_else(|| {
                    PunchSyncError::Config("Payroll credentials not configured".into())
                })?,
        };

        let base_url = config
            .as_ref()
            .map_or_else(|| DEFAULT_PAYROLL_BASE_URL.to_string(), |config| config.base_url());
        let login_url = format!("{base_url}/{LOGIN_PATH}");

        info!(username = %credentials.username, "authenticating to payroll service");

        // The login endpoint reads credentials from both the query string and the body.
        let request = self
            .http
            .request(Method::POST, &login_url)
            .query(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .timeout(self.login_timeout);

        let response = self.http.send(request).await.map_err(login_transport_error)?;
        let status = response.status().as_u16();

        match status {
            200 => {
                let body: LoginResponse = response.json().await.map_err(|err| {
                    PunchSyncError::Auth(format!("Login failed: invalid response body ({err})"))
                })?;

                let token = body
                    .token
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| PunchSyncError::Auth("No token in response".into()))?;

                self.store.update_push_token(Some(&token), body.user_logged.as_deref()).await?;

                info!(
                    user = body.user_logged.as_deref().unwrap_or("-"),
                    company = body.company_name.as_deref().unwrap_or("-"),
                    "payroll authentication successful"
                );

                Ok(AuthToken { token, user_logged: body.user_logged, company_name: body.company_name })
            }
            401 => {
                let message = response
                    .json::<LoginResponse>()
                    .await
                    .ok()
                    .and_then(|body| body.message)
                    .unwrap_or_else(|| "Invalid credentials".to_string());
                warn!(%message, "payroll login rejected");
                Err(PunchSyncError::Auth(format!("Login failed: {message}")))
            }
            other => {
                warn!(status = other, "payroll login failed");
                Err(PunchSyncError::Auth(format!("Login failed: {}", friendly_http_error(other))))
            }
        }
    }
}

fn login_transport_error(err: PunchSyncError) -> PunchSyncError {
    match err {
        PunchSyncError::Timeout(_) => PunchSyncError::Timeout(
            "Login timed out - the payroll server is not responding".into(),
        ),
        PunchSyncError::Connection(_) => PunchSyncError::Connection(
            "Cannot connect to the payroll server - check your internet connection and URL".into(),
        ),
        other => other,
    }
}

#[async_trait]
impl TokenProvider for PayrollTokenManager {
    #[instrument(skip(self))]
    async fn valid_token(&self) -> Result<String> {
        let _guard = self.lock.lock().await;

        if let Some(token) = self.store.get_push_token().await?.filter(|t| !t.is_empty()) {
            debug!("using cached payroll token");
            return Ok(token);
        }

        info!("no cached payroll token, authenticating");
        Ok(self.authenticate_locked(None).await?.token)
    }

    #[instrument(skip(self, credentials))]
    async fn authenticate(&self, credentials: Option<Credentials>) -> Result<AuthToken> {
        let _guard = self.lock.lock().await;
        self.authenticate_locked(credentials).await
    }

    async fn invalidate(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.update_push_token(None, None).await?;
        info!("payroll token invalidated");
        Ok(())
    }
}
