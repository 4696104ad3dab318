//! Delivery of timesheet batches to `sync-time-in-out/`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use punchsync_core::sync::friendly_http_error;
use punchsync_core::{BatchTransport, PushCredentialStore, TokenProvider};
use punchsync_domain::constants::{DEFAULT_PAYROLL_BASE_URL, PUSH_TIMEOUT_SECS, SYNC_PATH};
use punchsync_domain::{BatchEntry, BatchOutcome, PunchSyncError, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response};
use tracing::{debug, error, info, instrument, warn};

use super::wire::{SyncRequest, SyncResponse};
use crate::http::HttpClient;

pub struct HttpBatchTransport {
    http: HttpClient,
    store: Arc<dyn PushCredentialStore>,
    tokens: Arc<dyn TokenProvider>,
    push_timeout: Duration,
}

impl HttpBatchTransport {
    pub fn new(
        http: HttpClient,
        store: Arc<dyn PushCredentialStore>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self { http, store, tokens, push_timeout: Duration::from_secs(PUSH_TIMEOUT_SECS) }
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    async fn sync_url(&self) -> Result<String> {
        let base_url = self
            .store
            .get_api_config()
            .await?
            .map_or_else(|| DEFAULT_PAYROLL_BASE_URL.to_string(), |config| config.base_url());
        Ok(format!("{base_url}/{SYNC_PATH}"))
    }

    async fn post(&self, url: &str, token: &str, batch: &[BatchEntry]) -> Result<Response> {
        let request = self
            .http
            .request(Method::POST, url)
            .header(AUTHORIZATION, format!("Token {token}"))
            .json(&SyncRequest::new(batch))
            .timeout(self.push_timeout);
        self.http.send(request).await
    }

    /// One re-authentication and one retry of the same batch.
    async fn retry_after_reauth(&self, url: &str, batch: &[BatchEntry]) -> BatchOutcome {
        warn!("payroll token rejected, re-authenticating");

        if let Err(err) = self.tokens.invalidate().await {
            warn!(error = %err, "failed to clear rejected token");
        }

        let token = match self.tokens.authenticate(None).await {
            Ok(token) => token.token,
            Err(err) => return fatal(err.user_message()),
        };

        let response = match self.post(url, &token, batch).await {
            Ok(response) => response,
            Err(err) => return transport_failure(&err),
        };

        let status = response.status().as_u16();
        if status == 200 {
            return partial_from_response(response).await;
        }

        error!(status, "retry after re-authentication failed");
        fatal(&format!("Authentication failed after retry: {}", friendly_http_error(status)))
    }
}

#[async_trait]
impl BatchTransport for HttpBatchTransport {
    #[instrument(skip(self, token, batch), fields(entries = batch.len()))]
    async fn send(&self, token: &str, batch: &[BatchEntry]) -> BatchOutcome {
        let url = match self.sync_url().await {
            Ok(url) => url,
            Err(err) => return fatal(err.user_message()),
        };

        info!("pushing batch to payroll service");

        let response = match self.post(&url, token, batch).await {
            Ok(response) => response,
            Err(err) => return transport_failure(&err),
        };

        match response.status().as_u16() {
            200 => partial_from_response(response).await,
            400 => {
                let body = response.json::<SyncResponse>().await.unwrap_or_default();
                if body.logs_successfully_sync.is_empty() {
                    fatal(body.message.as_deref().unwrap_or("Bad request"))
                } else {
                    // Some records were stored despite the 400.
                    debug!(accepted = body.logs_successfully_sync.len(), "partial success on HTTP 400");
                    partial(body)
                }
            }
            401 => self.retry_after_reauth(&url, batch).await,
            status => {
                error!(status, "push batch failed");
                fatal(&friendly_http_error(status))
            }
        }
    }
}

fn partial(body: SyncResponse) -> BatchOutcome {
    BatchOutcome::Partial {
        synced: body.logs_successfully_sync,
        failed: body.logs_not_sync.into_iter().map(Into::into).collect(),
    }
}

async fn partial_from_response(response: Response) -> BatchOutcome {
    match response.json::<SyncResponse>().await {
        Ok(body) => partial(body),
        Err(err) => fatal(&format!("Invalid response from payroll server: {err}")),
    }
}

fn fatal(reason: &str) -> BatchOutcome {
    BatchOutcome::Fatal { reason: reason.to_string() }
}

fn transport_failure(err: &PunchSyncError) -> BatchOutcome {
    match err {
        PunchSyncError::Timeout(_) => {
            fatal("Request timed out - the payroll server took too long to respond")
        }
        PunchSyncError::Connection(_) => {
            fatal("Cannot connect to the payroll server - check your internet connection")
        }
        other => fatal(other.user_message()),
    }
}
