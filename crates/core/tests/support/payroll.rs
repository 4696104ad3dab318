//! Scripted stand-ins for the payroll token endpoint and batch transport

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use punchsync_core::{BatchTransport, PushCredentialStore, TokenProvider};
use punchsync_domain::{
    AuthToken, BatchEntry, BatchOutcome, Credentials, PunchSyncError, RejectedRecord,
    Result as DomainResult,
};
use tokio::sync::Mutex as TokioMutex;

use super::repositories::MemoryStore;

/// Token provider that caches in a [`MemoryStore`] and counts logins.
#[derive(Clone)]
pub struct MockTokenProvider {
    store: MemoryStore,
    auth_calls: Arc<AtomicUsize>,
    failure: Option<PunchSyncError>,
}

impl MockTokenProvider {
    pub fn new(store: MemoryStore) -> Self {
        Self { store, auth_calls: Arc::new(AtomicUsize::new(0)), failure: None }
    }

    pub fn failing_with(mut self, err: PunchSyncError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn valid_token(&self) -> DomainResult<String> {
        if let Some(token) = self.store.get_push_token().await? {
            return Ok(token);
        }
        Ok(self.authenticate(None).await?.token)
    }

    async fn authenticate(&self, _credentials: Option<Credentials>) -> DomainResult<AuthToken> {
        let call = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let token = format!("token-{call}");
        self.store.update_push_token(Some(&token), Some("HR Admin")).await?;
        Ok(AuthToken { token, user_logged: Some("HR Admin".into()), company_name: None })
    }

    async fn invalidate(&self) -> DomainResult<()> {
        self.store.update_push_token(None, None).await
    }
}

type Script = Box<dyn Fn(&[BatchEntry]) -> BatchOutcome + Send + Sync>;

/// Plays back one scripted outcome per batch, accepting everything once the
/// script runs out.
#[derive(Default, Clone)]
pub struct ScriptedTransport {
    scripts: Arc<TokioMutex<VecDeque<Script>>>,
    sent: Arc<TokioMutex<Vec<SentBatch>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentBatch {
    pub token: String,
    pub ids: Vec<i64>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, script: impl Fn(&[BatchEntry]) -> BatchOutcome + Send + Sync + 'static) -> Self {
        self.scripts.try_lock().expect("fresh transport lock").push_back(Box::new(script));
        self
    }

    pub fn then_accept_all(self) -> Self {
        self.then(accept_all)
    }

    pub fn then_fatal(self, reason: &'static str) -> Self {
        self.then(move |_| BatchOutcome::Fatal { reason: reason.to_string() })
    }

    pub async fn sent(&self) -> Vec<SentBatch> {
        self.sent.lock().await.clone()
    }
}

pub fn accept_all(batch: &[BatchEntry]) -> BatchOutcome {
    BatchOutcome::Partial { synced: batch.iter().map(|e| e.id).collect(), failed: Vec::new() }
}

/// Accept everything except `rejected_id`, which fails with `error_code`.
pub fn reject_one(rejected_id: i64, error_code: i64) -> impl Fn(&[BatchEntry]) -> BatchOutcome {
    move |batch: &[BatchEntry]| BatchOutcome::Partial {
        synced: batch.iter().map(|e| e.id).filter(|id| *id != rejected_id).collect(),
        failed: vec![RejectedRecord {
            id: rejected_id,
            error_code,
            reason: "Unknown error".into(),
        }],
    }
}

#[async_trait]
impl BatchTransport for ScriptedTransport {
    async fn send(&self, token: &str, batch: &[BatchEntry]) -> BatchOutcome {
        self.sent
            .lock()
            .await
            .push(SentBatch { token: token.to_string(), ids: batch.iter().map(|e| e.id).collect() });

        match self.scripts.lock().await.pop_front() {
            Some(script) => script(batch),
            None => accept_all(batch),
        }
    }
}
