//! Shared test helpers for `punchsync-core` integration tests.
//!
//! Lightweight in-memory mocks so that push sync tests can focus on behaviour
//! instead of boilerplate.

#![allow(dead_code)]

pub mod payroll;
pub mod repositories;

use std::sync::Arc;

use punchsync_core::PushSyncService;
use punchsync_domain::SyncProgress;
use tokio::sync::mpsc;

pub use payroll::{accept_all, reject_one, MockTokenProvider, ScriptedTransport, SentBatch};
pub use repositories::{backlog, timesheet, MemoryStore};

/// Everything a scenario needs to drive and inspect one push run.
pub struct Harness {
    pub store: MemoryStore,
    pub tokens: MockTokenProvider,
    pub transport: ScriptedTransport,
    pub progress: mpsc::UnboundedReceiver<SyncProgress>,
    pub service: PushSyncService,
}

impl Harness {
    pub fn new(store: MemoryStore, transport: ScriptedTransport) -> Self {
        let tokens = MockTokenProvider::new(store.clone());
        Self::with_tokens(store, tokens, transport)
    }

    pub fn with_tokens(
        store: MemoryStore,
        tokens: MockTokenProvider,
        transport: ScriptedTransport,
    ) -> Self {
        let (tx, progress) = mpsc::unbounded_channel();
        let service = PushSyncService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(tokens.clone()),
            Arc::new(transport.clone()),
        )
        .with_progress_sink(Arc::new(tx));

        Self { store, tokens, transport, progress, service }
    }

    /// Rebuild the service, e.g. to apply config or a cancellation token.
    pub fn map_service(mut self, f: impl FnOnce(PushSyncService) -> PushSyncService) -> Self {
        self.service = f(self.service);
        self
    }

    /// Drain every progress event emitted so far.
    pub fn progress_events(&mut self) -> Vec<SyncProgress> {
        let mut events = Vec::new();
        while let Ok(event) = self.progress.try_recv() {
            events.push(event);
        }
        events
    }
}
