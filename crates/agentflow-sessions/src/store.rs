use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::RwLock;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use agentflow_types::error::{Error, Result};
use agentflow_types::session::Session;

/// Options passed to `SessionStore::create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Caller-supplied id. A fresh UUID is minted when absent.
    pub id: Option<String>,
    /// Wall-clock duration from creation after which the session expires.
    pub ttl: Option<StdDuration>,
    /// Arbitrary metadata seeded into the session's state map under a
    /// `"metadata"` key.
    pub metadata: Option<Value>,
}

/// The store contract every backend (in-memory, remote, persistent)
/// implements identically. All operations take a cancellation token so a
/// caller-side timeout can abort a slow remote call.
///
/// Ownership: a single-process store may return the live `Session`
/// instance it holds; a remote/persistent store MUST return an isolated
/// snapshot. Callers must not assume identity persists across `get` calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, opts: CreateOptions, cancel: &CancellationToken) -> Result<Session>;

    async fn get(&self, id: &str, cancel: &CancellationToken) -> Result<Session>;

    async fn save(&self, session: &Session, cancel: &CancellationToken) -> Result<()>;

    async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()>;

    async fn delete_expired(&self, cancel: &CancellationToken) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// How often the background sweeper scans for expired sessions.
const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(5 * 60);

/// Reference in-memory implementation: a concurrent map guarded by a
/// reader/writer lock (many concurrent `get`s, serialized mutation), with
/// a background task evicting expired sessions every five minutes.
///
/// Persists nothing across process restart — alternate bindings implement
/// the same trait against durable storage.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    sweeper_cancel: CancellationToken,
    sweeper: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Arc<Self> {
        let sessions: Arc<RwLock<HashMap<String, Session>>> = Arc::new(RwLock::new(HashMap::new()));
        let sweeper_cancel = CancellationToken::new();

        let store = Arc::new(Self {
            sessions: sessions.clone(),
            sweeper_cancel: sweeper_cancel.clone(),
            sweeper: parking_lot::Mutex::new(None),
        });

        let handle = tokio::spawn(Self::sweep_loop(sessions, sweeper_cancel));
        *store.sweeper.lock() = Some(handle);
        store
    }

    async fn sweep_loop(sessions: Arc<RwLock<HashMap<String, Session>>>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("session sweeper stopped");
                    return;
                }
                _ = interval.tick() => {
                    let evicted = Self::evict_expired(&sessions);
                    if evicted > 0 {
                        tracing::info!(evicted, "session sweeper evicted expired sessions");
                    }
                }
            }
        }
    }

    fn evict_expired(sessions: &RwLock<HashMap<String, Session>>) -> usize {
        let mut sessions = sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, opts: CreateOptions, _cancel: &CancellationToken) -> Result<Session> {
        let id = opts.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let ttl = opts.ttl.map(|d| Duration::from_std(d).unwrap_or(Duration::zero()));
        let mut session = Session::new(id.clone(), ttl);
        if let Some(metadata) = opts.metadata {
            session.state.insert("metadata".to_string(), metadata);
        }

        self.sessions.write().insert(id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: &str, _cancel: &CancellationToken) -> Result<Session> {
        let sessions = self.sessions.read();
        match sessions.get(id) {
            Some(s) if !s.is_expired() => Ok(s.clone()),
            _ => Err(Error::SessionNotFound(id.to_string())),
        }
    }

    async fn save(&self, session: &Session, _cancel: &CancellationToken) -> Result<()> {
        self.sessions.write().insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str, _cancel: &CancellationToken) -> Result<()> {
        self.sessions.write().remove(id);
        Ok(())
    }

    async fn delete_expired(&self, _cancel: &CancellationToken) -> Result<()> {
        Self::evict_expired(&self.sessions);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.sweeper_cancel.cancel();
        if let Some(handle) = self.sweeper.lock().take() {
            let _ = handle.await;
        }
        Ok(())
    }
}
