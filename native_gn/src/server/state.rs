//! Shared application state: the lobby registry, timers and counters.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use gn_shared::PlayerId;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::bot::BotRegistry;
use crate::config::Config;
use crate::server::lobby::Lobby;

/// Shared application state exposed to handlers. Each lobby sits behind its
/// own `RwLock`; taking the write lock is the per-lobby serialized executor,
/// so independent lobbies run in parallel while a single lobby's mutations
/// never interleave.
#[derive(Clone)]
pub struct AppState {
    pub lobbies: Arc<RwLock<HashMap<String, Arc<RwLock<Lobby>>>>>,
    pub config: Arc<RwLock<Config>>,
    pub config_path: Option<PathBuf>,
    pub bots: Arc<BotRegistry>,
    pub timers: Arc<TimerStore>,
    next_conn: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        AppState {
            lobbies: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(RwLock::new(config)),
            config_path,
            bots: Arc::new(BotRegistry::new()),
            timers: Arc::new(TimerStore::default()),
            next_conn: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Fresh transient identity for a connection or a bot.
    pub fn next_conn_id(&self) -> PlayerId {
        PlayerId(self.next_conn.fetch_add(1, Ordering::Relaxed))
    }

    pub async fn lobby(&self, slug: &str) -> Option<Arc<RwLock<Lobby>>> {
        self.lobbies.read().await.get(slug).cloned()
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new(Config::default(), None)
    }
}

#[derive(Default)]
struct LobbyTimers {
    reveal: Option<JoinHandle<()>>,
    cleanup: Option<JoinHandle<()>>,
    bots: Vec<JoinHandle<()>>,
}

/// All scheduled work, keyed by lobby slug: the reveal delay, the deferred
/// lobby cleanup, and one timer per pending bot action. Arming a slot
/// aborts whatever was armed before, so a superseded plan's callbacks
/// become no-ops.
#[derive(Default)]
pub struct TimerStore {
    inner: Mutex<HashMap<String, LobbyTimers>>,
}

impl TimerStore {
    fn with_entry<R>(&self, slug: &str, f: impl FnOnce(&mut LobbyTimers) -> R) -> R {
        let mut inner = self.inner.lock().expect("timer store poisoned");
        f(inner.entry(slug.to_owned()).or_default())
    }

    pub fn set_reveal(&self, slug: &str, handle: JoinHandle<()>) {
        self.with_entry(slug, |t| {
            if let Some(old) = t.reveal.replace(handle) {
                old.abort();
            }
        });
    }

    pub fn set_cleanup(&self, slug: &str, handle: JoinHandle<()>) {
        self.with_entry(slug, |t| {
            if let Some(old) = t.cleanup.replace(handle) {
                old.abort();
            }
        });
    }

    pub fn cancel_cleanup(&self, slug: &str) {
        self.with_entry(slug, |t| {
            if let Some(old) = t.cleanup.take() {
                old.abort();
            }
        });
    }

    pub fn replace_bot_timers(&self, slug: &str, handles: Vec<JoinHandle<()>>) {
        self.with_entry(slug, |t| {
            for old in t.bots.drain(..) {
                old.abort();
            }
            t.bots = handles;
        });
    }

    /// Drop every timer for a lobby. Called when the lobby is destroyed.
    pub fn cleanup_lobby(&self, slug: &str) {
        let mut inner = self.inner.lock().expect("timer store poisoned");
        if let Some(timers) = inner.remove(slug) {
            if let Some(h) = timers.reveal {
                h.abort();
            }
            if let Some(h) = timers.cleanup {
                h.abort();
            }
            for h in timers.bots {
                h.abort();
            }
        }
    }

    /// Registry-wide teardown on shutdown.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().expect("timer store poisoned");
        for (_, timers) in inner.drain() {
            if let Some(h) = timers.reveal {
                h.abort();
            }
            if let Some(h) = timers.cleanup {
                h.abort();
            }
            for h in timers.bots {
                h.abort();
            }
        }
    }
}
