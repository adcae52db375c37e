use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::metrics::Metrics;
use crate::notice::{NoticeKind, StatusLine, StatusView};
use crate::types::{RemoteConfig, RemoteFileRecord};

/// The file set as last reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub records: Vec<RemoteFileRecord>,
    /// Names of `records`; the pre-upload collision shortcut.
    pub known: HashSet<String>,
    /// Ticket of the refresh that produced this listing.
    pub ticket: u64,
}

/// The shared client state.
///
/// Created once at startup and handed to every component. Cloning is cheap;
/// all clones see the same state. Only the config cache replaces the remote
/// config and only the directory view replaces the listing.
#[derive(Clone)]
pub struct AppContext {
    /// Local settings loaded at startup.
    pub settings: Arc<ClientConfig>,
    remote_config: Arc<RwLock<Option<RemoteConfig>>>,
    listing: Arc<RwLock<Listing>>,
    status: Arc<Mutex<StatusLine>>,
    tickets: Arc<AtomicU64>,
    /// Session counters.
    pub metrics: Metrics,
}

impl AppContext {
    pub fn new(settings: ClientConfig) -> Self {
        Self {
            settings: Arc::new(settings),
            remote_config: Arc::new(RwLock::new(None)),
            listing: Arc::new(RwLock::new(Listing::default())),
            status: Arc::new(Mutex::new(StatusLine::new())),
            tickets: Arc::new(AtomicU64::new(0)),
            metrics: Metrics::new(),
        }
    }

    /// The server config, or `None` while it is unavailable.
    pub async fn remote_config(&self) -> Option<RemoteConfig> {
        self.remote_config.read().await.clone()
    }

    pub(crate) async fn replace_remote_config(&self, config: Option<RemoteConfig>) {
        *self.remote_config.write().await = config;
    }

    pub async fn listing(&self) -> Listing {
        self.listing.read().await.clone()
    }

    pub async fn known_names(&self) -> HashSet<String> {
        self.listing.read().await.known.clone()
    }

    pub(crate) fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replaces records and known names in one step.
    ///
    /// Returns `false` (and changes nothing) when a refresh that started
    /// later has already been applied.
    pub(crate) async fn apply_listing(&self, ticket: u64, records: Vec<RemoteFileRecord>) -> bool {
        let mut listing = self.listing.write().await;
        if ticket < listing.ticket {
            return false;
        }
        let known = records.iter().map(|r| r.name.clone()).collect();
        *listing = Listing { records, known, ticket };
        true
    }

    pub fn notify_error(&self, text: impl Into<String>) {
        let duration = self.settings.notices.error_duration();
        self.show_notice(text.into(), NoticeKind::Error, duration);
    }

    pub fn notify_success(&self, text: impl Into<String>) {
        let duration = self.settings.notices.success_duration();
        self.show_notice(text.into(), NoticeKind::Success, duration);
    }

    fn show_notice(&self, text: String, kind: NoticeKind, duration: std::time::Duration) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        status.show(text, kind, duration, Instant::now());
    }

    pub fn status(&self, now: Instant) -> StatusView {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).view(now)
    }
}
