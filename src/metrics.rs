use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Session counters, logged when a command finishes
#[derive(Clone)]
pub struct Metrics {
    pub batches_started: Arc<AtomicUsize>,
    pub batches_rejected: Arc<AtomicUsize>,
    pub files_uploaded: Arc<AtomicUsize>,
    pub files_failed: Arc<AtomicUsize>,
    pub bytes_uploaded: Arc<AtomicU64>,
    pub list_refreshes: Arc<AtomicUsize>,
    pub list_failures: Arc<AtomicUsize>,
    pub deletes: Arc<AtomicUsize>,
    pub config_failures: Arc<AtomicUsize>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            batches_started: Arc::new(AtomicUsize::new(0)),
            batches_rejected: Arc::new(AtomicUsize::new(0)),
            files_uploaded: Arc::new(AtomicUsize::new(0)),
            files_failed: Arc::new(AtomicUsize::new(0)),
            bytes_uploaded: Arc::new(AtomicU64::new(0)),
            list_refreshes: Arc::new(AtomicUsize::new(0)),
            list_failures: Arc::new(AtomicUsize::new(0)),
            deletes: Arc::new(AtomicUsize::new(0)),
            config_failures: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_batches_started(&self) {
        self.batches_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_batches_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload(&self, bytes: u64) {
        self.files_uploaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn inc_files_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_list_refreshes(&self) {
        self.list_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_list_failures(&self) {
        self.list_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_config_failures(&self) {
        self.config_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_started: self.batches_started.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            list_refreshes: self.list_refreshes.load(Ordering::Relaxed),
            list_failures: self.list_failures.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            config_failures: self.config_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub batches_started: usize,
    pub batches_rejected: usize,
    pub files_uploaded: usize,
    pub files_failed: usize,
    pub bytes_uploaded: u64,
    pub list_refreshes: usize,
    pub list_failures: usize,
    pub deletes: usize,
    pub config_failures: usize,
    pub uptime_seconds: u64,
}
