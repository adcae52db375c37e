//! Sequential batch upload with progress aggregated over the whole batch.
//!
//! [`TransferSequencer`] is the state machine (`NotStarted → Sending(i) →
//! Done`); [`run_batch`] drives it against a [`RemoteStore`]. Exactly one
//! file is in flight at any time: the next transfer only starts after the
//! previous one settled, whatever its outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, RemoteStore};
use crate::error::AppError;
use crate::format::{fmt_eta, fmt_speed, fmt_total_mb};
use crate::validation::{BatchEntry, UploadBatch};

/// Terminal result of a single file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileOutcome {
    Success,
    Conflict,
    OtherFailure { status: u16 },
    TransportError { message: String },
}

impl FileOutcome {
    pub fn from_response(result: Result<u16, ApiError>) -> Self {
        match result {
            Ok(200) => FileOutcome::Success,
            Ok(409) => FileOutcome::Conflict,
            Ok(status) => FileOutcome::OtherFailure { status },
            Err(e) => FileOutcome::TransportError { message: e.to_string() },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success)
    }

    /// The error to surface for a failed file, `None` on success.
    pub fn to_error(&self, name: &str) -> Option<AppError> {
        match self {
            FileOutcome::Success => None,
            FileOutcome::Conflict => Some(AppError::UploadConflict { name: name.to_string() }),
            FileOutcome::OtherFailure { status } => {
                Some(AppError::UploadFailed { name: name.to_string(), status: *status })
            }
            FileOutcome::TransportError { message } => Some(AppError::UploadTransportError {
                name: name.to_string(),
                message: message.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    NotStarted,
    Sending(usize),
    Done,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("a transfer is still in flight")]
    TransferInFlight,
    #[error("no transfer in flight")]
    NothingInFlight,
}

/// Byte counters of a running batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_completed_prior_files: u64,
    pub current_file_bytes_sent: u64,
    pub total_batch_bytes: u64,
    pub started_at: Instant,
}

impl TransferProgress {
    pub fn uploaded(&self) -> u64 {
        self.bytes_completed_prior_files + self.current_file_bytes_sent
    }
}

/// Derived figures for display, computed from one progress event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub uploaded: u64,
    pub total: u64,
    pub percent: f64,
    pub elapsed: Duration,
    /// Bytes per second over the whole batch so far.
    pub speed: f64,
    /// Infinite while the speed is unknown.
    pub eta_seconds: f64,
}

impl ProgressSnapshot {
    pub fn compute(uploaded: u64, total: u64, elapsed: Duration) -> Self {
        let percent = if total == 0 { 100.0 } else { uploaded as f64 / total as f64 * 100.0 };
        let secs = elapsed.as_secs_f64();
        let speed = if secs > 0.0 { uploaded as f64 / secs } else { 0.0 };
        let eta_seconds =
            if speed > 0.0 { total.saturating_sub(uploaded) as f64 / speed } else { f64::INFINITY };
        Self { uploaded, total, percent, elapsed, speed, eta_seconds }
    }

    pub fn status_text(&self) -> String {
        format!(
            "{:.1}% ({} total) — Speed: {}, Est. time left: {}",
            self.percent,
            fmt_total_mb(self.total),
            fmt_speed(self.speed),
            fmt_eta(self.eta_seconds)
        )
    }
}

/// Outcome of one file, in batch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub index: usize,
    pub raw_name: String,
    pub sanitized_name: String,
    pub size: u64,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub all_succeeded: bool,
    pub files: Vec<FileReport>,
}

impl BatchOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.outcome.is_success())
    }

    pub fn succeeded_bytes(&self) -> u64 {
        self.files.iter().filter(|f| f.outcome.is_success()).map(|f| f.size).sum()
    }
}

pub struct TransferSequencer {
    batch: Arc<UploadBatch>,
    state: SequencerState,
    in_flight: bool,
    progress: TransferProgress,
    all_succeeded: bool,
    reports: Vec<FileReport>,
}

impl TransferSequencer {
    pub fn new(batch: Arc<UploadBatch>, started_at: Instant) -> Self {
        let progress = TransferProgress {
            bytes_completed_prior_files: 0,
            current_file_bytes_sent: 0,
            total_batch_bytes: batch.total_bytes(),
            started_at,
        };
        let reports = Vec::with_capacity(batch.len());
        Self { batch, state: SequencerState::NotStarted, in_flight: false, progress, all_succeeded: true, reports }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn progress(&self) -> &TransferProgress {
        &self.progress
    }

    pub fn current_entry(&self) -> Option<&BatchEntry> {
        match self.state {
            SequencerState::Sending(i) if self.in_flight => self.batch.entries().get(i),
            _ => None,
        }
    }

    /// Moves to the next file and marks it in flight.
    ///
    /// `Ok(None)` once every file has settled.
    pub fn next_transfer(&mut self) -> Result<Option<usize>, SequenceError> {
        if self.in_flight {
            return Err(SequenceError::TransferInFlight);
        }
        let next = match self.state {
            SequencerState::NotStarted => 0,
            SequencerState::Sending(i) => i + 1,
            SequencerState::Done => return Ok(None),
        };
        if next >= self.batch.len() {
            self.state = SequencerState::Done;
            return Ok(None);
        }
        self.state = SequencerState::Sending(next);
        self.in_flight = true;
        self.progress.current_file_bytes_sent = 0;
        Ok(Some(next))
    }

    /// Records the cumulative bytes sent for the file in flight.
    ///
    /// Capped at the file's size; a lower value than already seen is ignored.
    pub fn record_progress(&mut self, sent: u64) -> Result<(), SequenceError> {
        let size = self.current_entry().map(|e| e.file.size).ok_or(SequenceError::NothingInFlight)?;
        let sent = sent.min(size);
        if sent > self.progress.current_file_bytes_sent {
            self.progress.current_file_bytes_sent = sent;
        }
        Ok(())
    }

    /// Settles the file in flight. Failures are recorded; the batch goes on.
    pub fn settle(&mut self, outcome: FileOutcome) -> Result<&FileReport, SequenceError> {
        let index = match self.state {
            SequencerState::Sending(i) if self.in_flight => i,
            _ => return Err(SequenceError::NothingInFlight),
        };
        let entry = &self.batch.entries()[index];

        // Only successful files count towards the completed total.
        if outcome.is_success() {
            self.progress.bytes_completed_prior_files += entry.file.size;
        } else {
            self.all_succeeded = false;
        }
        self.progress.current_file_bytes_sent = 0;
        self.in_flight = false;

        self.reports.push(FileReport {
            index,
            raw_name: entry.file.name.clone(),
            sanitized_name: entry.sanitized_name.clone(),
            size: entry.file.size,
            outcome,
        });
        Ok(&self.reports[self.reports.len() - 1])
    }

    pub fn snapshot(&self, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot::compute(self.progress.uploaded(), self.progress.total_batch_bytes, elapsed)
    }

    pub fn finish(self) -> BatchOutcome {
        BatchOutcome { all_succeeded: self.all_succeeded, files: self.reports }
    }
}

/// Hooks for whatever renders a running batch.
#[allow(unused_variables)]
pub trait TransferObserver: Send {
    fn batch_started(&mut self, batch: &UploadBatch) {}
    fn file_started(&mut self, index: usize, entry: &BatchEntry) {}
    fn progress(&mut self, snapshot: &ProgressSnapshot) {}
    fn file_settled(&mut self, report: &FileReport) {}
    fn batch_finished(&mut self, outcome: &BatchOutcome) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl TransferObserver for NoopObserver {}

/// Uploads every file of `batch` to `upload_path`, one after another.
///
/// Never fails as a whole: each file ends with its own [`FileOutcome`] and
/// nothing is retried.
pub async fn run_batch(
    store: &dyn RemoteStore,
    batch: UploadBatch,
    upload_path: &str,
    observer: &mut dyn TransferObserver,
) -> BatchOutcome {
    let batch = Arc::new(batch);
    let started = Instant::now();
    let mut seq = TransferSequencer::new(batch.clone(), started);

    info!(files = batch.len(), bytes = batch.total_bytes(), "upload batch started");
    observer.batch_started(&batch);

    loop {
        let index = match seq.next_transfer() {
            Ok(Some(i)) => i,
            Ok(None) => break,
            Err(e) => {
                error!("upload sequencing broken: {}", e);
                break;
            }
        };
        let entry = &batch.entries()[index];
        debug!(index, name = %entry.sanitized_name, size = entry.file.size, "sending file");
        observer.file_started(index, entry);

        let (tx, mut rx) = watch::channel(0u64);
        let upload = store.upload_file(upload_path, entry, tx);
        tokio::pin!(upload);

        let result = loop {
            tokio::select! {
                result = &mut upload => break result,
                changed = rx.changed() => match changed {
                    Ok(()) => {
                        let sent = *rx.borrow_and_update();
                        if seq.record_progress(sent).is_ok() {
                            observer.progress(&seq.snapshot(started.elapsed()));
                        }
                    }
                    // The body is fully handed over; only the response is left.
                    Err(_) => break (&mut upload).await,
                },
            }
        };

        match seq.settle(FileOutcome::from_response(result)) {
            Ok(report) => {
                if report.outcome.is_success() {
                    info!(name = %report.sanitized_name, size = report.size, "file uploaded");
                } else {
                    warn!(name = %report.raw_name, outcome = ?report.outcome, "file upload failed");
                }
                observer.file_settled(report);
            }
            Err(e) => error!("upload sequencing broken: {}", e),
        }
        observer.progress(&seq.snapshot(started.elapsed()));
    }

    let outcome = seq.finish();
    info!(all_succeeded = outcome.all_succeeded, elapsed_ms = started.elapsed().as_millis() as u64, "upload batch finished");
    observer.batch_finished(&outcome);
    outcome
}
