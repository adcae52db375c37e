//! Unit and integration tests for the Ablage client.
//!
//! ## Test Modules
//!
//! - **sanitize_tests**: Filename sanitization and its idempotence
//! - **validation_tests**: Pre-upload checks of a selection
//! - **transfer_tests**: Sequencer state machine, progress math, batch runs
//! - **directory_tests**: Listing reconciliation, sinkhole/readonly, delete
//! - **view_tests**: Formatting, notices and the view model projection
//! - **config_tests**: Settings loading and validation
//! - **api_tests**: The `reqwest` store against an in-process axum server
//! - **error_tests**: Error display and user-facing messages
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test
//! cargo test transfer_tests
//! ```

pub mod directory_tests;
pub mod error_tests;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{ApiError, ProgressSender, RemoteStore};
use crate::types::{Endpoints, Modes, RemoteConfig, RemoteFileRecord, UrlTemplate};
use crate::validation::BatchEntry;

pub fn remote_config(readonly: bool, sinkhole: bool) -> RemoteConfig {
    RemoteConfig {
        modes: Modes { readonly, sinkhole },
        endpoints: Endpoints {
            list: UrlTemplate::new("/files/"),
            get: UrlTemplate::new("/files/get/:filename"),
            delete: UrlTemplate::new("/files/delete/:filename"),
            upload: UrlTemplate::new("/upload/"),
        },
    }
}

pub fn record(name: &str, size: u64) -> RemoteFileRecord {
    RemoteFileRecord { name: name.to_string(), size }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchConfig,
    List(String),
    Delete(String),
    Upload(String),
}

/// Scripted in-memory [`RemoteStore`].
///
/// Uploads answer with the next scripted result (200 when the script is
/// empty); successful uploads show up in later listings.
pub struct MockStore {
    config: Mutex<Option<RemoteConfig>>,
    files: Mutex<Vec<RemoteFileRecord>>,
    list_failure: Mutex<Option<u16>>,
    list_gate: Mutex<Option<Arc<Notify>>>,
    delete_failure: Mutex<Option<u16>>,
    upload_script: Mutex<VecDeque<Result<u16, String>>>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockStore {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config: Mutex::new(Some(config)),
            files: Mutex::new(Vec::new()),
            list_failure: Mutex::new(None),
            list_gate: Mutex::new(None),
            delete_failure: Mutex::new(None),
            upload_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_files(self, files: Vec<RemoteFileRecord>) -> Self {
        *self.files.lock().unwrap() = files;
        self
    }

    pub fn set_config(&self, config: Option<RemoteConfig>) {
        *self.config.lock().unwrap() = config;
    }

    pub fn set_files(&self, files: Vec<RemoteFileRecord>) {
        *self.files.lock().unwrap() = files;
    }

    pub fn fail_list(&self, status: Option<u16>) {
        *self.list_failure.lock().unwrap() = status;
    }

    /// The next list call answers with the files of that moment, but only
    /// after the returned handle is notified.
    pub fn hold_next_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fail_delete(&self, status: Option<u16>) {
        *self.delete_failure.lock().unwrap() = status;
    }

    pub fn script_uploads(&self, results: Vec<Result<u16, String>>) {
        *self.upload_script.lock().unwrap() = results.into();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::List(_))).count()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn fetch_config(&self) -> Result<RemoteConfig, ApiError> {
        self.log(Call::FetchConfig);
        self.config.lock().unwrap().clone().ok_or(ApiError::Status(503))
    }

    async fn list_files(&self, path: &str) -> Result<Vec<RemoteFileRecord>, ApiError> {
        self.log(Call::List(path.to_string()));
        if let Some(status) = *self.list_failure.lock().unwrap() {
            return Err(ApiError::Status(status));
        }
        let files = self.files.lock().unwrap().clone();
        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(files)
    }

    async fn delete_file(&self, path: &str) -> Result<(), ApiError> {
        self.log(Call::Delete(path.to_string()));
        if let Some(status) = *self.delete_failure.lock().unwrap() {
            return Err(ApiError::Status(status));
        }
        let name = path.rsplit('/').next().unwrap_or_default();
        let name = urlencoding::decode(name).unwrap().into_owned();
        self.files.lock().unwrap().retain(|r| r.name != name);
        Ok(())
    }

    async fn upload_file(
        &self,
        _path: &str,
        entry: &BatchEntry,
        progress: ProgressSender,
    ) -> Result<u16, ApiError> {
        self.log(Call::Upload(entry.sanitized_name.clone()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        progress.send_replace(entry.file.size / 2);
        tokio::task::yield_now().await;
        progress.send_replace(entry.file.size);
        tokio::task::yield_now().await;

        let result = self.upload_script.lock().unwrap().pop_front().unwrap_or(Ok(200));
        if result == Ok(200) {
            self.files.lock().unwrap().push(record(&entry.sanitized_name, entry.file.size));
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map_err(ApiError::Transport)
    }
}
