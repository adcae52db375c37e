//! Wires the components together: initial load, upload and delete flows,
//! and the two refresh timers.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::{interval_at, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::RemoteStore;
use crate::config_cache::ConfigCache;
use crate::directory::{Confirm, DeleteOutcome, DirectoryView, RefreshOutcome};
use crate::error::{AppError, AppResult};
use crate::state::AppContext;
use crate::transfer::{run_batch, BatchOutcome, FileReport, ProgressSnapshot, TransferObserver};
use crate::types::RemoteConfig;
use crate::validation::{validate, BatchEntry, PendingFile, UploadBatch};
use crate::view::{self, ProgressView, ViewModel};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Upload successful";

pub struct App {
    ctx: AppContext,
    store: Arc<dyn RemoteStore>,
    config_cache: ConfigCache,
    directory: DirectoryView,
}

impl App {
    pub fn new(ctx: AppContext, store: Arc<dyn RemoteStore>) -> Self {
        let config_cache = ConfigCache::new(ctx.clone(), store.clone());
        let directory = DirectoryView::new(ctx.clone(), store.clone());
        Self { ctx, store, config_cache, directory }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn config_cache(&self) -> &ConfigCache {
        &self.config_cache
    }

    pub fn directory(&self) -> &DirectoryView {
        &self.directory
    }

    /// Loads the server config, then the listing.
    pub async fn init(&self) -> AppResult<RemoteConfig> {
        let config = self
            .config_cache
            .refresh()
            .await
            .ok_or_else(|| AppError::ConfigUnavailable(format!("GET {} failed", self.ctx.settings.server.config_path)))?;
        self.update().await;
        Ok(config)
    }

    /// Listing refresh as run by the timer; a no-op without config.
    pub async fn update(&self) -> RefreshOutcome {
        self.directory.refresh().await
    }

    pub async fn view(&self, progress: Option<ProgressView>) -> ViewModel {
        let config = self.ctx.remote_config().await;
        let listing = self.ctx.listing().await;
        view::project(config.as_ref(), &listing, progress, self.ctx.status(Instant::now()))
    }

    /// Validates and uploads one selection, then re-syncs the listing.
    ///
    /// A rejected selection transfers nothing. Once started, the batch runs
    /// to the end; failed files are reported in the outcome and as notices.
    pub async fn upload(
        &self,
        files: Vec<PendingFile>,
        observer: &mut dyn TransferObserver,
    ) -> AppResult<BatchOutcome> {
        if files.is_empty() {
            return Ok(BatchOutcome { all_succeeded: true, files: Vec::new() });
        }

        let config = self
            .ctx
            .remote_config()
            .await
            .ok_or_else(|| AppError::ConfigUnavailable("no server config loaded".to_string()))?;
        if config.modes.readonly {
            self.ctx.notify_error(AppError::ReadonlyMode.user_message());
            return Err(AppError::ReadonlyMode);
        }

        let known = self.ctx.known_names().await;
        let batch = match validate(files, &known) {
            Ok(batch) => batch,
            Err(rejection) => {
                self.ctx.metrics.inc_batches_rejected();
                let err = AppError::from(rejection);
                warn!("{}", err);
                self.ctx.notify_error(err.user_message());
                return Err(err);
            }
        };

        self.ctx.metrics.inc_batches_started();
        let mut notifying = NotifyingObserver { ctx: &self.ctx, inner: observer };
        let outcome = run_batch(self.store.as_ref(), batch, config.endpoints.upload.as_str(), &mut notifying).await;

        self.directory.refresh().await;
        if outcome.all_succeeded {
            self.ctx.notify_success(UPLOAD_SUCCESS_MESSAGE);
        }
        Ok(outcome)
    }

    pub async fn delete(&self, name: &str, confirm: &dyn Confirm) -> AppResult<DeleteOutcome> {
        self.directory.delete(name, confirm).await
    }

    /// Runs the config and listing timers until `shutdown` fires.
    ///
    /// `on_change` sees every view model that differs from the previous one.
    pub async fn run<F>(&self, shutdown: CancellationToken, mut on_change: F)
    where
        F: FnMut(&ViewModel) + Send,
    {
        let refresh = &self.ctx.settings.refresh;
        let now = tokio::time::Instant::now();
        let mut config_tick = interval_at(now + refresh.config_interval(), refresh.config_interval());
        let mut listing_tick = interval_at(now + refresh.listing_interval(), refresh.listing_interval());
        config_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        listing_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            config_every_secs = refresh.config_interval_secs,
            listing_every_secs = refresh.listing_interval_secs,
            "periodic refresh started"
        );

        let mut last = self.view(None).await;
        on_change(&last);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = config_tick.tick() => {
                    self.config_cache.refresh().await;
                }
                _ = listing_tick.tick() => {
                    let outcome = self.update().await;
                    debug!(?outcome, "periodic listing refresh");
                }
            }
            let current = self.view(None).await;
            if current != last {
                on_change(&current);
                last = current;
            }
        }
        info!("periodic refresh stopped");
    }
}

/// Turns per-file failures into notices and counters before forwarding.
struct NotifyingObserver<'a, O: TransferObserver + ?Sized> {
    ctx: &'a AppContext,
    inner: &'a mut O,
}

impl<O: TransferObserver + ?Sized> TransferObserver for NotifyingObserver<'_, O> {
    fn batch_started(&mut self, batch: &UploadBatch) {
        self.inner.batch_started(batch);
    }

    fn file_started(&mut self, index: usize, entry: &BatchEntry) {
        self.inner.file_started(index, entry);
    }

    fn progress(&mut self, snapshot: &ProgressSnapshot) {
        self.inner.progress(snapshot);
    }

    fn file_settled(&mut self, report: &FileReport) {
        match report.outcome.to_error(&report.raw_name) {
            Some(err) => {
                self.ctx.metrics.inc_files_failed();
                self.ctx.notify_error(err.user_message());
            }
            None => self.ctx.metrics.record_upload(report.size),
        }
        self.inner.file_settled(report);
    }

    fn batch_finished(&mut self, outcome: &BatchOutcome) {
        self.inner.batch_finished(outcome);
    }
}
