//! The server's file list as the client shows it.
//!
//! Every list-affecting event (start, finished batch, delete, timer) ends in
//! [`DirectoryView::refresh`], which makes the server's answer the new truth
//! for both the displayed records and the known-name set.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::RemoteStore;
use crate::error::{AppError, AppResult};
use crate::state::AppContext;

/// Asks the user before something destructive happens.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every question with yes (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No server config yet; nothing was requested.
    Skipped,
    /// Sinkhole mode: listing cleared without asking the server.
    Sinkhole,
    /// The listing was replaced with this many records.
    Listed(usize),
    /// The fetch succeeded but a newer refresh had already been applied.
    Stale,
    /// The fetch failed; the previous listing stays.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

pub fn delete_prompt(name: &str) -> String {
    format!("Do you really want to delete \"{}\"?", name)
}

#[derive(Clone)]
pub struct DirectoryView {
    ctx: AppContext,
    store: Arc<dyn RemoteStore>,
}

impl DirectoryView {
    pub fn new(ctx: AppContext, store: Arc<dyn RemoteStore>) -> Self {
        Self { ctx, store }
    }

    /// Re-reads the file list. Safe to run concurrently with itself.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(config) = self.ctx.remote_config().await else {
            debug!("listing refresh skipped, no server config");
            return RefreshOutcome::Skipped;
        };

        let ticket = self.ctx.next_ticket();
        if config.modes.sinkhole {
            self.ctx.apply_listing(ticket, Vec::new()).await;
            return RefreshOutcome::Sinkhole;
        }

        match self.store.list_files(config.endpoints.list.as_str()).await {
            Ok(records) => {
                let count = records.len();
                if self.ctx.apply_listing(ticket, records).await {
                    self.ctx.metrics.inc_list_refreshes();
                    debug!(ticket, count, "listing replaced");
                    RefreshOutcome::Listed(count)
                } else {
                    debug!(ticket, "listing result discarded, newer refresh applied");
                    RefreshOutcome::Stale
                }
            }
            Err(e) => {
                self.ctx.metrics.inc_list_failures();
                warn!("{}", AppError::ListFetchFailed(e.to_string()));
                RefreshOutcome::Failed
            }
        }
    }

    /// Deletes `name` on the server after confirmation.
    ///
    /// The listing is refreshed whether the request succeeded or not.
    pub async fn delete(&self, name: &str, confirm: &dyn Confirm) -> AppResult<DeleteOutcome> {
        let config = self
            .ctx
            .remote_config()
            .await
            .ok_or_else(|| AppError::ConfigUnavailable("no server config loaded".to_string()))?;
        if config.modes.readonly {
            return Err(AppError::ReadonlyMode);
        }
        if !confirm.confirm(&delete_prompt(name)) {
            return Ok(DeleteOutcome::Declined);
        }

        let path = config.endpoints.delete.resolve(name);
        let result = self.store.delete_file(&path).await;
        self.refresh().await;

        match result {
            Ok(()) => {
                info!(file = %name, "file deleted");
                self.ctx.metrics.inc_deletes();
                self.ctx.notify_success(format!("File deleted: {}", name));
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                let err = AppError::DeleteFailed { name: name.to_string(), reason: e.to_string() };
                warn!("{}", err);
                self.ctx.notify_error(err.user_message());
                Err(err)
            }
        }
    }
}
