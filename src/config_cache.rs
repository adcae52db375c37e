//! Keeps the server's `/config/` document current.

use std::sync::Arc;

use tracing::{debug, error};

use crate::api::RemoteStore;
use crate::state::AppContext;
use crate::types::RemoteConfig;

#[derive(Clone)]
pub struct ConfigCache {
    ctx: AppContext,
    store: Arc<dyn RemoteStore>,
}

impl ConfigCache {
    pub fn new(ctx: AppContext, store: Arc<dyn RemoteStore>) -> Self {
        Self { ctx, store }
    }

    /// Fetches the config and replaces the cached one wholesale.
    ///
    /// Any failure leaves the config absent, which suspends listing and
    /// uploads until a later refresh succeeds.
    pub async fn refresh(&self) -> Option<RemoteConfig> {
        match self.store.fetch_config().await {
            Ok(config) => {
                debug!(readonly = config.modes.readonly, sinkhole = config.modes.sinkhole, "server config loaded");
                self.ctx.replace_remote_config(Some(config.clone())).await;
                Some(config)
            }
            Err(e) => {
                error!("Failed to load config: {}", e);
                self.ctx.metrics.inc_config_failures();
                self.ctx.replace_remote_config(None).await;
                None
            }
        }
    }
}
