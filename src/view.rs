//! Pure projection of the client state into something a renderer can draw.
//!
//! Nothing in here touches the network or mutates state; the terminal
//! renderer in the binary and the tests both consume [`ViewModel`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::format::fmt_size;
use crate::notice::StatusView;
use crate::state::Listing;
use crate::transfer::ProgressSnapshot;
use crate::types::RemoteConfig;

pub const SINKHOLE_BANNER: &str = "- Sinkhole mode enabled, no files will get listed -";
pub const UNAVAILABLE_BANNER: &str = "- Server config unavailable -";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub download_path: String,
    /// `None` in readonly mode.
    pub delete_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum ListingView {
    Entries(Vec<EntryView>),
    SinkholeBanner,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub current_file: String,
    pub percent: f64,
    pub status: String,
}

impl ProgressView {
    pub fn new(current_file: impl Into<String>, snapshot: &ProgressSnapshot) -> Self {
        Self { current_file: current_file.into(), percent: snapshot.percent, status: snapshot.status_text() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    /// The drop target is offered (config loaded, not readonly).
    pub upload_enabled: bool,
    pub status: StatusView,
    pub listing: ListingView,
    /// Only present while a batch runs.
    pub progress: Option<ProgressView>,
}

impl ViewModel {
    pub fn entries(&self) -> &[EntryView] {
        match &self.listing {
            ListingView::Entries(entries) => entries,
            _ => &[],
        }
    }
}

pub fn project(
    config: Option<&RemoteConfig>,
    listing: &Listing,
    progress: Option<ProgressView>,
    status: StatusView,
) -> ViewModel {
    let Some(config) = config else {
        return ViewModel { upload_enabled: false, status, listing: ListingView::Unavailable, progress };
    };

    let listing = if config.modes.sinkhole {
        ListingView::SinkholeBanner
    } else {
        let entries = listing
            .records
            .iter()
            .map(|record| EntryView {
                name: record.name.clone(),
                size: record.size,
                size_label: fmt_size(record.size),
                download_path: config.endpoints.get.resolve(&record.name),
                delete_path: (!config.modes.readonly).then(|| config.endpoints.delete.resolve(&record.name)),
            })
            .collect();
        ListingView::Entries(entries)
    };

    ViewModel { upload_enabled: !config.modes.readonly, status, listing, progress }
}

/// Plain-text rendering, one line per entry.
pub fn render_text(view: &ViewModel) -> String {
    let mut out = String::new();
    match &view.listing {
        ListingView::Unavailable => out.push_str(UNAVAILABLE_BANNER),
        ListingView::SinkholeBanner => out.push_str(SINKHOLE_BANNER),
        ListingView::Entries(entries) if entries.is_empty() => out.push_str("(no files)"),
        ListingView::Entries(entries) => {
            let width = entries.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);
            for (i, e) in entries.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let _ = write!(out, "{:<width$}  {:>10}  {}", e.name, e.size_label, e.download_path, width = width);
                if e.delete_path.is_some() {
                    out.push_str("  [Delete]");
                }
            }
        }
    }
    if let Some(p) = &view.progress {
        let _ = write!(out, "\n{}\n{}", p.current_file, p.status);
    }
    out
}
