//! Transient status messages.
//!
//! A notice replaces the placeholder text for a fixed time and then reverts
//! on its own. Showing a new notice discards the previous one, whatever its
//! remaining lifetime.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Text shown when no notice is active.
pub const PLACEHOLDER: &str = "Drag & drop files here or pass them to `ablage upload`";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Idle,
    Error,
    Success,
}

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    kind: NoticeKind,
    expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub text: String,
    pub kind: NoticeKind,
}

#[derive(Debug, Default)]
pub struct StatusLine {
    current: Option<Notice>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, text: impl Into<String>, kind: NoticeKind, duration: Duration, now: Instant) {
        self.current = Some(Notice { text: text.into(), kind, expires_at: now + duration });
    }

    /// What the status line reads at `now`.
    pub fn view(&self, now: Instant) -> StatusView {
        match &self.current {
            Some(n) if now < n.expires_at => StatusView { text: n.text.clone(), kind: n.kind },
            _ => StatusView { text: PLACEHOLDER.to_string(), kind: NoticeKind::Idle },
        }
    }
}
