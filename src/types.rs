//! Wire types shared between the remote store and the engine.
//!
//! Field names follow the server's JSON (`Modes`, `Endpoints`, `Name`, ...);
//! the Rust side uses snake_case through serde renames.

use serde::{Deserialize, Serialize};

/// Placeholder substituted by [`UrlTemplate::resolve`].
pub const FILENAME_PLACEHOLDER: &str = ":filename";

/// Server mode flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modes {
    #[serde(rename = "Readonly", default)]
    pub readonly: bool,
    #[serde(rename = "Sinkhole", default)]
    pub sinkhole: bool,
}

/// An endpoint path, optionally containing [`FILENAME_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitutes the percent-encoded `filename` for the first placeholder.
    pub fn resolve(&self, filename: &str) -> String {
        self.0.replacen(FILENAME_PLACEHOLDER, &encode_component(filename), 1)
    }
}

/// Percent-encodes like the browser's `encodeURIComponent`.
///
/// `urlencoding` leaves only `A-Z a-z 0-9 - _ . ~` alone; the browser also
/// keeps `! * ' ( )`, which the server's router accepts verbatim.
pub fn encode_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// Endpoint templates published by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(rename = "Files")]
    pub list: UrlTemplate,
    #[serde(rename = "FilesGet")]
    pub get: UrlTemplate,
    #[serde(rename = "FilesDelete")]
    pub delete: UrlTemplate,
    #[serde(rename = "Upload")]
    pub upload: UrlTemplate,
}

/// The document served at `/config/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(rename = "Modes")]
    pub modes: Modes,
    #[serde(rename = "Endpoints")]
    pub endpoints: Endpoints,
}

/// One entry of the list endpoint's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Size")]
    pub size: u64,
}
