//! The application document root.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::object::KnackObject;
use super::scene::Scene;
use crate::error::{Result, SleuthError};

/// Key in `counts` holding the application-wide record total.
pub const TOTAL_ENTRIES_KEY: &str = "total_entries";

/// Landing scene reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeScene {
    /// Scene key.
    #[serde(default)]
    pub key: String,
    /// Scene slug.
    #[serde(default)]
    pub slug: String,
}

/// Owning account, used to build builder URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Complete application metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Display name.
    pub name: String,
    /// Application id.
    pub id: String,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Landing scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_scene: Option<HomeScene>,
    /// Owning account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    /// Objects in document order.
    #[serde(default)]
    pub objects: Vec<KnackObject>,
    /// Scenes in document order.
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Record counts keyed by object key, plus [`TOTAL_ENTRIES_KEY`].
    #[serde(default)]
    pub counts: BTreeMap<String, u64>,
    /// Application settings, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

impl Application {
    /// Record count of an object; absent counts as zero.
    #[must_use]
    pub fn record_count(&self, object_key: &str) -> u64 {
        self.counts.get(object_key).copied().unwrap_or(0)
    }

    /// Application-wide record total, falling back to the sum of object counts.
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.counts.get(TOTAL_ENTRIES_KEY).copied().unwrap_or_else(|| {
            self.objects.iter().map(|object| self.record_count(&object.key)).sum()
        })
    }

    /// Account slug, if known.
    #[must_use]
    pub fn account_slug(&self) -> Option<&str> {
        self.account.as_ref()?.slug.as_deref()
    }
}

/// Top-level export document: `{"application": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppExport {
    /// The application.
    pub application: Application,
}

impl AppExport {
    /// Parses an export from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Validation`] if the text is not valid JSON or
    /// does not have the expected shape.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SleuthError::Validation(format!("not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Parses an export from an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Validation`] if the value does not have the expected shape.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| SleuthError::Validation(e.to_string()))
    }
}
