//! Rendering of analysis results for terminals, documents and machines.

pub mod console;
pub mod markdown;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::Settings;
use crate::error::Result;
use crate::model::Application;

/// Pretty-printed JSON.
///
/// # Errors
///
/// Returns [`SleuthError::Serialization`](crate::error::SleuthError::Serialization)
/// if the value cannot be serialized.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// YAML document.
///
/// # Errors
///
/// Returns [`SleuthError::Serialization`](crate::error::SleuthError::Serialization)
/// if the value cannot be serialized.
pub fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Builds links to scene pages in the Knack builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderLinks {
    base: &'static str,
    account: String,
}

impl BuilderLinks {
    /// Links for `app`, using the builder flavour selected in `settings`.
    ///
    /// The account slug falls back to the application slug.
    #[must_use]
    pub fn new(settings: &Settings, app: &Application) -> Self {
        Self {
            base: settings.builder_base_url(),
            account: app.account_slug().unwrap_or(&app.slug).to_string(),
        }
    }

    /// Builder URL of a scene.
    #[must_use]
    pub fn page_url(&self, scene_key: &str) -> String {
        format!("{}/{}/portal/pages/{scene_key}", self.base, self.account)
    }

    /// Sorted, de-duplicated page URLs for `scene_keys`.
    pub fn pages<'a>(&self, scene_keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        scene_keys
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|key| self.page_url(key))
            .collect()
    }
}

/// Formats an integer with comma thousands separators.
#[must_use]
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
