//! Runtime settings and analysis policy.
//!
//! [`Settings`] is read from the process environment (optionally seeded from
//! a `.env` file). [`AnalysisPolicy`] holds the thresholds used by the
//! coupling, clustering and impact analyses; defaults can be overridden from
//! a YAML file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SleuthError};

/// Default metadata API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.knack.com/v1";

/// Default cache lifetime in hours.
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Largest cache lifetime representable as a millisecond duration.
pub const MAX_CACHE_TTL_HOURS: i64 = i64::MAX / 3_600_000;

/// Environment-derived settings for acquisition and presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Application id used when no metadata file is given.
    pub app_id: Option<String>,
    /// Optional REST API key forwarded to the metadata endpoint.
    pub api_key: Option<String>,
    /// Base URL of the metadata API.
    pub api_base_url: String,
    /// Whether builder links should target the next-generation builder.
    pub next_gen_builder: bool,
    /// Directory holding cached metadata downloads.
    pub cache_dir: PathBuf,
    /// Age after which a cached download is refetched.
    pub cache_ttl_hours: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            next_gen_builder: false,
            cache_dir: PathBuf::from("."),
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
        }
    }
}

impl Settings {
    /// Loads settings from the environment after reading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Config`] when a numeric or boolean variable is malformed.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Config`] when a numeric or boolean variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let next_gen_builder = match non_empty("KNACK_NEXT_GEN_BUILDER") {
            Some(raw) => parse_bool("KNACK_NEXT_GEN_BUILDER", &raw)?,
            None => defaults.next_gen_builder,
        };
        let cache_ttl_hours = match non_empty("KNACK_SLEUTH_CACHE_TTL_HOURS") {
            Some(raw) => parse_ttl(&raw)?,
            None => defaults.cache_ttl_hours,
        };

        Ok(Self {
            app_id: non_empty("KNACK_APP_ID"),
            api_key: non_empty("KNACK_API_KEY"),
            api_base_url: non_empty("KNACK_API_BASE_URL")
                .map_or(defaults.api_base_url, |url| url.trim_end_matches('/').to_string()),
            next_gen_builder,
            cache_dir: non_empty("KNACK_SLEUTH_CACHE_DIR").map_or(defaults.cache_dir, PathBuf::from),
            cache_ttl_hours,
        })
    }

    /// Base URL for builder page links.
    #[must_use]
    pub fn builder_base_url(&self) -> &'static str {
        if self.next_gen_builder {
            "https://builder-next.knack.com"
        } else {
            "https://builder.knack.com"
        }
    }
}

fn parse_ttl(raw: &str) -> Result<i64> {
    let hours = raw.trim().parse::<i64>().map_err(|e| {
        SleuthError::Config(format!("KNACK_SLEUTH_CACHE_TTL_HOURS='{raw}': {e}"))
    })?;
    if !(0..=MAX_CACHE_TTL_HOURS).contains(&hours) {
        return Err(SleuthError::Config(format!(
            "KNACK_SLEUTH_CACHE_TTL_HOURS='{raw}' must be within 0..={MAX_CACHE_TTL_HOURS}"
        )));
    }
    Ok(hours)
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SleuthError::Config(format!("{key}='{other}' is not a boolean"))),
    }
}

/// Thresholds and weights used by the analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPolicy {
    /// Centrality above which a temporal object is classified transactional.
    pub transactional_centrality_cutoff: f64,
    /// Share of objects (by importance rank) classified core.
    pub core_fraction: f64,
    /// Upper bound on the number of core objects.
    pub core_max: usize,
    /// Maximum field count for a reference-data object.
    pub reference_max_fields: usize,
    /// Minimum afferent-to-efferent ratio for a reference-data object.
    pub reference_inbound_ratio: f64,
    /// Minimum total connections for an object to be a hub.
    pub hub_threshold: usize,
    /// How many times one direction must outweigh the other for a hub to be
    /// a dependency root or an aggregator.
    pub hub_direction_factor: usize,
    /// Minimum total connections for a balanced hub to count as central.
    /// Also the size at which a hub makes an application hub-and-spoke.
    pub major_hub_min: usize,
    /// Merge ratio that must be exceeded for two clusters to merge.
    pub cohesion_floor: f64,
    /// Cohesion above which a cluster is rated high.
    pub cohesion_high: f64,
    /// Maximum number of cluster merges before giving up.
    pub max_cluster_iterations: usize,
    /// Highest impact score still rated low.
    pub risk_low_max: usize,
    /// Highest impact score still rated medium.
    pub risk_medium_max: usize,
    /// Modularity below which an application with a major hub is hub-and-spoke.
    pub hub_and_spoke_modularity_max: f64,
    /// Modularity above which an application is modular.
    pub modular_modularity_min: f64,
    /// Minimum shared connection targets for a tightly coupled pair.
    pub tight_coupling_min_shared: usize,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            transactional_centrality_cutoff: 0.6,
            core_fraction: 0.2,
            core_max: 10,
            reference_max_fields: 8,
            reference_inbound_ratio: 2.0,
            hub_threshold: 3,
            hub_direction_factor: 2,
            major_hub_min: 5,
            cohesion_floor: 0.4,
            cohesion_high: 0.7,
            max_cluster_iterations: 1000,
            risk_low_max: 5,
            risk_medium_max: 15,
            hub_and_spoke_modularity_max: 0.5,
            modular_modularity_min: 0.6,
            tight_coupling_min_shared: 3,
        }
    }
}

impl AnalysisPolicy {
    /// Parses a policy from YAML; omitted keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Config`] if the YAML is malformed or a value is out of range.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let policy: Self = serde_yaml::from_str(yaml)
            .map_err(|e| SleuthError::Config(format!("invalid analysis policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Checks that fractions and thresholds are in range.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Config`] describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.core_fraction) {
            return Err(SleuthError::Config("core_fraction must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.cohesion_floor) || !(0.0..=1.0).contains(&self.cohesion_high)
        {
            return Err(SleuthError::Config("cohesion thresholds must be within [0, 1]".into()));
        }
        if self.risk_low_max > self.risk_medium_max {
            return Err(SleuthError::Config(
                "risk_low_max must not exceed risk_medium_max".into(),
            ));
        }
        if self.core_max == 0 {
            return Err(SleuthError::Config("core_max must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.hub_and_spoke_modularity_max)
            || !(0.0..=1.0).contains(&self.modular_modularity_min)
        {
            return Err(SleuthError::Config("modularity cutoffs must be within [0, 1]".into()));
        }
        if self.hub_direction_factor == 0 || self.tight_coupling_min_shared == 0 {
            return Err(SleuthError::Config(
                "hub_direction_factor and tight_coupling_min_shared must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
