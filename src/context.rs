//! Service context bundling all port trait objects.

use crate::adapters::live::clock::SystemClock;
use crate::adapters::live::filesystem::DiskFileSystem;
use crate::adapters::live::metadata::HttpMetadataApi;
use crate::config::Settings;
use crate::error::Result;
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::metadata::MetadataApi;

/// Bundles the port trait objects used by metadata acquisition.
pub struct ServiceContext {
    /// Clock for cache freshness checks and cache file names.
    pub clock: Box<dyn Clock>,
    /// Filesystem for metadata files and the cache directory.
    pub fs: Box<dyn FileSystem>,
    /// Metadata API client.
    pub api: Box<dyn MetadataApi>,
}

impl ServiceContext {
    /// Creates a context with the system clock, local disk and an HTTP client
    /// configured from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Fetch`](crate::error::SleuthError::Fetch) if the
    /// HTTP client cannot be built.
    pub fn live(settings: &Settings) -> Result<Self> {
        Ok(Self {
            clock: Box::new(SystemClock),
            fs: Box::new(DiskFileSystem),
            api: Box::new(HttpMetadataApi::new(&settings.api_base_url, settings.api_key.clone())?),
        })
    }
}
