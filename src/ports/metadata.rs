//! Metadata API port for downloading application exports.

use std::future::Future;
use std::pin::Pin;

use super::PortResult;

/// Boxed future returned by [`MetadataApi::fetch_application`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = PortResult<String>> + Send + 'a>>;

/// Retrieves the raw metadata document of an application.
pub trait MetadataApi: Send + Sync {
    /// Fetches the export for `app_id` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    fn fetch_application(&self, app_id: &str) -> FetchFuture<'_>;
}
