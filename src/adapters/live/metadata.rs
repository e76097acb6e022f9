//! Live adapter for the `MetadataApi` port using the Knack REST API.

use std::time::Duration;

use reqwest::Client;

use crate::error::{Result, SleuthError};
use crate::ports::metadata::{FetchFuture, MetadataApi};
use crate::ports::PortError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for `GET <base>/applications/<app_id>`.
pub struct HttpMetadataApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMetadataApi {
    /// Creates a client against `base_url`, sending `api_key` when present.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Fetch`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SleuthError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    fn url_for(&self, app_id: &str) -> String {
        format!("{}/applications/{app_id}", self.base_url)
    }
}

impl MetadataApi for HttpMetadataApi {
    fn fetch_application(&self, app_id: &str) -> FetchFuture<'_> {
        let url = self.url_for(app_id);
        let app_id = app_id.to_string();

        Box::pin(async move {
            let mut request = self.client.get(&url).header("X-Knack-Application-Id", &app_id);
            if let Some(key) = &self.api_key {
                request = request.header("X-Knack-REST-API-Key", key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| PortError::from(format!("request to {url} failed: {e}")))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| PortError::from(format!("failed to read response from {url}: {e}")))?;

            if !status.is_success() {
                return Err(format!("{url} returned {}: {body}", status.as_u16()).into());
            }
            Ok(body)
        })
    }
}
