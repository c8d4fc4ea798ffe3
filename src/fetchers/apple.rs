//! Firmware and jailbreak catalog lookups.

use super::{endpoint_url, endpoint_url_with_segments, FetchClient, FetchError};
use serde_json::{json, Value};

impl FetchClient {
    /// Full appledb catalog (iOS versions, jailbreaks, devices).
    ///
    /// Cached for an hour. `None` when appledb does not answer 200.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures.
    pub async fn appledb_catalog(&self) -> Result<Option<Value>, FetchError> {
        self.appledb_cache
            .get_or_fetch((), move || async move {
                let url = endpoint_url(&self.endpoints.appledb, "main.json");
                self.json_if_ok(self.client.get(url)).await
            })
            .await
    }

    /// Signing and build information for one firmware version from ipsw.me.
    ///
    /// Cached for an hour per version. Returns an empty JSON array when the
    /// lookup fails. `version` is sent as a single percent-encoded path
    /// segment, so `?`, `#` and `/` in it never change the request target.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures, or when the
    /// configured ipsw base URL cannot take path segments.
    pub async fn ipsw_firmware_info(&self, version: &str) -> Result<Value, FetchError> {
        let url = endpoint_url_with_segments(&self.endpoints.ipsw, &["v4", "ipsw", version])?;
        let info = self
            .ipsw_cache
            .get_or_fetch(version.to_string(), move || async move {
                self.json_if_ok(self.client.get(url)).await
            })
            .await?;

        Ok(info.unwrap_or_else(|| json!([])))
    }
}
