//! Status page lookups.

use super::{endpoint_url, FetchClient, FetchError};
use serde_json::Value;

impl FetchClient {
    /// Component health from the status page. Cached for ten minutes.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures.
    pub async fn status_components(&self) -> Result<Option<Value>, FetchError> {
        self.components_cache
            .get_or_fetch((), move || async move {
                let url = endpoint_url(&self.endpoints.status_page, "api/v2/components.json");
                self.json_if_ok(self.client.get(url)).await
            })
            .await
    }

    /// Recent incidents from the status page. Cached for ten minutes.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures.
    pub async fn status_incidents(&self) -> Result<Option<Value>, FetchError> {
        self.incidents_cache
            .get_or_fetch((), move || async move {
                let url = endpoint_url(&self.endpoints.status_page, "api/v2/incidents.json");
                self.json_if_ok(self.client.get(url)).await
            })
            .await
    }
}
