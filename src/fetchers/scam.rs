//! Anti-scam domain list.

use super::{FetchClient, FetchError};
use serde_json::Value;

impl FetchClient {
    /// Community-maintained list of known scam domains. Cached for an hour.
    ///
    /// The list is served as `text/plain`, so the body is decoded without
    /// looking at the content type.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures.
    pub async fn scam_urls(&self) -> Result<Option<Value>, FetchError> {
        self.scam_urls_cache
            .get_or_fetch((), move || async move {
                self.json_if_ok(self.client.get(&self.endpoints.scam_list)).await
            })
            .await
    }
}
