//! Canister package index: tweak and repository search.
//!
//! Search responses are wrapped in a `{"status": ..., "data": ...}`
//! envelope. Only `status == "Successful"` carries results.

use super::{endpoint_url, FetchClient, FetchError};
use serde_json::Value;

const PACKAGE_SEARCH_FIELDS: &str = "identifier,name";
const PACKAGE_RESPONSE_FIELDS: &str = "identifier,header,tintColor,name,price,description,packageIcon,repository.uri,repository.name,author,maintainer,latestVersion,nativeDepiction,depiction";
const RANKED_REPOSITORIES: &str = "1,2,3,4,5";

/// Returns the `data` field of a successful search envelope.
fn unwrap_successful(envelope: Value) -> Option<Value> {
    match envelope {
        Value::Object(mut fields)
            if fields.get("status").and_then(Value::as_str) == Some("Successful") =>
        {
            fields.remove("data")
        }
        _ => None,
    }
}

/// Returns the `data` field of any object response.
fn unwrap_data(response: Value) -> Option<Value> {
    match response {
        Value::Object(mut fields) => fields.remove("data"),
        _ => None,
    }
}

impl FetchClient {
    /// Search Canister for packages whose identifier or name matches `query`.
    ///
    /// Not cached. `None` when Canister does not answer 200 or reports a
    /// status other than `Successful`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures.
    pub async fn search_packages(&self, query: &str) -> Result<Option<Value>, FetchError> {
        let url = endpoint_url(&self.endpoints.canister, "v1/community/packages/search");
        let request = self.client.get(url).query(&[
            ("query", query),
            ("searchFields", PACKAGE_SEARCH_FIELDS),
            ("responseFields", PACKAGE_RESPONSE_FIELDS),
        ]);

        Ok(self.json_if_ok(request).await?.and_then(unwrap_successful))
    }

    /// Search Canister for repositories matching `query`. Not cached.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures.
    pub async fn search_repositories(&self, query: &str) -> Result<Option<Value>, FetchError> {
        let url = endpoint_url(&self.endpoints.canister, "v1/community/repositories/search");
        let request = self.client.get(url).query(&[("query", query)]);

        Ok(self.json_if_ok(request).await?.and_then(unwrap_successful))
    }

    /// Every ranked repository Canister indexes. Cached for an hour.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport or JSON decode failures.
    pub async fn fetch_repositories(&self) -> Result<Option<Value>, FetchError> {
        self.repositories_cache
            .get_or_fetch((), move || async move {
                let url = endpoint_url(&self.endpoints.canister, "v1/community/repositories/search");
                let request = self.client.get(url).query(&[("ranking", RANKED_REPOSITORIES)]);
                let response = self.json_if_ok(request).await?;
                Ok::<_, FetchError>(response.and_then(unwrap_data))
            })
            .await
    }
}
