// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Thin JSON REST client shared by all HTTP providers.
//!
//! Wraps `reqwest` with a base URL, an [`AuthScheme`], transparent retry of
//! transient failures, and uniform mapping of non-2xx responses to
//! [`ApiError`]. Provider modules build one of these and speak their own
//! dialect on top of it.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::api::auth::AuthScheme;
use crate::api::error::{ApiError, ApiResult};
use crate::util::retry::retry_with_max_retries;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: usize = 3;
const USER_AGENT: &str = concat!("cloudspan/", env!("CARGO_PKG_VERSION"));

/// Builder for [`RestClient`].
#[derive(Debug)]
pub struct RestClientBuilder {
    base_url: String,
    auth: AuthScheme,
    timeout: Duration,
    connect_timeout: Duration,
    max_retries: usize,
}

impl RestClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: AuthScheme::None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_auth(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL does not parse or the underlying
    /// HTTP client cannot be constructed.
    pub fn build(self) -> ApiResult<RestClient> {
        let mut base = Url::parse(&self.base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::ConfigError(format!(
                "endpoint {} is not a usable base URL",
                self.base_url
            )));
        }
        // Url::join drops the last path segment of a base without a
        // trailing slash, so normalize here once.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(RestClient {
            http,
            base,
            auth: self.auth,
            max_retries: self.max_retries,
        })
    }
}

/// JSON REST client bound to one provider endpoint.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    auth: AuthScheme,
    max_retries: usize,
}

impl RestClient {
    pub fn builder(base_url: impl Into<String>) -> RestClientBuilder {
        RestClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// A sibling client for the same endpoint with different credentials.
    /// Used by providers that trade an initial login for a token.
    pub fn with_auth(&self, auth: AuthScheme) -> RestClient {
        RestClient {
            http: self.http.clone(),
            base: self.base.clone(),
            auth,
            max_retries: self.max_retries,
        }
    }

    fn url_for(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// GET a relative path and deserialize the JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let mut url = self.url_for(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        self.get_url(url).await
    }

    /// GET an absolute URL, typically a next-page link handed out by the
    /// provider.
    pub async fn get_url<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let response = self
            .execute("GET", &url, || self.http.get(url.clone()))
            .await?;
        Ok(response.json().await?)
    }

    /// GET with 404 mapped to `Ok(None)`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Option<T>> {
        match self.get(path, query).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// POST a JSON body and deserialize the JSON response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.url_for(path)?;
        let response = self
            .execute("POST", &url, || self.http.post(url.clone()).json(body))
            .await?;
        Ok(response.json().await?)
    }

    /// POST and also return the `Location` response header, resolved
    /// against the request URL. Providers that accept mutations with 202
    /// point at a request-status resource this way.
    pub async fn post_with_location<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<(T, Option<Url>)> {
        let url = self.url_for(path)?;
        let response = self
            .execute("POST", &url, || self.http.post(url.clone()).json(body))
            .await?;
        let location = header_url(&response, "location");
        Ok((response.json().await?, location))
    }

    /// POST and also return a named response header as a string. Used by
    /// login endpoints that issue the token in a header rather than the
    /// body.
    pub async fn post_capture_header<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        header: &str,
    ) -> ApiResult<(T, Option<String>)> {
        let url = self.url_for(path)?;
        let response = self
            .execute("POST", &url, || self.http.post(url.clone()).json(body))
            .await?;
        let value = response
            .headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok((response.json().await?, value))
    }

    /// POST where the caller does not consume the response body. Action
    /// endpoints answer 202 with an empty or throwaway body; the returned
    /// `Location` header, when present, points at a request-status
    /// resource tracking the accepted mutation.
    pub async fn post_action<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<Option<Url>> {
        let url = self.url_for(path)?;
        let response = self
            .execute("POST", &url, || self.http.post(url.clone()).json(body))
            .await?;
        Ok(header_url(&response, "location"))
    }

    /// DELETE a resource. 404 means the resource is already gone and is
    /// success. Returns the `Location` header when the provider tracks the
    /// deletion through a request-status resource.
    pub async fn delete(&self, path: &str) -> ApiResult<Option<Url>> {
        let url = self.url_for(path)?;
        match self
            .execute("DELETE", &url, || self.http.delete(url.clone()))
            .await
        {
            Ok(response) => Ok(header_url(&response, "location")),
            Err(e) if e.is_not_found() => {
                debug!("DELETE {} already gone", url);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Send one request with retry, returning the successful response or
    /// the mapped error.
    async fn execute<F>(&self, method: &str, url: &Url, make: F) -> ApiResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        retry_with_max_retries(self.max_retries, method, || async {
            debug!("{} {}", method, url);
            let response = self.auth.apply(make()).send().await?;
            let status = response.status();
            if status.is_success() {
                debug!("{} {} -> {}", method, url, status.as_u16());
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body, status);
            debug!("{} {} -> {} ({})", method, url, status.as_u16(), message);
            match status.as_u16() {
                401 | 403 => Err(ApiError::AuthError(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    message
                ))),
                code => Err(ApiError::StatusError {
                    status: code,
                    message,
                }),
            }
        })
        .await
    }
}

fn header_url(response: &reqwest::Response, name: &str) -> Option<Url> {
    let value = response.headers().get(name)?.to_str().ok()?;
    match Url::parse(value) {
        Ok(url) => Some(url),
        Err(_) => response.url().join(value).ok(),
    }
}

/// Pull a human-readable message out of an error body.
///
/// Providers disagree on the envelope: `{"error": {"message": ...}}`,
/// `{"messages": [{"message": ...}]}`, a bare `[{"error_message": ...}]`
/// array, or a fault object keyed by its own name such as
/// `{"itemNotFound": {"message": ...}}`. Try the known shapes, then fall
/// back to the raw body or the status text.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if !trimmed.is_empty() && trimmed.len() <= 200 {
            trimmed.to_string()
        } else {
            status
                .canonical_reason()
                .unwrap_or("unrecognized error")
                .to_string()
        }
    };

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    if let Some(message) = value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
        return message.to_string();
    }
    if let Some(message) = value
        .get("messages")
        .and_then(|m| m.get(0))
        .and_then(|m| m.get("message"))
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    if let Some(message) = value
        .get(0)
        .and_then(|m| m.get("error_message"))
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    if let Some(object) = value.as_object() {
        for fault in object.values() {
            if let Some(message) = fault.get("message").and_then(|m| m.as_str()) {
                return message.to_string();
            }
        }
    }
    fallback()
}
