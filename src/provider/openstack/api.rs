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

//! HTTP surface of the OpenStack-style compute API.
//!
//! Authentication is lazy: the first request trades the configured
//! credentials for a token at the identity endpoint and caches an
//! authenticated client. A rejected token is renewed once per request
//! before the failure is surfaced.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::api::auth::AuthScheme;
use crate::api::client::RestClient;
use crate::api::error::{ApiError, ApiResult};
use crate::api::page::{PageMarker, PaginatedCollection};
use crate::compute::model::NodeSpec;
use crate::provider::config::ProviderConfig;

use super::types::{
    next_link, AvailabilityZone, AvailabilityZonesEnvelope, CreatedServerEnvelope, Flavor,
    FlavorsEnvelope, ImageEnvelope, ImagesEnvelope, Link, OsImage, Server, ServerEnvelope,
    ServersEnvelope,
};

const TOKEN_HEADER: &str = "X-Auth-Token";
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

const KNOWN_OPTIONS: &[&str] = &[
    "timeout",
    "connect_timeout",
    "max_retries",
    "poll_period",
    "poll_timeout",
    "endpoint",
    "identity_endpoint",
    "username",
    "password",
    "project",
    "token",
    "page_size",
];

/// Low-level client for the compute and identity endpoints.
#[derive(Debug)]
pub struct NovaApi {
    base: RestClient,
    identity: Option<RestClient>,
    username: Option<String>,
    password: Option<String>,
    project: Option<String>,
    token: Option<String>,
    page_size: Option<u64>,
    authed: tokio::sync::Mutex<Option<RestClient>>,
}

impl NovaApi {
    /// Build the API surface from configuration.
    ///
    /// Either a pre-issued `token` or the password trio
    /// (`identity_endpoint`, `username`, `password`) must be present.
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        for key in config.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                warn!("ignoring unknown openstack option '{}'", key);
            }
        }

        let base = config.rest_client_builder()?.build()?;
        let token = config.get_option("token").map(str::to_string);

        let (identity, username, password) = if token.is_some() {
            (None, None, None)
        } else {
            if config.get_option("identity_endpoint").is_none() {
                return Err(ApiError::ConfigError(
                    "openstack needs either 'token' or 'identity_endpoint' with \
                     'username' and 'password'"
                        .to_string(),
                ));
            }
            let identity = config
                .rest_client_builder_for("identity_endpoint")?
                .build()?;
            let username = config.require("username")?.to_string();
            let password = config.require("password")?.to_string();
            (Some(identity), Some(username), Some(password))
        };

        Ok(Self {
            base,
            identity,
            username,
            password,
            project: config.get_option("project").map(str::to_string),
            token,
            page_size: config.get_parsed_option::<u64>("page_size")?,
            authed: tokio::sync::Mutex::new(None),
        })
    }

    /// The authenticated compute client, logging in first if needed.
    async fn client(&self) -> ApiResult<RestClient> {
        let mut guard = self.authed.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let token = match (&self.token, &self.identity) {
            (Some(token), _) => token.clone(),
            (None, Some(identity)) => self.issue_token(identity).await?,
            (None, None) => {
                return Err(ApiError::ConfigError(
                    "openstack has neither a token nor identity credentials".to_string(),
                ))
            }
        };

        let client = self.base.with_auth(AuthScheme::Header {
            name: TOKEN_HEADER.to_string(),
            value: token,
        });
        *guard = Some(client.clone());
        Ok(client)
    }

    async fn issue_token(&self, identity: &RestClient) -> ApiResult<String> {
        let mut body = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": self.username,
                            "domain": {"id": "default"},
                            "password": self.password
                        }
                    }
                }
            }
        });
        if let Some(project) = &self.project {
            body["auth"]["scope"] = json!({
                "project": {"name": project, "domain": {"id": "default"}}
            });
        }

        let (_body, token): (serde_json::Value, Option<String>) = identity
            .post_capture_header("auth/tokens", &body, SUBJECT_TOKEN_HEADER)
            .await?;
        debug!("issued identity token");
        token.ok_or_else(|| {
            ApiError::AuthError(format!(
                "login response did not include {}",
                SUBJECT_TOKEN_HEADER
            ))
        })
    }

    /// Run `op` with the authenticated client, renewing the token once if
    /// the provider rejects it mid-session.
    async fn with_client<T, F, Fut>(&self, op: F) -> ApiResult<T>
    where
        F: Fn(RestClient) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let client = self.client().await?;
        match op(client).await {
            Err(ApiError::AuthError(msg)) if self.identity.is_some() => {
                debug!("token rejected ({}), renewing", msg);
                *self.authed.lock().await = None;
                let client = self.client().await?;
                op(client).await
            }
            other => other,
        }
    }

    fn base_query(&self) -> Vec<(&'static str, String)> {
        match self.page_size {
            Some(limit) => vec![("limit", limit.to_string())],
            None => Vec::new(),
        }
    }

    /// Fetch one page of `path`, honoring a next-page link marker.
    ///
    /// Some deployments hand out next links pointing at a host the caller
    /// cannot reach (an internal address behind the load balancer). When
    /// the link carries a `marker` parameter the request is re-issued
    /// against the configured endpoint with that marker instead of
    /// following the link verbatim.
    async fn fetch_page<E: DeserializeOwned>(
        &self,
        path: &'static str,
        marker: Option<PageMarker>,
    ) -> ApiResult<E> {
        match marker {
            None => {
                let query = self.base_query();
                self.with_client(move |client| {
                    let query = query.clone();
                    async move { client.get(path, &query).await }
                })
                .await
            }
            Some(PageMarker::Link(url)) => {
                if let Some(marker_value) = marker_param(&url) {
                    let mut query = self.base_query();
                    query.push(("marker", marker_value));
                    self.with_client(move |client| {
                        let query = query.clone();
                        async move { client.get(path, &query).await }
                    })
                    .await
                } else {
                    debug!("next link for {} has no marker, following it", path);
                    self.with_client(move |client| {
                        let url = url.clone();
                        async move { client.get_url(url).await }
                    })
                    .await
                }
            }
            Some(other) => Err(ApiError::PaginationError(format!(
                "openstack listing expects link markers, got {}",
                other
            ))),
        }
    }

    pub async fn list_servers(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Server>> {
        let envelope: ServersEnvelope = self.fetch_page("servers/detail", marker).await?;
        page_from(envelope.servers, &envelope.links)
    }

    pub async fn get_server(&self, id: &str) -> ApiResult<Option<Server>> {
        let path = format!("servers/{}", id);
        let envelope: Option<ServerEnvelope> = self
            .with_client(move |client| {
                let path = path.clone();
                async move { client.get_optional(&path, &[]).await }
            })
            .await?;
        Ok(envelope.map(|e| e.server))
    }

    /// Create a server, returning the new id. The response body carries
    /// little else.
    pub async fn create_server(&self, spec: &NodeSpec) -> ApiResult<String> {
        let mut server = json!({
            "name": spec.name,
            "imageRef": spec.image_id,
            "flavorRef": spec.hardware_id,
        });
        if let Some(zone) = &spec.location_id {
            server["availability_zone"] = json!(zone);
        }
        if let Some(key_name) = spec.option("key_name") {
            server["key_name"] = json!(key_name);
        }
        for (key, value) in &spec.options {
            if key != "key_name" {
                warn!("ignoring unknown create option '{}' = '{}'", key, value);
            }
        }
        let body = json!({ "server": server });

        let envelope: CreatedServerEnvelope = self
            .with_client(move |client| {
                let body = body.clone();
                async move { client.post("servers", &body).await }
            })
            .await?;
        Ok(envelope.server.id)
    }

    pub async fn delete_server(&self, id: &str) -> ApiResult<()> {
        let path = format!("servers/{}", id);
        self.with_client(move |client| {
            let path = path.clone();
            async move { client.delete(&path).await.map(|_| ()) }
        })
        .await
    }

    /// POST one entry of the action vocabulary, e.g.
    /// `{"reboot": {"type": "SOFT"}}` or `{"suspend": null}`.
    pub async fn server_action(&self, id: &str, action: serde_json::Value) -> ApiResult<()> {
        let path = format!("servers/{}/action", id);
        self.with_client(move |client| {
            let path = path.clone();
            let action = action.clone();
            async move { client.post_action(&path, &action).await.map(|_| ()) }
        })
        .await
    }

    pub async fn list_images(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<OsImage>> {
        let envelope: ImagesEnvelope = self.fetch_page("images/detail", marker).await?;
        page_from(envelope.images, &envelope.links)
    }

    pub async fn get_image(&self, id: &str) -> ApiResult<Option<OsImage>> {
        let path = format!("images/{}", id);
        let envelope: Option<ImageEnvelope> = self
            .with_client(move |client| {
                let path = path.clone();
                async move { client.get_optional(&path, &[]).await }
            })
            .await?;
        Ok(envelope.map(|e| e.image))
    }

    pub async fn list_flavors(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Flavor>> {
        let envelope: FlavorsEnvelope = self.fetch_page("flavors/detail", marker).await?;
        page_from(envelope.flavors, &envelope.links)
    }

    pub async fn list_availability_zones(&self) -> ApiResult<Vec<AvailabilityZone>> {
        let envelope: AvailabilityZonesEnvelope = self
            .with_client(|client| async move { client.get("os-availability-zone", &[]).await })
            .await?;
        Ok(envelope.zones)
    }
}

fn page_from<T>(items: Vec<T>, links: &[Link]) -> ApiResult<PaginatedCollection<T>> {
    let next = match next_link(links) {
        Some(href) => Some(PageMarker::Link(Url::parse(href)?)),
        None => None,
    };
    Ok(PaginatedCollection::new(items, next))
}

fn marker_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "marker")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_param_extraction() {
        let url = Url::parse("https://x/v2.1/servers/detail?limit=2&marker=srv-7").unwrap();
        assert_eq!(marker_param(&url), Some("srv-7".to_string()));

        let url = Url::parse("https://x/v2.1/servers/detail?limit=2").unwrap();
        assert_eq!(marker_param(&url), None);
    }

    #[test]
    fn test_page_from_parses_next_link() {
        let links = vec![Link {
            rel: "next".to_string(),
            href: "https://x/servers?marker=a".to_string(),
        }];
        let page = page_from(vec![1, 2], &links).unwrap();
        assert!(!page.is_last());
        assert!(matches!(page.next_marker(), Some(PageMarker::Link(_))));

        let page = page_from(vec![3], &[]).unwrap();
        assert!(page.is_last());
    }

    #[test]
    fn test_page_from_rejects_garbage_link() {
        let links = vec![Link {
            rel: "next".to_string(),
            href: "::not a url::".to_string(),
        }];
        assert!(page_from(vec![0], &links).is_err());
    }

    #[test]
    fn test_from_config_requires_some_auth() {
        let config = ProviderConfig::openstack().with_option("endpoint", "https://nova.example.com/v2.1");
        let err = NovaApi::from_config(&config).unwrap_err();
        assert!(matches!(err, ApiError::ConfigError(_)));
    }

    #[test]
    fn test_from_config_with_token() {
        let config = ProviderConfig::openstack()
            .with_option("endpoint", "https://nova.example.com/v2.1")
            .with_option("token", "tok-1");
        let api = NovaApi::from_config(&config).unwrap();
        assert!(api.identity.is_none());
        assert_eq!(api.token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_from_config_with_password() {
        let config = ProviderConfig::openstack()
            .with_option("endpoint", "https://nova.example.com/v2.1")
            .with_option("identity_endpoint", "https://keystone.example.com/v3")
            .with_option("username", "demo")
            .with_option("password", "pw")
            .with_option("project", "team-a");
        let api = NovaApi::from_config(&config).unwrap();
        assert!(api.identity.is_some());
        assert!(api.token.is_none());
        assert_eq!(api.project.as_deref(), Some("team-a"));
    }

    #[test]
    fn test_password_flow_needs_username() {
        let config = ProviderConfig::openstack()
            .with_option("endpoint", "https://nova.example.com/v2.1")
            .with_option("identity_endpoint", "https://keystone.example.com/v3")
            .with_option("password", "pw");
        assert!(NovaApi::from_config(&config).is_err());
    }
}
