//! HTTP surface of the IONOS-style compute API.
//!
//! All server resources live under one virtual datacenter fixed at
//! configuration time. Listings page with `offset`/`limit` and a page
//! shorter than `limit` is the last one. Mutations answer `202 Accepted`
//! plus a `Location` header naming a request-status resource; callers
//! that need the mutation applied wait on it with [`IonosApi::await_request`].

use std::time::Duration;

use serde_json::json;
use tracing::warn;
use url::Url;

use crate::api::auth::AuthScheme;
use crate::api::client::RestClient;
use crate::api::error::{ApiError, ApiResult};
use crate::api::page::{PageMarker, PaginatedCollection};
use crate::api::poll::{poll_until, PollConfig, PollDecision};
use crate::provider::config::ProviderConfig;

use super::types::{Datacenter, IonosImage, IonosServer, Items, RequestStatus};

pub(crate) const DEFAULT_PAGE_SIZE: u64 = 100;

/// Expansion depth for server reads; 2 reaches the attached NICs.
const SERVER_DEPTH: u64 = 2;
const LIST_DEPTH: u64 = 1;

const KNOWN_OPTIONS: &[&str] = &[
    "timeout",
    "connect_timeout",
    "max_retries",
    "poll_period",
    "poll_timeout",
    "endpoint",
    "username",
    "password",
    "datacenter",
    "page_size",
    "request_timeout_secs",
];

/// Low-level client for one datacenter of an IONOS-style account.
#[derive(Debug)]
pub struct IonosApi {
    client: RestClient,
    datacenter: String,
    page_size: u64,
    request_poll: PollConfig,
}

impl IonosApi {
    /// Build the API surface from configuration.
    ///
    /// Requires `endpoint`, `username`, `password` and `datacenter`.
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        for key in config.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                warn!("ignoring unknown ionos option '{}'", key);
            }
        }

        let username = config.require("username")?.to_string();
        let password = config.require("password")?.to_string();
        let client = config
            .rest_client_builder()?
            .with_auth(AuthScheme::Basic { username, password })
            .build()?;

        let mut request_poll = PollConfig::default().with_period(Duration::from_secs(1));
        if let Some(secs) = config.get_parsed_option::<u64>("request_timeout_secs")? {
            request_poll = request_poll.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client,
            datacenter: config.require("datacenter")?.to_string(),
            page_size: config
                .get_parsed_option::<u64>("page_size")?
                .unwrap_or(DEFAULT_PAGE_SIZE),
            request_poll,
        })
    }

    /// The virtual datacenter this client is bound to.
    pub fn datacenter(&self) -> &str {
        &self.datacenter
    }

    pub async fn list_servers(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<IonosServer>> {
        let offset = offset_of(marker.as_ref(), "server")?;
        let path = format!("datacenters/{}/servers", self.datacenter);
        let envelope: Items<IonosServer> = self
            .client
            .get(&path, &self.list_query(SERVER_DEPTH, offset))
            .await?;
        Ok(page_from(envelope.items, offset, self.page_size))
    }

    pub async fn get_server(&self, id: &str) -> ApiResult<Option<IonosServer>> {
        let path = format!("datacenters/{}/servers/{}", self.datacenter, id);
        self.client
            .get_optional(&path, &[("depth", SERVER_DEPTH.to_string())])
            .await
    }

    /// POST a server definition. Returns the created resource as echoed
    /// back plus the request-status location tracking its provisioning.
    pub async fn create_server(
        &self,
        body: &serde_json::Value,
    ) -> ApiResult<(IonosServer, Option<Url>)> {
        let path = format!("datacenters/{}/servers", self.datacenter);
        self.client.post_with_location(&path, body).await
    }

    pub async fn delete_server(&self, id: &str) -> ApiResult<Option<Url>> {
        let path = format!("datacenters/{}/servers/{}", self.datacenter, id);
        self.client.delete(&path).await
    }

    /// POST one of the server command endpoints: `reboot`, `start` or
    /// `stop`.
    pub async fn server_command(&self, id: &str, command: &str) -> ApiResult<Option<Url>> {
        let path = format!(
            "datacenters/{}/servers/{}/{}",
            self.datacenter, id, command
        );
        self.client.post_action(&path, &json!({})).await
    }

    /// Block until an accepted mutation lands, by polling its
    /// request-status resource to DONE.
    ///
    /// A FAILED status surfaces as [`ApiError::StateError`] with the
    /// provider's message. Mutations accepted without a `Location`
    /// header cannot be tracked and return immediately.
    pub async fn await_request(&self, location: Option<Url>, what: &str) -> ApiResult<()> {
        let Some(url) = location else {
            warn!("{} accepted without a request-status location, not waiting", what);
            return Ok(());
        };

        poll_until(&self.request_poll, what, || {
            let client = self.client.clone();
            let url = url.clone();
            async move {
                let status: RequestStatus = client.get_url(url).await?;
                Ok(match status.metadata.status.to_ascii_uppercase().as_str() {
                    "DONE" => PollDecision::Done(()),
                    "FAILED" => PollDecision::Failed(
                        status
                            .metadata
                            .message
                            .unwrap_or_else(|| "request FAILED".to_string()),
                    ),
                    _ => PollDecision::Continue,
                })
            }
        })
        .await
    }

    pub async fn list_images(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<IonosImage>> {
        let offset = offset_of(marker.as_ref(), "image")?;
        let envelope: Items<IonosImage> = self
            .client
            .get("images", &self.list_query(LIST_DEPTH, offset))
            .await?;
        Ok(page_from(envelope.items, offset, self.page_size))
    }

    pub async fn get_image(&self, id: &str) -> ApiResult<Option<IonosImage>> {
        let path = format!("images/{}", id);
        self.client
            .get_optional(&path, &[("depth", LIST_DEPTH.to_string())])
            .await
    }

    /// Datacenters visible to the account. The listing is small enough
    /// that the API serves it whole.
    pub async fn list_datacenters(&self) -> ApiResult<Vec<Datacenter>> {
        let envelope: Items<Datacenter> = self
            .client
            .get("datacenters", &[("depth", LIST_DEPTH.to_string())])
            .await?;
        Ok(envelope.items)
    }

    fn list_query(&self, depth: u64, offset: u64) -> [(&'static str, String); 3] {
        [
            ("depth", depth.to_string()),
            ("offset", offset.to_string()),
            ("limit", self.page_size.to_string()),
        ]
    }
}

fn offset_of(marker: Option<&PageMarker>, what: &str) -> ApiResult<u64> {
    match marker {
        None => Ok(0),
        Some(PageMarker::Offset(n)) => Ok(*n),
        Some(other) => Err(ApiError::PaginationError(format!(
            "{} listings page by offset, got marker {}",
            what, other
        ))),
    }
}

fn page_from<T>(items: Vec<T>, offset: u64, limit: u64) -> PaginatedCollection<T> {
    let next = (items.len() as u64 == limit).then(|| PageMarker::Offset(offset + limit));
    PaginatedCollection::new(items, next)
}
