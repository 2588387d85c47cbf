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

//! HTTP surface of the CloudSigma-style compute API.
//!
//! One endpoint serves one region, with basic authentication. Listings
//! page with `offset`/`limit` and report the full size in
//! `meta.total_count`. Power changes go through
//! `action/?do=start|stop` endpoints that acknowledge quickly; waiting
//! for the resulting status is the caller's business, helped by
//! [`CloudSigmaApi::await_status`].

use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::api::auth::AuthScheme;
use crate::api::client::RestClient;
use crate::api::error::{ApiError, ApiResult};
use crate::api::page::{PageMarker, PaginatedCollection};
use crate::api::poll::{poll_until, PollConfig, PollDecision};
use crate::provider::config::ProviderConfig;

use super::types::{CsServer, LibraryDrive, Listing, Meta};

pub(crate) const DEFAULT_PAGE_SIZE: u64 = 100;

const KNOWN_OPTIONS: &[&str] = &[
    "timeout",
    "connect_timeout",
    "max_retries",
    "poll_period",
    "poll_timeout",
    "endpoint",
    "username",
    "password",
    "region",
    "page_size",
    "action_timeout_secs",
];

/// Low-level client for one CloudSigma-style region endpoint.
#[derive(Debug)]
pub struct CloudSigmaApi {
    client: RestClient,
    region: String,
    page_size: u64,
    action_poll: PollConfig,
}

impl CloudSigmaApi {
    /// Build the API surface from configuration.
    ///
    /// Requires `endpoint`, `username` (the account email) and
    /// `password`. The region defaults to the first label of the
    /// endpoint host, e.g. `zrh` for `zrh.cloudsigma.com`.
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        for key in config.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                warn!("ignoring unknown cloudsigma option '{}'", key);
            }
        }

        let username = config.require("username")?.to_string();
        let password = config.require("password")?.to_string();
        let client = config
            .rest_client_builder()?
            .with_auth(AuthScheme::Basic { username, password })
            .build()?;

        let region = match config.get_option("region") {
            Some(region) => region.to_string(),
            None => region_from(client.base_url()),
        };

        let mut action_poll = PollConfig::default().with_period(Duration::from_secs(1));
        if let Some(secs) = config.get_parsed_option::<u64>("action_timeout_secs")? {
            action_poll = action_poll.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client,
            region,
            page_size: config
                .get_parsed_option::<u64>("page_size")?
                .unwrap_or(DEFAULT_PAGE_SIZE),
            action_poll,
        })
    }

    /// The region this client's endpoint serves.
    pub fn region(&self) -> &str {
        &self.region
    }

    pub async fn list_servers(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<CsServer>> {
        let offset = offset_of(marker.as_ref(), "server")?;
        let listing: Listing<CsServer> = self
            .client
            .get("servers/detail/", &self.list_query(offset))
            .await?;
        Ok(page_from_meta(listing.objects, &listing.meta))
    }

    pub async fn get_server(&self, uuid: &str) -> ApiResult<Option<CsServer>> {
        let path = format!("servers/{}/", uuid);
        self.client.get_optional(&path, &[]).await
    }

    /// POST a one-server creation listing. The response echoes the
    /// created objects.
    pub async fn create_server(&self, body: &serde_json::Value) -> ApiResult<CsServer> {
        let created: Listing<CsServer> = self.client.post("servers/", body).await?;
        created
            .objects
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::StateError {
                resource: "server create".to_string(),
                state: "no object in response".to_string(),
            })
    }

    pub async fn delete_server(&self, uuid: &str) -> ApiResult<()> {
        let path = format!("servers/{}/", uuid);
        self.client.delete(&path).await.map(|_| ())
    }

    /// POST a power action: `start` or `stop`.
    pub async fn server_action(&self, uuid: &str, action: &str) -> ApiResult<()> {
        let path = format!("servers/{}/action/?do={}", uuid, action);
        self.client
            .post_action(&path, &serde_json::json!({}))
            .await
            .map(|_| ())
    }

    /// Wait until the server reports `want`.
    ///
    /// A server that disappears while waiting also ends the wait, so a
    /// destroy racing this poll does not strand the caller. Landing in
    /// `unavailable` fails the wait.
    pub async fn await_status(&self, uuid: &str, want: &str) -> ApiResult<()> {
        let what = format!("server {} to be {}", uuid, want);
        poll_until(&self.action_poll, &what, || async {
            let Some(server) = self.get_server(uuid).await? else {
                return Ok(PollDecision::Done(()));
            };
            if server.status == want {
                Ok(PollDecision::Done(()))
            } else if server.status == "unavailable" {
                Ok(PollDecision::Failed("server became unavailable".to_string()))
            } else {
                Ok(PollDecision::Continue)
            }
        })
        .await
    }

    pub async fn list_library_drives(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<LibraryDrive>> {
        let offset = offset_of(marker.as_ref(), "library drive")?;
        let listing: Listing<LibraryDrive> = self
            .client
            .get("libdrives/", &self.list_query(offset))
            .await?;
        Ok(page_from_meta(listing.objects, &listing.meta))
    }

    pub async fn get_library_drive(&self, uuid: &str) -> ApiResult<Option<LibraryDrive>> {
        let path = format!("libdrives/{}/", uuid);
        self.client.get_optional(&path, &[]).await
    }

    fn list_query(&self, offset: u64) -> [(&'static str, String); 2] {
        [
            ("limit", self.page_size.to_string()),
            ("offset", offset.to_string()),
        ]
    }
}

/// First host label of the endpoint, the conventional region name.
fn region_from(endpoint: &Url) -> String {
    endpoint
        .host_str()
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
        .unwrap_or("default")
        .to_string()
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

/// Next marker from the `meta` block: the walk continues while consumed
/// items fall short of `total_count`. An empty page ends the walk even
/// if the count disagrees, so a listing that shrinks mid-walk cannot
/// loop.
fn page_from_meta<T>(objects: Vec<T>, meta: &Meta) -> PaginatedCollection<T> {
    let consumed = meta.offset + objects.len() as u64;
    let next = (!objects.is_empty() && consumed < meta.total_count)
        .then_some(PageMarker::Offset(consumed));
    PaginatedCollection::new(objects, next)
}
