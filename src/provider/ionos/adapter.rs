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

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::page::{PageMarker, PaginatedCollection};
use crate::compute::adapter::ComputeServiceAdapter;
use crate::compute::model::{
    is_private_addr, Hardware, Image, Location, NodeMetadata, NodeSpec, NodeState,
};
use crate::provider::config::ProviderConfig;

use super::api::IonosApi;
use super::types::{map_server_state, Datacenter, IonosImage, IonosServer};

pub const PROVIDER_ID: &str = "ionos";

/// The API has no flavor catalog; servers are sized freely. Expose a
/// fixed cores x memory grid so callers can still pick hardware by id.
const HARDWARE_CORES: &[u32] = &[1, 2, 4, 8];
const HARDWARE_RAM_MB: &[u64] = &[1024, 2048, 4096, 8192, 16384];

/// Boot volume size when the spec does not carry a `volume_gb` option.
const DEFAULT_VOLUME_GB: u64 = 20;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// [`ComputeServiceAdapter`] for IONOS-style clouds, scoped to one
/// virtual datacenter.
///
/// Mutations here are synchronous from the caller's point of view: the
/// underlying API answers 202 and the adapter waits on the request-status
/// resource before returning.
pub struct IonosAdapter {
    api: IonosApi,
}

impl IonosAdapter {
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        Ok(Self {
            api: IonosApi::from_config(config)?,
        })
    }
}

#[async_trait]
impl ComputeServiceAdapter for IonosAdapter {
    fn provider(&self) -> &str {
        PROVIDER_ID
    }

    async fn list_nodes(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<NodeMetadata>> {
        let datacenter = self.api.datacenter().to_string();
        Ok(self
            .api
            .list_servers(marker)
            .await?
            .map(|server| server_to_node(server, &datacenter)))
    }

    async fn get_node(&self, id: &str) -> ApiResult<Option<NodeMetadata>> {
        Ok(self
            .api
            .get_server(id)
            .await?
            .map(|server| server_to_node(server, self.api.datacenter())))
    }

    async fn create_node(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata> {
        if let Some(location) = &spec.location_id {
            if location != self.api.datacenter() {
                return Err(ApiError::ConfigError(format!(
                    "adapter is bound to datacenter '{}' but the spec names '{}'",
                    self.api.datacenter(),
                    location
                )));
            }
        }

        let (created, request) = self.api.create_server(&create_body(spec)?).await?;
        debug!("created server {} for '{}'", created.id, spec.name);
        self.api.await_request(request, "server create").await?;

        // Read back for the provisioned view; if the read races a delete,
        // report the node the caller owns from what the create echoed.
        match self.api.get_server(&created.id).await? {
            Some(server) => Ok(server_to_node(server, self.api.datacenter())),
            None => Ok(NodeMetadata {
                id: created.id,
                name: spec.name.clone(),
                state: NodeState::Pending,
                provider: PROVIDER_ID.to_string(),
                location_id: Some(self.api.datacenter().to_string()),
                image_id: Some(spec.image_id.clone()),
                hardware_id: Some(spec.hardware_id.clone()),
                public_addresses: Vec::new(),
                private_addresses: Vec::new(),
                created_at: None,
            }),
        }
    }

    async fn destroy_node(&self, id: &str) -> ApiResult<()> {
        // delete() maps an already-gone server to None, so only a tracked
        // deletion waits.
        if let Some(url) = self.api.delete_server(id).await? {
            self.api.await_request(Some(url), "server delete").await?;
        }
        Ok(())
    }

    async fn reboot_node(&self, id: &str) -> ApiResult<()> {
        let request = self.api.server_command(id, "reboot").await?;
        self.api.await_request(request, "server reboot").await
    }

    /// Stop is the closest native verb: the server deallocates and
    /// reports SHUTOFF, which maps to suspended.
    async fn suspend_node(&self, id: &str) -> ApiResult<()> {
        let request = self.api.server_command(id, "stop").await?;
        self.api.await_request(request, "server stop").await
    }

    async fn resume_node(&self, id: &str) -> ApiResult<()> {
        let request = self.api.server_command(id, "start").await?;
        self.api.await_request(request, "server start").await
    }

    async fn list_images(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Image>> {
        // CDROM isos cannot back a boot volume; drop them but keep the
        // raw page's marker so paging still walks the full listing.
        let (items, next) = self.api.list_images(marker).await?.into_parts();
        let images = items
            .into_iter()
            .filter(|image| image.properties.image_type.as_deref() != Some("CDROM"))
            .map(image_to_model)
            .collect();
        Ok(PaginatedCollection::new(images, next))
    }

    async fn get_image(&self, id: &str) -> ApiResult<Option<Image>> {
        Ok(self.api.get_image(id).await?.map(image_to_model))
    }

    async fn list_hardware(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Hardware>> {
        // The synthesized catalog fits one page.
        if marker.is_some() {
            return Ok(PaginatedCollection::last(Vec::new()));
        }
        Ok(PaginatedCollection::last(hardware_catalog()))
    }

    async fn list_locations(&self) -> ApiResult<Vec<Location>> {
        Ok(self
            .api
            .list_datacenters()
            .await?
            .into_iter()
            .map(datacenter_to_location)
            .collect())
    }
}

fn create_body(spec: &NodeSpec) -> ApiResult<serde_json::Value> {
    let (cores, ram_mb) = parse_hardware_id(&spec.hardware_id)?;
    let volume_gb = match spec.option("volume_gb") {
        Some(raw) => raw.parse::<u64>().map_err(|_| ApiError::StatusError {
            status: 400,
            message: format!("option volume_gb '{}' is not a whole number of GB", raw),
        })?,
        None => DEFAULT_VOLUME_GB,
    };
    for key in spec.options.keys() {
        if key != "volume_gb" {
            warn!("ignoring unknown create option '{}'", key);
        }
    }

    Ok(json!({
        "properties": {
            "name": spec.name,
            "cores": cores,
            "ram": ram_mb,
        },
        "entities": {
            "volumes": {
                "items": [{
                    "properties": {
                        "name": format!("{}-boot", spec.name),
                        "size": volume_gb,
                        "image": spec.image_id,
                        "type": "HDD",
                    }
                }]
            }
        }
    }))
}

fn parse_hardware_id(id: &str) -> ApiResult<(u32, u64)> {
    let mut parts = id.splitn(2, '-');
    let cores = parts.next().and_then(|s| s.parse::<u32>().ok());
    let ram_mb = parts.next().and_then(|s| s.parse::<u64>().ok());
    match (cores, ram_mb) {
        (Some(cores), Some(ram_mb)) if cores > 0 && ram_mb > 0 => Ok((cores, ram_mb)),
        _ => Err(ApiError::StatusError {
            status: 400,
            message: format!("hardware id '{}' is not of the form <cores>-<ram_mb>", id),
        }),
    }
}

fn hardware_catalog() -> Vec<Hardware> {
    let mut profiles = Vec::with_capacity(HARDWARE_CORES.len() * HARDWARE_RAM_MB.len());
    for &cores in HARDWARE_CORES {
        for &ram_mb in HARDWARE_RAM_MB {
            profiles.push(Hardware {
                id: format!("{}-{}", cores, ram_mb),
                name: format!("{} core / {} MB", cores, ram_mb),
                cores,
                ram_mb,
                disk_gb: None,
            });
        }
    }
    profiles
}

fn server_to_node(server: IonosServer, datacenter: &str) -> NodeMetadata {
    let state = map_server_state(
        server.metadata.as_ref().map(|m| m.state.as_str()),
        &server.properties.vm_state,
    );
    let created_at = server.metadata.as_ref().and_then(|m| m.created_date);

    let mut public_addresses = Vec::new();
    let mut private_addresses = Vec::new();
    if let Some(entities) = &server.entities {
        for nic in &entities.nics.items {
            for ip in &nic.properties.ips {
                if is_private_addr(ip) {
                    private_addresses.push(ip.clone());
                } else {
                    public_addresses.push(ip.clone());
                }
            }
        }
    }
    public_addresses.sort();
    private_addresses.sort();

    NodeMetadata {
        id: server.id,
        name: server.properties.name,
        state,
        provider: PROVIDER_ID.to_string(),
        location_id: Some(datacenter.to_string()),
        // The boot volume's image is only reachable through a deeper
        // expansion than listings carry.
        image_id: None,
        hardware_id: Some(format!(
            "{}-{}",
            server.properties.cores, server.properties.ram
        )),
        public_addresses,
        private_addresses,
        created_at,
    }
}

fn image_to_model(image: IonosImage) -> Image {
    Image {
        id: image.id,
        name: image.properties.name,
        os_family: image
            .properties
            .licence_type
            .as_deref()
            .and_then(os_family_of),
        size_bytes: image.properties.size.map(|gb| (gb * BYTES_PER_GB) as u64),
        public: image.properties.public,
        location_id: image.properties.location,
    }
}

/// Licence types name an OS coarsely: LINUX, WINDOWS2022 and friends.
fn os_family_of(licence_type: &str) -> Option<String> {
    let lower = licence_type.to_ascii_lowercase();
    if lower.starts_with("windows") {
        Some("windows".to_string())
    } else if lower == "linux" {
        Some("linux".to_string())
    } else {
        None
    }
}

fn datacenter_to_location(datacenter: Datacenter) -> Location {
    // Region codes read "de/fra", "us/las"; the prefix is the country.
    let country = datacenter
        .properties
        .location
        .as_deref()
        .and_then(|code| code.split('/').next())
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_ascii_uppercase);
    Location {
        id: datacenter.id,
        name: datacenter.properties.name,
        country,
    }
}
