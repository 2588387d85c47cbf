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
use tracing::debug;

use crate::api::error::ApiResult;
use crate::api::page::{PageMarker, PaginatedCollection};
use crate::compute::adapter::ComputeServiceAdapter;
use crate::compute::model::{
    is_private_addr, Hardware, Image, Location, NodeMetadata, NodeSpec, NodeState,
};
use crate::provider::config::ProviderConfig;

use super::api::NovaApi;
use super::types::{map_status, AvailabilityZone, Flavor, OsImage, Server};

pub const PROVIDER_ID: &str = "openstack";

/// [`ComputeServiceAdapter`] for OpenStack-style clouds.
pub struct OpenStackAdapter {
    api: NovaApi,
}

impl OpenStackAdapter {
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        Ok(Self {
            api: NovaApi::from_config(config)?,
        })
    }
}

#[async_trait]
impl ComputeServiceAdapter for OpenStackAdapter {
    fn provider(&self) -> &str {
        PROVIDER_ID
    }

    async fn list_nodes(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<NodeMetadata>> {
        Ok(self.api.list_servers(marker).await?.map(server_to_node))
    }

    async fn get_node(&self, id: &str) -> ApiResult<Option<NodeMetadata>> {
        Ok(self.api.get_server(id).await?.map(server_to_node))
    }

    async fn create_node(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata> {
        let id = self.api.create_server(spec).await?;
        debug!("created server {} for '{}'", id, spec.name);

        // The create response is nearly empty; read the server back for a
        // fully populated view. A vanishing read still reports the node
        // the caller owns now.
        match self.api.get_server(&id).await? {
            Some(server) => Ok(server_to_node(server)),
            None => Ok(NodeMetadata {
                id,
                name: spec.name.clone(),
                state: NodeState::Pending,
                provider: PROVIDER_ID.to_string(),
                location_id: spec.location_id.clone(),
                image_id: Some(spec.image_id.clone()),
                hardware_id: Some(spec.hardware_id.clone()),
                public_addresses: Vec::new(),
                private_addresses: Vec::new(),
                created_at: None,
            }),
        }
    }

    async fn destroy_node(&self, id: &str) -> ApiResult<()> {
        self.api.delete_server(id).await
    }

    async fn reboot_node(&self, id: &str) -> ApiResult<()> {
        self.api
            .server_action(id, json!({"reboot": {"type": "SOFT"}}))
            .await
    }

    async fn suspend_node(&self, id: &str) -> ApiResult<()> {
        self.api.server_action(id, json!({"suspend": null})).await
    }

    async fn resume_node(&self, id: &str) -> ApiResult<()> {
        self.api.server_action(id, json!({"resume": null})).await
    }

    async fn list_images(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Image>> {
        Ok(self.api.list_images(marker).await?.map(image_to_model))
    }

    async fn get_image(&self, id: &str) -> ApiResult<Option<Image>> {
        Ok(self.api.get_image(id).await?.map(image_to_model))
    }

    async fn list_hardware(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Hardware>> {
        Ok(self.api.list_flavors(marker).await?.map(flavor_to_hardware))
    }

    async fn list_locations(&self) -> ApiResult<Vec<Location>> {
        Ok(self
            .api
            .list_availability_zones()
            .await?
            .into_iter()
            .map(zone_to_location)
            .collect())
    }
}

fn server_to_node(server: Server) -> NodeMetadata {
    let mut public_addresses = Vec::new();
    let mut private_addresses = Vec::new();
    for addresses in server.addresses.into_values() {
        for address in addresses {
            let is_private = match address.ip_type.as_deref() {
                Some("floating") => false,
                Some("fixed") => true,
                // No type annotation; fall back to the address range.
                _ => is_private_addr(&address.addr),
            };
            if is_private {
                private_addresses.push(address.addr);
            } else {
                public_addresses.push(address.addr);
            }
        }
    }
    public_addresses.sort();
    private_addresses.sort();

    NodeMetadata {
        id: server.id,
        name: server.name,
        state: map_status(&server.status),
        provider: PROVIDER_ID.to_string(),
        location_id: server.availability_zone,
        image_id: server.image,
        hardware_id: server.flavor.map(|f| f.id),
        public_addresses,
        private_addresses,
        created_at: server.created,
    }
}

fn image_to_model(image: OsImage) -> Image {
    Image {
        id: image.id,
        name: image.name,
        os_family: image.metadata.get("os_distro").cloned(),
        size_bytes: image.size,
        public: image.visibility.as_deref() == Some("public"),
        location_id: None,
    }
}

fn flavor_to_hardware(flavor: Flavor) -> Hardware {
    Hardware {
        id: flavor.id,
        name: flavor.name,
        cores: flavor.vcpus,
        ram_mb: flavor.ram,
        disk_gb: (flavor.disk > 0).then_some(flavor.disk),
    }
}

fn zone_to_location(zone: AvailabilityZone) -> Location {
    Location {
        id: zone.name.clone(),
        name: zone.name,
        country: None,
    }
}
