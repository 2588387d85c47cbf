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

//! Wire types for the IONOS-style compute dialect.
//!
//! Everything is an `{"id", "properties", "metadata", "entities"}` envelope;
//! listings wrap their elements in an `items` array.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::compute::model::NodeState;

/// An `items` collection as the API nests them.
#[derive(Debug, Clone, Deserialize)]
pub struct Items<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for Items<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IonosServer {
    pub id: String,
    #[serde(default)]
    pub properties: ServerProperties,
    #[serde(default)]
    pub metadata: Option<ResourceMetadata>,
    #[serde(default)]
    pub entities: Option<ServerEntities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerProperties {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cores: u32,
    /// Memory in MB.
    #[serde(default)]
    pub ram: u64,
    #[serde(default, rename = "vmState")]
    pub vm_state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceMetadata {
    /// Provisioning state: AVAILABLE, BUSY or INACTIVE.
    #[serde(default)]
    pub state: String,
    #[serde(default, rename = "createdDate")]
    pub created_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEntities {
    #[serde(default)]
    pub nics: Items<Nic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nic {
    #[serde(default)]
    pub properties: NicProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NicProperties {
    #[serde(default)]
    pub ips: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IonosImage {
    pub id: String,
    #[serde(default)]
    pub properties: ImageProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageProperties {
    #[serde(default)]
    pub name: String,
    /// Region code such as `de/fra`.
    #[serde(default)]
    pub location: Option<String>,
    /// Image size in GB.
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default, rename = "licenceType")]
    pub licence_type: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "imageType")]
    pub image_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Datacenter {
    pub id: String,
    #[serde(default)]
    pub properties: DatacenterProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatacenterProperties {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Status resource behind the `Location` header of accepted mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestStatus {
    #[serde(default)]
    pub metadata: RequestStatusMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestStatusMetadata {
    /// QUEUED, RUNNING, DONE or FAILED.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Collapse the provisioning/vm state pair onto the generic lifecycle.
///
/// A BUSY resource is mid-mutation whatever its vm state claims, and an
/// INACTIVE one is deprovisioned.
pub fn map_server_state(metadata_state: Option<&str>, vm_state: &str) -> NodeState {
    match metadata_state.map(str::to_ascii_uppercase).as_deref() {
        Some("BUSY") => return NodeState::Pending,
        Some("INACTIVE") => return NodeState::Terminated,
        _ => {}
    }
    match vm_state.to_ascii_uppercase().as_str() {
        "RUNNING" => NodeState::Running,
        "SHUTOFF" | "SHUTDOWN" | "PAUSED" => NodeState::Suspended,
        "BLOCKED" | "NOSTATE" | "" => NodeState::Pending,
        "CRASHED" => NodeState::Error,
        other => NodeState::Unrecognized(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_mapping() {
        assert_eq!(map_server_state(Some("BUSY"), "RUNNING"), NodeState::Pending);
        assert_eq!(
            map_server_state(Some("INACTIVE"), "RUNNING"),
            NodeState::Terminated
        );
        assert_eq!(
            map_server_state(Some("AVAILABLE"), "RUNNING"),
            NodeState::Running
        );
        assert_eq!(map_server_state(None, "SHUTOFF"), NodeState::Suspended);
        assert_eq!(map_server_state(None, "BLOCKED"), NodeState::Pending);
        assert_eq!(map_server_state(None, ""), NodeState::Pending);
        assert_eq!(map_server_state(None, "CRASHED"), NodeState::Error);
        assert_eq!(
            map_server_state(None, "HIBERNATING"),
            NodeState::Unrecognized("HIBERNATING".to_string())
        );
    }

    #[test]
    fn test_server_deserialization() {
        let server: IonosServer = serde_json::from_str(
            r#"{
                "id": "srv-1",
                "type": "server",
                "properties": {"name": "web-1", "cores": 2, "ram": 4096, "vmState": "RUNNING"},
                "metadata": {"state": "AVAILABLE", "createdDate": "2024-03-01T08:00:00Z"},
                "entities": {
                    "nics": {"items": [{"properties": {"ips": ["85.215.1.4", "10.7.0.2"]}}]}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(server.properties.cores, 2);
        assert_eq!(server.properties.ram, 4096);
        assert_eq!(server.metadata.as_ref().unwrap().state, "AVAILABLE");
        let nics = &server.entities.unwrap().nics.items;
        assert_eq!(nics[0].properties.ips.len(), 2);
    }

    #[test]
    fn test_sparse_server_deserialization() {
        // depth=0 responses carry bare ids.
        let server: IonosServer = serde_json::from_str(r#"{"id": "srv-2"}"#).unwrap();
        assert_eq!(server.id, "srv-2");
        assert_eq!(server.properties.name, "");
        assert!(server.metadata.is_none());
        assert!(server.entities.is_none());
    }

    #[test]
    fn test_items_collection() {
        let items: Items<IonosServer> = serde_json::from_str(
            r#"{"id": "x", "type": "collection", "items": [{"id": "srv-1"}, {"id": "srv-2"}]}"#,
        )
        .unwrap();
        assert_eq!(items.items.len(), 2);

        let empty: Items<IonosServer> = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_request_status_deserialization() {
        let status: RequestStatus = serde_json::from_str(
            r#"{"metadata": {"status": "FAILED", "message": "insufficient capacity"}}"#,
        )
        .unwrap();
        assert_eq!(status.metadata.status, "FAILED");
        assert_eq!(
            status.metadata.message.as_deref(),
            Some("insufficient capacity")
        );
    }

    #[test]
    fn test_image_deserialization() {
        let image: IonosImage = serde_json::from_str(
            r#"{
                "id": "img-1",
                "properties": {
                    "name": "debian-12.qcow2",
                    "location": "de/fra",
                    "size": 2.0,
                    "licenceType": "LINUX",
                    "public": true,
                    "imageType": "HDD"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(image.properties.size, Some(2.0));
        assert_eq!(image.properties.licence_type.as_deref(), Some("LINUX"));
        assert!(image.properties.public);
    }
}
