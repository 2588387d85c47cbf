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

//! Wire types for the CloudSigma-style compute dialect.
//!
//! Listings wrap their elements in `objects` next to a `meta` block
//! carrying `offset`, `limit` and `total_count`. Sizing is free-form:
//! servers carry raw CPU MHz, memory bytes and an SMP core count
//! instead of referencing a flavor.

use serde::Deserialize;

use crate::compute::model::NodeState;

/// Paging block attached to every listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub total_count: u64,
}

/// One page of a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    #[serde(default = "Vec::new")]
    pub objects: Vec<T>,
    #[serde(default)]
    pub meta: Meta,
}

/// A resource reference, e.g. an attached drive or a runtime IP. IPs
/// are resources keyed by the address itself, so `uuid` holds the
/// dotted form for them.
#[derive(Debug, Clone, Deserialize)]
pub struct Ref {
    pub uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsServer {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    /// Total CPU in MHz.
    #[serde(default)]
    pub cpu: u64,
    /// Memory in bytes.
    #[serde(default)]
    pub mem: u64,
    /// Core count.
    #[serde(default)]
    pub smp: u64,
    #[serde(default)]
    pub drives: Vec<AttachedDrive>,
    #[serde(default)]
    pub nics: Vec<Nic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachedDrive {
    #[serde(default)]
    pub boot_order: Option<u32>,
    #[serde(default)]
    pub drive: Option<Ref>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nic {
    #[serde(default)]
    pub runtime: Option<NicRuntime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NicRuntime {
    #[serde(default)]
    pub ip_v4: Option<Ref>,
}

/// A drive from the public library, served as an image.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDrive {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub os: Option<String>,
    /// `preinst` for bootable drives, `install` for install CDs.
    #[serde(default)]
    pub image_type: Option<String>,
}

/// Map the lowercase status vocabulary onto the generic lifecycle.
pub fn map_server_status(status: &str) -> NodeState {
    match status {
        "running" => NodeState::Running,
        "stopped" | "paused" => NodeState::Suspended,
        "starting" | "stopping" | "cloning" => NodeState::Pending,
        "unavailable" => NodeState::Error,
        other => NodeState::Unrecognized(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_server_status("running"), NodeState::Running);
        assert_eq!(map_server_status("stopped"), NodeState::Suspended);
        assert_eq!(map_server_status("paused"), NodeState::Suspended);
        assert_eq!(map_server_status("starting"), NodeState::Pending);
        assert_eq!(map_server_status("stopping"), NodeState::Pending);
        assert_eq!(map_server_status("unavailable"), NodeState::Error);
        assert_eq!(
            map_server_status("imaging"),
            NodeState::Unrecognized("imaging".to_string())
        );
    }

    #[test]
    fn test_server_deserialization() {
        let server: CsServer = serde_json::from_str(
            r#"{
                "uuid": "a1b2",
                "name": "web-1",
                "status": "running",
                "cpu": 4000,
                "mem": 4294967296,
                "smp": 2,
                "drives": [
                    {"boot_order": 1, "drive": {"uuid": "drive-1"}},
                    {"boot_order": null, "drive": {"uuid": "drive-2"}}
                ],
                "nics": [
                    {"runtime": {"ip_v4": {"uuid": "31.171.246.37"}}},
                    {"runtime": null}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(server.cpu, 4000);
        assert_eq!(server.smp, 2);
        assert_eq!(server.drives[0].boot_order, Some(1));
        assert_eq!(server.drives[1].boot_order, None);
        let ip = server.nics[0].runtime.as_ref().unwrap().ip_v4.as_ref();
        assert_eq!(ip.map(|r| r.uuid.as_str()), Some("31.171.246.37"));
        assert!(server.nics[1].runtime.is_none());
    }

    #[test]
    fn test_listing_deserialization() {
        let listing: Listing<LibraryDrive> = serde_json::from_str(
            r#"{
                "objects": [{"uuid": "d-1", "name": "debian", "size": 2147483648}],
                "meta": {"limit": 20, "offset": 0, "total_count": 311}
            }"#,
        )
        .unwrap();
        assert_eq!(listing.objects.len(), 1);
        assert_eq!(listing.meta.total_count, 311);
    }

    #[test]
    fn test_listing_without_meta() {
        let listing: Listing<CsServer> = serde_json::from_str(r#"{"objects": []}"#).unwrap();
        assert!(listing.objects.is_empty());
        assert_eq!(listing.meta.total_count, 0);
    }
}
