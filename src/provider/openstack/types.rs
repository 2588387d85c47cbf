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

//! Wire types for the OpenStack compute dialect.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::compute::model::NodeState;

/// One hypermedia link as the API emits them.
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// Find the `next` link of a listing, if any.
pub fn next_link(links: &[Link]) -> Option<&str> {
    links
        .iter()
        .find(|l| l.rel == "next")
        .map(|l| l.href.as_str())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServersEnvelope {
    pub servers: Vec<Server>,
    #[serde(default, rename = "servers_links")]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerEnvelope {
    pub server: Server,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub addresses: HashMap<String, Vec<Address>>,
    /// Absent or an empty string for boot-from-volume servers.
    #[serde(default, deserialize_with = "image_ref")]
    pub image: Option<String>,
    #[serde(default)]
    pub flavor: Option<FlavorRef>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, rename = "OS-EXT-AZ:availability_zone")]
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    pub addr: String,
    #[serde(default, rename = "OS-EXT-IPS:type")]
    pub ip_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedServerEnvelope {
    pub server: CreatedServer,
}

/// The create response carries the id and little else.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedServer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesEnvelope {
    pub images: Vec<OsImage>,
    #[serde(default, rename = "images_links")]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageEnvelope {
    pub image: OsImage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsImage {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default, rename = "OS-EXT-IMG-SIZE:size")]
    pub size: Option<u64>,
    #[serde(default)]
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorsEnvelope {
    pub flavors: Vec<Flavor>,
    #[serde(default, rename = "flavors_links")]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Flavor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vcpus: u32,
    /// Memory in MiB.
    #[serde(default)]
    pub ram: u64,
    /// Root disk in GiB, 0 when diskless.
    #[serde(default)]
    pub disk: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityZonesEnvelope {
    #[serde(rename = "availabilityZoneInfo")]
    pub zones: Vec<AvailabilityZone>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityZone {
    #[serde(rename = "zoneName")]
    pub name: String,
    #[serde(default, rename = "zoneState")]
    pub state: Option<ZoneState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneState {
    #[serde(default)]
    pub available: bool,
}

/// Accept an image reference as `{"id": ...}`, a bare string, an empty
/// string, or nothing at all. Boot-from-volume servers report `""`.
fn image_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Object { id: String },
        Text(String),
    }

    let wire = Option::<Wire>::deserialize(deserializer)?;
    Ok(match wire {
        Some(Wire::Object { id }) => Some(id),
        Some(Wire::Text(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Collapse a provider status word onto the generic lifecycle.
///
/// The resize/migrate family is in-flight work, so it reads as pending;
/// powered-off and shelved servers still exist and read as suspended.
pub fn map_status(status: &str) -> NodeState {
    match status.to_ascii_uppercase().as_str() {
        "ACTIVE" => NodeState::Running,
        "BUILD" | "BUILDING" | "REBUILD" | "REBOOT" | "HARD_REBOOT" | "PASSWORD" | "RESIZE"
        | "REVERT_RESIZE" | "VERIFY_RESIZE" | "MIGRATING" => NodeState::Pending,
        "PAUSED" | "SUSPENDED" | "SHUTOFF" | "SHELVED" | "SHELVED_OFFLOADED" => {
            NodeState::Suspended
        }
        "DELETED" | "SOFT_DELETED" => NodeState::Terminated,
        "ERROR" => NodeState::Error,
        other => NodeState::Unrecognized(other.to_string()),
    }
}
