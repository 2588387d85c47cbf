//! Provider-independent compute model.
//!
//! Every adapter maps its provider's wire types onto these structs, so the
//! service layer and callers never see provider-specific shapes.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a node, collapsed from provider-specific vocabularies.
///
/// Providers report states this library has never heard of; those survive as
/// [`NodeState::Unrecognized`] instead of failing deserialization or being
/// silently folded into an existing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Being built or otherwise in transition toward running.
    Pending,
    Running,
    Suspended,
    /// Destroyed or shut down. Gone-from-the-API also reads as terminated.
    Terminated,
    /// The provider reports the node as failed.
    Error,
    /// A provider state with no generic equivalent, kept verbatim.
    #[serde(untagged)]
    Unrecognized(String),
}

impl NodeState {
    /// Whether this state is one a poll should stop on.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeState::Running | NodeState::Suspended | NodeState::Terminated | NodeState::Error
        )
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Pending => write!(f, "pending"),
            NodeState::Running => write!(f, "running"),
            NodeState::Suspended => write!(f, "suspended"),
            NodeState::Terminated => write!(f, "terminated"),
            NodeState::Error => write!(f, "error"),
            NodeState::Unrecognized(s) => write!(f, "{}", s),
        }
    }
}

/// A compute instance as seen through the generic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub id: String,
    pub name: String,
    pub state: NodeState,
    /// Identifier of the provider that owns this node.
    pub provider: String,
    pub location_id: Option<String>,
    pub image_id: Option<String>,
    pub hardware_id: Option<String>,
    pub public_addresses: Vec<String>,
    pub private_addresses: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A bootable template for new nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub os_family: Option<String>,
    pub size_bytes: Option<u64>,
    /// Whether the image is provider-published rather than account-owned.
    pub public: bool,
    pub location_id: Option<String>,
}

/// A machine size: cores plus memory, optionally with local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardware {
    pub id: String,
    pub name: String,
    pub cores: u32,
    pub ram_mb: u64,
    pub disk_gb: Option<u64>,
}

/// A place nodes can run: a region, a datacenter, or whatever the provider
/// scopes resources by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
}

/// What to create: name plus the image/hardware/location choices, with
/// provider-specific extras carried as free-form options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub image_id: String,
    pub hardware_id: String,
    pub location_id: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl NodeSpec {
    pub fn new(
        name: impl Into<String>,
        image_id: impl Into<String>,
        hardware_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image_id: image_id.into(),
            hardware_id: hardware_id.into(),
            location_id: None,
            options: HashMap::new(),
        }
    }

    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    /// Attach a provider-specific setting, e.g. an availability zone or a
    /// key pair name. Unknown options are logged and ignored by adapters.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// Classify a bare IP address string as private or public.
///
/// For wire formats that do not label their addresses. Unparseable
/// strings and v6 addresses other than loopback count as public.
pub fn is_private_addr(addr: &str) -> bool {
    match addr.parse::<std::net::IpAddr>() {
        Ok(std::net::IpAddr::V4(v4)) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        Ok(std::net::IpAddr::V6(v6)) => v6.is_loopback(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_terminal_classification() {
        assert!(!NodeState::Pending.is_terminal());
        assert!(NodeState::Running.is_terminal());
        assert!(NodeState::Suspended.is_terminal());
        assert!(NodeState::Terminated.is_terminal());
        assert!(NodeState::Error.is_terminal());
        assert!(!NodeState::Unrecognized("MIGRATING".to_string()).is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(NodeState::Running.to_string(), "running");
        assert_eq!(NodeState::Terminated.to_string(), "terminated");
        assert_eq!(
            NodeState::Unrecognized("SHELVED".to_string()).to_string(),
            "SHELVED"
        );
    }

    #[test]
    fn test_state_serializes_as_plain_string() {
        assert_eq!(
            serde_json::to_string(&NodeState::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::to_string(&NodeState::Unrecognized("SHELVED".to_string())).unwrap(),
            "\"SHELVED\""
        );
    }

    #[test]
    fn test_state_deserializes_unknown_as_unrecognized() {
        let state: NodeState = serde_json::from_str("\"suspended\"").unwrap();
        assert_eq!(state, NodeState::Suspended);

        let state: NodeState = serde_json::from_str("\"SHELVED_OFFLOADED\"").unwrap();
        assert_eq!(state, NodeState::Unrecognized("SHELVED_OFFLOADED".to_string()));
    }

    #[test]
    fn test_node_spec_chaining() {
        let spec = NodeSpec::new("web-1", "img-ubuntu", "hw-small")
            .with_location("dc-1")
            .with_option("availability_zone", "az-2")
            .with_option("key_name", "deploy");

        assert_eq!(spec.name, "web-1");
        assert_eq!(spec.image_id, "img-ubuntu");
        assert_eq!(spec.hardware_id, "hw-small");
        assert_eq!(spec.location_id.as_deref(), Some("dc-1"));
        assert_eq!(spec.option("availability_zone"), Some("az-2"));
        assert_eq!(spec.option("key_name"), Some("deploy"));
        assert_eq!(spec.option("missing"), None);
    }

    #[test]
    fn test_node_spec_options_default_when_absent() {
        let spec: NodeSpec = serde_json::from_str(
            r#"{"name": "db-1", "image_id": "img-1", "hardware_id": "hw-1", "location_id": null}"#,
        )
        .unwrap();
        assert!(spec.options.is_empty());
    }

    #[test]
    fn test_private_address_classification() {
        assert!(is_private_addr("10.1.2.3"));
        assert!(is_private_addr("172.16.0.9"));
        assert!(is_private_addr("192.168.0.1"));
        assert!(is_private_addr("127.0.0.1"));
        assert!(is_private_addr("169.254.0.5"));
        assert!(!is_private_addr("203.0.113.5"));
        assert!(!is_private_addr("2001:db8::1"));
        assert!(!is_private_addr("not-an-ip"));
    }
}
