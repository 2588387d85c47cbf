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

use super::api::CloudSigmaApi;
use super::types::{map_server_status, CsServer, LibraryDrive};

pub const PROVIDER_ID: &str = "cloudsigma";

/// Sizing is free-form MHz and bytes; expose named tiers so callers can
/// pick hardware by id.
struct SizeTier {
    id: &'static str,
    cores: u32,
    mhz: u64,
    ram_mb: u64,
}

const SIZE_TIERS: &[SizeTier] = &[
    SizeTier { id: "micro", cores: 1, mhz: 1000, ram_mb: 1024 },
    SizeTier { id: "small", cores: 1, mhz: 2000, ram_mb: 2048 },
    SizeTier { id: "medium", cores: 2, mhz: 4000, ram_mb: 4096 },
    SizeTier { id: "large", cores: 4, mhz: 8000, ram_mb: 8192 },
    SizeTier { id: "xlarge", cores: 8, mhz: 16000, ram_mb: 16384 },
];

const BYTES_PER_MB: u64 = 1024 * 1024;

/// [`ComputeServiceAdapter`] for CloudSigma-style clouds.
///
/// Power actions acknowledge quickly and the server transitions in the
/// background; only the operations that need an intermediate state,
/// reboot and destroy, wait for it.
pub struct CloudSigmaAdapter {
    api: CloudSigmaApi,
}

impl CloudSigmaAdapter {
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        Ok(Self {
            api: CloudSigmaApi::from_config(config)?,
        })
    }
}

#[async_trait]
impl ComputeServiceAdapter for CloudSigmaAdapter {
    fn provider(&self) -> &str {
        PROVIDER_ID
    }

    async fn list_nodes(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<NodeMetadata>> {
        let region = self.api.region().to_string();
        Ok(self
            .api
            .list_servers(marker)
            .await?
            .map(|server| server_to_node(server, &region)))
    }

    async fn get_node(&self, id: &str) -> ApiResult<Option<NodeMetadata>> {
        Ok(self
            .api
            .get_server(id)
            .await?
            .map(|server| server_to_node(server, self.api.region())))
    }

    async fn create_node(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata> {
        if let Some(location) = &spec.location_id {
            if location != self.api.region() {
                return Err(ApiError::ConfigError(format!(
                    "adapter is bound to region '{}' but the spec names '{}'",
                    self.api.region(),
                    location
                )));
            }
        }

        let created = self.api.create_server(&create_body(spec)?).await?;
        debug!("created server {} for '{}'", created.uuid, spec.name);

        // Servers are born stopped; start is a separate call.
        self.api.server_action(&created.uuid, "start").await?;

        match self.api.get_server(&created.uuid).await? {
            Some(server) => Ok(server_to_node(server, self.api.region())),
            None => Ok(NodeMetadata {
                id: created.uuid,
                name: spec.name.clone(),
                state: NodeState::Pending,
                provider: PROVIDER_ID.to_string(),
                location_id: Some(self.api.region().to_string()),
                image_id: Some(spec.image_id.clone()),
                hardware_id: Some(spec.hardware_id.clone()),
                public_addresses: Vec::new(),
                private_addresses: Vec::new(),
                created_at: None,
            }),
        }
    }

    /// Destroy stops the server first when needed; the API refuses to
    /// delete a running one.
    async fn destroy_node(&self, id: &str) -> ApiResult<()> {
        let Some(server) = self.api.get_server(id).await? else {
            debug!("server {} already gone", id);
            return Ok(());
        };
        if server.status != "stopped" {
            self.api.server_action(id, "stop").await?;
            self.api.await_status(id, "stopped").await?;
        }
        self.api.delete_server(id).await
    }

    /// There is no native reboot; compose it from stop and start.
    async fn reboot_node(&self, id: &str) -> ApiResult<()> {
        let Some(server) = self.api.get_server(id).await? else {
            return Err(ApiError::StatusError {
                status: 404,
                message: format!("server {} not found", id),
            });
        };
        if server.status == "running" || server.status == "starting" {
            self.api.server_action(id, "stop").await?;
            self.api.await_status(id, "stopped").await?;
        }
        self.api.server_action(id, "start").await
    }

    async fn suspend_node(&self, id: &str) -> ApiResult<()> {
        self.api.server_action(id, "stop").await
    }

    async fn resume_node(&self, id: &str) -> ApiResult<()> {
        self.api.server_action(id, "start").await
    }

    async fn list_images(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Image>> {
        // Install CDs cannot boot a server on their own; keep only
        // preinstalled drives, preserving the raw page's marker.
        let region = self.api.region().to_string();
        let (objects, next) = self.api.list_library_drives(marker).await?.into_parts();
        let images = objects
            .into_iter()
            .filter(|drive| drive.image_type.as_deref() != Some("install"))
            .map(|drive| drive_to_image(drive, &region))
            .collect();
        Ok(PaginatedCollection::new(images, next))
    }

    async fn get_image(&self, id: &str) -> ApiResult<Option<Image>> {
        Ok(self
            .api
            .get_library_drive(id)
            .await?
            .map(|drive| drive_to_image(drive, self.api.region())))
    }

    async fn list_hardware(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Hardware>> {
        // The tier catalog fits one page.
        if marker.is_some() {
            return Ok(PaginatedCollection::last(Vec::new()));
        }
        Ok(PaginatedCollection::last(
            SIZE_TIERS.iter().map(tier_to_hardware).collect(),
        ))
    }

    /// One endpoint serves one region, so the catalog has one entry.
    async fn list_locations(&self) -> ApiResult<Vec<Location>> {
        Ok(vec![Location {
            id: self.api.region().to_string(),
            name: self.api.region().to_string(),
            country: None,
        }])
    }
}

fn create_body(spec: &NodeSpec) -> ApiResult<serde_json::Value> {
    let tier = tier(&spec.hardware_id).ok_or_else(|| ApiError::StatusError {
        status: 400,
        message: format!(
            "unknown hardware tier '{}', expected one of {}",
            spec.hardware_id,
            SIZE_TIERS
                .iter()
                .map(|t| t.id)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })?;

    for key in spec.options.keys() {
        if key != "vnc_password" {
            warn!("ignoring unknown create option '{}'", key);
        }
    }

    let mut server = json!({
        "name": spec.name,
        "cpu": tier.mhz,
        "mem": tier.ram_mb * BYTES_PER_MB,
        "smp": tier.cores,
        "drives": [{
            "boot_order": 1,
            "dev_channel": "0:0",
            "device": "virtio",
            "drive": spec.image_id,
        }],
        "nics": [{"ip_v4_conf": {"conf": "dhcp"}}],
    });
    if let Some(vnc_password) = spec.option("vnc_password") {
        server["vnc_password"] = json!(vnc_password);
    }

    Ok(json!({ "objects": [server] }))
}

fn tier(id: &str) -> Option<&'static SizeTier> {
    SIZE_TIERS.iter().find(|tier| tier.id == id)
}

fn tier_to_hardware(tier: &SizeTier) -> Hardware {
    Hardware {
        id: tier.id.to_string(),
        name: format!(
            "{} ({} core @ {} MHz, {} MB)",
            tier.id, tier.cores, tier.mhz, tier.ram_mb
        ),
        cores: tier.cores,
        ram_mb: tier.ram_mb,
        disk_gb: None,
    }
}

fn server_to_node(server: CsServer, region: &str) -> NodeMetadata {
    let mut public_addresses = Vec::new();
    let mut private_addresses = Vec::new();
    for nic in &server.nics {
        let ip = nic.runtime.as_ref().and_then(|r| r.ip_v4.as_ref());
        if let Some(ip) = ip {
            if is_private_addr(&ip.uuid) {
                private_addresses.push(ip.uuid.clone());
            } else {
                public_addresses.push(ip.uuid.clone());
            }
        }
    }
    public_addresses.sort();
    private_addresses.sort();

    let image_id = server
        .drives
        .iter()
        .find(|drive| drive.boot_order == Some(1))
        .and_then(|drive| drive.drive.as_ref())
        .map(|r| r.uuid.clone());

    let hardware_id = matching_tier(&server);

    NodeMetadata {
        id: server.uuid,
        name: server.name,
        state: map_server_status(&server.status),
        provider: PROVIDER_ID.to_string(),
        location_id: Some(region.to_string()),
        image_id,
        hardware_id,
        public_addresses,
        private_addresses,
        // The detail view carries no creation timestamp.
        created_at: None,
    }
}

/// Reverse-match free-form sizing onto a tier id, when it fits exactly.
fn matching_tier(server: &CsServer) -> Option<String> {
    SIZE_TIERS
        .iter()
        .find(|tier| {
            u64::from(tier.cores) == server.smp
                && tier.mhz == server.cpu
                && tier.ram_mb * BYTES_PER_MB == server.mem
        })
        .map(|tier| tier.id.to_string())
}

fn drive_to_image(drive: LibraryDrive, region: &str) -> Image {
    Image {
        id: drive.uuid,
        name: drive.name,
        os_family: drive.os,
        size_bytes: Some(drive.size),
        // The library is the provider's public catalog.
        public: true,
        location_id: Some(region.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_server() -> CsServer {
        serde_json::from_str(
            r#"{
                "uuid": "a1b2",
                "name": "web-1",
                "status": "running",
                "cpu": 4000,
                "mem": 4294967296,
                "smp": 2,
                "drives": [{"boot_order": 1, "drive": {"uuid": "drive-9"}}],
                "nics": [
                    {"runtime": {"ip_v4": {"uuid": "31.171.246.37"}}},
                    {"runtime": {"ip_v4": {"uuid": "10.9.0.4"}}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_server_to_node() {
        let node = server_to_node(sample_server(), "zrh");
        assert_eq!(node.id, "a1b2");
        assert_eq!(node.state, NodeState::Running);
        assert_eq!(node.provider, "cloudsigma");
        assert_eq!(node.location_id.as_deref(), Some("zrh"));
        assert_eq!(node.image_id.as_deref(), Some("drive-9"));
        assert_eq!(node.hardware_id.as_deref(), Some("medium"));
        assert_eq!(node.public_addresses, vec!["31.171.246.37"]);
        assert_eq!(node.private_addresses, vec!["10.9.0.4"]);
    }

    #[test]
    fn test_odd_sizing_has_no_tier() {
        let mut server = sample_server();
        server.cpu = 3700;
        assert_eq!(matching_tier(&server), None);
    }

    #[test]
    fn test_create_body() {
        let spec = NodeSpec::new("web-1", "drive-9", "medium").with_option("vnc_password", "pw");
        let body = create_body(&spec).unwrap();
        let server = &body["objects"][0];
        assert_eq!(server["name"], "web-1");
        assert_eq!(server["cpu"], 4000);
        assert_eq!(server["smp"], 2);
        assert_eq!(server["mem"], 4096u64 * 1024 * 1024);
        assert_eq!(server["drives"][0]["drive"], "drive-9");
        assert_eq!(server["vnc_password"], "pw");
    }

    #[test]
    fn test_create_body_without_vnc_password() {
        let spec = NodeSpec::new("web-1", "drive-9", "small");
        let body = create_body(&spec).unwrap();
        assert!(body["objects"][0].get("vnc_password").is_none());
    }

    #[test]
    fn test_create_body_rejects_unknown_tier() {
        let spec = NodeSpec::new("web-1", "drive-9", "2-4096");
        let err = create_body(&spec).unwrap_err();
        assert!(matches!(err, ApiError::StatusError { status: 400, .. }));
        assert!(err.to_string().contains("micro"));
    }

    #[test]
    fn test_tier_catalog() {
        let tiers: Vec<Hardware> = SIZE_TIERS.iter().map(tier_to_hardware).collect();
        assert_eq!(tiers.len(), 5);
        assert!(tiers.iter().any(|h| h.id == "micro"));
        assert!(tiers.iter().any(|h| h.id == "xlarge"));
        let medium = tiers.iter().find(|h| h.id == "medium").unwrap();
        assert_eq!(medium.cores, 2);
        assert_eq!(medium.ram_mb, 4096);
    }

    #[test]
    fn test_drive_to_image() {
        let drive: LibraryDrive = serde_json::from_str(
            r#"{
                "uuid": "d-1",
                "name": "Debian 12",
                "size": 2147483648,
                "os": "linux",
                "image_type": "preinst"
            }"#,
        )
        .unwrap();
        let image = drive_to_image(drive, "zrh");
        assert_eq!(image.os_family.as_deref(), Some("linux"));
        assert_eq!(image.size_bytes, Some(2147483648));
        assert_eq!(image.location_id.as_deref(), Some("zrh"));
        assert!(image.public);
    }
}
