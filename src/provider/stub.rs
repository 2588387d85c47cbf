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

//! In-memory provider with deterministic lifecycle transitions.
//!
//! The stub backs tests, demos and dry runs without network access. Nodes
//! advance on observation instead of wall clock: a created node turns
//! running after `startup_ticks` lookups, a destroyed node stays visible as
//! terminated for exactly one more lookup and then disappears. That makes
//! poll behavior reproducible down to the probe count.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::page::{PageMarker, PaginatedCollection};
use crate::compute::adapter::ComputeServiceAdapter;
use crate::compute::model::{Hardware, Image, Location, NodeMetadata, NodeSpec, NodeState};
use crate::provider::config::ProviderConfig;

const DEFAULT_STARTUP_TICKS: u32 = 2;
const DEFAULT_PAGE_SIZE: u64 = 100;

const KNOWN_OPTIONS: &[&str] = &[
    "timeout",
    "connect_timeout",
    "max_retries",
    "poll_period",
    "poll_timeout",
    "startup_ticks",
    "page_size",
];

struct StubNode {
    node: NodeMetadata,
    /// Observations left before a pending node turns running.
    pending_ticks: u32,
    /// A terminated node is served once more, then removed.
    observed_terminated: bool,
}

struct StubState {
    nodes: BTreeMap<String, StubNode>,
    next_id: u64,
}

/// Deterministic in-memory [`ComputeServiceAdapter`].
pub struct StubAdapter {
    state: Mutex<StubState>,
    images: Vec<Image>,
    hardware: Vec<Hardware>,
    locations: Vec<Location>,
    startup_ticks: u32,
    page_size: u64,
}

impl StubAdapter {
    /// Build a stub from configuration. Recognized options are
    /// `startup_ticks` and `page_size`; unknown options are logged and
    /// ignored.
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        for key in config.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                warn!("ignoring unknown stub option '{}'", key);
            }
        }

        let startup_ticks = config
            .get_parsed_option::<u32>("startup_ticks")?
            .unwrap_or(DEFAULT_STARTUP_TICKS);
        let page_size = config
            .get_parsed_option::<u64>("page_size")?
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .max(1);

        Ok(Self {
            state: Mutex::new(StubState {
                nodes: BTreeMap::new(),
                next_id: 1,
            }),
            images: seed_images(),
            hardware: seed_hardware(),
            locations: seed_locations(),
            startup_ticks,
            page_size,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        // A poisoned lock means a panic mid-test; propagating the panic is
        // the honest behavior there.
        self.state.lock().unwrap()
    }

    /// Advance one node by one observation and return its current view,
    /// or `None` once a terminated node has been served its final time.
    fn observe(entry: &mut StubNode) -> Option<NodeMetadata> {
        if entry.node.state == NodeState::Terminated {
            if entry.observed_terminated {
                return None;
            }
            entry.observed_terminated = true;
            return Some(entry.node.clone());
        }
        if entry.pending_ticks > 0 {
            entry.pending_ticks -= 1;
            if entry.pending_ticks == 0 {
                entry.node.state = NodeState::Running;
            }
        }
        Some(entry.node.clone())
    }

    fn page_of<T: Clone>(
        &self,
        all: Vec<T>,
        marker: Option<PageMarker>,
        what: &str,
    ) -> ApiResult<PaginatedCollection<T>> {
        let offset = match marker {
            None => 0,
            Some(PageMarker::Offset(o)) => o,
            Some(other) => {
                return Err(ApiError::PaginationError(format!(
                    "stub {} listing expects offset markers, got {}",
                    what, other
                )))
            }
        };

        let total = all.len() as u64;
        let start = offset.min(total) as usize;
        let end = (offset.saturating_add(self.page_size)).min(total) as usize;
        let items: Vec<T> = all[start..end].to_vec();

        let next = if (end as u64) < total {
            Some(PageMarker::Offset(end as u64))
        } else {
            None
        };
        Ok(PaginatedCollection::new(items, next))
    }
}

#[async_trait]
impl ComputeServiceAdapter for StubAdapter {
    fn provider(&self) -> &str {
        "stub"
    }

    async fn list_nodes(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<NodeMetadata>> {
        let snapshot: Vec<NodeMetadata> = {
            let mut state = self.lock();
            let mut gone = Vec::new();
            let mut nodes = Vec::new();
            for (id, entry) in state.nodes.iter_mut() {
                match Self::observe(entry) {
                    Some(node) => nodes.push(node),
                    None => gone.push(id.clone()),
                }
            }
            for id in gone {
                state.nodes.remove(&id);
            }
            nodes
        };
        self.page_of(snapshot, marker, "node")
    }

    async fn get_node(&self, id: &str) -> ApiResult<Option<NodeMetadata>> {
        let mut state = self.lock();
        let Some(entry) = state.nodes.get_mut(id) else {
            return Ok(None);
        };
        match Self::observe(entry) {
            Some(node) => Ok(Some(node)),
            None => {
                state.nodes.remove(id);
                Ok(None)
            }
        }
    }

    async fn create_node(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata> {
        if !self.images.iter().any(|i| i.id == spec.image_id) {
            return Err(ApiError::StatusError {
                status: 400,
                message: format!("image {} not found", spec.image_id),
            });
        }
        if !self.hardware.iter().any(|h| h.id == spec.hardware_id) {
            return Err(ApiError::StatusError {
                status: 400,
                message: format!("hardware profile {} not found", spec.hardware_id),
            });
        }
        if let Some(location) = &spec.location_id {
            if !self.locations.iter().any(|l| &l.id == location) {
                return Err(ApiError::StatusError {
                    status: 400,
                    message: format!("location {} not found", location),
                });
            }
        }

        let mut state = self.lock();
        let serial = state.next_id;
        state.next_id += 1;

        let id = format!("stub-{}", serial);
        let node = NodeMetadata {
            id: id.clone(),
            name: spec.name.clone(),
            state: if self.startup_ticks == 0 {
                NodeState::Running
            } else {
                NodeState::Pending
            },
            provider: "stub".to_string(),
            location_id: spec
                .location_id
                .clone()
                .or_else(|| Some(self.locations[0].id.clone())),
            image_id: Some(spec.image_id.clone()),
            hardware_id: Some(spec.hardware_id.clone()),
            public_addresses: vec![format!("203.0.113.{}", serial % 254 + 1)],
            private_addresses: vec![format!("10.0.0.{}", serial % 254 + 1)],
            created_at: Some(Utc::now()),
        };

        debug!("stub created node {} ({})", id, spec.name);
        state.nodes.insert(
            id,
            StubNode {
                node: node.clone(),
                pending_ticks: self.startup_ticks,
                observed_terminated: false,
            },
        );
        Ok(node)
    }

    async fn destroy_node(&self, id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        if let Some(entry) = state.nodes.get_mut(id) {
            entry.node.state = NodeState::Terminated;
            entry.pending_ticks = 0;
            debug!("stub terminated node {}", id);
        }
        // Destroying an unknown node is success, the end state holds.
        Ok(())
    }

    async fn reboot_node(&self, id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        let entry = state.nodes.get_mut(id).ok_or_else(|| ApiError::StatusError {
            status: 404,
            message: format!("node {} not found", id),
        })?;
        if entry.node.state == NodeState::Terminated {
            return Err(ApiError::StatusError {
                status: 409,
                message: format!("node {} is terminated", id),
            });
        }
        entry.node.state = NodeState::Pending;
        entry.pending_ticks = self.startup_ticks.max(1);
        Ok(())
    }

    async fn suspend_node(&self, id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        let entry = state.nodes.get_mut(id).ok_or_else(|| ApiError::StatusError {
            status: 404,
            message: format!("node {} not found", id),
        })?;
        if entry.node.state != NodeState::Running {
            return Err(ApiError::StatusError {
                status: 409,
                message: format!("node {} is not running", id),
            });
        }
        entry.node.state = NodeState::Suspended;
        Ok(())
    }

    async fn resume_node(&self, id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        let entry = state.nodes.get_mut(id).ok_or_else(|| ApiError::StatusError {
            status: 404,
            message: format!("node {} not found", id),
        })?;
        if entry.node.state != NodeState::Suspended {
            return Err(ApiError::StatusError {
                status: 409,
                message: format!("node {} is not suspended", id),
            });
        }
        entry.node.state = NodeState::Running;
        Ok(())
    }

    async fn list_images(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Image>> {
        self.page_of(self.images.clone(), marker, "image")
    }

    async fn get_image(&self, id: &str) -> ApiResult<Option<Image>> {
        Ok(self.images.iter().find(|i| i.id == id).cloned())
    }

    async fn list_hardware(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Hardware>> {
        self.page_of(self.hardware.clone(), marker, "hardware")
    }

    async fn list_locations(&self) -> ApiResult<Vec<Location>> {
        Ok(self.locations.clone())
    }
}

fn seed_images() -> Vec<Image> {
    vec![
        Image {
            id: "img-alpine-3".to_string(),
            name: "Alpine 3.20".to_string(),
            os_family: Some("alpine".to_string()),
            size_bytes: Some(150 * 1024 * 1024),
            public: true,
            location_id: None,
        },
        Image {
            id: "img-debian-12".to_string(),
            name: "Debian 12".to_string(),
            os_family: Some("debian".to_string()),
            size_bytes: Some(2 * 1024 * 1024 * 1024),
            public: true,
            location_id: None,
        },
        Image {
            id: "img-ubuntu-24".to_string(),
            name: "Ubuntu 24.04 LTS".to_string(),
            os_family: Some("ubuntu".to_string()),
            size_bytes: Some(3 * 1024 * 1024 * 1024),
            public: true,
            location_id: Some("loc-a".to_string()),
        },
    ]
}

fn seed_hardware() -> Vec<Hardware> {
    vec![
        Hardware {
            id: "hw-small".to_string(),
            name: "small".to_string(),
            cores: 1,
            ram_mb: 1024,
            disk_gb: Some(20),
        },
        Hardware {
            id: "hw-medium".to_string(),
            name: "medium".to_string(),
            cores: 2,
            ram_mb: 4096,
            disk_gb: Some(40),
        },
        Hardware {
            id: "hw-large".to_string(),
            name: "large".to_string(),
            cores: 4,
            ram_mb: 8192,
            disk_gb: Some(80),
        },
    ]
}

fn seed_locations() -> Vec<Location> {
    vec![
        Location {
            id: "loc-a".to_string(),
            name: "alpha".to_string(),
            country: Some("US".to_string()),
        },
        Location {
            id: "loc-b".to_string(),
            name: "beta".to_string(),
            country: Some("DE".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::page::Pager;

    fn stub() -> StubAdapter {
        StubAdapter::from_config(&ProviderConfig::stub()).unwrap()
    }

    fn spec() -> NodeSpec {
        NodeSpec::new("web-1", "img-debian-12", "hw-small")
    }

    #[tokio::test]
    async fn test_catalog_is_seeded() {
        let adapter = stub();

        let images = adapter.list_images(None).await.unwrap();
        assert_eq!(images.len(), 3);
        assert!(images.is_last());

        let hardware = adapter.list_hardware(None).await.unwrap();
        assert_eq!(hardware.len(), 3);

        let locations = adapter.list_locations().await.unwrap();
        assert_eq!(locations.len(), 2);

        let image = adapter.get_image("img-debian-12").await.unwrap().unwrap();
        assert_eq!(image.os_family.as_deref(), Some("debian"));
        assert!(adapter.get_image("img-nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_starts_pending_then_runs() {
        let adapter = stub();
        let created = adapter.create_node(&spec()).await.unwrap();
        assert_eq!(created.state, NodeState::Pending);
        assert_eq!(created.provider, "stub");
        assert_eq!(created.image_id.as_deref(), Some("img-debian-12"));

        // Default startup_ticks is 2: pending, then running.
        let first = adapter.get_node(&created.id).await.unwrap().unwrap();
        assert_eq!(first.state, NodeState::Pending);
        let second = adapter.get_node(&created.id).await.unwrap().unwrap();
        assert_eq!(second.state, NodeState::Running);
    }

    #[tokio::test]
    async fn test_zero_startup_ticks_runs_immediately() {
        let config = ProviderConfig::stub().with_option("startup_ticks", "0");
        let adapter = StubAdapter::from_config(&config).unwrap();
        let created = adapter.create_node(&spec()).await.unwrap();
        assert_eq!(created.state, NodeState::Running);
    }

    #[tokio::test]
    async fn test_destroy_lingers_once_then_disappears() {
        let config = ProviderConfig::stub().with_option("startup_ticks", "0");
        let adapter = StubAdapter::from_config(&config).unwrap();
        let created = adapter.create_node(&spec()).await.unwrap();

        adapter.destroy_node(&created.id).await.unwrap();

        let lingering = adapter.get_node(&created.id).await.unwrap().unwrap();
        assert_eq!(lingering.state, NodeState::Terminated);
        assert!(adapter.get_node(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let adapter = stub();
        let created = adapter.create_node(&spec()).await.unwrap();

        adapter.destroy_node(&created.id).await.unwrap();
        adapter.destroy_node(&created.id).await.unwrap();
        adapter.destroy_node("stub-9999").await.unwrap();
    }

    #[tokio::test]
    async fn test_reboot_cycles_through_pending() {
        let config = ProviderConfig::stub().with_option("startup_ticks", "1");
        let adapter = StubAdapter::from_config(&config).unwrap();
        let created = adapter.create_node(&spec()).await.unwrap();
        let running = adapter.get_node(&created.id).await.unwrap().unwrap();
        assert_eq!(running.state, NodeState::Running);

        adapter.reboot_node(&created.id).await.unwrap();
        let back = adapter.get_node(&created.id).await.unwrap().unwrap();
        assert_eq!(back.state, NodeState::Running);
    }

    #[tokio::test]
    async fn test_reboot_missing_node_is_not_found() {
        let adapter = stub();
        let err = adapter.reboot_node("stub-404").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_suspend_resume_cycle() {
        let config = ProviderConfig::stub().with_option("startup_ticks", "0");
        let adapter = StubAdapter::from_config(&config).unwrap();
        let created = adapter.create_node(&spec()).await.unwrap();

        adapter.suspend_node(&created.id).await.unwrap();
        let suspended = adapter.get_node(&created.id).await.unwrap().unwrap();
        assert_eq!(suspended.state, NodeState::Suspended);

        // Suspending twice conflicts
        let err = adapter.suspend_node(&created.id).await.unwrap_err();
        assert_eq!(err.status(), Some(409));

        adapter.resume_node(&created.id).await.unwrap();
        let running = adapter.get_node(&created.id).await.unwrap().unwrap();
        assert_eq!(running.state, NodeState::Running);
    }

    #[tokio::test]
    async fn test_create_validates_catalog_ids() {
        let adapter = stub();

        let err = adapter
            .create_node(&NodeSpec::new("x", "img-nope", "hw-small"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));

        let err = adapter
            .create_node(&NodeSpec::new("x", "img-debian-12", "hw-nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));

        let err = adapter
            .create_node(&spec().with_location("loc-nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_node_listing_pages_by_offset() {
        let config = ProviderConfig::stub()
            .with_option("startup_ticks", "0")
            .with_option("page_size", "2");
        let adapter = StubAdapter::from_config(&config).unwrap();
        for i in 0..5 {
            adapter
                .create_node(&NodeSpec::new(
                    format!("n-{}", i),
                    "img-alpine-3",
                    "hw-small",
                ))
                .await
                .unwrap();
        }

        let first = adapter.list_nodes(None).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.next_marker(), Some(&PageMarker::Offset(2)));

        let second = adapter
            .list_nodes(first.next_marker().cloned())
            .await
            .unwrap();
        assert_eq!(second.len(), 2);

        let third = adapter
            .list_nodes(second.next_marker().cloned())
            .await
            .unwrap();
        assert_eq!(third.len(), 1);
        assert!(third.is_last());
    }

    #[tokio::test]
    async fn test_node_listing_through_pager() {
        let config = ProviderConfig::stub()
            .with_option("startup_ticks", "0")
            .with_option("page_size", "2");
        let adapter = std::sync::Arc::new(StubAdapter::from_config(&config).unwrap());
        for i in 0..5 {
            adapter
                .create_node(&NodeSpec::new(
                    format!("n-{}", i),
                    "img-alpine-3",
                    "hw-small",
                ))
                .await
                .unwrap();
        }

        let walker = std::sync::Arc::clone(&adapter);
        let pager = Pager::new("nodes", move |marker| {
            let adapter = std::sync::Arc::clone(&walker);
            async move { adapter.list_nodes(marker).await }
        });
        let all = pager.collect_all().await.unwrap();
        assert_eq!(all.len(), 5);
        // BTreeMap keys give a stable order
        assert_eq!(all[0].name, "n-0");
        assert_eq!(all[4].name, "n-4");
    }

    #[tokio::test]
    async fn test_rejects_foreign_marker_kind() {
        let adapter = stub();
        let err = adapter
            .list_nodes(Some(PageMarker::Token("x".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PaginationError(_)));
    }

    #[tokio::test]
    async fn test_unknown_options_are_tolerated() {
        let config = ProviderConfig::stub().with_option("flux_capacitor", "1.21");
        // Construction succeeds; the option is warned about and ignored.
        assert!(StubAdapter::from_config(&config).is_ok());
    }
}
