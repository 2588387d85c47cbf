// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::api::error::{ApiError, ApiResult};
use crate::api::page::{PageMarker, PaginatedCollection};
use crate::compute::model::{Hardware, Image, Location, NodeMetadata, NodeSpec};

/// Generic trait for cloud compute providers
///
/// This trait provides a unified interface for managing compute nodes on
/// different cloud providers. Each implementation translates between the
/// provider's native API and the generic node/image/hardware model.
///
/// Listing methods return one page per call; callers walk pages through
/// [`crate::api::page::Pager`] or the service layer. Point reads return
/// `Option` so a vanished resource is data, not an error.
#[async_trait]
pub trait ComputeServiceAdapter: Send + Sync {
    /// Get the identifier of the provider backing this adapter.
    ///
    /// # Returns
    ///
    /// A string slice such as `"openstack"`, stable across releases and
    /// usable as a configuration key.
    fn provider(&self) -> &str;

    /// List one page of nodes visible to the configured account.
    ///
    /// # Arguments
    ///
    /// * `marker` - Position returned by the previous page, or `None` for
    ///   the first page
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(PaginatedCollection<NodeMetadata>)` - One page of nodes, with
    ///   the marker for the next page unless this is the last one
    /// * `Err(ApiError)` - If the listing fails
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Credentials are invalid or expired
    /// * Network connectivity issues occur
    /// * The provider rejects the marker
    async fn list_nodes(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<NodeMetadata>>;

    /// Get a single node by provider id.
    ///
    /// # Arguments
    ///
    /// * `id` - The provider-native node id
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Some(NodeMetadata))` - The node
    /// * `Ok(None)` - No node with that id exists (HTTP 404)
    /// * `Err(ApiError)` - If the lookup fails for any other reason
    async fn get_node(&self, id: &str) -> ApiResult<Option<NodeMetadata>>;

    /// Create a new node.
    ///
    /// Returns as soon as the provider accepts the request; the node is
    /// usually still [`crate::compute::model::NodeState::Pending`]. Callers
    /// that need a running node poll through the service layer.
    ///
    /// # Arguments
    ///
    /// * `spec` - Name plus image/hardware/location choices
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The image, hardware or location id does not exist
    /// * Account limits or quotas are exceeded
    /// * Credentials are invalid
    async fn create_node(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata>;

    /// Destroy a node.
    ///
    /// Destroying a node that is already gone is success, so retries and
    /// concurrent teardowns stay idempotent.
    ///
    /// # Arguments
    ///
    /// * `id` - The provider-native node id
    async fn destroy_node(&self, id: &str) -> ApiResult<()>;

    /// Reboot a node.
    ///
    /// # Arguments
    ///
    /// * `id` - The provider-native node id
    async fn reboot_node(&self, id: &str) -> ApiResult<()>;

    /// Suspend a running node, keeping its disks and addresses.
    ///
    /// The default implementation reports the operation as unsupported.
    /// Providers without a native suspend keep this default rather than
    /// faking one.
    async fn suspend_node(&self, id: &str) -> ApiResult<()> {
        let _ = id;
        Err(ApiError::UnsupportedError {
            provider: self.provider().to_string(),
            operation: "suspend_node".to_string(),
        })
    }

    /// Resume a suspended node. Unsupported by default, like
    /// [`suspend_node`](Self::suspend_node).
    async fn resume_node(&self, id: &str) -> ApiResult<()> {
        let _ = id;
        Err(ApiError::UnsupportedError {
            provider: self.provider().to_string(),
            operation: "resume_node".to_string(),
        })
    }

    /// List one page of images usable for [`create_node`](Self::create_node).
    ///
    /// # Arguments
    ///
    /// * `marker` - Position returned by the previous page, or `None` for
    ///   the first page
    async fn list_images(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Image>>;

    /// Get a single image by provider id, `None` when it does not exist.
    async fn get_image(&self, id: &str) -> ApiResult<Option<Image>>;

    /// List one page of hardware profiles.
    ///
    /// Providers without a native flavor catalog synthesize profiles from
    /// the sizes they accept.
    async fn list_hardware(
        &self,
        marker: Option<PageMarker>,
    ) -> ApiResult<PaginatedCollection<Hardware>>;

    /// List every location nodes can be placed in. Location catalogs are
    /// small everywhere, so this one is not paged.
    async fn list_locations(&self) -> ApiResult<Vec<Location>>;
}

impl Debug for dyn ComputeServiceAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ComputeServiceAdapter(provider={})", self.provider())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal adapter exercising the trait defaults.
    struct BareAdapter;

    #[async_trait]
    impl ComputeServiceAdapter for BareAdapter {
        fn provider(&self) -> &str {
            "bare"
        }

        async fn list_nodes(
            &self,
            _marker: Option<PageMarker>,
        ) -> ApiResult<PaginatedCollection<NodeMetadata>> {
            Ok(PaginatedCollection::last(vec![]))
        }

        async fn get_node(&self, _id: &str) -> ApiResult<Option<NodeMetadata>> {
            Ok(None)
        }

        async fn create_node(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata> {
            Err(ApiError::ConfigError(format!(
                "cannot create {} here",
                spec.name
            )))
        }

        async fn destroy_node(&self, _id: &str) -> ApiResult<()> {
            Ok(())
        }

        async fn reboot_node(&self, _id: &str) -> ApiResult<()> {
            Ok(())
        }

        async fn list_images(
            &self,
            _marker: Option<PageMarker>,
        ) -> ApiResult<PaginatedCollection<Image>> {
            Ok(PaginatedCollection::last(vec![]))
        }

        async fn get_image(&self, _id: &str) -> ApiResult<Option<Image>> {
            Ok(None)
        }

        async fn list_hardware(
            &self,
            _marker: Option<PageMarker>,
        ) -> ApiResult<PaginatedCollection<Hardware>> {
            Ok(PaginatedCollection::last(vec![]))
        }

        async fn list_locations(&self) -> ApiResult<Vec<Location>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_suspend_defaults_to_unsupported() {
        let adapter = BareAdapter;
        let err = adapter.suspend_node("n-1").await.unwrap_err();
        match err {
            ApiError::UnsupportedError {
                provider,
                operation,
            } => {
                assert_eq!(provider, "bare");
                assert_eq!(operation, "suspend_node");
            }
            other => panic!("expected UnsupportedError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resume_defaults_to_unsupported() {
        let adapter = BareAdapter;
        let err = adapter.resume_node("n-1").await.unwrap_err();
        match err {
            ApiError::UnsupportedError { operation, .. } => {
                assert_eq!(operation, "resume_node");
            }
            other => panic!("expected UnsupportedError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adapter_debug() {
        let adapter: &dyn ComputeServiceAdapter = &BareAdapter;
        let debug_str = format!("{:?}", adapter);
        assert!(debug_str.contains("ComputeServiceAdapter"));
        assert!(debug_str.contains("bare"));
    }
}
