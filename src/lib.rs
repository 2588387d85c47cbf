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

//! # Cloudspan
//!
//! A Rust library for driving compute clouds through one provider-independent API.
//!
//! Cloudspan maps provider-specific servers, templates and sizing onto a generic
//! node/image/hardware model, so the same code lists, creates, and destroys
//! machines on any supported provider. Each provider lives in its own module
//! behind a shared adapter trait and brings its own pagination and polling
//! dialect with it.
//!
//! ## Features
//!
//! - **Multi-provider support**: OpenStack-style, IONOS-style, and CloudSigma-style clouds behind one trait
//! - **Generic compute model**: nodes, images, hardware profiles, and locations shared across providers
//! - **Pagination**: marker-driven pager with full-drain and lazy-stream flavors over every listing
//! - **Bounded polling**: awaits for lifecycle transitions with growing probe periods and hard deadlines
//! - **Deterministic stub**: in-memory provider so tests and examples run without credentials
//!
//! ## Quick Start
//!
//! ### Stub Provider Example
//!
//! ```rust,no_run
//! use cloudspan::{ComputeService, NodeSpec, ProviderConfig};
//!
//! # async fn example() -> cloudspan::ApiResult<()> {
//! // The stub provider needs no credentials
//! let config = ProviderConfig::stub();
//!
//! // Create the service
//! let service = ComputeService::builder(config)
//!     .build()
//!     .await?;
//!
//! // Create a node and wait for it to report running
//! let spec = NodeSpec::new("web-1", "img-debian-12", "hw-small");
//! let node = service.create_node_and_wait(&spec).await?;
//!
//! println!("{} is {}", node.name, node.state);
//! # Ok(())
//! # }
//! ```
//!
//! ### OpenStack Example
//!
//! ```rust,no_run
//! use cloudspan::{ComputeService, ProviderConfig};
//!
//! # async fn example() -> cloudspan::ApiResult<()> {
//! let config = ProviderConfig::openstack()
//!     .with_option("endpoint", "https://nova.example.com/v2.1")
//!     .with_option("identity_endpoint", "https://keystone.example.com/v3")
//!     .with_option("username", "demo")
//!     .with_option("password", "SECRET")
//!     .with_option("project", "team-a");
//!
//! let service = ComputeService::builder(config).build().await?;
//! for node in service.list_nodes().await? {
//!     println!("{}\t{}", node.id, node.state);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Profile File Example
//!
//! ```rust,no_run
//! use cloudspan::{ComputeService, ProviderConfig};
//!
//! # async fn example() -> cloudspan::ApiResult<()> {
//! // providers.toml holds one section per profile; ${VAR} references
//! // are filled from the environment so credentials stay out of the file
//! let config = ProviderConfig::from_profile_file("providers.toml", "prod")?;
//!
//! let service = ComputeService::builder(config).build().await?;
//! println!("connected to {}", service.provider());
//! # Ok(())
//! # }
//! ```
//!
//! For complete programs, see the `demos/` directory.
//!
//! ## Modules
//!
//! - [`api`] - REST plumbing: client, errors, pagination, polling
//! - [`compute`] - Generic compute model, adapter trait, and service facade
//! - [`provider`] - Provider implementations and configuration
//! - [`util`] - Utility functions and helpers

pub mod api;
pub mod compute;
pub mod provider;
pub mod util;

// Re-export commonly used types
pub use api::error::{ApiError, ApiResult};
pub use api::page::{PageMarker, PaginatedCollection, Pager};
pub use api::poll::{PollConfig, PollDecision};
pub use compute::adapter::ComputeServiceAdapter;
pub use compute::model::{Hardware, Image, Location, NodeMetadata, NodeSpec, NodeState};
pub use compute::service::{ComputeService, ComputeServiceBuilder};
pub use provider::config::ProviderConfig;
pub use provider::factory::AdapterFactory;
