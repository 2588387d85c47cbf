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

//! OpenStack-style compute provider.
//!
//! Talks to a Nova-compatible endpoint with token authentication. Tokens
//! come either pre-issued through the `token` option or from a password
//! login against the configured identity endpoint; rejected tokens are
//! renewed transparently once per request.
//!
//! ## Usage
//!
//! ```no_run
//! use cloudspan::provider::openstack::OpenStackAdapter;
//! use cloudspan::ProviderConfig;
//!
//! # fn example() -> cloudspan::ApiResult<()> {
//! let config = ProviderConfig::openstack()
//!     .with_option("endpoint", "https://nova.example.com/v2.1")
//!     .with_option("identity_endpoint", "https://keystone.example.com/v3")
//!     .with_option("username", "demo")
//!     .with_option("password", "SECRET")
//!     .with_option("project", "team-a");
//! let adapter = OpenStackAdapter::from_config(&config)?;
//! # let _ = adapter;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pagination
//!
//! Listings are paged through `servers_links`-style next links. Some
//! deployments emit next links pointing at hosts that are unreachable from
//! outside; when such a link carries a `marker` parameter, the adapter
//! re-issues the request against the configured endpoint with that marker
//! instead of following the link.
//!
//! ## Feature Flag
//!
//! Requires the `openstack` feature:
//!
//! ```toml
//! [dependencies]
//! cloudspan = { version = "0.3", features = ["openstack"] }
//! ```

pub mod adapter;
pub mod api;
pub mod types;

pub use adapter::OpenStackAdapter;
