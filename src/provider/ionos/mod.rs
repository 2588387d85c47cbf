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

//! IONOS-style compute provider.
//!
//! Talks to a cloudapi-compatible endpoint with basic authentication.
//! Servers live inside one virtual datacenter named by the `datacenter`
//! option; images and datacenters are account-global.
//!
//! ## Usage
//!
//! ```no_run
//! use cloudspan::provider::ionos::IonosAdapter;
//! use cloudspan::ProviderConfig;
//!
//! # fn example() -> cloudspan::ApiResult<()> {
//! let config = ProviderConfig::ionos()
//!     .with_option("endpoint", "https://api.example.com/cloudapi/v6")
//!     .with_option("username", "demo@example.com")
//!     .with_option("password", "SECRET")
//!     .with_option("datacenter", "1e5b866e-dc-1");
//! let adapter = IonosAdapter::from_config(&config)?;
//! # let _ = adapter;
//! # Ok(())
//! # }
//! ```
//!
//! ## Mutations
//!
//! Create, delete and the power commands answer `202 Accepted` with a
//! `Location` header naming a request-status resource. The adapter polls
//! that resource until DONE before returning, so a successful call means
//! the provider finished applying the change, not merely queued it. A
//! FAILED status surfaces as an error carrying the provider's message.
//!
//! ## Hardware
//!
//! The API sizes servers freely instead of offering a flavor catalog.
//! The adapter synthesizes hardware profiles with ids of the form
//! `<cores>-<ram_mb>`, e.g. `2-4096`, and create accepts any id of
//! that shape.
//!
//! ## Feature Flag
//!
//! Requires the `ionos` feature:
//!
//! ```toml
//! [dependencies]
//! cloudspan = { version = "0.3", features = ["ionos"] }
//! ```

pub mod adapter;
pub mod api;
pub mod types;

pub use adapter::IonosAdapter;
