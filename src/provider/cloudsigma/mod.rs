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

//! CloudSigma-style compute provider.
//!
//! Talks to one region endpoint with basic authentication; the region
//! name falls out of the endpoint host, e.g. `zrh` for
//! `zrh.cloudsigma.com`. Library drives stand in for images and a fixed
//! set of named size tiers stands in for the missing flavor catalog.
//!
//! ## Usage
//!
//! ```no_run
//! use cloudspan::provider::cloudsigma::CloudSigmaAdapter;
//! use cloudspan::ProviderConfig;
//!
//! # fn example() -> cloudspan::ApiResult<()> {
//! let config = ProviderConfig::cloudsigma()
//!     .with_option("endpoint", "https://zrh.example.com/api/2.0")
//!     .with_option("username", "demo@example.com")
//!     .with_option("password", "SECRET");
//! let adapter = CloudSigmaAdapter::from_config(&config)?;
//! # let _ = adapter;
//! # Ok(())
//! # }
//! ```
//!
//! ## Power semantics
//!
//! Servers are created stopped; the adapter starts them as part of
//! create. There is no native reboot, so reboot stops the server, waits
//! for it to report stopped, and starts it again. Suspend and resume map
//! onto stop and start.
//!
//! ## Feature Flag
//!
//! Requires the `cloudsigma` feature:
//!
//! ```toml
//! [dependencies]
//! cloudspan = { version = "0.3", features = ["cloudsigma"] }
//! ```

pub mod adapter;
pub mod api;
pub mod types;

pub use adapter::CloudSigmaAdapter;
