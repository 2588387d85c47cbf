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

//! Provider implementations.
//!
//! Each submodule binds one provider dialect to the generic
//! [`ComputeServiceAdapter`](crate::compute::adapter::ComputeServiceAdapter)
//! trait. The real providers sit behind feature flags, all enabled by
//! default; [`stub`] is always compiled so tests and examples run
//! without credentials.
//!
//! ## Supported Providers
//!
//! - [`openstack`] - Nova-compatible clouds, token authentication
//! - [`ionos`] - cloudapi-compatible clouds, datacenter-scoped
//! - [`cloudsigma`] - CloudSigma-compatible clouds, one region per endpoint
//! - [`stub`] - deterministic in-memory provider

pub mod config;
pub mod factory;
pub mod stub;

#[cfg(feature = "cloudsigma")]
pub mod cloudsigma;
#[cfg(feature = "ionos")]
pub mod ionos;
#[cfg(feature = "openstack")]
pub mod openstack;

pub use config::ProviderConfig;
pub use factory::AdapterFactory;
pub use stub::StubAdapter;
