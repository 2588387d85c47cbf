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

//! Provider-independent API plumbing: the HTTP client, authentication
//! schemes, error types, cursor pagination and state polling.

pub mod auth;
pub mod client;
pub mod error;
pub mod page;
pub mod poll;

pub use auth::AuthScheme;
pub use client::{RestClient, RestClientBuilder};
pub use error::{ApiError, ApiResult};
pub use page::{PageMarker, PaginatedCollection, Pager};
pub use poll::{poll_until, PollConfig, PollDecision};
