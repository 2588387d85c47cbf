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

use thiserror::Error;

/// Errors that can occur while talking to a cloud provider
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP {status}: {message}")]
    StatusError { status: u16, message: String },

    #[error("Provider {provider} does not support {operation}")]
    UnsupportedError { provider: String, operation: String },

    #[error("Timed out after {waited_secs}s waiting for {what}")]
    PollTimeoutError { what: String, waited_secs: u64 },

    #[error("{resource} entered failure state {state}")]
    StateError { resource: String, state: String },

    #[error("Pagination error: {0}")]
    PaginationError(String),
}

impl ApiError {
    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::StatusError { status, .. } => Some(*status),
            ApiError::TransportError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error represents a missing resource (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Connection failures, timeouts and the usual throttling/gateway
    /// statuses (429, 502, 503, 504) are transient. Everything else,
    /// notably 4xx client errors, is not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::TransportError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::StatusError { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Result type for provider API operations
pub type ApiResult<T> = Result<T, ApiError>;
