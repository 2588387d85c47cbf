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

use std::fmt;

/// How outgoing requests authenticate against a provider endpoint.
///
/// Providers pick the scheme that matches their API dialect: HTTP basic
/// for the account-id/secret style, `Bearer` for OAuth-ish tokens, and
/// `Header` for APIs that expect the token in a custom header such as
/// `X-Auth-Token`.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// No authentication, used by local/stub providers.
    None,
    /// HTTP basic authentication.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// Token in an arbitrary header.
    Header { name: String, value: String },
}

impl AuthScheme {
    /// Attach this scheme's credentials to an outgoing request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            AuthScheme::None => request,
            AuthScheme::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            AuthScheme::Bearer { token } => request.bearer_auth(token),
            AuthScheme::Header { name, value } => request.header(name.as_str(), value.as_str()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AuthScheme::None)
    }
}

impl Default for AuthScheme {
    fn default() -> Self {
        AuthScheme::None
    }
}

// Credentials must never reach logs, so Debug prints the shape only.
impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::None => write!(f, "AuthScheme::None"),
            AuthScheme::Basic { username, .. } => {
                write!(f, "AuthScheme::Basic {{ username: {:?}, password: \"***\" }}", username)
            }
            AuthScheme::Bearer { .. } => write!(f, "AuthScheme::Bearer {{ token: \"***\" }}"),
            AuthScheme::Header { name, .. } => {
                write!(f, "AuthScheme::Header {{ name: {:?}, value: \"***\" }}", name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(scheme: &AuthScheme) -> reqwest::Request {
        let client = reqwest::Client::new();
        scheme
            .apply(client.get("http://localhost/v2/servers"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_none_adds_no_headers() {
        let request = build(&AuthScheme::None);
        assert!(request.headers().get("authorization").is_none());
        assert!(AuthScheme::None.is_none());
        assert!(AuthScheme::default().is_none());
    }

    #[test]
    fn test_basic_sets_authorization() {
        let scheme = AuthScheme::Basic {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        };
        let request = build(&scheme);
        let value = request.headers().get("authorization").unwrap();
        assert!(value.to_str().unwrap().starts_with("Basic "));
    }

    #[test]
    fn test_bearer_sets_authorization() {
        let scheme = AuthScheme::Bearer {
            token: "tok-123".to_string(),
        };
        let request = build(&scheme);
        let value = request.headers().get("authorization").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer tok-123");
    }

    #[test]
    fn test_custom_header() {
        let scheme = AuthScheme::Header {
            name: "X-Auth-Token".to_string(),
            value: "tok-456".to_string(),
        };
        let request = build(&scheme);
        let value = request.headers().get("x-auth-token").unwrap();
        assert_eq!(value.to_str().unwrap(), "tok-456");
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let basic = format!(
            "{:?}",
            AuthScheme::Basic {
                username: "alice".to_string(),
                password: "s3cret".to_string(),
            }
        );
        assert!(basic.contains("alice"));
        assert!(!basic.contains("s3cret"));

        let bearer = format!(
            "{:?}",
            AuthScheme::Bearer {
                token: "tok-123".to_string(),
            }
        );
        assert!(!bearer.contains("tok-123"));

        let header = format!(
            "{:?}",
            AuthScheme::Header {
                name: "X-Auth-Token".to_string(),
                value: "tok-456".to_string(),
            }
        );
        assert!(header.contains("X-Auth-Token"));
        assert!(!header.contains("tok-456"));
    }
}
