// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::api::client::RestClientBuilder;
use crate::api::error::{ApiError, ApiResult};

/// Generic configuration for compute providers
///
/// This configuration uses a HashMap to store provider-specific options,
/// which are interpreted by the provider adapters. Any provider id is
/// accepted here so configurations can be deserialized and passed around
/// freely; [`crate::provider::AdapterFactory`] rejects ids it cannot build.
///
/// # Examples
///
/// ## OpenStack-style endpoint
/// ```
/// use cloudspan::ProviderConfig;
///
/// let config = ProviderConfig::openstack()
///     .with_option("endpoint", "https://nova.example.com/v2.1")
///     .with_option("identity_endpoint", "https://keystone.example.com/v3")
///     .with_option("username", "demo")
///     .with_option("password", "SECRET");
/// ```
///
/// ## IONOS-style endpoint
/// ```
/// use cloudspan::ProviderConfig;
///
/// let config = ProviderConfig::ionos()
///     .with_option("endpoint", "https://api.ionos.com/cloudapi/v6")
///     .with_option("username", "dev@example.com")
///     .with_option("password", "SECRET")
///     .with_option("datacenter", "dc-1234");
/// ```
///
/// ## In-memory stub
/// ```
/// use cloudspan::ProviderConfig;
///
/// let config = ProviderConfig::stub();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier, e.g. "openstack"
    pub provider: String,

    /// Provider-specific configuration options
    ///
    /// Common options understood by the HTTP providers:
    /// - endpoint: Base URL of the compute API
    /// - username / password: Credentials
    /// - timeout: Request timeout in seconds
    /// - connect_timeout: Connection timeout in seconds
    /// - max_retries: Transparent retries of transient failures
    ///
    /// OpenStack:
    /// - identity_endpoint: Keystone base URL for password auth
    /// - token: Pre-issued token, skips the identity round trip
    /// - project: Project/tenant name for scoped tokens
    ///
    /// IONOS:
    /// - datacenter: Virtual datacenter id the adapter operates in
    ///
    /// Stub:
    /// - startup_ticks: Observations before a created node turns running
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl ProviderConfig {
    /// Create a new provider configuration.
    ///
    /// # Arguments
    ///
    /// * `provider` - The provider identifier ("openstack", "ionos",
    ///   "cloudsigma", "stub")
    ///
    /// # Returns
    ///
    /// A new `ProviderConfig` instance with default options.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into().to_lowercase(),
            options: Self::default_options(),
        }
    }

    /// Create an OpenStack provider configuration.
    pub fn openstack() -> Self {
        Self::new("openstack")
    }

    /// Create an IONOS provider configuration.
    pub fn ionos() -> Self {
        Self::new("ionos")
    }

    /// Create a CloudSigma provider configuration.
    pub fn cloudsigma() -> Self {
        Self::new("cloudsigma")
    }

    /// Create an in-memory stub provider configuration.
    pub fn stub() -> Self {
        Self::new("stub")
    }

    /// Get default options shared by all providers.
    ///
    /// # Returns
    ///
    /// A HashMap containing default timeout and retry settings.
    pub fn default_options() -> HashMap<String, String> {
        [
            ("timeout", "30"),
            ("connect_timeout", "10"),
            ("max_retries", "3"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Add a configuration option.
    ///
    /// # Arguments
    ///
    /// * `key` - The option key
    /// * `value` - The option value
    ///
    /// # Returns
    ///
    /// The `ProviderConfig` instance with the added option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options.
    ///
    /// # Arguments
    ///
    /// * `options` - HashMap of options to add
    ///
    /// # Returns
    ///
    /// The `ProviderConfig` instance with the added options (for method chaining).
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Get a configuration option.
    ///
    /// # Arguments
    ///
    /// * `key` - The option key to retrieve
    ///
    /// # Returns
    ///
    /// `Some(&str)` if the option exists, `None` otherwise.
    pub fn get_option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Get a required option, as a configuration error when absent.
    ///
    /// # Errors
    ///
    /// [`ApiError::ConfigError`] naming the provider and the missing key.
    pub fn require(&self, key: &str) -> ApiResult<&str> {
        self.get_option(key).ok_or_else(|| {
            ApiError::ConfigError(format!(
                "provider {} requires option '{}'",
                self.provider, key
            ))
        })
    }

    /// Get an option parsed into `T`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the option is absent, an error when it is present
    /// but does not parse.
    pub fn get_parsed_option<T: FromStr>(&self, key: &str) -> ApiResult<Option<T>> {
        match self.get_option(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                ApiError::ConfigError(format!(
                    "option '{}' has unparseable value '{}'",
                    key, raw
                ))
            }),
        }
    }

    /// Build a [`RestClientBuilder`] for the configured endpoint, with the
    /// shared timeout and retry options applied. Providers add their auth
    /// scheme and call `build()`.
    ///
    /// # Errors
    ///
    /// Returns an error when the `endpoint` option is missing or a timeout
    /// option does not parse.
    pub fn rest_client_builder(&self) -> ApiResult<RestClientBuilder> {
        self.rest_client_builder_for("endpoint")
    }

    /// Like [`rest_client_builder`](Self::rest_client_builder) but reading
    /// the base URL from another option, for providers that talk to more
    /// than one endpoint.
    pub fn rest_client_builder_for(&self, endpoint_key: &str) -> ApiResult<RestClientBuilder> {
        let endpoint = self.require(endpoint_key)?;
        let mut builder = RestClientBuilder::new(endpoint);
        if let Some(timeout) = self.get_parsed_option::<u64>("timeout")? {
            builder = builder.with_timeout(std::time::Duration::from_secs(timeout));
        }
        if let Some(connect) = self.get_parsed_option::<u64>("connect_timeout")? {
            builder = builder.with_connect_timeout(std::time::Duration::from_secs(connect));
        }
        if let Some(retries) = self.get_parsed_option::<usize>("max_retries")? {
            builder = builder.with_max_retries(retries);
        }
        Ok(builder)
    }

    /// Load a named profile from a TOML profile file.
    ///
    /// The file holds a `[profiles.<name>]` table per profile:
    ///
    /// ```toml
    /// [profiles.dev]
    /// provider = "openstack"
    ///
    /// [profiles.dev.options]
    /// endpoint = "https://nova.example.com/v2.1"
    /// password = "${OS_PASSWORD}"
    /// ```
    ///
    /// `${VAR}` references are replaced from the environment before
    /// parsing; unset variables keep the literal text so the resulting
    /// error names them.
    pub fn from_profile_file(path: impl AsRef<Path>, profile: &str) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_profile_str(&content, profile)
    }

    /// Parse a profile out of TOML text, see
    /// [`from_profile_file`](Self::from_profile_file).
    pub fn from_profile_str(content: &str, profile: &str) -> ApiResult<Self> {
        let processed = substitute_env_vars(content);
        let mut file: ProfileFile = toml::from_str(&processed)
            .map_err(|e| ApiError::ConfigError(format!("profile file parse error: {}", e)))?;

        let mut config = file.profiles.remove(profile).ok_or_else(|| {
            let mut known: Vec<&String> = file.profiles.keys().collect();
            known.sort();
            ApiError::ConfigError(format!(
                "no profile named '{}' (available: {:?})",
                profile, known
            ))
        })?;
        config.provider = config.provider.to_lowercase();

        // Profiles only state what differs from the defaults.
        for (key, value) in Self::default_options() {
            config.options.entry(key).or_insert(value);
        }
        Ok(config)
    }

    /// Get the provider identifier.
    pub fn provider_id(&self) -> &str {
        &self.provider
    }
}

impl From<ProviderConfig> for String {
    fn from(config: ProviderConfig) -> Self {
        config.provider
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: HashMap<String, ProviderConfig>,
}

/// Replace `${VAR}` references with environment values, keeping the
/// literal text for unset variables.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}
