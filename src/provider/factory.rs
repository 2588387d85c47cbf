//! Construction of adapters from configuration.
//!
//! The factory is the only place that knows every provider; callers go
//! from a [`ProviderConfig`] to an `Arc<dyn ComputeServiceAdapter>`
//! without naming concrete adapter types.

use std::sync::Arc;

use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::compute::adapter::ComputeServiceAdapter;
use crate::provider::config::ProviderConfig;
use crate::provider::stub::StubAdapter;

pub struct AdapterFactory;

impl AdapterFactory {
    /// Provider ids this build can construct, sorted. The `stub`
    /// provider is always compiled; the rest depend on feature flags.
    pub fn supported_providers() -> Vec<&'static str> {
        #[allow(unused_mut)]
        let mut providers = vec!["stub"];
        #[cfg(feature = "cloudsigma")]
        providers.push("cloudsigma");
        #[cfg(feature = "ionos")]
        providers.push("ionos");
        #[cfg(feature = "openstack")]
        providers.push("openstack");
        providers.sort_unstable();
        providers
    }

    /// Construct the adapter the config names.
    ///
    /// # Arguments
    ///
    /// * `config` - Provider id plus its connection options
    ///
    /// # Returns
    ///
    /// The adapter behind the generic trait, shareable across tasks
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigError`] for provider ids this build
    /// does not know, naming the supported ones, and passes through
    /// whatever the provider's own constructor rejects.
    pub async fn from_config(
        config: &ProviderConfig,
    ) -> ApiResult<Arc<dyn ComputeServiceAdapter>> {
        debug!("constructing adapter for provider '{}'", config.provider);
        match config.provider.as_str() {
            "stub" => Ok(Arc::new(StubAdapter::from_config(config)?)),
            #[cfg(feature = "openstack")]
            "openstack" => Ok(Arc::new(
                crate::provider::openstack::OpenStackAdapter::from_config(config)?,
            )),
            #[cfg(feature = "ionos")]
            "ionos" => Ok(Arc::new(crate::provider::ionos::IonosAdapter::from_config(
                config,
            )?)),
            #[cfg(feature = "cloudsigma")]
            "cloudsigma" => Ok(Arc::new(
                crate::provider::cloudsigma::CloudSigmaAdapter::from_config(config)?,
            )),
            other => Err(ApiError::ConfigError(format!(
                "unknown provider '{}', supported providers: {}",
                other,
                Self::supported_providers().join(", ")
            ))),
        }
    }
}
