use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::page::Pager;
use crate::api::poll::{poll_until, PollConfig, PollDecision};
use crate::compute::adapter::ComputeServiceAdapter;
use crate::compute::model::{Hardware, Image, Location, NodeMetadata, NodeSpec, NodeState};
use crate::provider::config::ProviderConfig;
use crate::provider::factory::AdapterFactory;

/// Builder for [`ComputeService`] instances.
///
/// Constructed through [`ComputeService::builder`], consumed by
/// [`build`](ComputeServiceBuilder::build).
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use cloudspan::{ComputeService, ProviderConfig};
///
/// # async fn example() -> cloudspan::ApiResult<()> {
/// let config = ProviderConfig::stub();
/// let service = ComputeService::builder(config)
///     .with_poll_timeout(Duration::from_secs(120))
///     .build()
///     .await?;
/// # let _ = service;
/// # Ok(())
/// # }
/// ```
pub struct ComputeServiceBuilder {
    config: ProviderConfig,
    poll_config: Option<PollConfig>,
    poll_period: Option<Duration>,
    poll_timeout: Option<Duration>,
}

impl ComputeServiceBuilder {
    /// Creates a new `ComputeServiceBuilder` with the given provider
    /// configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - The provider configuration the service will connect with
    ///
    /// # Returns
    ///
    /// A new `ComputeServiceBuilder` instance with default poll settings.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            poll_config: None,
            poll_period: None,
            poll_timeout: None,
        }
    }

    /// Replaces the whole poll configuration used by the await
    /// operations.
    pub fn with_poll_config(mut self, poll_config: PollConfig) -> Self {
        self.poll_config = Some(poll_config);
        self
    }

    /// Sets the initial delay between state probes.
    pub fn with_poll_period(mut self, period: Duration) -> Self {
        self.poll_period = Some(period);
        self
    }

    /// Sets the total time the await operations keep probing before
    /// giving up.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    /// Builds the service, constructing the adapter named by the
    /// configuration.
    ///
    /// Poll settings resolve in order: the config options `poll_period`
    /// and `poll_timeout` (seconds) override the defaults, and explicit
    /// builder settings override both.
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(ComputeService)` - A service bound to the configured provider
    /// * `Err(ApiError)` - If the provider is unknown or its configuration
    ///   is rejected
    pub async fn build(self) -> ApiResult<ComputeService> {
        let adapter = AdapterFactory::from_config(&self.config).await?;

        let mut poll = match self.poll_config {
            Some(poll) => poll,
            None => {
                let mut poll = PollConfig::default();
                if let Some(secs) = self.config.get_parsed_option::<u64>("poll_period")? {
                    poll = poll.with_period(Duration::from_secs(secs));
                }
                if let Some(secs) = self.config.get_parsed_option::<u64>("poll_timeout")? {
                    poll = poll.with_timeout(Duration::from_secs(secs));
                }
                poll
            }
        };
        if let Some(period) = self.poll_period {
            poll = poll.with_period(period);
        }
        if let Some(timeout) = self.poll_timeout {
            poll = poll.with_timeout(timeout);
        }

        Ok(ComputeService { adapter, poll })
    }
}

/// Provider-independent compute facade.
///
/// Wraps a [`ComputeServiceAdapter`] and adds what callers want on top of
/// the raw paged operations: full-collection listings that drain every
/// page, a lazy node stream, and bounded waits for lifecycle
/// transitions. Code written against this type runs unchanged against
/// any provider.
///
/// # Examples
///
/// ## Listing and creating
///
/// ```no_run
/// use cloudspan::{ComputeService, NodeSpec, ProviderConfig};
///
/// # async fn example() -> cloudspan::ApiResult<()> {
/// let service = ComputeService::builder(ProviderConfig::stub())
///     .build()
///     .await?;
///
/// for node in service.list_nodes().await? {
///     println!("{} is {}", node.name, node.state);
/// }
///
/// let spec = NodeSpec::new("web-1", "img-debian-12", "hw-small");
/// let node = service.create_node_and_wait(&spec).await?;
/// assert_eq!(node.state, cloudspan::NodeState::Running);
/// # Ok(())
/// # }
/// ```
///
/// ## Streaming nodes lazily
///
/// ```no_run
/// use futures::StreamExt;
/// use cloudspan::{ComputeService, ProviderConfig};
///
/// # async fn example() -> cloudspan::ApiResult<()> {
/// let service = ComputeService::builder(ProviderConfig::stub())
///     .build()
///     .await?;
///
/// let mut nodes = std::pin::pin!(service.nodes());
/// while let Some(node) = nodes.next().await {
///     println!("{}", node?.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ComputeService {
    adapter: Arc<dyn ComputeServiceAdapter>,
    poll: PollConfig,
}

impl ComputeService {
    /// Starts building a service for the given provider configuration.
    pub fn builder(config: ProviderConfig) -> ComputeServiceBuilder {
        ComputeServiceBuilder::new(config)
    }

    /// Wraps an already-constructed adapter, with default poll settings.
    ///
    /// Useful for adapters the factory does not know, or for sharing one
    /// adapter between services.
    pub fn from_adapter(adapter: Arc<dyn ComputeServiceAdapter>) -> Self {
        Self {
            adapter,
            poll: PollConfig::default(),
        }
    }

    /// Replaces the poll configuration used by the await operations.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Identifier of the provider behind this service.
    pub fn provider(&self) -> &str {
        self.adapter.provider()
    }

    /// All nodes, draining every page.
    pub async fn list_nodes(&self) -> ApiResult<Vec<NodeMetadata>> {
        let adapter = Arc::clone(&self.adapter);
        Pager::new("nodes", move |marker| {
            let adapter = Arc::clone(&adapter);
            async move { adapter.list_nodes(marker).await }
        })
        .collect_all()
        .await
    }

    /// Nodes as a lazy stream; pages are fetched as the stream is
    /// consumed, so taking a few items from a large account stays cheap.
    pub fn nodes(&self) -> impl Stream<Item = ApiResult<NodeMetadata>> + Send + 'static {
        let adapter = Arc::clone(&self.adapter);
        Pager::new("nodes", move |marker| {
            let adapter = Arc::clone(&adapter);
            async move { adapter.list_nodes(marker).await }
        })
        .into_stream()
    }

    /// One node by id, or `None` if the provider does not know it.
    pub async fn get_node(&self, id: &str) -> ApiResult<Option<NodeMetadata>> {
        self.adapter.get_node(id).await
    }

    /// Creates a node and returns it as first reported, usually still
    /// pending. See [`create_node_and_wait`](Self::create_node_and_wait)
    /// for the blocking flavor.
    pub async fn create_node(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata> {
        self.adapter.create_node(spec).await
    }

    /// Creates a node and waits until it reports running.
    ///
    /// # Errors
    ///
    /// Fails fast with [`ApiError::StateError`] when the node lands in
    /// an error state instead, and with [`ApiError::PollTimeoutError`]
    /// when the poll deadline passes first. The node is not destroyed on
    /// failure; the caller still owns it.
    pub async fn create_node_and_wait(&self, spec: &NodeSpec) -> ApiResult<NodeMetadata> {
        let created = self.adapter.create_node(spec).await?;
        debug!("node {} created, awaiting running", created.id);
        if created.state == NodeState::Running {
            return Ok(created);
        }
        self.await_node_state(&created.id, NodeState::Running)
            .await?
            .ok_or_else(|| ApiError::StateError {
                resource: format!("node {}", created.id),
                state: "gone".to_string(),
            })
    }

    /// Destroys a node. Destroying one that is already gone succeeds.
    pub async fn destroy_node(&self, id: &str) -> ApiResult<()> {
        self.adapter.destroy_node(id).await
    }

    /// Destroys a node and waits until the provider stops reporting it.
    pub async fn destroy_node_and_wait(&self, id: &str) -> ApiResult<()> {
        self.adapter.destroy_node(id).await?;
        self.await_node_gone(id).await
    }

    pub async fn reboot_node(&self, id: &str) -> ApiResult<()> {
        self.adapter.reboot_node(id).await
    }

    pub async fn suspend_node(&self, id: &str) -> ApiResult<()> {
        self.adapter.suspend_node(id).await
    }

    pub async fn resume_node(&self, id: &str) -> ApiResult<()> {
        self.adapter.resume_node(id).await
    }

    /// Waits until the node reports `target`.
    ///
    /// # Returns
    ///
    /// The node as last observed, or `None` when the target was
    /// [`NodeState::Terminated`] and the provider stopped reporting the
    /// node before it was ever observed terminated.
    ///
    /// # Errors
    ///
    /// Fails fast when the node enters a dead end instead of the target:
    /// an error state, termination while waiting for something else, or
    /// disappearance while waiting for anything but termination.
    pub async fn await_node_state(
        &self,
        id: &str,
        target: NodeState,
    ) -> ApiResult<Option<NodeMetadata>> {
        let what = format!("node {} to reach {}", id, target);
        poll_until(&self.poll, &what, || async {
            let node = self.adapter.get_node(id).await?;
            Ok(judge_state(node, &target))
        })
        .await
    }

    /// Waits until the provider stops reporting the node. Some providers
    /// keep destroyed nodes visible as terminated for a while; this
    /// outlives that window.
    pub async fn await_node_gone(&self, id: &str) -> ApiResult<()> {
        let what = format!("node {} to be gone", id);
        poll_until(&self.poll, &what, || async {
            Ok(match self.adapter.get_node(id).await? {
                None => PollDecision::Done(()),
                Some(node) if node.state == NodeState::Error => {
                    PollDecision::Failed("node entered error state".to_string())
                }
                Some(_) => PollDecision::Continue,
            })
        })
        .await
    }

    /// All images, draining every page.
    pub async fn list_images(&self) -> ApiResult<Vec<Image>> {
        let adapter = Arc::clone(&self.adapter);
        Pager::new("images", move |marker| {
            let adapter = Arc::clone(&adapter);
            async move { adapter.list_images(marker).await }
        })
        .collect_all()
        .await
    }

    pub async fn get_image(&self, id: &str) -> ApiResult<Option<Image>> {
        self.adapter.get_image(id).await
    }

    /// All hardware profiles, draining every page.
    pub async fn list_hardware(&self) -> ApiResult<Vec<Hardware>> {
        let adapter = Arc::clone(&self.adapter);
        Pager::new("hardware", move |marker| {
            let adapter = Arc::clone(&adapter);
            async move { adapter.list_hardware(marker).await }
        })
        .collect_all()
        .await
    }

    pub async fn list_locations(&self) -> ApiResult<Vec<Location>> {
        self.adapter.list_locations().await
    }
}

/// Judge one observation against the awaited state.
fn judge_state(
    node: Option<NodeMetadata>,
    target: &NodeState,
) -> PollDecision<Option<NodeMetadata>> {
    match node {
        None if *target == NodeState::Terminated => PollDecision::Done(None),
        None => PollDecision::Failed("node no longer exists".to_string()),
        Some(node) if node.state == *target => PollDecision::Done(Some(node)),
        Some(node) => match node.state {
            NodeState::Error => PollDecision::Failed("node entered error state".to_string()),
            NodeState::Terminated => {
                PollDecision::Failed("node terminated while waiting".to_string())
            }
            _ => PollDecision::Continue,
        },
    }
}
