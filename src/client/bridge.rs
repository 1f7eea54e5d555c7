//! Bridge - the caller-facing side of a tool call.
//!
//! A bridge turns `(tool, arguments)` into a `tools/call` request envelope,
//! delivers it to a provider and turns the response back into either a
//! [`ToolInvocation`] or a [`BridgeError`] carrying the provider's code and
//! message. Ids are `<instance>:<seq>`, so several bridges can share a
//! provider without colliding.

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::cache::{CacheStats, ResultCache};
use super::error::BridgeError;
use super::execution_log::{ExecutionLog, ExecutionLogEntry, ExecutionOutcome};
use crate::core::config::{BridgeConfig, CacheConfig};
use crate::domains::tools::ToolDescriptor;
use crate::protocol::{Envelope, Method, Payload};
use crate::server::{Provider, RegistryError, ServerRegistry};

/// A structured tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Target provider. Required when the bridge routes through a registry
    /// holding more than one provider.
    pub provider: Option<String>,
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            provider: None,
            name: name.into(),
            arguments,
        }
    }

    /// Address the call to a named provider.
    pub fn on(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Normalized result of a successful call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub result: Value,
    pub operation: String,
    pub inputs: Map<String, Value>,
}

/// Result cache settings for a bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub capacity: u64,
    /// Tools to cache. `None` caches every tool a provider advertises as pure.
    pub tools: Option<Vec<String>>,
}

impl CacheSettings {
    /// Cache every pure tool.
    pub fn pure_tools(capacity: u64) -> Self {
        Self {
            capacity,
            tools: None,
        }
    }

    /// Cache only the named tools.
    pub fn only<I, S>(capacity: u64, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capacity,
            tools: Some(tools.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Clone)]
enum Target {
    Single(Arc<dyn Provider>),
    Registry(Arc<ServerRegistry>),
}

// ============================================================================
// Builder
// ============================================================================

/// Configures a [`Bridge`].
#[derive(Default)]
pub struct BridgeBuilder {
    target: Option<Target>,
    instance: Option<String>,
    timeout: Option<Duration>,
    cache: Option<CacheSettings>,
    log_capacity: Option<usize>,
}

impl BridgeBuilder {
    /// Send every call to one provider.
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.target = Some(Target::Single(provider));
        self
    }

    /// Route calls by provider name through a registry.
    pub fn registry(mut self, registry: Arc<ServerRegistry>) -> Self {
        self.target = Some(Target::Registry(registry));
        self
    }

    /// Namespace for correlation ids.
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Give up on calls that take longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cache(mut self, settings: CacheSettings) -> Self {
        self.cache = Some(settings);
        self
    }

    /// Maximum number of entries kept in the execution log.
    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = Some(capacity);
        self
    }

    /// Apply the `bridge` and `cache` configuration sections.
    pub fn configure(mut self, bridge: &BridgeConfig, cache: &CacheConfig) -> Self {
        if let Some(instance) = &bridge.instance_id {
            self.instance = Some(instance.clone());
        }
        if let Some(timeout) = bridge.call_timeout() {
            self.timeout = Some(timeout);
        }
        self.log_capacity = Some(bridge.log_capacity);
        if cache.enabled {
            self.cache = Some(CacheSettings::pure_tools(cache.capacity));
        }
        self
    }

    /// Build the bridge.
    ///
    /// With a cache configured, the target's capabilities are fetched once
    /// here to decide which tools may be cached.
    pub async fn build(self) -> Result<Bridge, BridgeError> {
        let target = self
            .target
            .ok_or_else(|| BridgeError::config("bridge has no provider or registry"))?;

        let (cache, cacheable) = match self.cache {
            Some(settings) => {
                let cacheable = cacheable_tools(&target, settings.tools.as_deref()).await?;
                (Some(ResultCache::new(settings.capacity)), cacheable)
            }
            None => (None, HashMap::new()),
        };

        let instance = self
            .instance
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string()[..8].to_string());
        info!("Bridge {} ready", instance);

        Ok(Bridge {
            target,
            instance,
            seq: AtomicU64::new(0),
            timeout: self.timeout,
            cache,
            cacheable,
            log: ExecutionLog::new(self.log_capacity.unwrap_or(1024)),
        })
    }
}

/// Routing name to the set of tools whose results may be cached.
type Cacheable = HashMap<String, HashSet<String>>;

async fn cacheable_tools(target: &Target, only: Option<&[String]>) -> Result<Cacheable, BridgeError> {
    let providers: Vec<(String, Arc<dyn Provider>)> = match target {
        Target::Single(provider) => vec![(provider.name().to_string(), Arc::clone(provider))],
        Target::Registry(registry) => registry
            .names()
            .into_iter()
            .map(|name| registry.resolve(&name).map(|provider| (name, provider)))
            .collect::<Result<_, _>>()
            .map_err(registry_error)?,
    };

    let mut advertised: HashMap<String, Vec<ToolDescriptor>> = HashMap::new();
    for (name, provider) in providers {
        let tools = provider.list_capabilities().await?;
        advertised.insert(name, tools);
    }

    let mut cacheable = Cacheable::new();
    for (provider, tools) in &advertised {
        let pure = tools
            .iter()
            .filter(|tool| tool.is_pure())
            .filter(|tool| only.is_none_or(|names| names.contains(&tool.name)))
            .map(|tool| tool.name.clone());
        cacheable.entry(provider.clone()).or_default().extend(pure);
    }

    for name in only.unwrap_or_default() {
        let mut matches = advertised.values().flatten().filter(|tool| &tool.name == name);
        match matches.next() {
            None => return Err(BridgeError::config(format!("cannot cache unknown tool `{}`", name))),
            Some(_) if !cacheable.values().any(|tools| tools.contains(name)) => {
                return Err(BridgeError::config(format!(
                    "cannot cache `{}`: the tool is not declared pure",
                    name
                )));
            }
            Some(_) => {}
        }
    }

    Ok(cacheable)
}

fn registry_error(error: RegistryError) -> BridgeError {
    match error {
        RegistryError::ProviderNotFound(name) => BridgeError::ProviderNotFound(name),
        RegistryError::Provider { source, .. } => BridgeError::Provider(source),
        RegistryError::DuplicateProvider(name) => {
            BridgeError::config(format!("duplicate provider: {}", name))
        }
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Translates structured tool calls into provider round trips.
pub struct Bridge {
    target: Target,
    instance: String,
    seq: AtomicU64,
    timeout: Option<Duration>,
    cache: Option<ResultCache>,
    cacheable: Cacheable,
    log: ExecutionLog,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    /// Correlation id namespace.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Invoke one tool.
    #[instrument(skip_all, fields(bridge = %self.instance, tool = %call.name))]
    pub async fn invoke(&self, call: ToolCall) -> Result<ToolInvocation, BridgeError> {
        let started = Instant::now();
        let (provider_name, outcome) = match self.resolve(&call) {
            Ok((name, provider)) => {
                let outcome = self.execute(&name, provider, &call).await;
                (name, outcome)
            }
            Err(e) => (call.provider.clone().unwrap_or_default(), Err(e)),
        };

        let (entry_outcome, cached) = match &outcome {
            Ok((result, cached)) => (
                ExecutionOutcome::Success {
                    result: result.clone(),
                },
                *cached,
            ),
            Err(e) => (
                ExecutionOutcome::Failure {
                    code: e.code().map(|code| code.code()),
                    message: e.to_string(),
                },
                false,
            ),
        };
        self.log.record(ExecutionLogEntry {
            timestamp: Utc::now(),
            provider: provider_name,
            tool: call.name.clone(),
            arguments: call.arguments.clone(),
            outcome: entry_outcome,
            elapsed: started.elapsed(),
            cached,
        });

        let (result, _) = outcome?;
        Ok(ToolInvocation {
            result,
            operation: call.name,
            inputs: call.arguments,
        })
    }

    /// Invoke several tools concurrently. Results come back in input order.
    pub async fn invoke_all(&self, calls: Vec<ToolCall>) -> Vec<Result<ToolInvocation, BridgeError>> {
        join_all(calls.into_iter().map(|call| self.invoke(call))).await
    }

    /// Capability set of a provider.
    pub async fn list_tools(&self, provider: Option<&str>) -> Result<Vec<ToolDescriptor>, BridgeError> {
        let (_, provider) = self.resolve_name(provider, "tools/list")?;
        self.within(async { provider.list_capabilities().await.map_err(BridgeError::from) })
            .await
    }

    /// Snapshot of the execution log, oldest first.
    pub fn log(&self) -> Vec<ExecutionLogEntry> {
        self.log.entries()
    }

    /// Cache counters, when caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ResultCache::stats)
    }

    /// Whether results of `tool` on `provider` are cached. `provider` is the
    /// registry name the call is routed by, or the provider's own name for a
    /// single-provider bridge.
    pub fn is_cacheable(&self, provider: &str, tool: &str) -> bool {
        self.cache.is_some()
            && self
                .cacheable
                .get(provider)
                .is_some_and(|tools| tools.contains(tool))
    }

    async fn execute(
        &self,
        route: &str,
        provider: Arc<dyn Provider>,
        call: &ToolCall,
    ) -> Result<(Value, bool), BridgeError> {
        let key = match &self.cache {
            Some(_) if self.is_cacheable(route, &call.name) => {
                Some(ResultCache::key(route, &call.name, &call.arguments))
            }
            _ => None,
        };

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(result) = cache.get(key) {
                return Ok((result, true));
            }
        }

        let result = self.within(self.round_trip(&*provider, call)).await?;

        // Only reached when the response arrived before the deadline.
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, result.clone());
        }
        Ok((result, false))
    }

    async fn round_trip(&self, provider: &dyn Provider, call: &ToolCall) -> Result<Value, BridgeError> {
        let id = self.next_id();
        let request = Envelope::request(
            id.clone(),
            Method::ToolsCall.as_str(),
            Some(json!({
                "name": call.name,
                "arguments": call.arguments,
            })),
        );

        debug!("Sending {} to {}", id, provider.name());
        let response = provider.handle_request(request).await?;

        if response.id != id {
            warn!("Response id {} does not match request id {}", response.id, id);
            return Err(BridgeError::protocol(format!(
                "response id `{}` does not match request id `{}`",
                response.id, id
            )));
        }

        match response.payload {
            Payload::Success(result) => Ok(result),
            Payload::Failure(error) => {
                debug!("Call {} failed with code {}", id, error.code);
                Err(BridgeError::Rpc {
                    code: error.code,
                    message: error.message,
                    data: error.data,
                })
            }
            Payload::Request { .. } => Err(BridgeError::protocol(format!(
                "expected a response to `{}`, received a request",
                id
            ))),
        }
    }

    async fn within<T>(
        &self,
        call: impl Future<Output = Result<T, BridgeError>>,
    ) -> Result<T, BridgeError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!("Call abandoned after {:?}", limit);
                BridgeError::Timeout(limit)
            })?,
            None => call.await,
        }
    }

    fn resolve(&self, call: &ToolCall) -> Result<(String, Arc<dyn Provider>), BridgeError> {
        self.resolve_name(call.provider.as_deref(), &call.name)
    }

    /// Pick the provider for a call, together with the name it was routed by.
    fn resolve_name(
        &self,
        provider: Option<&str>,
        tool: &str,
    ) -> Result<(String, Arc<dyn Provider>), BridgeError> {
        match &self.target {
            Target::Single(single) => match provider {
                Some(name) if name != single.name() => Err(BridgeError::ProviderNotFound(name.to_string())),
                _ => Ok((single.name().to_string(), Arc::clone(single))),
            },
            Target::Registry(registry) => {
                let name = match provider {
                    Some(name) => name.to_string(),
                    None => match registry.names().as_slice() {
                        [only] => only.clone(),
                        _ => return Err(BridgeError::MissingProvider(tool.to_string())),
                    },
                };
                let provider = registry.resolve(&name).map_err(registry_error)?;
                Ok((name, provider))
            }
        }
    }

    fn next_id(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}:{}", self.instance, seq)
    }
}
