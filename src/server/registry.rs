//! Server Registry - maps provider names to providers.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::error::RegistryError;
use super::provider::Provider;
use crate::protocol::Envelope;

/// Name to provider map shared by bridges.
#[derive(Default)]
pub struct ServerRegistry {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `name`.
    pub fn register(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut providers = self.providers.write();
        if providers.contains_key(&name) {
            return Err(RegistryError::DuplicateProvider(name));
        }
        info!("Registering provider: {}", name);
        providers.insert(name, provider);
        Ok(())
    }

    /// Look up a provider.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ProviderNotFound(name.to_string()))
    }

    /// Deliver `request` to the named provider.
    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn route(&self, name: &str, request: Envelope) -> Result<Envelope, RegistryError> {
        let provider = self.resolve(name)?;
        debug!("Routing to provider");
        provider
            .handle_request(request)
            .await
            .map_err(|source| RegistryError::Provider {
                name: name.to_string(),
                source,
            })
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ToolRegistry;
    use crate::domains::tools::definitions::{math_tools, register_search_tools};
    use crate::server::Dispatcher;
    use serde_json::json;

    fn registry() -> ServerRegistry {
        let registry = ServerRegistry::new();
        registry
            .register(
                "math",
                Arc::new(Dispatcher::new("math", Arc::new(math_tools().unwrap()))),
            )
            .unwrap();

        let search = ToolRegistry::new();
        register_search_tools(&search).unwrap();
        registry
            .register("search", Arc::new(Dispatcher::new("search", Arc::new(search))))
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_provider() {
        let registry = registry();
        let extra = Arc::new(Dispatcher::new("math", Arc::new(ToolRegistry::new())));
        assert!(matches!(
            registry.register("math", extra),
            Err(RegistryError::DuplicateProvider(ref name)) if name == "math"
        ));
        assert_eq!(registry.names(), vec!["math", "search"]);
    }

    #[tokio::test]
    async fn test_route_to_named_provider() {
        let registry = registry();
        let request = Envelope::request(
            "r1",
            "tools/call",
            Some(json!({ "name": "search_web", "arguments": { "query": "rust" } })),
        );

        let response = registry.route("search", request).await.unwrap();
        assert_eq!(response.id, "r1");
        assert!(response.result().unwrap().as_str().unwrap().contains("rust"));
    }

    #[tokio::test]
    async fn test_route_to_missing_provider() {
        let registry = registry();
        let result = registry
            .route("weather", Envelope::request("r2", "tools/list", None))
            .await;
        assert!(matches!(result, Err(RegistryError::ProviderNotFound(ref name)) if name == "weather"));
    }

    #[tokio::test]
    async fn test_providers_keep_separate_tools() {
        let registry = registry();
        let request = Envelope::request(
            "r3",
            "tools/call",
            Some(json!({ "name": "add", "arguments": { "a": 1, "b": 2 } })),
        );

        let response = registry.route("search", request).await.unwrap();
        assert_eq!(response.error().unwrap().code, -32602);
    }
}
