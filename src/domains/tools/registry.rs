//! Tool Registry - per-provider mapping from tool name to descriptor and handler.
//!
//! The map is published as an immutable snapshot behind an `Arc`. Readers
//! clone the `Arc` under a short read lock and never observe a partially
//! registered tool; registration builds a new map and swaps it in under the
//! write lock.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::handler::{ToolDefinition, ToolHandler, Typed};

/// A descriptor together with the function bound to it.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

type ToolMap = BTreeMap<String, RegisteredTool>;

/// Registry of the tools exposed by one provider.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Arc<ToolMap>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Fails with [`ToolError::Duplicate`] if the name is taken, leaving the
    /// existing registration untouched.
    pub fn register(
        &self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        descriptor.check()?;

        let mut guard = self.tools.write();
        if guard.contains_key(&descriptor.name) {
            return Err(ToolError::duplicate(&descriptor.name));
        }

        info!("Registering tool: {}", descriptor.name);
        let mut next = ToolMap::clone(&guard);
        next.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                handler,
            },
        );
        *guard = Arc::new(next);
        Ok(())
    }

    /// Register a typed tool definition.
    pub fn register_definition<T: ToolDefinition>(&self, tool: T) -> Result<(), ToolError> {
        let descriptor = T::descriptor()?;
        self.register(descriptor, Arc::new(Typed(tool)))
    }

    /// Snapshot of all descriptors, sorted by name.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.snapshot()
            .values()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }

    /// Names of all registered tools, sorted.
    pub fn names(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    /// Look up a tool's descriptor.
    pub fn resolve_schema(&self, name: &str) -> Result<ToolDescriptor, ToolError> {
        self.snapshot()
            .get(name)
            .map(|tool| tool.descriptor.clone())
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// Look up a tool for execution.
    pub fn resolve(&self, name: &str) -> Option<RegisteredTool> {
        let tool = self.snapshot().get(name).cloned();
        if tool.is_none() {
            debug!("Tool lookup missed: {}", name);
        }
        tool
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<ToolMap> {
        Arc::clone(&*self.tools.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::descriptor::{InputSchema, PrimitiveType};
    use crate::domains::tools::error::ToolFailure;
    use crate::domains::tools::handler::FnTool;
    use serde_json::{Map, Value, json};

    fn constant(value: Value) -> Arc<dyn ToolHandler> {
        Arc::new(FnTool(move |_args: Map<String, Value>| {
            let value = value.clone();
            async move { Ok::<_, ToolFailure>(value) }
        }))
    }

    fn descriptor(name: &str, description: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            description,
            InputSchema::object().required_property("x", PrimitiveType::Integer, "x"),
        )
    }

    #[test]
    fn test_register_and_list() {
        let registry = ToolRegistry::new();
        registry
            .register(descriptor("b", "second"), constant(json!(2)))
            .unwrap();
        registry
            .register(descriptor("a", "first"), constant(json!(1)))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        let listed: Vec<_> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(listed, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_keeps_first_registration() {
        let registry = ToolRegistry::new();
        registry
            .register(descriptor("add", "original"), constant(json!(1)))
            .unwrap();

        let result = registry.register(descriptor("add", "replacement"), constant(json!(2)));
        assert!(matches!(result, Err(ToolError::Duplicate(ref name)) if name == "add"));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.resolve_schema("add").unwrap().description,
            "original"
        );
    }

    #[test]
    fn test_resolve_schema_not_found() {
        let registry = ToolRegistry::new();
        assert!(matches!(
            registry.resolve_schema("missing"),
            Err(ToolError::NotFound(_))
        ));
        assert!(registry.resolve("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let registry = ToolRegistry::new();
        let mut bad = descriptor("bad", "bad");
        bad.input_schema.required.push("ghost".to_string());

        assert!(matches!(
            registry.register(bad, constant(Value::Null)),
            Err(ToolError::InvalidSchema { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_not_a_live_view() {
        let registry = ToolRegistry::new();
        registry
            .register(descriptor("a", "a"), constant(json!(1)))
            .unwrap();

        let before = registry.list();
        registry
            .register(descriptor("b", "b"), constant(json!(2)))
            .unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(ToolRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .register(descriptor(&format!("t{}", i), "t"), constant(json!(i)))
                        .unwrap();
                    registry.list().len()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap() >= 1);
        }
        assert_eq!(registry.len(), 8);
    }
}
