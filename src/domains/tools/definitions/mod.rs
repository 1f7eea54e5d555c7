//! Tool definitions module.
//!
//! This module exports all built-in tool definitions and the helpers that
//! install them into a [`ToolRegistry`]. Each tool is defined in its own file.

pub mod math;
pub mod search;

pub use math::{AddTool, DivideTool, MultiplyTool, OperandsParams, SubtractTool};
pub use search::{SearchWebParams, SearchWebTool};

use super::{ToolError, ToolRegistry};

/// Register the arithmetic tools.
pub fn register_math_tools(registry: &ToolRegistry) -> Result<(), ToolError> {
    registry.register_definition(AddTool)?;
    registry.register_definition(SubtractTool)?;
    registry.register_definition(MultiplyTool)?;
    registry.register_definition(DivideTool)?;
    Ok(())
}

/// Register the search tools.
pub fn register_search_tools(registry: &ToolRegistry) -> Result<(), ToolError> {
    registry.register_definition(SearchWebTool)
}

/// A registry holding the arithmetic tools.
pub fn math_tools() -> Result<ToolRegistry, ToolError> {
    let registry = ToolRegistry::new();
    register_math_tools(&registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_tool_names() {
        let registry = math_tools().unwrap();
        let names = registry.names();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"add".to_string()));
        assert!(names.contains(&"subtract".to_string()));
        assert!(names.contains(&"multiply".to_string()));
        assert!(names.contains(&"divide".to_string()));
    }

    #[test]
    fn test_math_tools_are_pure() {
        let registry = math_tools().unwrap();
        assert!(registry.list().iter().all(|d| d.is_pure()));
    }

    #[test]
    fn test_registering_twice_fails() {
        let registry = math_tools().unwrap();
        assert!(matches!(
            register_math_tools(&registry),
            Err(ToolError::Duplicate(_))
        ));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_search_and_math_coexist() {
        let registry = math_tools().unwrap();
        register_search_tools(&registry).unwrap();
        assert_eq!(registry.len(), 5);
        assert!(registry.resolve_schema("search_web").is_ok());
    }
}
