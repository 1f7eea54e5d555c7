//! Tool descriptors and their structural input schemas.
//!
//! A descriptor is what a provider advertises in `tools/list`:
//!
//! ```json
//! { "name": "add", "description": "Add two numbers",
//!   "inputSchema": { "type": "object",
//!                    "properties": { "a": { "type": "integer" }, "b": { "type": "integer" } },
//!                    "required": ["a", "b"] } }
//! ```
//!
//! Pure tools additionally carry `annotations` with `readOnlyHint` and
//! `idempotentHint` set, which is how a bridge learns they may be cached.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::error::ToolError;

/// JSON primitive types a schema property may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl PrimitiveType {
    /// Whether `value` has this type. Integers also count as numbers.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Null => value.is_null(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }

    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single named property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: PrimitiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Structural schema for tool arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub kind: PrimitiveType,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::object()
    }
}

impl InputSchema {
    /// An empty object schema.
    pub fn object() -> Self {
        Self {
            kind: PrimitiveType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Derive a schema from a params type.
    ///
    /// Only flat structs of primitive-typed fields convert; anything richer
    /// fails with [`ToolError::InvalidSchema`].
    pub fn for_type<T: JsonSchema>(tool: &str) -> Result<Self, ToolError> {
        let schema = schemars::schema_for!(T);
        let value = serde_json::to_value(&schema)
            .map_err(|e| ToolError::invalid_schema(tool, e.to_string()))?;
        serde_json::from_value(value).map_err(|e| ToolError::invalid_schema(tool, e.to_string()))
    }

    /// Add an optional property.
    pub fn property(
        mut self,
        name: impl Into<String>,
        kind: PrimitiveType,
        description: impl Into<String>,
    ) -> Self {
        self.properties.insert(
            name.into(),
            PropertySchema {
                kind,
                description: Some(description.into()),
            },
        );
        self
    }

    /// Add a required property.
    pub fn required_property(
        mut self,
        name: impl Into<String>,
        kind: PrimitiveType,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.property(name, kind, description)
    }

    /// Structural well-formedness: an object schema whose required names
    /// all exist in `properties`.
    pub fn check(&self, tool: &str) -> Result<(), ToolError> {
        if self.kind != PrimitiveType::Object {
            return Err(ToolError::invalid_schema(
                tool,
                format!("input schema must be an object, found {}", self.kind),
            ));
        }
        if let Some(missing) = self.required.iter().find(|r| !self.properties.contains_key(*r)) {
            return Err(ToolError::invalid_schema(
                tool,
                format!("required property `{}` is not declared", missing),
            ));
        }
        Ok(())
    }

    /// Validate call arguments: required properties present and declared
    /// properties of the declared type. Undeclared extras are allowed.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<(), String> {
        for name in &self.required {
            if !arguments.contains_key(name) {
                return Err(format!("missing required argument `{}`", name));
            }
        }

        for (name, value) in arguments {
            if let Some(property) = self.properties.get(name) {
                if !property.kind.matches(value) {
                    return Err(format!(
                        "argument `{}` must be {}, got {}",
                        name,
                        property.kind,
                        PrimitiveType::of(value)
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Behavioural hints advertised alongside a descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAnnotations {
    #[serde(rename = "readOnlyHint", default)]
    pub read_only_hint: bool,
    #[serde(rename = "idempotentHint", default)]
    pub idempotent_hint: bool,
}

/// Schema and metadata describing one invocable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            annotations: None,
        }
    }

    /// Declare the tool side-effect free and deterministic.
    pub fn pure(mut self) -> Self {
        self.annotations = Some(ToolAnnotations {
            read_only_hint: true,
            idempotent_hint: true,
        });
        self
    }

    /// Whether results of this tool may be memoized.
    pub fn is_pure(&self) -> bool {
        self.annotations
            .is_some_and(|a| a.read_only_hint && a.idempotent_hint)
    }

    /// Registration-time checks.
    pub fn check(&self) -> Result<(), ToolError> {
        if self.name.trim().is_empty() {
            return Err(ToolError::invalid_schema(&self.name, "tool name is empty"));
        }
        self.input_schema.check(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct PairParams {
        /// Left operand.
        a: i64,
        /// Right operand.
        b: i64,
        #[serde(default)]
        label: String,
    }

    fn pair_schema() -> InputSchema {
        InputSchema::object()
            .required_property("a", PrimitiveType::Integer, "Left operand")
            .required_property("b", PrimitiveType::Integer, "Right operand")
    }

    #[test]
    fn test_schema_from_type() {
        let schema = InputSchema::for_type::<PairParams>("pair").unwrap();
        assert_eq!(schema.kind, PrimitiveType::Object);
        assert_eq!(schema.properties["a"].kind, PrimitiveType::Integer);
        assert_eq!(
            schema.properties["a"].description.as_deref(),
            Some("Left operand.")
        );
        assert_eq!(schema.properties["label"].kind, PrimitiveType::String);
        assert!(schema.required.contains(&"a".to_string()));
        assert!(schema.required.contains(&"b".to_string()));
        assert!(!schema.required.contains(&"label".to_string()));
    }

    #[test]
    fn test_validate_missing_required() {
        let args = json!({ "a": 1 });
        let err = pair_schema().validate(args.as_object().unwrap()).unwrap_err();
        assert!(err.contains("`b`"));
    }

    #[test]
    fn test_validate_wrong_type() {
        let args = json!({ "a": 1, "b": "two" });
        let err = pair_schema().validate(args.as_object().unwrap()).unwrap_err();
        assert_eq!(err, "argument `b` must be integer, got string");
    }

    #[test]
    fn test_validate_accepts_extras() {
        let args = json!({ "a": 1, "b": 2, "note": "hi" });
        assert!(pair_schema().validate(args.as_object().unwrap()).is_ok());
    }

    #[test]
    fn test_number_accepts_integer() {
        assert!(PrimitiveType::Number.matches(&json!(3)));
        assert!(PrimitiveType::Number.matches(&json!(3.5)));
        assert!(!PrimitiveType::Integer.matches(&json!(3.5)));
    }

    #[test]
    fn test_check_rejects_undeclared_required() {
        let mut schema = pair_schema();
        schema.required.push("c".to_string());
        assert!(matches!(
            schema.check("pair"),
            Err(ToolError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_descriptor_listing_shape() {
        let descriptor = ToolDescriptor::new("add", "Add two numbers", pair_schema());
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["name"], "add");
        assert_eq!(value["inputSchema"]["type"], "object");
        assert_eq!(value["inputSchema"]["required"], json!(["a", "b"]));
        assert!(value.get("annotations").is_none());
    }

    #[test]
    fn test_purity_survives_the_wire() {
        let descriptor = ToolDescriptor::new("add", "Add", pair_schema()).pure();
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["annotations"]["readOnlyHint"], true);

        let back: ToolDescriptor = serde_json::from_value(value).unwrap();
        assert!(back.is_pure());
    }
}
