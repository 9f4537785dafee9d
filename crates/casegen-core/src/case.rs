//! Generated test case: one concrete set of inputs for an operation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operation::Location;

/// Field name → value mapping for a keyed location. Key order is not meaningful.
pub type ParameterMap = serde_json::Map<String, Value>;

/// One fully-populated input for an operation, ready to be executed against a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Case {
    /// Operation label: "POST /users"
    pub operation: String,
    /// HTTP method, upper case
    pub method: String,
    /// Path template, e.g. "/users/{id}"
    pub path: String,
    /// Request body; `None` means no body is sent
    #[serde(default)]
    pub body: Option<Value>,
    /// Media type of the body, present iff a body is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub path_parameters: ParameterMap,
    #[serde(default)]
    pub headers: ParameterMap,
    #[serde(default)]
    pub cookies: ParameterMap,
    #[serde(default)]
    pub query: ParameterMap,
}

impl Case {
    /// Mapping of a keyed location. `None` for [`Location::Body`].
    #[must_use]
    pub fn location(&self, location: Location) -> Option<&ParameterMap> {
        match location {
            Location::Body => None,
            Location::PathParameters => Some(&self.path_parameters),
            Location::Headers => Some(&self.headers),
            Location::Cookies => Some(&self.cookies),
            Location::Query => Some(&self.query),
        }
    }

    /// Path with `{name}` placeholders substituted from `path_parameters`.
    ///
    /// String values are inserted as-is, other JSON values in their JSON text form.
    #[must_use]
    pub fn formatted_path(&self) -> String {
        let mut path = self.path.clone();
        for (name, value) in &self.path_parameters {
            path = path.replace(&format!("{{{name}}}"), &value_to_param_string(value));
        }
        path
    }
}

/// Render a parameter value the way it travels in a URL or header.
#[must_use]
pub fn value_to_param_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Generate the JSON Schema of [`Case`] for consumers of the JSONL output.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(Case);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
