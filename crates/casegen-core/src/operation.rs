//! Resolved operation schemas: one optional schema node per input location

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the five channels carrying request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Body,
    PathParameters,
    Headers,
    Cookies,
    Query,
}

impl Location {
    /// Locations whose value is a keyed mapping (everything except the body).
    pub const KEYED: [Self; 4] = [
        Self::PathParameters,
        Self::Headers,
        Self::Cookies,
        Self::Query,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::PathParameters => "path_parameters",
            Self::Headers => "headers",
            Self::Cookies => "cookies",
            Self::Query => "query",
        }
    }

    /// Parse a location from its snake_case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "body" => Some(Self::Body),
            "path_parameters" => Some(Self::PathParameters),
            "headers" => Some(Self::Headers),
            "cookies" => Some(Self::Cookies),
            "query" => Some(Self::Query),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JSON Schema describing the allowed values of one location or field.
///
/// Opaque to case building except for the object accessors below, which the
/// merger uses to find required keys and their sub-schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaNode(Value);

impl SchemaNode {
    #[must_use]
    pub fn new(schema: Value) -> Self {
        Self(schema)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Declared `properties` of an object schema.
    #[must_use]
    pub fn properties(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    /// Sub-schema of a single property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<SchemaNode> {
        self.properties()
            .and_then(|props| props.get(name))
            .cloned()
            .map(SchemaNode)
    }

    /// Keys listed in `required`, in declaration order.
    #[must_use]
    pub fn required(&self) -> Vec<String> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Value> for SchemaNode {
    fn from(schema: Value) -> Self {
        Self(schema)
    }
}

/// Request body schema together with its `required` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySchema {
    pub node: SchemaNode,
    pub required: bool,
    pub media_type: String,
}

impl BodySchema {
    #[must_use]
    pub fn json(node: SchemaNode, required: bool) -> Self {
        Self {
            node,
            required,
            media_type: "application/json".to_string(),
        }
    }
}

/// One addressable API action with a schema per input location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationSchema {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub body: Option<BodySchema>,
    #[serde(default)]
    pub path_parameters: Option<SchemaNode>,
    #[serde(default)]
    pub headers: Option<SchemaNode>,
    #[serde(default)]
    pub cookies: Option<SchemaNode>,
    #[serde(default)]
    pub query: Option<SchemaNode>,
}

impl OperationSchema {
    #[must_use]
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// Operation label, e.g. "POST /users".
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Schema of a keyed location. Always `None` for [`Location::Body`].
    #[must_use]
    pub fn location(&self, location: Location) -> Option<&SchemaNode> {
        match location {
            Location::Body => None,
            Location::PathParameters => self.path_parameters.as_ref(),
            Location::Headers => self.headers.as_ref(),
            Location::Cookies => self.cookies.as_ref(),
            Location::Query => self.query.as_ref(),
        }
    }

    pub(crate) fn location_mut(&mut self, location: Location) -> Option<&mut Option<SchemaNode>> {
        match location {
            Location::Body => None,
            Location::PathParameters => Some(&mut self.path_parameters),
            Location::Headers => Some(&mut self.headers),
            Location::Cookies => Some(&mut self.cookies),
            Location::Query => Some(&mut self.query),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: BodySchema) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the schema of a keyed location. Ignored for [`Location::Body`].
    #[must_use]
    pub fn with_location(mut self, location: Location, schema: SchemaNode) -> Self {
        if let Some(slot) = self.location_mut(location) {
            *slot = Some(schema);
        }
        self
    }

    /// Check whether this operation matches a label such as "post /users".
    #[must_use]
    pub fn matches_label(&self, label: &str) -> bool {
        match label.trim().split_once(' ') {
            Some((method, path)) => {
                self.method.eq_ignore_ascii_case(method.trim()) && self.path == path.trim()
            }
            None => false,
        }
    }
}
