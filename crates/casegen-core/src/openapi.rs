//! OpenAPI document loading: extract operation schemas per path and method

use std::path::Path;

use serde_json::{Value, json};

use crate::operation::{BodySchema, Location, OperationSchema, SchemaNode};

const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("operation '{0}' not found in spec")]
    OperationNotFound(String),
}

/// A parsed OpenAPI 3.x document.
#[derive(Debug, Clone)]
pub struct ApiSpec {
    document: Value,
}

impl ApiSpec {
    #[must_use]
    pub fn from_value(document: Value) -> Self {
        Self { document }
    }

    /// Load a spec from a JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpecError::Io(format!("{}: {e}", path.display())))?;
        let document = parse_spec(path, &content)?;
        tracing::debug!(path = %path.display(), "loaded API spec");
        Ok(Self { document })
    }

    /// `components.schemas`, used to resolve `$ref` during generation.
    #[must_use]
    pub fn components(&self) -> Value {
        self.document
            .get("components")
            .and_then(|c| c.get("schemas"))
            .cloned()
            .unwrap_or_else(|| json!({}))
    }

    /// Every operation declared under `paths`, in document order per path.
    #[must_use]
    pub fn operations(&self) -> Vec<OperationSchema> {
        let mut ops = Vec::new();
        let Some(paths) = self.document.get("paths").and_then(Value::as_object) else {
            return ops;
        };

        for (path, path_item) in paths {
            for method in METHODS {
                if let Some(operation) = path_item.get(method) {
                    ops.push(self.extract_operation(method, path, path_item, operation));
                }
            }
        }
        ops
    }

    /// Find one operation by label, e.g. "POST /users".
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::OperationNotFound`] if no operation matches.
    pub fn operation(&self, label: &str) -> Result<OperationSchema, SpecError> {
        self.operations()
            .into_iter()
            .find(|op| op.matches_label(label))
            .ok_or_else(|| SpecError::OperationNotFound(label.to_string()))
    }

    fn extract_operation(
        &self,
        method: &str,
        path: &str,
        path_item: &Value,
        operation: &Value,
    ) -> OperationSchema {
        let mut parameters: Vec<Parameter> = Vec::new();

        // Path-level first; operation-level entries replace same name + location
        for source in [path_item.get("parameters"), operation.get("parameters")]
            .into_iter()
            .flatten()
        {
            let Some(params) = source.as_array() else {
                continue;
            };
            for param in params {
                let Some(p) = self.parse_parameter(param) else {
                    continue;
                };
                parameters.retain(|existing| {
                    !(existing.name == p.name && existing.location == p.location)
                });
                parameters.push(p);
            }
        }

        let mut op = OperationSchema::new(method, path);
        for location in Location::KEYED {
            if let Some(schema) = location_schema(&parameters, location) {
                op = op.with_location(location, schema);
            }
        }
        if let Some(body) = self.request_body(operation) {
            op = op.with_body(body);
        }
        op
    }

    fn parse_parameter(&self, param: &Value) -> Option<Parameter> {
        let param = self.resolve_component(param, "parameters")?;
        let name = param.get("name")?.as_str()?.to_string();
        let location = match param.get("in")?.as_str()? {
            "path" => Location::PathParameters,
            "query" => Location::Query,
            "header" => Location::Headers,
            "cookie" => Location::Cookies,
            _ => return None,
        };
        let schema = param
            .get("schema")
            .cloned()
            .unwrap_or_else(|| json!({"type": "string"}));
        // Path parameters are always required, whatever the document says
        let required = location == Location::PathParameters
            || param
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);

        Some(Parameter {
            name,
            location,
            schema,
            required,
        })
    }

    fn request_body(&self, operation: &Value) -> Option<BodySchema> {
        let body = self.resolve_component(operation.get("requestBody")?, "requestBodies")?;
        let content = body.get("content")?.as_object()?;
        let (media_type, media) = content
            .get_key_value("application/json")
            .or_else(|| content.iter().next())?;
        let schema = media.get("schema").cloned().unwrap_or_else(|| json!({}));
        let required = body
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Some(BodySchema {
            node: SchemaNode::new(schema),
            required,
            media_type: media_type.clone(),
        })
    }

    /// Follow a `#/components/<kind>/<name>` reference one level.
    fn resolve_component(&self, value: &Value, kind: &str) -> Option<Value> {
        let Some(ref_str) = value.get("$ref").and_then(Value::as_str) else {
            return Some(value.clone());
        };
        let name = ref_str.strip_prefix(&format!("#/components/{kind}/"))?;
        self.document
            .get("components")
            .and_then(|c| c.get(kind))
            .and_then(|c| c.get(name))
            .cloned()
    }
}

struct Parameter {
    name: String,
    location: Location,
    schema: Value,
    required: bool,
}

/// Object schema for one location: a property per parameter, `required` from the flags.
fn location_schema(parameters: &[Parameter], location: Location) -> Option<SchemaNode> {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for p in parameters.iter().filter(|p| p.location == location) {
        properties.insert(p.name.clone(), p.schema.clone());
        if p.required {
            required.push(Value::String(p.name.clone()));
        }
    }
    if properties.is_empty() {
        return None;
    }
    Some(SchemaNode::new(json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })))
}

/// Parse an OpenAPI spec from JSON or YAML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`), then fall back to
/// content sniffing (leading `{` → JSON, otherwise YAML).
///
/// # Errors
///
/// Returns error if the content is not valid JSON or YAML.
pub fn parse_spec(path: &Path, content: &str) -> Result<Value, SpecError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "json" => parse_json(content),
        _ if content.trim_start().starts_with('{') => parse_json(content),
        _ => parse_yaml(content),
    }
}

fn parse_json(content: &str) -> Result<Value, SpecError> {
    serde_json::from_str(content).map_err(|e| SpecError::Parse(format!("Invalid JSON: {e}")))
}

fn parse_yaml(content: &str) -> Result<Value, SpecError> {
    serde_yml::from_str(content).map_err(|e| SpecError::Parse(format!("Invalid YAML: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_spec() -> ApiSpec {
        ApiSpec::from_value(json!({
            "openapi": "3.0.2",
            "info": {"title": "Test", "version": "1.0"},
            "paths": {
                "/users": {
                    "parameters": [
                        {"in": "query", "name": "q1", "required": true, "schema": {"type": "string"}}
                    ],
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {"type": "string"}}}
                        },
                        "parameters": [
                            {"in": "path", "name": "p1", "schema": {"type": "string", "enum": ["FOO"]}},
                            {"in": "header", "name": "h1", "required": true, "schema": {"type": "string"}},
                            {"in": "cookie", "name": "c1", "required": false, "schema": {"type": "integer"}},
                            {"in": "query", "name": "q1", "required": false, "schema": {"type": "integer"}},
                            {"$ref": "#/components/parameters/Trace"}
                        ],
                        "responses": {"200": {"description": "OK"}}
                    },
                    "get": {
                        "responses": {"200": {"description": "OK"}}
                    }
                }
            },
            "components": {
                "schemas": {"User": {"type": "object"}},
                "parameters": {
                    "Trace": {"in": "header", "name": "X-Trace", "schema": {"type": "string"}}
                }
            }
        }))
    }

    #[test]
    fn extracts_all_methods() {
        let labels: Vec<String> = users_spec().operations().iter().map(|o| o.label()).collect();
        assert_eq!(labels, vec!["GET /users", "POST /users"]);
    }

    #[test]
    fn builds_location_schemas() {
        let op = users_spec().operation("POST /users").unwrap();

        let path = op.location(Location::PathParameters).unwrap();
        assert_eq!(path.required(), vec!["p1"]);

        let headers = op.location(Location::Headers).unwrap();
        assert_eq!(headers.required(), vec!["h1"]);
        assert!(headers.property("X-Trace").is_some());

        let cookies = op.location(Location::Cookies).unwrap();
        assert!(cookies.required().is_empty());

        // operation-level q1 replaces the path-level one
        let query = op.location(Location::Query).unwrap();
        assert!(query.required().is_empty());
        assert_eq!(query.property("q1").unwrap().as_value(), &json!({"type": "integer"}));
    }

    #[test]
    fn request_body_required_flag() {
        let op = users_spec().operation("post /users").unwrap();
        let body = op.body.unwrap();
        assert!(body.required);
        assert_eq!(body.media_type, "application/json");
        assert_eq!(body.node.as_value(), &json!({"type": "string"}));
    }

    #[test]
    fn operation_without_inputs() {
        let op = users_spec().operation("GET /users").unwrap();
        assert!(op.body.is_none());
        assert!(op.location(Location::Headers).is_none());
        // path-level parameters still apply
        assert!(op.location(Location::Query).is_some());
    }

    #[test]
    fn unknown_operation() {
        let err = users_spec().operation("DELETE /users").unwrap_err();
        assert!(matches!(err, SpecError::OperationNotFound(_)));
    }

    #[test]
    fn components_fallback_to_empty_object() {
        assert_eq!(ApiSpec::from_value(json!({})).components(), json!({}));
        assert!(users_spec().components().get("User").is_some());
    }

    #[test]
    fn parse_spec_yaml_by_content() {
        let doc = parse_spec(Path::new("spec"), "openapi: 3.0.0\npaths: {}\n").unwrap();
        assert_eq!(doc.get("openapi").and_then(Value::as_str), Some("3.0.0"));
    }

    #[test]
    fn parse_spec_invalid_json() {
        let err = parse_spec(Path::new("spec.json"), "{not json").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn load_missing_file() {
        let err = ApiSpec::load(Path::new("/nonexistent/openapi.yaml")).unwrap_err();
        assert!(matches!(err, SpecError::Io(_)));
    }
}
