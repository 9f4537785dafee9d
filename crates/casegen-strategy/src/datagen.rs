//! JSON Schema → proptest strategy of `serde_json::Value`
//!
//! Handles OpenAPI 3.x / JSON Schema Draft 7 subset:
//! string, integer, number, boolean, array, object, enum, const, $ref, anyOf, oneOf, allOf

use proptest::prelude::*;
use proptest::strategy::Union;
use serde_json::{Map, Value, json};

use casegen_core::SchemaNode;

use crate::generator::{GenerationError, SchemaGenerator, sequence};

/// Maximum recursion depth for schema traversal (prevents stack overflow on circular `$ref`).
const MAX_DEPTH: u32 = 20;

/// Maximum string length for generation (prevents OOM on absurd maxLength values).
const MAX_STRING_LEN: usize = 10_000;

/// Maximum array length for generation; `maxItems` above this is clamped.
const MAX_ARRAY_LEN: usize = 1_000;

const ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default schema-bound generator backed by proptest.
///
/// `components` is `spec["components"]["schemas"]` for `$ref` resolution.
#[derive(Debug, Clone)]
pub struct JsonSchemaGenerator {
    components: Value,
}

impl Default for JsonSchemaGenerator {
    fn default() -> Self {
        Self::new(json!({}))
    }
}

impl SchemaGenerator for JsonSchemaGenerator {
    fn strategy(&self, node: &SchemaNode) -> Result<BoxedStrategy<Value>, GenerationError> {
        self.value_strategy(node.as_value(), 0)
    }
}

impl JsonSchemaGenerator {
    #[must_use]
    pub fn new(components: Value) -> Self {
        Self { components }
    }

    fn value_strategy(
        &self,
        schema: &Value,
        depth: u32,
    ) -> Result<BoxedStrategy<Value>, GenerationError> {
        if depth > MAX_DEPTH {
            return Ok(Just(Value::Null).boxed());
        }

        let empty = json!({});
        let schema = match schema {
            Value::Bool(false) => {
                return Err(GenerationError::Unsatisfiable(
                    "`false` schema accepts no value".into(),
                ));
            }
            Value::Object(_) => schema,
            _ => &empty,
        };

        // $ref
        if let Some(ref_str) = schema.get("$ref").and_then(Value::as_str) {
            let resolved = resolve_ref(ref_str, &self.components)
                .ok_or_else(|| GenerationError::UnresolvedRef(ref_str.to_string()))?;
            return self.value_strategy(&resolved, depth + 1);
        }

        if let Some(value) = schema.get("const") {
            return Ok(Just(value.clone()).boxed());
        }

        // enum
        if let Some(enum_values) = schema.get("enum").and_then(Value::as_array) {
            if enum_values.is_empty() {
                return Err(GenerationError::Unsatisfiable(
                    "enum must include at least one value".into(),
                ));
            }
            return Ok(proptest::sample::select(enum_values.clone()).boxed());
        }

        // anyOf / oneOf: pick one non-null variant
        for key in ["anyOf", "oneOf"] {
            if let Some(variants) = schema.get(key).and_then(Value::as_array) {
                let non_null: Vec<&Value> = variants
                    .iter()
                    .filter(|s| s.get("type").and_then(Value::as_str) != Some("null"))
                    .collect();
                if non_null.is_empty() {
                    return Ok(Just(Value::Null).boxed());
                }
                let strategies = non_null
                    .into_iter()
                    .map(|variant| self.value_strategy(variant, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Union::new(strategies).boxed());
            }
        }

        // allOf: merge into one schema, then generate from that
        if let Some(all_of) = schema.get("allOf").and_then(Value::as_array) {
            let merged = self.merge_all_of(schema, all_of, depth)?;
            return self.value_strategy(&merged, depth + 1);
        }

        match schema.get("type") {
            Some(Value::String(type_str)) => self.typed_strategy(type_str, schema, depth),
            Some(Value::Array(types)) => {
                let non_null: Vec<&str> = types
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|t| *t != "null")
                    .collect();
                if non_null.is_empty() {
                    return Ok(Just(Value::Null).boxed());
                }
                let strategies = non_null
                    .into_iter()
                    .map(|type_str| self.typed_strategy(type_str, schema, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Union::new(strategies).boxed())
            }
            // Infer from structure
            _ => {
                if schema.get("properties").is_some() {
                    self.object_strategy(schema, depth + 1)
                } else if schema.get("items").is_some() {
                    self.array_strategy(schema, depth + 1)
                } else {
                    string_strategy(schema)
                }
            }
        }
    }

    fn typed_strategy(
        &self,
        type_str: &str,
        schema: &Value,
        depth: u32,
    ) -> Result<BoxedStrategy<Value>, GenerationError> {
        match type_str {
            "string" => string_strategy(schema),
            "integer" => integer_strategy(schema),
            "number" => number_strategy(schema),
            "boolean" => Ok(any::<bool>().prop_map(Value::Bool).boxed()),
            "array" => self.array_strategy(schema, depth + 1),
            "object" => self.object_strategy(schema, depth + 1),
            "null" => Ok(Just(Value::Null).boxed()),
            other => Err(GenerationError::Unsatisfiable(format!(
                "unsupported type '{other}'"
            ))),
        }
    }

    fn array_strategy(
        &self,
        schema: &Value,
        depth: u32,
    ) -> Result<BoxedStrategy<Value>, GenerationError> {
        let min = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
        if min > MAX_ARRAY_LEN {
            return Err(GenerationError::Unsatisfiable(format!(
                "minItems {min} exceeds the generation limit of {MAX_ARRAY_LEN}"
            )));
        }
        let max = match schema.get("maxItems").and_then(Value::as_u64) {
            Some(max) if (max as usize) < min => {
                return Err(GenerationError::Unsatisfiable(
                    "maxItems must be >= minItems".into(),
                ));
            }
            Some(max) => (max as usize).min(MAX_ARRAY_LEN),
            None => min.max(3),
        };
        let items_schema = schema
            .get("items")
            .cloned()
            .unwrap_or_else(|| json!({"type": "string"}));
        let item = self.value_strategy(&items_schema, depth)?;
        Ok(proptest::collection::vec(item, min..=max)
            .prop_map(Value::Array)
            .boxed())
    }

    /// Required properties are always present; optional ones appear about half the time.
    fn object_strategy(
        &self,
        schema: &Value,
        depth: u32,
    ) -> Result<BoxedStrategy<Value>, GenerationError> {
        let required = required_keys(schema);
        let props = schema.get("properties").and_then(Value::as_object);

        let mut fields: Vec<BoxedStrategy<Option<(String, Value)>>> = Vec::new();
        for (name, prop_schema) in props.into_iter().flatten() {
            let is_required = required.contains(name);
            let owned = name.clone();
            let entry = self
                .value_strategy(prop_schema, depth)?
                .prop_map(move |v| (owned.clone(), v));
            fields.push(if is_required {
                entry.prop_map(Some).boxed()
            } else {
                proptest::option::of(entry).boxed()
            });
        }

        // Required keys without a property schema accept any value
        for name in required
            .iter()
            .filter(|k| !props.is_some_and(|p| p.contains_key(*k)))
        {
            let owned = name.clone();
            fields.push(
                string_strategy(&json!({}))?
                    .prop_map(move |v| Some((owned.clone(), v)))
                    .boxed(),
            );
        }

        Ok(sequence(fields)
            .prop_map(|entries| Value::Object(entries.into_iter().flatten().collect()))
            .boxed())
    }

    /// Fold `allOf` members into the parent: properties and required lists are
    /// unioned, any other keyword is taken from the last member declaring it.
    fn merge_all_of(
        &self,
        schema: &Value,
        all_of: &[Value],
        depth: u32,
    ) -> Result<Value, GenerationError> {
        if depth > MAX_DEPTH {
            return Ok(json!({}));
        }

        let mut merged = schema.as_object().cloned().unwrap_or_default();
        merged.remove("allOf");
        let mut properties = match merged.remove("properties") {
            Some(Value::Object(p)) => p,
            _ => Map::new(),
        };
        let mut required = match merged.remove("required") {
            Some(Value::Array(r)) => r,
            _ => Vec::new(),
        };

        for sub in all_of {
            let mut sub = self.resolve(sub, depth)?;
            if let Some(nested) = sub.get("allOf").and_then(Value::as_array).cloned() {
                sub = self.merge_all_of(&sub, &nested, depth + 1)?;
            }
            let Value::Object(sub) = sub else {
                continue;
            };
            for (key, value) in sub {
                match (key.as_str(), value) {
                    ("properties", Value::Object(p)) => properties.extend(p),
                    ("required", Value::Array(r)) => required.extend(r),
                    (_, value) => {
                        merged.insert(key, value);
                    }
                }
            }
        }

        if !properties.is_empty() {
            merged.insert("properties".into(), Value::Object(properties));
        }
        if !required.is_empty() {
            merged.insert("required".into(), Value::Array(required));
        }
        Ok(Value::Object(merged))
    }

    fn resolve(&self, schema: &Value, depth: u32) -> Result<Value, GenerationError> {
        let mut current = schema.clone();
        for _ in depth..=MAX_DEPTH {
            let Some(ref_str) = current.get("$ref").and_then(Value::as_str) else {
                return Ok(current);
            };
            current = resolve_ref(ref_str, &self.components)
                .ok_or_else(|| GenerationError::UnresolvedRef(ref_str.to_string()))?;
        }
        Ok(json!({}))
    }
}

pub(crate) fn resolve_ref(ref_str: &str, components: &Value) -> Option<Value> {
    ref_str
        .strip_prefix("#/components/schemas/")
        .and_then(|name| components.get(name).cloned())
}

fn required_keys(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn string_strategy(schema: &Value) -> Result<BoxedStrategy<Value>, GenerationError> {
    let format = schema.get("format").and_then(Value::as_str);
    match format {
        Some("email") => {
            return Ok((1..9999_u32)
                .prop_map(|n| Value::String(format!("user{n}@example.com")))
                .boxed());
        }
        Some("uri" | "url") => return Ok(Just(json!("https://example.com")).boxed()),
        Some("date") => {
            return Ok((1970..=2100_u32, 1..=12_u32, 1..=28_u32)
                .prop_map(|(y, m, d)| Value::String(format!("{y:04}-{m:02}-{d:02}")))
                .boxed());
        }
        Some("date-time") => {
            return Ok((
                (1970..=2100_u32, 1..=12_u32, 1..=28_u32),
                (0..24_u32, 0..60_u32, 0..60_u32),
            )
                .prop_map(|((y, mo, d), (h, mi, s))| {
                    Value::String(format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}Z"))
                })
                .boxed());
        }
        Some("uuid") => return Ok(any::<u128>().prop_map(uuid_v4).boxed()),
        _ => {}
    }

    let min_declared = schema.get("minLength").and_then(Value::as_u64);
    let max_declared = schema.get("maxLength").and_then(Value::as_u64);
    // Non-empty by default, unless maxLength forces the empty string
    let min = match (min_declared, max_declared) {
        (Some(v), _) if v > MAX_STRING_LEN as u64 => {
            return Err(GenerationError::Unsatisfiable(format!(
                "minLength {v} exceeds the generation limit of {MAX_STRING_LEN}"
            )));
        }
        (Some(v), _) => v as usize,
        (None, Some(0)) => 0,
        (None, _) => 1,
    };
    let max = match max_declared {
        Some(v) if (v as usize) < min => {
            return Err(GenerationError::Unsatisfiable(
                "maxLength must be >= minLength".into(),
            ));
        }
        Some(v) => (v as usize).min(MAX_STRING_LEN),
        None => min.max(20),
    };

    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
        let pattern = pattern.strip_suffix('$').unwrap_or(pattern);
        let strategy = proptest::string::string_regex(pattern).map_err(|e| {
            GenerationError::Unsatisfiable(format!("pattern must be a valid regex: {e}"))
        })?;
        let (min, max) = (
            min_declared.map_or(0, |v| v as usize),
            max_declared.map_or(usize::MAX, |v| v as usize),
        );
        return Ok(strategy
            .prop_filter("string length out of bounds", move |s| {
                let len = s.chars().count();
                len >= min && len <= max
            })
            .prop_map(Value::String)
            .boxed());
    }

    Ok(proptest::collection::vec(alnum(), min..=max)
        .prop_map(|chars| Value::String(chars.into_iter().collect()))
        .boxed())
}

/// Integer bounds: `minimum`/`maximum` (and their exclusive forms) when declared,
/// otherwise a window of 2000 around whichever bound exists, or `-1000..=1000`.
fn integer_strategy(schema: &Value) -> Result<BoxedStrategy<Value>, GenerationError> {
    let min = integer_bound(schema, "minimum", "exclusiveMinimum", 1);
    let max = integer_bound(schema, "maximum", "exclusiveMaximum", -1);

    let (lo, hi) = match (min, max) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) => (lo, lo.saturating_add(2000)),
        (None, Some(hi)) => (hi.saturating_sub(2000), hi),
        (None, None) => (-1000, 1000),
    };
    if hi < lo {
        return Err(GenerationError::Unsatisfiable(
            "maximum must be >= minimum".into(),
        ));
    }

    // Edge values are weighted in for fuzz effectiveness
    let mut edges = vec![lo, hi];
    edges.extend([0, -1, 1].into_iter().filter(|v| (lo..=hi).contains(v)));
    if min.is_none() {
        edges.push(i64::MIN);
    }
    if max.is_none() {
        edges.push(i64::MAX);
    }
    edges.sort_unstable();
    edges.dedup();

    Ok(prop_oneof![
        4 => (lo..=hi).prop_map(Value::from),
        1 => proptest::sample::select(edges).prop_map(Value::from),
    ]
    .boxed())
}

fn integer_bound(schema: &Value, inclusive: &str, exclusive: &str, step: i64) -> Option<i64> {
    let as_int = |v: &Value| {
        v.as_i64().or_else(|| {
            v.as_f64()
                .map(|f| if step > 0 { f.ceil() } else { f.floor() })
                .map(|f| f as i64)
        })
    };
    match schema.get(exclusive) {
        // OpenAPI 3.1 / Draft 6+: numeric exclusive bound
        Some(v) if v.is_number() => as_int(v).map(|b| b.saturating_add(step)),
        // OpenAPI 3.0: boolean flag modifying the inclusive bound
        Some(Value::Bool(true)) => schema
            .get(inclusive)
            .and_then(as_int)
            .map(|b| b.saturating_add(step)),
        _ => schema.get(inclusive).and_then(as_int),
    }
}

/// Number bounds follow the same rules as [`integer_strategy`]; an exclusive
/// bound is kept in the range and its endpoint filtered out.
fn number_strategy(schema: &Value) -> Result<BoxedStrategy<Value>, GenerationError> {
    let min = number_bound(schema, "minimum", "exclusiveMinimum");
    let max = number_bound(schema, "maximum", "exclusiveMaximum");
    let lo_open = min.is_some_and(|(_, open)| open);
    let hi_open = max.is_some_and(|(_, open)| open);
    let (lo, hi) = match (min.map(|(b, _)| b), max.map(|(b, _)| b)) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) => (lo, lo + 1000.0),
        (None, Some(hi)) => (hi - 1000.0, hi),
        (None, None) => (0.0, 1000.0),
    };
    if hi < lo || !lo.is_finite() || !hi.is_finite() {
        return Err(GenerationError::Unsatisfiable(
            "maximum must be >= minimum".into(),
        ));
    }
    if lo == hi && (lo_open || hi_open) {
        return Err(GenerationError::Unsatisfiable(
            "exclusive bounds leave no value".into(),
        ));
    }
    Ok((lo..=hi)
        .prop_filter("value on an exclusive bound", move |f| {
            !(lo_open && *f <= lo) && !(hi_open && *f >= hi)
        })
        .prop_map(|f| json!(f))
        .boxed())
}

/// `(bound, exclusive)` in either the 3.1 numeric or the 3.0 boolean form.
fn number_bound(schema: &Value, inclusive: &str, exclusive: &str) -> Option<(f64, bool)> {
    match schema.get(exclusive) {
        Some(v) if v.is_number() => v.as_f64().map(|b| (b, true)),
        Some(Value::Bool(true)) => schema
            .get(inclusive)
            .and_then(Value::as_f64)
            .map(|b| (b, true)),
        _ => schema
            .get(inclusive)
            .and_then(Value::as_f64)
            .map(|b| (b, false)),
    }
}

fn alnum() -> impl Strategy<Value = char> {
    proptest::sample::select(ALNUM).prop_map(char::from)
}

fn uuid_v4(n: u128) -> Value {
    Value::String(format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (n >> 96) as u32,
        (n >> 80) as u16,
        (n >> 64) as u16 & 0x0FFF,
        ((n >> 48) as u16 & 0x3FFF) | 0x8000,
        n as u64 & 0xFFFF_FFFF_FFFF,
    ))
}
