//! Per-location merging of explicit overrides with schema-driven generation
//!
//! One function serves all four keyed locations. With no override the
//! location is generated as a whole. With an override (even an empty one) only
//! the required fields the caller did not pin are generated, and the caller's
//! entries are laid on top verbatim, schema or not.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{Value, json};

use casegen_core::{LocationOverride, ParameterMap, SchemaNode};

use crate::generator::{GenerationError, SchemaGenerator, sequence};

/// Build the strategy producing the final mapping for one keyed location.
///
/// # Errors
///
/// Returns error if the generator cannot build a strategy for the location
/// schema or for one of its required fields. Explicit values are never checked.
pub fn location_strategy<G: SchemaGenerator + ?Sized>(
    generator: &G,
    schema: Option<&SchemaNode>,
    explicit: &LocationOverride,
) -> Result<BoxedStrategy<ParameterMap>, GenerationError> {
    let Some(explicit) = explicit.entries() else {
        return match schema {
            Some(node) => Ok(generator.strategy(node)?.prop_map(into_map).boxed()),
            None => Ok(Just(ParameterMap::new()).boxed()),
        };
    };

    let mut fields = Vec::new();
    if let Some(node) = schema {
        let mut seen = HashSet::new();
        for name in node.required() {
            if explicit.contains_key(&name) || !seen.insert(name.clone()) {
                continue;
            }
            // A required key without a property schema accepts anything
            let field_schema = node
                .property(&name)
                .unwrap_or_else(|| SchemaNode::new(json!({})));
            let value = generator.strategy(&field_schema)?;
            fields.push(value.prop_map(move |v| (name.clone(), v)).boxed());
        }
    }

    let explicit = explicit.clone();
    Ok(sequence(fields)
        .prop_map(move |generated| overlay(generated.into_iter().collect(), &explicit))
        .boxed())
}

/// Lay explicit entries over a generated base. Explicit wins on collision.
fn overlay(mut base: ParameterMap, explicit: &ParameterMap) -> ParameterMap {
    for (name, value) in explicit {
        base.insert(name.clone(), value.clone());
    }
    debug_assert!(
        explicit.iter().all(|(name, value)| base.get(name) == Some(value)),
        "explicit entry lost while merging"
    );
    base
}

/// Location schemas are objects; anything else carries no named fields.
fn into_map(value: Value) -> ParameterMap {
    match value {
        Value::Object(map) => map,
        _ => ParameterMap::new(),
    }
}
