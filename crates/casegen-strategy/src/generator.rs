//! Schema-bound value generation capability

use proptest::prelude::*;
use serde_json::Value;

use casegen_core::SchemaNode;

/// Errors raised while turning a schema into a strategy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// No value can satisfy the schema (empty enum, `maximum < minimum`, ...)
    #[error("unsatisfiable schema: {0}")]
    Unsatisfiable(String),
    /// A `$ref` points at nothing in `components.schemas`
    #[error("unresolved reference '{0}'")]
    UnresolvedRef(String),
}

/// Produces a lazy, restartable, shrinkable stream of values for a schema node.
///
/// Case building only depends on this trait, so tests can plug in a
/// deterministic stub instead of the randomized [`JsonSchemaGenerator`].
///
/// [`JsonSchemaGenerator`]: crate::datagen::JsonSchemaGenerator
pub trait SchemaGenerator {
    /// # Errors
    ///
    /// Returns error if the schema cannot be satisfied.
    fn strategy(&self, node: &SchemaNode) -> Result<BoxedStrategy<Value>, GenerationError>;
}

impl<G: SchemaGenerator + ?Sized> SchemaGenerator for &G {
    fn strategy(&self, node: &SchemaNode) -> Result<BoxedStrategy<Value>, GenerationError> {
        (**self).strategy(node)
    }
}

/// Combine independent strategies into one that yields all their values in order.
pub(crate) fn sequence<T>(strategies: Vec<BoxedStrategy<T>>) -> BoxedStrategy<Vec<T>>
where
    T: Clone + std::fmt::Debug + 'static,
{
    let mut combined: BoxedStrategy<Vec<T>> = Just(Vec::new()).boxed();
    for strategy in strategies {
        combined = (combined, strategy)
            .prop_map(|(mut values, value)| {
                values.push(value);
                values
            })
            .boxed();
    }
    combined
}
