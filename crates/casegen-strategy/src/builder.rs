//! Case strategy assembly: body + four keyed locations → `Case`

use proptest::prelude::*;
use serde_json::Value;

use casegen_core::{
    Case, ExplicitOverrides, Location, LocationOverride, OperationSchema, OverrideError,
    ParameterMap,
};

use crate::generator::{GenerationError, SchemaGenerator};
use crate::merge::location_strategy;

const DEFAULT_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("cannot generate {location} for {operation}: {source}")]
    Generation {
        operation: String,
        location: Location,
        #[source]
        source: GenerationError,
    },
    #[error(transparent)]
    Override(#[from] OverrideError),
}

impl CaseError {
    /// The generator error behind this failure, untouched.
    #[must_use]
    pub fn generation_error(&self) -> Option<&GenerationError> {
        match self {
            Self::Generation { source, .. } => Some(source),
            Self::Override(_) => None,
        }
    }
}

/// Build a strategy of complete cases for `operation`, honoring `overrides`.
///
/// Every drawn case holds each explicit entry verbatim and every required
/// field of the locations the caller did not fully pin.
///
/// # Errors
///
/// Returns error if a schema the generator must draw from is unsatisfiable.
pub fn case_strategy<G: SchemaGenerator + ?Sized>(
    operation: &OperationSchema,
    overrides: &ExplicitOverrides,
    generator: &G,
) -> Result<BoxedStrategy<Case>, CaseError> {
    CaseStrategyBuilder::new(operation)
        .overrides(overrides.clone())
        .build(generator)
}

/// [`case_strategy`] with overrides given as a loosely-typed JSON object,
/// e.g. `{"body": "TEST", "headers": {"invalid": "T"}}`.
///
/// # Errors
///
/// Returns error if the overrides have the wrong shape (checked before any
/// strategy is built) or a schema is unsatisfiable.
pub fn case_strategy_from_json<G: SchemaGenerator + ?Sized>(
    operation: &OperationSchema,
    overrides: &Value,
    generator: &G,
) -> Result<BoxedStrategy<Case>, CaseError> {
    let overrides = ExplicitOverrides::from_value(overrides)?;
    case_strategy(operation, &overrides, generator)
}

/// Collects explicit overrides for one operation, then builds its case strategy.
///
/// ```ignore
/// let strategy = CaseStrategyBuilder::new(&operation)
///     .body(json!("TEST"))
///     .headers(headers)
///     .build(&JsonSchemaGenerator::new(spec.components()))?;
/// ```
#[derive(Debug, Clone)]
pub struct CaseStrategyBuilder<'a> {
    operation: &'a OperationSchema,
    overrides: ExplicitOverrides,
}

impl<'a> CaseStrategyBuilder<'a> {
    #[must_use]
    pub fn new(operation: &'a OperationSchema) -> Self {
        Self {
            operation,
            overrides: ExplicitOverrides::default(),
        }
    }

    #[must_use]
    pub fn overrides(mut self, overrides: ExplicitOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.overrides.body = Some(body);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location, map: ParameterMap) -> Self {
        self.overrides = self.overrides.with_location(location, map);
        self
    }

    #[must_use]
    pub fn path_parameters(self, map: ParameterMap) -> Self {
        self.location(Location::PathParameters, map)
    }

    #[must_use]
    pub fn headers(self, map: ParameterMap) -> Self {
        self.location(Location::Headers, map)
    }

    #[must_use]
    pub fn cookies(self, map: ParameterMap) -> Self {
        self.location(Location::Cookies, map)
    }

    #[must_use]
    pub fn query(self, map: ParameterMap) -> Self {
        self.location(Location::Query, map)
    }

    /// Override currently recorded for a keyed location.
    #[must_use]
    pub fn explicit(&self, location: Location) -> &LocationOverride {
        self.overrides.location(location)
    }

    /// Build the case strategy. Nothing is drawn here.
    ///
    /// # Errors
    ///
    /// Returns error if a schema the generator must draw from is unsatisfiable.
    pub fn build<G: SchemaGenerator + ?Sized>(
        &self,
        generator: &G,
    ) -> Result<BoxedStrategy<Case>, CaseError> {
        let op = self.operation;
        let label = op.label();
        tracing::debug!(
            operation = %label,
            explicit_body = self.overrides.body.is_some(),
            path_parameters = self.overrides.path_parameters.mode(),
            headers = self.overrides.headers.mode(),
            cookies = self.overrides.cookies.mode(),
            query = self.overrides.query.mode(),
            "building case strategy"
        );

        let wrap = |location: Location| {
            let operation = label.clone();
            move |source| CaseError::Generation {
                operation,
                location,
                source,
            }
        };

        let body = self.body_strategy(generator).map_err(wrap(Location::Body))?;
        let keyed = |location: Location| -> Result<BoxedStrategy<ParameterMap>, CaseError> {
            location_strategy(
                generator,
                op.location(location),
                self.overrides.location(location),
            )
            .map_err(wrap(location))
        };
        let path_parameters = keyed(Location::PathParameters)?;
        let headers = keyed(Location::Headers)?;
        let cookies = keyed(Location::Cookies)?;
        let query = keyed(Location::Query)?;

        let method = op.method.clone();
        let path = op.path.clone();
        Ok((body, path_parameters, headers, cookies, query)
            .prop_map(
                move |((body, media_type), path_parameters, headers, cookies, query)| Case {
                    operation: label.clone(),
                    method: method.clone(),
                    path: path.clone(),
                    body,
                    media_type,
                    path_parameters,
                    headers,
                    cookies,
                    query,
                },
            )
            .boxed())
    }

    /// Body value together with its media type; both `None` when no body is sent.
    fn body_strategy<G: SchemaGenerator + ?Sized>(
        &self,
        generator: &G,
    ) -> Result<BoxedStrategy<(Option<Value>, Option<String>)>, GenerationError> {
        let schema = self.operation.body.as_ref();
        let media_type = schema.map_or_else(
            || DEFAULT_MEDIA_TYPE.to_string(),
            |b| b.media_type.clone(),
        );

        // An explicit body is never merged with generated content
        if let Some(body) = &self.overrides.body {
            return Ok(Just((Some(body.clone()), Some(media_type))).boxed());
        }

        let Some(schema) = schema else {
            return Ok(Just((None::<Value>, None::<String>)).boxed());
        };
        let generated = generator
            .strategy(&schema.node)?
            .prop_map(move |v| (Some(v), Some(media_type.clone())));
        if schema.required {
            Ok(generated.boxed())
        } else {
            Ok(prop_oneof![Just((None::<Value>, None::<String>)), generated].boxed())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegen_core::{BodySchema, SchemaNode};
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;
    use serde_json::json;

    use crate::datagen::JsonSchemaGenerator;

    fn single_enum(name: &str) -> SchemaNode {
        SchemaNode::new(json!({
            "type": "object",
            "properties": {name: {"type": "string", "enum": ["FOO"]}},
            "required": [name]
        }))
    }

    fn operation() -> OperationSchema {
        OperationSchema::new("POST", "/users")
            .with_body(BodySchema::json(SchemaNode::new(json!({"type": "string"})), true))
            .with_location(Location::PathParameters, single_enum("p1"))
            .with_location(Location::Headers, single_enum("h1"))
            .with_location(Location::Cookies, single_enum("c1"))
            .with_location(Location::Query, single_enum("q1"))
    }

    fn draw_n(strategy: &BoxedStrategy<Case>, n: usize) -> Vec<Case> {
        let mut runner = TestRunner::deterministic();
        (0..n)
            .map(|_| strategy.new_tree(&mut runner).unwrap().current())
            .collect()
    }

    fn params(value: Value) -> ParameterMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn explicit_body_is_constant() {
        let op = operation();
        let strategy = CaseStrategyBuilder::new(&op)
            .body(json!("TEST"))
            .build(&JsonSchemaGenerator::default())
            .unwrap();
        for case in draw_n(&strategy, 20) {
            assert_eq!(case.body, Some(json!("TEST")));
            assert_eq!(case.media_type.as_deref(), Some("application/json"));
        }
    }

    #[test]
    fn explicit_null_body_is_kept() {
        let op = operation();
        let overrides = ExplicitOverrides::new().with_body(Value::Null);
        let strategy = case_strategy(&op, &overrides, &JsonSchemaGenerator::default()).unwrap();
        for case in draw_n(&strategy, 5) {
            assert_eq!(case.body, Some(Value::Null));
        }
    }

    #[test]
    fn required_body_always_generated() {
        let op = operation();
        let strategy = case_strategy(&op, &ExplicitOverrides::default(), &JsonSchemaGenerator::default())
            .unwrap();
        for case in draw_n(&strategy, 20) {
            assert!(case.body.as_ref().is_some_and(Value::is_string));
        }
    }

    #[test]
    fn optional_body_may_be_absent() {
        let op = OperationSchema::new("PUT", "/items")
            .with_body(BodySchema::json(SchemaNode::new(json!({"type": "integer"})), false));
        let strategy = case_strategy(&op, &ExplicitOverrides::default(), &JsonSchemaGenerator::default())
            .unwrap();
        let cases = draw_n(&strategy, 100);
        assert!(cases.iter().any(|c| c.body.is_none() && c.media_type.is_none()));
        assert!(cases.iter().any(|c| c.body.is_some() && c.media_type.is_some()));
    }

    #[test]
    fn no_body_schema_means_no_body() {
        let op = OperationSchema::new("GET", "/health");
        let strategy = case_strategy(&op, &ExplicitOverrides::default(), &JsonSchemaGenerator::default())
            .unwrap();
        let case = draw_n(&strategy, 1).remove(0);
        assert_eq!(case.body, None);
        assert_eq!(case.media_type, None);
        assert_eq!(case.operation, "GET /health");
        assert!(case.headers.is_empty() && case.query.is_empty());
    }

    #[test]
    fn every_location_completed_without_overrides() {
        let op = operation();
        let strategy = case_strategy(&op, &ExplicitOverrides::default(), &JsonSchemaGenerator::default())
            .unwrap();
        for case in draw_n(&strategy, 10) {
            assert_eq!(case.path_parameters, params(json!({"p1": "FOO"})));
            assert_eq!(case.headers, params(json!({"h1": "FOO"})));
            assert_eq!(case.cookies, params(json!({"c1": "FOO"})));
            assert_eq!(case.query, params(json!({"q1": "FOO"})));
        }
    }

    #[test]
    fn keyed_overrides_merge_per_location() {
        let op = operation();
        let strategy = CaseStrategyBuilder::new(&op)
            .headers(params(json!({"invalid": "T"})))
            .query(params(json!({"q1": "TEST"})))
            .cookies(ParameterMap::new())
            .build(&JsonSchemaGenerator::default())
            .unwrap();
        for case in draw_n(&strategy, 10) {
            assert_eq!(case.headers, params(json!({"h1": "FOO", "invalid": "T"})));
            assert_eq!(case.query, params(json!({"q1": "TEST"})));
            assert_eq!(case.cookies, params(json!({"c1": "FOO"})));
        }
    }

    #[test]
    fn unsatisfiable_location_reports_location() {
        let op = OperationSchema::new("GET", "/x").with_location(
            Location::Query,
            SchemaNode::new(json!({
                "type": "object",
                "properties": {"n": {"type": "integer", "minimum": 2, "maximum": 1}},
                "required": ["n"]
            })),
        );
        let err = case_strategy(&op, &ExplicitOverrides::default(), &JsonSchemaGenerator::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CaseError::Generation {
                location: Location::Query,
                ..
            }
        ));
        assert!(matches!(
            err.generation_error(),
            Some(GenerationError::Unsatisfiable(_))
        ));
        assert!(err.to_string().contains("GET /x"));
    }

    #[test]
    fn explicit_body_skips_unsatisfiable_body_schema() {
        let op = OperationSchema::new("POST", "/x")
            .with_body(BodySchema::json(SchemaNode::new(json!({"enum": []})), true));
        let overrides = ExplicitOverrides::new().with_body(json!(1));
        assert!(case_strategy(&op, &overrides, &JsonSchemaGenerator::default()).is_ok());
        assert!(
            case_strategy(&op, &ExplicitOverrides::default(), &JsonSchemaGenerator::default())
                .is_err()
        );
    }

    #[test]
    fn malformed_json_overrides_rejected_at_construction() {
        let op = operation();
        let err = case_strategy_from_json(
            &op,
            &json!({"path_parameters": "p1=TEST"}),
            &JsonSchemaGenerator::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            CaseError::Override(OverrideError::NotAnObject {
                location: Location::PathParameters,
                ..
            })
        ));
        assert!(err.generation_error().is_none());
    }

    #[test]
    fn json_overrides_applied() {
        let op = operation();
        let strategy = case_strategy_from_json(
            &op,
            &json!({"cookies": {"c1": "TEST"}}),
            &JsonSchemaGenerator::default(),
        )
        .unwrap();
        for case in draw_n(&strategy, 5) {
            assert_eq!(case.cookies, params(json!({"c1": "TEST"})));
        }
    }

    #[test]
    fn builder_records_overrides() {
        let op = operation();
        let builder = CaseStrategyBuilder::new(&op).path_parameters(ParameterMap::new());
        assert_eq!(builder.explicit(Location::PathParameters), &LocationOverride::Empty);
        assert!(builder.explicit(Location::Headers).is_absent());
    }

    #[test]
    fn deterministic_case_snapshot() {
        let op = operation();
        let strategy = CaseStrategyBuilder::new(&op)
            .body(json!("TEST"))
            .headers(params(json!({"invalid": "T"})))
            .build(&JsonSchemaGenerator::default())
            .unwrap();
        let case = draw_n(&strategy, 1).remove(0);
        insta::assert_yaml_snapshot!(case, @r#"
        operation: POST /users
        method: POST
        path: /users
        body: TEST
        media_type: application/json
        path_parameters:
          p1: FOO
        headers:
          h1: FOO
          invalid: T
        cookies:
          c1: FOO
        query:
          q1: FOO
        "#);
    }
}
