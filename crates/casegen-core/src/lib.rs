//! casegen-core: operation schemas, explicit overrides and case types
//!
//! This crate holds the data side of case generation: what an operation
//! accepts per location, what the caller pins, and the `Case` that comes out.

pub mod case;
pub mod config;
pub mod openapi;
pub mod operation;
pub mod overrides;

pub use case::{Case, ParameterMap};
pub use config::{Config, ConfigError};
pub use openapi::{ApiSpec, SpecError};
pub use operation::{BodySchema, Location, OperationSchema, SchemaNode};
pub use overrides::{ExplicitOverrides, LocationOverride, OverrideError};
