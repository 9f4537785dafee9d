//! casegen-strategy: turn operation schemas and explicit overrides into case strategies

pub mod builder;
pub mod datagen;
pub mod generator;
pub mod merge;
pub mod sampler;

pub use builder::{CaseError, CaseStrategyBuilder, case_strategy, case_strategy_from_json};
pub use datagen::JsonSchemaGenerator;
pub use generator::{GenerationError, SchemaGenerator};
pub use merge::location_strategy;
pub use sampler::{CaseSampler, SampleError};
