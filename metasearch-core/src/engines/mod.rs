//! Engine adapter families.
//!
//! Each module provides a struct implementing [`crate::engine::EngineAdapter`]:
//! CSS-selector scraping of HTML pages, JSONPath extraction from JSON
//! APIs, and delegation to an external backend-definition registry.

mod custom;
pub mod delegated;
pub mod json;
pub mod selector;

pub use custom::RequestTemplate;
pub use delegated::{
    BackendDefinition, BackendParams, BackendRegistry, DelegatedAdapter, NativeResult,
    StaticBackends,
};
pub use json::{FieldPath, JsonAdapter, JsonAdapterConfig};
pub use selector::{SelectorAdapter, SelectorAdapterConfig};
