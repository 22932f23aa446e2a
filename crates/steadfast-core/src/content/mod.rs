//! Content library loading and validation.
//!
//! Content overrides are structured data validated against JSON Schema.
//! This module handles parsing YAML/JSON libraries and validating them.

mod library;
mod schema;

pub use library::{ContentError, ContentLibrary, PromptTemplate};
pub use schema::validate_content_schema;
