//! # json-schema
//!
//! A crate for validating JSON data against JSON Schema documents, covering
//! drafts 4, 6 and 7. A schema document is compiled once into an immutable
//! tree; validation against the compiled tree is a pure function, so a
//! single schema can serve many concurrent validations.
//!
//! References (`$ref`) are resolved during compilation. Synchronous
//! compilation obtains every external document through a caller-supplied
//! provider; asynchronous compilation fetches them concurrently, by default
//! over HTTP(S).
//!
//! ## Example:
//!
//! ```rust
//! use json_schema::{create_schema, CompilationError};
//! use serde_json::json;
//!
//! fn main() -> Result<(), CompilationError> {
//!     let schema = create_schema(&json!({"maxLength": 5}), None)?;
//!     assert!(schema.is_valid(&json!("foo")));
//!     for error in schema.validate_with_errors(&json!("foo bar baz")) {
//!         println!("Validation error: {}", error)
//!     }
//!     Ok(())
//! }
//! ```
#![warn(
    clippy::doc_markdown,
    clippy::redundant_closure,
    clippy::explicit_iter_loop,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::print_stdout,
    clippy::trivially_copy_pass_by_ref,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]
mod compilation;
mod error;
mod formats;
mod helpers;
mod paths;
mod primitive_type;
mod resolver;
mod retriever;
mod schema;
mod schemas;
mod validator;

pub use compilation::options::CompilationOptions;
pub use error::{CompilationError, ValidationError};
pub use formats::{FormatCheck, FormatRegistry};
pub use paths::JSONPointer;
pub use primitive_type::PrimitiveType;
pub use retriever::{AsyncSchemaProvider, DefaultRetriever, ProvidedSchema, SchemaProvider};
pub use schema::Schema;
pub use schemas::{draft_from_schema, draft_from_url, Draft};
pub use validator::ValidationOptions;

use serde_json::Value;

/// Compile `schema` synchronously. All external documents must already be
/// reachable; use [`CompilationOptions`] to supply a reference provider.
pub fn create_schema(schema: &Value, draft: Option<Draft>) -> Result<Schema, CompilationError> {
    let mut options = CompilationOptions::default();
    if let Some(draft) = draft {
        options.with_draft(draft);
    }
    options.compile(schema)
}

/// Compile `schema`, fetching external documents concurrently. Without a
/// custom provider, `http(s)` references go through [`DefaultRetriever`].
pub async fn create_schema_async(
    schema: &Value,
    draft: Option<Draft>,
) -> Result<Schema, CompilationError> {
    let mut options = CompilationOptions::default();
    if let Some(draft) = draft {
        options.with_draft(draft);
    }
    options.compile_async(schema).await
}

/// Fetch a schema document from `url` and compile it, using `url` as the
/// document's base URI.
pub async fn create_schema_from_url(
    url: &str,
    draft: Option<Draft>,
) -> Result<Schema, CompilationError> {
    let mut options = CompilationOptions::default();
    if let Some(draft) = draft {
        options.with_draft(draft);
    }
    options.compile_url(url).await
}

/// A shortcut for validating `instance` against `schema`. Draft version is
/// detected automatically.
///
/// ```rust
/// use json_schema::is_valid;
/// use serde_json::json;
///
/// let schema = json!({"maxLength": 5});
/// let instance = json!("foo");
/// assert!(is_valid(&schema, &instance));
/// ```
///
/// This function panics if an invalid schema is passed.
#[must_use]
#[inline]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    let compiled = create_schema(schema, None).expect("Invalid schema");
    compiled.is_valid(instance)
}
