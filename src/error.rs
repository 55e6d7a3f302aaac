//! Error types
use crate::{primitive_type::PrimitiveType, schemas::Draft};
use serde_json::Value;
use std::{error, fmt};

/// The error type for everything that can go wrong before a schema is usable.
///
/// No partial schema is ever returned: any of these unwinds the whole
/// compilation call.
#[derive(Debug)]
pub enum CompilationError {
    /// The schema document (or a remote document) is not valid JSON.
    InvalidJson(serde_json::Error),
    /// A recognized keyword carries a value of the wrong shape.
    InvalidKeywordShape { keyword: String, value: Value },
    /// A construct is not allowed under the draft in effect,
    /// e.g. a boolean schema under draft-04.
    InvalidDraftConstruct { construct: String, draft: Draft },
    /// Draft-04 requires some keywords to appear together,
    /// e.g. `exclusiveMaximum` without `maximum`.
    InterdependencyMissing {
        needs: &'static str,
        missing: &'static str,
    },
    /// An `$id` or `$ref` value does not form a valid URI.
    InvalidUrl { error: url::ParseError },
    /// A `$ref` points nowhere: the target document could not be retrieved,
    /// or the fragment does not address a schema within it.
    UnresolvableRef { uri: String },
    /// A `$ref` chain came back to an already-visited reference.
    RefCycle { path: String },
}

impl error::Error for CompilationError {}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilationError::InvalidJson(error) => write!(f, "Invalid JSON: {}", error),
            CompilationError::InvalidKeywordShape { keyword, value } => {
                write!(f, "Invalid value for '{}': {}", keyword, value)
            }
            CompilationError::InvalidDraftConstruct { construct, draft } => {
                write!(f, "{} is not allowed under {}", construct, draft)
            }
            CompilationError::InterdependencyMissing { needs, missing } => {
                write!(f, "'{}' requires '{}' to be present", needs, missing)
            }
            CompilationError::InvalidUrl { error } => write!(f, "Invalid URL: {}", error),
            CompilationError::UnresolvableRef { uri } => {
                write!(f, "Unresolvable reference: {}", uri)
            }
            CompilationError::RefCycle { path } => {
                write!(f, "Reference cycle detected at: {}", path)
            }
        }
    }
}

impl From<serde_json::Error> for CompilationError {
    fn from(error: serde_json::Error) -> Self {
        CompilationError::InvalidJson(error)
    }
}
impl From<url::ParseError> for CompilationError {
    fn from(error: url::ParseError) -> Self {
        CompilationError::InvalidUrl { error }
    }
}

/// The non-local exit used when a single error is enough to settle the
/// verdict. Distinct from every compile-time error, so callers can always
/// tell "bad schema" from "valid schema, bad instance".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FastFail;

/// An error that occurred during validation of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON Pointer into the validated data; empty for the root.
    pub instance_path: String,
    /// JSON Pointer into the schema, without a leading `#`.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "# (root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Shortcuts for creation of specific error kinds.
impl ValidationError {
    pub(crate) fn new(schema_path: String, instance_path: String, message: String) -> Self {
        ValidationError {
            instance_path,
            schema_path,
            message,
        }
    }

    pub(crate) fn false_schema(
        schema_path: String,
        instance_path: String,
        instance: &Value,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("False schema does not allow '{}'", instance),
        )
    }

    pub(crate) fn single_type_error(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        expected: PrimitiveType,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not of type '{}'", instance, expected),
        )
    }

    pub(crate) fn multiple_type_error(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        types: &[PrimitiveType],
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "'{}' is not of types {}",
                instance,
                types
                    .iter()
                    .map(|type_| format!("'{}'", type_))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        )
    }

    pub(crate) fn constant(
        schema_path: String,
        instance_path: String,
        expected_value: &Value,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' was expected", expected_value),
        )
    }

    pub(crate) fn enumeration(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        options: &[Value],
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "'{}' is not one of '{}'",
                instance,
                Value::Array(options.to_vec())
            ),
        )
    }

    pub(crate) fn maximum(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: f64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("{} is greater than the maximum of {}", instance, limit),
        )
    }

    pub(crate) fn minimum(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: f64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("{} is less than the minimum of {}", instance, limit),
        )
    }

    pub(crate) fn exclusive_maximum(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: f64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "{} is greater than or equal to the maximum of {}",
                instance, limit
            ),
        )
    }

    pub(crate) fn exclusive_minimum(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: f64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "{} is less than or equal to the minimum of {}",
                instance, limit
            ),
        )
    }

    pub(crate) fn multiple_of(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        multiple_of: f64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("{} is not a multiple of {}", instance, multiple_of),
        )
    }

    pub(crate) fn max_length(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: u64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "'{}' is longer than {} character{}",
                instance,
                limit,
                if limit == 1 { "" } else { "s" }
            ),
        )
    }

    pub(crate) fn min_length(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: u64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "'{}' is shorter than {} character{}",
                instance,
                limit,
                if limit == 1 { "" } else { "s" }
            ),
        )
    }

    pub(crate) fn pattern(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        pattern: &str,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' does not match '{}'", instance, pattern),
        )
    }

    pub(crate) fn max_items(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: u64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "{} has more than {} item{}",
                instance,
                limit,
                if limit == 1 { "" } else { "s" }
            ),
        )
    }

    pub(crate) fn min_items(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: u64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "{} has less than {} item{}",
                instance,
                limit,
                if limit == 1 { "" } else { "s" }
            ),
        )
    }

    pub(crate) fn unique_items(
        schema_path: String,
        instance_path: String,
        instance: &Value,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' has non-unique elements", instance),
        )
    }

    pub(crate) fn additional_items(
        schema_path: String,
        instance_path: String,
        instance: &[Value],
        limit: usize,
    ) -> Self {
        let extras: Vec<String> = instance
            .iter()
            .skip(limit)
            .map(|x| x.to_string())
            .collect();
        let verb = if extras.len() == 1 { "was" } else { "were" };
        Self::new(
            schema_path,
            instance_path,
            format!(
                "Additional items are not allowed ({} {} unexpected)",
                extras.join(", "),
                verb
            ),
        )
    }

    pub(crate) fn contains(schema_path: String, instance_path: String, instance: &Value) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("None of '{}' are valid under the given schema", instance),
        )
    }

    pub(crate) fn max_properties(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: u64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "{} has more than {} propert{}",
                instance,
                limit,
                if limit == 1 { "y" } else { "ies" }
            ),
        )
    }

    pub(crate) fn min_properties(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        limit: u64,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "{} has less than {} propert{}",
                instance,
                limit,
                if limit == 1 { "y" } else { "ies" }
            ),
        )
    }

    pub(crate) fn required(schema_path: String, instance_path: String, property: &str) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is a required property", property),
        )
    }

    pub(crate) fn additional_property(
        schema_path: String,
        instance_path: String,
        property: &str,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "Additional properties are not allowed ('{}' was unexpected)",
                property
            ),
        )
    }

    pub(crate) fn property_name(schema_path: String, instance_path: String, name: &str) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not a valid property name", name),
        )
    }

    pub(crate) fn dependency_missing(
        schema_path: String,
        instance_path: String,
        dependency: &str,
        property: &str,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is a dependency of '{}'", dependency, property),
        )
    }

    pub(crate) fn dependency_schema(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        property: &str,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "'{}' does not satisfy the dependency schema of '{}'",
                instance, property
            ),
        )
    }

    pub(crate) fn all_of(schema_path: String, instance_path: String, instance: &Value) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not valid under all of the given schemas", instance),
        )
    }

    pub(crate) fn any_of(schema_path: String, instance_path: String, instance: &Value) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not valid under any of the given schemas", instance),
        )
    }

    pub(crate) fn one_of_not_valid(
        schema_path: String,
        instance_path: String,
        instance: &Value,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not valid under any of the given schemas", instance),
        )
    }

    pub(crate) fn one_of_multiple_valid(
        schema_path: String,
        instance_path: String,
        instance: &Value,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "'{}' is valid under more than one of the given schemas",
                instance
            ),
        )
    }

    pub(crate) fn not_allowed(schema_path: String, instance_path: String, instance: &Value) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!(
                "'{}' should not be valid under the given schema",
                instance
            ),
        )
    }

    pub(crate) fn then_branch(schema_path: String, instance_path: String, instance: &Value) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not valid under the 'then' schema", instance),
        )
    }

    pub(crate) fn else_branch(schema_path: String, instance_path: String, instance: &Value) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not valid under the 'else' schema", instance),
        )
    }

    pub(crate) fn format(
        schema_path: String,
        instance_path: String,
        instance: &Value,
        format: &str,
    ) -> Self {
        Self::new(
            schema_path,
            instance_path,
            format!("'{}' is not a '{}'", instance, format),
        )
    }

    pub(crate) fn invalid_json_input(error: &serde_json::Error) -> Self {
        Self::new(
            String::new(),
            String::new(),
            format!("Invalid JSON input: {}", error),
        )
    }
}
