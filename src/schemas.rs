use serde_json::Value;
use std::fmt;

/// The JSON Schema draft a schema document is compiled under.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Draft {
    Draft4,
    Draft6,
    Draft7,
}

impl Default for Draft {
    fn default() -> Self {
        Draft::Draft7
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Draft::Draft4 => write!(f, "draft-04"),
            Draft::Draft6 => write!(f, "draft-06"),
            Draft::Draft7 => write!(f, "draft-07"),
        }
    }
}

impl Draft {
    /// Whether `true`/`false` are accepted wherever a schema is expected.
    pub(crate) fn supports_boolean_schemas(self) -> bool {
        self != Draft::Draft4
    }

    /// An integral `number` satisfies `{"type": "integer"}` from draft-06 on.
    pub(crate) fn accepts_integral_numbers_as_integers(self) -> bool {
        self != Draft::Draft4
    }

    pub(crate) fn validates_formats_by_default(self) -> bool {
        // Later drafts turn format checking into pure annotation, but those
        // are out of range for this crate.
        true
    }

    /// Whether `keyword` belongs to the fixed keyword set of this draft.
    ///
    /// Unrecognized keywords are not errors; they are examined for embedded
    /// sub-schemas instead of being compiled directly.
    pub(crate) fn recognizes_keyword(self, keyword: &str) -> bool {
        match keyword {
            "$ref"
            | "$schema"
            | "title"
            | "description"
            | "default"
            | "definitions"
            | "type"
            | "enum"
            | "format"
            | "minimum"
            | "maximum"
            | "exclusiveMinimum"
            | "exclusiveMaximum"
            | "multipleOf"
            | "minLength"
            | "maxLength"
            | "pattern"
            | "items"
            | "additionalItems"
            | "minItems"
            | "maxItems"
            | "uniqueItems"
            | "properties"
            | "patternProperties"
            | "additionalProperties"
            | "required"
            | "minProperties"
            | "maxProperties"
            | "dependencies"
            | "allOf"
            | "anyOf"
            | "oneOf"
            | "not" => true,
            "id" => self == Draft::Draft4,
            "$id" | "const" | "contains" | "propertyNames" | "examples" => {
                matches!(self, Draft::Draft6 | Draft::Draft7)
            }
            "$comment" | "if" | "then" | "else" | "readOnly" | "writeOnly"
            | "contentMediaType" | "contentEncoding" => self == Draft::Draft7,
            _ => false,
        }
    }

    /// Whether `format` is checked under this draft. Unrecognized formats are
    /// accepted without inspection.
    pub(crate) fn recognizes_format(self, format: &str) -> bool {
        match format {
            "date-time" | "uri" | "email" | "ipv4" | "ipv6" | "hostname" => true,
            "uri-reference" | "uri-template" | "json-pointer" => {
                matches!(self, Draft::Draft6 | Draft::Draft7)
            }
            "time" | "date" | "iri" | "iri-reference" | "idn-hostname"
            | "relative-json-pointer" | "regex" => self == Draft::Draft7,
            _ => false,
        }
    }
}

/// Get the `Draft` from a JSON Schema URL.
pub fn draft_from_url(url: &str) -> Option<Draft> {
    match url {
        "http://json-schema.org/draft-07/schema#" => Some(Draft::Draft7),
        "http://json-schema.org/draft-06/schema#" => Some(Draft::Draft6),
        "http://json-schema.org/draft-04/schema#" => Some(Draft::Draft4),
        _ => None,
    }
}

/// Get the `Draft` from a JSON Schema document's own `$schema` keyword.
pub fn draft_from_schema(schema: &Value) -> Option<Draft> {
    schema
        .as_object()
        .and_then(|x| x.get("$schema"))
        .and_then(Value::as_str)
        .and_then(draft_from_url)
}

/// The identifier keyword value of a schema object: `id` under draft-04,
/// `$id` later.
pub fn id_of(draft: Draft, schema: &Value) -> Option<&str> {
    if let Value::Object(object) = schema {
        if draft == Draft::Draft4 {
            object.get("id")
        } else {
            object.get("$id")
        }
        .and_then(Value::as_str)
    } else {
        None
    }
}
