//! Predicates behind the `format` keyword, plus the pluggable registry for
//! the formats whose exact meaning is host-defined.
use crate::schemas::Draft;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{fmt, net::IpAddr, str::FromStr, sync::Arc};
use url::Url;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\z").expect("Is a valid regex"));
static IRI_REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+:(/?/?))?[^#\\\s]*(#[^\\\s]*)?\z").expect("Is a valid regex"));
static JSON_POINTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/(([^/~])|(~[01]))*)*\z").expect("Is a valid regex"));
static RELATIVE_JSON_POINTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:0|[1-9][0-9]*)(?:#|(?:/(?:[^~/]|~0|~1)*)*)\z").expect("Is a valid regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([01][0-9]|2[0-3]):([0-5][0-9]):([0-5][0-9])(\.[0-9]{6})?(([Zz])|([+|\-]([01][0-9]|2[0-3]):[0-5][0-9]))\z",
    )
    .expect("Is a valid regex")
});
static URI_REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+:(/?/?))?[^#\\\s]*(#[^\\\s]*)?\z").expect("Is a valid regex"));
static URI_TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:(?:[^\x00-\x20"'<>%\\^`{|}]|%[0-9a-f]{2})|\{[+#./;?&=,!@|]?(?:[a-z0-9_]|%[0-9a-f]{2})+(?::[1-9][0-9]{0,3}|\*)?(?:,(?:[a-z0-9_]|%[0-9a-f]{2})+(?::[1-9][0-9]{0,3}|\*)?)*})*\z"#,
    )
    .expect("Is a valid regex")
});

pub(crate) fn is_valid_date(value: &str) -> bool {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        // The underlying parser tolerates missing zero padding; the regex
        // rejects it.
        DATE_RE.is_match(value)
    } else {
        false
    }
}

pub(crate) fn is_valid_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

pub(crate) fn is_valid_time(value: &str) -> bool {
    TIME_RE.is_match(value)
}

pub(crate) fn is_valid_hostname(value: &str) -> bool {
    !(value.ends_with('-')
        || value.starts_with('-')
        || value.is_empty()
        || value.chars().count() > 255
        || value
            .chars()
            .any(|c| !(c.is_alphanumeric() || c == '-' || c == '.'))
        || value.split('.').any(|part| part.chars().count() > 63))
}

pub(crate) fn is_valid_ipv4(value: &str) -> bool {
    if value.starts_with('0') {
        return false;
    }
    match IpAddr::from_str(value) {
        Ok(i) => i.is_ipv4(),
        Err(_) => false,
    }
}

pub(crate) fn is_valid_ipv6(value: &str) -> bool {
    match IpAddr::from_str(value) {
        Ok(i) => i.is_ipv6(),
        Err(_) => false,
    }
}

pub(crate) fn is_valid_iri(value: &str) -> bool {
    Url::from_str(value).is_ok()
}

pub(crate) fn is_valid_iri_reference(value: &str) -> bool {
    IRI_REFERENCE_RE.is_match(value)
}

pub(crate) fn is_valid_json_pointer(value: &str) -> bool {
    JSON_POINTER_RE.is_match(value)
}

pub(crate) fn is_valid_relative_json_pointer(value: &str) -> bool {
    RELATIVE_JSON_POINTER_RE.is_match(value)
}

pub(crate) fn is_valid_regex(value: &str) -> bool {
    Regex::new(value).is_ok()
}

fn default_uri(value: &str) -> bool {
    Url::from_str(value).is_ok()
}

fn default_uri_reference(value: &str) -> bool {
    URI_REFERENCE_RE.is_match(value)
}

fn default_uri_template(value: &str) -> bool {
    URI_TEMPLATE_RE.is_match(value)
}

fn default_email(value: &str) -> bool {
    value.contains('@')
}

/// A host-supplied format predicate.
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Replaceable checks for the formats whose strictness is a matter of taste:
/// `uri`, `uri-reference`, `uri-template` and `email`. An empty slot fails
/// every instance of its format.
#[derive(Clone)]
pub struct FormatRegistry {
    uri: Option<FormatCheck>,
    uri_reference: Option<FormatCheck>,
    uri_template: Option<FormatCheck>,
    email: Option<FormatCheck>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        FormatRegistry {
            uri: Some(Arc::new(default_uri)),
            uri_reference: Some(Arc::new(default_uri_reference)),
            uri_template: Some(Arc::new(default_uri_template)),
            email: Some(Arc::new(default_email)),
        }
    }
}

impl FormatRegistry {
    /// A registry with no predicates at all.
    pub fn empty() -> Self {
        FormatRegistry {
            uri: None,
            uri_reference: None,
            uri_template: None,
            email: None,
        }
    }

    pub fn with_uri(mut self, check: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.uri = Some(Arc::new(check));
        self
    }

    pub fn with_uri_reference(
        mut self,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.uri_reference = Some(Arc::new(check));
        self
    }

    pub fn with_uri_template(
        mut self,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.uri_template = Some(Arc::new(check));
        self
    }

    pub fn with_email(mut self, check: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.email = Some(Arc::new(check));
        self
    }

    fn check_uri(&self, value: &str) -> bool {
        self.uri.as_ref().map_or(false, |check| check(value))
    }

    fn check_uri_reference(&self, value: &str) -> bool {
        self.uri_reference
            .as_ref()
            .map_or(false, |check| check(value))
    }

    fn check_uri_template(&self, value: &str) -> bool {
        self.uri_template
            .as_ref()
            .map_or(false, |check| check(value))
    }

    fn check_email(&self, value: &str) -> bool {
        self.email.as_ref().map_or(false, |check| check(value))
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("uri", &self.uri.is_some())
            .field("uri_reference", &self.uri_reference.is_some())
            .field("uri_template", &self.uri_template.is_some())
            .field("email", &self.email.is_some())
            .finish()
    }
}

/// Check `value` against `format` under the given draft. Formats the draft
/// does not recognize are accepted without inspection; so is `idn-email`,
/// which is deliberately unchecked.
pub(crate) fn is_format_valid(
    registry: &FormatRegistry,
    draft: Draft,
    format: &str,
    value: &str,
) -> bool {
    if !draft.recognizes_format(format) {
        return true;
    }
    match format {
        "date-time" => is_valid_date_time(value),
        "date" => is_valid_date(value),
        "time" => is_valid_time(value),
        "email" => registry.check_email(value),
        "hostname" | "idn-hostname" => is_valid_hostname(value),
        "ipv4" => is_valid_ipv4(value),
        "ipv6" => is_valid_ipv6(value),
        "iri" => is_valid_iri(value),
        "iri-reference" => is_valid_iri_reference(value),
        "json-pointer" => is_valid_json_pointer(value),
        "relative-json-pointer" => is_valid_relative_json_pointer(value),
        "regex" => is_valid_regex(value),
        "uri" => registry.check_uri(value),
        "uri-reference" => registry.check_uri_reference(value),
        "uri-template" => registry.check_uri_template(value),
        _ => true,
    }
}
