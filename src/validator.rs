//! The validation interpreter: executes a compiled schema against an
//! instance value.
//!
//! Fast-fail mode unwinds through `Result<(), FastFail>` the moment the
//! verdict is settled; collect mode keeps walking and accumulates every
//! violation. Sub-validations for combinators run in a scratch interpreter
//! whose errors are merged (or discarded) by the caller.
use crate::{
    error::{FastFail, ValidationError},
    formats,
    helpers,
    paths::{InstancePath, JSONPointer},
    primitive_type::PrimitiveType,
    schema::{BoolOrSchema, Dependency, Exclusive, SchemaId, SchemaNode, SchemaTree},
    schemas::Draft,
};
use serde_json::{Map, Value};

/// Per-call validation settings.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    pub(crate) report_multiple_errors: bool,
    pub(crate) parse_json: bool,
    pub(crate) validate_formats: Option<bool>,
}

impl ValidationOptions {
    pub fn new() -> Self {
        ValidationOptions::default()
    }

    /// Keep validating after the first violation and report all of them.
    pub fn with_multiple_errors(mut self, report_multiple_errors: bool) -> Self {
        self.report_multiple_errors = report_multiple_errors;
        self
    }

    /// Treat a string instance as JSON text and decode it before
    /// validation.
    pub fn with_parse_json(mut self, parse_json: bool) -> Self {
        self.parse_json = parse_json;
        self
    }

    /// Force `format` checking on or off; the draft default applies
    /// otherwise.
    pub fn with_validate_formats(mut self, validate_formats: bool) -> Self {
        self.validate_formats = Some(validate_formats);
        self
    }
}

/// Run a validation and return the collected errors; empty means valid.
pub(crate) fn run(
    tree: &SchemaTree,
    root: SchemaId,
    instance: &Value,
    options: &ValidationOptions,
) -> Vec<ValidationError> {
    let decoded;
    let instance = if options.parse_json {
        if let Value::String(text) = instance {
            match serde_json::from_str(text) {
                Ok(value) => {
                    decoded = value;
                    &decoded
                }
                Err(error) => return vec![ValidationError::invalid_json_input(&error)],
            }
        } else {
            instance
        }
    } else {
        instance
    };
    let mut validator = Validator {
        tree,
        errors: Vec::new(),
        report_multiple_errors: options.report_multiple_errors,
        validate_formats: options
            .validate_formats
            .unwrap_or_else(|| tree.draft.validates_formats_by_default()),
    };
    let path = InstancePath::new();
    let _ = validator.validate_node(root, instance, &path);
    validator.errors
}

struct Validator<'a> {
    tree: &'a SchemaTree,
    errors: Vec<ValidationError>,
    report_multiple_errors: bool,
    validate_formats: bool,
}

fn pointer(path: &InstancePath) -> String {
    JSONPointer::from(path).to_string()
}

fn keyword_path(node: &SchemaNode, keyword: &str) -> String {
    format!("{}/{}", node.path, keyword)
}

impl<'a> Validator<'a> {
    fn report(&mut self, error: ValidationError) -> Result<(), FastFail> {
        self.errors.push(error);
        if self.report_multiple_errors {
            Ok(())
        } else {
            Err(FastFail)
        }
    }

    /// Verdict of a sub-schema without touching the error list.
    fn sub_is_valid(&self, id: SchemaId, instance: &Value, path: &InstancePath) -> bool {
        let mut scratch = Validator {
            tree: self.tree,
            errors: Vec::new(),
            report_multiple_errors: false,
            validate_formats: self.validate_formats,
        };
        scratch.validate_node(id, instance, path).is_ok()
    }

    /// All errors of a sub-schema, for merging into an envelope.
    fn sub_errors(&self, id: SchemaId, instance: &Value, path: &InstancePath) -> Vec<ValidationError> {
        let mut scratch = Validator {
            tree: self.tree,
            errors: Vec::new(),
            report_multiple_errors: true,
            validate_formats: self.validate_formats,
        };
        let _ = scratch.validate_node(id, instance, path);
        scratch.errors
    }

    fn validate_node(
        &mut self,
        id: SchemaId,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), FastFail> {
        // References replace the node they appear in; compilation has
        // already settled the chains and ruled out cycles.
        let mut id = id;
        while let Some(target) = {
            let node = self.tree.node(id);
            if node.reference.is_some() {
                node.ref_target
            } else {
                None
            }
        } {
            id = target;
        }
        let node = self.tree.node(id);

        if let Some(allowed) = node.boolean {
            if !allowed {
                return self.report(ValidationError::false_schema(
                    node.path.clone(),
                    pointer(path),
                    instance,
                ));
            }
            return Ok(());
        }

        if let Some(if_schema) = node.if_schema {
            let applied = if self.sub_is_valid(if_schema, instance, path) {
                node.then_schema.map(|branch| (branch, true))
            } else {
                node.else_schema.map(|branch| (branch, false))
            };
            if let Some((branch, is_then)) = applied {
                if self.report_multiple_errors {
                    let inner = self.sub_errors(branch, instance, path);
                    if !inner.is_empty() {
                        let envelope = if is_then {
                            ValidationError::then_branch(
                                keyword_path(node, "then"),
                                pointer(path),
                                instance,
                            )
                        } else {
                            ValidationError::else_branch(
                                keyword_path(node, "else"),
                                pointer(path),
                                instance,
                            )
                        };
                        self.report(envelope)?;
                        self.errors.extend(inner);
                    }
                } else if !self.sub_is_valid(branch, instance, path) {
                    let envelope = if is_then {
                        ValidationError::then_branch(
                            keyword_path(node, "then"),
                            pointer(path),
                            instance,
                        )
                    } else {
                        ValidationError::else_branch(
                            keyword_path(node, "else"),
                            pointer(path),
                            instance,
                        )
                    };
                    self.report(envelope)?;
                }
            }
        }

        if let Some(types) = &node.types {
            let matched = types
                .iter()
                .any(|type_| type_matches(*type_, instance, node.draft));
            if !matched {
                let error = if let [single] = types.as_slice() {
                    ValidationError::single_type_error(
                        keyword_path(node, "type"),
                        pointer(path),
                        instance,
                        *single,
                    )
                } else {
                    ValidationError::multiple_type_error(
                        keyword_path(node, "type"),
                        pointer(path),
                        instance,
                        types,
                    )
                };
                self.report(error)?;
            }
        }

        if let Some(expected) = &node.const_value {
            if !helpers::equal(instance, expected) {
                self.report(ValidationError::constant(
                    keyword_path(node, "const"),
                    pointer(path),
                    expected,
                ))?;
            }
        }

        if let Some(options) = &node.enum_values {
            if !options.iter().any(|option| helpers::equal(instance, option)) {
                self.report(ValidationError::enumeration(
                    keyword_path(node, "enum"),
                    pointer(path),
                    instance,
                    options,
                ))?;
            }
        }

        match instance {
            Value::Array(items) => self.validate_array(node, instance, items, path)?,
            Value::String(string) => self.validate_string(node, instance, string, path)?,
            Value::Number(_) => self.validate_number(node, instance, path)?,
            _ => {}
        }

        self.validate_combinators(node, instance, path)?;

        if self.validate_formats {
            if let (Some(format), Value::String(string)) = (&node.format, instance) {
                if !formats::is_format_valid(&self.tree.formats, node.draft, format, string) {
                    self.report(ValidationError::format(
                        keyword_path(node, "format"),
                        pointer(path),
                        instance,
                        format,
                    ))?;
                }
            }
        }

        if let Value::Object(object) = instance {
            self.validate_object(node, instance, object, path)?;
        }

        Ok(())
    }

    fn validate_array(
        &mut self,
        node: &SchemaNode,
        instance: &Value,
        items: &[Value],
        path: &InstancePath,
    ) -> Result<(), FastFail> {
        if let Some(single) = node.items {
            for (index, item) in items.iter().enumerate() {
                let item_path = path.push(index);
                self.validate_node(single, item, &item_path)?;
            }
        } else if let Some(tuple) = &node.items_tuple {
            for (index, item) in items.iter().enumerate().take(tuple.len()) {
                let item_path = path.push(index);
                self.validate_node(tuple[index], item, &item_path)?;
            }
            if items.len() > tuple.len() {
                match &node.additional_items {
                    Some(BoolOrSchema::Schema(schema)) => {
                        for (index, item) in items.iter().enumerate().skip(tuple.len()) {
                            let item_path = path.push(index);
                            self.validate_node(*schema, item, &item_path)?;
                        }
                    }
                    Some(BoolOrSchema::Bool(false)) => {
                        self.report(ValidationError::additional_items(
                            keyword_path(node, "additionalItems"),
                            pointer(path),
                            items,
                            tuple.len(),
                        ))?;
                    }
                    _ => {}
                }
            }
        }

        if let Some(limit) = node.max_items {
            if items.len() as u64 > limit {
                self.report(ValidationError::max_items(
                    keyword_path(node, "maxItems"),
                    pointer(path),
                    instance,
                    limit,
                ))?;
            }
        }
        if let Some(limit) = node.min_items {
            if (items.len() as u64) < limit {
                self.report(ValidationError::min_items(
                    keyword_path(node, "minItems"),
                    pointer(path),
                    instance,
                    limit,
                ))?;
            }
        }

        if node.unique_items {
            'pairs: for left in 0..items.len() {
                for right in (left + 1)..items.len() {
                    if helpers::equal(&items[left], &items[right]) {
                        self.report(ValidationError::unique_items(
                            keyword_path(node, "uniqueItems"),
                            pointer(path),
                            instance,
                        ))?;
                        break 'pairs;
                    }
                }
            }
        }

        if let Some(contains) = node.contains {
            let satisfied = items.iter().enumerate().any(|(index, item)| {
                let item_path = path.push(index);
                self.sub_is_valid(contains, item, &item_path)
            });
            if !satisfied {
                self.report(ValidationError::contains(
                    keyword_path(node, "contains"),
                    pointer(path),
                    instance,
                ))?;
            }
        }
        Ok(())
    }

    fn validate_string(
        &mut self,
        node: &SchemaNode,
        instance: &Value,
        string: &str,
        path: &InstancePath,
    ) -> Result<(), FastFail> {
        if node.min_length.is_some() || node.max_length.is_some() {
            // Length is counted in Unicode scalar values, not in bytes or
            // UTF-16 units
            let length = string.chars().count() as u64;
            if let Some(limit) = node.max_length {
                if length > limit {
                    self.report(ValidationError::max_length(
                        keyword_path(node, "maxLength"),
                        pointer(path),
                        instance,
                        limit,
                    ))?;
                }
            }
            if let Some(limit) = node.min_length {
                if length < limit {
                    self.report(ValidationError::min_length(
                        keyword_path(node, "minLength"),
                        pointer(path),
                        instance,
                        limit,
                    ))?;
                }
            }
        }
        if let Some((pattern, regex)) = &node.pattern {
            if !regex.is_match(string) {
                self.report(ValidationError::pattern(
                    keyword_path(node, "pattern"),
                    pointer(path),
                    instance,
                    pattern,
                ))?;
            }
        }
        Ok(())
    }

    fn validate_number(
        &mut self,
        node: &SchemaNode,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), FastFail> {
        let value = instance.as_f64().expect("A JSON number is always an f64");

        // The draft-06 numeric form wins over `maximum` when both appear
        if let Some(Exclusive::Limit(limit)) = node.exclusive_maximum {
            if value >= limit {
                self.report(ValidationError::exclusive_maximum(
                    keyword_path(node, "exclusiveMaximum"),
                    pointer(path),
                    instance,
                    limit,
                ))?;
            }
        } else if let Some(limit) = node.maximum {
            let strict = matches!(node.exclusive_maximum, Some(Exclusive::Flag(true)));
            if (strict && value >= limit) || (!strict && value > limit) {
                let error = if strict {
                    ValidationError::exclusive_maximum(
                        keyword_path(node, "maximum"),
                        pointer(path),
                        instance,
                        limit,
                    )
                } else {
                    ValidationError::maximum(
                        keyword_path(node, "maximum"),
                        pointer(path),
                        instance,
                        limit,
                    )
                };
                self.report(error)?;
            }
        }

        if let Some(Exclusive::Limit(limit)) = node.exclusive_minimum {
            if value <= limit {
                self.report(ValidationError::exclusive_minimum(
                    keyword_path(node, "exclusiveMinimum"),
                    pointer(path),
                    instance,
                    limit,
                ))?;
            }
        } else if let Some(limit) = node.minimum {
            let strict = matches!(node.exclusive_minimum, Some(Exclusive::Flag(true)));
            if (strict && value <= limit) || (!strict && value < limit) {
                let error = if strict {
                    ValidationError::exclusive_minimum(
                        keyword_path(node, "minimum"),
                        pointer(path),
                        instance,
                        limit,
                    )
                } else {
                    ValidationError::minimum(
                        keyword_path(node, "minimum"),
                        pointer(path),
                        instance,
                        limit,
                    )
                };
                self.report(error)?;
            }
        }

        if let Some(multiple_of) = node.multiple_of {
            let is_multiple = if value.fract() == 0.0 && multiple_of.fract() == 0.0 {
                (value % multiple_of) == 0.0
            } else {
                (value / multiple_of).fract() == 0.0
            };
            if !is_multiple {
                self.report(ValidationError::multiple_of(
                    keyword_path(node, "multipleOf"),
                    pointer(path),
                    instance,
                    multiple_of,
                ))?;
            }
        }
        Ok(())
    }

    fn validate_combinators(
        &mut self,
        node: &SchemaNode,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), FastFail> {
        if let Some(all_of) = &node.all_of {
            if self.report_multiple_errors {
                let mut inner = Vec::new();
                for schema in all_of {
                    inner.extend(self.sub_errors(*schema, instance, path));
                }
                if !inner.is_empty() {
                    self.report(ValidationError::all_of(
                        keyword_path(node, "allOf"),
                        pointer(path),
                        instance,
                    ))?;
                    self.errors.extend(inner);
                }
            } else if !all_of
                .iter()
                .all(|schema| self.sub_is_valid(*schema, instance, path))
            {
                self.report(ValidationError::all_of(
                    keyword_path(node, "allOf"),
                    pointer(path),
                    instance,
                ))?;
            }
        }

        if let Some(any_of) = &node.any_of {
            if self.report_multiple_errors {
                let mut inner = Vec::new();
                let mut any_valid = false;
                for schema in any_of {
                    let errors = self.sub_errors(*schema, instance, path);
                    if errors.is_empty() {
                        any_valid = true;
                        break;
                    }
                    inner.extend(errors);
                }
                if !any_valid {
                    self.report(ValidationError::any_of(
                        keyword_path(node, "anyOf"),
                        pointer(path),
                        instance,
                    ))?;
                    self.errors.extend(inner);
                }
            } else if !any_of
                .iter()
                .any(|schema| self.sub_is_valid(*schema, instance, path))
            {
                self.report(ValidationError::any_of(
                    keyword_path(node, "anyOf"),
                    pointer(path),
                    instance,
                ))?;
            }
        }

        if let Some(one_of) = &node.one_of {
            if self.report_multiple_errors {
                let mut inner = Vec::new();
                let mut valid = 0usize;
                for schema in one_of {
                    let errors = self.sub_errors(*schema, instance, path);
                    if errors.is_empty() {
                        valid += 1;
                    } else {
                        inner.extend(errors);
                    }
                }
                if valid == 0 {
                    self.report(ValidationError::one_of_not_valid(
                        keyword_path(node, "oneOf"),
                        pointer(path),
                        instance,
                    ))?;
                    self.errors.extend(inner);
                } else if valid > 1 {
                    self.report(ValidationError::one_of_multiple_valid(
                        keyword_path(node, "oneOf"),
                        pointer(path),
                        instance,
                    ))?;
                }
            } else {
                let mut valid = 0usize;
                for schema in one_of {
                    if self.sub_is_valid(*schema, instance, path) {
                        valid += 1;
                        if valid > 1 {
                            break;
                        }
                    }
                }
                if valid != 1 {
                    let error = if valid == 0 {
                        ValidationError::one_of_not_valid(
                            keyword_path(node, "oneOf"),
                            pointer(path),
                            instance,
                        )
                    } else {
                        ValidationError::one_of_multiple_valid(
                            keyword_path(node, "oneOf"),
                            pointer(path),
                            instance,
                        )
                    };
                    self.report(error)?;
                }
            }
        }

        if let Some(not) = node.not {
            if self.sub_is_valid(not, instance, path) {
                self.report(ValidationError::not_allowed(
                    keyword_path(node, "not"),
                    pointer(path),
                    instance,
                ))?;
            }
        }
        Ok(())
    }

    fn validate_object(
        &mut self,
        node: &SchemaNode,
        instance: &Value,
        object: &Map<String, Value>,
        path: &InstancePath,
    ) -> Result<(), FastFail> {
        if let Some(limit) = node.max_properties {
            if object.len() as u64 > limit {
                self.report(ValidationError::max_properties(
                    keyword_path(node, "maxProperties"),
                    pointer(path),
                    instance,
                    limit,
                ))?;
            }
        }
        if let Some(limit) = node.min_properties {
            if (object.len() as u64) < limit {
                self.report(ValidationError::min_properties(
                    keyword_path(node, "minProperties"),
                    pointer(path),
                    instance,
                    limit,
                ))?;
            }
        }

        if let Some(required) = &node.required {
            for property in required {
                if !object.contains_key(property) {
                    self.report(ValidationError::required(
                        keyword_path(node, "required"),
                        pointer(path),
                        property,
                    ))?;
                }
            }
        }

        for (name, value) in object {
            if let Some(property_names) = node.property_names {
                let name_instance = Value::String(name.clone());
                if self.report_multiple_errors {
                    let inner = self.sub_errors(property_names, &name_instance, path);
                    if !inner.is_empty() {
                        self.report(ValidationError::property_name(
                            keyword_path(node, "propertyNames"),
                            pointer(path),
                            name,
                        ))?;
                        self.errors.extend(inner);
                    }
                } else if !self.sub_is_valid(property_names, &name_instance, path) {
                    self.report(ValidationError::property_name(
                        keyword_path(node, "propertyNames"),
                        pointer(path),
                        name,
                    ))?;
                }
            }

            let property_path = path.push(name.as_str());
            let mut covered = false;
            if let Some(properties) = &node.properties {
                if let Some(schema) = properties.get(name) {
                    self.validate_node(*schema, value, &property_path)?;
                    covered = true;
                }
            }
            if let Some(patterns) = &node.pattern_properties {
                for (_, regex, schema) in patterns {
                    if regex.is_match(name) {
                        self.validate_node(*schema, value, &property_path)?;
                        covered = true;
                    }
                }
            }
            if !covered {
                match &node.additional_properties {
                    Some(BoolOrSchema::Schema(schema)) => {
                        self.validate_node(*schema, value, &property_path)?;
                    }
                    Some(BoolOrSchema::Bool(false)) => {
                        self.report(ValidationError::additional_property(
                            keyword_path(node, "additionalProperties"),
                            pointer(&property_path),
                            name,
                        ))?;
                    }
                    _ => {}
                }
            }
        }

        if let Some(dependencies) = &node.dependencies {
            for (name, dependency) in dependencies {
                if !object.contains_key(name) {
                    continue;
                }
                match dependency {
                    Dependency::Keys(keys) => {
                        for key in keys {
                            if !object.contains_key(key) {
                                self.report(ValidationError::dependency_missing(
                                    keyword_path(node, "dependencies"),
                                    pointer(path),
                                    key,
                                    name,
                                ))?;
                            }
                        }
                    }
                    Dependency::Schema(schema) => {
                        if self.report_multiple_errors {
                            let inner = self.sub_errors(*schema, instance, path);
                            if !inner.is_empty() {
                                self.report(ValidationError::dependency_schema(
                                    keyword_path(node, "dependencies"),
                                    pointer(path),
                                    instance,
                                    name,
                                ))?;
                                self.errors.extend(inner);
                            }
                        } else if !self.sub_is_valid(*schema, instance, path) {
                            self.report(ValidationError::dependency_schema(
                                keyword_path(node, "dependencies"),
                                pointer(path),
                                instance,
                                name,
                            ))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn type_matches(type_: PrimitiveType, instance: &Value, draft: Draft) -> bool {
    match (type_, instance) {
        (PrimitiveType::Integer, Value::Number(number)) => {
            number.is_u64()
                || number.is_i64()
                || (draft.accepts_integral_numbers_as_integers()
                    && number.as_f64().map_or(false, |value| value.fract() == 0.0))
        }
        (PrimitiveType::Number, Value::Number(_)) => true,
        (PrimitiveType::Null, Value::Null)
        | (PrimitiveType::Boolean, Value::Bool(_))
        | (PrimitiveType::String, Value::String(_))
        | (PrimitiveType::Array, Value::Array(_))
        | (PrimitiveType::Object, Value::Object(_)) => true,
        (_, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::type_matches;
    use crate::{primitive_type::PrimitiveType, schemas::Draft};
    use serde_json::json;
    use test_case::test_case;

    #[test_case(Draft::Draft4, json!(3), true)]
    #[test_case(Draft::Draft4, json!(3.0), false; "strict under draft 4")]
    #[test_case(Draft::Draft6, json!(3.0), true; "integral float under draft 6")]
    #[test_case(Draft::Draft7, json!(3.5), false)]
    fn integer_semantics(draft: Draft, instance: serde_json::Value, expected: bool) {
        assert_eq!(
            type_matches(PrimitiveType::Integer, &instance, draft),
            expected
        );
    }
}
