//! The compiled, immutable representation of a schema document.
//!
//! Compilation produces an arena of nodes ([`SchemaTree`]) shared behind an
//! `Arc`; the public [`Schema`] handle is an index into that arena. Cloning a
//! handle is cheap and validation never mutates the tree, so one compiled
//! schema can serve any number of concurrent validations.
use crate::{
    error::{CompilationError, ValidationError},
    formats::FormatRegistry,
    primitive_type::PrimitiveType,
    resolver,
    schemas::Draft,
    validator::{self, ValidationOptions},
};
use ahash::AHashMap;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Index of a node inside its [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SchemaId(pub(crate) usize);

/// Keywords like `additionalItems` accept either a boolean or a schema.
#[derive(Debug)]
pub(crate) enum BoolOrSchema {
    Bool(bool),
    Schema(SchemaId),
}

/// A `dependencies` entry is either a list of required property names or a
/// schema the whole instance must additionally satisfy.
#[derive(Debug)]
pub(crate) enum Dependency {
    Keys(Vec<String>),
    Schema(SchemaId),
}

/// `exclusiveMinimum`/`exclusiveMaximum` changed shape between drafts:
/// a boolean modifier of `minimum`/`maximum` in draft-04, a standalone
/// numeric bound from draft-06 on.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Exclusive {
    Flag(bool),
    Limit(f64),
}

#[derive(Debug)]
pub(crate) struct SchemaNode {
    // Identity. `base_uri` is the effective base for resolving relative
    // references inside this node's subtree.
    pub(crate) draft: Draft,
    pub(crate) base_uri: Url,
    pub(crate) path: String,
    pub(crate) id: Option<Url>,
    pub(crate) reference: Option<String>,
    pub(crate) ref_target: Option<SchemaId>,
    pub(crate) boolean: Option<bool>,

    // Annotations are parsed and kept but never applied.
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) default: Option<Value>,
    pub(crate) examples: Option<Vec<Value>>,
    pub(crate) read_only: Option<bool>,
    pub(crate) write_only: Option<bool>,
    pub(crate) content_media_type: Option<String>,
    pub(crate) content_encoding: Option<String>,

    pub(crate) types: Option<Vec<PrimitiveType>>,
    pub(crate) const_value: Option<Value>,
    pub(crate) enum_values: Option<Vec<Value>>,
    pub(crate) format: Option<String>,

    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) exclusive_minimum: Option<Exclusive>,
    pub(crate) exclusive_maximum: Option<Exclusive>,
    pub(crate) multiple_of: Option<f64>,

    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) pattern: Option<(String, Regex)>,

    pub(crate) items: Option<SchemaId>,
    pub(crate) items_tuple: Option<Vec<SchemaId>>,
    pub(crate) additional_items: Option<BoolOrSchema>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,
    pub(crate) contains: Option<SchemaId>,

    pub(crate) properties: Option<AHashMap<String, SchemaId>>,
    pub(crate) pattern_properties: Option<Vec<(String, Regex, SchemaId)>>,
    pub(crate) additional_properties: Option<BoolOrSchema>,
    pub(crate) property_names: Option<SchemaId>,
    pub(crate) required: Option<Vec<String>>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) dependencies: Option<Vec<(String, Dependency)>>,
    pub(crate) definitions: Option<AHashMap<String, SchemaId>>,

    pub(crate) all_of: Option<Vec<SchemaId>>,
    pub(crate) any_of: Option<Vec<SchemaId>>,
    pub(crate) one_of: Option<Vec<SchemaId>>,
    pub(crate) not: Option<SchemaId>,
    pub(crate) if_schema: Option<SchemaId>,
    pub(crate) then_schema: Option<SchemaId>,
    pub(crate) else_schema: Option<SchemaId>,
}

impl SchemaNode {
    pub(crate) fn new(draft: Draft, base_uri: Url, path: String) -> Self {
        SchemaNode {
            draft,
            base_uri,
            path,
            id: None,
            reference: None,
            ref_target: None,
            boolean: None,
            title: None,
            description: None,
            comment: None,
            default: None,
            examples: None,
            read_only: None,
            write_only: None,
            content_media_type: None,
            content_encoding: None,
            types: None,
            const_value: None,
            enum_values: None,
            format: None,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            multiple_of: None,
            min_length: None,
            max_length: None,
            pattern: None,
            items: None,
            items_tuple: None,
            additional_items: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            contains: None,
            properties: None,
            pattern_properties: None,
            additional_properties: None,
            property_names: None,
            required: None,
            min_properties: None,
            max_properties: None,
            dependencies: None,
            definitions: None,
            all_of: None,
            any_of: None,
            one_of: None,
            not: None,
            if_schema: None,
            then_schema: None,
            else_schema: None,
        }
    }

    pub(crate) fn boolean(draft: Draft, base_uri: Url, path: String, value: bool) -> Self {
        let mut node = SchemaNode::new(draft, base_uri, path);
        node.boolean = Some(value);
        node
    }
}

/// The arena a compiled schema lives in, together with the ref map shared by
/// every node. Immutable once compilation has finished.
#[derive(Debug)]
pub(crate) struct SchemaTree {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) ref_map: AHashMap<String, SchemaId>,
    pub(crate) formats: FormatRegistry,
    pub(crate) source: Value,
    pub(crate) draft: Draft,
}

impl SchemaTree {
    pub(crate) fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }
}

/// A compiled schema, or a sub-schema of one obtained through
/// [`Schema::resolve_path`].
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) tree: Arc<SchemaTree>,
    pub(crate) node: SchemaId,
}

impl Schema {
    fn inner(&self) -> &SchemaNode {
        self.tree.node(self.node)
    }

    /// The draft this schema was compiled under.
    pub fn draft(&self) -> Draft {
        self.inner().draft
    }

    /// JSON Pointer of this schema within its document, empty for the root.
    pub fn schema_path(&self) -> &str {
        &self.inner().path
    }

    /// The declared `$id` (or draft-04 `id`) promoted to an absolute URI.
    pub fn id(&self) -> Option<&str> {
        self.inner().id.as_ref().map(Url::as_str)
    }

    /// The effective base URI used to resolve relative references below this
    /// node.
    pub fn base_uri(&self) -> &str {
        self.inner().base_uri.as_str()
    }

    pub fn title(&self) -> Option<&str> {
        self.inner().title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.inner().description.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.inner().comment.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.inner().format.as_deref()
    }

    /// The `const` value, if any. `Some(Value::Null)` means `const: null`.
    pub fn constant(&self) -> Option<&Value> {
        self.inner().const_value.as_ref()
    }

    pub fn enum_values(&self) -> Option<&[Value]> {
        self.inner().enum_values.as_deref()
    }

    pub fn required(&self) -> Option<&[String]> {
        self.inner().required.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.inner().default.as_ref()
    }

    pub fn examples(&self) -> Option<&[Value]> {
        self.inner().examples.as_deref()
    }

    pub fn content_media_type(&self) -> Option<&str> {
        self.inner().content_media_type.as_deref()
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.inner().content_encoding.as_deref()
    }

    /// `Some(true)`/`Some(false)` when this node is a boolean schema.
    pub fn as_bool(&self) -> Option<bool> {
        self.inner().boolean
    }

    /// The raw JSON document the root schema was compiled from.
    pub fn source(&self) -> &Value {
        &self.tree.source
    }

    /// Resolve a JSON Pointer (or URI with a pointer fragment) into a
    /// sub-schema. `$ref` chains are chased along the way.
    pub fn resolve_path(&self, reference: &str) -> Result<Schema, CompilationError> {
        let node = resolver::resolve_from(
            &self.tree.nodes,
            &self.tree.ref_map,
            &self.inner().base_uri,
            reference,
        )?;
        Ok(Schema {
            tree: Arc::clone(&self.tree),
            node,
        })
    }

    /// Fast verdict: stops at the first violation.
    pub fn is_valid(&self, instance: &Value) -> bool {
        validator::run(self.tree.as_ref(), self.node, instance, &ValidationOptions::default())
            .is_empty()
    }

    /// Validate `instance` with the given options and return the verdict.
    pub fn validate(&self, instance: &Value, options: &ValidationOptions) -> bool {
        validator::run(self.tree.as_ref(), self.node, instance, options).is_empty()
    }

    /// Validate `instance` and report every violation.
    pub fn validate_with_errors(&self, instance: &Value) -> Vec<ValidationError> {
        self.validate_with_errors_and_options(
            instance,
            &ValidationOptions::default().with_multiple_errors(true),
        )
    }

    /// Validate `instance` and report violations, honoring `options`
    /// (multiple-error reporting is forced on).
    pub fn validate_with_errors_and_options(
        &self,
        instance: &Value,
        options: &ValidationOptions,
    ) -> Vec<ValidationError> {
        let options = options.clone().with_multiple_errors(true);
        validator::run(self.tree.as_ref(), self.node, instance, &options)
    }
}
