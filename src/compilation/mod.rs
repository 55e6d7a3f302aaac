//! Schema compilation: a raw JSON document goes in, arena nodes come out,
//! with every reference recorded for the resolver to settle afterwards.
pub(crate) mod options;

use crate::{
    error::CompilationError,
    helpers,
    paths::{join_index, join_pointer},
    primitive_type::PrimitiveType,
    resolver::{self, strip_fragment, DEFAULT_SCOPE},
    retriever::{AsyncSchemaProvider, ProvidedSchema, SchemaProvider},
    schema::{BoolOrSchema, Dependency, Exclusive, SchemaId, SchemaNode},
    schemas::{draft_from_schema, Draft},
};
use ahash::{AHashMap, AHashSet};
use futures::future::join_all;
use regex::Regex;
use serde_json::{Map, Value};
use std::convert::TryFrom;
use url::Url;

pub(crate) struct Compiler {
    root_draft: Draft,
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) ref_map: AHashMap<String, SchemaId>,
    // Insertion journal, so a failed speculative compile can be undone
    ref_log: Vec<(String, Option<SchemaId>)>,
    // Every `$ref`, promoted to an absolute URI, waiting for its target
    pending_refs: Vec<(SchemaId, String)>,
    // Base of the document currently being walked; custom-keyword
    // sub-schemas are indexed under it
    document_base: Url,
}

struct Checkpoint {
    nodes: usize,
    pending_refs: usize,
    ref_log: usize,
}

impl Compiler {
    pub(crate) fn new(root_draft: Draft) -> Self {
        Compiler {
            root_draft,
            nodes: Vec::new(),
            ref_map: AHashMap::new(),
            ref_log: Vec::new(),
            pending_refs: Vec::new(),
            document_base: DEFAULT_SCOPE.clone(),
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.nodes.len(),
            pending_refs: self.pending_refs.len(),
            ref_log: self.ref_log.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.nodes.truncate(checkpoint.nodes);
        self.pending_refs.truncate(checkpoint.pending_refs);
        for (key, previous) in self.ref_log.drain(checkpoint.ref_log..).rev() {
            match previous {
                Some(id) => {
                    self.ref_map.insert(key, id);
                }
                None => {
                    self.ref_map.remove(&key);
                }
            }
        }
    }

    fn insert_ref(&mut self, key: String, id: SchemaId) {
        let previous = self.ref_map.insert(key.clone(), id);
        self.ref_log.push((key, previous));
    }

    fn push_node(&mut self, node: SchemaNode) -> SchemaId {
        let id = SchemaId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Compile one document. The root schema and every retrieved remote
    /// document go through here; the document is indexed under the URI it
    /// was fetched from and under any root identifier it declares.
    pub(crate) fn compile_document(
        &mut self,
        document: &Value,
        fetched_from: &Url,
        draft: Draft,
    ) -> Result<SchemaId, CompilationError> {
        let fetched_from = strip_fragment(fetched_from);
        let saved_base = self.document_base.clone();
        self.document_base = match crate::schemas::id_of(draft, document) {
            Some(id) => {
                let promoted = resolver::promote(&fetched_from, id)?;
                strip_fragment(&promoted)
            }
            None => fetched_from.clone(),
        };
        let result = self.compile_value(document, draft, &fetched_from, String::new());
        self.document_base = saved_base;
        let root = result?;
        let key = fetched_from.to_string();
        self.insert_ref(format!("{}#", key), root);
        self.insert_ref(key, root);
        Ok(root)
    }

    fn compile_value(
        &mut self,
        schema: &Value,
        draft: Draft,
        parent_base: &Url,
        path: String,
    ) -> Result<SchemaId, CompilationError> {
        match schema {
            Value::Bool(value) => {
                if !draft.supports_boolean_schemas() {
                    return Err(CompilationError::InvalidDraftConstruct {
                        construct: "boolean schema".to_string(),
                        draft,
                    });
                }
                Ok(self.push_node(SchemaNode::boolean(
                    draft,
                    parent_base.clone(),
                    path,
                    *value,
                )))
            }
            Value::Object(object) => self.compile_object(object, draft, parent_base, path),
            _ => Err(CompilationError::InvalidKeywordShape {
                keyword: "schema".to_string(),
                value: schema.clone(),
            }),
        }
    }

    fn compile_object(
        &mut self,
        object: &Map<String, Value>,
        draft: Draft,
        parent_base: &Url,
        path: String,
    ) -> Result<SchemaId, CompilationError> {
        let id_keyword = if draft == Draft::Draft4 { "id" } else { "$id" };
        let mut base = parent_base.clone();
        let mut declared_id = None;
        if let Some(id_value) = object.get(id_keyword) {
            let raw = id_value
                .as_str()
                .ok_or_else(|| CompilationError::InvalidKeywordShape {
                    keyword: id_keyword.to_string(),
                    value: id_value.clone(),
                })?;
            let mut promoted = resolver::promote(parent_base, raw)?;
            // Empty fragments are not distinguishable from absent ones
            if promoted.fragment() == Some("") {
                promoted.set_fragment(None);
            }
            if promoted.fragment().is_none() {
                base = promoted.clone();
            }
            declared_id = Some(promoted);
        }

        let id = self.push_node(SchemaNode::new(draft, base.clone(), path.clone()));
        if let Some(declared) = declared_id {
            if declared.fragment().is_some() {
                // Location-independent identifier, addressable only by its
                // full form
                self.insert_ref(declared.to_string(), id);
            } else {
                let key = declared.to_string();
                self.insert_ref(format!("{}#", key), id);
                self.insert_ref(key, id);
            }
            self.nodes[id.0].id = Some(declared);
        }

        for (keyword, value) in object {
            if keyword == id_keyword {
                continue;
            }
            if !draft.recognizes_keyword(keyword) {
                self.examine_unknown(value, draft, &base, join_pointer(&path, keyword));
                continue;
            }
            match keyword.as_str() {
                "$schema" => {
                    expect_string(keyword, value)?;
                }
                "$ref" => {
                    let reference = expect_string(keyword, value)?;
                    let promoted = resolver::promote(&base, reference)?;
                    self.nodes[id.0].reference = Some(promoted.to_string());
                    self.pending_refs.push((id, promoted.to_string()));
                }
                "title" => self.nodes[id.0].title = Some(expect_string(keyword, value)?.to_string()),
                "description" => {
                    self.nodes[id.0].description = Some(expect_string(keyword, value)?.to_string())
                }
                "$comment" => {
                    self.nodes[id.0].comment = Some(expect_string(keyword, value)?.to_string())
                }
                "default" => self.nodes[id.0].default = Some(value.clone()),
                "examples" => {
                    let examples = expect_array(keyword, value)?;
                    self.nodes[id.0].examples = Some(examples.to_vec());
                }
                "readOnly" => self.nodes[id.0].read_only = Some(expect_bool(keyword, value)?),
                "writeOnly" => self.nodes[id.0].write_only = Some(expect_bool(keyword, value)?),
                "contentMediaType" => {
                    self.nodes[id.0].content_media_type =
                        Some(expect_string(keyword, value)?.to_string())
                }
                "contentEncoding" => {
                    self.nodes[id.0].content_encoding =
                        Some(expect_string(keyword, value)?.to_string())
                }
                "type" => self.nodes[id.0].types = Some(parse_types(value)?),
                "const" => self.nodes[id.0].const_value = Some(value.clone()),
                "enum" => {
                    let options = expect_array(keyword, value)?;
                    if options.is_empty() {
                        return Err(shape_error(keyword, value));
                    }
                    for (index, option) in options.iter().enumerate() {
                        if options[..index].iter().any(|seen| helpers::equal(seen, option)) {
                            return Err(shape_error(keyword, value));
                        }
                    }
                    self.nodes[id.0].enum_values = Some(options.to_vec());
                }
                "format" => {
                    self.nodes[id.0].format = Some(expect_string(keyword, value)?.to_string())
                }
                "minimum" => self.nodes[id.0].minimum = Some(expect_number(keyword, value)?),
                "maximum" => self.nodes[id.0].maximum = Some(expect_number(keyword, value)?),
                "exclusiveMinimum" => {
                    self.nodes[id.0].exclusive_minimum = Some(parse_exclusive(keyword, value, draft)?)
                }
                "exclusiveMaximum" => {
                    self.nodes[id.0].exclusive_maximum = Some(parse_exclusive(keyword, value, draft)?)
                }
                "multipleOf" => {
                    let multiple_of = expect_number(keyword, value)?;
                    if multiple_of <= 0.0 {
                        return Err(shape_error(keyword, value));
                    }
                    self.nodes[id.0].multiple_of = Some(multiple_of);
                }
                "minLength" => {
                    self.nodes[id.0].min_length = Some(expect_non_negative_integer(keyword, value)?)
                }
                "maxLength" => {
                    self.nodes[id.0].max_length = Some(expect_non_negative_integer(keyword, value)?)
                }
                "pattern" => {
                    let pattern = expect_string(keyword, value)?;
                    let compiled =
                        Regex::new(pattern).map_err(|_| shape_error(keyword, value))?;
                    self.nodes[id.0].pattern = Some((pattern.to_string(), compiled));
                }
                "items" => match value {
                    Value::Array(entries) => {
                        let mut tuple = Vec::with_capacity(entries.len());
                        for (index, entry) in entries.iter().enumerate() {
                            let entry_path = join_index(&join_pointer(&path, "items"), index);
                            tuple.push(self.compile_value(entry, draft, &base, entry_path)?);
                        }
                        self.nodes[id.0].items_tuple = Some(tuple);
                    }
                    Value::Object(_) | Value::Bool(_) => {
                        let child =
                            self.compile_value(value, draft, &base, join_pointer(&path, "items"))?;
                        self.nodes[id.0].items = Some(child);
                    }
                    _ => return Err(shape_error(keyword, value)),
                },
                "additionalItems" => {
                    let compiled =
                        self.parse_bool_or_schema(keyword, value, draft, &base, &path)?;
                    self.nodes[id.0].additional_items = Some(compiled);
                }
                "minItems" => {
                    self.nodes[id.0].min_items = Some(expect_non_negative_integer(keyword, value)?)
                }
                "maxItems" => {
                    self.nodes[id.0].max_items = Some(expect_non_negative_integer(keyword, value)?)
                }
                "uniqueItems" => self.nodes[id.0].unique_items = expect_bool(keyword, value)?,
                "contains" => {
                    let child =
                        self.compile_value(value, draft, &base, join_pointer(&path, "contains"))?;
                    self.nodes[id.0].contains = Some(child);
                }
                "properties" => {
                    let entries = expect_object(keyword, value)?;
                    let mut properties = AHashMap::with_capacity(entries.len());
                    for (name, subschema) in entries {
                        let child_path =
                            join_pointer(&join_pointer(&path, "properties"), name);
                        let child = self.compile_value(subschema, draft, &base, child_path)?;
                        properties.insert(name.clone(), child);
                    }
                    self.nodes[id.0].properties = Some(properties);
                }
                "patternProperties" => {
                    let entries = expect_object(keyword, value)?;
                    let mut patterns = Vec::with_capacity(entries.len());
                    for (pattern, subschema) in entries {
                        let compiled =
                            Regex::new(pattern).map_err(|_| shape_error(keyword, value))?;
                        let child_path =
                            join_pointer(&join_pointer(&path, "patternProperties"), pattern);
                        let child = self.compile_value(subschema, draft, &base, child_path)?;
                        patterns.push((pattern.clone(), compiled, child));
                    }
                    self.nodes[id.0].pattern_properties = Some(patterns);
                }
                "additionalProperties" => {
                    let compiled =
                        self.parse_bool_or_schema(keyword, value, draft, &base, &path)?;
                    self.nodes[id.0].additional_properties = Some(compiled);
                }
                "propertyNames" => {
                    let child = self.compile_value(
                        value,
                        draft,
                        &base,
                        join_pointer(&path, "propertyNames"),
                    )?;
                    self.nodes[id.0].property_names = Some(child);
                }
                "required" => {
                    let required = parse_unique_string_list(keyword, value)?;
                    if draft == Draft::Draft4 && required.is_empty() {
                        return Err(shape_error(keyword, value));
                    }
                    self.nodes[id.0].required = Some(required);
                }
                "minProperties" => {
                    self.nodes[id.0].min_properties =
                        Some(expect_non_negative_integer(keyword, value)?)
                }
                "maxProperties" => {
                    self.nodes[id.0].max_properties =
                        Some(expect_non_negative_integer(keyword, value)?)
                }
                "dependencies" => {
                    let entries = expect_object(keyword, value)?;
                    let mut dependencies = Vec::with_capacity(entries.len());
                    for (name, dependency) in entries {
                        let compiled = match dependency {
                            Value::Array(_) => {
                                let keys = parse_unique_string_list(keyword, dependency)?;
                                if draft == Draft::Draft4 && keys.is_empty() {
                                    return Err(shape_error(keyword, dependency));
                                }
                                Dependency::Keys(keys)
                            }
                            Value::Object(_) | Value::Bool(_) => {
                                let child_path =
                                    join_pointer(&join_pointer(&path, "dependencies"), name);
                                Dependency::Schema(
                                    self.compile_value(dependency, draft, &base, child_path)?,
                                )
                            }
                            _ => return Err(shape_error(keyword, dependency)),
                        };
                        dependencies.push((name.clone(), compiled));
                    }
                    self.nodes[id.0].dependencies = Some(dependencies);
                }
                "definitions" => {
                    let entries = expect_object(keyword, value)?;
                    let mut definitions = AHashMap::with_capacity(entries.len());
                    for (name, subschema) in entries {
                        let child_path =
                            join_pointer(&join_pointer(&path, "definitions"), name);
                        let child = self.compile_value(subschema, draft, &base, child_path)?;
                        definitions.insert(name.clone(), child);
                    }
                    self.nodes[id.0].definitions = Some(definitions);
                }
                "allOf" | "anyOf" | "oneOf" => {
                    let entries = expect_array(keyword, value)?;
                    if entries.is_empty() {
                        return Err(shape_error(keyword, value));
                    }
                    let mut compiled = Vec::with_capacity(entries.len());
                    for (index, entry) in entries.iter().enumerate() {
                        let entry_path = join_index(&join_pointer(&path, keyword), index);
                        compiled.push(self.compile_value(entry, draft, &base, entry_path)?);
                    }
                    match keyword.as_str() {
                        "allOf" => self.nodes[id.0].all_of = Some(compiled),
                        "anyOf" => self.nodes[id.0].any_of = Some(compiled),
                        _ => self.nodes[id.0].one_of = Some(compiled),
                    }
                }
                "not" => {
                    let child =
                        self.compile_value(value, draft, &base, join_pointer(&path, "not"))?;
                    self.nodes[id.0].not = Some(child);
                }
                "if" => {
                    let child =
                        self.compile_value(value, draft, &base, join_pointer(&path, "if"))?;
                    self.nodes[id.0].if_schema = Some(child);
                }
                "then" => {
                    let child =
                        self.compile_value(value, draft, &base, join_pointer(&path, "then"))?;
                    self.nodes[id.0].then_schema = Some(child);
                }
                "else" => {
                    let child =
                        self.compile_value(value, draft, &base, join_pointer(&path, "else"))?;
                    self.nodes[id.0].else_schema = Some(child);
                }
                _ => unreachable!("recognized keywords are matched exhaustively"),
            }
        }

        if draft == Draft::Draft4 {
            let node = &self.nodes[id.0];
            if matches!(node.exclusive_maximum, Some(Exclusive::Flag(_))) && node.maximum.is_none()
            {
                return Err(CompilationError::InterdependencyMissing {
                    needs: "exclusiveMaximum",
                    missing: "maximum",
                });
            }
            if matches!(node.exclusive_minimum, Some(Exclusive::Flag(_))) && node.minimum.is_none()
            {
                return Err(CompilationError::InterdependencyMissing {
                    needs: "exclusiveMinimum",
                    missing: "minimum",
                });
            }
        }

        Ok(id)
    }

    fn parse_bool_or_schema(
        &mut self,
        keyword: &str,
        value: &Value,
        draft: Draft,
        base: &Url,
        path: &str,
    ) -> Result<BoolOrSchema, CompilationError> {
        match value {
            Value::Bool(allowed) => Ok(BoolOrSchema::Bool(*allowed)),
            Value::Object(_) => {
                let child = self.compile_value(value, draft, base, join_pointer(path, keyword))?;
                Ok(BoolOrSchema::Schema(child))
            }
            _ => Err(shape_error(keyword, value)),
        }
    }

    /// Values of unrecognized keywords are examined for embedded
    /// sub-schemas. Whatever compiles is indexed under its pointer so that
    /// references into it resolve; whatever does not is rolled back and
    /// silently ignored.
    fn examine_unknown(&mut self, value: &Value, draft: Draft, base: &Url, path: String) {
        match value {
            Value::Object(_) => {
                let checkpoint = self.checkpoint();
                match self.compile_value(value, draft, base, path.clone()) {
                    Ok(compiled) => {
                        let key = format!("{}#{}", self.document_base, path);
                        self.insert_ref(key, compiled);
                    }
                    Err(_) => self.rollback(checkpoint),
                }
            }
            Value::Array(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    self.examine_unknown(entry, draft, base, join_index(&path, index));
                }
            }
            _ => {}
        }
    }

    /// Bases referenced by some pending `$ref` that no compiled document
    /// covers yet. These are the retrieval requests.
    fn missing_documents(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for (_, uri) in &self.pending_refs {
            if self.ref_map.contains_key(uri.as_str()) {
                continue;
            }
            let base = match Url::parse(uri) {
                Ok(parsed) => strip_fragment(&parsed).to_string(),
                Err(_) => continue,
            };
            if self.ref_map.contains_key(base.as_str())
                || self.ref_map.contains_key(format!("{}#", base).as_str())
            {
                continue;
            }
            if !missing.contains(&base) {
                missing.push(base);
            }
        }
        missing
    }

    fn ingest(&mut self, uri: String, provided: ProvidedSchema) -> Result<(), CompilationError> {
        let fetched_from = Url::parse(&uri)?;
        match provided {
            ProvidedSchema::Raw(document) => {
                let draft = draft_from_schema(&document).unwrap_or(self.root_draft);
                self.compile_document(&document, &fetched_from, draft)?;
            }
            ProvidedSchema::Compiled(schema) => {
                let document = schema.source().clone();
                let draft = draft_from_schema(&document).unwrap_or_else(|| schema.draft());
                self.compile_document(&document, &fetched_from, draft)?;
            }
        }
        Ok(())
    }

    /// Drain retrieval requests through the synchronous provider until no
    /// pending reference points outside the ref map.
    pub(crate) fn drain_requests(
        &mut self,
        provider: Option<&dyn SchemaProvider>,
    ) -> Result<(), CompilationError> {
        loop {
            let missing = self.missing_documents();
            if missing.is_empty() {
                return Ok(());
            }
            for uri in missing {
                let provided = provider.and_then(|provider| {
                    provider
                        .provide(&uri)
                        .or_else(|| provider.provide(&format!("{}#", uri)))
                });
                match provided {
                    Some(document) => self.ingest(uri, document)?,
                    None => return Err(CompilationError::UnresolvableRef { uri }),
                }
            }
        }
    }

    /// Asynchronous counterpart of [`Compiler::drain_requests`]: each round
    /// of missing documents is fetched concurrently, then compiled; fetched
    /// documents may introduce new requests, so the loop runs to fixed
    /// point.
    pub(crate) async fn drain_requests_async(
        &mut self,
        provider: &dyn AsyncSchemaProvider,
    ) -> Result<(), CompilationError> {
        loop {
            let missing = self.missing_documents();
            if missing.is_empty() {
                return Ok(());
            }
            let fetches = missing.into_iter().map(|uri| async move {
                let provided = match provider.provide(&uri).await {
                    Some(provided) => Some(provided),
                    None => provider.provide(&format!("{}#", uri)).await,
                };
                (uri, provided)
            });
            for (uri, provided) in join_all(fetches).await {
                match provided {
                    Some(document) => self.ingest(uri, document)?,
                    None => return Err(CompilationError::UnresolvableRef { uri }),
                }
            }
        }
    }

    /// Settle every recorded reference: walk it to a node and store the
    /// target. Runs only after retrieval has finished.
    pub(crate) fn resolve_pending(&mut self) -> Result<(), CompilationError> {
        let pending = std::mem::take(&mut self.pending_refs);
        for (node, uri) in pending {
            let mut visited = AHashSet::new();
            let target = resolver::resolve_uri(&self.nodes, &self.ref_map, &uri, &mut visited)?;
            self.nodes[node.0].ref_target = Some(target);
        }
        Ok(())
    }
}

fn shape_error(keyword: &str, value: &Value) -> CompilationError {
    CompilationError::InvalidKeywordShape {
        keyword: keyword.to_string(),
        value: value.clone(),
    }
}

fn expect_string<'a>(keyword: &str, value: &'a Value) -> Result<&'a str, CompilationError> {
    value.as_str().ok_or_else(|| shape_error(keyword, value))
}

fn expect_bool(keyword: &str, value: &Value) -> Result<bool, CompilationError> {
    value.as_bool().ok_or_else(|| shape_error(keyword, value))
}

fn expect_number(keyword: &str, value: &Value) -> Result<f64, CompilationError> {
    value.as_f64().ok_or_else(|| shape_error(keyword, value))
}

fn expect_array<'a>(keyword: &str, value: &'a Value) -> Result<&'a [Value], CompilationError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| shape_error(keyword, value))
}

fn expect_object<'a>(
    keyword: &str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, CompilationError> {
    value.as_object().ok_or_else(|| shape_error(keyword, value))
}

fn expect_non_negative_integer(keyword: &str, value: &Value) -> Result<u64, CompilationError> {
    if let Some(unsigned) = value.as_u64() {
        return Ok(unsigned);
    }
    // Draft-06 allows integral floats like 2.0 wherever an integer is needed
    if let Some(float) = value.as_f64() {
        if float >= 0.0 && float.fract() == 0.0 {
            return Ok(float as u64);
        }
    }
    Err(shape_error(keyword, value))
}

fn parse_types(value: &Value) -> Result<Vec<PrimitiveType>, CompilationError> {
    match value {
        Value::String(name) => {
            let type_ = PrimitiveType::try_from(name.as_str())
                .map_err(|_| shape_error("type", value))?;
            Ok(vec![type_])
        }
        Value::Array(names) => {
            let mut types = Vec::with_capacity(names.len());
            for name in names {
                let name = name.as_str().ok_or_else(|| shape_error("type", value))?;
                let type_ =
                    PrimitiveType::try_from(name).map_err(|_| shape_error("type", value))?;
                if types.contains(&type_) {
                    return Err(shape_error("type", value));
                }
                types.push(type_);
            }
            if types.is_empty() {
                return Err(shape_error("type", value));
            }
            Ok(types)
        }
        _ => Err(shape_error("type", value)),
    }
}

fn parse_exclusive(
    keyword: &str,
    value: &Value,
    draft: Draft,
) -> Result<Exclusive, CompilationError> {
    if draft == Draft::Draft4 {
        Ok(Exclusive::Flag(expect_bool(keyword, value)?))
    } else {
        Ok(Exclusive::Limit(expect_number(keyword, value)?))
    }
}

fn parse_unique_string_list(keyword: &str, value: &Value) -> Result<Vec<String>, CompilationError> {
    let entries = expect_array(keyword, value)?;
    let mut list = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.as_str().ok_or_else(|| shape_error(keyword, value))?;
        if list.iter().any(|seen: &String| seen == name) {
            return Err(shape_error(keyword, value));
        }
        list.push(name.to_string());
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompilationError;
    use serde_json::json;

    fn compile(schema: &Value, draft: Draft) -> Result<SchemaId, CompilationError> {
        let mut compiler = Compiler::new(draft);
        let root = compiler.compile_document(schema, &DEFAULT_SCOPE, draft)?;
        compiler.drain_requests(None)?;
        compiler.resolve_pending()?;
        Ok(root)
    }

    #[test]
    fn boolean_schema_rejected_under_draft_4() {
        let schema = json!({"items": true});
        let error = compile(&schema, Draft::Draft4).unwrap_err();
        assert!(matches!(
            error,
            CompilationError::InvalidDraftConstruct { draft: Draft::Draft4, .. }
        ));
        assert!(compile(&schema, Draft::Draft7).is_ok());
    }

    #[test]
    fn draft_4_exclusive_maximum_needs_maximum() {
        let schema = json!({"exclusiveMaximum": true});
        let error = compile(&schema, Draft::Draft4).unwrap_err();
        assert!(matches!(
            error,
            CompilationError::InterdependencyMissing {
                needs: "exclusiveMaximum",
                missing: "maximum"
            }
        ));
        assert!(compile(&json!({"exclusiveMaximum": true, "maximum": 5}), Draft::Draft4).is_ok());
    }

    #[test]
    fn draft_4_required_must_be_non_empty() {
        assert!(compile(&json!({"required": []}), Draft::Draft4).is_err());
        assert!(compile(&json!({"required": []}), Draft::Draft7).is_ok());
        assert!(compile(&json!({"required": ["a", "a"]}), Draft::Draft7).is_err());
    }

    #[test]
    fn unresolved_local_ref_fails() {
        let schema = json!({"$ref": "#/definitions/missing"});
        let error = compile(&schema, Draft::Draft7).unwrap_err();
        assert!(matches!(error, CompilationError::UnresolvableRef { .. }));
    }

    #[test]
    fn ref_cycle_is_detected() {
        let schema = json!({
            "definitions": {"a": {"$ref": "#/definitions/a"}},
            "$ref": "#/definitions/a"
        });
        let error = compile(&schema, Draft::Draft7).unwrap_err();
        assert!(matches!(error, CompilationError::RefCycle { .. }));
    }

    #[test]
    fn indirect_ref_chains_resolve() {
        let schema = json!({
            "$ref": "#/definitions/c",
            "definitions": {
                "a": {"type": "integer"},
                "b": {"$ref": "#/definitions/a"},
                "c": {"$ref": "#/definitions/b"}
            }
        });
        assert!(compile(&schema, Draft::Draft7).is_ok());
    }

    #[test]
    fn refs_under_unknown_keywords_participate() {
        let schema = json!({
            "x-vendor": {"target": {"type": "string"}},
            "$ref": "#/x-vendor/target"
        });
        assert!(compile(&schema, Draft::Draft7).is_ok());
    }

    #[test]
    fn broken_subtrees_under_unknown_keywords_are_ignored() {
        // `multipleOf: -1` never compiles as a schema, but the keyword
        // carrying it is not recognized, so the document is still fine
        let schema = json!({"x-vendor": {"multipleOf": -1}});
        assert!(compile(&schema, Draft::Draft7).is_ok());
    }

    #[test]
    fn invalid_keyword_shapes() {
        assert!(matches!(
            compile(&json!({"multipleOf": 0}), Draft::Draft7).unwrap_err(),
            CompilationError::InvalidKeywordShape { .. }
        ));
        assert!(compile(&json!({"pattern": "["}), Draft::Draft7).is_err());
        assert!(compile(&json!({"type": "frob"}), Draft::Draft7).is_err());
        assert!(compile(&json!({"enum": []}), Draft::Draft7).is_err());
        assert!(compile(&json!({"enum": [1, 1.0]}), Draft::Draft7).is_err());
        assert!(compile(&json!({"minLength": -1}), Draft::Draft7).is_err());
    }

    #[test]
    fn location_independent_identifier() {
        let schema = json!({
            "allOf": [{"$ref": "#foo"}],
            "definitions": {
                "A": {"$id": "#foo", "type": "integer"}
            }
        });
        assert!(compile(&schema, Draft::Draft7).is_ok());
    }

    #[test]
    fn missing_remote_document_fails_without_provider() {
        let schema = json!({"$ref": "http://example.com/other.json#/definitions/a"});
        let error = compile(&schema, Draft::Draft7).unwrap_err();
        assert!(matches!(
            error,
            CompilationError::UnresolvableRef { uri } if uri == "http://example.com/other.json"
        ));
    }
}
