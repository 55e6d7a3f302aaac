//! Reference resolution: base-URI bookkeeping, ref-map lookups and the
//! JSON-Pointer walk through compiled nodes, with cycle detection.
use crate::{
    error::CompilationError,
    paths::{join_pointer, unescape_token},
    schema::{BoolOrSchema, Dependency, SchemaId, SchemaNode},
};
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use url::Url;

/// Scope used for documents that carry no `$id` and were not fetched from
/// anywhere.
pub(crate) const DEFAULT_ROOT_URL: &str = "json-schema:///";

pub(crate) static DEFAULT_SCOPE: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_ROOT_URL).expect("Is a valid URL"));

/// Promote a (possibly relative) reference against a base URI.
pub(crate) fn promote(base: &Url, reference: &str) -> Result<Url, CompilationError> {
    Ok(Url::options().base_url(Some(base)).parse(reference)?)
}

pub(crate) fn strip_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
}

/// Entry point behind `Schema::resolve_path`: accepts a bare JSON Pointer
/// (`/definitions/a`), a fragment (`#/definitions/a`) or a full URI.
pub(crate) fn resolve_from(
    nodes: &[SchemaNode],
    ref_map: &AHashMap<String, SchemaId>,
    base: &Url,
    reference: &str,
) -> Result<SchemaId, CompilationError> {
    let normalized = if reference.starts_with('/') {
        format!("#{}", reference)
    } else {
        reference.to_string()
    };
    let uri = promote(base, &normalized)?;
    let mut visited = AHashSet::new();
    resolve_uri(nodes, ref_map, uri.as_str(), &mut visited)
}

/// Resolve an absolute URI (with optional pointer fragment) to a node.
///
/// Location-independent identifiers are searched before the fragment-less
/// lookup, matching how identifiers were registered during compilation.
pub(crate) fn resolve_uri(
    nodes: &[SchemaNode],
    ref_map: &AHashMap<String, SchemaId>,
    uri: &str,
    visited: &mut AHashSet<String>,
) -> Result<SchemaId, CompilationError> {
    if let Some(&id) = ref_map.get(uri) {
        return chase(nodes, ref_map, id, uri, visited);
    }
    let parsed = Url::parse(uri)?;
    let fragment = percent_encoding::percent_decode_str(parsed.fragment().unwrap_or(""))
        .decode_utf8()
        .map_err(|_| CompilationError::UnresolvableRef {
            uri: uri.to_string(),
        })?
        .into_owned();
    let base = strip_fragment(&parsed);
    let base_key = base.to_string();
    let root = ref_map
        .get(base_key.as_str())
        .or_else(|| ref_map.get(format!("{}#", base_key).as_str()))
        .copied()
        .ok_or_else(|| CompilationError::UnresolvableRef {
            uri: uri.to_string(),
        })?;
    let landed = walk_fragment(nodes, ref_map, root, &base_key, &fragment).ok_or_else(|| {
        CompilationError::UnresolvableRef {
            uri: uri.to_string(),
        }
    })?;
    chase(nodes, ref_map, landed, uri, visited)
}

/// If the landed node is itself a reference, keep following it; a revisited
/// reference is a cycle.
fn chase(
    nodes: &[SchemaNode],
    ref_map: &AHashMap<String, SchemaId>,
    id: SchemaId,
    came_from: &str,
    visited: &mut AHashSet<String>,
) -> Result<SchemaId, CompilationError> {
    let node = &nodes[id.0];
    if let Some(reference) = &node.reference {
        if !visited.insert(reference.clone()) {
            return Err(CompilationError::RefCycle {
                path: came_from.to_string(),
            });
        }
        resolve_uri(nodes, ref_map, reference, visited)
    } else {
        Ok(id)
    }
}

/// Follow a JSON-Pointer fragment through compiled nodes.
///
/// Known keywords are walked through the node's own children; anything else
/// falls back to the per-schema entries the compiler indexed into the ref map
/// (sub-schemas found under custom keywords).
fn walk_fragment(
    nodes: &[SchemaNode],
    ref_map: &AHashMap<String, SchemaId>,
    start: SchemaId,
    base_key: &str,
    fragment: &str,
) -> Option<SchemaId> {
    if fragment.is_empty() {
        return Some(start);
    }
    if !fragment.starts_with('/') {
        return None;
    }
    let mut pointer = nodes[start.0].path.clone();
    let mut current = start;
    let mut tokens = fragment.split('/').skip(1).map(unescape_token);
    while let Some(token) = tokens.next() {
        let node = &nodes[current.0];
        let next = match token.as_str() {
            "properties" => {
                let key = tokens.next()?;
                pointer = join_pointer(&pointer, "properties");
                pointer = join_pointer(&pointer, &key);
                node.properties.as_ref()?.get(&key).copied()
            }
            "patternProperties" => {
                let key = tokens.next()?;
                pointer = join_pointer(&pointer, "patternProperties");
                pointer = join_pointer(&pointer, &key);
                node.pattern_properties
                    .as_ref()?
                    .iter()
                    .find(|(pattern, _, _)| pattern == &key)
                    .map(|(_, _, id)| *id)
            }
            "definitions" => {
                let key = tokens.next()?;
                pointer = join_pointer(&pointer, "definitions");
                pointer = join_pointer(&pointer, &key);
                node.definitions.as_ref()?.get(&key).copied()
            }
            "dependencies" => {
                let key = tokens.next()?;
                pointer = join_pointer(&pointer, "dependencies");
                pointer = join_pointer(&pointer, &key);
                node.dependencies
                    .as_ref()?
                    .iter()
                    .find(|(name, _)| name == &key)
                    .and_then(|(_, dependency)| match dependency {
                        Dependency::Schema(id) => Some(*id),
                        Dependency::Keys(_) => None,
                    })
            }
            "items" => {
                pointer = join_pointer(&pointer, "items");
                if let Some(single) = node.items {
                    Some(single)
                } else {
                    let index: usize = tokens.next()?.parse().ok()?;
                    pointer = format!("{}/{}", pointer, index);
                    node.items_tuple.as_ref()?.get(index).copied()
                }
            }
            "allOf" | "anyOf" | "oneOf" => {
                let list = match token.as_str() {
                    "allOf" => node.all_of.as_ref(),
                    "anyOf" => node.any_of.as_ref(),
                    _ => node.one_of.as_ref(),
                }?;
                let index: usize = tokens.next()?.parse().ok()?;
                pointer = format!("{}/{}/{}", pointer, token, index);
                list.get(index).copied()
            }
            "additionalItems" => {
                pointer = join_pointer(&pointer, &token);
                match node.additional_items.as_ref()? {
                    BoolOrSchema::Schema(id) => Some(*id),
                    BoolOrSchema::Bool(_) => None,
                }
            }
            "additionalProperties" => {
                pointer = join_pointer(&pointer, &token);
                match node.additional_properties.as_ref()? {
                    BoolOrSchema::Schema(id) => Some(*id),
                    BoolOrSchema::Bool(_) => None,
                }
            }
            "not" => {
                pointer = join_pointer(&pointer, &token);
                node.not
            }
            "if" => {
                pointer = join_pointer(&pointer, &token);
                node.if_schema
            }
            "then" => {
                pointer = join_pointer(&pointer, &token);
                node.then_schema
            }
            "else" => {
                pointer = join_pointer(&pointer, &token);
                node.else_schema
            }
            "contains" => {
                pointer = join_pointer(&pointer, &token);
                node.contains
            }
            "propertyNames" => {
                pointer = join_pointer(&pointer, &token);
                node.property_names
            }
            _ => {
                pointer = join_pointer(&pointer, &token);
                ref_map.get(&format!("{}#{}", base_key, pointer)).copied()
            }
        };
        current = next?;
    }
    Some(current)
}
