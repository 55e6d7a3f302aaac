//! Reference providers: how external schema documents reach the compiler.
//!
//! Synchronous compilation never touches the network; every remote document
//! must come out of a caller-supplied [`SchemaProvider`]. Asynchronous
//! compilation falls back to [`DefaultRetriever`], which loads `http(s)`
//! documents with `reqwest`.
use crate::schema::Schema;
use async_trait::async_trait;
use serde_json::Value;

/// What a provider hands back for a URI: a raw document to compile, or a
/// schema that was already compiled elsewhere (its retained source document
/// is recompiled into the requesting schema's arena).
#[derive(Debug)]
pub enum ProvidedSchema {
    Raw(Value),
    Compiled(Schema),
}

/// Synchronous source of external schema documents.
///
/// The resolver performs two lookups per reference: the bare document URI
/// first, then the URI with `#` appended.
pub trait SchemaProvider {
    fn provide(&self, uri: &str) -> Option<ProvidedSchema>;
}

/// A plain map of documents keyed by URI works as a provider.
impl SchemaProvider for ahash::AHashMap<String, Value> {
    fn provide(&self, uri: &str) -> Option<ProvidedSchema> {
        self.get(uri).cloned().map(ProvidedSchema::Raw)
    }
}

impl SchemaProvider for std::collections::HashMap<String, Value> {
    fn provide(&self, uri: &str) -> Option<ProvidedSchema> {
        self.get(uri).cloned().map(ProvidedSchema::Raw)
    }
}

/// Asynchronous source of external schema documents.
#[async_trait]
pub trait AsyncSchemaProvider: Send + Sync {
    async fn provide(&self, uri: &str) -> Option<ProvidedSchema>;
}

/// The fallback retriever for async compilation: fetches `http`/`https`
/// URIs and parses the response as JSON. Anything else is not provided,
/// which surfaces as an unresolvable reference.
#[derive(Debug, Default)]
pub struct DefaultRetriever;

#[async_trait]
impl AsyncSchemaProvider for DefaultRetriever {
    async fn provide(&self, uri: &str) -> Option<ProvidedSchema> {
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return None;
        }
        let response = reqwest::get(uri).await.ok()?;
        let document: Value = response.json().await.ok()?;
        Some(ProvidedSchema::Raw(document))
    }
}
