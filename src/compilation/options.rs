use crate::{
    compilation::Compiler,
    error::CompilationError,
    formats::FormatRegistry,
    resolver::DEFAULT_SCOPE,
    retriever::{AsyncSchemaProvider, DefaultRetriever, ProvidedSchema, SchemaProvider},
    schema::{Schema, SchemaTree},
    schemas::{draft_from_schema, Draft},
};
use serde_json::Value;
use std::{fmt, sync::Arc};
use url::Url;

/// Full configuration to guide schema compilation.
///
/// A `CompilationOptions` instance selects the draft, the URI the document
/// is considered fetched from, the reference providers and the format
/// registry; `compile`, `compile_async` and `compile_url` consume it.
#[derive(Clone, Default)]
pub struct CompilationOptions {
    draft: Option<Draft>,
    base_uri: Option<String>,
    provider: Option<Arc<dyn SchemaProvider>>,
    async_provider: Option<Arc<dyn AsyncSchemaProvider>>,
    formats: FormatRegistry,
}

impl CompilationOptions {
    /// Ensure that the schema is going to be compiled using the defined
    /// draft, regardless of what its `$schema` says.
    #[inline]
    pub fn with_draft(&mut self, draft: Draft) -> &mut Self {
        self.draft = Some(draft);
        self
    }

    /// The URI the document was (notionally) fetched from; relative
    /// references resolve against it when the document declares no
    /// identifier of its own.
    #[inline]
    pub fn with_base_uri(&mut self, base_uri: impl Into<String>) -> &mut Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Source of external documents for synchronous compilation.
    #[inline]
    pub fn with_provider(&mut self, provider: impl SchemaProvider + 'static) -> &mut Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Source of external documents for asynchronous compilation. Without
    /// one, `http(s)` documents are fetched by the built-in retriever.
    #[inline]
    pub fn with_async_provider(
        &mut self,
        provider: impl AsyncSchemaProvider + 'static,
    ) -> &mut Self {
        self.async_provider = Some(Arc::new(provider));
        self
    }

    /// Replace the format predicates for `uri`, `uri-reference`,
    /// `uri-template` and `email`.
    #[inline]
    pub fn with_format_registry(&mut self, formats: FormatRegistry) -> &mut Self {
        self.formats = formats;
        self
    }

    fn resolved_draft(&self, schema: &Value) -> Draft {
        // Draft is detected in the following precedence order:
        //   - Explicitly specified;
        //   - $schema field in the document;
        //   - Draft::default()
        self.draft
            .or_else(|| draft_from_schema(schema))
            .unwrap_or_default()
    }

    fn fetched_from(&self) -> Result<Url, CompilationError> {
        match &self.base_uri {
            Some(uri) => Ok(Url::parse(uri)?),
            None => Ok(DEFAULT_SCOPE.clone()),
        }
    }

    fn into_schema(
        &self,
        compiler: Compiler,
        root: crate::schema::SchemaId,
        schema: &Value,
        draft: Draft,
    ) -> Schema {
        Schema {
            tree: Arc::new(SchemaTree {
                nodes: compiler.nodes,
                ref_map: compiler.ref_map,
                formats: self.formats.clone(),
                source: schema.clone(),
                draft,
            }),
            node: root,
        }
    }

    /// Compile `schema` synchronously. Every remote reference must be
    /// satisfiable through the configured provider.
    pub fn compile(&self, schema: &Value) -> Result<Schema, CompilationError> {
        let draft = self.resolved_draft(schema);
        let fetched_from = self.fetched_from()?;
        let mut compiler = Compiler::new(draft);
        let root = compiler.compile_document(schema, &fetched_from, draft)?;
        compiler.drain_requests(self.provider.as_deref())?;
        compiler.resolve_pending()?;
        Ok(self.into_schema(compiler, root, schema, draft))
    }

    /// Compile `schema`, retrieving remote documents concurrently through
    /// the async provider (or the built-in HTTP retriever).
    pub async fn compile_async(&self, schema: &Value) -> Result<Schema, CompilationError> {
        let draft = self.resolved_draft(schema);
        let fetched_from = self.fetched_from()?;
        let mut compiler = Compiler::new(draft);
        let root = compiler.compile_document(schema, &fetched_from, draft)?;
        let fallback = DefaultRetriever;
        let provider: &dyn AsyncSchemaProvider = match self.async_provider.as_deref() {
            Some(provider) => provider,
            None => &fallback,
        };
        compiler.drain_requests_async(provider).await?;
        compiler.resolve_pending()?;
        Ok(self.into_schema(compiler, root, schema, draft))
    }

    /// Fetch a document from `url` and compile it with `url` as its base.
    pub async fn compile_url(&self, url: &str) -> Result<Schema, CompilationError> {
        let fallback = DefaultRetriever;
        let provider: &dyn AsyncSchemaProvider = match self.async_provider.as_deref() {
            Some(provider) => provider,
            None => &fallback,
        };
        let provided =
            provider
                .provide(url)
                .await
                .ok_or_else(|| CompilationError::UnresolvableRef {
                    uri: url.to_string(),
                })?;
        match provided {
            ProvidedSchema::Raw(document) => {
                let mut options = self.clone();
                options.with_base_uri(url);
                options.compile_async(&document).await
            }
            ProvidedSchema::Compiled(schema) => Ok(schema),
        }
    }
}

impl fmt::Debug for CompilationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationOptions")
            .field("draft", &self.draft)
            .field("base_uri", &self.base_uri)
            .field("provider", &self.provider.is_some())
            .field("async_provider", &self.async_provider.is_some())
            .field("formats", &self.formats)
            .finish()
    }
}
