//! Template registry and the `render_card` entry point
//!
//! The registry looks up template sources by id, parses each template once and
//! shares the parsed tree across renders. Ids starting with `@` name built-in
//! templates; every other id is looked up in the configured [`TemplateStore`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use glob::glob;
use serde_json::Value;
use thiserror::Error;

use crate::icons::{resolve_icons, IconCatalog};
use crate::models::{normalize_entity, EntityData, Warning};
use crate::parser::{parse, ParseError, ParsedTemplate};
use crate::renderer::{render_with, RenderOptions, RenderResult};
use crate::suggest::did_you_mean;
use crate::templates;

/// File extensions recognized as templates in a template directory.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["hbs", "html"];

/// Error from [`TemplateRegistry::render_card`] and friends.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("template '{id}' not found{}", hint(.suggestion))]
    NotFound { id: String, suggestion: Option<String> },
    #[error("cannot read template '{id}': {source}")]
    Io {
        id: String,
        #[source]
        source: io::Error,
    },
    #[error("template '{template_id}': {source}")]
    Parse {
        template_id: String,
        #[source]
        source: ParseError,
    },
    /// Warnings raised while rendering in strict mode.
    #[error("template '{template_id}' rendered with {} warning(s)", .warnings.len())]
    Strict { template_id: String, warnings: Vec<Warning> },
}

fn hint(suggestion: &Option<String>) -> String {
    suggestion.as_deref().map(|s| format!(". {}", s)).unwrap_or_default()
}

/// Source of raw template text, keyed by template id.
pub trait TemplateStore: Send + Sync {
    /// Raw source of a template, or `None` if the store has no such id.
    fn source(&self, id: &str) -> io::Result<Option<Cow<'_, str>>>;

    /// All ids the store can serve, sorted.
    fn ids(&self) -> Vec<String>;
}

/// Templates held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    templates: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any existing one with the same id.
    pub fn insert(&mut self, id: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(id.into(), source.into());
    }

    pub fn with(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(id, source);
        self
    }
}

impl TemplateStore for MemoryStore {
    fn source(&self, id: &str) -> io::Result<Option<Cow<'_, str>>> {
        Ok(self.templates.get(id).map(|s| Cow::Borrowed(s.as_str())))
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.templates.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Templates read from `<root>/<id>.hbs` or `<root>/<id>.html`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        TEMPLATE_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", id, ext)))
            .find(|path| path.is_file())
    }
}

impl TemplateStore for DirectoryStore {
    fn source(&self, id: &str) -> io::Result<Option<Cow<'_, str>>> {
        match self.path_for(id) {
            Some(path) => std::fs::read_to_string(path).map(|s| Some(Cow::Owned(s))),
            None => Ok(None),
        }
    }

    fn ids(&self) -> Vec<String> {
        let dir = self.root.display().to_string();
        let mut ids = Vec::new();

        for ext in TEMPLATE_EXTENSIONS {
            if let Ok(paths) = glob(&format!("{}/*.{}", dir, ext)) {
                ids.extend(paths.filter_map(Result::ok).filter_map(|path| {
                    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
                }));
            }
        }

        ids.sort();
        ids.dedup();
        ids
    }
}

/// Parsed templates shared across renders.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<String, Arc<ParsedTemplate>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached tree for `id`, parsing `source` on first use.
    pub fn get_or_parse(&self, id: &str, source: &str) -> Result<Arc<ParsedTemplate>, ParseError> {
        if let Some(parsed) = self.get(id) {
            return Ok(parsed);
        }

        let parsed = Arc::new(parse(source)?);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have parsed the same template meanwhile; keep the first.
        Ok(Arc::clone(entries.entry(id.to_string()).or_insert(parsed)))
    }

    pub fn get(&self, id: &str) -> Option<Arc<ParsedTemplate>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Resolves template ids and renders cards.
///
/// # Example
///
/// ```
/// use cardsrc::icons::IconCatalog;
/// use cardsrc::registry::{MemoryStore, TemplateRegistry};
/// use serde_json::json;
///
/// let store = MemoryStore::new().with("hello", "Hello {{company_name}}");
/// let registry = TemplateRegistry::new(store);
///
/// let result = registry
///     .render_card("hello", &json!({"company_name": "Acme"}), &IconCatalog::default_catalog())
///     .unwrap();
/// assert_eq!(result.output, "Hello Acme");
/// ```
pub struct TemplateRegistry {
    store: Box<dyn TemplateStore>,
    cache: TemplateCache,
    options: RenderOptions,
    strict: bool,
}

impl TemplateRegistry {
    pub fn new(store: impl TemplateStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            cache: TemplateCache::new(),
            options: RenderOptions::default(),
            strict: false,
        }
    }

    /// A registry serving only the built-in templates.
    pub fn builtins_only() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Fail renders that produce warnings.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Every available template id: store ids, then `@builtin` ids.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = self.store.ids();
        ids.extend(templates::list_builtins().into_iter().map(|name| format!("@{}", name)));
        ids
    }

    /// Raw source of a template.
    pub fn source(&self, id: &str) -> Result<Cow<'_, str>, CardError> {
        let found = match id.strip_prefix('@') {
            Some(name) => templates::get_builtin(name).map(Cow::Borrowed),
            None => self
                .store
                .source(id)
                .map_err(|source| CardError::Io { id: id.to_string(), source })?,
        };

        found.ok_or_else(|| {
            let ids = self.ids();
            let candidates: Vec<&str> = ids.iter().map(String::as_str).collect();
            CardError::NotFound { id: id.to_string(), suggestion: did_you_mean(id, &candidates) }
        })
    }

    /// The parsed tree of a template, from cache when available.
    pub fn parsed(&self, id: &str) -> Result<Arc<ParsedTemplate>, CardError> {
        if let Some(parsed) = self.cache.get(id) {
            return Ok(parsed);
        }
        let source = self.source(id)?;
        self.cache
            .get_or_parse(id, &source)
            .map_err(|source| CardError::Parse { template_id: id.to_string(), source })
    }

    /// Render an entity record with a template.
    ///
    /// The icon list is resolved from `catalog` against the record. Problems
    /// with the record's shape are reported as warnings on the result; in
    /// strict mode any warning fails the call.
    pub fn render_card(
        &self,
        template_id: &str,
        entity: &Value,
        catalog: &IconCatalog,
    ) -> Result<RenderResult, CardError> {
        let template = self.parsed(template_id)?;

        let entity = normalize_entity(entity.clone());
        let (data, mut warnings) = EntityData::from_value(&entity);
        let icons = resolve_icons(catalog, &data);

        let mut result = render_with(&template, &entity, &icons, &self.options);
        warnings.append(&mut result.warnings);
        result.warnings = warnings;

        if self.strict && result.has_warnings() {
            return Err(CardError::Strict {
                template_id: template_id.to_string(),
                warnings: result.warnings,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::{IconCategory, IconSlot};
    use serde_json::json;
    use tempfile::TempDir;

    fn catalog() -> IconCatalog {
        IconCatalog::new(vec![
            IconSlot::new("qr", "QR", IconCategory::System),
            IconSlot::new("telefon", "Telefon", IconCategory::Communication),
        ])
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new().with("b", "B").with("a", "A");
        assert_eq!(store.ids(), vec!["a", "b"]);
        assert_eq!(store.source("a").unwrap().as_deref(), Some("A"));
        assert!(store.source("c").unwrap().is_none());
    }

    #[test]
    fn test_directory_store() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("one.hbs"), "1").unwrap();
        std::fs::write(temp.path().join("two.html"), "2").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let store = DirectoryStore::new(temp.path());
        assert_eq!(store.ids(), vec!["one", "two"]);
        assert_eq!(store.source("two").unwrap().as_deref(), Some("2"));
        assert!(store.source("notes").unwrap().is_none());
    }

    #[test]
    fn test_builtin_lookup() {
        let registry = TemplateRegistry::builtins_only();
        assert!(registry.source("@classic").is_ok());
        assert_eq!(registry.ids(), vec!["@classic", "@minimal", "@dark"]);
    }

    #[test]
    fn test_not_found_suggests() {
        let registry = TemplateRegistry::builtins_only();
        let err = registry.source("@clasic").unwrap_err();
        match &err {
            CardError::NotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("Did you mean '@classic'?"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains("Did you mean '@classic'?"));
    }

    #[test]
    fn test_parse_error_carries_template_id() {
        let registry = TemplateRegistry::new(MemoryStore::new().with("broken", "{{#if a}}x"));
        let err = registry.render_card("broken", &json!({}), &catalog()).unwrap_err();
        match err {
            CardError::Parse { template_id, source } => {
                assert_eq!(template_id, "broken");
                assert_eq!(source.offset, 0);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parsed_templates_are_cached() {
        let registry = TemplateRegistry::new(MemoryStore::new().with("t", "{{a}}"));
        let first = registry.parsed("t").unwrap();
        let second = registry.parsed("t").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cache().len(), 1);

        registry.cache().clear();
        assert!(registry.cache().is_empty());
    }

    #[test]
    fn test_render_card_resolves_icons() {
        let store = MemoryStore::new().with("t", "{{#each icons}}{{id}};{{/each}}");
        let registry = TemplateRegistry::new(store);
        let entity = json!({"communication": [{"type": "telefon", "value": "555"}]});

        let result = registry.render_card("t", &entity, &catalog()).unwrap();
        assert_eq!(result.output, "qr;telefon;");
    }

    #[test]
    fn test_render_card_accepts_legacy_tip() {
        let store = MemoryStore::new()
            .with("t", "{{#each communication}}{{type}}{{/each}}|{{#each icons}}{{id}};{{/each}}");
        let registry = TemplateRegistry::new(store);
        let entity = json!({"communication": [{"tip": "telefon", "value": "555"}]});

        let result = registry.render_card("t", &entity, &catalog()).unwrap();
        assert_eq!(result.output, "telefon|qr;telefon;");
    }

    #[test]
    fn test_render_card_strict() {
        let store = MemoryStore::new().with("t", "{{tax_info}}");
        let entity = json!({"tax_info": {"tax_office": "Konak"}});

        let lenient = TemplateRegistry::new(store.clone());
        assert_eq!(lenient.render_card("t", &entity, &catalog()).unwrap().warnings.len(), 1);

        let strict = TemplateRegistry::new(store).with_strict(true);
        match strict.render_card("t", &entity, &catalog()) {
            Err(CardError::Strict { warnings, .. }) => assert_eq!(warnings.len(), 1),
            other => panic!("expected strict failure, got {:?}", other.map(|r| r.output)),
        }
    }

    #[test]
    fn test_data_shape_warnings_are_reported() {
        let registry = TemplateRegistry::new(MemoryStore::new().with("t", "ok"));
        let entity = json!({"communication": "not a list"});
        let result = registry.render_card("t", &entity, &catalog()).unwrap();
        assert_eq!(result.output, "ok");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<TemplateRegistry>();
    }
}
