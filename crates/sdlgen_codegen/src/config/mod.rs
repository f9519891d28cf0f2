//! Generator configuration.
//!
//! A config is usually read from `sdlgen.toml`:
//!
//! ```toml
//! schema = ["schema/products.graphql"]
//! federated = true
//!
//! [exec]
//! filename = "src/generated/exec.rs"
//! package = "generated"
//!
//! [models.Product]
//! model = "crate::model::Product"
//!
//! [models.Query.fields.topProducts]
//! resolver = true
//! ```
//!
//! Schema files are read once by [`Config::read_sources`]. Plugins may add
//! further in-memory sources through [`Config::additional_sources`]; those
//! load ahead of the user's schema.

mod binder;

pub use binder::{Binder, TargetType, TypeBinder, TypeReference, ValueKind};

use crate::error::{CodegenError, Result};
use indexmap::IndexMap;
use miette::{NamedSource, SourceSpan};
use sdlgen_schema::prelude::BUILTIN_SCALARS;
use sdlgen_schema::{load_schema, DefinitionKind, Schema, SchemaLoadError, Source};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file name.
pub const CONFIG_FILENAME: &str = "sdlgen.toml";

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema files, relative to the config file.
    #[serde(default, deserialize_with = "one_or_many")]
    pub schema: Vec<PathBuf>,
    /// Enables the federation plugin.
    #[serde(default)]
    pub federated: bool,
    #[serde(default)]
    pub exec: ExecConfig,
    /// Module that autobound models live in.
    #[serde(default = "default_model_package")]
    pub model_package: String,
    /// Module the generated code imports its runtime support from.
    #[serde(default = "default_runtime_package")]
    pub runtime_package: String,
    #[serde(default)]
    pub models: TypeMap,

    /// Sources injected by plugins, loaded before the user's schema.
    #[serde(skip)]
    pub additional_sources: Vec<Source>,
    /// The user's schema sources.
    #[serde(skip)]
    pub sources: Vec<Source>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: Vec::new(),
            federated: false,
            exec: ExecConfig::default(),
            model_package: default_model_package(),
            runtime_package: default_runtime_package(),
            models: TypeMap::default(),
            additional_sources: Vec::new(),
            sources: Vec::new(),
            base_dir: PathBuf::from("."),
        }
    }
}

fn default_model_package() -> String {
    "crate::model".to_string()
}

fn default_runtime_package() -> String {
    "crate::runtime".to_string()
}

/// Where the generated executable code goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    pub filename: PathBuf,
    pub package: String,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::from("generated/exec.rs"),
            package: "generated".to_string(),
        }
    }
}

impl ExecConfig {
    /// The directory generated files are written into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.filename.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Per-type model configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeMapEntry {
    /// Candidate model paths. The first one is bound.
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub model: Vec<String>,
    /// Resolved through the root resolver set instead of a model value.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub root: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, TypeMapField>,
}

impl TypeMapEntry {
    pub fn model(path: impl Into<String>) -> Self {
        Self {
            model: vec![path.into()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_model(&self) -> bool {
        !self.model.is_empty()
    }
}

/// Per-field configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeMapField {
    /// The field is computed by a resolver method.
    pub resolver: bool,
}

/// Schema type name to model configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeMap(IndexMap<String, TypeMapEntry>);

impl TypeMap {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeMapEntry> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeMapEntry> {
        self.0.get_mut(name)
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Whether `name` has at least one model path bound.
    #[must_use]
    pub fn has_model(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(TypeMapEntry::has_model)
    }

    /// Returns the entry for `name`, creating an empty one if needed.
    pub fn entry(&mut self, name: &str) -> &mut TypeMapEntry {
        self.0.entry(name.to_string()).or_default()
    }

    /// Appends a model path to `name`'s candidates.
    pub fn add(&mut self, name: &str, model: impl Into<String>) {
        self.entry(name).model.push(model.into());
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: TypeMapEntry) {
        self.0.insert(name.into(), entry);
    }

    /// Whether `type_name.field` is configured as a resolver.
    #[must_use]
    pub fn is_resolver(&self, type_name: &str, field: &str) -> bool {
        self.0
            .get(type_name)
            .and_then(|entry| entry.fields.get(field))
            .is_some_and(|f| f.resolver)
    }

    #[must_use]
    pub fn is_root(&self, type_name: &str) -> bool {
        self.0.get(type_name).is_some_and(|entry| entry.root)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TypeMapEntry)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Config {
    /// Loads a config file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CodegenError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, &path.display().to_string())?;
        config.base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(config)
    }

    /// Parses config text. `filename` is only used for error reporting.
    pub fn parse(content: &str, filename: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| CodegenError::ConfigParse {
            span: source.span().map(SourceSpan::from),
            src: NamedSource::new(filename, content.to_string()),
            source,
        })
    }

    /// Adds an in-memory user source.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, input: impl Into<String>) -> Self {
        self.sources.push(Source::new(name, input));
        self
    }

    /// Validates paths and module names.
    pub fn check(&self) -> Result<()> {
        if self.schema.is_empty() && self.sources.is_empty() {
            return Err(CodegenError::validation("no schema sources configured"));
        }
        if self.exec.filename.extension().and_then(|ext| ext.to_str()) != Some("rs") {
            return Err(CodegenError::validation(format!(
                "exec.filename '{}' must name a .rs file",
                self.exec.filename.display()
            )));
        }
        if !is_identifier(&self.exec.package) {
            return Err(CodegenError::validation(format!(
                "exec.package '{}' is not a valid module name",
                self.exec.package
            )));
        }
        for (key, path) in [
            ("model_package", &self.model_package),
            ("runtime_package", &self.runtime_package),
        ] {
            if !is_path(path) {
                return Err(CodegenError::validation(format!(
                    "{key} '{path}' is not a valid module path"
                )));
            }
        }
        for (name, entry) in self.models.iter() {
            if let Some(model) = entry.model.iter().find(|model| !is_path(model)) {
                return Err(CodegenError::validation(format!(
                    "models.{name}: '{model}' is not a valid type path"
                )));
            }
        }
        Ok(())
    }

    /// Reads configured schema files into [`Config::sources`]. Files that
    /// were already read are skipped.
    pub fn read_sources(&mut self) -> Result<()> {
        for path in &self.schema {
            let full = self.base_dir.join(path);
            let name = path.display().to_string();
            if self.sources.iter().any(|source| source.name == name) {
                continue;
            }
            let input = std::fs::read_to_string(&full)
                .map_err(|source| SchemaLoadError::Read { path: full, source })?;
            debug!(file = %name, "read schema source");
            self.sources.push(Source::new(name, input));
        }
        Ok(())
    }

    /// All sources in load order: plugin-injected first, then the user's.
    #[must_use]
    pub fn all_sources(&self) -> Vec<Source> {
        self.additional_sources
            .iter()
            .chain(&self.sources)
            .cloned()
            .collect()
    }

    /// Loads the schema graph from every source.
    pub fn load_schema(&self) -> Result<Schema> {
        Ok(load_schema(&self.all_sources())?)
    }

    /// Binds every unbound type to a model of the same name in
    /// [`Config::model_package`].
    ///
    /// Introspection types are left to [`Config::inject_builtins`] and root
    /// types need no model. Custom scalars have no conventional model and
    /// must be configured.
    pub fn autobind(&mut self, schema: &Schema) -> Result<()> {
        for def in schema.types.values() {
            if def.name.starts_with("__")
                || self.models.has_model(&def.name)
                || self.models.is_root(&def.name)
            {
                continue;
            }
            if def.kind == DefinitionKind::Scalar {
                if BUILTIN_SCALARS.contains(&def.name.as_str()) {
                    continue;
                }
                return Err(CodegenError::Autobind {
                    type_name: def.name.clone(),
                    reason: "custom scalars need an explicit model".to_string(),
                });
            }
            let model = format!("{}::{}", self.model_package, def.name);
            debug!(type_name = %def.name, %model, "autobind");
            self.models.add(&def.name, model);
        }
        Ok(())
    }

    /// Binds builtin scalars and introspection types that are still unbound.
    pub fn inject_builtins(&mut self) {
        let introspection = format!("{}::introspection", self.runtime_package);
        let builtins = [
            ("String", "String".to_string()),
            ("ID", "String".to_string()),
            ("Int", "i32".to_string()),
            ("Float", "f64".to_string()),
            ("Boolean", "bool".to_string()),
            ("__Schema", format!("{introspection}::Schema")),
            ("__Type", format!("{introspection}::Type")),
            ("__Field", format!("{introspection}::Field")),
            ("__InputValue", format!("{introspection}::InputValue")),
            ("__EnumValue", format!("{introspection}::EnumValue")),
            ("__Directive", format!("{introspection}::Directive")),
            ("__TypeKind", "String".to_string()),
            ("__DirectiveLocation", "String".to_string()),
        ];
        for (name, model) in builtins {
            if !self.models.has_model(name) {
                self.models.add(name, model);
            }
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A `::`-separated Rust path.
fn is_path(s: &str) -> bool {
    s.split("::").all(is_identifier)
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(
            r#"
            schema = "schema.graphql"
            federated = true

            [exec]
            filename = "src/generated/exec.rs"
            package = "generated"

            [models.Product]
            model = ["crate::shop::Product", "crate::model::Product"]

            [models.Query.fields.topProducts]
            resolver = true
            "#,
            CONFIG_FILENAME,
        )
        .unwrap();

        assert_eq!(config.schema, [PathBuf::from("schema.graphql")]);
        assert!(config.federated);
        assert_eq!(config.exec.dir(), Path::new("src/generated"));
        assert_eq!(config.model_package, "crate::model");
        assert_eq!(
            config.models.get("Product").map(|e| e.model.as_slice()),
            Some(["crate::shop::Product".to_string(), "crate::model::Product".to_string()].as_slice())
        );
        assert!(config.models.is_resolver("Query", "topProducts"));
        assert!(!config.models.is_resolver("Query", "other"));
        config.check().unwrap();
    }

    #[test]
    fn test_parse_error_has_span() {
        let err = Config::parse("federated = \"yes\"", CONFIG_FILENAME).unwrap_err();
        match err {
            CodegenError::ConfigParse { span, .. } => assert!(span.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("schemas = []", CONFIG_FILENAME).is_err());
    }

    #[test]
    fn test_check() {
        let config = Config::default();
        assert!(matches!(
            config.check(),
            Err(CodegenError::ConfigValidation { .. })
        ));

        let mut config = Config::default().with_source("schema.graphql", "type Query { a: Int }");
        config.check().unwrap();

        config.exec.filename = PathBuf::from("exec.go");
        assert!(config.check().is_err());

        config.exec.filename = PathBuf::from("exec.rs");
        config.models.insert("Thing", TypeMapEntry::model("crate::bad path::Thing"));
        assert!(config.check().is_err());
    }

    #[test]
    fn test_autobind_and_builtins() {
        let mut config = Config::default().with_source(
            "schema.graphql",
            "type Query { product: Product }\ntype Product { upc: String! }\nscalar Time",
        );
        config.models.insert("Time", TypeMapEntry::model("chrono::DateTime"));
        let schema = config.load_schema().unwrap();

        config.autobind(&schema).unwrap();
        config.inject_builtins();

        let model = |name: &str| config.models.get(name).and_then(|e| e.model.first().cloned());
        assert_eq!(model("Product").as_deref(), Some("crate::model::Product"));
        assert_eq!(model("Time").as_deref(), Some("chrono::DateTime"));
        assert_eq!(model("Int").as_deref(), Some("i32"));
        assert_eq!(
            model("__Schema").as_deref(),
            Some("crate::runtime::introspection::Schema")
        );
    }

    #[test]
    fn test_autobind_rejects_unbound_scalar() {
        let config = Config::default().with_source("schema.graphql", "type Query { t: Time }\nscalar Time");
        let schema = config.load_schema().unwrap();
        let mut config = config;
        let err = config.autobind(&schema).unwrap_err();
        assert!(matches!(err, CodegenError::Autobind { ref type_name, .. } if type_name == "Time"));
    }

    #[test]
    fn test_read_sources_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("schema.graphql"), "type Query { a: Int }").unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "schema = [\"schema.graphql\"]\n",
        )
        .unwrap();

        let mut config = Config::load(dir.path().join(CONFIG_FILENAME)).unwrap();
        config.read_sources().unwrap();
        config.read_sources().unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, "schema.graphql");
    }

    #[test]
    fn test_missing_schema_file() {
        let mut config = Config {
            schema: vec![PathBuf::from("missing.graphql")],
            ..Config::default()
        };
        let err = config.read_sources().unwrap_err();
        assert!(matches!(
            err,
            CodegenError::SchemaLoad(SchemaLoadError::Read { .. })
        ));
    }
}
