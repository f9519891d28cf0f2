//! Apollo Federation (v1) support.
//!
//! The [`Federation`] plugin:
//! - reserves the `_Service`, `_Any`, `_FieldSet` and `Entity` models
//! - injects the federation directives and scalars, and an `Entity` root
//!   type with one `find<Type>By<Field>` resolver per entity
//! - adds the `_Entity` union and the `_entities` and `_service` query fields
//! - renders `service.rs` next to the exec file
//!
//! [`FederationRuntime`] implements the same representation dispatch for
//! servers that route `_entities` calls dynamically.

mod runtime;

pub use runtime::{DispatchError, EntityCall, FederationRuntime, Map, Service};

use crate::builder::entity::{bind_entities, collect_entities};
use crate::builder::federation::{synthesize, SERVICE_TYPE};
use crate::config::{Config, TypeMapEntry, TypeMapField, ValueKind};
use crate::data::{Data, Entity};
use crate::error::{CodegenError, Result};
use crate::plugin::{CodeGenerator, ConfigMutator, Plugin, SchemaMutator, SourceInjector};
use crate::templates::{Options, Renderer};
use sdlgen_schema::{Schema, Source};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::{debug, warn};

pub const FEDERATION_SOURCE_NAME: &str = "federation/directives.graphql";
pub const ENTITY_SOURCE_NAME: &str = "federation/entity.graphql";
/// Root type holding the entity resolvers.
pub const ENTITY_ROOT: &str = "Entity";
/// Generated file name, placed next to the exec file.
pub const SERVICE_FILENAME: &str = "service.rs";

const FEDERATION_SOURCE: &str = r"scalar _Any
scalar _FieldSet

directive @external on FIELD_DEFINITION
directive @requires(fields: _FieldSet!) on FIELD_DEFINITION
directive @provides(fields: _FieldSet!) on FIELD_DEFINITION
directive @key(fields: _FieldSet!) on OBJECT | INTERFACE
directive @extends on OBJECT
";

const SERVICE_TEMPLATE: &str = include_str!("service.rs.tera");

/// The federation plugin.
#[derive(Debug, Default)]
pub struct Federation {
    entities: Vec<Entity>,
}

impl Federation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities found while injecting sources.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

impl Plugin for Federation {
    fn name(&self) -> &'static str {
        "federation"
    }

    fn as_config_mutator(&mut self) -> Option<&mut dyn ConfigMutator> {
        Some(self)
    }

    fn as_source_injector(&mut self) -> Option<&mut dyn SourceInjector> {
        Some(self)
    }

    fn as_schema_mutator(&mut self) -> Option<&mut dyn SchemaMutator> {
        Some(self)
    }

    fn as_code_generator(&mut self) -> Option<&mut dyn CodeGenerator> {
        Some(self)
    }
}

impl ConfigMutator for Federation {
    fn mutate_config(&mut self, config: &mut Config) -> Result<()> {
        let reserved = [
            (
                SERVICE_TYPE,
                Some(format!("{}::introspection::Service", config.runtime_package)),
            ),
            ("_Any", Some(format!("{}::Map", config.runtime_package))),
            ("_FieldSet", Some("String".to_string())),
            (ENTITY_ROOT, None),
        ];
        for (name, _) in &reserved {
            if config.models.exists(name) {
                return Err(CodegenError::validation(format!(
                    "{name} already exists which must be reserved when Federation is enabled"
                )));
            }
        }
        for (name, model) in reserved {
            if let Some(model) = model {
                config.models.insert(name, TypeMapEntry::model(model));
            }
        }
        config.federated = true;
        Ok(())
    }
}

impl SourceInjector for Federation {
    fn inject_sources(&mut self, config: &mut Config) -> Result<()> {
        if !has_source(config, FEDERATION_SOURCE_NAME) {
            config
                .additional_sources
                .push(Source::builtin(FEDERATION_SOURCE_NAME, FEDERATION_SOURCE));
        }

        let schema = config.load_schema()?;
        self.entities = collect_entities(&schema)?;
        if self.entities.is_empty() {
            warn!("federation is enabled but no type carries @key");
            return Ok(());
        }

        let root = config.models.entry(ENTITY_ROOT);
        root.root = true;
        for entity in &self.entities {
            root.fields
                .insert(entity.resolver_name.clone(), TypeMapField { resolver: true });
        }
        if !has_source(config, ENTITY_SOURCE_NAME) {
            config
                .additional_sources
                .push(Source::builtin(ENTITY_SOURCE_NAME, entity_source(&self.entities)));
        }
        debug!(entities = self.entities.len(), "injected entity resolvers");
        Ok(())
    }
}

impl SchemaMutator for Federation {
    fn mutate_schema(&mut self, schema: &mut Schema) -> Result<()> {
        synthesize(schema, &self.entities);
        Ok(())
    }
}

impl CodeGenerator for Federation {
    fn generate_code(&mut self, data: &Data, renderer: &mut Renderer) -> Result<()> {
        let mut entities = self.entities.clone();
        bind_entities(&mut entities, &data.objects)?;

        let runtime = &data.config.runtime_package;
        let mut imports = vec![
            format!("{runtime}::Context"),
            format!("{runtime}::ResolverError"),
            format!("{runtime}::introspection::Service"),
        ];
        if !entities.is_empty() {
            imports.push(format!("{runtime}::Map"));
            imports.push(format!("{}::_Entity", data.config.model_package));
        }

        let context = ServiceContext {
            sdl: &data.sdl,
            imports,
            entities: entities.iter().map(EntityArm::new).collect(),
        };
        renderer.render(Options {
            template: SERVICE_TEMPLATE,
            name: "federation/service.rs.tera",
            filename: data.config.exec.dir().join(SERVICE_FILENAME),
            package_name: &data.config.exec.package,
            data: &context,
        })
    }
}

fn has_source(config: &Config, name: &str) -> bool {
    config.additional_sources.iter().any(|s| s.name == name)
}

/// The `Entity` root type, one resolver field per entity.
fn entity_source(entities: &[Entity]) -> String {
    let mut out = String::from("type Entity {\n");
    for entity in entities {
        let _ = writeln!(
            out,
            "  {}({}: {}): {}!",
            entity.resolver_name,
            entity.field_name,
            entity.key_argument_type(),
            entity.name
        );
    }
    out.push_str("}\n");
    out
}

#[derive(Serialize)]
struct ServiceContext<'a> {
    sdl: &'a str,
    imports: Vec<String>,
    entities: Vec<EntityArm<'a>>,
}

/// One `match` arm of the generated `_entities` resolver.
#[derive(Serialize)]
struct EntityArm<'a> {
    name: &'a str,
    field_name: &'a str,
    resolver_name: &'a str,
    /// Converts a `serde_json::Value` named `value` into the key type.
    value_expr: String,
}

impl<'a> EntityArm<'a> {
    fn new(entity: &'a Entity) -> Self {
        let (kind, path) = entity
            .field_type
            .as_ref()
            .map_or((ValueKind::Other, "serde_json::Value"), |t| (t.kind, t.path.as_str()));
        let value_expr = match kind {
            ValueKind::String => "value.as_str().map(ToString::to_string)".to_string(),
            ValueKind::Int => format!("value.as_i64().and_then(|v| {path}::try_from(v).ok())"),
            ValueKind::Float => format!("value.as_f64().map(|v| v as {path})"),
            ValueKind::Boolean => "value.as_bool()".to_string(),
            ValueKind::Other => format!("serde_json::from_value::<{path}>(value.clone()).ok()"),
        };
        Self {
            name: &entity.name,
            field_name: &entity.field_name,
            resolver_name: &entity.resolver_name,
            value_expr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::federation::{ENTITIES_FIELD, ENTITY_UNION, SERVICE_FIELD};
    use crate::plugin::Pipeline;

    const PRODUCTS: &str = r#"
type Query {
  topProducts(first: Int = 5): [Product]
}

type Product @key(fields: "upc") {
  upc: String!
  name: String
  price: Int
}

type Review @key(fields: "id") {
  id: Int!
  body: String
}
"#;

    fn federated(input: &str) -> Config {
        Config {
            federated: true,
            ..Config::default()
        }
        .with_source("schema.graphql", input)
    }

    #[test]
    fn test_reserved_models() {
        let mut config = federated(PRODUCTS);
        config.models.insert("_Any", TypeMapEntry::model("crate::Any"));
        let err = Federation::new().mutate_config(&mut config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config: _Any already exists which must be reserved when Federation is enabled"
        );

        let mut config = Config::default().with_source("schema.graphql", PRODUCTS);
        Federation::new().mutate_config(&mut config).unwrap();
        assert!(config.federated);
        assert!(config.models.has_model("_Service"));
        assert!(config.models.has_model("_FieldSet"));
        assert!(!config.models.exists(ENTITY_ROOT));
    }

    #[test]
    fn test_inject_sources() {
        let mut config = federated(PRODUCTS);
        let mut plugin = Federation::new();
        plugin.inject_sources(&mut config).unwrap();
        plugin.inject_sources(&mut config).unwrap();

        assert_eq!(config.additional_sources.len(), 2);
        assert!(config.additional_sources.iter().all(|s| s.builtin));
        assert_eq!(
            config.additional_sources[1].input,
            "type Entity {\n  findProductByUpc(upc: String!): Product!\n  findReviewById(id: Int!): Review!\n}\n"
        );
        assert!(config.models.is_root(ENTITY_ROOT));
        assert!(config.models.is_resolver(ENTITY_ROOT, "findReviewById"));
        assert_eq!(plugin.entities().len(), 2);
    }

    #[test]
    fn test_no_entities() {
        let mut config = federated("type Query { hello: String }");
        let mut plugin = Federation::new();
        plugin.inject_sources(&mut config).unwrap();

        assert_eq!(config.additional_sources.len(), 1);
        assert!(!config.models.exists(ENTITY_ROOT));

        let generation = Pipeline::for_config(&config).run(config).unwrap();
        let query = generation.data.query_root().unwrap();
        assert!(query.has_field(SERVICE_FIELD));
        assert!(!query.has_field(ENTITIES_FIELD));
        assert!(generation.data.objects.by_name(ENTITY_ROOT).is_none());
    }

    #[test]
    fn test_pipeline_builds_federated_ir() {
        let config = federated(PRODUCTS);
        let generation = Pipeline::for_config(&config).run(config).unwrap();
        let data = &generation.data;

        let names: Vec<&str> = data.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Product", "Review"]);
        assert_eq!(
            data.entities[1].field_type.as_ref().map(|t| t.kind),
            Some(ValueKind::Int)
        );

        let entity_root = data.objects.by_name(ENTITY_ROOT).unwrap();
        assert!(entity_root.root);
        assert!(entity_root.model.is_none());
        assert!(entity_root.field("findProductByUpc").unwrap().is_resolver);

        let query = data.query_root().unwrap();
        let fields: Vec<&str> = query.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            fields,
            ["topProducts", "_entities", "_service", "__type", "__schema"]
        );
        assert!(!query.field(ENTITIES_FIELD).unwrap().is_resolver);

        assert_eq!(data.interfaces[ENTITY_UNION].implementors, ["Product", "Review"]);
        assert_eq!(data.objects.by_name("Product").unwrap().implements, [ENTITY_UNION]);
        assert!(data.referenced_types.contains_key("[_Any!]!"));
        assert!(data.referenced_types.contains_key("[_Entity]!"));
    }

    #[test]
    fn test_sdl_is_the_user_schema() {
        let config = federated(PRODUCTS);
        let generation = Pipeline::for_config(&config).run(config).unwrap();
        let data = &generation.data;

        insta::assert_snapshot!(data.sdl.trim_end(), @r#"
        type Product @key(fields: "upc") {
          upc: String!
          name: String
          price: Int
        }

        type Query {
          topProducts(first: Int = 5): [Product]
        }

        type Review @key(fields: "id") {
          id: Int!
          body: String
        }
        "#);

        let full = &data.schema_str[crate::builder::SCHEMA_SOURCE_NAME];
        assert!(full.contains("_entities(representations: [_Any!]!): [_Entity]!"));
        assert!(full.contains("_service: _Service!"));
        assert!(full.contains("union _Entity = Product | Review"));
        assert!(full.contains("directive @key(fields: _FieldSet!) on OBJECT | INTERFACE"));
        assert!(!full.contains("__schema"));
    }

    #[test]
    fn test_generated_service() {
        let config = federated(PRODUCTS);
        let generation = Pipeline::for_config(&config).run(config).unwrap();
        let service = generation
            .renderer
            .file(std::path::Path::new("generated").join(SERVICE_FILENAME))
            .unwrap();

        assert!(service.starts_with("// Code generated by sdlgen. DO NOT EDIT.\n// Module: generated\n"));
        assert!(service.contains("use crate::runtime::{Context, Map, ResolverError};"));
        assert!(service.contains("use crate::model::_Entity;"));
        assert!(service.contains("const SERVICE_SDL: &str = r#\"type Product @key(fields: \"upc\") {"));
        assert!(service.contains("\"federated introspection disabled\""));
        assert!(service.contains("\"__typename must be an existing string\""));
        assert!(service.contains(".find_product_by_upc(ctx, key)?;"));
        assert!(service.contains("list.push(Some(_Entity::Review(entity)));"));
        assert!(service.contains("value.as_i64().and_then(|v| i32::try_from(v).ok())"));
        assert!(service.contains("format!(\"unknown type: {other}\")"));
    }

    #[test]
    fn test_generated_service_without_entities() {
        let config = federated("type Query { hello: String }");
        let generation = Pipeline::for_config(&config).run(config).unwrap();
        let service = generation
            .renderer
            .file(std::path::Path::new("generated").join(SERVICE_FILENAME))
            .unwrap();

        assert!(service.contains("pub fn resolve_service"));
        assert!(!service.contains("resolve_entities"));
        assert!(!service.contains("_Entity"));
        assert!(service.ends_with("    }\n}\n"));
    }

    #[test]
    fn test_compound_key_fails_before_generation() {
        let config = federated(
            "type Query { a: Int }\ntype Product @key(fields: \"upc sku\") { upc: String! sku: String! }",
        );
        let err = Pipeline::for_config(&config).run(config).unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedKey { .. }));
    }
}
