//! Integration tests driving the pipeline through the public API.

use sdlgen_codegen::builder::SCHEMA_SOURCE_NAME;
use sdlgen_codegen::federation::{DispatchError, Map};
use sdlgen_codegen::{
    CodegenError, Config, Federation, FederationRuntime, Generation, Pipeline, Plugin,
    SchemaMutator, CONFIG_FILENAME,
};
use sdlgen_schema::{FieldDefinition, Schema, TypeRef};

const ACCOUNTS: &str = r#"
type Query {
  me: User
}

type User @key(fields: "id") {
  id: ID!
  username: String
}
"#;

fn representation(value: serde_json::Value) -> Map {
    value.as_object().cloned().unwrap()
}

/// Federated schema from disk through to request-time dispatch.
#[test]
fn test_federated_project_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("accounts.graphql"), ACCOUNTS).unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILENAME),
        r#"
schema = ["accounts.graphql"]
federated = true

[exec]
filename = "src/generated/exec.rs"
package = "generated"
"#,
    )
    .unwrap();

    let config = Config::load(dir.path().join(CONFIG_FILENAME)).unwrap();
    let generation = Pipeline::for_config(&config).run(config).unwrap();
    let written = generation.write().unwrap();
    assert_eq!(written, [dir.path().join("src/generated/service.rs")]);

    let service = std::fs::read_to_string(&written[0]).unwrap();
    assert!(service.starts_with("// Code generated by sdlgen. DO NOT EDIT.\n// Module: generated\n"));
    assert!(service.contains("\"User\" => {"));
    assert!(service.contains(".find_user_by_id(ctx, key)?;"));

    let runtime = FederationRuntime::new(&generation.data);
    let call = runtime
        .dispatch(&representation(serde_json::json!({ "__typename": "User", "id": "42" })))
        .unwrap();
    assert_eq!(call.resolver_name, "findUserById");
    assert_eq!(call.key, serde_json::json!("42"));

    let err = runtime
        .dispatch(&representation(serde_json::json!({ "__typename": "User", "id": 42 })))
        .unwrap_err();
    assert!(matches!(err, DispatchError::EntityTypeMismatch { .. }));

    assert_eq!(runtime.resolve_service().unwrap().sdl, generation.data.sdl);
    assert!(!generation.data.sdl.contains("_service"));
}

struct AddVersion;

impl Plugin for AddVersion {
    fn name(&self) -> &'static str {
        "add-version"
    }

    fn as_schema_mutator(&mut self) -> Option<&mut dyn SchemaMutator> {
        Some(self)
    }
}

impl SchemaMutator for AddVersion {
    fn mutate_schema(&mut self, schema: &mut Schema) -> sdlgen_codegen::Result<()> {
        let query = schema
            .query_definition_mut()
            .ok_or(CodegenError::MissingQueryRoot)?;
        query
            .fields
            .push(FieldDefinition::new("version", TypeRef::non_null_named("String")));
        Ok(())
    }
}

/// A user plugin's schema changes show up in the IR and the printed SDL.
#[test]
fn test_custom_schema_mutator() {
    let config = Config::default().with_source("schema.graphql", "type Query { hello: String }\n");
    let generation = Pipeline::new().plugin(AddVersion).run(config).unwrap();

    let query = generation.data.query_root().unwrap();
    let version = query.field("version").unwrap();
    assert!(version.is_resolver);
    assert_eq!(version.type_reference.rust, "String");
    assert_eq!(
        generation.data.sdl,
        "type Query {\n  hello: String\n  version: String!\n}\n"
    );
    assert!(generation.renderer.is_empty());
}

/// Config problems surface before the schema is touched.
#[test]
fn test_invalid_config_aborts() {
    let mut config = Config::default().with_source("schema.graphql", "type Query { a: Int }\n");
    config.exec.package = "not a module".to_string();
    let err = Pipeline::for_config(&config).run(config).unwrap_err();
    assert!(matches!(err, CodegenError::ConfigValidation { .. }));
}

const PRODUCTS: &str = r#"
type Query {
  topProducts(first: Int = 5): [Product]
}

type Review @key(fields: "id") {
  id: Int!
  body: String
}

type Product @key(fields: "upc") {
  upc: String
  name: String
}
"#;

/// Registering the plugin by hand turns federation on for the IR as well.
#[test]
fn test_federation_plugin_without_federated_flag() {
    let config = Config::default().with_source("products.graphql", PRODUCTS);
    assert!(!config.federated);
    let generation = Pipeline::new()
        .plugin(Federation::new())
        .run(config)
        .unwrap();
    let data = &generation.data;
    assert!(data.config.federated);

    let entities: Vec<&str> = data.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(entities, ["Product", "Review"]);
    let mut members: Vec<&str> = data.interfaces["_Entity"]
        .implementors
        .iter()
        .map(String::as_str)
        .collect();
    members.sort_unstable();
    assert_eq!(members, entities);

    let call = FederationRuntime::new(data)
        .dispatch(&representation(serde_json::json!({ "__typename": "Product", "upc": "1" })))
        .unwrap();
    assert_eq!(call.resolver_name, "findProductByUpc");

    let service = generation.renderer.file("generated/service.rs").unwrap();
    assert!(service.contains(".find_product_by_upc(ctx, key)?;"));
}

/// A nullable key still reaches its resolver as a non-null argument.
#[test]
fn test_nullable_key_resolver_argument() {
    let config = Config::default().with_source("products.graphql", PRODUCTS);
    let generation = Pipeline::new()
        .plugin(Federation::new())
        .run(config)
        .unwrap();
    let full = &generation.data.schema_str[SCHEMA_SOURCE_NAME];
    assert!(full.contains("findProductByUpc(upc: String!): Product!"));
    assert!(full.contains("findReviewById(id: Int!): Review!"));
}

/// Two runs over the same input produce identical output.
#[test]
fn test_generation_is_deterministic() {
    let run = || {
        let config = Config {
            federated: true,
            ..Config::default()
        }
        .with_source("products.graphql", PRODUCTS)
        .with_source(
            "accounts.graphql",
            "type User @key(fields: \"id\") {\n  id: ID!\n}\n",
        );
        Pipeline::for_config(&config).run(config).unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(first.data.sdl, second.data.sdl);
    assert_eq!(first.data.schema_str, second.data.schema_str);
    assert_eq!(
        first.renderer.file("generated/service.rs"),
        second.renderer.file("generated/service.rs")
    );
    assert_eq!(first.data.entities, second.data.entities);

    let names = |g: &Generation| -> Vec<String> {
        g.data.objects.iter().map(|o| o.name.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
    let mut sorted = names(&first);
    sorted.sort();
    assert_eq!(names(&first), sorted);
}
