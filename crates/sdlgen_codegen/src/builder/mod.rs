//! Builds the [`Data`] IR from a loaded schema.
//!
//! Synthesized fields (introspection and federation) are added to the schema
//! graph first, and objects are then built from that final graph, so every
//! IR object mirrors its schema definition field for field.

mod directives;
pub mod entity;
pub mod federation;
pub mod introspection;
mod objects;

use crate::config::{Config, TypeBinder, TypeReference};
use crate::data::{Data, Objects};
use crate::error::{CodegenError, Result};
use sdlgen_schema::{
    print_schema, print_schema_with_options, DefinitionKind, PrintOptions, Schema,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the single entry in [`Data::schema_str`].
pub const SCHEMA_SOURCE_NAME: &str = "schema.graphql";

/// Builds the IR.
///
/// The binder must be able to bind every type the schema references.
pub fn build(config: &Config, mut schema: Schema, binder: &dyn TypeBinder) -> Result<Data> {
    let query_root = schema
        .query_definition()
        .filter(|def| def.kind == DefinitionKind::Object)
        .map(|def| def.name.clone())
        .ok_or(CodegenError::MissingQueryRoot)?;

    let mut entities = if config.federated {
        entity::collect_entities(&schema)?
    } else {
        Vec::new()
    };

    introspection::inject(&mut schema);
    if config.federated {
        federation::synthesize(&mut schema, &entities);
    }

    let directives = directives::build(&schema, binder)?;
    directives::validate_applications(&schema)?;

    let mut objects = Objects::default();
    let mut inputs = Objects::default();
    let mut interfaces = BTreeMap::new();
    for def in schema.types.values() {
        match def.kind {
            DefinitionKind::Object => objects.push(objects::build_object(config, &schema, def, binder)?),
            DefinitionKind::InputObject => {
                inputs.push(objects::build_object(config, &schema, def, binder)?);
            }
            DefinitionKind::Interface | DefinitionKind::Union => {
                interfaces.insert(def.name.clone(), objects::build_interface(&schema, def, binder));
            }
            DefinitionKind::Scalar | DefinitionKind::Enum => {}
        }
    }

    entity::bind_entities(&mut entities, &objects)?;

    let mut referenced_types: BTreeMap<String, TypeReference> = BTreeMap::new();
    let object_refs = objects.iter().chain(inputs.iter()).flat_map(|object| {
        object.fields.iter().flat_map(|field| {
            std::iter::once(&field.type_reference)
                .chain(field.arguments.iter().map(|arg| &arg.type_reference))
        })
    });
    let directive_refs = directives
        .values()
        .flat_map(|d| d.arguments.iter().map(|arg| &arg.type_reference));
    for reference in object_refs.chain(directive_refs) {
        referenced_types
            .entry(reference.gql.clone())
            .or_insert_with(|| reference.clone());
    }

    objects.sort_by_name();
    inputs.sort_by_name();

    let sdl = print_schema(&schema);
    let full = print_schema_with_options(
        &schema,
        &PrintOptions {
            include_internal: true,
            ..PrintOptions::default()
        },
    );
    let schema_str = BTreeMap::from([(SCHEMA_SOURCE_NAME.to_string(), full)]);

    debug!(
        objects = objects.len(),
        inputs = inputs.len(),
        interfaces = interfaces.len(),
        entities = entities.len(),
        "built IR"
    );

    let mutation_root = schema.mutation_definition().map(|def| def.name.clone());
    let subscription_root = schema.subscription_definition().map(|def| def.name.clone());

    Ok(Data {
        config: config.clone(),
        schema,
        directives,
        objects,
        inputs,
        interfaces,
        referenced_types,
        entities,
        sdl,
        schema_str,
        query_root,
        mutation_root,
        subscription_root,
    })
}
