//! Federation schema synthesis.
//!
//! Adds the `_Entity` union, the `_Service` type and the `_entities` and
//! `_service` query fields. Everything here is idempotent, so the builder
//! and the federation plugin can both run it.

use crate::data::Entity;
use sdlgen_schema::{ArgumentDefinition, Definition, DefinitionKind, FieldDefinition, Schema, TypeRef};

pub const ENTITY_UNION: &str = "_Entity";
pub const SERVICE_TYPE: &str = "_Service";
pub const ENTITIES_FIELD: &str = "_entities";
pub const SERVICE_FIELD: &str = "_service";

/// Synthesizes the federation types and query fields.
///
/// The union and the `_entities` field are only added when there is at
/// least one entity. `_service` is always added.
pub fn synthesize(schema: &mut Schema, entities: &[Entity]) {
    if !entities.is_empty() {
        let union = schema
            .types
            .entry(ENTITY_UNION.to_string())
            .or_insert_with(|| generated(DefinitionKind::Union, ENTITY_UNION));
        for entity in entities {
            if !union.types.contains(&entity.name) {
                union.types.push(entity.name.clone());
            }
        }
        for entity in entities {
            schema.add_possible_type(ENTITY_UNION, &entity.name);
            schema.add_implements(&entity.name, ENTITY_UNION);
        }
        ensure_query_field(schema, entities_field());
    }

    schema.types.entry(SERVICE_TYPE.to_string()).or_insert_with(|| {
        let mut service = generated(DefinitionKind::Object, SERVICE_TYPE);
        service
            .fields
            .push(FieldDefinition::new("sdl", TypeRef::non_null_named("String")));
        service
    });
    ensure_query_field(schema, service_field());
}

/// `_entities(representations: [_Any!]!): [_Entity]!`
#[must_use]
pub fn entities_field() -> FieldDefinition {
    FieldDefinition::new(ENTITIES_FIELD, TypeRef::non_null_list(TypeRef::named(ENTITY_UNION)))
        .with_argument(ArgumentDefinition::new(
            "representations",
            TypeRef::non_null_list(TypeRef::non_null_named("_Any")),
        ))
        .internal()
}

/// `_service: _Service!`
#[must_use]
pub fn service_field() -> FieldDefinition {
    FieldDefinition::new(SERVICE_FIELD, TypeRef::non_null_named(SERVICE_TYPE)).internal()
}

fn generated(kind: DefinitionKind, name: &str) -> Definition {
    let mut def = Definition::new(kind, name);
    def.builtin = true;
    def
}

fn ensure_query_field(schema: &mut Schema, field: FieldDefinition) {
    if let Some(query) = schema.query_definition_mut() {
        if !query.has_field(&field.name) {
            query.fields.push(field);
        }
    }
}
