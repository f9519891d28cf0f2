//! Introspection entry points on the query root.

use sdlgen_schema::{ArgumentDefinition, FieldDefinition, Schema, TypeRef};

/// Adds `__type(name: String!): __Type` and `__schema: __Schema` to the
/// query root. Fields that already exist are left alone.
pub fn inject(schema: &mut Schema) {
    let Some(query) = schema.query_definition_mut() else {
        return;
    };
    if !query.has_field("__type") {
        query.fields.push(
            FieldDefinition::new("__type", TypeRef::named("__Type"))
                .with_argument(ArgumentDefinition::new("name", TypeRef::non_null_named("String"))),
        );
    }
    if !query.has_field("__schema") {
        query
            .fields
            .push(FieldDefinition::new("__schema", TypeRef::named("__Schema")));
    }
}
