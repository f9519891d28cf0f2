//! Federation entity discovery.

use crate::data::{Entity, Objects};
use crate::error::{CodegenError, Result};
use sdlgen_schema::{DefinitionKind, Schema, Value};

/// Collects every object carrying `@key`, sorted by type name.
///
/// Only single, non-list key fields are supported. The key field's binding
/// is left empty until [`bind_entities`] runs against the built IR.
pub fn collect_entities(schema: &Schema) -> Result<Vec<Entity>> {
    let mut entities = Vec::new();
    for def in schema.types.values() {
        if def.kind != DefinitionKind::Object {
            continue;
        }
        let Some(key) = def.directive("key") else {
            continue;
        };
        let fields = key
            .argument("fields")
            .and_then(Value::as_str)
            .ok_or_else(|| CodegenError::directive("key", &def.name, "`fields` must be a string"))?;

        let field_name = fields.trim();
        if field_name.is_empty() || field_name.contains(|c: char| c.is_whitespace() || c == '{') {
            return Err(CodegenError::UnsupportedKey {
                type_name: def.name.clone(),
                fields: fields.to_string(),
            });
        }
        let field = def
            .field(field_name)
            .ok_or_else(|| CodegenError::KeyFieldNotFound {
                type_name: def.name.clone(),
                field: field_name.to_string(),
            })?;
        if field.ty.is_list() {
            return Err(CodegenError::ListKeyField {
                type_name: def.name.clone(),
                field: field_name.to_string(),
                ty: field.ty.to_string(),
            });
        }

        entities.push(Entity::new(&def.name, field_name, field.ty.to_string()));
    }
    entities.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entities)
}

/// Fills in each entity's key field binding from the built objects.
pub fn bind_entities(entities: &mut [Entity], objects: &Objects) -> Result<()> {
    for entity in entities {
        let field = objects
            .by_name(&entity.name)
            .and_then(|object| object.field(&entity.field_name))
            .ok_or_else(|| CodegenError::KeyFieldNotFound {
                type_name: entity.name.clone(),
                field: entity.field_name.clone(),
            })?;
        entity.field_type = Some(field.type_reference.target.clone());
    }
    Ok(())
}
