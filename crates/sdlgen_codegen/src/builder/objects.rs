use crate::config::{Config, TypeBinder};
use crate::data::{Field, FieldArgument, Interface, Object};
use crate::error::Result;
use sdlgen_schema::{ArgumentDefinition, Definition, FieldDefinition, Schema};

/// Builds an object or input object.
///
/// Root objects may lack a model. Their fields are resolvers unless they
/// are introspection or internal machinery.
pub(super) fn build_object(
    config: &Config,
    schema: &Schema,
    def: &Definition,
    binder: &dyn TypeBinder,
) -> Result<Object> {
    let root = is_schema_root(schema, &def.name) || config.models.is_root(&def.name);
    let model = match binder.bind(&def.name) {
        Ok(model) => Some(model),
        Err(_) if root => None,
        Err(err) => return Err(err),
    };

    let fields = def
        .fields
        .iter()
        .map(|field| build_field(config, def, field, root, binder))
        .collect::<Result<Vec<_>>>()?;

    Ok(Object {
        name: def.name.clone(),
        kind: def.kind,
        description: def.description.clone(),
        fields,
        implements: schema.get_implements(&def.name).to_vec(),
        root,
        directives: def.directives.clone(),
        model,
        builtin: def.builtin,
    })
}

fn build_field(
    config: &Config,
    def: &Definition,
    field: &FieldDefinition,
    root: bool,
    binder: &dyn TypeBinder,
) -> Result<Field> {
    let target = format!("{}.{}", def.name, field.name);
    let type_reference = binder
        .resolve(&field.ty)
        .map_err(|err| err.in_target(&target))?;
    let arguments = field
        .arguments
        .iter()
        .map(|arg| build_argument(arg, &target, binder))
        .collect::<Result<Vec<_>>>()?;
    let is_resolver = config.models.is_resolver(&def.name, &field.name)
        || (root && !field.internal && !field.is_introspection());

    Ok(Field {
        name: field.name.clone(),
        description: field.description.clone(),
        type_reference,
        arguments,
        directives: field.directives.clone(),
        is_resolver,
        internal: field.internal,
    })
}

pub(super) fn build_argument(
    arg: &ArgumentDefinition,
    owner: &str,
    binder: &dyn TypeBinder,
) -> Result<FieldArgument> {
    let type_reference = binder
        .resolve(&arg.ty)
        .map_err(|err| err.in_target(format!("{owner}({}:)", arg.name)))?;
    Ok(FieldArgument {
        name: arg.name.clone(),
        type_reference,
        default_value: arg.default_value.clone(),
    })
}

pub(super) fn build_interface(schema: &Schema, def: &Definition, binder: &dyn TypeBinder) -> Interface {
    Interface {
        name: def.name.clone(),
        kind: def.kind,
        description: def.description.clone(),
        implementors: schema.get_possible_types(&def.name).to_vec(),
        model: binder.bind(&def.name).ok(),
    }
}

fn is_schema_root(schema: &Schema, name: &str) -> bool {
    [&schema.query, &schema.mutation, &schema.subscription]
        .into_iter()
        .any(|root| root.as_deref() == Some(name))
}
