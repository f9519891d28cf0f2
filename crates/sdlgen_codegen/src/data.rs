//! The intermediate representation handed to code generators.

use crate::config::{Config, TargetType, TypeReference};
use sdlgen_schema::{DefinitionKind, DirectiveApplication, DirectiveLocation, Schema, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything a generator needs, built once per run.
#[derive(Debug, Clone)]
pub struct Data {
    /// The config after every plugin and autobind ran.
    pub config: Config,
    /// The final schema graph, synthesized fields included.
    pub schema: Schema,
    /// User-declared directives.
    pub directives: BTreeMap<String, Directive>,
    pub objects: Objects,
    pub inputs: Objects,
    pub interfaces: BTreeMap<String, Interface>,
    /// Every type reference used by a field or argument, keyed by its
    /// schema spelling.
    pub referenced_types: BTreeMap<String, TypeReference>,
    /// Federation entities, sorted by type name.
    pub entities: Vec<Entity>,
    /// The published schema text.
    pub sdl: String,
    /// Source name to schema text, internal fields included.
    pub schema_str: BTreeMap<String, String>,
    pub(crate) query_root: String,
    pub(crate) mutation_root: Option<String>,
    pub(crate) subscription_root: Option<String>,
}

impl Data {
    #[must_use]
    pub fn query_root(&self) -> Option<&Object> {
        self.objects.by_name(&self.query_root)
    }

    #[must_use]
    pub fn mutation_root(&self) -> Option<&Object> {
        self.mutation_root
            .as_deref()
            .and_then(|name| self.objects.by_name(name))
    }

    #[must_use]
    pub fn subscription_root(&self) -> Option<&Object> {
        self.subscription_root
            .as_deref()
            .and_then(|name| self.objects.by_name(name))
    }
}

/// An object or input object.
#[derive(Debug, Clone, Serialize)]
pub struct Object {
    pub name: String,
    #[serde(skip)]
    pub kind: DefinitionKind,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub implements: Vec<String>,
    /// Resolved through the root resolver set.
    pub root: bool,
    #[serde(skip)]
    pub directives: Vec<DirectiveApplication>,
    /// The bound model. Root objects may have none.
    pub model: Option<TargetType>,
    pub builtin: bool,
}

impl Object {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Fields that need a resolver method.
    pub fn resolver_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_resolver)
    }
}

/// A list of objects with name lookup.
#[derive(Debug, Clone, Default)]
pub struct Objects(Vec<Object>);

impl Objects {
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Object> {
        self.0.iter().find(|o| o.name == name)
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Object> {
        self.0.iter_mut().find(|o| o.name == name)
    }

    pub fn push(&mut self, object: Object) {
        self.0.push(object);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
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

    pub(crate) fn sort_by_name(&mut self) {
        self.0.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

impl<'a> IntoIterator for &'a Objects {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A field of an object or input object.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub type_reference: TypeReference,
    pub arguments: Vec<FieldArgument>,
    #[serde(skip)]
    pub directives: Vec<DirectiveApplication>,
    pub is_resolver: bool,
    /// Omitted from the published schema.
    pub internal: bool,
}

/// A field or directive argument.
#[derive(Debug, Clone, Serialize)]
pub struct FieldArgument {
    pub name: String,
    pub type_reference: TypeReference,
    #[serde(skip)]
    pub default_value: Option<Value>,
}

/// An interface or union, with the objects that satisfy it.
#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub name: String,
    #[serde(skip)]
    pub kind: DefinitionKind,
    pub description: Option<String>,
    pub implementors: Vec<String>,
    pub model: Option<TargetType>,
}

/// A directive declaration with bound argument types.
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<FieldArgument>,
    pub locations: Vec<DirectiveLocation>,
    pub repeatable: bool,
}

/// A federation entity: an object carrying a single-field `@key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub name: String,
    /// The key field.
    pub field_name: String,
    /// The key field's schema type, e.g. `String!`.
    pub field_type_gql: String,
    /// `find<Type>By<Field>`.
    pub resolver_name: String,
    /// The key field's binding, filled in once the IR is built.
    pub field_type: Option<TargetType>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        field_name: impl Into<String>,
        field_type_gql: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let field_name = field_name.into();
        let resolver_name = resolver_name(&name, &field_name);
        Self {
            name,
            field_name,
            field_type_gql: field_type_gql.into(),
            resolver_name,
            field_type: None,
        }
    }

    /// The resolver argument type: the key field's type, non-null.
    ///
    /// A representation always carries its key, so the resolver never
    /// receives an absent one.
    #[must_use]
    pub fn key_argument_type(&self) -> String {
        format!("{}!", self.field_type_gql.trim_end_matches('!'))
    }
}

/// `find` + type name + `By` + field name with its first letter upper-cased.
#[must_use]
pub fn resolver_name(type_name: &str, field_name: &str) -> String {
    let mut chars = field_name.chars();
    let field = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
        .unwrap_or_default();
    format!("find{type_name}By{field}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_name() {
        assert_eq!(resolver_name("Product", "upc"), "findProductByUpc");
        assert_eq!(resolver_name("User", "id"), "findUserById");
        assert_eq!(resolver_name("User", "ID"), "findUserByID");
    }

    #[test]
    fn test_entity_new() {
        let entity = Entity::new("Product", "upc", "String!");
        assert_eq!(entity.resolver_name, "findProductByUpc");
        assert!(entity.field_type.is_none());
        assert_eq!(entity.key_argument_type(), "String!");
        assert_eq!(Entity::new("Review", "id", "ID").key_argument_type(), "ID!");
    }
}
