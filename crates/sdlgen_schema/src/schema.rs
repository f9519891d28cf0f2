//! The loaded schema graph.

use crate::types::{Definition, DirectiveDefinition, Source};
use indexmap::IndexMap;

/// A loaded, validated schema graph.
///
/// Type and directive maps keep declaration order: the prelude first, then
/// every source in load order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub types: IndexMap<String, Definition>,
    pub directives: IndexMap<String, DirectiveDefinition>,
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
    /// Abstract type name to the object types that satisfy it.
    pub possible_types: IndexMap<String, Vec<String>>,
    /// Type name to the interfaces and unions it belongs to.
    pub implements: IndexMap<String, Vec<String>>,
    /// The sources this schema was loaded from, prelude included.
    pub sources: Vec<Source>,
}

impl Schema {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.types.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Definition> {
        self.types.get_mut(name)
    }

    #[must_use]
    pub fn query_definition(&self) -> Option<&Definition> {
        self.query.as_deref().and_then(|name| self.types.get(name))
    }

    pub fn query_definition_mut(&mut self) -> Option<&mut Definition> {
        let name = self.query.as_deref()?;
        self.types.get_mut(name)
    }

    #[must_use]
    pub fn mutation_definition(&self) -> Option<&Definition> {
        self.mutation.as_deref().and_then(|name| self.types.get(name))
    }

    #[must_use]
    pub fn subscription_definition(&self) -> Option<&Definition> {
        self.subscription.as_deref().and_then(|name| self.types.get(name))
    }

    /// Registers `name` as a possible type of `abstract_type`.
    pub fn add_possible_type(&mut self, abstract_type: &str, name: &str) {
        push_unique(
            self.possible_types.entry(abstract_type.to_string()).or_default(),
            name,
        );
    }

    /// Records that `name` implements or belongs to `abstract_type`.
    pub fn add_implements(&mut self, name: &str, abstract_type: &str) {
        push_unique(
            self.implements.entry(name.to_string()).or_default(),
            abstract_type,
        );
    }

    #[must_use]
    pub fn get_possible_types(&self, abstract_type: &str) -> &[String] {
        self.possible_types
            .get(abstract_type)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn get_implements(&self, name: &str) -> &[String] {
        self.implements.get(name).map_or(&[], Vec::as_slice)
    }

    /// Whether the root operation names are the default ones, in which case
    /// the printer omits the `schema { }` block.
    #[must_use]
    pub fn has_default_roots(&self) -> bool {
        let is_default = |root: &Option<String>, default: &str| {
            root.as_deref().map_or(true, |name| name == default)
        };
        is_default(&self.query, "Query")
            && is_default(&self.mutation, "Mutation")
            && is_default(&self.subscription, "Subscription")
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DefinitionKind;

    #[test]
    fn test_possible_types_are_deduplicated() {
        let mut schema = Schema::default();
        schema.add_possible_type("_Entity", "Product");
        schema.add_possible_type("_Entity", "Product");
        schema.add_possible_type("_Entity", "Review");
        schema.add_implements("Product", "_Entity");
        schema.add_implements("Product", "_Entity");

        assert_eq!(schema.get_possible_types("_Entity"), ["Product", "Review"]);
        assert_eq!(schema.get_implements("Product"), ["_Entity"]);
        assert!(schema.get_possible_types("Node").is_empty());
    }

    #[test]
    fn test_default_roots() {
        let mut schema = Schema::default();
        schema.query = Some("Query".into());
        assert!(schema.has_default_roots());
        schema.query = Some("RootQuery".into());
        assert!(!schema.has_default_roots());
    }

    #[test]
    fn test_query_definition_mut() {
        let mut schema = Schema::default();
        schema
            .types
            .insert("Query".into(), Definition::new(DefinitionKind::Object, "Query"));
        schema.query = Some("Query".into());

        if let Some(query) = schema.query_definition_mut() {
            query.description = Some("root".into());
        }
        assert_eq!(
            schema.query_definition().and_then(|q| q.description.as_deref()),
            Some("root")
        );
    }
}
