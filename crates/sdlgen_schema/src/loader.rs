//! Loads schema sources into a validated [`Schema`] graph.
//!
//! Loading runs in fixed passes: parse every source (prelude first), collect
//! definitions, apply extensions, resolve root operations, link abstract
//! types, then validate type references.

use crate::error::{SchemaLoadError, SourceContext};
use crate::prelude::prelude;
use crate::schema::Schema;
use crate::types::{
    ArgumentDefinition, Definition, DefinitionKind, DirectiveApplication, DirectiveDefinition,
    EnumValueDefinition, FieldDefinition, Location, Source, TypeRef, Value,
};
use miette::NamedSource;
use sdlgen_core::{Interner, Span};
use sdlgen_syntax::ast;
use tracing::debug;

/// Loads a schema from the given sources on top of the builtin prelude.
///
/// # Errors
///
/// Returns the first syntax or validation error found.
pub fn load_schema(sources: &[Source]) -> Result<Schema, SchemaLoadError> {
    let mut all = Vec::with_capacity(sources.len() + 1);
    all.push(prelude());
    all.extend(sources.iter().cloned());

    let interner = Interner::new();
    let mut documents = Vec::with_capacity(all.len());
    for source in &all {
        let result = sdlgen_syntax::parse(&source.input, &interner);
        if let Some(diagnostic) = result.diagnostics.errors().next() {
            let (span, label) = diagnostic
                .primary_label()
                .map(|l| (l.span, l.message.clone()))
                .unwrap_or_default();
            return Err(SchemaLoadError::Syntax {
                src: NamedSource::new(&source.name, source.input.clone()),
                span: span.into(),
                message: format!("[{}] {}", diagnostic.code, diagnostic.title),
                label,
            });
        }
        documents.push(result.document);
    }

    let mut loader = Loader {
        interner: &interner,
        ctx: SourceContext::new(&all),
        sources: &all,
        schema: Schema::default(),
        schema_definitions: Vec::new(),
        schema_extensions: Vec::new(),
        type_extensions: Vec::new(),
    };

    for (index, document) in documents.iter().enumerate() {
        loader.collect(index, document)?;
    }
    loader.apply_type_extensions()?;
    loader.resolve_roots()?;
    loader.link_abstract_types();
    loader.validate()?;

    let mut schema = loader.schema;
    debug!(
        types = schema.types.len(),
        directives = schema.directives.len(),
        "schema loaded"
    );
    schema.sources = all;
    Ok(schema)
}

struct Loader<'a> {
    interner: &'a Interner,
    ctx: SourceContext<'a>,
    sources: &'a [Source],
    schema: Schema,
    schema_definitions: Vec<(usize, &'a ast::SchemaDefinition)>,
    schema_extensions: Vec<(usize, &'a ast::SchemaDefinition)>,
    type_extensions: Vec<(usize, &'a ast::TypeDefinition)>,
}

impl<'a> Loader<'a> {
    fn name(&self, name: ast::Name) -> String {
        self.interner.get(name.value)
    }

    fn location(source: usize, span: Span) -> Option<Location> {
        Some(Location { source, span })
    }

    fn collect(&mut self, source: usize, document: &'a ast::Document) -> Result<(), SchemaLoadError> {
        let builtin = self.sources[source].builtin;
        for definition in &document.definitions {
            match definition {
                ast::Definition::Schema(def) => self.schema_definitions.push((source, def)),
                ast::Definition::SchemaExtension(def) => self.schema_extensions.push((source, def)),
                ast::Definition::TypeExtension(def) => self.type_extensions.push((source, def)),
                ast::Definition::Type(def) => {
                    let lowered = self.lower_type_definition(source, def, builtin);
                    if self.schema.types.contains_key(&lowered.name) {
                        return Err(self.ctx.duplicate(
                            "type",
                            lowered.name,
                            lowered.location.as_ref(),
                        ));
                    }
                    self.schema.types.insert(lowered.name.clone(), lowered);
                }
                ast::Definition::Directive(def) => {
                    let lowered = self.lower_directive_definition(source, def, builtin);
                    if self.schema.directives.contains_key(&lowered.name) {
                        return Err(self.ctx.duplicate(
                            "directive",
                            lowered.name,
                            lowered.location.as_ref(),
                        ));
                    }
                    self.schema.directives.insert(lowered.name.clone(), lowered);
                }
            }
        }
        Ok(())
    }

    fn apply_type_extensions(&mut self) -> Result<(), SchemaLoadError> {
        for (source, extension) in std::mem::take(&mut self.type_extensions) {
            let ext = self.lower_type_definition(source, extension, false);
            let location = ext.location.clone();
            let Some(target) = self.schema.types.get_mut(&ext.name) else {
                return Err(self.ctx.invalid_extension(
                    ext.name,
                    "type is not defined",
                    location.as_ref(),
                ));
            };
            if target.kind != ext.kind {
                let reason = format!("it is {} {}, not {}", article(target.kind), target.kind, ext.kind);
                return Err(self.ctx.invalid_extension(ext.name, reason, location.as_ref()));
            }

            for interface in ext.interfaces {
                if !target.interfaces.contains(&interface) {
                    target.interfaces.push(interface);
                }
            }
            target.directives.extend(ext.directives);
            for field in ext.fields {
                if target.has_field(&field.name) {
                    let name = format!("{}.{}", target.name, field.name);
                    return Err(self.ctx.duplicate("field", name, field.location.as_ref()));
                }
                target.fields.push(field);
            }
            for value in ext.enum_values {
                if target.enum_values.iter().any(|v| v.name == value.name) {
                    let name = format!("{}.{}", target.name, value.name);
                    return Err(self.ctx.duplicate("enum value", name, location.as_ref()));
                }
                target.enum_values.push(value);
            }
            for member in ext.types {
                if !target.types.contains(&member) {
                    target.types.push(member);
                }
            }
        }
        Ok(())
    }

    fn resolve_roots(&mut self) -> Result<(), SchemaLoadError> {
        if let Some((source, extra)) = self.schema_definitions.get(1) {
            return Err(self.ctx.duplicate(
                "schema definition",
                "schema",
                Self::location(*source, extra.span).as_ref(),
            ));
        }

        let explicit = self
            .schema_definitions
            .iter()
            .chain(self.schema_extensions.iter())
            .copied()
            .collect::<Vec<_>>();

        if self.schema_definitions.is_empty() {
            for (slot, default) in [
                (&mut self.schema.query, "Query"),
                (&mut self.schema.mutation, "Mutation"),
                (&mut self.schema.subscription, "Subscription"),
            ] {
                if self.schema.types.contains_key(default) {
                    *slot = Some(default.to_string());
                }
            }
        }

        for (source, def) in explicit {
            for operation in &def.operations {
                let name = self.name(operation.type_name);
                let location = Self::location(source, operation.span);
                let slot = match operation.operation {
                    ast::OperationType::Query => &mut self.schema.query,
                    ast::OperationType::Mutation => &mut self.schema.mutation,
                    ast::OperationType::Subscription => &mut self.schema.subscription,
                };
                if slot.as_ref().is_some_and(|existing| *existing != name) && !self.schema_definitions.is_empty() {
                    return Err(self.ctx.duplicate(
                        "root operation",
                        operation.operation.as_str(),
                        location.as_ref(),
                    ));
                }
                *slot = Some(name.clone());

                match self.schema.types.get(&name) {
                    None => {
                        return Err(self.ctx.undefined_type(
                            name,
                            format!("the {} root", operation.operation.as_str()),
                            location.as_ref(),
                        ))
                    }
                    Some(def) if def.kind != DefinitionKind::Object => {
                        return Err(self.ctx.invalid_root(
                            format!("{} root '{name}' must be an object type", operation.operation.as_str()),
                            location.as_ref(),
                        ))
                    }
                    Some(_) => {}
                }
            }
            for directive in &def.directives {
                debug!(directive = %self.name(directive.name), "ignoring schema directive");
            }
        }
        Ok(())
    }

    fn link_abstract_types(&mut self) {
        let mut links = Vec::new();
        for def in self.schema.types.values() {
            match def.kind {
                DefinitionKind::Object | DefinitionKind::Interface => {
                    for interface in &def.interfaces {
                        links.push((interface.clone(), def.name.clone(), def.kind == DefinitionKind::Object));
                    }
                }
                DefinitionKind::Union => {
                    for member in &def.types {
                        links.push((def.name.clone(), member.clone(), true));
                    }
                }
                _ => {}
            }
        }
        for (abstract_type, name, is_possible) in links {
            if is_possible {
                self.schema.add_possible_type(&abstract_type, &name);
            }
            self.schema.add_implements(&name, &abstract_type);
        }
    }

    fn validate(&self) -> Result<(), SchemaLoadError> {
        let schema = &self.schema;
        let exists = |ty: &TypeRef| schema.types.contains_key(ty.name());

        for def in schema.types.values() {
            for field in &def.fields {
                let owner = format!("{}.{}", def.name, field.name);
                if !exists(&field.ty) {
                    return Err(self.ctx.undefined_type(
                        field.ty.name(),
                        owner,
                        field.location.as_ref(),
                    ));
                }
                for arg in &field.arguments {
                    if !exists(&arg.ty) {
                        return Err(self.ctx.undefined_type(
                            arg.ty.name(),
                            format!("{owner}({}:)", arg.name),
                            field.location.as_ref(),
                        ));
                    }
                }
            }

            for interface in &def.interfaces {
                match schema.get(interface) {
                    None => {
                        return Err(self.ctx.undefined_type(
                            interface,
                            &def.name,
                            def.location.as_ref(),
                        ))
                    }
                    Some(target) if target.kind != DefinitionKind::Interface => {
                        return Err(self.ctx.invalid_implements(
                            &def.name,
                            interface,
                            def.location.as_ref(),
                        ))
                    }
                    Some(_) => {}
                }
            }

            for member in &def.types {
                match schema.get(member) {
                    None => {
                        return Err(self.ctx.undefined_type(
                            member,
                            format!("union '{}'", def.name),
                            def.location.as_ref(),
                        ))
                    }
                    Some(target) if target.kind != DefinitionKind::Object => {
                        return Err(self.ctx.invalid_union_member(
                            &def.name,
                            member,
                            def.location.as_ref(),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        for directive in schema.directives.values() {
            for arg in &directive.arguments {
                if !exists(&arg.ty) {
                    return Err(self.ctx.undefined_type(
                        arg.ty.name(),
                        format!("@{}({}:)", directive.name, arg.name),
                        directive.location.as_ref(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn lower_type_definition(
        &self,
        source: usize,
        def: &ast::TypeDefinition,
        builtin: bool,
    ) -> Definition {
        let name = def.name();
        let mut lowered = Definition::new(kind_of(def), self.name(name));
        lowered.builtin = builtin;
        lowered.location = Self::location(source, name.span);

        match def {
            ast::TypeDefinition::Scalar(scalar) => {
                lowered.description = lower_description(scalar.description.as_ref());
                lowered.directives = self.lower_directives(source, &scalar.directives);
            }
            ast::TypeDefinition::Object(object) => {
                lowered.description = lower_description(object.description.as_ref());
                lowered.interfaces = object.implements.iter().map(|n| self.name(*n)).collect();
                lowered.directives = self.lower_directives(source, &object.directives);
                lowered.fields = object
                    .fields
                    .iter()
                    .map(|f| self.lower_field(source, f))
                    .collect();
            }
            ast::TypeDefinition::Interface(interface) => {
                lowered.description = lower_description(interface.description.as_ref());
                lowered.interfaces = interface.implements.iter().map(|n| self.name(*n)).collect();
                lowered.directives = self.lower_directives(source, &interface.directives);
                lowered.fields = interface
                    .fields
                    .iter()
                    .map(|f| self.lower_field(source, f))
                    .collect();
            }
            ast::TypeDefinition::Union(union) => {
                lowered.description = lower_description(union.description.as_ref());
                lowered.directives = self.lower_directives(source, &union.directives);
                lowered.types = union.members.iter().map(|n| self.name(*n)).collect();
            }
            ast::TypeDefinition::Enum(enumeration) => {
                lowered.description = lower_description(enumeration.description.as_ref());
                lowered.directives = self.lower_directives(source, &enumeration.directives);
                lowered.enum_values = enumeration
                    .values
                    .iter()
                    .map(|v| EnumValueDefinition {
                        name: self.name(v.name),
                        description: lower_description(v.description.as_ref()),
                        directives: self.lower_directives(source, &v.directives),
                    })
                    .collect();
            }
            ast::TypeDefinition::Input(input) => {
                lowered.description = lower_description(input.description.as_ref());
                lowered.directives = self.lower_directives(source, &input.directives);
                lowered.fields = input
                    .fields
                    .iter()
                    .map(|f| self.lower_input_field(source, f))
                    .collect();
            }
        }
        lowered
    }

    fn lower_field(&self, source: usize, field: &ast::FieldDefinition) -> FieldDefinition {
        let mut lowered = FieldDefinition::new(self.name(field.name), self.lower_type(&field.ty));
        lowered.description = lower_description(field.description.as_ref());
        lowered.arguments = field
            .arguments
            .iter()
            .map(|a| self.lower_argument(source, a))
            .collect();
        lowered.directives = self.lower_directives(source, &field.directives);
        lowered.location = Self::location(source, field.name.span);
        lowered
    }

    fn lower_input_field(&self, source: usize, field: &ast::InputValueDefinition) -> FieldDefinition {
        let mut lowered = FieldDefinition::new(self.name(field.name), self.lower_type(&field.ty));
        lowered.description = lower_description(field.description.as_ref());
        lowered.default_value = field.default_value.as_ref().map(|v| self.lower_value(v));
        lowered.directives = self.lower_directives(source, &field.directives);
        lowered.location = Self::location(source, field.name.span);
        lowered
    }

    fn lower_argument(&self, source: usize, arg: &ast::InputValueDefinition) -> ArgumentDefinition {
        ArgumentDefinition {
            name: self.name(arg.name),
            description: lower_description(arg.description.as_ref()),
            ty: self.lower_type(&arg.ty),
            default_value: arg.default_value.as_ref().map(|v| self.lower_value(v)),
            directives: self.lower_directives(source, &arg.directives),
        }
    }

    fn lower_directive_definition(
        &self,
        source: usize,
        def: &ast::DirectiveDefinitionNode,
        builtin: bool,
    ) -> DirectiveDefinition {
        DirectiveDefinition {
            name: self.name(def.name),
            description: lower_description(def.description.as_ref()),
            arguments: def
                .arguments
                .iter()
                .map(|a| self.lower_argument(source, a))
                .collect(),
            repeatable: def.repeatable,
            locations: def.locations.clone(),
            builtin,
            location: Self::location(source, def.name.span),
        }
    }

    fn lower_directives(&self, source: usize, directives: &[ast::Directive]) -> Vec<DirectiveApplication> {
        directives
            .iter()
            .map(|d| DirectiveApplication {
                name: self.name(d.name),
                arguments: d
                    .arguments
                    .iter()
                    .map(|a| (self.name(a.name), self.lower_value(&a.value)))
                    .collect(),
                location: Self::location(source, d.span),
            })
            .collect()
    }

    fn lower_type(&self, ty: &ast::Type) -> TypeRef {
        match ty {
            ast::Type::Named(named) => TypeRef::Named(self.interner.get(named.name)),
            ast::Type::List(inner, _) => TypeRef::List(Box::new(self.lower_type(inner))),
            ast::Type::NonNull(inner, _) => TypeRef::NonNull(Box::new(self.lower_type(inner))),
        }
    }

    fn lower_value(&self, value: &ast::Value) -> Value {
        match value {
            ast::Value::Int(v, _) => Value::Int(*v),
            ast::Value::Float(v, _) => Value::Float(*v),
            ast::Value::String(s, _) => Value::String(s.clone()),
            ast::Value::Boolean(b, _) => Value::Boolean(*b),
            ast::Value::Null(_) => Value::Null,
            ast::Value::Enum(name) => Value::Enum(self.name(*name)),
            ast::Value::List(values, _) => {
                Value::List(values.iter().map(|v| self.lower_value(v)).collect())
            }
            ast::Value::Object(fields, _) => Value::Object(
                fields
                    .iter()
                    .map(|(name, v)| (self.name(*name), self.lower_value(v)))
                    .collect(),
            ),
        }
    }
}

fn kind_of(def: &ast::TypeDefinition) -> DefinitionKind {
    match def {
        ast::TypeDefinition::Scalar(_) => DefinitionKind::Scalar,
        ast::TypeDefinition::Object(_) => DefinitionKind::Object,
        ast::TypeDefinition::Interface(_) => DefinitionKind::Interface,
        ast::TypeDefinition::Union(_) => DefinitionKind::Union,
        ast::TypeDefinition::Enum(_) => DefinitionKind::Enum,
        ast::TypeDefinition::Input(_) => DefinitionKind::InputObject,
    }
}

fn lower_description(description: Option<&ast::Description>) -> Option<String> {
    description.map(|d| d.value.clone())
}

fn article(kind: DefinitionKind) -> &'static str {
    match kind {
        DefinitionKind::Object | DefinitionKind::Union | DefinitionKind::Scalar => "a",
        DefinitionKind::Interface | DefinitionKind::Enum | DefinitionKind::InputObject => "an",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(input: &str) -> Result<Schema, SchemaLoadError> {
        load_schema(&[Source::new("schema.graphql", input)])
    }

    #[test]
    fn test_load_default_roots() {
        let schema = load("type Query { me: User }\ntype Mutation { noop: Boolean }\ntype User { id: ID! }")
            .unwrap();
        assert_eq!(schema.query.as_deref(), Some("Query"));
        assert_eq!(schema.mutation.as_deref(), Some("Mutation"));
        assert_eq!(schema.subscription, None);
        assert!(schema.get("String").is_some_and(|s| s.builtin));
        assert!(!schema.get("User").unwrap().builtin);
    }

    #[test]
    fn test_load_explicit_roots() {
        let schema = load("schema { query: Root }\ntype Root { a: Int }\ntype Query { b: Int }").unwrap();
        assert_eq!(schema.query.as_deref(), Some("Root"));
        assert!(!schema.has_default_roots());
    }

    #[test]
    fn test_extensions_are_applied_after_definitions() {
        let schema = load(
            "extend type Query { extra: String }\ntype Query { base: Int }\nextend type Query @tag",
        )
        .unwrap();
        let query = schema.query_definition().unwrap();
        let names: Vec<_> = query.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["base", "extra"]);
        assert_eq!(query.directives.len(), 1);
    }

    #[test]
    fn test_possible_types_and_implements() {
        let schema = load(
            "interface Node { id: ID! }\ntype Query { node: Node }\n\
             type Book implements Node { id: ID! }\ntype Movie implements Node { id: ID! }\n\
             union Media = Book | Movie",
        )
        .unwrap();
        assert_eq!(schema.get_possible_types("Node"), ["Book", "Movie"]);
        assert_eq!(schema.get_possible_types("Media"), ["Book", "Movie"]);
        assert_eq!(schema.get_implements("Book"), ["Node", "Media"]);
    }

    #[test]
    fn test_undefined_type_is_rejected() {
        let err = load("type Query { product: Product }").unwrap_err();
        assert!(matches!(err, SchemaLoadError::UndefinedType { ref name, .. } if name == "Product"));
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let err = load("type Query { a: Int }\ntype Query { b: Int }").unwrap_err();
        assert!(matches!(err, SchemaLoadError::Duplicate { kind: "type", .. }));
    }

    #[test]
    fn test_extension_kind_mismatch() {
        let err = load("type Query { a: Int }\nextend union Query = Query").unwrap_err();
        assert!(matches!(err, SchemaLoadError::InvalidExtension { .. }));
    }

    #[test]
    fn test_union_member_must_be_object() {
        let err = load("type Query { a: Int }\nunion Bad = Int").unwrap_err();
        assert!(matches!(err, SchemaLoadError::InvalidUnionMember { .. }));
    }

    #[test]
    fn test_syntax_error_carries_source_name() {
        let err = load("type Query { a: }").unwrap_err();
        let SchemaLoadError::Syntax { src, .. } = err else {
            panic!("expected syntax error");
        };
        assert_eq!(src.name(), "schema.graphql");
    }

    #[test]
    fn test_sources_are_kept_with_prelude_first() {
        let schema = load("type Query { a: Int }").unwrap();
        assert_eq!(schema.sources.len(), 2);
        assert!(schema.sources[0].builtin);
    }
}
