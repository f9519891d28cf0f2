//! Canonical schema printing.
//!
//! Output is deterministic: an optional `schema { }` block, then non-builtin
//! directive definitions sorted by name, then non-builtin types sorted by
//! name. Fields keep declaration order. Introspection fields and the
//! prelude are never printed. Internal fields, and builtin definitions that
//! plugins supplied, are printed only when asked for.

use crate::prelude::PRELUDE_NAME;
use crate::schema::Schema;
use crate::types::{
    write_quoted, ArgumentDefinition, Definition, DefinitionKind, DirectiveApplication,
    DirectiveDefinition, FieldDefinition, Location,
};

/// Printing options.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Number of spaces for indentation.
    pub indent_size: usize,
    /// Also print fields marked `internal` and plugin-supplied builtin
    /// definitions, producing a schema that loads on its own.
    pub include_internal: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            include_internal: false,
        }
    }
}

/// Schema printer.
pub struct Printer<'a> {
    options: &'a PrintOptions,
    output: String,
}

impl<'a> Printer<'a> {
    pub fn new(options: &'a PrintOptions) -> Self {
        Self {
            options,
            output: String::new(),
        }
    }

    /// Prints a schema.
    pub fn print(mut self, schema: &Schema) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if !schema.has_default_roots() {
            self.print_schema_block(schema);
            blocks.push(std::mem::take(&mut self.output));
        }

        let mut directives: Vec<&DirectiveDefinition> = schema
            .directives
            .values()
            .filter(|d| self.is_printed(schema, d.builtin, d.location.as_ref()))
            .collect();
        directives.sort_by(|a, b| a.name.cmp(&b.name));
        for directive in directives {
            self.print_directive_definition(directive);
            blocks.push(std::mem::take(&mut self.output));
        }

        let mut types: Vec<&Definition> = schema
            .types
            .values()
            .filter(|d| self.is_printed(schema, d.builtin, d.location.as_ref()))
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        for def in types {
            self.print_definition(def);
            blocks.push(std::mem::take(&mut self.output));
        }

        let mut out = blocks.join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn is_printed(&self, schema: &Schema, builtin: bool, location: Option<&Location>) -> bool {
        if !builtin {
            return true;
        }
        let from_prelude = location
            .and_then(|loc| schema.sources.get(loc.source))
            .is_some_and(|source| source.name == PRELUDE_NAME);
        self.options.include_internal && !from_prelude
    }

    fn print_schema_block(&mut self, schema: &Schema) {
        self.output.push_str("schema {\n");
        for (operation, root) in [
            ("query", &schema.query),
            ("mutation", &schema.mutation),
            ("subscription", &schema.subscription),
        ] {
            if let Some(root) = root {
                self.push_indent(1);
                self.output.push_str(operation);
                self.output.push_str(": ");
                self.output.push_str(root);
                self.output.push('\n');
            }
        }
        self.output.push('}');
    }

    fn print_directive_definition(&mut self, directive: &DirectiveDefinition) {
        self.print_description(directive.description.as_deref(), 0);
        self.output.push_str("directive @");
        self.output.push_str(&directive.name);
        self.print_arguments(&directive.arguments);
        if directive.repeatable {
            self.output.push_str(" repeatable");
        }
        self.output.push_str(" on ");
        let locations: Vec<&str> = directive.locations.iter().map(|l| l.as_str()).collect();
        self.output.push_str(&locations.join(" | "));
    }

    fn print_definition(&mut self, def: &Definition) {
        self.print_description(def.description.as_deref(), 0);
        self.output.push_str(def.kind.as_str());
        self.output.push(' ');
        self.output.push_str(&def.name);

        if !def.interfaces.is_empty() {
            self.output.push_str(" implements ");
            self.output.push_str(&def.interfaces.join(" & "));
        }
        self.print_directives(&def.directives);

        match def.kind {
            DefinitionKind::Scalar => {}
            DefinitionKind::Union => {
                if !def.types.is_empty() {
                    self.output.push_str(" = ");
                    self.output.push_str(&def.types.join(" | "));
                }
            }
            DefinitionKind::Enum => {
                self.output.push_str(" {\n");
                for value in &def.enum_values {
                    self.print_description(value.description.as_deref(), 1);
                    self.push_indent(1);
                    self.output.push_str(&value.name);
                    self.print_directives(&value.directives);
                    self.output.push('\n');
                }
                self.output.push('}');
            }
            DefinitionKind::Object | DefinitionKind::Interface | DefinitionKind::InputObject => {
                self.print_fields(&def.fields);
            }
        }
    }

    fn print_fields(&mut self, fields: &[FieldDefinition]) {
        self.output.push_str(" {\n");
        for field in fields {
            if field.is_introspection() || (field.internal && !self.options.include_internal) {
                continue;
            }
            self.print_description(field.description.as_deref(), 1);
            self.push_indent(1);
            self.output.push_str(&field.name);
            self.print_arguments(&field.arguments);
            self.output.push_str(": ");
            self.output.push_str(&field.ty.to_string());
            if let Some(default) = &field.default_value {
                self.output.push_str(" = ");
                self.output.push_str(&default.to_string());
            }
            self.print_directives(&field.directives);
            self.output.push('\n');
        }
        self.output.push('}');
    }

    fn print_arguments(&mut self, arguments: &[ArgumentDefinition]) {
        if arguments.is_empty() {
            return;
        }
        self.output.push('(');
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            if let Some(description) = &arg.description {
                let _ = write_quoted(&mut self.output, description);
                self.output.push(' ');
            }
            self.output.push_str(&arg.name);
            self.output.push_str(": ");
            self.output.push_str(&arg.ty.to_string());
            if let Some(default) = &arg.default_value {
                self.output.push_str(" = ");
                self.output.push_str(&default.to_string());
            }
            self.print_directives(&arg.directives);
        }
        self.output.push(')');
    }

    fn print_directives(&mut self, directives: &[DirectiveApplication]) {
        for directive in directives {
            self.output.push_str(" @");
            self.output.push_str(&directive.name);
            if !directive.arguments.is_empty() {
                self.output.push('(');
                for (i, (name, value)) in directive.arguments.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.output.push_str(name);
                    self.output.push_str(": ");
                    self.output.push_str(&value.to_string());
                }
                self.output.push(')');
            }
        }
    }

    fn print_description(&mut self, description: Option<&str>, level: usize) {
        let Some(description) = description else {
            return;
        };
        self.push_indent(level);
        if description.contains('\n') || description.contains('"') {
            self.output.push_str("\"\"\"\n");
            for line in description.replace("\"\"\"", "\\\"\"\"").lines() {
                if !line.is_empty() {
                    self.push_indent(level);
                    self.output.push_str(line);
                }
                self.output.push('\n');
            }
            self.push_indent(level);
            self.output.push_str("\"\"\"");
        } else {
            let _ = write_quoted(&mut self.output, description);
        }
        self.output.push('\n');
    }

    fn push_indent(&mut self, level: usize) {
        for _ in 0..level * self.options.indent_size {
            self.output.push(' ');
        }
    }
}

/// Prints the published form of a schema: builtins, introspection and
/// internal fields omitted.
#[must_use]
pub fn print_schema(schema: &Schema) -> String {
    Printer::new(&PrintOptions::default()).print(schema)
}

/// Prints a schema with custom options.
#[must_use]
pub fn print_schema_with_options(schema: &Schema, options: &PrintOptions) -> String {
    Printer::new(options).print(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_schema;
    use crate::types::{Source, TypeRef};

    fn load(input: &str) -> Schema {
        load_schema(&[Source::new("schema.graphql", input)]).unwrap()
    }

    #[test]
    fn test_print_sorts_types_and_directives() {
        let schema = load(
            "directive @tag(name: String!) repeatable on OBJECT | FIELD_DEFINITION\n\
             type Review { body: String }\n\
             type Query { topProducts(first: Int = 5): [Product] }\n\
             type Product @tag(name: \"shop\") { upc: String! reviews: [Review] }\n\
             directive @auth on FIELD_DEFINITION",
        );
        insta::assert_snapshot!(print_schema(&schema).trim_end(), @r#"
        directive @auth on FIELD_DEFINITION

        directive @tag(name: String!) repeatable on OBJECT | FIELD_DEFINITION

        type Product @tag(name: "shop") {
          upc: String!
          reviews: [Review]
        }

        type Query {
          topProducts(first: Int = 5): [Product]
        }

        type Review {
          body: String
        }
        "#);
    }

    #[test]
    fn test_print_non_default_roots() {
        let schema = load("schema { query: Root }\ntype Root { ok: Boolean }");
        assert_eq!(
            print_schema(&schema),
            "schema {\n  query: Root\n}\n\ntype Root {\n  ok: Boolean\n}\n"
        );
    }

    #[test]
    fn test_print_skips_internal_and_introspection_fields() {
        let mut schema = load("type Query { hello: String }");
        let query = schema.query_definition_mut().unwrap();
        query.fields.push(FieldDefinition::new("_service", TypeRef::non_null_named("String")).internal());
        query.fields.push(FieldDefinition::new("__schema", TypeRef::named("__Schema")));

        assert_eq!(print_schema(&schema), "type Query {\n  hello: String\n}\n");

        let options = PrintOptions {
            include_internal: true,
            ..PrintOptions::default()
        };
        assert_eq!(
            print_schema_with_options(&schema, &options),
            "type Query {\n  hello: String\n  _service: String!\n}\n"
        );
    }

    #[test]
    fn test_print_plugin_builtins_only_when_internal() {
        let schema = load_schema(&[
            Source::builtin("federation.graphql", "scalar _Any"),
            Source::new("schema.graphql", "type Query { hello: String }"),
        ])
        .unwrap();

        assert_eq!(print_schema(&schema), "type Query {\n  hello: String\n}\n");
        let options = PrintOptions {
            include_internal: true,
            ..PrintOptions::default()
        };
        assert_eq!(
            print_schema_with_options(&schema, &options),
            "type Query {\n  hello: String\n}\n\nscalar _Any\n"
        );
    }

    #[test]
    fn test_print_enum_union_and_descriptions() {
        let schema = load(
            "\"A colour\"\nenum Color { RED GREEN @deprecated(reason: \"use RED\") }\n\
             type Query { c: Color }\nunion Thing = Query\n\
             \"\"\"\nMulti\nline\n\"\"\"\nscalar Time",
        );
        assert_eq!(
            print_schema(&schema),
            "\"A colour\"\nenum Color {\n  RED\n  GREEN @deprecated(reason: \"use RED\")\n}\n\n\
             type Query {\n  c: Color\n}\n\n\
             union Thing = Query\n\n\
             \"\"\"\nMulti\nline\n\"\"\"\nscalar Time\n"
        );
    }

    #[test]
    fn test_print_is_reparseable() {
        let schema = load(
            "interface Node { id: ID! }\ntype Query { node(id: ID!): Node }\n\
             type User implements Node { id: ID! }\ninput Filter { q: String = \"a\\\"b\" }",
        );
        let printed = print_schema(&schema);
        let reloaded = load(&printed);
        assert_eq!(print_schema(&reloaded), printed);
    }
}
