use super::objects::build_argument;
use crate::config::TypeBinder;
use crate::data::Directive;
use crate::error::{CodegenError, Result};
use sdlgen_schema::{DefinitionKind, DirectiveApplication, DirectiveLocation, Schema};
use std::collections::BTreeMap;

/// Builds the directives declared by the user. Prelude and plugin
/// directives stay out of the IR.
pub(super) fn build(schema: &Schema, binder: &dyn TypeBinder) -> Result<BTreeMap<String, Directive>> {
    let mut directives = BTreeMap::new();
    for def in schema.directives.values().filter(|def| !def.builtin) {
        let owner = format!("@{}", def.name);
        let arguments = def
            .arguments
            .iter()
            .map(|arg| build_argument(arg, &owner, binder))
            .collect::<Result<Vec<_>>>()?;
        directives.insert(
            def.name.clone(),
            Directive {
                name: def.name.clone(),
                arguments,
                locations: def.locations.clone(),
                repeatable: def.repeatable,
            },
        );
    }
    Ok(directives)
}

/// Checks every directive application against its declaration.
pub(super) fn validate_applications(schema: &Schema) -> Result<()> {
    for def in schema.types.values() {
        let location = match def.kind {
            DefinitionKind::Scalar => DirectiveLocation::Scalar,
            DefinitionKind::Object => DirectiveLocation::Object,
            DefinitionKind::Interface => DirectiveLocation::Interface,
            DefinitionKind::Union => DirectiveLocation::Union,
            DefinitionKind::Enum => DirectiveLocation::Enum,
            DefinitionKind::InputObject => DirectiveLocation::InputObject,
        };
        check(schema, &def.directives, location, &def.name)?;

        let field_location = if def.kind == DefinitionKind::InputObject {
            DirectiveLocation::InputFieldDefinition
        } else {
            DirectiveLocation::FieldDefinition
        };
        for field in &def.fields {
            let target = format!("{}.{}", def.name, field.name);
            check(schema, &field.directives, field_location, &target)?;
            for arg in &field.arguments {
                check(
                    schema,
                    &arg.directives,
                    DirectiveLocation::ArgumentDefinition,
                    &format!("{target}({}:)", arg.name),
                )?;
            }
        }
        for value in &def.enum_values {
            check(
                schema,
                &value.directives,
                DirectiveLocation::EnumValue,
                &format!("{}.{}", def.name, value.name),
            )?;
        }
    }

    for directive in schema.directives.values() {
        for arg in &directive.arguments {
            check(
                schema,
                &arg.directives,
                DirectiveLocation::ArgumentDefinition,
                &format!("@{}({}:)", directive.name, arg.name),
            )?;
        }
    }
    Ok(())
}

fn check(
    schema: &Schema,
    applications: &[DirectiveApplication],
    location: DirectiveLocation,
    target: &str,
) -> Result<()> {
    for (i, application) in applications.iter().enumerate() {
        let name = application.name.as_str();
        let Some(definition) = schema.directives.get(name) else {
            return Err(CodegenError::directive(name, target, "directive is not declared"));
        };
        if !definition.locations.contains(&location) {
            return Err(CodegenError::directive(
                name,
                target,
                format!("not allowed on {location}"),
            ));
        }
        if !definition.repeatable && applications[..i].iter().any(|a| a.name == name) {
            return Err(CodegenError::directive(name, target, "directive is not repeatable"));
        }
        if let Some((arg, _)) = application
            .arguments
            .iter()
            .find(|(arg, _)| definition.argument(arg).is_none())
        {
            return Err(CodegenError::directive(
                name,
                target,
                format!("unknown argument '{arg}'"),
            ));
        }
        if let Some(missing) = definition.arguments.iter().find(|arg| {
            arg.ty.is_non_null() && arg.default_value.is_none() && application.argument(&arg.name).is_none()
        }) {
            return Err(CodegenError::directive(
                name,
                target,
                format!("missing required argument '{}'", missing.name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdlgen_schema::{load_schema, Source};

    fn validate(input: &str) -> Result<()> {
        let schema = load_schema(&[Source::new("schema.graphql", input)]).unwrap();
        validate_applications(&schema)
    }

    fn reason(result: Result<()>) -> String {
        match result {
            Err(CodegenError::DirectiveBuild { reason, .. }) => reason,
            other => panic!("expected a directive error, got {other:?}"),
        }
    }

    #[test]
    fn test_build_skips_builtin_directives() {
        let mut config = crate::config::Config::default();
        config.inject_builtins();
        let schema = load_schema(&[Source::new(
            "schema.graphql",
            "directive @tag(name: String!) repeatable on OBJECT\ntype Query { a: Int }",
        )])
        .unwrap();

        let directives = build(&schema, &crate::config::Binder::new(&config.models)).unwrap();
        assert_eq!(directives.keys().collect::<Vec<_>>(), ["tag"]);
        let tag = &directives["tag"];
        assert!(tag.repeatable);
        assert_eq!(tag.arguments[0].type_reference.rust, "String");
    }

    #[test]
    fn test_valid_applications() {
        validate(
            "directive @tag(name: String!) repeatable on OBJECT | FIELD_DEFINITION\n\
             type Query @tag(name: \"a\") @tag(name: \"b\") {\n\
               old: String @deprecated\n\
               new: String @tag(name: \"c\")\n\
             }",
        )
        .unwrap();
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(
            reason(validate("type Query @cache { a: Int }")),
            "directive is not declared"
        );
    }

    #[test]
    fn test_wrong_location() {
        assert_eq!(
            reason(validate("directive @auth on FIELD_DEFINITION\ntype Query @auth { a: Int }")),
            "not allowed on OBJECT"
        );
    }

    #[test]
    fn test_not_repeatable() {
        let err = validate(
            "directive @key(fields: String!) on OBJECT\n\
             type Query @key(fields: \"a\") @key(fields: \"b\") { a: Int }",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid directive @key on Query: directive is not repeatable"
        );
    }

    #[test]
    fn test_arguments_are_checked() {
        assert_eq!(
            reason(validate(
                "directive @tag(name: String!) on OBJECT\ntype Query @tag { a: Int }"
            )),
            "missing required argument 'name'"
        );
        assert_eq!(
            reason(validate(
                "directive @tag(name: String) on OBJECT\ntype Query @tag(nme: \"x\") { a: Int }"
            )),
            "unknown argument 'nme'"
        );
    }
}
