//! Recursive descent parser for schema definition documents.

use crate::ast::*;
use crate::lexer::{block_string_value, string_value, Lexer};
use crate::token::{DirectiveLocation, Token, TokenKind};
use sdlgen_core::{diagnostics::codes, DiagnosticBag, Interner, Span, Text};

/// Parser for schema definition documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    last_end: u32,
    diagnostics: DiagnosticBag,
}

/// Result of parsing.
pub struct ParseResult {
    pub document: Document,
    pub diagnostics: DiagnosticBag,
}

/// Parses a source string into a document.
pub fn parse(source: &str, interner: &Interner) -> ParseResult {
    let mut parser = Parser::new(source, interner);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str, interner: &'a Interner) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source, interner),
            current: Token::new(TokenKind::Eof, Span::default()),
            last_end: 0,
            diagnostics: DiagnosticBag::new(),
        };
        parser.bump();
        parser
    }

    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Pulls the next significant token, reporting lexical errors on the way.
    fn bump(&mut self) {
        loop {
            let token = self.lexer.next_token();
            if token.kind != TokenKind::Error {
                self.current = token;
                return;
            }
            let text = self.lexer.span_text(token.span);
            if text.starts_with('"') {
                self.diagnostics.error(
                    codes::UNTERMINATED_STRING,
                    "unterminated string",
                    token.span,
                    "string is never closed",
                );
            } else {
                self.diagnostics.error(
                    codes::INVALID_SYNTAX,
                    "unexpected character",
                    token.span,
                    format!("unexpected `{text}`"),
                );
            }
        }
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.last_end = self.current.span.end;
        self.bump();
    }

    /// Consumes the token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error_expected(kind);
            false
        }
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.last_end.max(start))
    }

    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    fn intern_current(&self) -> Text {
        self.lexer.intern_span(self.current.span)
    }

    fn error(&mut self, message: &str) {
        let span = self.current.span;
        self.error_at(span, message);
    }

    fn error_at(&mut self, span: Span, message: &str) {
        self.diagnostics
            .error(codes::INVALID_SYNTAX, message, span, message.to_string());
    }

    fn error_expected(&mut self, expected: TokenKind) {
        let (code, found) = if self.at_kind(TokenKind::Eof) {
            (codes::UNEXPECTED_EOF, "end of input".to_string())
        } else {
            (codes::UNEXPECTED_TOKEN, format!("`{}`", self.current_text()))
        };
        self.diagnostics.error(
            code,
            "unexpected token",
            self.current.span,
            format!("expected `{expected}`, found {found}"),
        );
    }

    /// Runs `parse_item` until `close` or end of input, forcing progress on
    /// items that consume nothing.
    fn parse_until<T>(
        &mut self,
        close: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> T,
    ) -> Vec<T> {
        let mut items = Vec::new();
        while !self.at_kind(close) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            items.push(parse_item(self));
            if self.current.span.start == before {
                self.advance();
            }
        }
        items
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        while !self.at_kind(TokenKind::Eof) {
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            } else {
                self.recover();
            }
        }

        Document {
            definitions,
            span: self.span_from(start),
        }
    }

    /// Skips ahead to the next token that can open a definition.
    fn recover(&mut self) {
        self.advance();
        while !self.at_kind(TokenKind::Eof) && !self.at().starts_definition() {
            self.advance();
        }
    }

    fn parse_definition(&mut self) -> Option<Definition> {
        let description = self.try_parse_description();

        match self.at() {
            TokenKind::Schema => Some(Definition::Schema(
                self.parse_schema_definition(description, false),
            )),
            TokenKind::Directive => Some(Definition::Directive(
                self.parse_directive_definition(description),
            )),
            TokenKind::Extend => {
                if let Some(description) = &description {
                    self.error_at(description.span, "extensions cannot have a description");
                }
                self.parse_extension()
            }
            TokenKind::Query | TokenKind::Mutation | TokenKind::Subscription | TokenKind::LBrace => {
                self.error("executable definitions are not allowed in a schema document");
                None
            }
            _ => match self.parse_type_definition(description) {
                Some(def) => Some(Definition::Type(def)),
                None => {
                    self.error("expected definition");
                    None
                }
            },
        }
    }

    fn parse_extension(&mut self) -> Option<Definition> {
        self.advance(); // extend
        if self.at_kind(TokenKind::Schema) {
            return Some(Definition::SchemaExtension(
                self.parse_schema_definition(None, true),
            ));
        }
        match self.parse_type_definition(None) {
            Some(def) => Some(Definition::TypeExtension(def)),
            None => {
                self.error("expected `schema` or a type keyword after `extend`");
                None
            }
        }
    }

    /// Parses a type definition if the current token opens one.
    fn parse_type_definition(&mut self, description: Option<Description>) -> Option<TypeDefinition> {
        let def = match self.at() {
            TokenKind::Scalar => TypeDefinition::Scalar(self.parse_scalar_type(description)),
            TokenKind::Type => TypeDefinition::Object(self.parse_object_type(description)),
            TokenKind::Interface => {
                TypeDefinition::Interface(self.parse_interface_type(description))
            }
            TokenKind::Union => TypeDefinition::Union(self.parse_union_type(description)),
            TokenKind::Enum => TypeDefinition::Enum(self.parse_enum_type(description)),
            TokenKind::Input => TypeDefinition::Input(self.parse_input_object_type(description)),
            _ => return None,
        };
        Some(def)
    }

    fn try_parse_description(&mut self) -> Option<Description> {
        let span = self.current.span;
        let value = match self.at() {
            TokenKind::StringLiteral => self.string_literal_value(),
            TokenKind::BlockStringLiteral => block_string_value(self.current_text()),
            _ => return None,
        };
        self.advance();
        Some(Description::new(value, span))
    }

    fn string_literal_value(&mut self) -> String {
        let text = self.current_text();
        match string_value(text) {
            Some(value) => value,
            None => {
                self.error("invalid escape sequence in string");
                text.trim_matches('"').to_string()
            }
        }
    }

    fn parse_name(&mut self) -> Name {
        let span = self.current.span;
        if self.at().is_name() {
            let value = self.intern_current();
            self.advance();
            Name::new(value, span)
        } else {
            let message = "expected name";
            self.diagnostics.error(
                codes::UNEXPECTED_TOKEN,
                message,
                span,
                format!("expected a name, found `{}`", self.current_text()),
            );
            Name::new(self.lexer.intern_span(Span::new(span.start, span.start)), span)
        }
    }

    fn parse_schema_definition(
        &mut self,
        description: Option<Description>,
        is_extension: bool,
    ) -> SchemaDefinition {
        let start = self.current.span.start;
        self.advance(); // schema

        let directives = self.parse_directives();
        let mut operations = Vec::new();

        if is_extension && !self.at_kind(TokenKind::LBrace) {
            return SchemaDefinition {
                description,
                directives,
                operations,
                span: self.span_from(start),
            };
        }

        self.expect(TokenKind::LBrace);
        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let op_start = self.current.span.start;
            let operation = match self.at() {
                TokenKind::Query => OperationType::Query,
                TokenKind::Mutation => OperationType::Mutation,
                TokenKind::Subscription => OperationType::Subscription,
                _ => {
                    self.error("expected `query`, `mutation` or `subscription`");
                    self.advance();
                    continue;
                }
            };
            self.advance();
            self.expect(TokenKind::Colon);
            let type_name = self.parse_name();
            operations.push(OperationTypeDefinition {
                operation,
                type_name,
                span: self.span_from(op_start),
            });
        }
        self.expect(TokenKind::RBrace);

        SchemaDefinition {
            description,
            directives,
            operations,
            span: self.span_from(start),
        }
    }

    fn parse_scalar_type(&mut self, description: Option<Description>) -> ScalarTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // scalar
        let name = self.parse_name();
        let directives = self.parse_directives();
        ScalarTypeDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        }
    }

    fn parse_object_type(&mut self, description: Option<Description>) -> ObjectTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // type
        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_fields_block();
        ObjectTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_interface_type(
        &mut self,
        description: Option<Description>,
    ) -> InterfaceTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // interface
        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_fields_block();
        InterfaceTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_union_type(&mut self, description: Option<Description>) -> UnionTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // union
        let name = self.parse_name();
        let directives = self.parse_directives();

        let mut members = Vec::new();
        if self.eat(TokenKind::Eq) {
            self.eat(TokenKind::Pipe);
            members.push(self.parse_name());
            while self.eat(TokenKind::Pipe) {
                members.push(self.parse_name());
            }
        }

        UnionTypeDefinition {
            description,
            name,
            directives,
            members,
            span: self.span_from(start),
        }
    }

    fn parse_enum_type(&mut self, description: Option<Description>) -> EnumTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // enum
        let name = self.parse_name();
        let directives = self.parse_directives();

        let mut values = Vec::new();
        if self.eat(TokenKind::LBrace) {
            values = self.parse_until(TokenKind::RBrace, Self::parse_enum_value);
            self.expect(TokenKind::RBrace);
        }

        EnumTypeDefinition {
            description,
            name,
            directives,
            values,
            span: self.span_from(start),
        }
    }

    fn parse_enum_value(&mut self) -> EnumValueDefinition {
        let start = self.current.span.start;
        let description = self.try_parse_description();
        if matches!(
            self.at(),
            TokenKind::True | TokenKind::False | TokenKind::Null
        ) {
            self.error("`true`, `false` and `null` cannot be enum values");
        }
        let name = self.parse_name();
        let directives = self.parse_directives();
        EnumValueDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        }
    }

    fn parse_input_object_type(
        &mut self,
        description: Option<Description>,
    ) -> InputObjectTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // input
        let name = self.parse_name();
        let directives = self.parse_directives();

        let mut fields = Vec::new();
        if self.eat(TokenKind::LBrace) {
            fields = self.parse_until(TokenKind::RBrace, Self::parse_input_value_definition);
            self.expect(TokenKind::RBrace);
        }

        InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_directive_definition(
        &mut self,
        description: Option<Description>,
    ) -> DirectiveDefinitionNode {
        let start = self.current.span.start;
        self.advance(); // directive
        self.expect(TokenKind::At);
        let name = self.parse_name();
        let arguments = self.parse_argument_definitions();
        let repeatable = self.eat(TokenKind::Repeatable);

        self.expect(TokenKind::On);
        self.eat(TokenKind::Pipe);
        let mut locations = Vec::new();
        loop {
            let span = self.current.span;
            let text = self.current_text();
            if self.at().is_name() {
                match DirectiveLocation::parse(text) {
                    Some(location) => locations.push(location),
                    None => self.diagnostics.error(
                        codes::INVALID_DIRECTIVE_LOCATION,
                        "invalid directive location",
                        span,
                        format!("`{text}` is not a directive location"),
                    ),
                }
                self.advance();
            } else {
                self.error("expected directive location");
                break;
            }
            if !self.eat(TokenKind::Pipe) {
                break;
            }
        }

        DirectiveDefinitionNode {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: self.span_from(start),
        }
    }

    /// Parses `implements A & B`; the leading `&` is optional.
    fn parse_implements(&mut self) -> Vec<Name> {
        let mut names = Vec::new();
        if self.eat(TokenKind::Implements) {
            self.eat(TokenKind::Amp);
            names.push(self.parse_name());
            while self.eat(TokenKind::Amp) {
                names.push(self.parse_name());
            }
        }
        names
    }

    /// Parses an optional `{ field... }` block.
    fn parse_fields_block(&mut self) -> Vec<FieldDefinition> {
        if !self.eat(TokenKind::LBrace) {
            return Vec::new();
        }
        let fields = self.parse_until(TokenKind::RBrace, Self::parse_field_definition);
        self.expect(TokenKind::RBrace);
        fields
    }

    fn parse_field_definition(&mut self) -> FieldDefinition {
        let start = self.current.span.start;
        let description = self.try_parse_description();
        let name = self.parse_name();
        let arguments = self.parse_argument_definitions();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let directives = self.parse_directives();

        FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: self.span_from(start),
        }
    }

    fn parse_argument_definitions(&mut self) -> Vec<InputValueDefinition> {
        if !self.eat(TokenKind::LParen) {
            return Vec::new();
        }
        let args = self.parse_until(TokenKind::RParen, Self::parse_input_value_definition);
        self.expect(TokenKind::RParen);
        args
    }

    fn parse_input_value_definition(&mut self) -> InputValueDefinition {
        let start = self.current.span.start;
        let description = self.try_parse_description();
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.eat(TokenKind::Eq) {
            Some(self.parse_value())
        } else {
            None
        };
        let directives = self.parse_directives();

        InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        }
    }

    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;

        let inner = if self.eat(TokenKind::LBracket) {
            let element = self.parse_type();
            self.expect(TokenKind::RBracket);
            Type::List(Box::new(element), self.span_from(start))
        } else {
            let name = self.parse_name();
            Type::Named(NamedType {
                name: name.value,
                span: name.span,
            })
        };

        if self.eat(TokenKind::Bang) {
            Type::NonNull(Box::new(inner), self.span_from(start))
        } else {
            inner
        }
    }

    fn parse_directives(&mut self) -> Vec<Directive> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            directives.push(self.parse_directive());
        }
        directives
    }

    fn parse_directive(&mut self) -> Directive {
        let start = self.current.span.start;
        self.advance(); // @

        let name = self.parse_name();
        let arguments = if self.eat(TokenKind::LParen) {
            let args = self.parse_until(TokenKind::RParen, Self::parse_argument);
            self.expect(TokenKind::RParen);
            args
        } else {
            Vec::new()
        };

        Directive {
            name,
            arguments,
            span: self.span_from(start),
        }
    }

    fn parse_argument(&mut self) -> Argument {
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let value = self.parse_value();
        Argument {
            name,
            value,
            span: self.span_from(start),
        }
    }

    fn parse_value(&mut self) -> Value {
        let start = self.current.span.start;

        match self.at() {
            TokenKind::Dollar => {
                self.error("variables are not allowed in a schema document");
                self.advance();
                self.parse_name();
                Value::Null(self.span_from(start))
            }
            TokenKind::IntLiteral => {
                let value = self.current_text().parse().unwrap_or_else(|_| {
                    self.error("integer literal out of range");
                    0
                });
                self.advance();
                Value::Int(value, self.span_from(start))
            }
            TokenKind::FloatLiteral => {
                let value = self.current_text().parse().unwrap_or(0.0);
                self.advance();
                Value::Float(value, self.span_from(start))
            }
            TokenKind::StringLiteral => {
                let value = self.string_literal_value();
                self.advance();
                Value::String(value, self.span_from(start))
            }
            TokenKind::BlockStringLiteral => {
                let value = block_string_value(self.current_text());
                self.advance();
                Value::String(value, self.span_from(start))
            }
            TokenKind::True => {
                self.advance();
                Value::Boolean(true, self.span_from(start))
            }
            TokenKind::False => {
                self.advance();
                Value::Boolean(false, self.span_from(start))
            }
            TokenKind::Null => {
                self.advance();
                Value::Null(self.span_from(start))
            }
            TokenKind::LBracket => {
                self.advance();
                let values = self.parse_until(TokenKind::RBracket, Self::parse_value);
                self.expect(TokenKind::RBracket);
                Value::List(values, self.span_from(start))
            }
            TokenKind::LBrace => {
                self.advance();
                let fields = self.parse_until(TokenKind::RBrace, |p| {
                    let name = p.parse_name();
                    p.expect(TokenKind::Colon);
                    (name, p.parse_value())
                });
                self.expect(TokenKind::RBrace);
                Value::Object(fields, self.span_from(start))
            }
            kind if kind.is_name() => Value::Enum(self.parse_name()),
            _ => {
                self.error("expected value");
                Value::Null(self.current.span)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str, interner: &Interner) -> Document {
        let result = parse(source, interner);
        let errors: Vec<_> = result.diagnostics.errors().map(|d| d.title.clone()).collect();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        result.document
    }

    #[test]
    fn test_parse_simple_type() {
        let interner = Interner::new();
        let doc = parse_ok("type Query { hello: String }", &interner);
        assert_eq!(doc.definitions.len(), 1);
        let Definition::Type(TypeDefinition::Object(query)) = &doc.definitions[0] else {
            panic!("expected object type");
        };
        assert_eq!(interner.get(query.name.value), "Query");
        assert_eq!(query.fields.len(), 1);
    }

    #[test]
    fn test_parse_keyed_entity() {
        let interner = Interner::new();
        let doc = parse_ok(
            r#"
            type Product @key(fields: "upc") {
                upc: String!
                reviews(first: Int = 5): [Review!]! @requires(fields: "upc")
            }
            "#,
            &interner,
        );
        let Definition::Type(TypeDefinition::Object(product)) = &doc.definitions[0] else {
            panic!("expected object type");
        };
        assert_eq!(product.directives.len(), 1);
        let Value::String(fields, _) = &product.directives[0].arguments[0].value else {
            panic!("expected string argument");
        };
        assert_eq!(fields, "upc");

        let reviews = &product.fields[1];
        assert!(matches!(reviews.ty, Type::NonNull(_, _)));
        assert!(matches!(
            reviews.arguments[0].default_value,
            Some(Value::Int(5, _))
        ));
    }

    #[test]
    fn test_parse_directive_definition() {
        let interner = Interner::new();
        let doc = parse_ok(
            "directive @key(fields: _FieldSet!) repeatable on OBJECT | INTERFACE",
            &interner,
        );
        let Definition::Directive(key) = &doc.definitions[0] else {
            panic!("expected directive definition");
        };
        assert!(key.repeatable);
        assert_eq!(
            key.locations,
            vec![DirectiveLocation::Object, DirectiveLocation::Interface]
        );
    }

    #[test]
    fn test_parse_invalid_directive_location() {
        let interner = Interner::new();
        let result = parse("directive @tag on TABLE", &interner);
        let found: Vec<_> = result.diagnostics.errors().map(|d| d.code).collect();
        assert_eq!(found, vec![codes::INVALID_DIRECTIVE_LOCATION]);
    }

    #[test]
    fn test_parse_extensions_without_braces() {
        let interner = Interner::new();
        let doc = parse_ok(
            "extend schema @link\nextend type Query @extends\nextend union _Entity = Product",
            &interner,
        );
        assert!(matches!(doc.definitions[0], Definition::SchemaExtension(_)));
        assert!(matches!(
            doc.definitions[1],
            Definition::TypeExtension(TypeDefinition::Object(_))
        ));
        let Definition::TypeExtension(TypeDefinition::Union(entity)) = &doc.definitions[2] else {
            panic!("expected union extension");
        };
        assert_eq!(entity.members.len(), 1);
    }

    #[test]
    fn test_parse_schema_and_union() {
        let interner = Interner::new();
        let doc = parse_ok(
            "schema { query: RootQuery mutation: RootMutation }\nunion Item = | Book | Movie",
            &interner,
        );
        let Definition::Schema(schema) = &doc.definitions[0] else {
            panic!("expected schema definition");
        };
        assert_eq!(schema.operations.len(), 2);
        assert_eq!(schema.operations[1].operation, OperationType::Mutation);
        let Definition::Type(TypeDefinition::Union(item)) = &doc.definitions[1] else {
            panic!("expected union");
        };
        assert_eq!(item.members.len(), 2);
    }

    #[test]
    fn test_parse_descriptions() {
        let interner = Interner::new();
        let doc = parse_ok(
            "\"\"\"\n  A sellable item.\n\"\"\"\ntype Product {\n  \"the id\" id: ID!\n}",
            &interner,
        );
        let Definition::Type(TypeDefinition::Object(product)) = &doc.definitions[0] else {
            panic!("expected object type");
        };
        assert_eq!(
            product.description.as_ref().map(|d| d.value.as_str()),
            Some("A sellable item.")
        );
        assert_eq!(
            product.fields[0].description.as_ref().map(|d| d.value.as_str()),
            Some("the id")
        );
    }

    #[test]
    fn test_keywords_are_valid_field_names() {
        let interner = Interner::new();
        let doc = parse_ok("type Q { type: String input: Int query: Boolean }", &interner);
        let Definition::Type(TypeDefinition::Object(q)) = &doc.definitions[0] else {
            panic!("expected object type");
        };
        assert_eq!(q.fields.len(), 3);
    }

    #[test]
    fn test_variables_rejected() {
        let interner = Interner::new();
        let result = parse("type Q { f: Int @skip(if: $flag) }", &interner);
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn test_executable_definition_rejected() {
        let interner = Interner::new();
        let result = parse("query { hello }\ntype Query { hello: String }", &interner);
        assert_eq!(result.diagnostics.error_count(), 1);
        assert_eq!(result.document.definitions.len(), 1);
    }

    #[test]
    fn test_recovers_after_error() {
        let interner = Interner::new();
        let result = parse("type A { a: }\ntype B { b: Int }", &interner);
        assert!(result.diagnostics.has_errors());
        assert!(result
            .document
            .definitions
            .iter()
            .any(|d| matches!(d, Definition::Type(t) if interner.get(t.name().value) == "B")));
    }

    #[test]
    fn test_unterminated_string_reported() {
        let interner = Interner::new();
        let result = parse("type A @key(fields: \"upc) { a: Int }", &interner);
        assert!(result
            .diagnostics
            .errors()
            .any(|d| d.code == codes::UNTERMINATED_STRING));
    }
}
