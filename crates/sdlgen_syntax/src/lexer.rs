//! Lexer for the schema definition language.

use crate::token::{Token, TokenKind};
use sdlgen_core::{Interner, Span, Text};

/// A lexer over one schema source.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: u32,
    interner: &'a Interner,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer.
    pub fn new(source: &'a str, interner: &'a Interner) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        &self.bytes[(self.pos as usize).min(self.bytes.len())..]
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match c {
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b':' => self.single(TokenKind::Colon),
            b'=' => self.single(TokenKind::Eq),
            b'|' => self.single(TokenKind::Pipe),
            b'&' => self.single(TokenKind::Amp),
            b'@' => self.single(TokenKind::At),
            b'!' => self.single(TokenKind::Bang),
            b'$' => self.single(TokenKind::Dollar),
            b'"' => self.scan_string(),
            b'-' | b'0'..=b'9' => self.scan_number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_name(),
            _ => {
                // Step over a whole UTF-8 sequence so spans stay on char boundaries.
                let width = self.source[self.pos as usize..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.advance_by(width as u32);
                TokenKind::Error
            }
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Skips whitespace, commas and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b',') => self.advance(),
                Some(b'#') => match memchr::memchr(b'\n', self.rest()) {
                    Some(offset) => self.advance_by(offset as u32),
                    None => self.pos = self.bytes.len() as u32,
                },
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.advance_by(3);
                }
                _ => break,
            }
        }
    }

    fn scan_name(&mut self) -> TokenKind {
        let start = self.pos as usize;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::from_keyword(&self.source[start..self.pos as usize]).unwrap_or(TokenKind::Ident)
    }

    fn scan_digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            count += 1;
        }
        count
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.advance();
        }
        if self.scan_digits() == 0 {
            return TokenKind::Error;
        }

        if self.peek() == Some(b'.') {
            is_float = true;
            self.advance();
            if self.scan_digits() == 0 {
                return TokenKind::Error;
            }
        }

        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            if self.scan_digits() == 0 {
                return TokenKind::Error;
            }
        }

        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
            self.advance_by(3);
            return self.scan_block_string();
        }
        self.advance();

        loop {
            let Some(offset) = memchr::memchr3(b'"', b'\\', b'\n', self.rest()) else {
                self.pos = self.bytes.len() as u32;
                return TokenKind::Error;
            };
            self.advance_by(offset as u32);
            match self.peek() {
                Some(b'"') => {
                    self.advance();
                    return TokenKind::StringLiteral;
                }
                Some(b'\\') => self.advance_by(2),
                _ => return TokenKind::Error,
            }
        }
    }

    fn scan_block_string(&mut self) -> TokenKind {
        loop {
            match self.peek() {
                None => return TokenKind::Error,
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.advance_by(3);
                    return TokenKind::BlockStringLiteral;
                }
                Some(b'\\')
                    if self.peek_at(1) == Some(b'"')
                        && self.peek_at(2) == Some(b'"')
                        && self.peek_at(3) == Some(b'"') =>
                {
                    self.advance_by(4);
                }
                _ => self.advance(),
            }
        }
    }

    /// Interns the text at the given span.
    pub fn intern_span(&self, span: Span) -> Text {
        self.interner.intern(self.span_text(span))
    }

    /// Gets the text at the given span.
    pub fn span_text(&self, span: Span) -> &'a str {
        &self.source[span.start as usize..(span.end as usize).min(self.source.len())]
    }
}

/// Decodes the raw text of a `"..."` literal, quotes included.
///
/// Returns `None` on an unknown escape sequence.
#[must_use]
pub fn string_value(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

/// Decodes the raw text of a `"""..."""` literal, quotes included, removing
/// the common indentation and surrounding blank lines.
#[must_use]
pub fn block_string_value(raw: &str) -> String {
    let inner = raw
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
        .unwrap_or(raw)
        .replace("\\\"\"\"", "\"\"\"");

    let lines: Vec<&str> = inner.lines().collect();
    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut dedented: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.len() < common_indent {
                *line
            } else {
                &line[common_indent..]
            }
        })
        .collect();

    while dedented.first().is_some_and(|l| l.trim().is_empty()) {
        dedented.remove(0);
    }
    while dedented.last().is_some_and(|l| l.trim().is_empty()) {
        dedented.pop();
    }
    dedented.join("\n")
}

/// Tokenizes the entire source.
pub fn tokenize(source: &str, interner: &Interner) -> Vec<Token> {
    let mut lexer = Lexer::new(source, interner);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let interner = Interner::new();
        tokenize(source, &interner).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuation_skips_commas() {
        assert_eq!(
            kinds("{ } ( ) [ ] : = | & @ ! $ ,"),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Colon,
                TokenKind::Eq,
                TokenKind::Pipe,
                TokenKind::Amp,
                TokenKind::At,
                TokenKind::Bang,
                TokenKind::Dollar,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(
            kinds("extend type Product implements Node"),
            vec![
                TokenKind::Extend,
                TokenKind::Type,
                TokenKind::Ident,
                TokenKind::Implements,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 -17 3.14 1e10 2.5e-3"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        assert_eq!(
            kinds("# leading comment\nscalar _Any # trailing"),
            vec![TokenKind::Scalar, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds(r#""upc" "say \"hi\"" """block "quoted" string""""#),
            vec![
                TokenKind::StringLiteral,
                TokenKind::StringLiteral,
                TokenKind::BlockStringLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert_eq!(kinds("\"open\n"), vec![TokenKind::Error, TokenKind::Eof]);
    }

    #[test]
    fn test_string_value_escapes() {
        assert_eq!(string_value(r#""a\"b\nA""#).as_deref(), Some("a\"b\nA"));
        assert_eq!(string_value(r#""bad \q""#), None);
    }

    #[test]
    fn test_block_string_value_dedents() {
        let raw = "\"\"\"\n    The product catalogue.\n      Indented line.\n  \"\"\"";
        assert_eq!(
            block_string_value(raw),
            "The product catalogue.\n  Indented line."
        );
    }
}
