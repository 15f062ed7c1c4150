//! Lexer (tokenizer) for C0 source code
//!
//! Pulls characters from a [`CharSource`] and produces one [`Token`] per call
//! to [`Lexer::next_token`]. Multi-character operators are resolved with a
//! single character of lookahead (`-` / `->`, `=` / `==`, `!=`, `<` / `<=`,
//! `>` / `>=`). Once the source is drained every further call returns an
//! `Eof` token at the final cursor position.

use super::source::{CharSource, SourceLocation, StrSource};
use std::fmt;

/// Token categories.
///
/// Payloads (identifier names, literal values) live in [`TokenValue`] so that
/// kinds can be compared and listed in "expected one of" diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    UintLiteral,
    DoubleLiteral,
    StringLiteral,

    // Identifiers
    Ident,

    // Keywords
    FnKw,
    LetKw,
    ConstKw,
    AsKw,
    WhileKw,
    IfKw,
    ElseKw,
    ReturnKw,
    BreakKw,
    ContinueKw,

    // Operators
    Plus,   // +
    Minus,  // -
    Mul,    // *
    Div,    // /
    Assign, // =
    Eq,     // ==
    Neq,    // !=
    Lt,     // <
    Gt,     // >
    Le,     // <=
    Ge,     // >=
    Arrow,  // ->

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;

    // End of file
    Eof,
}

impl TokenKind {
    /// Map a word to its keyword kind, if it is one
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "fn" => TokenKind::FnKw,
            "let" => TokenKind::LetKw,
            "const" => TokenKind::ConstKw,
            "as" => TokenKind::AsKw,
            "while" => TokenKind::WhileKw,
            "if" => TokenKind::IfKw,
            "else" => TokenKind::ElseKw,
            "return" => TokenKind::ReturnKw,
            "break" => TokenKind::BreakKw,
            "continue" => TokenKind::ContinueKw,
            _ => return None,
        };
        Some(kind)
    }

    /// The fixed spelling of keywords, operators and punctuation
    pub fn lexeme(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::FnKw => "fn",
            TokenKind::LetKw => "let",
            TokenKind::ConstKw => "const",
            TokenKind::AsKw => "as",
            TokenKind::WhileKw => "while",
            TokenKind::IfKw => "if",
            TokenKind::ElseKw => "else",
            TokenKind::ReturnKw => "return",
            TokenKind::BreakKw => "break",
            TokenKind::ContinueKw => "continue",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Mul => "*",
            TokenKind::Div => "/",
            TokenKind::Assign => "=",
            TokenKind::Eq => "==",
            TokenKind::Neq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::Arrow => "->",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::UintLiteral
            | TokenKind::DoubleLiteral
            | TokenKind::StringLiteral
            | TokenKind::Ident
            | TokenKind::Eof => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::UintLiteral => write!(f, "integer literal"),
            TokenKind::DoubleLiteral => write!(f, "double literal"),
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::Eof => write!(f, "end of file"),
            other => match other.lexeme() {
                Some(text) => write!(f, "'{}'", text),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

/// Payload carried by a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Uint(u64),
    Double(f64),
    /// Identifier name or decoded string literal contents
    Text(String),
}

/// A token with the span of source it was read from.
///
/// `end` is the location just past the token's last character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        value: TokenValue,
        start: SourceLocation,
        end: SourceLocation,
    ) -> Self {
        Self {
            kind,
            value,
            start,
            end,
        }
    }

    /// Identifier name or string contents
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Take the text payload, empty for tokens that carry none
    pub fn into_text(self) -> String {
        match self.value {
            TokenValue::Text(s) => s,
            _ => String::new(),
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.value) {
            (TokenKind::Ident, TokenValue::Text(name)) => {
                write!(f, "identifier '{}'", name)
            }
            (TokenKind::StringLiteral, TokenValue::Text(s)) => {
                write!(f, "string literal {:?}", s)
            }
            (_, TokenValue::Uint(n)) => write!(f, "integer literal {}", n),
            (_, TokenValue::Double(d)) => write!(f, "double literal {}", d),
            (kind, _) => write!(f, "{}", kind),
        }
    }
}

/// Reasons tokenization can fail
#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    InvalidCharacter(char),
    /// An operator start that needs a second character, e.g. a bare `!`
    IncompleteOperator(char),
    IntegerOverflow(String),
    MalformedDouble(String),
    UnterminatedString,
    /// The character source failed to read
    Io(String),
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: SourceLocation,
}

impl LexError {
    pub fn new(kind: LexErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: ",
            self.location.line, self.location.column
        )?;
        match &self.kind {
            LexErrorKind::InvalidCharacter(c) => {
                write!(f, "Unexpected character: '{}'", c)
            }
            LexErrorKind::IncompleteOperator(c) => {
                write!(f, "'{}' must be followed by '='", c)
            }
            LexErrorKind::IntegerOverflow(text) => {
                write!(f, "Integer literal out of range: {}", text)
            }
            LexErrorKind::MalformedDouble(text) => {
                write!(f, "Malformed double literal: {}", text)
            }
            LexErrorKind::UnterminatedString => {
                write!(f, "Unterminated string literal")
            }
            LexErrorKind::Io(message) => write!(f, "Read failed: {}", message),
        }
    }
}

impl std::error::Error for LexError {}

/// Tokenize a whole string, up to and including the `Eof` token
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(StrSource::new(input)).tokenize()
}

/// Lexer for C0 source code
pub struct Lexer<S> {
    source: S,
}

impl<S: CharSource> Lexer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Tokenize the rest of the input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get next token
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace()?;

        let start = self.source.location();
        let Some(ch) = self.peek()? else {
            return Ok(Token::new(TokenKind::Eof, TokenValue::None, start, start));
        };

        if ch.is_ascii_digit() {
            self.number_literal(start)
        } else if ch.is_alphabetic() || ch == '_' {
            self.identifier_or_keyword(start)
        } else if ch == '"' || ch == '\'' {
            self.string_literal(start)
        } else {
            self.operator_or_punctuation(start)
        }
    }

    /// Parse unsigned integer or double literal
    fn number_literal(&mut self, start: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        self.take_digits(&mut text)?;

        if self.peek()? != Some('.') {
            let value = text.parse::<u64>().map_err(|_| {
                LexError::new(LexErrorKind::IntegerOverflow(text.clone()), start)
            })?;
            return Ok(self.finish(TokenKind::UintLiteral, TokenValue::Uint(value), start));
        }

        // Fraction: at least one digit after '.'
        self.advance()?;
        text.push('.');
        if !self.take_digits(&mut text)? {
            return Err(LexError::new(LexErrorKind::MalformedDouble(text), start));
        }

        // Optional exponent
        if let Some(e @ ('e' | 'E')) = self.peek()? {
            self.advance()?;
            text.push(e);
            if let Some(sign @ ('+' | '-')) = self.peek()? {
                self.advance()?;
                text.push(sign);
            }
            if !self.take_digits(&mut text)? {
                return Err(LexError::new(LexErrorKind::MalformedDouble(text), start));
            }
        }

        let value = text
            .parse::<f64>()
            .map_err(|_| LexError::new(LexErrorKind::MalformedDouble(text.clone()), start))?;
        Ok(self.finish(TokenKind::DoubleLiteral, TokenValue::Double(value), start))
    }

    /// Append ASCII digits to `text`; returns whether any were taken
    fn take_digits(&mut self, text: &mut String) -> Result<bool, LexError> {
        let mut any = false;
        while let Some(ch) = self.peek()? {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.advance()?;
            any = true;
        }
        Ok(any)
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, start: SourceLocation) -> Result<Token, LexError> {
        let mut ident = String::new();
        while let Some(ch) = self.peek()? {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance()?;
            } else {
                break;
            }
        }

        let token = match TokenKind::keyword(&ident) {
            Some(kind) => self.finish(kind, TokenValue::None, start),
            None => self.finish(TokenKind::Ident, TokenValue::Text(ident), start),
        };
        Ok(token)
    }

    /// Parse string literal delimited by `"` or `'`.
    ///
    /// Escapes are decoded pairwise, so a quote preceded by an odd run of
    /// backslashes stays in the string and one preceded by an even run closes it.
    /// An unknown escape is kept as written, backslash included.
    fn string_literal(&mut self, start: SourceLocation) -> Result<Token, LexError> {
        let unterminated = || LexError::new(LexErrorKind::UnterminatedString, start);
        let quote = self.advance()?.ok_or_else(unterminated)?;
        let mut string = String::new();

        loop {
            let ch = self.advance()?.ok_or_else(unterminated)?;
            if ch == quote {
                break;
            }
            if ch != '\\' {
                string.push(ch);
                continue;
            }

            let escaped = self.advance()?.ok_or_else(unterminated)?;
            match escaped {
                'n' => string.push('\n'),
                't' => string.push('\t'),
                'r' => string.push('\r'),
                '\\' | '"' | '\'' => string.push(escaped),
                other => {
                    string.push('\\');
                    string.push(other);
                }
            }
        }

        Ok(self.finish(TokenKind::StringLiteral, TokenValue::Text(string), start))
    }

    fn operator_or_punctuation(&mut self, start: SourceLocation) -> Result<Token, LexError> {
        let Some(ch) = self.advance()? else {
            return Ok(Token::new(TokenKind::Eof, TokenValue::None, start, start));
        };

        let kind = match ch {
            '+' => TokenKind::Plus,
            '*' => TokenKind::Mul,
            '/' => TokenKind::Div,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '-' => self.one_more('>', TokenKind::Arrow, TokenKind::Minus)?,
            '=' => self.one_more('=', TokenKind::Eq, TokenKind::Assign)?,
            '<' => self.one_more('=', TokenKind::Le, TokenKind::Lt)?,
            '>' => self.one_more('=', TokenKind::Ge, TokenKind::Gt)?,
            '!' => {
                if self.peek()? == Some('=') {
                    self.advance()?;
                    TokenKind::Neq
                } else {
                    return Err(LexError::new(LexErrorKind::IncompleteOperator('!'), start));
                }
            }
            _ => {
                return Err(LexError::new(LexErrorKind::InvalidCharacter(ch), start));
            }
        };

        Ok(self.finish(kind, TokenValue::None, start))
    }

    /// Pick `long` if the next character is `next` (consuming it), else `short`
    fn one_more(
        &mut self,
        next: char,
        long: TokenKind,
        short: TokenKind,
    ) -> Result<TokenKind, LexError> {
        if self.peek()? == Some(next) {
            self.advance()?;
            Ok(long)
        } else {
            Ok(short)
        }
    }

    fn skip_whitespace(&mut self) -> Result<(), LexError> {
        while let Some(ch) = self.peek()? {
            if !ch.is_whitespace() {
                break;
            }
            self.advance()?;
        }
        Ok(())
    }

    fn finish(&self, kind: TokenKind, value: TokenValue, start: SourceLocation) -> Token {
        Token::new(kind, value, start, self.source.location())
    }

    fn peek(&mut self) -> Result<Option<char>, LexError> {
        let location = self.source.location();
        self.source
            .peek()
            .map_err(|e| LexError::new(LexErrorKind::Io(e.to_string()), location))
    }

    fn advance(&mut self) -> Result<Option<char>, LexError> {
        let location = self.source.location();
        self.source
            .next_char()
            .map_err(|e| LexError::new(LexErrorKind::Io(e.to_string()), location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn single(input: &str) -> Token {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 2, "expected one token in {:?}", input);
        assert!(tokens[1].is(TokenKind::Eof));
        tokens[0].clone()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            kinds("let x: int = 1;"),
            vec![
                TokenKind::LetKw,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::UintLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("fn let const as while if else return break continue"),
            vec![
                TokenKind::FnKw,
                TokenKind::LetKw,
                TokenKind::ConstKw,
                TokenKind::AsKw,
                TokenKind::WhileKw,
                TokenKind::IfKw,
                TokenKind::ElseKw,
                TokenKind::ReturnKw,
                TokenKind::BreakKw,
                TokenKind::ContinueKw,
                TokenKind::Eof,
            ]
        );
        // Keyword prefixes are plain identifiers
        assert_eq!(single("iffy").text(), Some("iffy"));
        assert_eq!(single("_tmp1").text(), Some("_tmp1"));
    }

    #[test]
    fn test_operator_disambiguation() {
        assert_eq!(single("-").kind, TokenKind::Minus);
        assert_eq!(single("->").kind, TokenKind::Arrow);
        assert_eq!(single("=").kind, TokenKind::Assign);
        assert_eq!(single("==").kind, TokenKind::Eq);
        assert_eq!(single("!=").kind, TokenKind::Neq);
        assert_eq!(single("<").kind, TokenKind::Lt);
        assert_eq!(single("<=").kind, TokenKind::Le);
        assert_eq!(single(">").kind, TokenKind::Gt);
        assert_eq!(single(">=").kind, TokenKind::Ge);
        assert_eq!(
            kinds("a-->b"),
            vec![
                TokenKind::Ident,
                TokenKind::Minus,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("==="),
            vec![TokenKind::Eq, TokenKind::Assign, TokenKind::Eof]
        );
    }

    #[test]
    fn test_bare_bang_is_an_error() {
        let err = tokenize("a ! b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IncompleteOperator('!'));
        assert_eq!(err.location, SourceLocation::new(1, 3));
    }

    #[test]
    fn test_unknown_character() {
        let err = tokenize("let x\n  @").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidCharacter('@'));
        assert_eq!(err.location, SourceLocation::new(2, 3));
    }

    #[test]
    fn test_single_token_spans_whole_input() {
        for input in ["123", "foo", r#""a\"b""#, "<=", "3.25", "'x'"] {
            let token = single(input);
            assert_eq!(token.start, SourceLocation::new(1, 1));
            assert_eq!(
                token.end,
                SourceLocation::new(1, input.chars().count() + 1),
                "span of {:?}",
                input
            );
        }
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(single("123").value, TokenValue::Uint(123));
        assert_eq!(single("0").value, TokenValue::Uint(0));
        assert_eq!(
            single("18446744073709551615").value,
            TokenValue::Uint(u64::MAX)
        );

        let err = tokenize("18446744073709551616").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::IntegerOverflow(_)));
    }

    #[test]
    fn test_double_literals() {
        assert_eq!(single("3.25").value, TokenValue::Double(3.25));
        assert_eq!(single("1.5e3").value, TokenValue::Double(1500.0));
        assert_eq!(single("2.0E-1").value, TokenValue::Double(0.2));
        assert!(matches!(
            tokenize("1.").unwrap_err().kind,
            LexErrorKind::MalformedDouble(_)
        ));
        assert!(matches!(
            tokenize("1.0e+").unwrap_err().kind,
            LexErrorKind::MalformedDouble(_)
        ));
    }

    #[test]
    fn test_string_literal() {
        let token = single(r#""a\"b""#);
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.text(), Some("a\"b"));

        // Even run of backslashes: the quote closes the string
        let tokens = tokenize(r#""a\\" x"#).unwrap();
        assert_eq!(tokens[0].text(), Some("a\\"));
        assert!(tokens[1].is(TokenKind::Ident));

        assert_eq!(single(r#"'it\'s'"#).text(), Some("it's"));
        assert_eq!(single(r#"'say "hi"'"#).text(), Some("say \"hi\""));
        assert_eq!(single(r#""tab\there\n""#).text(), Some("tab\there\n"));
    }

    #[test]
    fn test_string_errors() {
        let err = tokenize("\"never closed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.location, SourceLocation::new(1, 1));

        // A trailing backslash escapes the closing quote
        let err = tokenize(r#"'abc\'"#).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn test_unknown_escapes_kept_verbatim() {
        let token = single(r#""C:\dir""#);
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.text(), Some("C:\\dir"));
        assert_eq!(token.end, SourceLocation::new(1, 9));

        assert_eq!(single(r#"'\q\n'"#).text(), Some("\\q\n"));
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new(StrSource::new("x \n "));
        assert!(lexer.next_token().unwrap().is(TokenKind::Ident));
        let eof = lexer.next_token().unwrap();
        assert!(eof.is(TokenKind::Eof));
        assert_eq!(eof.start, SourceLocation::new(2, 2));
        assert_eq!(eof.start, eof.end);
        for _ in 0..3 {
            assert_eq!(lexer.next_token().unwrap(), eof);
        }
    }

    #[test]
    fn test_unicode_whitespace_and_identifiers() {
        let tokens = tokenize("\u{3000}größe\u{00a0}=\t1").unwrap();
        assert_eq!(tokens[0].text(), Some("größe"));
        assert!(tokens[1].is(TokenKind::Assign));
        assert_eq!(tokens[2].value, TokenValue::Uint(1));
    }

    #[test]
    fn test_token_display() {
        let tokens = tokenize("foo 42 -> ;").unwrap();
        assert_eq!(tokens[0].to_string(), "identifier 'foo'");
        assert_eq!(tokens[1].to_string(), "integer literal 42");
        assert_eq!(tokens[2].to_string(), "'->'");
        assert_eq!(tokens[4].to_string(), "end of file");
    }
}
