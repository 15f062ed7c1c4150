//! C0 front end: characters in, tokens out
//!
//! - [`source`]: character sources ([`source::CharSource`]) and source locations
//! - [`lexer`]: Tokenization (characters → tokens)
//!
//! # Lexical Surface
//!
//! - Keywords: `fn let const as while if else return break continue`
//! - Punctuation: `( ) { } , : ;`
//! - Operators: `+ - * / = == != < > <= >= ->`
//! - Literals: unsigned decimal integers, doubles (`1.5`, `2.0e-3`),
//!   strings quoted with `"` or `'` with backslash escapes
//!
//! # Lexer Implementation
//!
//! Hand-written, pull-based, one character of lookahead. No external lexer
//! generator dependencies.

pub mod lexer;
pub mod source;
