//! Compile error types for the analyser
//!
//! This module defines [`CompileError`], the single failure value a compilation
//! can produce. There is no recovery: the first error aborts the compilation and
//! no instructions are returned alongside it.

use super::symbols::Ty;
use crate::parser::lexer::{LexError, TokenKind};
use crate::parser::source::SourceLocation;
use std::fmt;

/// Errors that can occur while compiling a C0 unit
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The character stream could not be tokenized
    Tokenize(LexError),

    /// The next token matches no grammar alternative at this point
    ExpectedToken {
        expected: Vec<TokenKind>,
        found: TokenKind,
        location: SourceLocation,
    },

    /// Name declared twice in the same scope
    DuplicateDeclaration {
        name: String,
        location: SourceLocation,
    },

    /// Name not declared in any enclosing scope
    NotDeclared {
        name: String,
        location: SourceLocation,
    },

    /// Variable read before any assignment
    NotInitialized {
        name: String,
        location: SourceLocation,
    },

    /// Assignment to a `const` (or to a function name)
    AssignToConstant {
        name: String,
        location: SourceLocation,
    },

    /// Type name outside the accepted set, or `void` for a storage slot
    InvalidVariableType {
        name: String,
        location: SourceLocation,
    },

    /// Call through a name that is not a function
    NotAFunction {
        name: String,
        location: SourceLocation,
    },

    /// Function name used as a value
    NotAVariable {
        name: String,
        location: SourceLocation,
    },

    /// Function argument count mismatch
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// Expression of the wrong static type
    TypeMismatch {
        expected: Ty,
        found: Ty,
        location: SourceLocation,
    },

    /// String or double literal in value position
    UnsupportedLiteral {
        kind: TokenKind,
        location: SourceLocation,
    },

    /// `break` or `continue` outside a loop body
    NotInLoop {
        keyword: TokenKind,
        location: SourceLocation,
    },

    /// Assignment written as the operand of an operator, e.g. `1 + a = 2`
    AssignmentInOperand {
        name: String,
        location: SourceLocation,
    },
}

/// The category of a [`CompileError`], without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Tokenize,
    ExpectedToken,
    DuplicateDeclaration,
    NotDeclared,
    NotInitialized,
    AssignToConstant,
    InvalidVariableType,
    NotAFunction,
    NotAVariable,
    ArgumentCountMismatch,
    TypeMismatch,
    UnsupportedLiteral,
    NotInLoop,
    AssignmentInOperand,
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Tokenize(_) => ErrorKind::Tokenize,
            CompileError::ExpectedToken { .. } => ErrorKind::ExpectedToken,
            CompileError::DuplicateDeclaration { .. } => ErrorKind::DuplicateDeclaration,
            CompileError::NotDeclared { .. } => ErrorKind::NotDeclared,
            CompileError::NotInitialized { .. } => ErrorKind::NotInitialized,
            CompileError::AssignToConstant { .. } => ErrorKind::AssignToConstant,
            CompileError::InvalidVariableType { .. } => ErrorKind::InvalidVariableType,
            CompileError::NotAFunction { .. } => ErrorKind::NotAFunction,
            CompileError::NotAVariable { .. } => ErrorKind::NotAVariable,
            CompileError::ArgumentCountMismatch { .. } => ErrorKind::ArgumentCountMismatch,
            CompileError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CompileError::UnsupportedLiteral { .. } => ErrorKind::UnsupportedLiteral,
            CompileError::NotInLoop { .. } => ErrorKind::NotInLoop,
            CompileError::AssignmentInOperand { .. } => ErrorKind::AssignmentInOperand,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            CompileError::Tokenize(err) => err.location,
            CompileError::ExpectedToken { location, .. }
            | CompileError::DuplicateDeclaration { location, .. }
            | CompileError::NotDeclared { location, .. }
            | CompileError::NotInitialized { location, .. }
            | CompileError::AssignToConstant { location, .. }
            | CompileError::InvalidVariableType { location, .. }
            | CompileError::NotAFunction { location, .. }
            | CompileError::NotAVariable { location, .. }
            | CompileError::ArgumentCountMismatch { location, .. }
            | CompileError::TypeMismatch { location, .. }
            | CompileError::UnsupportedLiteral { location, .. }
            | CompileError::NotInLoop { location, .. }
            | CompileError::AssignmentInOperand { location, .. } => *location,
        }
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Tokenize(err)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let CompileError::Tokenize(err) = self {
            return write!(f, "{}", err);
        }

        let location = self.location();
        write!(
            f,
            "Compile error at line {}, column {}: ",
            location.line, location.column
        )?;

        match self {
            CompileError::Tokenize(_) => Ok(()),
            CompileError::ExpectedToken {
                expected, found, ..
            } => {
                let expected: Vec<String> = expected.iter().map(|k| k.to_string()).collect();
                if expected.len() == 1 {
                    write!(f, "Expected {}, found {}", expected[0], found)
                } else {
                    write!(f, "Expected one of {}, found {}", expected.join(", "), found)
                }
            }
            CompileError::DuplicateDeclaration { name, .. } => {
                write!(f, "'{}' is already declared in this scope", name)
            }
            CompileError::NotDeclared { name, .. } => {
                write!(f, "'{}' is not declared", name)
            }
            CompileError::NotInitialized { name, .. } => {
                write!(f, "Read from uninitialized variable '{}'", name)
            }
            CompileError::AssignToConstant { name, .. } => {
                write!(f, "Cannot assign to constant '{}'", name)
            }
            CompileError::InvalidVariableType { name, .. } => {
                write!(f, "'{}' is not a valid variable type", name)
            }
            CompileError::NotAFunction { name, .. } => {
                write!(f, "'{}' is not a function", name)
            }
            CompileError::NotAVariable { name, .. } => {
                write!(f, "Function '{}' cannot be used as a value", name)
            }
            CompileError::ArgumentCountMismatch {
                function,
                expected,
                got,
                ..
            } => {
                write!(
                    f,
                    "Function '{}' expects {} argument{}, got {}",
                    function,
                    expected,
                    if *expected == 1 { "" } else { "s" },
                    got
                )
            }
            CompileError::TypeMismatch {
                expected, found, ..
            } => {
                write!(f, "Type error: expected {}, got {}", expected, found)
            }
            CompileError::UnsupportedLiteral { kind, .. } => {
                write!(f, "Unsupported {} in expression", kind)
            }
            CompileError::NotInLoop { keyword, .. } => {
                write!(f, "{} outside of a loop", keyword)
            }
            CompileError::AssignmentInOperand { name, .. } => {
                write!(f, "Assignment to '{}' cannot be used as an operand", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::LexErrorKind;

    #[test]
    fn test_lex_errors_convert() {
        let lex = LexError::new(LexErrorKind::InvalidCharacter('#'), SourceLocation::new(3, 4));
        let err: CompileError = lex.into();
        assert_eq!(err.kind(), ErrorKind::Tokenize);
        assert_eq!(err.location(), SourceLocation::new(3, 4));
        assert_eq!(
            err.to_string(),
            "Lexer error at line 3, column 4: Unexpected character: '#'"
        );
    }

    #[test]
    fn test_display() {
        let err = CompileError::ExpectedToken {
            expected: vec![TokenKind::Semicolon],
            found: TokenKind::Eof,
            location: SourceLocation::new(1, 9),
        };
        assert_eq!(
            err.to_string(),
            "Compile error at line 1, column 9: Expected ';', found end of file"
        );

        let err = CompileError::ArgumentCountMismatch {
            function: "add".to_string(),
            expected: 1,
            got: 2,
            location: SourceLocation::new(2, 1),
        };
        assert!(err.to_string().ends_with("Function 'add' expects 1 argument, got 2"));
    }
}
