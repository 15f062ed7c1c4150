//! C0 analyser: tokens in, stack-machine instructions out
//!
//! Syntax analysis, name resolution, type checking and code generation happen in
//! a single pass over the token stream; there is no syntax tree.
//!
//! - [`analyse`]: the [`Analyser`] struct, token helpers and code emission
//! - `declarations`, `statements`, `expressions`: grammar routines as `impl Analyser` blocks
//! - [`symbols`]: scoped symbol table and static types
//! - [`errors`]: [`CompileError`]
//!
//! # Entry Points
//!
//! - [`compile_program`]: `decl_stmt* function* EOF`, wrapped with the program
//!   prologue and epilogue (see `declarations`)
//! - [`compile_statements`]: `stmt* EOF` in the global scope, no epilogue
//!
//! Compilation stops at the first error.

pub mod analyse;
mod declarations;
pub mod errors;
mod expressions;
mod statements;
pub mod symbols;

pub use analyse::Analyser;
pub use errors::{CompileError, ErrorKind};
pub use symbols::Ty;

use crate::instruction::Program;
use crate::parser::lexer::Lexer;
use crate::parser::source::{CharSource, StrSource};

/// Compile a whole C0 program
pub fn compile_program(source: &str) -> Result<Program, CompileError> {
    compile_program_from(StrSource::new(source))
}

/// Compile a sequence of statements in the global scope
pub fn compile_statements(source: &str) -> Result<Program, CompileError> {
    compile_statements_from(StrSource::new(source))
}

pub fn compile_program_from<S: CharSource>(source: S) -> Result<Program, CompileError> {
    Analyser::new(Lexer::new(source)).analyse_program()
}

pub fn compile_statements_from<S: CharSource>(source: S) -> Result<Program, CompileError> {
    Analyser::new(Lexer::new(source)).analyse_statements()
}
