//! # Introduction
//!
//! c0front compiles C0, a small statically typed teaching language, into code
//! for a simple stack machine. Syntax analysis, name resolution, type checking
//! and code generation all happen in one pass over the token stream; no syntax
//! tree is built. The resulting listing can be browsed next to the source in a
//! terminal UI built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Compilation pipeline
//!
//! ```text
//! CharSource → Lexer → Analyser (+ SymbolTable) → Program → listing / TUI
//! ```
//!
//! 1. [`parser`]: character sources and the pull-based lexer.
//! 2. [`analyser`]: recursive descent with precedence climbing; emits
//!    instructions as it recognises constructs and backpatches jumps.
//! 3. [`instruction`]: the stack-machine [`instruction::Operation`] set and the
//!    compiled [`instruction::Program`] with its source map.
//! 4. [`ui`]: ratatui-based viewer; not part of the stable library API.
//!
//! ## Supported C0 subset
//!
//! Types: `int`, `double`, `char`, `void` (return types only).
//! Declarations: `let`, `const`, `fn` with typed parameters.
//! Control flow: `if/else`, `while`, `break`, `continue`, `return`.
//! Expressions: `+ - * /`, comparisons, unary `-`, `as` casts, calls, assignment.
//!
//! ```
//! use c0front::analyser::compile_statements;
//! use c0front::instruction::Operation;
//!
//! let program = compile_statements("let a: int = 1; a = a + 2;").unwrap();
//! assert_eq!(program.instructions.last().unwrap().op, Operation::Sto);
//! ```

pub mod analyser;
pub mod instruction;
pub mod parser;
pub mod ui;
