//! Main analyser coordinator
//!
//! This module provides the [`Analyser`] struct and the machinery every grammar
//! routine shares: the one-token lookahead buffer, `expect`-style helpers and
//! instruction emission with backpatching.
//!
//! # Analyser Architecture
//!
//! The Analyser parses, resolves names and emits code in one pass:
//! - This module: Analyser struct, token helpers, emission, entry points
//! - `declarations`: program structure, `let`/`const`, types, functions
//! - `statements`: statements and control-flow code generation
//! - `expressions`: precedence climbing with code generation
//!
//! # Implementation
//!
//! Analyser methods are split across multiple files using `impl Analyser` blocks,
//! allowing each module to extend the Analyser with related functionality while
//! maintaining access to the shared analyser state.

use super::errors::CompileError;
use super::symbols::{SymbolScope, SymbolTable, Ty};
use crate::instruction::{Instruction, Operation, Program};
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::source::{CharSource, SourceLocation};

/// The function whose body is being analysed
#[derive(Debug, Clone, Copy)]
pub(crate) struct FunctionContext {
    pub return_type: Ty,
}

/// An enclosing `while` loop
#[derive(Debug, Clone)]
pub(crate) struct LoopContext {
    /// Address of the condition, target of `continue`
    pub head: usize,
    /// `JMP`s emitted for `break`, patched when the loop ends
    pub breaks: Vec<usize>,
}

/// Single-pass recursive descent analyser for C0
pub struct Analyser<S> {
    lexer: Lexer<S>,
    peeked: Option<Token>,
    pub(crate) symbols: SymbolTable,
    program: Program,
    pub(crate) function: Option<FunctionContext>,
    pub(crate) loops: Vec<LoopContext>,
    /// Set while analysing the operand of an operator, where assignment is not allowed
    pub(crate) in_operand: bool,
}

impl<S: CharSource> Analyser<S> {
    pub fn new(lexer: Lexer<S>) -> Self {
        Self {
            lexer,
            peeked: None,
            symbols: SymbolTable::new(),
            program: Program::default(),
            function: None,
            loops: Vec::new(),
            in_operand: false,
        }
    }

    /// Compile `decl_stmt* function* EOF`
    pub fn analyse_program(mut self) -> Result<Program, CompileError> {
        self.analyse_program_unit()?;
        Ok(self.program)
    }

    /// Compile `stmt* EOF` in the global scope
    pub fn analyse_statements(mut self) -> Result<Program, CompileError> {
        self.analyse_statement_sequence()?;
        self.expect(TokenKind::Eof)?;
        Ok(self.program)
    }

    // ===== Token helpers =====

    pub(crate) fn peek(&mut self) -> Result<&Token, CompileError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(&*self.peeked.insert(token))
    }

    pub(crate) fn peek_kind(&mut self) -> Result<TokenKind, CompileError> {
        Ok(self.peek()?.kind)
    }

    pub(crate) fn next(&mut self) -> Result<Token, CompileError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => Ok(self.lexer.next_token()?),
        }
    }

    pub(crate) fn check(&mut self, kind: TokenKind) -> Result<bool, CompileError> {
        Ok(self.peek_kind()? == kind)
    }

    /// Consume the next token if it has the given kind
    pub(crate) fn next_if(&mut self, kind: TokenKind) -> Result<Option<Token>, CompileError> {
        if self.check(kind)? {
            self.next().map(Some)
        } else {
            Ok(None)
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        if self.check(kind)? {
            self.next()
        } else {
            self.expected(&[kind])
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<(String, SourceLocation), CompileError> {
        let token = self.expect(TokenKind::Ident)?;
        let location = token.start;
        Ok((token.into_text(), location))
    }

    /// Fail with an expected-token error describing the next token
    pub(crate) fn expected<T>(&mut self, expected: &[TokenKind]) -> Result<T, CompileError> {
        let token = self.peek()?;
        Err(CompileError::ExpectedToken {
            expected: expected.to_vec(),
            found: token.kind,
            location: token.start,
        })
    }

    pub(crate) fn current_location(&mut self) -> Result<SourceLocation, CompileError> {
        Ok(self.peek()?.start)
    }

    // ===== Code emission =====

    /// Address the next emitted instruction will get
    pub(crate) fn next_address(&self) -> usize {
        self.program.instructions.len()
    }

    pub(crate) fn emit(&mut self, op: Operation, location: SourceLocation) -> usize {
        self.push(Instruction::new(op), location)
    }

    pub(crate) fn emit_with(
        &mut self,
        op: Operation,
        operand: u64,
        location: SourceLocation,
    ) -> usize {
        self.push(Instruction::with_operand(op, operand), location)
    }

    /// Emit a jump whose target is not known yet
    pub(crate) fn emit_jump(&mut self, op: Operation, location: SourceLocation) -> usize {
        self.emit_with(op, 0, location)
    }

    /// Point the jump at `index` to the next instruction to be emitted
    pub(crate) fn patch_here(&mut self, index: usize) {
        let target = self.next_address() as u64;
        self.program.instructions[index].operand = Some(target);
    }

    fn push(&mut self, instruction: Instruction, location: SourceLocation) -> usize {
        self.program.instructions.push(instruction);
        self.program.locations.push(location);
        self.program.instructions.len() - 1
    }

    /// Whether a symbol in `scope` must be reached with `LODG`/`STOG`
    pub(crate) fn is_global_access(&self, scope: SymbolScope) -> bool {
        scope == SymbolScope::Global && self.function.is_some()
    }
}
