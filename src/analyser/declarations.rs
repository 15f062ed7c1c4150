//! Declaration analysis
//!
//! This module handles the program structure and everything that introduces a name:
//!
//! - Program layout: global declarations, then function definitions
//! - Variable and constant declarations: `let x: int = e;`, `const c: int = e;`
//! - Type names: `void`, `int`, `double`, `char`
//! - Function definitions and their parameter lists
//!
//! # Grammar
//!
//! ```text
//! program   ::= decl_stmt* function* EOF
//! decl_stmt ::= ("let" | "const") IDENT ":" ty ("=" expr)? ";"
//! function  ::= "fn" IDENT "(" (param ("," param)*)? ")" "->" ty block
//! param     ::= "const"? IDENT ":" ty
//! ty        ::= IDENT
//! ```
//!
//! # Program Layout
//!
//! ```text
//! [global initializers] [JMP past functions] [function bodies] [CALL main] RET
//! ```
//!
//! The jump is only emitted when at least one function exists, the call only when
//! a function named `main` exists.

use super::analyse::{Analyser, FunctionContext};
use super::errors::CompileError;
use super::symbols::{FunctionInfo, Ty};
use crate::instruction::Operation;
use crate::parser::lexer::TokenKind;
use crate::parser::source::{CharSource, SourceLocation};

/// A parsed parameter, declared once the function scope is entered
struct Param {
    name: String,
    location: SourceLocation,
    is_constant: bool,
    ty: Ty,
}

impl<S: CharSource> Analyser<S> {
    /// Analyse a whole compilation unit
    pub(crate) fn analyse_program_unit(&mut self) -> Result<(), CompileError> {
        while self.check(TokenKind::LetKw)? || self.check(TokenKind::ConstKw)? {
            self.analyse_decl_stmt()?;
        }

        if self.check(TokenKind::FnKw)? {
            let location = self.current_location()?;
            let skip = self.emit_jump(Operation::Jmp, location);
            while self.check(TokenKind::FnKw)? {
                self.analyse_function()?;
            }
            self.patch_here(skip);
            if !self.check(TokenKind::Eof)? {
                return self.expected(&[TokenKind::FnKw, TokenKind::Eof]);
            }
        } else if !self.check(TokenKind::Eof)? {
            return self.expected(&[
                TokenKind::LetKw,
                TokenKind::ConstKw,
                TokenKind::FnKw,
                TokenKind::Eof,
            ]);
        }

        let end = self.expect(TokenKind::Eof)?.start;
        self.emit_main_call(end)?;
        self.emit(Operation::Ret, end);
        Ok(())
    }

    fn emit_main_call(&mut self, location: SourceLocation) -> Result<(), CompileError> {
        let Ok(main) = self.symbols.lookup("main", location) else {
            return Ok(());
        };
        let Some(info) = &main.function else {
            return Ok(());
        };
        if !info.params.is_empty() {
            return Err(CompileError::ArgumentCountMismatch {
                function: main.name.clone(),
                expected: info.params.len(),
                got: 0,
                location,
            });
        }
        let entry = info.entry as u64;
        self.emit_with(Operation::Call, entry, location);
        Ok(())
    }

    /// Analyse `let`/`const` declarations.
    ///
    /// The name is declared before the initializer is analysed, so the
    /// initializer cannot read it: `let x: int = x;` fails with `NotInitialized`.
    pub(crate) fn analyse_decl_stmt(&mut self) -> Result<(), CompileError> {
        let is_constant = match self.peek_kind()? {
            TokenKind::LetKw => false,
            TokenKind::ConstKw => true,
            _ => return self.expected(&[TokenKind::LetKw, TokenKind::ConstKw]),
        };
        let keyword = self.next()?;

        let (name, name_location) = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.analyse_ty(false)?;

        let entry = self.symbols.declare(&name, is_constant, ty, name_location)?;
        let (offset, scope) = (entry.storage_offset as u64, entry.scope);

        let assign = if is_constant {
            Some(self.expect(TokenKind::Assign)?)
        } else {
            self.next_if(TokenKind::Assign)?
        };

        if assign.is_some() {
            let value_location = self.current_location()?;
            let found = self.analyse_expr()?;
            if found != ty {
                return Err(CompileError::TypeMismatch {
                    expected: ty,
                    found,
                    location: value_location,
                });
            }
            let op = if self.is_global_access(scope) {
                Operation::Stog
            } else {
                Operation::Sto
            };
            self.emit_with(op, offset, keyword.start);
            self.symbols.mark_initialized(&name, name_location)?;
        }

        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    /// Analyse a type name. `void` is only accepted where `allow_void` is set.
    pub(crate) fn analyse_ty(&mut self, allow_void: bool) -> Result<Ty, CompileError> {
        let token = self.expect(TokenKind::Ident)?;
        let location = token.start;
        match Ty::from_name(token.text().unwrap_or_default()) {
            Some(Ty::Void) if !allow_void => Err(CompileError::InvalidVariableType {
                name: token.into_text(),
                location,
            }),
            Some(ty) => Ok(ty),
            None => Err(CompileError::InvalidVariableType {
                name: token.into_text(),
                location,
            }),
        }
    }

    /// Analyse a function definition.
    ///
    /// The function is declared before its body, with its entry at the next
    /// instruction, so it can call itself.
    pub(crate) fn analyse_function(&mut self) -> Result<(), CompileError> {
        self.expect(TokenKind::FnKw)?;
        let (name, name_location) = self.expect_identifier()?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen)? {
            loop {
                params.push(self.analyse_param()?);
                if self.next_if(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let return_type = self.analyse_ty(true)?;

        let info = FunctionInfo {
            entry: self.next_address(),
            params: params.iter().map(|p| p.ty).collect(),
        };
        self.symbols
            .declare_function(&name, return_type, info, name_location)?;

        self.symbols.enter_function_scope();
        self.function = Some(FunctionContext { return_type });

        for param in &params {
            self.symbols
                .declare(&param.name, param.is_constant, param.ty, param.location)?;
            self.symbols.mark_initialized(&param.name, param.location)?;
        }

        // Parameters and top-level body declarations share one scope
        self.expect(TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace)? {
            if self.check(TokenKind::Eof)? {
                return self.expected(&[TokenKind::RBrace]);
            }
            self.analyse_stmt()?;
        }
        let close = self.expect(TokenKind::RBrace)?;
        self.emit(Operation::Ret, close.start);

        self.function = None;
        self.symbols.exit_scope();
        Ok(())
    }

    fn analyse_param(&mut self) -> Result<Param, CompileError> {
        let is_constant = self.next_if(TokenKind::ConstKw)?.is_some();
        let (name, location) = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.analyse_ty(false)?;
        Ok(Param {
            name,
            location,
            is_constant,
            ty,
        })
    }
}
