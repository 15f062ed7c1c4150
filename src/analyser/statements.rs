//! Statement analysis
//!
//! This module handles all statement types and the control-flow code they emit:
//!
//! - Declarations: `let`, `const` (see `declarations`)
//! - Control flow: `if`/`else`, `while`, `break`, `continue`, `return`
//! - Blocks: `{ ... }` with their own scope
//! - Expression statements and the empty statement `;`
//!
//! # Generated Code
//!
//! ```text
//! if c { A } else { B }      while c { A }
//!     <c>                    head: <c>
//!     JZ else                      JZ end
//!     <A>                          <A>
//!     JMP end                      JMP head
//! else: <B>                  end:
//! end:
//! ```
//!
//! Forward jumps are emitted with a placeholder target and backpatched once the
//! target address is known.

use super::analyse::{Analyser, LoopContext};
use super::errors::CompileError;
use super::symbols::Ty;
use crate::instruction::Operation;
use crate::parser::lexer::TokenKind;
use crate::parser::source::CharSource;

impl<S: CharSource> Analyser<S> {
    /// Analyse statements until end of input
    pub(crate) fn analyse_statement_sequence(&mut self) -> Result<(), CompileError> {
        while !self.check(TokenKind::Eof)? {
            self.analyse_stmt()?;
        }
        Ok(())
    }

    pub(crate) fn analyse_stmt(&mut self) -> Result<(), CompileError> {
        match self.peek_kind()? {
            TokenKind::LetKw | TokenKind::ConstKw => self.analyse_decl_stmt(),
            TokenKind::IfKw => self.analyse_if_stmt(),
            TokenKind::WhileKw => self.analyse_while_stmt(),
            TokenKind::ReturnKw => self.analyse_return_stmt(),
            TokenKind::BreakKw | TokenKind::ContinueKw => self.analyse_loop_jump(),
            TokenKind::LBrace => self.analyse_block_stmt(),
            TokenKind::Semicolon => {
                self.next()?;
                Ok(())
            }
            _ => self.analyse_expr_stmt(),
        }
    }

    /// Expression statement; a produced value is discarded
    fn analyse_expr_stmt(&mut self) -> Result<(), CompileError> {
        let location = self.current_location()?;
        let ty = self.analyse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        if ty != Ty::Void {
            self.emit(Operation::Pop, location);
        }
        Ok(())
    }

    pub(crate) fn analyse_block_stmt(&mut self) -> Result<(), CompileError> {
        self.expect(TokenKind::LBrace)?;
        self.symbols.enter_scope();

        while !self.check(TokenKind::RBrace)? {
            if self.check(TokenKind::Eof)? {
                return self.expected(&[TokenKind::RBrace]);
            }
            self.analyse_stmt()?;
        }

        self.expect(TokenKind::RBrace)?;
        self.symbols.exit_scope();
        Ok(())
    }

    /// Analyse a condition, which must produce a value
    fn analyse_condition(&mut self) -> Result<(), CompileError> {
        let location = self.current_location()?;
        let ty = self.analyse_expr()?;
        if ty == Ty::Void {
            return Err(CompileError::TypeMismatch {
                expected: Ty::Int,
                found: ty,
                location,
            });
        }
        Ok(())
    }

    fn analyse_if_stmt(&mut self) -> Result<(), CompileError> {
        let if_kw = self.expect(TokenKind::IfKw)?;
        self.analyse_condition()?;
        let skip_then = self.emit_jump(Operation::Jz, if_kw.start);
        self.analyse_block_stmt()?;

        let Some(else_kw) = self.next_if(TokenKind::ElseKw)? else {
            self.patch_here(skip_then);
            return Ok(());
        };

        let skip_else = self.emit_jump(Operation::Jmp, else_kw.start);
        self.patch_here(skip_then);
        match self.peek_kind()? {
            TokenKind::LBrace => self.analyse_block_stmt()?,
            TokenKind::IfKw => self.analyse_if_stmt()?,
            _ => return self.expected(&[TokenKind::LBrace, TokenKind::IfKw]),
        }
        self.patch_here(skip_else);
        Ok(())
    }

    fn analyse_while_stmt(&mut self) -> Result<(), CompileError> {
        let while_kw = self.expect(TokenKind::WhileKw)?;
        let head = self.next_address();
        self.analyse_condition()?;
        let exit = self.emit_jump(Operation::Jz, while_kw.start);

        self.loops.push(LoopContext {
            head,
            breaks: Vec::new(),
        });
        self.analyse_block_stmt()?;
        let context = self.loops.pop();

        self.emit_with(Operation::Jmp, head as u64, while_kw.start);
        self.patch_here(exit);
        for jump in context.map(|c| c.breaks).unwrap_or_default() {
            self.patch_here(jump);
        }
        Ok(())
    }

    /// `break;` jumps past the innermost loop, `continue;` back to its condition
    fn analyse_loop_jump(&mut self) -> Result<(), CompileError> {
        let keyword = self.next()?;
        let Some(head) = self.loops.last().map(|l| l.head) else {
            return Err(CompileError::NotInLoop {
                keyword: keyword.kind,
                location: keyword.start,
            });
        };
        self.expect(TokenKind::Semicolon)?;

        if keyword.is(TokenKind::BreakKw) {
            let jump = self.emit_jump(Operation::Jmp, keyword.start);
            if let Some(context) = self.loops.last_mut() {
                context.breaks.push(jump);
            }
        } else {
            self.emit_with(Operation::Jmp, head as u64, keyword.start);
        }
        Ok(())
    }

    /// `return expr?;`, checked against the enclosing function's return type.
    /// Outside a function the value is not checked.
    fn analyse_return_stmt(&mut self) -> Result<(), CompileError> {
        let return_kw = self.expect(TokenKind::ReturnKw)?;
        let value_location = self.current_location()?;
        let found = if self.check(TokenKind::Semicolon)? {
            Ty::Void
        } else {
            self.analyse_expr()?
        };

        if let Some(function) = self.function {
            if found != function.return_type {
                return Err(CompileError::TypeMismatch {
                    expected: function.return_type,
                    found,
                    location: value_location,
                });
            }
        }

        self.expect(TokenKind::Semicolon)?;
        self.emit(Operation::Ret, return_kw.start);
        Ok(())
    }
}
