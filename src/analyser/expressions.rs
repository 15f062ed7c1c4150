//! Expression analysis
//!
//! This module implements precedence climbing for C0 expressions. Every routine
//! emits the code for its subexpression and returns the subexpression's static type.
//!
//! # Operator Precedence (lowest to highest)
//!
//! 1. Assignment: `=` (right-associative, handled at primary level)
//! 2. Relational: `==`, `!=`, `<`, `>`, `<=`, `>=`
//! 3. Additive: `+`, `-`
//! 4. Multiplicative: `*`, `/`
//! 5. Cast: `expr as ty`
//! 6. Unary: `-expr`
//! 7. Primary: literals, identifiers, calls, parenthesized expressions
//!
//! # Typing
//!
//! - Both operands of a binary operator must have the same non-void type
//! - Arithmetic yields the operand type, comparisons yield `int`
//! - `as` changes the static type only; no conversion code is emitted
//! - Assignment has type `void`, so it cannot be used as a value

use super::analyse::Analyser;
use super::errors::CompileError;
use super::symbols::Ty;
use crate::instruction::Operation;
use crate::parser::lexer::{Token, TokenKind, TokenValue};
use crate::parser::source::{CharSource, SourceLocation};

impl<S: CharSource> Analyser<S> {
    /// Analyse an expression (entry point)
    pub(crate) fn analyse_expr(&mut self) -> Result<Ty, CompileError> {
        let in_operand = std::mem::replace(&mut self.in_operand, false);
        let result = self.analyse_relational();
        self.in_operand = in_operand;
        result
    }

    /// Analyse the operand of an operator
    fn analyse_operand(
        &mut self,
        level: fn(&mut Self) -> Result<Ty, CompileError>,
    ) -> Result<Ty, CompileError> {
        let in_operand = std::mem::replace(&mut self.in_operand, true);
        let result = level(self);
        self.in_operand = in_operand;
        result
    }

    fn analyse_relational(&mut self) -> Result<Ty, CompileError> {
        let mut left = self.analyse_additive()?;

        loop {
            let op = match self.peek_kind()? {
                TokenKind::Eq => Operation::Eq,
                TokenKind::Neq => Operation::Ne,
                TokenKind::Lt => Operation::Lt,
                TokenKind::Gt => Operation::Gt,
                TokenKind::Le => Operation::Le,
                TokenKind::Ge => Operation::Ge,
                _ => break,
            };
            let loc = self.next()?.start;
            let right = self.analyse_operand(Self::analyse_additive)?;
            check_operands(left, right, loc)?;
            self.emit(op, loc);
            left = Ty::Int;
        }

        Ok(left)
    }

    fn analyse_additive(&mut self) -> Result<Ty, CompileError> {
        let mut left = self.analyse_multiplicative()?;

        loop {
            let op = match self.peek_kind()? {
                TokenKind::Plus => Operation::Add,
                TokenKind::Minus => Operation::Sub,
                _ => break,
            };
            let loc = self.next()?.start;
            let right = self.analyse_operand(Self::analyse_multiplicative)?;
            left = check_operands(left, right, loc)?;
            self.emit(op, loc);
        }

        Ok(left)
    }

    fn analyse_multiplicative(&mut self) -> Result<Ty, CompileError> {
        let mut left = self.analyse_cast()?;

        loop {
            let op = match self.peek_kind()? {
                TokenKind::Mul => Operation::Mul,
                TokenKind::Div => Operation::Div,
                _ => break,
            };
            let loc = self.next()?.start;
            let right = self.analyse_operand(Self::analyse_cast)?;
            left = check_operands(left, right, loc)?;
            self.emit(op, loc);
        }

        Ok(left)
    }

    fn analyse_cast(&mut self) -> Result<Ty, CompileError> {
        let mut ty = self.analyse_unary()?;

        while let Some(as_kw) = self.next_if(TokenKind::AsKw)? {
            let target = self.analyse_ty(false)?;
            if ty == Ty::Void {
                return Err(CompileError::TypeMismatch {
                    expected: target,
                    found: ty,
                    location: as_kw.start,
                });
            }
            ty = target;
        }

        Ok(ty)
    }

    /// `-e` is emitted as `0 - e`
    fn analyse_unary(&mut self) -> Result<Ty, CompileError> {
        let Some(minus) = self.next_if(TokenKind::Minus)? else {
            return self.analyse_primary();
        };

        self.emit_with(Operation::Lit, 0, minus.start);
        let operand_location = self.current_location()?;
        let ty = self.analyse_operand(Self::analyse_unary)?;
        if ty == Ty::Void {
            return Err(CompileError::TypeMismatch {
                expected: Ty::Int,
                found: ty,
                location: operand_location,
            });
        }
        self.emit(Operation::Sub, minus.start);
        Ok(ty)
    }

    fn analyse_primary(&mut self) -> Result<Ty, CompileError> {
        let token = self.next()?;

        if let TokenValue::Uint(value) = token.value {
            self.emit_with(Operation::Lit, value, token.start);
            return Ok(Ty::Int);
        }

        match token.kind {
            TokenKind::Ident => self.analyse_identifier(token),
            TokenKind::LParen => {
                let ty = self.analyse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(ty)
            }
            TokenKind::DoubleLiteral | TokenKind::StringLiteral => {
                Err(CompileError::UnsupportedLiteral {
                    kind: token.kind,
                    location: token.start,
                })
            }
            _ => Err(CompileError::ExpectedToken {
                expected: vec![
                    TokenKind::UintLiteral,
                    TokenKind::Ident,
                    TokenKind::LParen,
                    TokenKind::Minus,
                ],
                found: token.kind,
                location: token.start,
            }),
        }
    }

    /// An identifier starts a call, an assignment or a variable read
    fn analyse_identifier(&mut self, ident: Token) -> Result<Ty, CompileError> {
        let location = ident.start;
        let name = ident.into_text();
        match self.peek_kind()? {
            TokenKind::LParen => self.analyse_call(name, location),
            TokenKind::Assign => self.analyse_assignment(name, location),
            _ => self.analyse_load(name, location),
        }
    }

    fn analyse_load(&mut self, name: String, location: SourceLocation) -> Result<Ty, CompileError> {
        let entry = self.symbols.lookup(&name, location)?;
        if entry.function.is_some() {
            return Err(CompileError::NotAVariable { name, location });
        }
        if !entry.initialized {
            return Err(CompileError::NotInitialized { name, location });
        }

        let op = if self.is_global_access(entry.scope) {
            Operation::Lodg
        } else {
            Operation::Lod
        };
        let (offset, ty) = (entry.storage_offset as u64, entry.ty);
        self.emit_with(op, offset, location);
        Ok(ty)
    }

    /// `name = expr`, right-associative. The store is emitted after the value.
    fn analyse_assignment(
        &mut self,
        name: String,
        location: SourceLocation,
    ) -> Result<Ty, CompileError> {
        if self.in_operand {
            return Err(CompileError::AssignmentInOperand { name, location });
        }
        let entry = self.symbols.lookup(&name, location)?;
        if entry.is_constant() {
            return Err(CompileError::AssignToConstant { name, location });
        }
        let global = self.is_global_access(entry.scope);
        let (offset, target) = (entry.storage_offset as u64, entry.ty);

        self.expect(TokenKind::Assign)?;
        let value_location = self.current_location()?;
        let found = self.analyse_expr()?;
        if found != target {
            return Err(CompileError::TypeMismatch {
                expected: target,
                found,
                location: value_location,
            });
        }

        self.symbols.mark_initialized(&name, location)?;
        let op = if global { Operation::Stog } else { Operation::Sto };
        self.emit_with(op, offset, location);
        Ok(Ty::Void)
    }

    /// `name(args)`: arguments are pushed left to right, then `CALL entry`
    fn analyse_call(&mut self, name: String, location: SourceLocation) -> Result<Ty, CompileError> {
        let entry = self.symbols.lookup(&name, location)?;
        let Some(info) = entry.function.clone() else {
            return Err(CompileError::NotAFunction { name, location });
        };
        let return_type = entry.ty;

        self.expect(TokenKind::LParen)?;
        let mut count = 0;
        if !self.check(TokenKind::RParen)? {
            loop {
                let arg_location = self.current_location()?;
                let found = self.analyse_expr()?;
                if let Some(&expected) = info.params.get(count) {
                    if found != expected {
                        return Err(CompileError::TypeMismatch {
                            expected,
                            found,
                            location: arg_location,
                        });
                    }
                }
                count += 1;
                if self.next_if(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        if count != info.params.len() {
            return Err(CompileError::ArgumentCountMismatch {
                function: name,
                expected: info.params.len(),
                got: count,
                location,
            });
        }

        self.emit_with(Operation::Call, info.entry as u64, location);
        Ok(return_type)
    }
}

/// Both operands must share one non-void type, which is returned
fn check_operands(left: Ty, right: Ty, location: SourceLocation) -> Result<Ty, CompileError> {
    if left == Ty::Void {
        return Err(CompileError::TypeMismatch {
            expected: Ty::Int,
            found: left,
            location,
        });
    }
    if right != left {
        return Err(CompileError::TypeMismatch {
            expected: left,
            found: right,
            location,
        });
    }
    Ok(left)
}

#[cfg(test)]
mod tests {
    use crate::analyser::errors::{CompileError, ErrorKind};
    use crate::analyser::symbols::Ty;
    use crate::analyser::{compile_program, compile_statements};
    use crate::instruction::{Instruction, Operation};
    use crate::parser::lexer::TokenKind;
    use crate::parser::source::SourceLocation;

    fn ops(source: &str) -> Vec<Instruction> {
        compile_statements(source).unwrap().instructions
    }

    fn err(source: &str) -> CompileError {
        compile_statements(source).unwrap_err()
    }

    fn with(op: Operation, n: u64) -> Instruction {
        Instruction::with_operand(op, n)
    }

    fn op(op: Operation) -> Instruction {
        Instruction::new(op)
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            ops("1 + 2 * 3;"),
            vec![
                with(Operation::Lit, 1),
                with(Operation::Lit, 2),
                with(Operation::Lit, 3),
                op(Operation::Mul),
                op(Operation::Add),
                op(Operation::Pop),
            ]
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(
            ops("8 - 4 - 2;"),
            vec![
                with(Operation::Lit, 8),
                with(Operation::Lit, 4),
                op(Operation::Sub),
                with(Operation::Lit, 2),
                op(Operation::Sub),
                op(Operation::Pop),
            ]
        );
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(
            ops("(1 + 2) * 3;"),
            vec![
                with(Operation::Lit, 1),
                with(Operation::Lit, 2),
                op(Operation::Add),
                with(Operation::Lit, 3),
                op(Operation::Mul),
                op(Operation::Pop),
            ]
        );
    }

    #[test]
    fn test_comparison_below_arithmetic() {
        assert_eq!(
            ops("1 + 1 <= 3;"),
            vec![
                with(Operation::Lit, 1),
                with(Operation::Lit, 1),
                op(Operation::Add),
                with(Operation::Lit, 3),
                op(Operation::Le),
                op(Operation::Pop),
            ]
        );
    }

    #[test]
    fn test_negation() {
        assert_eq!(
            ops("-5;"),
            vec![
                with(Operation::Lit, 0),
                with(Operation::Lit, 5),
                op(Operation::Sub),
                op(Operation::Pop),
            ]
        );
        assert_eq!(ops("--5;").len(), 6);
    }

    #[test]
    fn test_cast_changes_type_only() {
        assert_eq!(
            ops("let d: double = 2 as double;"),
            vec![with(Operation::Lit, 2), with(Operation::Sto, 0)]
        );
        let e = err("let d: double; d = 2 as double; d + 1;");
        assert_eq!(
            e,
            CompileError::TypeMismatch {
                expected: Ty::Double,
                found: Ty::Int,
                location: SourceLocation::new(1, 35),
            }
        );
    }

    #[test]
    fn test_assignment_is_right_associative_and_void() {
        let e = err("let a: int; let b: int; a = b = 1;");
        assert_eq!(
            e,
            CompileError::TypeMismatch {
                expected: Ty::Int,
                found: Ty::Void,
                location: SourceLocation::new(1, 29),
            }
        );
    }

    #[test]
    fn test_assignment_as_operand_rejected() {
        assert_eq!(
            err("let a: int = 0; 1 + a = 2;"),
            CompileError::AssignmentInOperand {
                name: "a".to_string(),
                location: SourceLocation::new(1, 21),
            }
        );
        assert_eq!(
            err("let a: int = 0; let b: int = 0; a + b = 2;").kind(),
            ErrorKind::AssignmentInOperand
        );
        assert_eq!(
            err("let a: int = 0; -a = 1;"),
            CompileError::AssignmentInOperand {
                name: "a".to_string(),
                location: SourceLocation::new(1, 18),
            }
        );

        // Parentheses start a new expression
        assert_eq!(
            ops("let a: int = 0; (a = 2);"),
            vec![
                with(Operation::Lit, 0),
                with(Operation::Sto, 0),
                with(Operation::Lit, 2),
                with(Operation::Sto, 0),
            ]
        );
        assert_eq!(
            err("let a: int = 0; 1 + (a = 2);").kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_assignment_marks_initialized() {
        assert_eq!(
            ops("let a: int; a = 3; a;"),
            vec![
                with(Operation::Lit, 3),
                with(Operation::Sto, 0),
                with(Operation::Lod, 0),
                op(Operation::Pop),
            ]
        );
    }

    #[test]
    fn test_name_errors() {
        assert_eq!(
            err("x;"),
            CompileError::NotDeclared {
                name: "x".to_string(),
                location: SourceLocation::new(1, 1),
            }
        );
        assert_eq!(
            err("let x: int; x + 1;"),
            CompileError::NotInitialized {
                name: "x".to_string(),
                location: SourceLocation::new(1, 13),
            }
        );
        assert_eq!(
            err("const c: int = 1; c = 2;"),
            CompileError::AssignToConstant {
                name: "c".to_string(),
                location: SourceLocation::new(1, 19),
            }
        );
        assert_eq!(err("let x: int = 1; x(1);").kind(), ErrorKind::NotAFunction);
    }

    #[test]
    fn test_unsupported_literals() {
        assert_eq!(
            err("1.5;"),
            CompileError::UnsupportedLiteral {
                kind: TokenKind::DoubleLiteral,
                location: SourceLocation::new(1, 1),
            }
        );
        assert_eq!(err("\"hi\";").kind(), ErrorKind::UnsupportedLiteral);
    }

    #[test]
    fn test_missing_operand() {
        assert_eq!(
            err("1 + ;"),
            CompileError::ExpectedToken {
                expected: vec![
                    TokenKind::UintLiteral,
                    TokenKind::Ident,
                    TokenKind::LParen,
                    TokenKind::Minus,
                ],
                found: TokenKind::Semicolon,
                location: SourceLocation::new(1, 5),
            }
        );
        assert_eq!(err("(1 + 2;").kind(), ErrorKind::ExpectedToken);
    }

    #[test]
    fn test_calls() {
        let program = compile_program(
            "fn add(a: int, b: int) -> int { return a + b; }\n\
             fn main() -> void { add(1, 2); }",
        )
        .unwrap();
        let main = &program.instructions[6..];
        assert_eq!(
            &main[..4],
            &[
                with(Operation::Lit, 1),
                with(Operation::Lit, 2),
                with(Operation::Call, 1),
                op(Operation::Pop),
            ]
        );
    }

    #[test]
    fn test_call_errors() {
        let e = compile_program("fn f(a: int) -> int { return a; } fn main() -> void { f(1, 2); }")
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ArgumentCountMismatch);

        let e = compile_program("fn f() -> void { } fn main() -> void { f; }").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotAVariable);

        let e = compile_program("fn f() -> void { } fn main() -> void { f() + 1; }").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TypeMismatch);

        let e = compile_program("fn f() -> void { } fn g(a: int) -> void { } fn main() -> void { g(f()); }")
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TypeMismatch);

        let e = compile_program("fn f() -> void { } fn main() -> void { f = 1; }").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AssignToConstant);
    }
}
