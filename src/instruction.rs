//! Stack-machine instruction model
//!
//! The analyser's only output. A [`Program`] is a flat, indexed sequence of
//! [`Instruction`]s; jump and call targets are indices into that sequence.
//!
//! # Stack Discipline
//!
//! Stack effect notation: `[..., a, b] -> [..., result]`
//!
//! | Operation | Operand | Effect |
//! |-----------|---------|--------|
//! | `LIT n`   | value   | `[...] -> [..., n]` |
//! | `LOD n`   | slot    | `[...] -> [..., frame[n]]` |
//! | `STO n`   | slot    | `[..., v] -> [...]`, `frame[n] = v` |
//! | `LODG n`  | slot    | like `LOD`, global frame |
//! | `STOG n`  | slot    | like `STO`, global frame |
//! | `ADD SUB MUL DIV` | | `[..., a, b] -> [..., a op b]` |
//! | `EQ NE LT GT LE GE` | | `[..., a, b] -> [..., 1 or 0]` |
//! | `POP`     |         | `[..., v] -> [...]` |
//! | `CALL a`  | address | arguments already pushed become slots `0..n` of a new frame |
//! | `RET`     |         | leave the frame; a returned value stays on top |
//! | `JMP a`   | address | continue at `a` |
//! | `JZ a`    | address | `[..., c] -> [...]`, continue at `a` if `c == 0` |

use crate::parser::source::SourceLocation;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Lit,
    Lod,
    Sto,
    Lodg,
    Stog,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Pop,
    Call,
    Ret,
    Jmp,
    Jz,
}

impl Operation {
    /// Whether instructions with this operation carry an operand
    pub fn has_operand(self) -> bool {
        matches!(
            self,
            Operation::Lit
                | Operation::Lod
                | Operation::Sto
                | Operation::Lodg
                | Operation::Stog
                | Operation::Call
                | Operation::Jmp
                | Operation::Jz
        )
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Operation::Jmp | Operation::Jz)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Operation::Lit => "LIT",
            Operation::Lod => "LOD",
            Operation::Sto => "STO",
            Operation::Lodg => "LODG",
            Operation::Stog => "STOG",
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
            Operation::Mul => "MUL",
            Operation::Div => "DIV",
            Operation::Eq => "EQ",
            Operation::Ne => "NE",
            Operation::Lt => "LT",
            Operation::Gt => "GT",
            Operation::Le => "LE",
            Operation::Ge => "GE",
            Operation::Pop => "POP",
            Operation::Call => "CALL",
            Operation::Ret => "RET",
            Operation::Jmp => "JMP",
            Operation::Jz => "JZ",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One operation plus its optional operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: Operation,
    pub operand: Option<u64>,
}

impl Instruction {
    pub fn new(op: Operation) -> Self {
        Self { op, operand: None }
    }

    pub fn with_operand(op: Operation, operand: u64) -> Self {
        Self {
            op,
            operand: Some(operand),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(operand) => write!(f, "{} {}", self.op, operand),
            None => write!(f, "{}", self.op),
        }
    }
}

/// A compiled compilation unit.
///
/// `locations[i]` is where the construct that emitted `instructions[i]` starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub locations: Vec<SourceLocation>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Indices of the instructions emitted for a given source line
    pub fn indices_for_line(&self, line: usize) -> Vec<usize> {
        self.locations
            .iter()
            .enumerate()
            .filter(|(_, loc)| loc.line == line)
            .map(|(i, _)| i)
            .collect()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:4}: {}", i, instruction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_display() {
        assert_eq!(Instruction::with_operand(Operation::Lit, 7).to_string(), "LIT 7");
        assert_eq!(Instruction::new(Operation::Add).to_string(), "ADD");
        assert_eq!(Instruction::with_operand(Operation::Stog, 2).to_string(), "STOG 2");
    }

    #[test]
    fn test_operand_table() {
        assert!(Operation::Jz.has_operand());
        assert!(Operation::Jz.is_jump());
        assert!(!Operation::Ret.has_operand());
        assert!(!Operation::Call.is_jump());
    }

    #[test]
    fn test_program_listing() {
        let program = Program {
            instructions: vec![
                Instruction::with_operand(Operation::Lit, 1),
                Instruction::with_operand(Operation::Sto, 0),
            ],
            locations: vec![SourceLocation::new(1, 14), SourceLocation::new(1, 1)],
        };
        assert_eq!(program.to_string(), "   0: LIT 1\n   1: STO 0\n");
        assert_eq!(program.indices_for_line(1), vec![0, 1]);
        assert!(program.indices_for_line(2).is_empty());
    }
}
