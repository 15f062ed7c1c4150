//! Scoped symbol table
//!
//! - [`SymbolTable`]: a stack of scope frames, global frame at the bottom
//! - [`SymbolEntry`]: declaration metadata for one name
//! - [`Ty`]: the static types a declaration can carry
//!
//! # Slot Allocation
//!
//! Every frame owns a slot counter. Declaring a variable or constant takes the
//! next slot of the current frame:
//! - a block frame starts counting where its parent is, so a block's slots
//!   never overlap the live slots of enclosing blocks
//! - a function frame starts again at 0 (slots are frame-relative at runtime)
//! - popping a frame leaves the parent's counter untouched, so sibling blocks
//!   reuse the same slots
//!
//! Functions are declared in the global frame but take no slot.

use super::errors::CompileError;
use crate::parser::source::SourceLocation;
use rustc_hash::FxHashMap;
use std::fmt;

/// Static types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Void,
    Int,
    Double,
    Char,
}

impl Ty {
    /// Accepted type names
    pub const NAMES: [(&'static str, Ty); 4] = [
        ("void", Ty::Void),
        ("int", Ty::Int),
        ("double", Ty::Double),
        ("char", Ty::Char),
    ];

    pub fn from_name(name: &str) -> Option<Ty> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, ty)| *ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            Ty::Void => "void",
            Ty::Int => "int",
            Ty::Double => "double",
            Ty::Char => "char",
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Constant,
    Variable,
}

/// Whether a symbol lives in the global frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
}

/// Call signature of a function symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Index of the function's first instruction
    pub entry: usize,
    pub params: Vec<Ty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub initialized: bool,
    pub ty: Ty,
    pub storage_offset: usize,
    pub scope: SymbolScope,
    pub function: Option<FunctionInfo>,
}

impl SymbolEntry {
    pub fn is_constant(&self) -> bool {
        self.kind == SymbolKind::Constant
    }

    pub fn function_offset(&self) -> Option<usize> {
        self.function.as_ref().map(|f| f.entry)
    }
}

#[derive(Debug, Clone, Default)]
struct ScopeFrame {
    symbols: FxHashMap<String, SymbolEntry>,
    next_offset: usize,
}

/// Stack of scope frames; lookups walk from the innermost frame outwards
#[derive(Debug, Clone)]
pub struct SymbolTable {
    frames: Vec<ScopeFrame>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            frames: vec![ScopeFrame::default()],
        }
    }

    /// Enter a block scope
    pub fn enter_scope(&mut self) {
        let next_offset = self.current().next_offset;
        self.frames.push(ScopeFrame {
            symbols: FxHashMap::default(),
            next_offset,
        });
    }

    /// Enter a function scope; slot numbering restarts at 0
    pub fn enter_function_scope(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    /// Exit the current scope, discarding everything declared in it.
    /// The global frame is never popped.
    pub fn exit_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of frames above the global one
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Declare a variable or constant in the current scope, uninitialized
    pub fn declare(
        &mut self,
        name: &str,
        is_constant: bool,
        ty: Ty,
        location: SourceLocation,
    ) -> Result<&SymbolEntry, CompileError> {
        let scope = self.current_scope();
        let frame = self.current_mut();
        if frame.symbols.contains_key(name) {
            return Err(CompileError::DuplicateDeclaration {
                name: name.to_string(),
                location,
            });
        }

        let storage_offset = frame.next_offset;
        frame.next_offset += 1;

        let entry = SymbolEntry {
            name: name.to_string(),
            kind: if is_constant {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            },
            initialized: false,
            ty,
            storage_offset,
            scope,
            function: None,
        };
        let entry: &SymbolEntry = frame.symbols.entry(name.to_string()).or_insert(entry);
        Ok(entry)
    }

    /// Declare a function in the global frame. Functions take no slot.
    pub fn declare_function(
        &mut self,
        name: &str,
        return_type: Ty,
        info: FunctionInfo,
        location: SourceLocation,
    ) -> Result<&SymbolEntry, CompileError> {
        let global = &mut self.frames[0];
        if global.symbols.contains_key(name) {
            return Err(CompileError::DuplicateDeclaration {
                name: name.to_string(),
                location,
            });
        }

        let entry = SymbolEntry {
            name: name.to_string(),
            kind: SymbolKind::Constant,
            initialized: true,
            ty: return_type,
            storage_offset: 0,
            scope: SymbolScope::Global,
            function: Some(info),
        };
        let entry: &SymbolEntry = global.symbols.entry(name.to_string()).or_insert(entry);
        Ok(entry)
    }

    /// Mark the innermost visible `name` as assigned
    pub fn mark_initialized(
        &mut self,
        name: &str,
        location: SourceLocation,
    ) -> Result<(), CompileError> {
        let entry = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.symbols.get_mut(name))
            .ok_or_else(|| CompileError::NotDeclared {
                name: name.to_string(),
                location,
            })?;
        entry.initialized = true;
        Ok(())
    }

    /// Resolve `name` against the innermost scope that declares it
    pub fn lookup(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<&SymbolEntry, CompileError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.symbols.get(name))
            .ok_or_else(|| CompileError::NotDeclared {
                name: name.to_string(),
                location,
            })
    }

    fn current_scope(&self) -> SymbolScope {
        if self.frames.len() == 1 {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        }
    }

    fn current(&self) -> &ScopeFrame {
        // The global frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn current_mut(&mut self) -> &mut ScopeFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
