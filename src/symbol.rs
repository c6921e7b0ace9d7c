//! Symbol table binding names to shared value slots
//!
//! The table maps identifiers to typed [`ValueSlot`]s. A slot is a shared,
//! mutable cell: the command layer keeps a handle and rewrites the cell
//! between evaluations (the scan engine does this once per candidate
//! address), while `Var` AST nodes hold their own handle and read the
//! current contents on every evaluation. The table never copies the backing
//! storage; dropping the table leaves live slot handles valid.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::{Value, ValueType};

/// Longest accepted symbol name, in bytes.
pub const MAX_NAME_LEN: usize = 63;

/// Shared storage cell behind a bound symbol.
pub type ValueSlot = Rc<Cell<Value>>;

/// A name bound to a typed storage slot.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Rc<str>,
    pub vtype: ValueType,
    pub slot: ValueSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    DuplicateName(String),
    InvalidName(String),
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::DuplicateName(name) => {
                write!(f, "symbol '{}' is already defined", name)
            }
            SymbolError::InvalidName(name) => write!(f, "invalid symbol name '{}'", name),
        }
    }
}

impl std::error::Error for SymbolError {}

fn valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or('\0');
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Ordered name -> symbol map consulted by the parser.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: FxHashMap<Box<str>, usize>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Bind `name` to a fresh slot holding `value`; the symbol's type is the
    /// value's type. Returns a handle to the slot for later updates.
    pub fn insert(&mut self, name: &str, value: Value) -> Result<ValueSlot, SymbolError> {
        if !valid_name(name) {
            return Err(SymbolError::InvalidName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(SymbolError::DuplicateName(name.to_string()));
        }
        let slot: ValueSlot = Rc::new(Cell::new(value));
        self.index.insert(name.into(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.into(),
            vtype: value.value_type(),
            slot: Rc::clone(&slot),
        });
        Ok(slot)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}
