//! Expression-driven memory scanning
//!
//! [`search`] turns a user expression into a predicate over candidate
//! addresses: the names `addr` (the candidate address, as the target's
//! address-width unsigned type) and `value` (the bytes at that address,
//! decoded as the scan's element type) are bound in a symbol table, the
//! expression is parsed and folded once, and then evaluated per address
//! over every readable region. [`filter`] reuses the machinery over an
//! existing hit list.
//!
//! The target is paused for the duration of a scan so that the predicate
//! sees a consistent snapshot. Addresses whose bytes cannot be read are
//! skipped, as are addresses where the predicate itself fails to evaluate
//! (a `value`-dependent division by zero, for instance).

use std::fmt;

use crate::config::Config;
use crate::expr::{parse_expression, Expr, ParseError};
use crate::symbol::{SymbolTable, ValueSlot};
use crate::target::{MemoryTarget, TargetError};
use crate::value::{Address, EvalError, ScalarType, Value};

/// A matching address and the element type it was scanned as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub addr: Address,
    pub vtype: ScalarType,
}

/// An ordered list of scan hits; order is the visit order of the scan that
/// produced it and is preserved by `filter`.
#[derive(Debug, Clone, Default)]
pub struct HitList {
    items: Vec<Hit>,
}

impl HitList {
    pub fn new() -> HitList {
        HitList::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, hit: Hit) {
        self.items.push(hit);
    }

    pub fn get(&self, index: usize) -> Option<&Hit> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.items.iter()
    }
}

/// Errors from the scan driver.
#[derive(Debug)]
pub enum ScanError {
    Parse(ParseError),
    Eval(EvalError),
    Target(TargetError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Parse(e) => write!(f, "{}", e),
            ScanError::Eval(e) => write!(f, "{}", e),
            ScanError::Target(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<ParseError> for ScanError {
    fn from(e: ParseError) -> ScanError {
        ScanError::Parse(e)
    }
}

impl From<TargetError> for ScanError {
    fn from(e: TargetError) -> ScanError {
        ScanError::Target(e)
    }
}

/// The compiled predicate: expression plus the two bound slots.
struct Predicate {
    ast: Expr,
    addr_slot: ValueSlot,
    value_slot: ValueSlot,
}

fn compile(
    target: &dyn MemoryTarget,
    etype: ScalarType,
    expr: &str,
) -> Result<Predicate, ScanError> {
    let width = target.address_width();
    let mut symtab = SymbolTable::new();
    // the names are fixed, so insertion cannot fail
    let addr_slot = symtab
        .insert("addr", Value::address(width, 0))
        .map_err(|_| ScanError::Eval(EvalError::InvalidOperandType))?;
    let value_slot = symtab
        .insert("value", Value::zero(etype))
        .map_err(|_| ScanError::Eval(EvalError::InvalidOperandType))?;
    let ast = parse_expression(expr, Some(&symtab))?.optimize();
    Ok(Predicate {
        ast,
        addr_slot,
        value_slot,
    })
}

impl Predicate {
    /// Evaluate at one address with the value bytes already decoded.
    /// An evaluation error is a non-match, not an abort.
    fn matches(&self, target: &dyn MemoryTarget, addr: Address, value: Value) -> bool {
        let width = target.address_width();
        self.addr_slot.set(Value::address(width, addr));
        self.value_slot.set(value);
        match self.ast.evaluate(Some(target)) {
            Ok(v) => !v.is_zero(),
            Err(_) => false,
        }
    }
}

/// Scan every readable region of `target` for addresses matching `expr`,
/// reading candidates as `etype`. Regions are visited in map order and
/// addresses in increasing order, so the resulting list is ordered.
pub fn search(
    target: &mut dyn MemoryTarget,
    etype: ScalarType,
    expr: &str,
    config: &Config,
) -> Result<HitList, ScanError> {
    let predicate = compile(target, etype, expr)?;
    target.pause()?;
    let hits = search_regions(target, etype, &predicate, config);
    target.resume();
    Ok(hits)
}

fn search_regions(
    target: &dyn MemoryTarget,
    etype: ScalarType,
    predicate: &Predicate,
    config: &Config,
) -> HitList {
    let size = etype.size() as u64;
    let align = if config.scan.align == 0 {
        size
    } else {
        config.scan.align
    };

    let regions: Vec<_> = target.regions().filter(|r| r.prot.read).collect();
    let mut hits = HitList::new();
    for region in regions {
        // one dump per region; fall back to per-address reads when the
        // region cannot be read in one piece
        let mut dump = vec![0u8; region.size as usize];
        let dumped = target.read(region.start, &mut dump).is_ok();

        let mut addr = region.start;
        while addr + size <= region.end() {
            let value = if dumped {
                let offset = (addr - region.start) as usize;
                Value::from_ne_bytes(etype, &dump[offset..offset + size as usize])
            } else {
                let mut buf = [0u8; 8];
                let buf = &mut buf[..size as usize];
                match target.read(addr, buf) {
                    Ok(()) => Value::from_ne_bytes(etype, buf),
                    Err(_) => None,
                }
            };
            if let Some(value) = value {
                if predicate.matches(target, addr, value) {
                    hits.push(Hit { addr, vtype: etype });
                }
            }
            addr += align;
        }
    }
    hits
}

/// Re-evaluate `expr` over an existing hit list, keeping the hits for which
/// it holds. Input order is preserved; unreadable hits are dropped.
pub fn filter(
    target: &mut dyn MemoryTarget,
    hits: &HitList,
    expr: &str,
) -> Result<HitList, ScanError> {
    let etype = match hits.get(0) {
        Some(hit) => hit.vtype,
        None => return Ok(HitList::new()),
    };
    let predicate = compile(target, etype, expr)?;
    target.pause()?;
    let mut kept = HitList::new();
    for hit in hits.iter() {
        let mut buf = [0u8; 8];
        let buf = &mut buf[..hit.vtype.size()];
        if target.read(hit.addr, buf).is_err() {
            continue;
        }
        let value = match Value::from_ne_bytes(hit.vtype, buf) {
            Some(value) => value,
            None => continue,
        };
        if predicate.matches(target, hit.addr, value) {
            kept.push(*hit);
        }
    }
    target.resume();
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::BufferTarget;

    fn target_with_i32s(values: &[i32]) -> BufferTarget {
        let mut bytes = Vec::new();
        for v in values {
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
        BufferTarget::new().segment(0x1000, bytes)
    }

    #[test]
    fn search_finds_matching_values_in_order() {
        let mut target = target_with_i32s(&[1, 42, 3, 42]);
        let hits = search(
            &mut target,
            ScalarType::S32,
            "value == 42",
            &Config::default(),
        )
        .unwrap();
        let addrs: Vec<_> = hits.iter().map(|h| h.addr).collect();
        assert_eq!(addrs, vec![0x1004, 0x100c]);
    }

    #[test]
    fn search_can_constrain_the_address() {
        let mut target = target_with_i32s(&[7, 7, 7, 7]);
        let hits = search(
            &mut target,
            ScalarType::S32,
            "value == 7 && (addr & 0x7) == 0",
            &Config::default(),
        )
        .unwrap();
        let addrs: Vec<_> = hits.iter().map(|h| h.addr).collect();
        assert_eq!(addrs, vec![0x1000, 0x1008]);
    }

    #[test]
    fn value_dependent_eval_errors_skip_the_address() {
        let mut target = target_with_i32s(&[0, 2]);
        // divides by `value`; the zero at 0x1000 must be skipped, not fatal
        let hits = search(
            &mut target,
            ScalarType::S32,
            "84 / value == 42",
            &Config::default(),
        )
        .unwrap();
        let addrs: Vec<_> = hits.iter().map(|h| h.addr).collect();
        assert_eq!(addrs, vec![0x1004]);
    }

    #[test]
    fn unreadable_regions_are_skipped() {
        let mut target = BufferTarget::new()
            .segment(0x1000, 5i32.to_ne_bytes().to_vec())
            .unreadable_segment(0x2000, 4);
        let hits = search(
            &mut target,
            ScalarType::S32,
            "value == 5",
            &Config::default(),
        )
        .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.get(0).unwrap().addr, 0x1000);
    }

    #[test]
    fn filter_narrows_and_preserves_order() {
        let mut target = target_with_i32s(&[10, 20, 30, 20]);
        let config = Config::default();
        let hits = search(&mut target, ScalarType::S32, "value >= 20", &config).unwrap();
        assert_eq!(hits.len(), 3);

        let narrowed = filter(&mut target, &hits, "value == 20").unwrap();
        let addrs: Vec<_> = narrowed.iter().map(|h| h.addr).collect();
        assert_eq!(addrs, vec![0x1004, 0x100c]);
    }

    #[test]
    fn parse_errors_surface() {
        let mut target = target_with_i32s(&[1]);
        let err = search(
            &mut target,
            ScalarType::S32,
            "value ==",
            &Config::default(),
        );
        assert!(matches!(err, Err(ScanError::Parse(_))));
    }
}
