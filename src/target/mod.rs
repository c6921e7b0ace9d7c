//! The memory-target capability
//!
//! The expression engine never talks to an operating system directly; it
//! consumes the [`MemoryTarget`] trait. Everything a target must provide is
//! here: typed byte reads and writes, pause/resume, a region iterator, and
//! the pointer width chosen at attach time.
//!
//! Two implementations ship with the tool:
//! - [`process::ProcessTarget`]: a live Linux process via `/proc`
//! - [`BufferTarget`]: in-process byte buffers, used by the test suite

pub mod process;

use std::cell::RefCell;
use std::fmt;
use std::io;

use crate::value::{AddrWidth, Address};

/// Region protection bits as reported by the target's memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Prot {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl fmt::Display for Prot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
        )
    }
}

/// One mapped region of the target's address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: Address,
    pub size: u64,
    pub prot: Prot,
    pub path: Option<String>,
}

impl MemoryRegion {
    pub fn end(&self) -> Address {
        self.start + self.size
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr < self.end()
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08x}-0x{:08x} {} {:10}",
            self.start,
            self.end(),
            self.prot,
            self.size,
        )?;
        if let Some(path) = &self.path {
            write!(f, " {}", path)?;
        }
        Ok(())
    }
}

/// Errors surfaced by target operations.
#[derive(Debug)]
pub enum TargetError {
    Io(io::Error),
    /// No readable mapping at the address.
    UnreadableAddress(Address),
    /// No writable mapping at the address.
    UnwritableAddress(Address),
    /// Delivering a stop or continue signal failed.
    SignalFailed(&'static str),
    /// The attach target specification made no sense.
    BadTarget(String),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::Io(e) => write!(f, "target I/O error: {}", e),
            TargetError::UnreadableAddress(addr) => {
                write!(f, "address 0x{:x} is not readable", addr)
            }
            TargetError::UnwritableAddress(addr) => {
                write!(f, "address 0x{:x} is not writable", addr)
            }
            TargetError::SignalFailed(what) => write!(f, "sending {} failed", what),
            TargetError::BadTarget(spec) => write!(f, "bad target '{}'", spec),
        }
    }
}

impl std::error::Error for TargetError {}

impl From<io::Error> for TargetError {
    fn from(e: io::Error) -> TargetError {
        TargetError::Io(e)
    }
}

/// Abstract access to an attached process's memory.
///
/// `read`/`write` move raw bytes; typed access is the caller's business.
/// `pause`/`resume` bracket evaluations that dereference target memory, so
/// a scan observes a consistent snapshot.
pub trait MemoryTarget {
    /// Pointer width of the target, fixed at attach time.
    fn address_width(&self) -> AddrWidth;

    fn read(&self, addr: Address, buf: &mut [u8]) -> Result<(), TargetError>;

    fn write(&self, addr: Address, buf: &[u8]) -> Result<(), TargetError>;

    /// Stop the target. Idempotent.
    fn pause(&mut self) -> Result<(), TargetError>;

    /// Let a paused target run again. Never fails; a vanished target is
    /// discovered on the next read.
    fn resume(&mut self);

    /// Mapped regions, in map order.
    fn regions(&self) -> Box<dyn Iterator<Item = MemoryRegion> + '_>;
}

/// One mapped segment of a [`BufferTarget`].
#[derive(Debug)]
struct Segment {
    start: Address,
    prot: Prot,
    data: RefCell<Vec<u8>>,
}

/// A memory target backed by in-process byte buffers.
///
/// Used by the test suite and handy for poking at serialized memory dumps;
/// segments behave like regions, and a segment without read permission
/// reproduces the unreadable-page behaviour of a live target.
#[derive(Debug, Default)]
pub struct BufferTarget {
    segments: Vec<Segment>,
    width: Option<AddrWidth>,
}

impl BufferTarget {
    pub fn new() -> BufferTarget {
        BufferTarget::default()
    }

    /// Force a pointer width regardless of segment placement.
    pub fn with_width(mut self, width: AddrWidth) -> BufferTarget {
        self.width = Some(width);
        self
    }

    /// Map a read-write segment at `start`.
    pub fn segment(mut self, start: Address, data: Vec<u8>) -> BufferTarget {
        self.segments.push(Segment {
            start,
            prot: Prot {
                read: true,
                write: true,
                execute: false,
            },
            data: RefCell::new(data),
        });
        self
    }

    /// Map a segment that refuses all access, like a guard page.
    pub fn unreadable_segment(mut self, start: Address, size: usize) -> BufferTarget {
        self.segments.push(Segment {
            start,
            prot: Prot::default(),
            data: RefCell::new(vec![0; size]),
        });
        self
    }

    fn locate(&self, addr: Address, len: usize) -> Option<(&Segment, usize)> {
        self.segments.iter().find_map(|seg| {
            let size = seg.data.borrow().len() as u64;
            let offset = addr.checked_sub(seg.start)?;
            if offset + len as u64 <= size {
                Some((seg, offset as usize))
            } else {
                None
            }
        })
    }
}

impl MemoryTarget for BufferTarget {
    fn address_width(&self) -> AddrWidth {
        if let Some(width) = self.width {
            return width;
        }
        let wide = self
            .segments
            .iter()
            .any(|seg| seg.start + seg.data.borrow().len() as u64 > u32::MAX as u64);
        if wide && cfg!(feature = "values64") {
            AddrWidth::W64
        } else {
            AddrWidth::W32
        }
    }

    fn read(&self, addr: Address, buf: &mut [u8]) -> Result<(), TargetError> {
        let (seg, offset) = self
            .locate(addr, buf.len())
            .filter(|(seg, _)| seg.prot.read)
            .ok_or(TargetError::UnreadableAddress(addr))?;
        buf.copy_from_slice(&seg.data.borrow()[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&self, addr: Address, buf: &[u8]) -> Result<(), TargetError> {
        let (seg, offset) = self
            .locate(addr, buf.len())
            .filter(|(seg, _)| seg.prot.write)
            .ok_or(TargetError::UnwritableAddress(addr))?;
        seg.data.borrow_mut()[offset..offset + buf.len()].copy_from_slice(buf);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), TargetError> {
        Ok(())
    }

    fn resume(&mut self) {}

    fn regions(&self) -> Box<dyn Iterator<Item = MemoryRegion> + '_> {
        Box::new(self.segments.iter().map(|seg| MemoryRegion {
            start: seg.start,
            size: seg.data.borrow().len() as u64,
            prot: seg.prot,
            path: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_target_reads_and_writes() {
        let target = BufferTarget::new().segment(0x1000, vec![0u8; 16]);
        target.write(0x1004, &7i32.to_ne_bytes()).unwrap();
        let mut buf = [0u8; 4];
        target.read(0x1004, &mut buf).unwrap();
        assert_eq!(i32::from_ne_bytes(buf), 7);
    }

    #[test]
    fn out_of_range_access_fails() {
        let target = BufferTarget::new().segment(0x1000, vec![0u8; 8]);
        let mut buf = [0u8; 4];
        assert!(target.read(0x0, &mut buf).is_err());
        // reads must not straddle the end of a segment
        assert!(target.read(0x1006, &mut buf).is_err());
    }

    #[test]
    fn unreadable_segments_refuse_access() {
        let target = BufferTarget::new().unreadable_segment(0x2000, 16);
        let mut buf = [0u8; 1];
        assert!(target.read(0x2000, &mut buf).is_err());
        assert!(target.write(0x2000, &buf).is_err());
    }

    #[test]
    fn width_follows_segment_placement() {
        let low = BufferTarget::new().segment(0x1000, vec![0; 4]);
        assert_eq!(low.address_width(), AddrWidth::W32);
        #[cfg(feature = "values64")]
        {
            let high = BufferTarget::new().segment(0x1_0000_0000, vec![0; 4]);
            assert_eq!(high.address_width(), AddrWidth::W64);
        }
    }
}
