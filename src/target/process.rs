//! Linux process target
//!
//! A thin `/proc`-based rendition of the [`MemoryTarget`] capability:
//! regions come from `/proc/<pid>/maps`, bytes move through positioned
//! reads and writes on `/proc/<pid>/mem`, and pause/resume deliver
//! `SIGSTOP`/`SIGCONT`. Reading another process's memory requires ptrace
//! permission over it (see `kernel.yama.ptrace_scope`); attaching to `self`
//! needs nothing and is useful for experiments.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::os::unix::fs::FileExt;

use super::{MemoryRegion, MemoryTarget, Prot, TargetError};
use crate::value::{AddrWidth, Address};

/// A live process on the local machine.
pub struct ProcessTarget {
    /// 0 means the tool's own process, which is never signalled.
    pid: libc::pid_t,
    mem: File,
    width: AddrWidth,
    paused: bool,
}

impl ProcessTarget {
    /// Attach to a target given as a decimal PID or the literal `self`.
    ///
    /// The pointer width is decided here: 64-bit when any mapping reaches
    /// beyond the 32-bit address space (and 64-bit values are compiled in),
    /// 32-bit otherwise.
    pub fn attach(what: &str) -> Result<ProcessTarget, TargetError> {
        let pid: libc::pid_t = if what == "self" {
            0
        } else {
            what.parse()
                .map_err(|_| TargetError::BadTarget(what.to_string()))?
        };

        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .open(proc_path(pid, "mem"))
            .or_else(|_| File::open(proc_path(pid, "mem")))?;

        let regions = read_maps(pid)?;
        let wide = cfg!(feature = "values64")
            && regions.iter().any(|r| r.end() > u32::MAX as u64);

        Ok(ProcessTarget {
            pid,
            mem,
            width: if wide { AddrWidth::W64 } else { AddrWidth::W32 },
            paused: false,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        (self.pid != 0).then_some(self.pid as u32)
    }
}

impl Drop for ProcessTarget {
    fn drop(&mut self) {
        self.resume();
    }
}

impl MemoryTarget for ProcessTarget {
    fn address_width(&self) -> AddrWidth {
        self.width
    }

    fn read(&self, addr: Address, buf: &mut [u8]) -> Result<(), TargetError> {
        self.mem
            .read_exact_at(buf, addr)
            .map_err(|_| TargetError::UnreadableAddress(addr))
    }

    fn write(&self, addr: Address, buf: &[u8]) -> Result<(), TargetError> {
        self.mem
            .write_all_at(buf, addr)
            .map_err(|_| TargetError::UnwritableAddress(addr))
    }

    fn pause(&mut self) -> Result<(), TargetError> {
        if self.pid == 0 || self.paused {
            return Ok(());
        }
        if unsafe { libc::kill(self.pid, libc::SIGSTOP) } != 0 {
            return Err(TargetError::SignalFailed("SIGSTOP"));
        }
        let mut status = 0;
        unsafe { libc::waitpid(self.pid, &mut status, libc::WUNTRACED) };
        self.paused = true;
        Ok(())
    }

    fn resume(&mut self) {
        if self.pid == 0 || !self.paused {
            return;
        }
        unsafe { libc::kill(self.pid, libc::SIGCONT) };
        self.paused = false;
    }

    fn regions(&self) -> Box<dyn Iterator<Item = MemoryRegion> + '_> {
        match read_maps(self.pid) {
            Ok(regions) => Box::new(regions.into_iter()),
            Err(_) => Box::new(std::iter::empty()),
        }
    }
}

fn proc_path(pid: libc::pid_t, entry: &str) -> String {
    if pid == 0 {
        format!("/proc/self/{}", entry)
    } else {
        format!("/proc/{}/{}", pid, entry)
    }
}

fn read_maps(pid: libc::pid_t) -> Result<Vec<MemoryRegion>, TargetError> {
    let file = File::open(proc_path(pid, "maps"))?;
    let mut regions = Vec::new();
    for line in BufReader::new(file).lines() {
        if let Some(region) = parse_maps_line(&line?) {
            regions.push(region);
        }
    }
    Ok(regions)
}

/// One `/proc/<pid>/maps` line:
/// `start-end perms offset dev inode [path]`.
fn parse_maps_line(line: &str) -> Option<MemoryRegion> {
    let mut fields = line.split_whitespace();
    let range = fields.next()?;
    let perms = fields.next()?;

    let (start, end) = range.split_once('-')?;
    let start = Address::from_str_radix(start, 16).ok()?;
    let end = Address::from_str_radix(end, 16).ok()?;
    if end <= start {
        return None;
    }

    let perms = perms.as_bytes();
    let prot = Prot {
        read: perms.first() == Some(&b'r'),
        write: perms.get(1) == Some(&b'w'),
        execute: perms.get(2) == Some(&b'x'),
    };

    // skip offset, dev, inode; the rest (if any) is the path
    let path = fields.nth(3).map(str::to_string);

    Some(MemoryRegion {
        start,
        size: end - start,
        prot,
        path,
    })
}
