//! Interactive session state
//!
//! A [`Session`] owns everything one sitting accumulates: the attached
//! target, the current hit list with its undo/redo history, and the runtime
//! configuration. Command handlers (see [`crate::commands`]) mutate the
//! session and append their output to a [`Console`], which the TUI renders
//! as scrollback and batch mode prints to stdio.

use crate::config::Config;
use crate::scan::HitList;
use crate::target::MemoryTarget;
use crate::value::AddrWidth;

/// Rendering class of one console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Command output.
    Plain,
    /// Progress and status notes.
    Info,
    /// Failures.
    Error,
}

#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub text: String,
    pub kind: LineKind,
}

/// Ordered command output, oldest first.
#[derive(Debug, Default)]
pub struct Console {
    lines: Vec<ConsoleLine>,
}

impl Console {
    pub fn new() -> Console {
        Console::default()
    }

    pub fn print(&mut self, text: impl Into<String>) {
        self.lines.push(ConsoleLine {
            text: text.into(),
            kind: LineKind::Plain,
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.lines.push(ConsoleLine {
            text: text.into(),
            kind: LineKind::Info,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.lines.push(ConsoleLine {
            text: text.into(),
            kind: LineKind::Error,
        });
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One interactive sitting.
pub struct Session {
    pub target: Option<Box<dyn MemoryTarget>>,
    pub hits: HitList,
    pub config: Config,
    /// The user asked for the target to stay stopped (`break`).
    pub(crate) breaks: bool,
    undo: Vec<HitList>,
    redo: Vec<HitList>,
    running: bool,
    pub(crate) rc: i32,
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            target: None,
            hits: HitList::new(),
            config: Config::default(),
            breaks: false,
            undo: Vec::new(),
            redo: Vec::new(),
            running: true,
            rc: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn quit(&mut self) {
        self.running = false;
    }

    /// Pointer width used for addresses: the attached target's, or the
    /// widest the build supports when nothing is attached.
    pub fn addr_width(&self) -> AddrWidth {
        match &self.target {
            Some(target) => target.address_width(),
            None => {
                if cfg!(feature = "values64") {
                    AddrWidth::W64
                } else {
                    AddrWidth::W32
                }
            }
        }
    }

    /// Replace the hit list, remembering the old one for `undo`.
    pub fn set_hits(&mut self, hits: HitList) {
        let old = std::mem::replace(&mut self.hits, hits);
        self.undo.push(old);
        self.redo.clear();
    }

    pub fn undo_hits(&mut self) -> bool {
        match self.undo.pop() {
            Some(hits) => {
                let current = std::mem::replace(&mut self.hits, hits);
                self.redo.push(current);
                true
            }
            None => false,
        }
    }

    pub fn redo_hits(&mut self) -> bool {
        match self.redo.pop() {
            Some(hits) => {
                let current = std::mem::replace(&mut self.hits, hits);
                self.undo.push(current);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Hit;
    use crate::value::ScalarType;

    fn hits(addrs: &[u64]) -> HitList {
        let mut list = HitList::new();
        for &addr in addrs {
            list.push(Hit {
                addr,
                vtype: ScalarType::S32,
            });
        }
        list
    }

    #[test]
    fn hit_history_moves_both_ways() {
        let mut session = Session::new();
        session.set_hits(hits(&[1, 2]));
        session.set_hits(hits(&[2]));
        assert_eq!(session.hits.len(), 1);

        assert!(session.undo_hits());
        assert_eq!(session.hits.len(), 2);
        assert!(session.undo_hits());
        assert!(session.hits.is_empty());
        assert!(!session.undo_hits());

        assert!(session.redo_hits());
        assert_eq!(session.hits.len(), 2);
        assert!(session.redo_hits());
        assert_eq!(session.hits.len(), 1);
        assert!(!session.redo_hits());
    }

    #[test]
    fn new_hits_clear_the_redo_stack() {
        let mut session = Session::new();
        session.set_hits(hits(&[1]));
        session.undo_hits();
        session.set_hits(hits(&[3]));
        assert!(!session.redo_hits());
    }
}
