//! Command dispatcher
//!
//! Implements the interactive surface on top of [`Session`]: one function
//! per command, a hand-rolled word matcher, and small helpers that parse
//! positional items (`peek s32 (base+0x10)`) by balancing parentheses the
//! way the expression language does.
//!
//! `;` separates commands on a line and `#` starts a comment. A line that
//! matches no command word is evaluated as an expression, so `1 + 2` at
//! the prompt just works.

use crate::config::Config;
use crate::expr::{parse_expression, Expr};
use crate::scan::{self, HitList};
use crate::session::{Console, Session};
use crate::symbol::SymbolTable;
use crate::target::process::ProcessTarget;
use crate::target::MemoryTarget;
use crate::value::{AddrWidth, Address, ScalarType, Value, ValueType};

/// Consume `word` from the front of `input` when it stands alone.
fn accept_word(input: &mut &str, word: &str) -> bool {
    if let Some(rest) = input.strip_prefix(word) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            *input = rest.trim_start();
            return true;
        }
    }
    false
}

/// Take one whitespace-delimited item, keeping parenthesised groups whole:
/// `(base + 4) * 2` eats `(base + 4)` first. Unbalanced input eats nothing.
fn eat_item<'s>(input: &mut &'s str) -> Option<&'s str> {
    let s = input.trim_start();
    if s.is_empty() {
        return None;
    }
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut end = 0;
    while end < bytes.len() {
        let c = bytes[end];
        if depth == 0 && c.is_ascii_whitespace() {
            break;
        }
        depth += (c == b'(') as i32 - (c == b')') as i32;
        end += 1;
    }
    if depth != 0 {
        return None;
    }
    *input = s[end..].trim_start();
    Some(&s[..end])
}

/// Consume a leading scalar type name, if there is one.
fn accept_type(input: &mut &str) -> Option<ScalarType> {
    let mut rest = *input;
    let ty = ScalarType::from_name(eat_item(&mut rest)?)?;
    *input = rest;
    Some(ty)
}

fn first_word(input: &str) -> &str {
    input.split_whitespace().next().unwrap_or(input)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn human_size(bytes: u64) -> (u64, char) {
    let mut value = bytes;
    for suffix in ['B', 'K', 'M', 'G', 'T', 'P'] {
        if value < 1024 {
            return (value, suffix);
        }
        value /= 1024;
    }
    (value, '?')
}

/// Render an integer in the configured output base.
pub fn format_value(config: &Config, v: &Value) -> String {
    if config.cli.base == 16 {
        match *v {
            Value::S8(x) => format!("0x{:x}", x as u8),
            Value::U8(x) => format!("0x{:x}", x),
            Value::S16(x) => format!("0x{:x}", x as u16),
            Value::U16(x) => format!("0x{:x}", x),
            Value::S32(x) => format!("0x{:x}", x as u32),
            Value::U32(x) => format!("0x{:x}", x),
            Value::S64(x) => format!("0x{:x}", x as u64),
            Value::U64(x) => format!("0x{:x}", x),
            Value::F32(_) | Value::F64(_) | Value::Ptr(_, _) => v.to_string(),
        }
    } else {
        v.to_string()
    }
}

impl Session {
    /// Execute a batch of input: lines, `;`-separated commands, `#` comments.
    pub fn execute(&mut self, input: &str, out: &mut Console) -> i32 {
        let mut rc = 0;
        for line in input.lines() {
            let line = line.split('#').next().unwrap_or("");
            for command in line.split(';') {
                if !self.is_running() {
                    return rc;
                }
                rc = self.execute_line(command, out);
            }
        }
        rc
    }

    /// Execute a single command and report its exit status.
    pub fn execute_line(&mut self, line: &str, out: &mut Console) -> i32 {
        let mut in_ = line.trim();
        if in_.is_empty() {
            return self.rc;
        }

        let rc = if accept_word(&mut in_, "attach") {
            self.cmd_attach(in_, out)
        } else if accept_word(&mut in_, "break") {
            self.cmd_break(in_, out)
        } else if accept_word(&mut in_, "clear") {
            self.cmd_clear(in_, out)
        } else if accept_word(&mut in_, "config") {
            self.cmd_config(in_, out)
        } else if accept_word(&mut in_, "continue") {
            self.cmd_continue(in_, out)
        } else if accept_word(&mut in_, "detach") {
            self.cmd_detach(in_, out)
        } else if accept_word(&mut in_, "eval") {
            self.cmd_eval(in_, out, false)
        } else if accept_word(&mut in_, "explain") {
            self.cmd_explain(in_, out)
        } else if accept_word(&mut in_, "filter") || accept_word(&mut in_, "next") {
            self.cmd_filter(in_, out)
        } else if accept_word(&mut in_, "help") {
            self.cmd_help(in_, out)
        } else if accept_word(&mut in_, "hex") {
            self.cmd_hex(in_, out)
        } else if accept_word(&mut in_, "list") || accept_word(&mut in_, "ls") {
            self.cmd_list(in_, out)
        } else if accept_word(&mut in_, "maps") || accept_word(&mut in_, "m") {
            self.cmd_maps(in_, out)
        } else if accept_word(&mut in_, "peek") {
            self.cmd_peek(in_, out)
        } else if accept_word(&mut in_, "poke") {
            self.cmd_poke(in_, out)
        } else if accept_word(&mut in_, "quit")
            || accept_word(&mut in_, "q")
            || accept_word(&mut in_, "exit")
        {
            self.cmd_quit(in_, out)
        } else if accept_word(&mut in_, "redo") {
            self.cmd_redo(in_, out)
        } else if accept_word(&mut in_, "search") {
            self.cmd_search(in_, out)
        } else if accept_word(&mut in_, "undo") {
            self.cmd_undo(in_, out)
        } else {
            // maybe it is an expression
            let rc = self.cmd_eval(in_, out, true);
            if rc == 1 {
                out.error(format!("unknown command '{}'", first_word(in_)));
            }
            rc
        };

        self.rc = rc;
        rc
    }

    // Expression plumbing shared by several commands.

    /// Re-stop the target when the user asked it to stay stopped.
    fn restore_break(&mut self) {
        if self.breaks {
            if let Some(target) = self.target.as_deref_mut() {
                let _ = target.pause();
            }
        }
    }

    /// Parse `input`, coerce the result to `want`, and evaluate it. The
    /// target is paused around the evaluation when the expression
    /// dereferences memory.
    fn eval_typed(
        &mut self,
        input: &str,
        want: ValueType,
        symtab: Option<&SymbolTable>,
    ) -> Result<Value, String> {
        let ast = parse_expression(input, symtab).map_err(|e| e.to_string())?;
        let ast = if ast.value_type() == want {
            ast
        } else {
            Expr::Cast {
                vtype: want,
                child: Box::new(ast),
            }
        };

        let pause = ast.has_deref();
        if pause {
            if let Some(target) = self.target.as_deref_mut() {
                target.pause().map_err(|e| e.to_string())?;
            }
        }
        let result = ast.evaluate(self.target.as_deref());
        if pause {
            if let Some(target) = self.target.as_deref_mut() {
                target.resume();
            }
            self.restore_break();
        }
        result.map_err(|e| e.to_string())
    }

    fn eval_addr(&mut self, input: &str) -> Result<Address, String> {
        let want = ValueType::Scalar(self.addr_width().uint_type());
        let value = self.eval_typed(input, want, None)?;
        value
            .as_address()
            .ok_or_else(|| "not an address".to_string())
    }

    fn eval_index(&mut self, input: &str) -> Result<i64, String> {
        match self.eval_typed(input, ValueType::Scalar(ScalarType::S64), None)? {
            Value::S64(index) => Ok(index),
            _ => Err("not an index".to_string()),
        }
    }

    /// Resolve a 1-based hit index; negative values count from the end.
    fn resolve_hit(&self, index: i64) -> Result<(usize, Address, ScalarType), String> {
        let len = self.hits.len() as i64;
        if len == 0 {
            return Err(format!("bad index {} (0 hits)", index));
        }
        let resolved = if index < 0 { index + len } else { index - 1 };
        if !(0..len).contains(&resolved) {
            return Err(format!("bad index {} not in 1..{}", index, len));
        }
        let hit = match self.hits.get(resolved as usize) {
            Some(hit) => *hit,
            None => return Err(format!("bad index {}", index)),
        };
        Ok((resolved as usize, hit.addr, hit.vtype))
    }

    // Command handlers.

    fn cmd_attach(&mut self, in_: &str, out: &mut Console) -> i32 {
        if in_.is_empty() {
            out.error("attach: missing target (a PID, or 'self')");
            return 1;
        }

        let target = match ProcessTarget::attach(in_) {
            Ok(target) => target,
            Err(e) => {
                out.error(format!("attach: attaching to {} failed: {}", in_, e));
                return 2;
            }
        };

        if self.target.is_some() {
            out.info("detaching from previous target");
        }

        let mut regions = 0usize;
        let mut bytes = 0u64;
        for region in target.regions() {
            regions += 1;
            bytes += region.size;
        }
        let (size, suffix) = human_size(bytes);
        out.info(format!(
            "attached to {} ({}{} / {} region{}, {}-bit addresses)",
            in_,
            size,
            suffix,
            regions,
            plural(regions),
            target.address_width().bits(),
        ));

        self.breaks = false;
        self.target = Some(Box::new(target));
        0
    }

    fn cmd_detach(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("detach: trailing characters");
            return 1;
        }
        if self.target.take().is_none() {
            out.error("detach: not attached to any target");
            return 2;
        }
        self.breaks = false;
        out.info("detached");
        0
    }

    fn cmd_break(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("break: trailing characters");
            return 1;
        }
        let Some(target) = self.target.as_deref_mut() else {
            out.error("break: not attached to any target");
            return 2;
        };
        if self.breaks {
            out.error("break: target is already stopped");
            return 3;
        }
        if let Err(e) = target.pause() {
            out.error(format!("break: stopping failed: {}", e));
            return 4;
        }
        self.breaks = true;
        out.info("target stopped");
        0
    }

    fn cmd_continue(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("continue: trailing characters");
            return 1;
        }
        let Some(target) = self.target.as_deref_mut() else {
            out.error("continue: not attached to any target");
            return 2;
        };
        if !self.breaks {
            out.error("continue: target is already running");
            return 3;
        }
        target.resume();
        self.breaks = false;
        out.info("target continued");
        0
    }

    fn cmd_search(&mut self, mut in_: &str, out: &mut Console) -> i32 {
        if self.target.is_none() {
            out.error("search: attach to a target first");
            return 2;
        }
        if in_.is_empty() {
            out.error("search: expression expected");
            return 1;
        }
        let etype = accept_type(&mut in_).unwrap_or(ScalarType::S32);
        if in_.is_empty() {
            out.error("search: expression expected after type");
            return 1;
        }

        let result = match self.target.as_deref_mut() {
            Some(target) => scan::search(target, etype, in_, &self.config),
            None => return 2,
        };
        self.restore_break();

        match result {
            Ok(hits) => {
                out.info(format!("{} hit{}", hits.len(), plural(hits.len())));
                self.set_hits(hits);
                0
            }
            Err(e) => {
                out.error(format!("search: {}", e));
                3
            }
        }
    }

    fn cmd_filter(&mut self, in_: &str, out: &mut Console) -> i32 {
        if in_.is_empty() {
            out.error("filter: expression expected");
            return 1;
        }
        if self.hits.is_empty() {
            out.info("filter: zero hits");
            return 2;
        }
        let result = match self.target.as_deref_mut() {
            Some(target) => scan::filter(target, &self.hits, in_),
            None => {
                out.error("filter: attach to a target first");
                return 3;
            }
        };
        self.restore_break();

        match result {
            Ok(hits) => {
                out.info(format!("{} hit{}", hits.len(), plural(hits.len())));
                self.set_hits(hits);
                0
            }
            Err(e) => {
                out.error(format!("filter: {}", e));
                4
            }
        }
    }

    fn cmd_list(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("list: trailing characters");
            return 1;
        }
        if self.hits.is_empty() {
            out.info("list: zero hits");
            return 0;
        }

        let quiet = self.config.cli.quiet;
        let Some(target) = self.target.as_deref_mut() else {
            out.error("list: attach to a target first");
            return 2;
        };
        let paused = target.pause().is_ok();
        for (i, hit) in self.hits.iter().enumerate() {
            let mut buf = [0u8; 8];
            let value = target
                .read(hit.addr, &mut buf[..hit.vtype.size()])
                .ok()
                .and_then(|_| Value::from_ne_bytes(hit.vtype, &buf));
            let rendered = match value {
                Some(v) => format_value(&self.config, &v),
                None => "???".to_string(),
            };
            if quiet {
                out.print(format!("{} 0x{:08x} {}", hit.vtype, hit.addr, rendered));
            } else {
                out.print(format!(
                    "{}. *({} *)0x{:08x} = {}",
                    i + 1,
                    hit.vtype,
                    hit.addr,
                    rendered
                ));
            }
        }
        if paused {
            target.resume();
        }
        self.restore_break();
        0
    }

    fn cmd_clear(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("clear: trailing characters");
            return 1;
        }
        self.set_hits(HitList::new());
        0
    }

    fn cmd_peek(&mut self, mut in_: &str, out: &mut Console) -> i32 {
        if in_.is_empty() {
            out.error("peek: type & address or hit index expected");
            return 1;
        }

        let (index, addr, ty) = match accept_type(&mut in_) {
            Some(ty) => {
                if in_.is_empty() {
                    out.error("peek: address expression expected");
                    return 2;
                }
                match self.eval_addr(in_) {
                    Ok(addr) => (None, addr, ty),
                    Err(e) => {
                        out.error(format!("peek: evaluating the address failed: {}", e));
                        return 3;
                    }
                }
            }
            None => {
                let index = match self.eval_index(in_) {
                    Ok(index) => index,
                    Err(e) => {
                        out.error(format!("peek: evaluating the hit index failed: {}", e));
                        return 4;
                    }
                };
                match self.resolve_hit(index) {
                    Ok((i, addr, ty)) => (Some(i), addr, ty),
                    Err(e) => {
                        out.error(format!("peek: {}", e));
                        return 5;
                    }
                }
            }
        };

        let Some(target) = self.target.as_deref_mut() else {
            out.error("peek: attach to a target first");
            return 6;
        };
        let mut buf = [0u8; 8];
        let value = target
            .read(addr, &mut buf[..ty.size()])
            .ok()
            .and_then(|_| Value::from_ne_bytes(ty, &buf));
        let rendered = match value {
            Some(v) => format_value(&self.config, &v),
            None => "???".to_string(),
        };
        let prefix = match index {
            Some(i) => format!("{}. ", i + 1),
            None => String::new(),
        };
        out.print(format!("{}*({} *)0x{:08x} = {}", prefix, ty, addr, rendered));
        self.restore_break();
        0
    }

    fn cmd_poke(&mut self, mut in_: &str, out: &mut Console) -> i32 {
        if self.target.is_none() {
            out.error("poke: attach to a target first");
            return 1;
        }
        if in_.is_empty() {
            out.error("poke: type & address & value, or hit index & value expected");
            return 2;
        }

        let (index, addr, ty) = match accept_type(&mut in_) {
            Some(ty) => {
                let Some(item) = eat_item(&mut in_) else {
                    out.error("poke: address expected after type");
                    return 3;
                };
                match self.eval_addr(item) {
                    Ok(addr) => (None, addr, ty),
                    Err(e) => {
                        out.error(format!("poke: evaluating the address failed: {}", e));
                        return 4;
                    }
                }
            }
            None => {
                let Some(item) = eat_item(&mut in_) else {
                    out.error("poke: hit index expected");
                    return 5;
                };
                let index = match self.eval_index(item) {
                    Ok(index) => index,
                    Err(e) => {
                        out.error(format!("poke: evaluating the hit index failed: {}", e));
                        return 6;
                    }
                };
                match self.resolve_hit(index) {
                    Ok((i, addr, ty)) => (Some(i), addr, ty),
                    Err(e) => {
                        out.error(format!("poke: {}", e));
                        return 7;
                    }
                }
            }
        };

        if in_.is_empty() {
            out.error("poke: value expression expected");
            return 8;
        }

        // Bind `addr`, and `value` when the expression mentions it; the
        // current value at the destination must then be readable.
        let width = self.addr_width();
        let mut symtab = SymbolTable::new();
        let _ = symtab.insert("addr", Value::address(width, addr));
        if in_.contains("value") {
            let current = match self.target.as_deref() {
                Some(target) => {
                    let mut buf = [0u8; 8];
                    target
                        .read(addr, &mut buf[..ty.size()])
                        .ok()
                        .and_then(|_| Value::from_ne_bytes(ty, &buf))
                }
                None => None,
            };
            match current {
                Some(current) => {
                    let _ = symtab.insert("value", current);
                }
                None => {
                    out.error(format!(
                        "poke: error reading {} bytes from address 0x{:08x}",
                        ty.size(),
                        addr
                    ));
                    return 9;
                }
            }
        }

        let value = match self.eval_typed(in_, ValueType::Scalar(ty), Some(&symtab)) {
            Ok(value) => value,
            Err(e) => {
                out.error(format!("poke: evaluating the value failed: {}", e));
                return 10;
            }
        };

        let Some(target) = self.target.as_deref_mut() else {
            return 1;
        };
        if let Err(e) = target.write(addr, &value.to_ne_bytes(width)) {
            out.error(format!("poke: {}", e));
            return 11;
        }

        let prefix = match index {
            Some(i) => format!("{}. ", i + 1),
            None => String::new(),
        };
        out.print(format!(
            "{}*({} *)0x{:08x} = {}",
            prefix,
            ty,
            addr,
            format_value(&self.config, &value)
        ));
        self.restore_break();
        0
    }

    fn cmd_eval(&mut self, in_: &str, out: &mut Console, quiet: bool) -> i32 {
        let ast = match parse_expression(in_, None) {
            Ok(ast) => ast,
            Err(e) => {
                if !quiet {
                    out.error(format!("eval: {}", e));
                }
                return 1;
            }
        };

        let pause = ast.has_deref();
        if pause {
            if let Some(target) = self.target.as_deref_mut() {
                if let Err(e) = target.pause() {
                    out.error(format!("eval: {}", e));
                    return 2;
                }
            }
        }
        let result = ast.evaluate(self.target.as_deref());
        if pause {
            if let Some(target) = self.target.as_deref_mut() {
                target.resume();
            }
            self.restore_break();
        }

        match result {
            Ok(value) => {
                out.print(format_value(&self.config, &value));
                0
            }
            Err(e) => {
                out.error(format!("eval: {}", e));
                2
            }
        }
    }

    fn cmd_explain(&mut self, in_: &str, out: &mut Console) -> i32 {
        if in_.is_empty() {
            out.error("explain: expression expected");
            return 1;
        }

        // demo bindings so that `value` and `pointer` resolve
        let pointer = match self.addr_width() {
            AddrWidth::W64 => Value::Ptr(ScalarType::U16, 0x0123456789abcdef),
            AddrWidth::W32 => Value::Ptr(ScalarType::U16, 0x12345678),
        };
        let mut symtab = SymbolTable::new();
        let bound = symtab.insert("value", Value::S32(42)).is_ok()
            && symtab.insert("pointer", pointer).is_ok();
        if !bound {
            out.error("explain: creating the symbol table failed");
            return 2;
        }

        let ast = match parse_expression(in_, Some(&symtab)) {
            Ok(ast) => ast,
            Err(e) => {
                out.error(format!("explain: {} parse error{}", e.count(), plural(e.count())));
                for message in &e.errors {
                    out.error(format!("explain: {}", message));
                }
                return 3;
            }
        };

        out.print(format!("rpn: {}", ast.rpn()));

        let pause = ast.has_deref();
        if pause {
            if let Some(target) = self.target.as_deref_mut() {
                let _ = target.pause();
            }
        }
        let plain = ast.evaluate(self.target.as_deref());
        let optimized = ast.optimize();
        out.print(format!("opt: {}", optimized.rpn()));
        let folded = optimized.evaluate(self.target.as_deref());
        if pause {
            if let Some(target) = self.target.as_deref_mut() {
                target.resume();
            }
            self.restore_break();
        }

        let width = self.addr_width();
        match (plain, folded) {
            (Ok(a), Ok(b)) => {
                if a.value_type() != b.value_type() {
                    out.error("explain: optimization changes the result type");
                    return 7;
                }
                if a.to_ne_bytes(width) != b.to_ne_bytes(width) {
                    out.error("explain: optimization changes the result value");
                    return 8;
                }
                out.print(format!(
                    "({}){}",
                    a.value_type(),
                    format_value(&self.config, &a)
                ));
                0
            }
            (Err(e), Err(_)) => {
                out.error(format!("explain: evaluation failed: {}", e));
                4
            }
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => {
                out.error(format!(
                    "explain: optimization changes the error behaviour: {}",
                    e
                ));
                5
            }
        }
    }

    fn cmd_maps(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("maps: trailing characters");
            return 1;
        }
        let Some(target) = self.target.as_deref() else {
            out.error("maps: attach to a target first");
            return 2;
        };
        for region in target.regions() {
            out.print(region.to_string());
        }
        0
    }

    fn cmd_hex(&mut self, mut in_: &str, out: &mut Console) -> i32 {
        if self.target.is_none() {
            out.error("hex: attach to a target first");
            return 1;
        }
        if in_.is_empty() {
            out.error("hex: address expected");
            return 2;
        }

        let Some(item) = eat_item(&mut in_) else {
            out.error("hex: malformed address");
            return 3;
        };
        let addr = match self.eval_addr(item) {
            Ok(addr) => addr,
            Err(e) => {
                out.error(format!("hex: invalid address: {}", e));
                return 3;
            }
        };
        let len = if in_.is_empty() {
            self.config.block.size as u64
        } else {
            match self.eval_addr(in_) {
                Ok(len) => len,
                Err(e) => {
                    out.error(format!("hex: invalid length: {}", e));
                    return 4;
                }
            }
        };

        if len > 0x0100_0000 {
            out.error(format!("hex: refusing a {} byte dump", len));
            return 4;
        }

        let Some(target) = self.target.as_deref_mut() else {
            return 1;
        };
        let mut buf = vec![0u8; len as usize];
        if let Err(e) = target.read(addr, &mut buf) {
            out.error(format!("hex: {}", e));
            return 5;
        }

        for (i, chunk) in buf.chunks(16).enumerate() {
            let mut line = format!("0x{:08x}  ", addr + i as u64 * 16);
            for j in 0..16 {
                match chunk.get(j) {
                    Some(byte) => line.push_str(&format!("{:02x}", byte)),
                    None => line.push_str("  "),
                }
                if j % 2 == 1 && j < 15 {
                    line.push(' ');
                }
            }
            line.push_str("  ");
            for byte in chunk {
                line.push(if byte.is_ascii_graphic() {
                    *byte as char
                } else {
                    '.'
                });
            }
            out.print(line);
        }
        self.restore_break();
        0
    }

    fn cmd_undo(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("undo: trailing characters");
            return 1;
        }
        if !self.undo_hits() {
            out.error("undo: undo unavailable");
            return 2;
        }
        out.info(format!("{} hit{}", self.hits.len(), plural(self.hits.len())));
        0
    }

    fn cmd_redo(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("redo: trailing characters");
            return 1;
        }
        if !self.redo_hits() {
            out.error("redo: redo unavailable");
            return 2;
        }
        out.info(format!("{} hit{}", self.hits.len(), plural(self.hits.len())));
        0
    }

    fn cmd_config(&mut self, in_: &str, out: &mut Console) -> i32 {
        let in_ = in_.trim();
        if in_.is_empty() {
            for item in Config::ITEMS {
                if let Some(value) = self.config.get(item) {
                    out.print(format!("{} = {}", item, value));
                }
            }
            return 0;
        }

        match in_.split_once('=') {
            Some((item, value)) => match self.config.set(item.trim(), value.trim()) {
                Ok(()) => 0,
                Err(e) => {
                    out.error(format!("config: {}", e));
                    1
                }
            },
            None => match self.config.get(in_) {
                Some(value) => {
                    out.print(format!("{} = {}", in_, value));
                    0
                }
                None => {
                    out.error(format!("config: unknown config item '{}'", in_));
                    1
                }
            },
        }
    }

    fn cmd_help(&mut self, _in: &str, out: &mut Console) -> i32 {
        for line in [
            "attach <pid|self>          attach to a process",
            "detach                     detach from the target",
            "break / continue           stop / resume the target",
            "search [type] <expr>       scan readable memory for matches",
            "filter <expr>              narrow the current hits (alias: next)",
            "list                       show current hits (alias: ls)",
            "clear                      drop the current hits",
            "undo / redo                move through hit-list history",
            "peek <type> <addr>         read one value (or: peek <index>)",
            "poke <type> <addr> <expr>  write one value (or: poke <index> <expr>)",
            "eval <expr>                evaluate an expression (or just type it)",
            "explain <expr>             show the expression in RPN, then folded",
            "maps                       show the target's memory map (alias: m)",
            "hex <addr> [len]           hex dump",
            "config [item [= value]]    inspect or change settings",
            "quit                       leave (aliases: q, exit)",
            "",
            "expressions bind `addr` and `value` during search/filter/poke;",
            "types: s8 u8 s16 u16 s32 u32 s64 u64 f32 f64",
        ] {
            out.print(line);
        }
        0
    }

    fn cmd_quit(&mut self, in_: &str, out: &mut Console) -> i32 {
        if !in_.is_empty() {
            out.error("quit: trailing characters");
            return 1;
        }
        self.target = None;
        self.quit();
        0
    }
}
