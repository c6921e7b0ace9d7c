// Command-level scenarios: search, filter, peek, poke and the hit-list
// history, driven through the dispatcher against a buffer target.

use memscan::scan;
use memscan::session::{Console, LineKind, Session};
use memscan::target::BufferTarget;
use memscan::value::ScalarType;

fn target_with_i32s(base: u64, values: &[i32]) -> BufferTarget {
    let mut bytes = Vec::new();
    for v in values {
        bytes.extend_from_slice(&v.to_ne_bytes());
    }
    BufferTarget::new().segment(base, bytes)
}

fn session_with(target: BufferTarget) -> Session {
    let mut session = Session::new();
    session.target = Some(Box::new(target));
    session
}

fn plain_lines(console: &Console) -> Vec<&str> {
    console
        .lines()
        .iter()
        .filter(|l| l.kind == LineKind::Plain)
        .map(|l| l.text.as_str())
        .collect()
}

#[test]
fn search_then_filter_then_poke() {
    let mut session = session_with(target_with_i32s(0x1000, &[100, 42, 42, 7]));
    let mut out = Console::new();

    assert_eq!(session.execute_line("search s32 value == 42", &mut out), 0);
    assert_eq!(session.hits.len(), 2);

    // narrow: keep only the hit at an 8-aligned address
    assert_eq!(
        session.execute_line("filter (addr & 0x7) == 0", &mut out),
        0
    );
    assert_eq!(session.hits.len(), 1);
    assert_eq!(session.hits.get(0).unwrap().addr, 0x1008);

    // poke through the hit index, reusing the current value
    assert_eq!(session.execute_line("poke 1 value + 58", &mut out), 0);
    assert_eq!(session.execute_line("peek 1", &mut out), 0);
    let lines = plain_lines(&out);
    assert_eq!(*lines.last().unwrap(), "1. *(s32 *)0x00001008 = 100");
}

#[test]
fn default_search_type_is_s32() {
    let mut session = session_with(target_with_i32s(0x1000, &[5, 6]));
    let mut out = Console::new();
    assert_eq!(session.execute_line("search value == 6", &mut out), 0);
    assert_eq!(session.hits.len(), 1);
    assert_eq!(session.hits.get(0).unwrap().vtype, ScalarType::S32);
}

#[test]
fn narrow_element_types_scan_bytewise() {
    let target = BufferTarget::new().segment(0x4000, vec![9u8, 0, 9, 9, 0]);
    let mut session = session_with(target);
    let mut out = Console::new();

    assert_eq!(session.execute_line("search u8 value == 9", &mut out), 0);
    let addrs: Vec<_> = session.hits.iter().map(|h| h.addr).collect();
    assert_eq!(addrs, vec![0x4000, 0x4002, 0x4003]);
}

#[test]
fn undo_and_redo_walk_the_hit_history() {
    let mut session = session_with(target_with_i32s(0x1000, &[1, 2, 1]));
    let mut out = Console::new();

    session.execute_line("search value == 1", &mut out);
    assert_eq!(session.hits.len(), 2);
    session.execute_line("filter addr > 0x1000", &mut out);
    assert_eq!(session.hits.len(), 1);

    assert_eq!(session.execute_line("undo", &mut out), 0);
    assert_eq!(session.hits.len(), 2);
    assert_eq!(session.execute_line("redo", &mut out), 0);
    assert_eq!(session.hits.len(), 1);

    // a fresh search clears the redo branch
    session.execute_line("undo", &mut out);
    session.execute_line("search value == 2", &mut out);
    assert_ne!(session.execute_line("redo", &mut out), 0);
}

#[test]
fn peek_and_poke_by_type_and_address() {
    let mut session = session_with(target_with_i32s(0x2000, &[123]));
    let mut out = Console::new();

    assert_eq!(session.execute_line("peek s32 0x2000", &mut out), 0);
    assert_eq!(*plain_lines(&out).last().unwrap(), "*(s32 *)0x00002000 = 123");

    assert_eq!(session.execute_line("poke s32 0x2000 17 * 2", &mut out), 0);
    assert_eq!(*plain_lines(&out).last().unwrap(), "*(s32 *)0x00002000 = 34");

    // narrower writes only touch their own bytes
    assert_eq!(session.execute_line("poke u8 0x2000 0xff", &mut out), 0);
    assert_eq!(session.execute_line("peek s32 0x2000", &mut out), 0);
    assert_eq!(
        *plain_lines(&out).last().unwrap(),
        format!("*(s32 *)0x00002000 = {}", (34 & !0xff) | 0xff)
    );
}

#[test]
fn poke_fails_when_the_current_value_is_unreadable() {
    let target = BufferTarget::new()
        .segment(0x1000, 1i32.to_ne_bytes().to_vec())
        .unreadable_segment(0x2000, 4);
    let mut session = session_with(target);
    let mut out = Console::new();

    // the expression names `value`, so the destination must be readable
    assert_ne!(
        session.execute_line("poke s32 0x2000 value + 1", &mut out),
        0
    );
    let last = out.lines().last().unwrap();
    assert_eq!(last.kind, LineKind::Error);
    assert!(last.text.contains("error reading 4 bytes"));

    // without a `value` reference evaluation proceeds; the write reports
    assert_ne!(session.execute_line("poke s32 0x2000 7", &mut out), 0);
    let last = out.lines().last().unwrap();
    assert_eq!(last.kind, LineKind::Error);
    assert!(last.text.contains("not writable"));
}

#[test]
fn expressions_evaluate_at_the_prompt() {
    let mut session = Session::new();
    let mut out = Console::new();

    assert_eq!(session.execute_line("1 + 2 * 3", &mut out), 0);
    assert_eq!(*plain_lines(&out).last().unwrap(), "7");

    assert_eq!(session.execute_line("eval (u8)-1", &mut out), 0);
    assert_eq!(*plain_lines(&out).last().unwrap(), "255");

    // hex output honours cli.base
    session.execute_line("config cli.base = 16", &mut out);
    session.execute_line("eval 255", &mut out);
    assert_eq!(*plain_lines(&out).last().unwrap(), "0xff");
}

#[test]
fn unknown_commands_are_reported() {
    let mut session = Session::new();
    let mut out = Console::new();
    assert_ne!(session.execute_line("frobnicate 1 2 3", &mut out), 0);
    let errors: Vec<_> = out
        .lines()
        .iter()
        .filter(|l| l.kind == LineKind::Error)
        .collect();
    assert!(errors
        .iter()
        .any(|l| l.text.contains("unknown command 'frobnicate'")));
}

#[test]
fn explain_prints_rpn_and_folded_form() {
    let mut session = Session::new();
    let mut out = Console::new();

    assert_eq!(session.execute_line("explain 1 + 2 * 3", &mut out), 0);
    let lines = plain_lines(&out);
    assert_eq!(lines[0], "rpn: (s32)1 (s32)2 (s32)3 * +");
    assert_eq!(lines[1], "opt: (s32)7");
    assert_eq!(lines[2], "(s32)7");

    // the demo `value` symbol resolves inside explain
    let mut out = Console::new();
    assert_eq!(session.execute_line("explain value == 42", &mut out), 0);
    assert_eq!(plain_lines(&out)[0], "rpn: (s32)value (s32)42 ==");
}

#[test]
fn deref_expressions_read_the_target_at_the_prompt() {
    let mut session = session_with(target_with_i32s(0x3000, &[11]));
    let mut out = Console::new();

    assert_eq!(session.execute_line("eval *(s32*)0x3000 + 1", &mut out), 0);
    assert_eq!(*plain_lines(&out).last().unwrap(), "12");

    // an unreadable address surfaces the failing address and type
    assert_ne!(session.execute_line("eval *(s32*)0x9000", &mut out), 0);
    let last = out.lines().last().unwrap();
    assert_eq!(last.kind, LineKind::Error);
    assert!(last.text.contains("0x9000"));
}

#[test]
fn semicolons_and_comments_split_commands() {
    let mut session = session_with(target_with_i32s(0x1000, &[3, 4]));
    let mut out = Console::new();

    session.execute("search value == 3; filter value == 3 # trailing note", &mut out);
    assert_eq!(session.hits.len(), 1);

    session.execute("# a full-line comment", &mut out);
    assert_eq!(session.hits.len(), 1);
}

#[test]
fn library_level_search_matches_command_level() {
    let mut target = target_with_i32s(0x1000, &[1, 42, 3]);
    let hits = scan::search(
        &mut target,
        ScalarType::S32,
        "value == 42",
        &memscan::config::Config::default(),
    )
    .unwrap();
    assert_eq!(hits.len(), 1);

    let mut session = session_with(target);
    let mut out = Console::new();
    session.execute_line("search value == 42", &mut out);
    assert_eq!(session.hits.len(), 1);
}

#[test]
fn hex_dumps_are_formatted() {
    let target = BufferTarget::new().segment(0x5000, (0u8..32).collect());
    let mut session = session_with(target);
    let mut out = Console::new();

    assert_eq!(session.execute_line("hex 0x5000 16", &mut out), 0);
    let lines = plain_lines(&out);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("0x00005000  0001 0203"));
}
