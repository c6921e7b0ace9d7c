// End-to-end expression scenarios: parse, fold, evaluate, and pin the
// observable results down to the typed value.

use memscan::expr::parse_expression;
use memscan::symbol::SymbolTable;
use memscan::target::BufferTarget;
use memscan::value::{EvalError, ScalarType, Value, ValueType};

fn eval(input: &str) -> Result<Value, EvalError> {
    let ast = parse_expression(input, None).expect("parse failure");
    let folded = ast.optimize();
    let plain = ast.evaluate(None);
    let opt = folded.evaluate(None);
    assert_eq!(plain, opt, "optimisation changed the result of {:?}", input);
    opt
}

#[test]
fn arithmetic_with_precedence() {
    assert_eq!(eval("1 + 2 * 3"), Ok(Value::S32(7)));
}

#[test]
fn unsigned_cast_changes_comparison() {
    assert_eq!(eval("(u32)-1 > 0"), Ok(Value::S32(1)));
    assert_eq!(eval("-1 > 0"), Ok(Value::S32(0)));
}

#[test]
fn int_float_mixing_goes_to_f64() {
    assert_eq!(eval("1.5 + 2"), Ok(Value::F64(3.5)));
}

#[test]
fn narrow_operands_promote_to_s32() {
    // both s16 casts overflow s16 addition; promotion makes this 600
    assert_eq!(eval("(s16)300 + (s16)300"), Ok(Value::S32(600)));
}

#[test]
fn bound_symbols_drive_predicates() {
    let mut symtab = SymbolTable::new();
    symtab.insert("value", Value::S32(42)).unwrap();
    symtab.insert("addr", Value::U32(0x1000)).unwrap();

    let ast = parse_expression("value == 42 && (addr & 0x3) == 0", Some(&symtab))
        .unwrap()
        .optimize();
    assert_eq!(ast.evaluate(None), Ok(Value::S32(1)));
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(eval("10 / 0"), Err(EvalError::DivideByZero));
    assert_eq!(eval("10 % 0"), Err(EvalError::DivideByZero));
}

#[test]
fn deref_follows_pointers_into_the_target() {
    let target = BufferTarget::new().segment(0x2000, 7i32.to_ne_bytes().to_vec());
    let mut symtab = SymbolTable::new();
    symtab.insert("addr", Value::U32(0x2000)).unwrap();

    let ast = parse_expression("*(s32*)addr + 1", Some(&symtab)).unwrap();
    assert_eq!(ast.evaluate(Some(&target)), Ok(Value::S32(8)));
    assert!(ast.has_deref());
}

// Boundary behaviours.

#[test]
fn shift_by_zero_is_identity() {
    assert_eq!(eval("42 << 0"), Ok(Value::S32(42)));
    assert_eq!(eval("42 >> 0"), Ok(Value::S32(42)));
}

#[test]
#[cfg(feature = "values64")]
fn u64_literals_above_i64_max() {
    assert_eq!(
        eval("0xFFFFFFFFFFFFFFFF"),
        Ok(Value::U64(u64::MAX))
    );
    assert_eq!(eval("9223372036854775808 > 0"), Ok(Value::S32(1)));
}

#[test]
#[cfg(feature = "values64")]
fn f64_u64_comparison_promotes_to_f64() {
    assert_eq!(eval("18446744073709551615u > 1.5"), Ok(Value::S32(1)));
    assert_eq!(eval("2.0 == 2u"), Ok(Value::S32(1)));
}

#[test]
fn negative_float_to_u8_is_pinned_to_zero() {
    // implementation-defined in C; this engine saturates
    assert_eq!(eval("(u8)-1.5"), Ok(Value::U8(0)));
    assert_eq!(eval("(u8)255.9"), Ok(Value::U8(255)));
}

#[test]
fn xor_on_floats_is_a_parse_error() {
    let err = parse_expression("1.5 ^ 2", None).unwrap_err();
    assert!(err.count() >= 1);
    assert!(err.errors[0].contains("'^'"));
}

#[test]
fn unknown_identifiers_are_parse_errors() {
    let err = parse_expression("nosuch + 1", None).unwrap_err();
    assert!(err.errors[0].contains("unknown identifier 'nosuch'"));

    // identifiers also fail against a non-empty table that lacks them
    let mut symtab = SymbolTable::new();
    symtab.insert("value", Value::S32(0)).unwrap();
    assert!(parse_expression("valu + 1", Some(&symtab)).is_err());
}

// Optimiser invariants.

#[test]
fn constant_trees_fold_to_one_leaf() {
    for input in ["1 + 2 * 3", "(u32)-1 > 0", "1.5 + 2", "!0 && !0"] {
        let folded = parse_expression(input, None).unwrap().optimize();
        assert!(
            matches!(folded, memscan::expr::Expr::Value(_)),
            "{:?} did not fold to a leaf: {}",
            input,
            folded.rpn()
        );
    }
}

#[test]
fn optimisation_is_idempotent_with_symbols() {
    let mut symtab = SymbolTable::new();
    symtab.insert("value", Value::S32(5)).unwrap();

    let ast = parse_expression("value + (1 + 2)", Some(&symtab)).unwrap();
    let once = ast.optimize();
    let twice = once.optimize();
    assert_eq!(once.rpn(), twice.rpn());
    // the constant half folded, the symbol half survived
    assert_eq!(once.rpn(), "(s32)value (s32)3 +");
    assert_eq!(once.evaluate(None), Ok(Value::S32(8)));
}

#[test]
fn failing_constants_survive_unfolded() {
    let ast = parse_expression("1 + 10 / 0", None).unwrap();
    let folded = ast.optimize();
    assert_eq!(folded.evaluate(None), Err(EvalError::DivideByZero));
}

// RPN pinning.

#[test]
fn rpn_output_is_stable() {
    let cases = [
        ("1 + 2 * 3", "(s32)1 (s32)2 (s32)3 * +"),
        ("-1", "(s32)1 u-"),
        ("(u16)(1 + 2)", "(s32)1 (s32)2 + (u16)"),
        ("*(s32*)4096", "(s32)4096 (s32*) *(s32 *)"),
        ("1 && 2", "(s32)1 (s32)2 &&"),
        ("1 <= 2", "(s32)1 (s32)2 <="),
    ];
    for (input, expected) in cases {
        assert_eq!(parse_expression(input, None).unwrap().rpn(), expected);
    }
}

#[test]
fn parsing_is_deterministic() {
    for input in ["1 + 2 * 3 - 4 / 2", "(u8)((3 << 2) | 1)", "1.5 < 2 && 3 != 4"] {
        let a = parse_expression(input, None).unwrap();
        let b = parse_expression(input, None).unwrap();
        assert_eq!(a.rpn(), b.rpn());
        assert_eq!(a.evaluate(None), b.evaluate(None));
    }
}

#[test]
fn result_types_match_the_grammar_table() {
    let cases: &[(&str, ValueType)] = &[
        ("1 && 1", ValueType::Scalar(ScalarType::S32)),
        ("1 == 1.5", ValueType::Scalar(ScalarType::S32)),
        ("1u | 2", ValueType::Scalar(ScalarType::U32)),
        ("1u << 30", ValueType::Scalar(ScalarType::U32)),
        ("1 + 2u", ValueType::Scalar(ScalarType::U32)),
        ("(f32)1 + (f32)2", ValueType::Scalar(ScalarType::F64)),
        ("(s32*)0x1000", ValueType::Ptr(ScalarType::S32)),
        ("*(u16*)0x1000", ValueType::Scalar(ScalarType::U16)),
    ];
    for (input, expected) in cases {
        let ast = parse_expression(input, None).unwrap();
        assert_eq!(ast.value_type(), *expected, "for {:?}", input);
    }
}

#[test]
fn f32_arithmetic_result_stays_f64() {
    // f32 operands are computed as (and stay) f64
    let v = eval("(f32)1.5 + (f32)0.25").unwrap();
    assert_eq!(v.value_type(), ValueType::Scalar(ScalarType::F64));
    assert_eq!(v, Value::F64(1.75));
}
