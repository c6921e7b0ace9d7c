//! Runtime value representation and operation kernels
//!
//! Every quantity the expression engine touches is a [`Value`]: a tagged
//! fixed-width scalar, or a pointer into the target's address space. The
//! closed [`ScalarType`]/[`ValueType`] tag sets make every operation an
//! exhaustive match, so adding a type is a compile error until each kernel
//! handles it.
//!
//! # Promotion
//!
//! Only `s32`, `u32`, `s64`, `u64` and `f64` carry native operation kernels.
//! Narrower integers are promoted to `s32` (C integer promotion) and `f32`
//! is promoted to `f64` before a kernel is looked up; an `f32` arithmetic
//! result therefore stays `f64`. Binary operands are converted to the usual
//! arithmetic conversion type ([`ScalarType::higher`] over the promoted
//! operands) before the kernel runs.
//!
//! # Pointers
//!
//! A pointer value carries its pointee type and an address. Pointers take
//! part only in dereference and in casts to and from integers; casting a
//! pointer to a float (or vice versa) fails with
//! [`EvalError::PointerToNonIntegral`].

use std::cmp::Ordering;
use std::fmt;

/// Address in the target process.
pub type Address = u64;

/// Pointer width of an attached target, fixed at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrWidth {
    W32,
    W64,
}

impl AddrWidth {
    pub fn bits(self) -> u32 {
        match self {
            AddrWidth::W32 => 32,
            AddrWidth::W64 => 64,
        }
    }

    pub fn size(self) -> usize {
        match self {
            AddrWidth::W32 => 4,
            AddrWidth::W64 => 8,
        }
    }

    /// The unsigned integer type wide enough to hold an address.
    pub fn uint_type(self) -> ScalarType {
        match self {
            AddrWidth::W32 => ScalarType::U32,
            AddrWidth::W64 => ScalarType::U64,
        }
    }
}

/// The ten concrete scalar types of the expression language.
///
/// Variant order is the usual-arithmetic-conversion rank order, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    S8,
    U8,
    S16,
    U16,
    S32,
    U32,
    S64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    pub const ALL: [ScalarType; 10] = [
        ScalarType::S8,
        ScalarType::U8,
        ScalarType::S16,
        ScalarType::U16,
        ScalarType::S32,
        ScalarType::U32,
        ScalarType::S64,
        ScalarType::U64,
        ScalarType::F32,
        ScalarType::F64,
    ];

    /// Width in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarType::S8 | ScalarType::U8 => 1,
            ScalarType::S16 | ScalarType::U16 => 2,
            ScalarType::S32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::S64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::S8 => "s8",
            ScalarType::U8 => "u8",
            ScalarType::S16 => "s16",
            ScalarType::U16 => "u16",
            ScalarType::S32 => "s32",
            ScalarType::U32 => "u32",
            ScalarType::S64 => "s64",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }

    /// Resolve a user-facing type name.
    ///
    /// With the `values64` feature disabled the 64-bit integer names do not
    /// resolve, which rejects them wherever a type may be spelled out.
    pub fn from_name(name: &str) -> Option<ScalarType> {
        let ty = match name {
            "s8" => ScalarType::S8,
            "u8" => ScalarType::U8,
            "s16" => ScalarType::S16,
            "u16" => ScalarType::U16,
            "s32" => ScalarType::S32,
            "u32" => ScalarType::U32,
            "s64" => ScalarType::S64,
            "u64" => ScalarType::U64,
            "f32" => ScalarType::F32,
            "f64" => ScalarType::F64,
            _ => return None,
        };
        if cfg!(not(feature = "values64"))
            && matches!(ty, ScalarType::S64 | ScalarType::U64)
        {
            return None;
        }
        Some(ty)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ScalarType::S8 | ScalarType::S16 | ScalarType::S32 | ScalarType::S64
        )
    }

    fn rank(self) -> u8 {
        match self {
            ScalarType::S8 => 0,
            ScalarType::U8 => 1,
            ScalarType::S16 => 2,
            ScalarType::U16 => 3,
            ScalarType::S32 => 4,
            ScalarType::U32 => 5,
            ScalarType::S64 => 6,
            ScalarType::U64 => 7,
            ScalarType::F32 => 8,
            ScalarType::F64 => 9,
        }
    }

    /// C integer promotion, extended with the engine's `f32` -> `f64` rule.
    pub fn promoted(self) -> ScalarType {
        match self {
            ScalarType::S8 | ScalarType::U8 | ScalarType::S16 | ScalarType::U16 => ScalarType::S32,
            ScalarType::F32 => ScalarType::F64,
            other => other,
        }
    }

    /// Usual-arithmetic-conversion result: the higher-ranked of two types.
    pub fn higher(a: ScalarType, b: ScalarType) -> ScalarType {
        if a.rank() >= b.rank() {
            a
        } else {
            b
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar type, or a pointer to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Scalar(ScalarType),
    Ptr(ScalarType),
}

impl ValueType {
    pub fn is_integer(self) -> bool {
        matches!(self, ValueType::Scalar(t) if t.is_integer())
    }

    pub fn is_float(self) -> bool {
        matches!(self, ValueType::Scalar(t) if t.is_float())
    }

    pub fn is_pointer(self) -> bool {
        matches!(self, ValueType::Ptr(_))
    }

    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            ValueType::Scalar(t) => Some(t),
            ValueType::Ptr(_) => None,
        }
    }

    pub fn pointee(self) -> Option<ScalarType> {
        match self {
            ValueType::Ptr(t) => Some(t),
            ValueType::Scalar(_) => None,
        }
    }

    /// Width in bytes; pointers are as wide as the target's addresses.
    pub fn size(self, width: AddrWidth) -> usize {
        match self {
            ValueType::Scalar(t) => t.size(),
            ValueType::Ptr(_) => width.size(),
        }
    }
}

impl From<ScalarType> for ValueType {
    fn from(t: ScalarType) -> ValueType {
        ValueType::Scalar(t)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar(t) => write!(f, "{}", t),
            ValueType::Ptr(t) => write!(f, "{}*", t),
        }
    }
}

/// Errors surfaced by value operations and AST evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalError {
    /// An operation was applied to a type it is not defined for.
    InvalidOperandType,
    /// Integer division or modulo by zero.
    DivideByZero,
    /// Reading `type` at `addr` from the target failed.
    MemoryRead(Address, ValueType),
    /// Writing `type` to `addr` in the target failed.
    MemoryWrite(Address, ValueType),
    /// A pointer was cast to or from a non-integral type.
    PointerToNonIntegral,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::InvalidOperandType => write!(f, "invalid operand type"),
            EvalError::DivideByZero => write!(f, "division by zero"),
            EvalError::MemoryRead(addr, ty) => {
                write!(f, "error reading ({}) from address 0x{:x}", ty, addr)
            }
            EvalError::MemoryWrite(addr, ty) => {
                write!(f, "error writing ({}) to address 0x{:x}", ty, addr)
            }
            EvalError::PointerToNonIntegral => {
                write!(f, "pointer cast to or from a non-integral type")
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// A tagged runtime scalar or pointer.
///
/// Values are `Copy` and stack-local; nothing in the engine holds one for
/// longer than a single evaluation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    S8(i8),
    U8(u8),
    S16(i16),
    U16(u16),
    S32(i32),
    U32(u32),
    S64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Pointer to `ScalarType` at `Address`.
    Ptr(ScalarType, Address),
}

impl Value {
    /// The zero value of a scalar type.
    pub fn zero(ty: ScalarType) -> Value {
        match ty {
            ScalarType::S8 => Value::S8(0),
            ScalarType::U8 => Value::U8(0),
            ScalarType::S16 => Value::S16(0),
            ScalarType::U16 => Value::U16(0),
            ScalarType::S32 => Value::S32(0),
            ScalarType::U32 => Value::U32(0),
            ScalarType::S64 => Value::S64(0),
            ScalarType::U64 => Value::U64(0),
            ScalarType::F32 => Value::F32(0.0),
            ScalarType::F64 => Value::F64(0.0),
        }
    }

    /// An address as the unsigned integer of the given width.
    pub fn address(width: AddrWidth, addr: Address) -> Value {
        match width {
            AddrWidth::W32 => Value::U32(addr as u32),
            AddrWidth::W64 => Value::U64(addr),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::S8(_) => ValueType::Scalar(ScalarType::S8),
            Value::U8(_) => ValueType::Scalar(ScalarType::U8),
            Value::S16(_) => ValueType::Scalar(ScalarType::S16),
            Value::U16(_) => ValueType::Scalar(ScalarType::U16),
            Value::S32(_) => ValueType::Scalar(ScalarType::S32),
            Value::U32(_) => ValueType::Scalar(ScalarType::U32),
            Value::S64(_) => ValueType::Scalar(ScalarType::S64),
            Value::U64(_) => ValueType::Scalar(ScalarType::U64),
            Value::F32(_) => ValueType::Scalar(ScalarType::F32),
            Value::F64(_) => ValueType::Scalar(ScalarType::F64),
            Value::Ptr(t, _) => ValueType::Ptr(*t),
        }
    }

    /// Zero test used by conditions; NaN counts as non-zero, like in C.
    pub fn is_zero(&self) -> bool {
        match *self {
            Value::S8(x) => x == 0,
            Value::U8(x) => x == 0,
            Value::S16(x) => x == 0,
            Value::U16(x) => x == 0,
            Value::S32(x) => x == 0,
            Value::U32(x) => x == 0,
            Value::S64(x) => x == 0,
            Value::U64(x) => x == 0,
            Value::F32(x) => x == 0.0,
            Value::F64(x) => x == 0.0,
            Value::Ptr(_, a) => a == 0,
        }
    }

    /// The address held by an unsigned-integer or pointer value.
    pub fn as_address(&self) -> Option<Address> {
        match *self {
            Value::U32(x) => Some(x as Address),
            Value::U64(x) => Some(x),
            Value::Ptr(_, a) => Some(a),
            _ => None,
        }
    }

    fn signed(self) -> Option<i64> {
        match self {
            Value::S8(x) => Some(x as i64),
            Value::S16(x) => Some(x as i64),
            Value::S32(x) => Some(x as i64),
            Value::S64(x) => Some(x),
            _ => None,
        }
    }

    fn unsigned(self) -> Option<u64> {
        match self {
            Value::U8(x) => Some(x as u64),
            Value::U16(x) => Some(x as u64),
            Value::U32(x) => Some(x as u64),
            Value::U64(x) => Some(x),
            _ => None,
        }
    }

    fn float(self) -> Option<f64> {
        match self {
            Value::F32(x) => Some(x as f64),
            Value::F64(x) => Some(x),
            _ => None,
        }
    }

    fn from_i64(ty: ScalarType, x: i64) -> Value {
        match ty {
            ScalarType::S8 => Value::S8(x as i8),
            ScalarType::U8 => Value::U8(x as u8),
            ScalarType::S16 => Value::S16(x as i16),
            ScalarType::U16 => Value::U16(x as u16),
            ScalarType::S32 => Value::S32(x as i32),
            ScalarType::U32 => Value::U32(x as u32),
            ScalarType::S64 => Value::S64(x),
            ScalarType::U64 => Value::U64(x as u64),
            ScalarType::F32 => Value::F32(x as f32),
            ScalarType::F64 => Value::F64(x as f64),
        }
    }

    fn from_u64(ty: ScalarType, x: u64) -> Value {
        match ty {
            ScalarType::S8 => Value::S8(x as i8),
            ScalarType::U8 => Value::U8(x as u8),
            ScalarType::S16 => Value::S16(x as i16),
            ScalarType::U16 => Value::U16(x as u16),
            ScalarType::S32 => Value::S32(x as i32),
            ScalarType::U32 => Value::U32(x as u32),
            ScalarType::S64 => Value::S64(x as i64),
            ScalarType::U64 => Value::U64(x),
            ScalarType::F32 => Value::F32(x as f32),
            ScalarType::F64 => Value::F64(x as f64),
        }
    }

    /// Float-to-integer conversions saturate and map NaN to zero (Rust `as`
    /// semantics); C leaves these cases implementation-defined.
    fn from_f64(ty: ScalarType, x: f64) -> Value {
        match ty {
            ScalarType::S8 => Value::S8(x as i8),
            ScalarType::U8 => Value::U8(x as u8),
            ScalarType::S16 => Value::S16(x as i16),
            ScalarType::U16 => Value::U16(x as u16),
            ScalarType::S32 => Value::S32(x as i32),
            ScalarType::U32 => Value::U32(x as u32),
            ScalarType::S64 => Value::S64(x as i64),
            ScalarType::U64 => Value::U64(x as u64),
            ScalarType::F32 => Value::F32(x as f32),
            ScalarType::F64 => Value::F64(x),
        }
    }

    /// C-style conversion to `to`.
    pub fn cast(self, to: ValueType) -> Result<Value, EvalError> {
        match to {
            ValueType::Scalar(t) => {
                if let Value::Ptr(_, addr) = self {
                    return if t.is_integer() {
                        Ok(Value::from_u64(t, addr))
                    } else {
                        Err(EvalError::PointerToNonIntegral)
                    };
                }
                if let Some(x) = self.signed() {
                    Ok(Value::from_i64(t, x))
                } else if let Some(x) = self.unsigned() {
                    Ok(Value::from_u64(t, x))
                } else if let Some(x) = self.float() {
                    Ok(Value::from_f64(t, x))
                } else {
                    Err(EvalError::InvalidOperandType)
                }
            }
            ValueType::Ptr(p) => match self {
                Value::Ptr(_, a) => Ok(Value::Ptr(p, a)),
                _ => {
                    if let Some(x) = self.signed() {
                        Ok(Value::Ptr(p, x as u64))
                    } else if let Some(x) = self.unsigned() {
                        Ok(Value::Ptr(p, x))
                    } else {
                        Err(EvalError::PointerToNonIntegral)
                    }
                }
            },
        }
    }

    /// Convert `src` to this value's type and store it.
    pub fn assign(&mut self, src: Value) -> Result<(), EvalError> {
        *self = src.cast(self.value_type())?;
        Ok(())
    }

    /// Promote to a kernel-bearing type: narrow integers to `s32`, `f32` to
    /// `f64`. Pointers do not promote.
    pub fn promoted(self) -> Result<Value, EvalError> {
        match self.value_type() {
            ValueType::Scalar(t) => self.cast(ValueType::Scalar(t.promoted())),
            ValueType::Ptr(_) => Err(EvalError::InvalidOperandType),
        }
    }

    /// Convert both operands to their usual-arithmetic-conversion type.
    fn coerce_pair(self, rhs: Value) -> Result<(Value, Value), EvalError> {
        let (a, b) = match (self.value_type(), rhs.value_type()) {
            (ValueType::Scalar(a), ValueType::Scalar(b)) => (a, b),
            _ => return Err(EvalError::InvalidOperandType),
        };
        let t = ValueType::Scalar(ScalarType::higher(a.promoted(), b.promoted()));
        Ok((self.cast(t)?, rhs.cast(t)?))
    }

    // Unary kernels.

    pub fn neg(self) -> Result<Value, EvalError> {
        match self.promoted()? {
            Value::S32(a) => Ok(Value::S32(a.wrapping_neg())),
            Value::U32(a) => Ok(Value::U32(a.wrapping_neg())),
            Value::S64(a) => Ok(Value::S64(a.wrapping_neg())),
            Value::U64(a) => Ok(Value::U64(a.wrapping_neg())),
            Value::F64(a) => Ok(Value::F64(-a)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    /// Logical not. Integer results keep the promoted operand type; floats
    /// compare against zero and yield `s32`.
    pub fn logical_not(self) -> Result<Value, EvalError> {
        match self.promoted()? {
            Value::S32(a) => Ok(Value::S32((a == 0) as i32)),
            Value::U32(a) => Ok(Value::U32((a == 0) as u32)),
            Value::S64(a) => Ok(Value::S64((a == 0) as i64)),
            Value::U64(a) => Ok(Value::U64((a == 0) as u64)),
            Value::F64(a) => Ok(Value::S32((a == 0.0) as i32)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    pub fn compl(self) -> Result<Value, EvalError> {
        match self.promoted()? {
            Value::S32(a) => Ok(Value::S32(!a)),
            Value::U32(a) => Ok(Value::U32(!a)),
            Value::S64(a) => Ok(Value::S64(!a)),
            Value::U64(a) => Ok(Value::U64(!a)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    // Arithmetic kernels. Integer arithmetic wraps, two's-complement style.

    pub fn add(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a.wrapping_add(b))),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a.wrapping_add(b))),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a.wrapping_add(b))),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a.wrapping_add(b))),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a + b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    pub fn sub(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a.wrapping_sub(b))),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a.wrapping_sub(b))),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a.wrapping_sub(b))),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a.wrapping_sub(b))),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a - b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    pub fn mul(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a.wrapping_mul(b))),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a.wrapping_mul(b))),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a.wrapping_mul(b))),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a.wrapping_mul(b))),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a * b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    /// Integer division by zero fails; float division follows IEEE 754.
    pub fn div(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (_, b) if b.value_type().is_integer() && b.is_zero() => Err(EvalError::DivideByZero),
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a.wrapping_div(b))),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a.wrapping_div(b))),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a.wrapping_div(b))),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a.wrapping_div(b))),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a / b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    /// Truncated-division remainder; integers only.
    pub fn rem(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (a, b) if a.value_type().is_integer() && b.is_zero() => Err(EvalError::DivideByZero),
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a.wrapping_rem(b))),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a.wrapping_rem(b))),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a.wrapping_rem(b))),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a.wrapping_rem(b))),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    // Bitwise kernels; integers only.

    pub fn bit_and(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a & b)),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a & b)),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a & b)),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a & b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    pub fn bit_xor(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a ^ b)),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a ^ b)),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a ^ b)),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a ^ b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    pub fn bit_or(self, rhs: Value) -> Result<Value, EvalError> {
        match self.coerce_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a | b)),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a | b)),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a | b)),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a | b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    // Shifts keep the promoted left operand's type; the right operand is
    // converted to it. Counts at or above the width wrap modulo the width.

    fn shift_pair(self, rhs: Value) -> Result<(Value, Value), EvalError> {
        let lhs = self.promoted()?;
        let t = match lhs.value_type() {
            ValueType::Scalar(t) if t.is_integer() => t,
            _ => return Err(EvalError::InvalidOperandType),
        };
        Ok((lhs, rhs.cast(ValueType::Scalar(t))?))
    }

    pub fn shl(self, rhs: Value) -> Result<Value, EvalError> {
        match self.shift_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a.wrapping_shl(b as u32))),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a.wrapping_shl(b))),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a.wrapping_shl(b as u32))),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a.wrapping_shl(b as u32))),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    /// Arithmetic shift for signed operands, logical for unsigned.
    pub fn shr(self, rhs: Value) -> Result<Value, EvalError> {
        match self.shift_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Value::S32(a.wrapping_shr(b as u32))),
            (Value::U32(a), Value::U32(b)) => Ok(Value::U32(a.wrapping_shr(b))),
            (Value::S64(a), Value::S64(b)) => Ok(Value::S64(a.wrapping_shr(b as u32))),
            (Value::U64(a), Value::U64(b)) => Ok(Value::U64(a.wrapping_shr(b as u32))),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    // Comparisons; always produce s32 0 or 1. Mixed integer/float pairs are
    // compared as f64, the same conversion arithmetic uses.

    fn ordering(self, rhs: Value) -> Result<Option<Ordering>, EvalError> {
        match self.coerce_pair(rhs)? {
            (Value::S32(a), Value::S32(b)) => Ok(Some(a.cmp(&b))),
            (Value::U32(a), Value::U32(b)) => Ok(Some(a.cmp(&b))),
            (Value::S64(a), Value::S64(b)) => Ok(Some(a.cmp(&b))),
            (Value::U64(a), Value::U64(b)) => Ok(Some(a.cmp(&b))),
            (Value::F64(a), Value::F64(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(EvalError::InvalidOperandType),
        }
    }

    pub fn cmp_eq(self, rhs: Value) -> Result<Value, EvalError> {
        Ok(Value::S32((self.ordering(rhs)? == Some(Ordering::Equal)) as i32))
    }

    pub fn cmp_neq(self, rhs: Value) -> Result<Value, EvalError> {
        Ok(Value::S32((self.ordering(rhs)? != Some(Ordering::Equal)) as i32))
    }

    pub fn cmp_lt(self, rhs: Value) -> Result<Value, EvalError> {
        Ok(Value::S32((self.ordering(rhs)? == Some(Ordering::Less)) as i32))
    }

    pub fn cmp_gt(self, rhs: Value) -> Result<Value, EvalError> {
        Ok(Value::S32((self.ordering(rhs)? == Some(Ordering::Greater)) as i32))
    }

    pub fn cmp_le(self, rhs: Value) -> Result<Value, EvalError> {
        Ok(Value::S32(matches!(
            self.ordering(rhs)?,
            Some(Ordering::Less) | Some(Ordering::Equal)
        ) as i32))
    }

    pub fn cmp_ge(self, rhs: Value) -> Result<Value, EvalError> {
        Ok(Value::S32(matches!(
            self.ordering(rhs)?,
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ) as i32))
    }

    // Raw storage, native byte order (the byte order of the target's RAM).

    /// Decode a scalar from the first `ty.size()` bytes of `bytes`.
    pub fn from_ne_bytes(ty: ScalarType, bytes: &[u8]) -> Option<Value> {
        if bytes.len() < ty.size() {
            return None;
        }
        Some(match ty {
            ScalarType::S8 => Value::S8(bytes[0] as i8),
            ScalarType::U8 => Value::U8(bytes[0]),
            ScalarType::S16 => Value::S16(i16::from_ne_bytes(bytes[..2].try_into().ok()?)),
            ScalarType::U16 => Value::U16(u16::from_ne_bytes(bytes[..2].try_into().ok()?)),
            ScalarType::S32 => Value::S32(i32::from_ne_bytes(bytes[..4].try_into().ok()?)),
            ScalarType::U32 => Value::U32(u32::from_ne_bytes(bytes[..4].try_into().ok()?)),
            ScalarType::S64 => Value::S64(i64::from_ne_bytes(bytes[..8].try_into().ok()?)),
            ScalarType::U64 => Value::U64(u64::from_ne_bytes(bytes[..8].try_into().ok()?)),
            ScalarType::F32 => Value::F32(f32::from_ne_bytes(bytes[..4].try_into().ok()?)),
            ScalarType::F64 => Value::F64(f64::from_ne_bytes(bytes[..8].try_into().ok()?)),
        })
    }

    /// Encode the value; pointers encode as `width` address bytes.
    pub fn to_ne_bytes(&self, width: AddrWidth) -> Vec<u8> {
        match *self {
            Value::S8(x) => vec![x as u8],
            Value::U8(x) => vec![x],
            Value::S16(x) => x.to_ne_bytes().to_vec(),
            Value::U16(x) => x.to_ne_bytes().to_vec(),
            Value::S32(x) => x.to_ne_bytes().to_vec(),
            Value::U32(x) => x.to_ne_bytes().to_vec(),
            Value::S64(x) => x.to_ne_bytes().to_vec(),
            Value::U64(x) => x.to_ne_bytes().to_vec(),
            Value::F32(x) => x.to_ne_bytes().to_vec(),
            Value::F64(x) => x.to_ne_bytes().to_vec(),
            Value::Ptr(_, a) => match width {
                AddrWidth::W32 => (a as u32).to_ne_bytes().to_vec(),
                AddrWidth::W64 => a.to_ne_bytes().to_vec(),
            },
        }
    }
}

fn fmt_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    // %g-ish: exponent form outside the comfortable decimal range
    if x == 0.0 || (1e-4..1e17).contains(&x.abs()) || !x.is_finite() {
        write!(f, "{}", x)
    } else {
        write!(f, "{:e}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::S8(x) => write!(f, "{}", x),
            Value::U8(x) => write!(f, "{}", x),
            Value::S16(x) => write!(f, "{}", x),
            Value::U16(x) => write!(f, "{}", x),
            Value::S32(x) => write!(f, "{}", x),
            Value::U32(x) => write!(f, "{}", x),
            Value::S64(x) => write!(f, "{}", x),
            Value::U64(x) => write!(f, "{}", x),
            Value::F32(x) => fmt_float(f, x as f64),
            Value::F64(x) => fmt_float(f, x),
            Value::Ptr(_, a) => write!(f, "0x{:x}", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_reaches_native_kernels() {
        let a = Value::S16(300);
        let b = Value::S16(300);
        assert_eq!(a.add(b), Ok(Value::S32(600)));

        let c = Value::U8(200);
        assert_eq!(c.add(Value::U8(100)), Ok(Value::S32(300)));
    }

    #[test]
    fn f32_arithmetic_stays_f64() {
        let r = Value::F32(1.5).add(Value::F32(2.0)).unwrap();
        assert_eq!(r, Value::F64(3.5));
    }

    #[test]
    fn uac_is_commutative_and_monotone() {
        for &a in &ScalarType::ALL {
            for &b in &ScalarType::ALL {
                assert_eq!(ScalarType::higher(a, b), ScalarType::higher(b, a));
                let h = ScalarType::higher(a, b);
                assert!(h == a || h == b);
            }
        }
    }

    #[test]
    fn division_by_zero_fails_for_integers_only() {
        assert_eq!(
            Value::S32(10).div(Value::S32(0)),
            Err(EvalError::DivideByZero)
        );
        assert_eq!(
            Value::S32(10).rem(Value::S32(0)),
            Err(EvalError::DivideByZero)
        );
        let inf = Value::F64(1.0).div(Value::F64(0.0)).unwrap();
        assert_eq!(inf, Value::F64(f64::INFINITY));
    }

    #[test]
    fn signed_unsigned_comparison_follows_uac() {
        // (u32)-1 > 0 compares as u32
        let neg = Value::S32(-1).cast(ValueType::Scalar(ScalarType::U32)).unwrap();
        assert_eq!(neg.cmp_gt(Value::S32(0)), Ok(Value::S32(1)));
    }

    #[test]
    fn mixed_int_float_comparison_promotes_to_f64() {
        let big = Value::U64(1 << 60);
        assert_eq!(big.cmp_gt(Value::F64(1.5)), Ok(Value::S32(1)));
        assert_eq!(Value::S32(2).cmp_eq(Value::F64(2.0)), Ok(Value::S32(1)));
    }

    #[test]
    fn float_to_int_casts_saturate() {
        let v = Value::F64(-1.5).cast(ValueType::Scalar(ScalarType::U8)).unwrap();
        assert_eq!(v, Value::U8(0));
        let v = Value::F64(1e300).cast(ValueType::Scalar(ScalarType::S32)).unwrap();
        assert_eq!(v, Value::S32(i32::MAX));
    }

    #[test]
    fn pointer_casts_round_trip_through_integers() {
        let p = Value::U64(0x1000).cast(ValueType::Ptr(ScalarType::S32)).unwrap();
        assert_eq!(p, Value::Ptr(ScalarType::S32, 0x1000));
        let back = p.cast(ValueType::Scalar(ScalarType::U64)).unwrap();
        assert_eq!(back, Value::U64(0x1000));
        assert_eq!(
            p.cast(ValueType::Scalar(ScalarType::F64)),
            Err(EvalError::PointerToNonIntegral)
        );
    }

    #[test]
    fn shifts_keep_left_operand_type() {
        assert_eq!(Value::U32(1).shl(Value::S32(4)), Ok(Value::U32(16)));
        assert_eq!(Value::S32(-8).shr(Value::S32(1)), Ok(Value::S32(-4)));
        assert_eq!(Value::U32(0x80000000).shr(Value::S32(1)), Ok(Value::U32(0x40000000)));
        // shift by zero is the identity
        assert_eq!(Value::S32(42).shl(Value::S32(0)), Ok(Value::S32(42)));
    }

    #[test]
    fn bitwise_rejects_floats() {
        assert_eq!(
            Value::F64(1.0).bit_xor(Value::S32(1)),
            Err(EvalError::InvalidOperandType)
        );
    }

    #[test]
    fn byte_round_trip() {
        for &ty in &ScalarType::ALL {
            let v = Value::zero(ty);
            let bytes = v.to_ne_bytes(AddrWidth::W64);
            assert_eq!(bytes.len(), ty.size());
            assert_eq!(Value::from_ne_bytes(ty, &bytes), Some(v));
        }
        let v = Value::S32(-123456);
        assert_eq!(
            Value::from_ne_bytes(ScalarType::S32, &v.to_ne_bytes(AddrWidth::W64)),
            Some(v)
        );
    }
}
