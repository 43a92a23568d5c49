// Dynamic values exchanged with the host runtime.
// Strings are raw byte sequences: Lua never assumes an encoding.

mod lua_convert;
mod lua_table;
mod number;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::lua_vm::{LuaResult, LuaState, LuaVersion};

pub use lua_convert::{FromLua, IntoLua};
pub use lua_table::{LuaTable, LuaTableRef};
pub use number::{format_float, str_to_number};

/// Immutable shared byte string.
pub type LuaString = Rc<[u8]>;

/// Results of a call, in order.
pub type MultiValue = Vec<LuaValue>;

/// Native function signature: read arguments from the state, push results,
/// return how many were pushed.
pub type CFunction = fn(&mut LuaState) -> LuaResult<usize>;

/// A callable value. Wraps either a plain `CFunction` or a closure that
/// carries state (the gmatch iterator, host callbacks).
#[derive(Clone)]
pub struct LuaFunction(Rc<dyn Fn(&mut LuaState) -> LuaResult<usize>>);

impl LuaFunction {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut LuaState) -> LuaResult<usize> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn from_cfunction(f: CFunction) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub(crate) fn invoke(&self, l: &mut LuaState) -> LuaResult<usize> {
        (self.0)(l)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &LuaFunction) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for LuaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function: {:#x}", self.addr())
    }
}

#[derive(Clone, Debug, Default)]
pub enum LuaValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(LuaString),
    Table(LuaTableRef),
    Function(LuaFunction),
}

impl LuaValue {
    // ============ Constructors ============

    #[inline(always)]
    pub fn nil() -> Self {
        LuaValue::Nil
    }

    #[inline(always)]
    pub fn boolean(b: bool) -> Self {
        LuaValue::Boolean(b)
    }

    #[inline(always)]
    pub fn integer(i: i64) -> Self {
        LuaValue::Integer(i)
    }

    #[inline(always)]
    pub fn float(f: f64) -> Self {
        LuaValue::Float(f)
    }

    #[inline]
    pub fn string(bytes: &[u8]) -> Self {
        LuaValue::String(Rc::from(bytes))
    }

    #[inline]
    pub fn string_owned(bytes: Vec<u8>) -> Self {
        LuaValue::String(Rc::from(bytes))
    }

    pub fn table(table: LuaTable) -> Self {
        LuaValue::Table(Rc::new(RefCell::new(table)))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut LuaState) -> LuaResult<usize> + 'static,
    {
        LuaValue::Function(LuaFunction::new(f))
    }

    // ============ Type checks ============

    pub fn type_name(&self) -> &'static str {
        match self {
            LuaValue::Nil => "nil",
            LuaValue::Boolean(_) => "boolean",
            LuaValue::Integer(_) | LuaValue::Float(_) => "number",
            LuaValue::String(_) => "string",
            LuaValue::Table(_) => "table",
            LuaValue::Function(_) => "function",
        }
    }

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    /// Only nil and false are falsy.
    #[inline(always)]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, LuaValue::Nil | LuaValue::Boolean(false))
    }

    // ============ Raw accessors ============

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Integer(i) => Some(*i as f64),
            LuaValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            LuaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&LuaFunction> {
        match self {
            LuaValue::Function(f) => Some(f),
            _ => None,
        }
    }

    // ============ Coercions ============

    /// lua_tointeger: integers, integral floats, and strings holding either.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            LuaValue::Integer(i) => Some(*i),
            LuaValue::Float(f) => float_to_integer(*f),
            LuaValue::String(s) => str_to_number(s).and_then(|v| v.to_integer()),
            _ => None,
        }
    }

    /// lua_tonumber: numbers and numeric strings.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            LuaValue::String(s) => str_to_number(s).and_then(|v| v.as_number()),
            _ => self.as_number(),
        }
    }

    /// lua_tolstring: strings as-is, numbers rendered the way `tostring` does.
    pub fn to_lua_bytes(&self, version: LuaVersion) -> Option<LuaString> {
        match self {
            LuaValue::String(s) => Some(s.clone()),
            LuaValue::Integer(i) => {
                let mut buf = itoa::Buffer::new();
                Some(Rc::from(buf.format(*i).as_bytes()))
            }
            LuaValue::Float(f) => Some(Rc::from(format_float(*f, version).as_bytes())),
            _ => None,
        }
    }
}

/// Exact float to integer conversion (lua_numbertointeger).
#[inline]
pub fn float_to_integer(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX as f64 rounds up to it.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            (LuaValue::Integer(a), LuaValue::Integer(b)) => a == b,
            (LuaValue::Float(a), LuaValue::Float(b)) => a == b,
            (LuaValue::Integer(i), LuaValue::Float(f))
            | (LuaValue::Float(f), LuaValue::Integer(i)) => float_to_integer(*f) == Some(*i),
            (LuaValue::String(a), LuaValue::String(b)) => a == b,
            (LuaValue::Table(a), LuaValue::Table(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Function(a), LuaValue::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<&str> for LuaValue {
    fn from(s: &str) -> Self {
        LuaValue::string(s.as_bytes())
    }
}

impl From<&[u8]> for LuaValue {
    fn from(s: &[u8]) -> Self {
        LuaValue::string(s)
    }
}

impl From<i64> for LuaValue {
    fn from(i: i64) -> Self {
        LuaValue::Integer(i)
    }
}

impl From<f64> for LuaValue {
    fn from(f: f64) -> Self {
        LuaValue::Float(f)
    }
}

impl From<bool> for LuaValue {
    fn from(b: bool) -> Self {
        LuaValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!LuaValue::nil().is_truthy());
        assert!(!LuaValue::boolean(false).is_truthy());
        assert!(LuaValue::integer(0).is_truthy());
        assert!(LuaValue::from("").is_truthy());
    }

    #[test]
    fn test_integer_float_equality() {
        assert_eq!(LuaValue::integer(3), LuaValue::float(3.0));
        assert_ne!(LuaValue::integer(3), LuaValue::float(3.5));
        assert_ne!(LuaValue::integer(1), LuaValue::from("1"));
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(LuaValue::float(8.0).to_integer(), Some(8));
        assert_eq!(LuaValue::float(8.5).to_integer(), None);
        assert_eq!(LuaValue::float(f64::NAN).to_integer(), None);
        assert_eq!(LuaValue::float(9.3e18).to_integer(), None);
        assert_eq!(LuaValue::from(" 0x10 ").to_integer(), Some(16));
        assert_eq!(LuaValue::from("12.0").to_integer(), Some(12));
        assert_eq!(LuaValue::from("abc").to_integer(), None);
    }

    #[test]
    fn test_to_lua_bytes() {
        let v = LuaVersion::Lua54;
        assert_eq!(&*LuaValue::integer(-42).to_lua_bytes(v).unwrap(), b"-42");
        assert_eq!(&*LuaValue::float(2.0).to_lua_bytes(v).unwrap(), b"2.0");
        assert_eq!(&*LuaValue::float(2.0).to_lua_bytes(LuaVersion::Lua51).unwrap(), b"2");
        assert!(LuaValue::nil().to_lua_bytes(v).is_none());
    }
}
