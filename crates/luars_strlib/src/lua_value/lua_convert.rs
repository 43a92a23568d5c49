//! `FromLua` / `IntoLua`: conversions between Rust types and `LuaValue`.
//!
//! Used by `LuaVM::call` so hosts and tests can pass native values and read
//! results back without matching on `LuaValue` by hand.

use crate::lua_value::{LuaFunction, LuaString, LuaTableRef, LuaValue};

/// Convert a `LuaValue` into a Rust type. `Err` carries the expected type
/// name for the error message.
pub trait FromLua: Sized {
    fn from_lua(value: LuaValue) -> Result<Self, &'static str>;
}

/// Convert a Rust value into a `LuaValue`.
pub trait IntoLua {
    fn into_lua(self) -> LuaValue;
}

impl FromLua for LuaValue {
    #[inline]
    fn from_lua(value: LuaValue) -> Result<Self, &'static str> {
        Ok(value)
    }
}

impl FromLua for bool {
    fn from_lua(value: LuaValue) -> Result<Self, &'static str> {
        Ok(value.is_truthy())
    }
}

impl FromLua for i64 {
    fn from_lua(value: LuaValue) -> Result<Self, &'static str> {
        value.to_integer().ok_or("integer")
    }
}

impl FromLua for f64 {
    fn from_lua(value: LuaValue) -> Result<Self, &'static str> {
        value.to_number().ok_or("number")
    }
}

impl FromLua for Vec<u8> {
    fn from_lua(value: LuaValue) -> Result<Self, &'static str> {
        value.as_bytes().map(<[u8]>::to_vec).ok_or("string")
    }
}

impl FromLua for String {
    fn from_lua(value: LuaValue) -> Result<Self, &'static str> {
        value
            .as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .ok_or("string")
    }
}

impl<T: FromLua> FromLua for Option<T> {
    fn from_lua(value: LuaValue) -> Result<Self, &'static str> {
        if value.is_nil() {
            Ok(None)
        } else {
            T::from_lua(value).map(Some)
        }
    }
}

impl IntoLua for LuaValue {
    #[inline]
    fn into_lua(self) -> LuaValue {
        self
    }
}

impl IntoLua for bool {
    fn into_lua(self) -> LuaValue {
        LuaValue::Boolean(self)
    }
}

impl IntoLua for i64 {
    fn into_lua(self) -> LuaValue {
        LuaValue::Integer(self)
    }
}

impl IntoLua for i32 {
    fn into_lua(self) -> LuaValue {
        LuaValue::Integer(self as i64)
    }
}

impl IntoLua for f64 {
    fn into_lua(self) -> LuaValue {
        LuaValue::Float(self)
    }
}

impl IntoLua for &str {
    fn into_lua(self) -> LuaValue {
        LuaValue::string(self.as_bytes())
    }
}

impl IntoLua for &[u8] {
    fn into_lua(self) -> LuaValue {
        LuaValue::string(self)
    }
}

impl IntoLua for Vec<u8> {
    fn into_lua(self) -> LuaValue {
        LuaValue::string_owned(self)
    }
}

impl IntoLua for LuaString {
    fn into_lua(self) -> LuaValue {
        LuaValue::String(self)
    }
}

impl IntoLua for LuaTableRef {
    fn into_lua(self) -> LuaValue {
        LuaValue::Table(self)
    }
}

impl IntoLua for LuaFunction {
    fn into_lua(self) -> LuaValue {
        LuaValue::Function(self)
    }
}

impl<T: IntoLua> IntoLua for Option<T> {
    fn into_lua(self) -> LuaValue {
        self.map(IntoLua::into_lua).unwrap_or_default()
    }
}
