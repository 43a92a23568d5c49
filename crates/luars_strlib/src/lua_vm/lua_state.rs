// Per-call state handed to native functions: the argument window, the
// result buffer, and the active library options.

use std::rc::Rc;

use tracing::debug;

use crate::lua_value::{FromLua, LuaFunction, LuaString, LuaValue, MultiValue};
use crate::lua_vm::{LuaError, LuaResult, LuaVersion, StrlibOption};

pub struct LuaState {
    args: Vec<LuaValue>,
    results: Vec<LuaValue>,
    options: Rc<StrlibOption>,
}

impl LuaState {
    pub fn new(options: Rc<StrlibOption>, args: Vec<LuaValue>) -> Self {
        Self {
            args,
            results: Vec::new(),
            options,
        }
    }

    #[inline]
    pub fn options(&self) -> &StrlibOption {
        &self.options
    }

    #[inline]
    pub fn version(&self) -> LuaVersion {
        self.options.version
    }

    // ============ Arguments ============

    /// 1-based argument; `None` when absent.
    #[inline]
    pub fn get_arg(&self, index: usize) -> Option<&LuaValue> {
        index.checked_sub(1).and_then(|i| self.args.get(i))
    }

    /// Absent arguments and explicit nils are both "none or nil".
    #[inline]
    fn is_none_or_nil(&self, index: usize) -> bool {
        self.get_arg(index).is_none_or(LuaValue::is_nil)
    }

    /// luaL_checklstring: strings, or numbers converted to strings.
    pub fn check_string(&self, index: usize, func: &'static str) -> LuaResult<LuaString> {
        self.get_arg(index)
            .and_then(|v| v.to_lua_bytes(self.version()))
            .ok_or_else(|| self.type_error(index, func, "string"))
    }

    /// luaL_checkinteger
    pub fn check_integer(&self, index: usize, func: &'static str) -> LuaResult<i64> {
        let value = self.get_arg(index);
        if let Some(i) = value.and_then(LuaValue::to_integer) {
            return Ok(i);
        }
        if value.and_then(LuaValue::to_number).is_some() {
            Err(self.arg_error(index, func, "number has no integer representation"))
        } else {
            Err(self.type_error(index, func, "number"))
        }
    }

    /// luaL_optinteger
    pub fn opt_integer(&self, index: usize, func: &'static str, default: i64) -> LuaResult<i64> {
        if self.is_none_or_nil(index) {
            Ok(default)
        } else {
            self.check_integer(index, func)
        }
    }

    /// luaL_checknumber
    pub fn check_number(&self, index: usize, func: &'static str) -> LuaResult<f64> {
        self.get_arg(index)
            .and_then(LuaValue::to_number)
            .ok_or_else(|| self.type_error(index, func, "number"))
    }

    /// luaL_checkany
    pub fn check_any(&self, index: usize, func: &'static str) -> LuaResult<LuaValue> {
        self.get_arg(index)
            .cloned()
            .ok_or_else(|| self.arg_error(index, func, "value expected"))
    }

    /// Typed extraction through `FromLua`. With `optional`, a missing or nil
    /// argument yields `Ok(None)`.
    pub fn as_type<T: FromLua>(
        &self,
        index: usize,
        func: &'static str,
        optional: bool,
    ) -> LuaResult<Option<T>> {
        if optional && self.is_none_or_nil(index) {
            return Ok(None);
        }
        let value = self.get_arg(index).cloned().unwrap_or_default();
        T::from_lua(value)
            .map(Some)
            .map_err(|expected| self.type_error(index, func, expected))
    }

    // ============ Results ============

    #[inline]
    pub fn push_value(&mut self, value: LuaValue) -> LuaResult<()> {
        self.results.push(value);
        Ok(())
    }

    pub fn take_results(&mut self) -> MultiValue {
        std::mem::take(&mut self.results)
    }

    // ============ Calls ============

    /// Call `func` with `args` in a fresh frame sharing this state's options.
    pub fn call(&self, func: &LuaFunction, args: Vec<LuaValue>) -> LuaResult<MultiValue> {
        let mut frame = LuaState::new(self.options.clone(), args);
        let n = func.invoke(&mut frame)?;
        let mut results = frame.take_results();
        // A function may return fewer values than it pushed.
        let keep = results.len().saturating_sub(n);
        results.drain(..keep);
        Ok(results)
    }

    // ============ Errors ============

    pub fn error(&self, msg: impl Into<String>) -> LuaError {
        LuaError::RuntimeError(msg.into())
    }

    pub fn arg_error(&self, index: usize, func: &'static str, msg: impl Into<String>) -> LuaError {
        LuaError::BadArgument {
            arg: index,
            func,
            msg: msg.into(),
        }
    }

    /// luaL_typeerror: "T expected, got U" (or "got no value").
    pub fn type_error(&self, index: usize, func: &'static str, expected: &str) -> LuaError {
        let got = self
            .get_arg(index)
            .map(LuaValue::type_name)
            .unwrap_or("no value");
        self.arg_error(index, func, format!("{expected} expected, got {got}"))
    }

    /// Reject the call when the active version predates `required`.
    pub fn require_version(&self, func: &'static str, required: LuaVersion) -> LuaResult<()> {
        let current = self.version();
        if current >= required {
            return Ok(());
        }
        debug!(func, %required, %current, "library function unavailable in this version");
        Err(LuaError::VersionUnavailable {
            func,
            required,
            current,
        })
    }
}
