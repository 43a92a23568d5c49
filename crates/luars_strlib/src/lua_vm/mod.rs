// Minimal host runtime: a globals table with the string library loaded,
// and a way to call into it.

mod lua_error;
pub mod lua_limits;
mod lua_state;
mod safe_option;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::lib_registry::LibraryRegistry;
use crate::lua_value::{IntoLua, LuaFunction, LuaTable, LuaTableRef, LuaValue, MultiValue};

pub use lua_error::LuaError;
pub use lua_state::LuaState;
pub use safe_option::{LuaVersion, StrlibOption};

pub type LuaResult<T> = Result<T, LuaError>;

pub struct LuaVM {
    options: Rc<StrlibOption>,
    globals: LuaTableRef,
}

impl LuaVM {
    /// Create a VM with the standard registry (the string library) loaded.
    pub fn new(options: StrlibOption) -> Self {
        let vm = Self {
            options: Rc::new(options),
            globals: Rc::new(RefCell::new(LuaTable::new())),
        };
        LibraryRegistry::with_standard_libs().load_all(&vm);
        vm
    }

    #[inline]
    pub fn options(&self) -> &StrlibOption {
        &self.options
    }

    pub fn globals(&self) -> LuaTableRef {
        self.globals.clone()
    }

    /// Resolve a dotted global path such as `string.find`.
    pub fn get_global(&self, path: &str) -> LuaValue {
        let mut current = LuaValue::Table(self.globals.clone());
        for part in path.split('.') {
            let next = match &current {
                LuaValue::Table(t) => t.borrow().get_str(part),
                _ => return LuaValue::Nil,
            };
            current = next;
        }
        current
    }

    pub fn call_function(&self, func: &LuaFunction, args: Vec<LuaValue>) -> LuaResult<MultiValue> {
        LuaState::new(self.options.clone(), Vec::new()).call(func, args)
    }

    /// Call the global function at `path` with `args`.
    pub fn call<I, T>(&self, path: &str, args: I) -> LuaResult<MultiValue>
    where
        I: IntoIterator<Item = T>,
        T: IntoLua,
    {
        let args: Vec<LuaValue> = args.into_iter().map(IntoLua::into_lua).collect();
        trace!(path, nargs = args.len(), "call");
        match self.get_global(path) {
            LuaValue::Function(f) => self.call_function(&f, args),
            other => {
                let name = path.rsplit('.').next().unwrap_or(path);
                Err(LuaError::RuntimeError(format!(
                    "attempt to call a {} value (field '{}')",
                    other.type_name(),
                    name
                )))
            }
        }
    }
}

impl Default for LuaVM {
    fn default() -> Self {
        Self::new(StrlibOption::default())
    }
}
