// Library registration system
// Describes native libraries as named function tables and installs them
// into a VM's globals.

use tracing::trace;

use crate::lua_value::{CFunction, LuaFunction, LuaTable, LuaValue};
use crate::lua_vm::LuaVM;
use crate::stdlib;

/// Type for value initializers - functions that create values when the module loads
pub type ValueInitializer = fn(&LuaVM) -> LuaValue;

/// Entry in a library module - can be a function or a value
pub enum LibraryEntry {
    Function(CFunction),
    Value(ValueInitializer),
}

/// A library module containing multiple functions and values
pub struct LibraryModule {
    pub name: &'static str,
    pub entries: Vec<(&'static str, LibraryEntry)>,
}

impl LibraryModule {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn with_function(mut self, name: &'static str, func: CFunction) -> Self {
        self.entries.push((name, LibraryEntry::Function(func)));
        self
    }

    pub fn with_value(mut self, name: &'static str, value_init: ValueInitializer) -> Self {
        self.entries.push((name, LibraryEntry::Value(value_init)));
        self
    }

    pub fn function_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            LibraryEntry::Function(_) => Some(*name),
            LibraryEntry::Value(_) => None,
        })
    }
}

/// Builder for creating library modules from `name => function` pairs
#[macro_export]
macro_rules! lib_module {
    ($name:expr, {
        $($item_name:expr => $item:expr),* $(,)?
    }) => {{
        let mut module = $crate::lib_registry::LibraryModule::new($name);
        $(
            module.entries.push(($item_name, $crate::lib_registry::LibraryEntry::Function($item)));
        )*
        module
    }};
}

/// Registry of native libraries, loaded in insertion order
#[derive(Default)]
pub struct LibraryRegistry {
    modules: Vec<LibraryModule>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Registry holding every library this crate provides.
    pub fn with_standard_libs() -> Self {
        let mut registry = Self::new();
        registry.register(stdlib::string::create_string_lib());
        registry
    }

    pub fn register(&mut self, module: LibraryModule) {
        self.modules.push(module);
    }

    pub fn modules(&self) -> &[LibraryModule] {
        &self.modules
    }

    pub fn load_all(&self, vm: &LuaVM) {
        for module in &self.modules {
            self.load_module(vm, module);
        }
    }

    /// Build the module's table and store it as a global.
    pub fn load_module(&self, vm: &LuaVM, module: &LibraryModule) {
        let mut table = LuaTable::with_capacity(module.entries.len());
        for (name, entry) in &module.entries {
            let value = match entry {
                LibraryEntry::Function(func) => {
                    LuaValue::Function(LuaFunction::from_cfunction(*func))
                }
                LibraryEntry::Value(value_init) => value_init(vm),
            };
            table.set(LuaValue::from(*name), value);
        }
        trace!(library = module.name, entries = module.entries.len(), "library loaded");
        vm.globals()
            .borrow_mut()
            .set(LuaValue::from(module.name), LuaValue::table(table));
    }
}
