// Lua string library core
// Pattern matching (find, match, gmatch, gsub) and binary packing
// (pack, unpack, packsize) over byte strings, plus the small host seam
// needed to call them.

#[cfg(test)]
mod test;

pub mod lib_registry;
pub mod lua_value;
pub mod lua_vm;
pub mod stdlib;

pub use lib_registry::LibraryRegistry;
pub use lua_value::{LuaFunction, LuaString, LuaTable, LuaValue, MultiValue};
pub use lua_vm::{LuaError, LuaResult, LuaState, LuaVM, LuaVersion, StrlibOption};
pub use stdlib::string::create_string_lib;
