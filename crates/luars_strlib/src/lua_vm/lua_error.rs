use crate::lua_vm::LuaVersion;
use crate::stdlib::string::pack::PackError;
use crate::stdlib::string::pattern::PatternError;

/// Errors raised to the script. `Display` yields exactly the message a
/// script sees from `pcall`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LuaError {
    /// Plain `error(msg)` style failure
    #[error("{0}")]
    RuntimeError(String),

    /// luaL_argerror
    #[error("bad argument #{arg} to '{func}' ({msg})")]
    BadArgument {
        arg: usize,
        func: &'static str,
        msg: String,
    },

    /// A library function called under a language version that lacks it
    #[error(
        "attempt to call a nil value (function '{func}' requires {required} or later, \
         but script is running in {current} mode)"
    )]
    VersionUnavailable {
        func: &'static str,
        required: LuaVersion,
        current: LuaVersion,
    },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Pack(#[from] PackError),
}

impl LuaError {
    /// The message as a script sees it.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_bad_argument(&self, index: usize) -> bool {
        matches!(self, LuaError::BadArgument { arg, .. } if *arg == index)
    }
}
