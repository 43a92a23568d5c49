use std::fmt;

/// Language version the string library emulates.
///
/// Ordering follows release order, so gates are written as
/// `version >= LuaVersion::Lua53`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LuaVersion {
    Lua51,
    Lua52,
    Lua53,
    #[default]
    Lua54,
    Lua55,
}

impl LuaVersion {
    pub fn display_name(self) -> &'static str {
        match self {
            LuaVersion::Lua51 => "Lua 5.1",
            LuaVersion::Lua52 => "Lua 5.2",
            LuaVersion::Lua53 => "Lua 5.3",
            LuaVersion::Lua54 => "Lua 5.4",
            LuaVersion::Lua55 => "Lua 5.5",
        }
    }

    /// Lua 5.3 introduced the integer subtype; float formatting of
    /// integral values gains a trailing `.0` from there on.
    #[inline]
    pub fn has_integer_subtype(self) -> bool {
        self >= LuaVersion::Lua53
    }
}

impl fmt::Display for LuaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrlibOption {
    pub version: LuaVersion,
    /// Reject `%x` escapes other than `%0`-`%9` and `%%` in gsub
    /// replacement strings. `None` follows the version (strict from 5.2).
    pub strict_replacement: Option<bool>,
}

impl Default for StrlibOption {
    fn default() -> Self {
        Self {
            version: LuaVersion::default(),
            strict_replacement: None,
        }
    }
}

impl StrlibOption {
    pub fn with_version(version: LuaVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    #[inline]
    pub fn strict_replacement(&self) -> bool {
        self.strict_replacement
            .unwrap_or(self.version >= LuaVersion::Lua52)
    }

    /// gmatch's third argument appeared in Lua 5.4.
    #[inline]
    pub fn gmatch_honours_init(&self) -> bool {
        self.version >= LuaVersion::Lua54
    }

    /// Load options from a JSON document such as
    /// `{"version": "Lua53", "strict_replacement": false}`.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
