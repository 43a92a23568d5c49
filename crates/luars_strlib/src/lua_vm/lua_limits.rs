//! String library limits and codec constants.
//!
//! Mirrors the values of Lua 5.4's `lstrlib.c` / `luaconf.h` so that
//! patterns and binary layouts behave identically across platforms.

// ===== Patterns =====

/// Maximum number of captures in a single pattern.
/// Matches Lua's LUA_MAXCAPTURES.
pub const LUA_MAXCAPTURES: usize = 32;

/// Recursion budget of the pattern matcher.
/// Matches Lua's MAXCCALLS in lstrlib.c.
pub const MAXCCALLS_PATTERN: usize = 200;

/// Characters that make a pattern non-literal. A pattern free of all of
/// these can be searched with a plain substring scan.
pub const PATTERN_SPECIALS: &[u8] = b"^$*+?.([%-";

/// Escape character of the pattern language.
pub const L_ESC: u8 = b'%';

// ===== Pack / unpack =====

/// Maximum size of an integral directive (`i16`, `s16`, ...).
pub const MAXINTSIZE: usize = 16;

/// Maximum alignment accepted by `!n`.
pub const MAXALIGN: usize = 16;

/// Number of bytes in a lua_Integer.
pub const SZINT: usize = 8;

/// Fixed cross-platform sizes used by the codec.
pub const SIZE_SHORT: usize = 2;
pub const SIZE_INT: usize = 4;
pub const SIZE_LONG: usize = 8;
pub const SIZE_T: usize = 8;
pub const SIZE_FLOAT: usize = 4;
pub const SIZE_DOUBLE: usize = 8;
