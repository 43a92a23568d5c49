// String library
// Implements: find, gmatch, gsub, match, pack, packsize, unpack
pub mod pack;
pub mod pattern;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::lib_registry::LibraryModule;
use crate::lua_value::{LuaFunction, LuaString, LuaTableRef, LuaValue};
use crate::lua_vm::{LuaError, LuaResult, LuaState};
use pattern::{CaptureResults, CaptureValue, GMatchState, MatchState, PatternError};

pub fn create_string_lib() -> LibraryModule {
    crate::lib_module!("string", {
        "find" => string_find,
        "gmatch" => string_gmatch,
        "gsub" => string_gsub,
        "match" => string_match,
        "pack" => pack::string_pack,
        "packsize" => pack::string_packsize,
        "unpack" => pack::string_unpack,
    })
}

/// Translate a 1-based, possibly negative, init argument into a 0-based
/// offset. Offsets before the start clamp to 0; offsets past the end are
/// returned as is and clamped by the caller.
fn start_offset(init: i64, len: usize) -> usize {
    let len_i = len as i64;
    let pos = if init > 0 {
        init
    } else if init == 0 || init < -len_i {
        1
    } else {
        len_i + init + 1
    };
    usize::try_from(pos - 1).unwrap_or(usize::MAX)
}

fn capture_to_value(src: &[u8], capture: &CaptureValue) -> LuaValue {
    match *capture {
        CaptureValue::Substring(start, end) => LuaValue::string(&src[start..end]),
        CaptureValue::Position(pos) => LuaValue::integer(pos as i64),
    }
}

fn push_captures(l: &mut LuaState, src: &[u8], captures: &CaptureResults) -> LuaResult<usize> {
    for capture in captures {
        l.push_value(capture_to_value(src, capture))?;
    }
    Ok(captures.len())
}

/// Shared body of string.find and string.match
fn str_find_aux(l: &mut LuaState, find: bool) -> LuaResult<usize> {
    let func = if find { "find" } else { "match" };
    let s = l.check_string(1, func)?;
    let p = l.check_string(2, func)?;
    let init = start_offset(l.opt_integer(3, func, 1)?, s.len()).min(s.len());
    let plain = find && l.as_type::<bool>(4, func, true)?.unwrap_or(false);

    if find && (plain || pattern::is_plain_pattern(&p)) {
        if let Some(start) = pattern::find_plain(&s, &p, init) {
            l.push_value(LuaValue::integer(start as i64 + 1))?;
            l.push_value(LuaValue::integer((start + p.len()) as i64))?;
            return Ok(2);
        }
    } else if let Some(m) = pattern::find(&s, &p, init, !find)? {
        if find {
            l.push_value(LuaValue::integer(m.start as i64 + 1))?;
            l.push_value(LuaValue::integer(m.end as i64))?;
            return Ok(2 + push_captures(l, &s, &m.captures)?);
        }
        return push_captures(l, &s, &m.captures);
    }
    l.push_value(LuaValue::nil())?;
    Ok(1)
}

/// string.find(s, pattern [, init [, plain]])
fn string_find(l: &mut LuaState) -> LuaResult<usize> {
    str_find_aux(l, true)
}

/// string.match(s, pattern [, init])
fn string_match(l: &mut LuaState) -> LuaResult<usize> {
    str_find_aux(l, false)
}

/// string.gmatch(s, pattern [, init]) - returns an iterator function
fn string_gmatch(l: &mut LuaState) -> LuaResult<usize> {
    let s = l.check_string(1, "gmatch")?;
    let p = l.check_string(2, "gmatch")?;
    // The init argument exists from Lua 5.4 on; older versions ignore it.
    let init = if l.options().gmatch_honours_init() {
        start_offset(l.opt_integer(3, "gmatch", 1)?, s.len())
    } else {
        0
    };
    let state = Rc::new(RefCell::new(GMatchState::new(s, p, init)));
    let iterator = LuaFunction::new(move |l: &mut LuaState| gmatch_iterator(l, &state));
    l.push_value(LuaValue::Function(iterator))?;
    Ok(1)
}

/// Each call yields the captures of the next match, or nothing when the
/// subject is exhausted.
fn gmatch_iterator(l: &mut LuaState, state: &RefCell<GMatchState>) -> LuaResult<usize> {
    let mut state = state.borrow_mut();
    match state.next_match()? {
        Some(m) => {
            let src = state.src().clone();
            push_captures(l, &src, &m.captures)
        }
        None => Ok(0),
    }
}

/// How gsub turns a match into replacement text
enum Replacement {
    Template(LuaString),
    Function(LuaFunction),
    Table(LuaTableRef),
}

impl Replacement {
    fn from_arg(l: &LuaState) -> LuaResult<Self> {
        match l.get_arg(3) {
            Some(LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Float(_)) => {
                Ok(Replacement::Template(l.check_string(3, "gsub")?))
            }
            Some(LuaValue::Function(f)) => Ok(Replacement::Function(f.clone())),
            Some(LuaValue::Table(t)) => Ok(Replacement::Table(t.clone())),
            _ => Err(l.type_error(3, "gsub", "string/function/table")),
        }
    }

    /// add_value: append the replacement for the match `s..e`.
    fn apply(
        &self,
        l: &LuaState,
        out: &mut Vec<u8>,
        ms: &MatchState<'_>,
        s: usize,
        e: usize,
    ) -> LuaResult<()> {
        let src = ms.src();
        let value = match self {
            Replacement::Template(template) => {
                let strict = l.options().strict_replacement();
                return Ok(pattern::expand_replacement(out, template, ms, s, e, strict)?);
            }
            Replacement::Function(f) => {
                let captures = ms.get_captures(s, e, true)?;
                let args = captures.iter().map(|c| capture_to_value(src, c)).collect();
                l.call(f, args)?.into_iter().next().unwrap_or_default()
            }
            Replacement::Table(t) => {
                let key = capture_to_value(src, &ms.get_capture(0, s, e)?);
                t.borrow().get(&key)
            }
        };
        if !value.is_truthy() {
            // nil or false keeps the original text
            out.extend_from_slice(&src[s..e]);
            return Ok(());
        }
        match value.to_lua_bytes(l.version()) {
            Some(bytes) => {
                out.extend_from_slice(&bytes);
                Ok(())
            }
            None => Err(PatternError::InvalidReplacementValue(value.type_name()).into()),
        }
    }
}

/// string.gsub(s, pattern, repl [, n]) - Global substitution
fn string_gsub(l: &mut LuaState) -> LuaResult<usize> {
    let src = l.check_string(1, "gsub")?;
    let p = l.check_string(2, "gsub")?;
    let repl = Replacement::from_arg(l)?;
    let max_n = l.opt_integer(4, "gsub", src.len() as i64 + 1)?;
    let max_n = usize::try_from(max_n).unwrap_or(0);

    let state: &LuaState = l;
    let (result, n) = pattern::gsub::<LuaError, _>(&src, &p, max_n, |out, ms, s, e| {
        repl.apply(state, out, ms, s, e)
    })?;
    trace!(subject_len = src.len(), replacements = n, "string.gsub");
    l.push_value(LuaValue::string_owned(result))?;
    l.push_value(LuaValue::integer(n as i64))?;
    Ok(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_offset() {
        assert_eq!(start_offset(1, 5), 0);
        assert_eq!(start_offset(0, 5), 0);
        assert_eq!(start_offset(-2, 5), 3);
        assert_eq!(start_offset(-10, 5), 0);
        assert_eq!(start_offset(6, 5), 5);
        assert_eq!(start_offset(7, 5), 6);
    }
}
