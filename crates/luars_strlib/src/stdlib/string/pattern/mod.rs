// Lua pattern matching: byte-oriented, no AST
//
// Operates on raw bytes: every byte is a character and strings may hold
// NULs. The pattern is interpreted directly while matching; see engine.rs
// for the matcher and class.rs for character classes.

mod class;
mod engine;
mod pool;

use crate::lua_value::LuaString;
use crate::lua_vm::lua_limits::{L_ESC, PATTERN_SPECIALS};

pub use class::match_class;
pub use engine::{CaptureResults, CaptureTable, CaptureValue, MatchState};
pub use pool::with_capture_table;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("malformed pattern (ends with '%')")]
    EndsWithEscape,
    #[error("malformed pattern (missing ']')")]
    MissingBracket,
    #[error("malformed pattern (missing arguments to '%b')")]
    MissingBalanceArgs,
    #[error("missing '[' after '%f' in pattern")]
    MissingFrontierSet,
    #[error("invalid capture index %{0}")]
    InvalidCaptureIndex(usize),
    #[error("invalid pattern capture")]
    InvalidPatternCapture,
    #[error("too many captures")]
    TooManyCaptures,
    #[error("unfinished capture")]
    UnfinishedCapture,
    #[error("pattern too complex")]
    TooComplex,
    #[error("invalid use of '%' in replacement string")]
    InvalidReplacementEscape,
    #[error("invalid capture index %{0} in replacement string")]
    InvalidReplacementIndex(usize),
    #[error("invalid replacement value (a {0})")]
    InvalidReplacementValue(&'static str),
}

/// A successful match: `start..end` in subject bytes plus its captures.
#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub start: usize,
    pub end: usize,
    pub captures: CaptureResults,
}

/// True when `pat` has no magic characters and can be searched literally.
#[inline]
pub fn is_plain_pattern(pat: &[u8]) -> bool {
    !pat.iter().any(|c| PATTERN_SPECIALS.contains(c))
}

/// Literal substring search from `init` (lmemfind). Returns the 0-based
/// start of the first occurrence.
pub fn find_plain(src: &[u8], pat: &[u8], init: usize) -> Option<usize> {
    let hay = src.get(init..)?;
    if pat.is_empty() {
        return Some(init);
    }
    if pat.len() > hay.len() {
        return None;
    }
    hay.windows(pat.len())
        .position(|window| window == pat)
        .map(|pos| init + pos)
}

/// Search for `pat` in `src` starting at byte `init` (`init <= src.len()`).
///
/// A leading `^` anchors the search at `init`. `whole_if_none` makes a
/// pattern without captures report the whole match as its single capture
/// (string.match); string.find leaves the captures empty.
pub fn find(
    src: &[u8],
    pat: &[u8],
    init: usize,
    whole_if_none: bool,
) -> Result<Option<MatchInfo>, PatternError> {
    let (anchor, p) = match pat.first() {
        Some(b'^') => (true, 1),
        _ => (false, 0),
    };
    with_capture_table(|table| {
        let mut ms = MatchState::new(src, pat, table);
        let mut s = init;
        loop {
            ms.reset();
            if let Some(end) = ms.do_match(s, p)? {
                let captures = ms.get_captures(s, end, whole_if_none)?;
                return Ok(Some(MatchInfo {
                    start: s,
                    end,
                    captures,
                }));
            }
            s += 1;
            if anchor || s > src.len() {
                return Ok(None);
            }
        }
    })
}

/// Iteration state behind a gmatch iterator. `^` is not an anchor here:
/// the pattern is used exactly as given.
#[derive(Debug, Clone)]
pub struct GMatchState {
    src: LuaString,
    pat: LuaString,
    pos: usize,
}

impl GMatchState {
    pub fn new(src: LuaString, pat: LuaString, init: usize) -> Self {
        let pos = init.min(src.len());
        Self { src, pat, pos }
    }

    pub fn src(&self) -> &LuaString {
        &self.src
    }

    /// Next match at or after the stored position. An empty match moves
    /// the position one byte further so iteration always progresses.
    pub fn next_match(&mut self) -> Result<Option<MatchInfo>, PatternError> {
        let (src, pat) = (&*self.src, &*self.pat);
        if self.pos > src.len() {
            return Ok(None);
        }
        let found = with_capture_table(|table| {
            let mut ms = MatchState::new(src, pat, table);
            for s in self.pos..=src.len() {
                ms.reset();
                if let Some(end) = ms.do_match(s, 0)? {
                    let captures = ms.get_captures(s, end, true)?;
                    return Ok(Some(MatchInfo {
                        start: s,
                        end,
                        captures,
                    }));
                }
            }
            Ok(None)
        })?;
        match &found {
            Some(m) => self.pos = if m.end == m.start { m.end + 1 } else { m.end },
            None => self.pos = src.len() + 1,
        }
        Ok(found)
    }
}

/// Every successive match of `pat` in `src`, as gmatch would yield them.
pub fn find_all(src: &[u8], pat: &[u8]) -> Result<Vec<MatchInfo>, PatternError> {
    let mut state = GMatchState::new(LuaString::from(src), LuaString::from(pat), 0);
    let mut matches = Vec::new();
    while let Some(m) = state.next_match()? {
        matches.push(m);
    }
    Ok(matches)
}

/// Core of gsub. `add_value` appends the replacement for the match
/// `s..e` to the output; unmatched bytes are copied through. Returns the
/// new string and the number of matches.
pub fn gsub<E, F>(
    src: &[u8],
    pat: &[u8],
    max_n: usize,
    mut add_value: F,
) -> Result<(Vec<u8>, usize), E>
where
    E: From<PatternError>,
    F: FnMut(&mut Vec<u8>, &MatchState<'_>, usize, usize) -> Result<(), E>,
{
    let (anchor, p) = match pat.first() {
        Some(b'^') => (true, 1),
        _ => (false, 0),
    };
    with_capture_table(|table| {
        let mut ms = MatchState::new(src, pat, table);
        let mut out = Vec::with_capacity(src.len());
        let mut s = 0;
        let mut n = 0;
        while n < max_n {
            ms.reset();
            let end = ms.do_match(s, p)?;
            if let Some(e) = end {
                n += 1;
                add_value(&mut out, &ms, s, e)?;
            }
            match end {
                Some(e) if e > s => s = e,
                _ if s < src.len() => {
                    out.push(src[s]);
                    s += 1;
                }
                _ => break,
            }
            if anchor {
                break;
            }
        }
        out.extend_from_slice(&src[s..]);
        Ok((out, n))
    })
}

/// Append `template` with `%0`-`%9` and `%%` expanded (add_s). Other
/// escapes are an error when `strict`, else the escaped byte is copied.
pub fn expand_replacement(
    out: &mut Vec<u8>,
    template: &[u8],
    ms: &MatchState<'_>,
    s: usize,
    e: usize,
    strict: bool,
) -> Result<(), PatternError> {
    let src = ms.src();
    let mut bytes = template.iter().copied();
    while let Some(c) = bytes.next() {
        if c != L_ESC {
            out.push(c);
            continue;
        }
        match bytes.next() {
            Some(L_ESC) => out.push(L_ESC),
            Some(b'0') => out.extend_from_slice(&src[s..e]),
            Some(d) if d.is_ascii_digit() => {
                let index = (d - b'1') as usize;
                let value = ms.get_capture(index, s, e).map_err(|err| match err {
                    PatternError::InvalidCaptureIndex(i) => {
                        PatternError::InvalidReplacementIndex(i)
                    }
                    other => other,
                })?;
                match value {
                    CaptureValue::Substring(cs, ce) => out.extend_from_slice(&src[cs..ce]),
                    CaptureValue::Position(pos) => {
                        out.extend_from_slice(itoa::Buffer::new().format(pos).as_bytes())
                    }
                }
            }
            _ if strict => return Err(PatternError::InvalidReplacementEscape),
            Some(other) => out.push(other),
            // A trailing escape copies the terminating NUL.
            None => out.push(0),
        }
    }
    Ok(())
}
