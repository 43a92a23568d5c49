// Backtracking matcher for Lua patterns, byte oriented.
//
// 1. No parse phase: the pattern is interpreted while matching
// 2. Fixed 32-slot capture table, reused through the per-thread pool
// 3. Single-item advances loop in place; only branching points recurse
// 4. Recursion budget of MAXCCALLS_PATTERN bounds native stack use

use tracing::debug;

use super::PatternError;
use super::class::{class_end, match_bracket_class, single_match};
use crate::lua_vm::lua_limits::{L_ESC, LUA_MAXCAPTURES, MAXCCALLS_PATTERN};

/// Length state of a capture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureLen {
    /// Opened by `(`, not closed yet (CAP_UNFINISHED)
    Unfinished,
    /// `()`: records a position only (CAP_POSITION)
    Position,
    Closed(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct Capture {
    pub init: usize,
    pub len: CaptureLen,
}

/// Reusable part of the match state: the capture slots, the current
/// capture level and the recursion budget. Holds no borrowed data, so it
/// can be pooled across calls.
#[derive(Debug, Clone)]
pub struct CaptureTable {
    captures: [Capture; LUA_MAXCAPTURES],
    level: usize,
    matchdepth: usize,
}

impl CaptureTable {
    pub fn new() -> Self {
        Self {
            captures: [Capture {
                init: 0,
                len: CaptureLen::Unfinished,
            }; LUA_MAXCAPTURES],
            level: 0,
            matchdepth: MAXCCALLS_PATTERN,
        }
    }

    /// Prepare for a new match attempt (reprepstate). Slots above `level`
    /// are dead and are overwritten before they are read again.
    #[inline]
    pub fn reset(&mut self) {
        self.level = 0;
        self.matchdepth = MAXCCALLS_PATTERN;
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn matchdepth(&self) -> usize {
        self.matchdepth
    }
}

impl Default for CaptureTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A captured value, in subject byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureValue {
    Substring(usize, usize),
    /// 1-based position from `()`
    Position(usize),
}

/// Fixed-size capture results, avoids a Vec per match.
#[derive(Debug, Clone, Copy)]
pub struct CaptureResults {
    data: [CaptureValue; LUA_MAXCAPTURES],
    count: usize,
}

impl CaptureResults {
    pub fn new() -> Self {
        Self {
            data: [CaptureValue::Substring(0, 0); LUA_MAXCAPTURES],
            count: 0,
        }
    }

    #[inline]
    fn push(&mut self, value: CaptureValue) {
        self.data[self.count] = value;
        self.count += 1;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&CaptureValue> {
        self.data[..self.count].get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaptureValue> {
        self.data[..self.count].iter()
    }
}

impl Default for CaptureResults {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a CaptureResults {
    type Item = &'a CaptureValue;
    type IntoIter = std::slice::Iter<'a, CaptureValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

type MatchResult = Result<Option<usize>, PatternError>;

/// One match invocation: subject and pattern borrowed for the call, capture
/// table borrowed from the pool.
pub struct MatchState<'a> {
    src: &'a [u8],
    pat: &'a [u8],
    table: &'a mut CaptureTable,
}

impl<'a> MatchState<'a> {
    pub fn new(src: &'a [u8], pat: &'a [u8], table: &'a mut CaptureTable) -> Self {
        table.reset();
        Self { src, pat, table }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.table.reset();
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.table.level
    }

    #[inline]
    pub fn src(&self) -> &'a [u8] {
        self.src
    }

    /// Try to match `pat[p..]` at `src[s..]`. Returns the end of the match.
    pub fn do_match(&mut self, s: usize, p: usize) -> MatchResult {
        if self.table.matchdepth == 0 {
            debug!(pattern_len = self.pat.len(), "pattern recursion budget exhausted");
            return Err(PatternError::TooComplex);
        }
        self.table.matchdepth -= 1;
        let result = self.match_inner(s, p);
        self.table.matchdepth += 1;
        result
    }

    fn match_inner(&mut self, mut s: usize, mut p: usize) -> MatchResult {
        let (src, pat) = (self.src, self.pat);
        loop {
            if p == pat.len() {
                return Ok(Some(s));
            }
            match pat[p] {
                b'(' => {
                    return if pat.get(p + 1) == Some(&b')') {
                        self.start_capture(s, p + 2, CaptureLen::Position)
                    } else {
                        self.start_capture(s, p + 1, CaptureLen::Unfinished)
                    };
                }
                b')' => return self.end_capture(s, p + 1),
                b'$' if p + 1 == pat.len() => {
                    return Ok((s == src.len()).then_some(s));
                }
                L_ESC => match pat.get(p + 1) {
                    Some(b'b') => match self.match_balance(s, p + 2)? {
                        Some(end) => {
                            s = end;
                            p += 4;
                            continue;
                        }
                        None => return Ok(None),
                    },
                    Some(b'f') => {
                        p += 2;
                        if pat.get(p) != Some(&b'[') {
                            return Err(PatternError::MissingFrontierSet);
                        }
                        let ep = class_end(pat, p)?;
                        let prev = if s == 0 { 0 } else { src[s - 1] };
                        let cur = src.get(s).copied().unwrap_or(0);
                        if !match_bracket_class(prev, pat, p, ep - 1)
                            && match_bracket_class(cur, pat, p, ep - 1)
                        {
                            p = ep;
                            continue;
                        }
                        return Ok(None);
                    }
                    Some(&d) if d.is_ascii_digit() => match self.match_capture(s, d)? {
                        Some(end) => {
                            s = end;
                            p += 2;
                            continue;
                        }
                        None => return Ok(None),
                    },
                    _ => {}
                },
                _ => {}
            }

            // Single-char item, optionally followed by a quantifier
            let ep = class_end(pat, p)?;
            let matched = s < src.len() && single_match(src[s], pat, p, ep);
            match pat.get(ep) {
                Some(b'?') => {
                    if matched && let Some(end) = self.do_match(s + 1, ep + 1)? {
                        return Ok(Some(end));
                    }
                    p = ep + 1;
                }
                Some(b'+') => {
                    return if matched { self.max_expand(s + 1, p, ep) } else { Ok(None) };
                }
                Some(b'*') => return self.max_expand(s, p, ep),
                Some(b'-') => return self.min_expand(s, p, ep),
                _ => {
                    if !matched {
                        return Ok(None);
                    }
                    s += 1;
                    p = ep;
                }
            }
        }
    }

    /// Greedy: take as many as possible, then back off one at a time.
    fn max_expand(&mut self, s: usize, p: usize, ep: usize) -> MatchResult {
        let src = self.src;
        let mut i = 0;
        while s + i < src.len() && single_match(src[s + i], self.pat, p, ep) {
            i += 1;
        }
        loop {
            if let Some(end) = self.do_match(s + i, ep + 1)? {
                return Ok(Some(end));
            }
            if i == 0 {
                return Ok(None);
            }
            i -= 1;
        }
    }

    /// Lazy: try the rest first, extend by one item on failure.
    fn min_expand(&mut self, mut s: usize, p: usize, ep: usize) -> MatchResult {
        loop {
            if let Some(end) = self.do_match(s, ep + 1)? {
                return Ok(Some(end));
            }
            if s < self.src.len() && single_match(self.src[s], self.pat, p, ep) {
                s += 1;
            } else {
                return Ok(None);
            }
        }
    }

    fn start_capture(&mut self, s: usize, p: usize, what: CaptureLen) -> MatchResult {
        let level = self.table.level;
        if level >= LUA_MAXCAPTURES {
            return Err(PatternError::TooManyCaptures);
        }
        self.table.captures[level] = Capture { init: s, len: what };
        self.table.level = level + 1;
        let result = self.do_match(s, p)?;
        if result.is_none() {
            self.table.level -= 1;
        }
        Ok(result)
    }

    fn end_capture(&mut self, s: usize, p: usize) -> MatchResult {
        let l = self.capture_to_close()?;
        let init = self.table.captures[l].init;
        self.table.captures[l].len = CaptureLen::Closed(s - init);
        let result = self.do_match(s, p)?;
        if result.is_none() {
            self.table.captures[l].len = CaptureLen::Unfinished;
        }
        Ok(result)
    }

    fn capture_to_close(&self) -> Result<usize, PatternError> {
        (0..self.table.level)
            .rev()
            .find(|&l| self.table.captures[l].len == CaptureLen::Unfinished)
            .ok_or(PatternError::InvalidPatternCapture)
    }

    /// `%bxy` with `p` just past `%b`.
    fn match_balance(&self, s: usize, p: usize) -> MatchResult {
        if p + 1 >= self.pat.len() {
            return Err(PatternError::MissingBalanceArgs);
        }
        let (open, close) = (self.pat[p], self.pat[p + 1]);
        if self.src.get(s) != Some(&open) {
            return Ok(None);
        }
        let mut cont = 1;
        for (i, &c) in self.src.iter().enumerate().skip(s + 1) {
            // `close` is tested first so `%b''` works.
            if c == close {
                cont -= 1;
                if cont == 0 {
                    return Ok(Some(i + 1));
                }
            } else if c == open {
                cont += 1;
            }
        }
        Ok(None)
    }

    /// Back-reference `%1`-`%9`.
    fn match_capture(&self, s: usize, digit: u8) -> MatchResult {
        let l = self.check_capture(digit)?;
        let cap = self.table.captures[l];
        let CaptureLen::Closed(len) = cap.len else {
            // A position capture has no text and never matches.
            return Ok(None);
        };
        let captured = &self.src[cap.init..cap.init + len];
        Ok(self.src[s..].starts_with(captured).then_some(s + len))
    }

    fn check_capture(&self, digit: u8) -> Result<usize, PatternError> {
        let index = (digit - b'0') as usize;
        match index.checked_sub(1) {
            Some(l)
                if l < self.table.level
                    && self.table.captures[l].len != CaptureLen::Unfinished =>
            {
                Ok(l)
            }
            _ => Err(PatternError::InvalidCaptureIndex(index)),
        }
    }

    // ======================== Capture extraction ========================

    /// Capture `i` of a match spanning `s..e` (get_onecapture). With no
    /// explicit captures, index 0 stands for the whole match.
    pub fn get_capture(&self, i: usize, s: usize, e: usize) -> Result<CaptureValue, PatternError> {
        if i >= self.table.level {
            return if i == 0 {
                Ok(CaptureValue::Substring(s, e))
            } else {
                Err(PatternError::InvalidCaptureIndex(i + 1))
            };
        }
        let cap = self.table.captures[i];
        match cap.len {
            CaptureLen::Unfinished => Err(PatternError::UnfinishedCapture),
            CaptureLen::Position => Ok(CaptureValue::Position(cap.init + 1)),
            CaptureLen::Closed(len) => Ok(CaptureValue::Substring(cap.init, cap.init + len)),
        }
    }

    /// All captures of a match spanning `s..e`. `whole_if_none` yields the
    /// whole match when the pattern has no captures (match, gmatch, gsub);
    /// find passes false.
    pub fn get_captures(
        &self,
        s: usize,
        e: usize,
        whole_if_none: bool,
    ) -> Result<CaptureResults, PatternError> {
        let nlevels = if self.table.level == 0 && whole_if_none {
            1
        } else {
            self.table.level
        };
        let mut results = CaptureResults::new();
        for i in 0..nlevels {
            results.push(self.get_capture(i, s, e)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str, pat: &str) -> Result<Option<(usize, Vec<CaptureValue>)>, PatternError> {
        let mut table = CaptureTable::new();
        let mut ms = MatchState::new(src.as_bytes(), pat.as_bytes(), &mut table);
        match ms.do_match(0, 0)? {
            Some(e) => {
                let caps = ms.get_captures(0, e, false)?;
                Ok(Some((e, caps.iter().copied().collect())))
            }
            None => Ok(None),
        }
    }

    #[test]
    fn test_quantifiers() {
        assert_eq!(run("aaab", "a*").unwrap().unwrap().0, 3);
        assert_eq!(run("aaab", "a-b").unwrap().unwrap().0, 4);
        assert_eq!(run("aaab", "a-").unwrap().unwrap().0, 0);
        assert_eq!(run("b", "a?b").unwrap().unwrap().0, 1);
        assert!(run("b", "a+").unwrap().is_none());
        assert_eq!(run("aaa", "a+a").unwrap().unwrap().0, 3);
    }

    #[test]
    fn test_captures_and_backrefs() {
        let (e, caps) = run("hello=hello", "(%a+)=%1").unwrap().unwrap();
        assert_eq!(e, 11);
        assert_eq!(caps, vec![CaptureValue::Substring(0, 5)]);
        let (_, caps) = run("ab", "()a()").unwrap().unwrap();
        assert_eq!(caps, vec![CaptureValue::Position(1), CaptureValue::Position(2)]);
        assert!(run("aa", "()a%1").unwrap().is_none());
    }

    #[test]
    fn test_balance_and_frontier() {
        assert_eq!(run("(a(b)c)d", "%b()").unwrap().unwrap().0, 7);
        assert!(run("(a(b c", "%b()").unwrap().is_none());
        assert_eq!(run("'x'", "%b''").unwrap().unwrap().0, 3);
        assert_eq!(run("THE", "%f[%a]%u+%f[%A]").unwrap().unwrap().0, 3);
    }

    #[test]
    fn test_anchor_end() {
        assert_eq!(run("ab", "ab$").unwrap().unwrap().0, 2);
        assert!(run("abc", "ab$").unwrap().is_none());
        assert_eq!(run("a$b", "a$b").unwrap().unwrap().0, 3);
    }

    #[test]
    fn test_errors() {
        assert_eq!(run("a", "%1"), Err(PatternError::InvalidCaptureIndex(1)));
        assert_eq!(run("a", "(a%1)"), Err(PatternError::InvalidCaptureIndex(1)));
        assert_eq!(run("a", "a)"), Err(PatternError::InvalidPatternCapture));
        assert_eq!(run("a", "(a"), Err(PatternError::UnfinishedCapture));
        assert_eq!(run("a", "%b"), Err(PatternError::MissingBalanceArgs));
        assert_eq!(run("a", "%fa"), Err(PatternError::MissingFrontierSet));
        assert_eq!(run("a", "a%"), Err(PatternError::EndsWithEscape));
        let many = "()".repeat(LUA_MAXCAPTURES + 1);
        assert_eq!(run("", &many), Err(PatternError::TooManyCaptures));
    }

    #[test]
    fn test_recursion_budget() {
        let src = "a".repeat(MAXCCALLS_PATTERN * 2);
        let pat = "a?".repeat(MAXCCALLS_PATTERN + 1);
        assert_eq!(run(&src, &pat), Err(PatternError::TooComplex));

        let mut table = CaptureTable::new();
        let mut ms = MatchState::new(b"aaa", b"a?a?a?", &mut table);
        assert_eq!(ms.do_match(0, 0), Ok(Some(3)));
        drop(ms);
        assert_eq!(table.matchdepth(), MAXCCALLS_PATTERN);
    }
}
