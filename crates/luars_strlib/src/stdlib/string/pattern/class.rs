// Character class matching for Lua patterns
// Handles %a, %c, %d, %g, %l, %p, %s, %u, %w, %x, %z and their uppercase
// complements, `.`, literals, and [set] brackets. Classes use the C locale:
// bytes >= 0x80 belong to no class.

use super::PatternError;
use crate::lua_vm::lua_limits::L_ESC;

/// C `isspace`: space, \t, \n, \v, \f, \r. Unlike `u8::is_ascii_whitespace`
/// this includes the vertical tab.
#[inline(always)]
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Test byte `c` against class letter `cl`. An uppercase class letter
/// complements the class; any other byte matches only itself.
#[inline]
pub fn match_class(c: u8, cl: u8) -> bool {
    let res = match cl.to_ascii_lowercase() {
        b'a' => c.is_ascii_alphabetic(),
        b'c' => c.is_ascii_control(),
        b'd' => c.is_ascii_digit(),
        b'g' => c.is_ascii_graphic(),
        b'l' => c.is_ascii_lowercase(),
        b'p' => c.is_ascii_punctuation(),
        b's' => is_space(c),
        b'u' => c.is_ascii_uppercase(),
        b'w' => c.is_ascii_alphanumeric(),
        b'x' => c.is_ascii_hexdigit(),
        b'z' => c == 0,
        _ => return cl == c,
    };
    if cl.is_ascii_uppercase() { !res } else { res }
}

/// Index just past the single-character item starting at `pat[p]`
/// (a literal, `.`, `%x` or a whole `[set]`). Quantifiers are not consumed.
pub fn class_end(pat: &[u8], mut p: usize) -> Result<usize, PatternError> {
    let c = pat[p];
    p += 1;
    if c == L_ESC {
        if p >= pat.len() {
            return Err(PatternError::EndsWithEscape);
        }
        return Ok(p + 1);
    }
    if c == b'[' {
        if pat.get(p) == Some(&b'^') {
            p += 1;
        }
        // The first byte of the set is always a member, so `[]]` and
        // `[^]]` contain a literal ']'.
        loop {
            if p >= pat.len() {
                return Err(PatternError::MissingBracket);
            }
            let cc = pat[p];
            p += 1;
            if cc == L_ESC && p < pat.len() {
                p += 1;
            }
            if pat.get(p) == Some(&b']') {
                return Ok(p + 1);
            }
        }
    }
    Ok(p)
}

/// Match `c` against the set spanning `pat[p..=ec]`, where `pat[p]` is `[`
/// and `pat[ec]` the closing `]`.
pub fn match_bracket_class(c: u8, pat: &[u8], mut p: usize, ec: usize) -> bool {
    let mut sig = true;
    if pat[p + 1] == b'^' {
        sig = false;
        p += 1;
    }
    p += 1;
    while p < ec {
        if pat[p] == L_ESC {
            p += 1;
            if match_class(c, pat[p]) {
                return sig;
            }
        } else if pat[p + 1] == b'-' && p + 2 < ec {
            if pat[p] <= c && c <= pat[p + 2] {
                return sig;
            }
            p += 2;
        } else if pat[p] == c {
            return sig;
        }
        p += 1;
    }
    !sig
}

/// Does subject byte `c` match the item `pat[p..ep]`?
#[inline]
pub fn single_match(c: u8, pat: &[u8], p: usize, ep: usize) -> bool {
    match pat[p] {
        b'.' => true,
        L_ESC => match_class(c, pat[p + 1]),
        b'[' => match_bracket_class(c, pat, p, ep - 1),
        lit => lit == c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_matches(c: u8, set: &[u8]) -> bool {
        let ep = class_end(set, 0).unwrap();
        single_match(c, set, 0, ep)
    }

    #[test]
    fn test_match_class() {
        assert!(match_class(b'a', b'a'));
        assert!(!match_class(b'1', b'a'));
        assert!(match_class(b'1', b'A'));
        assert!(match_class(0x0b, b's'));
        assert!(!match_class(0x0b, b'S'));
        assert!(match_class(b'!', b'p'));
        assert!(!match_class(b' ', b'g'));
        assert!(match_class(0x7f, b'c'));
        assert!(match_class(0, b'z'));
        assert!(match_class(b'.', b'.'));
        assert!(!match_class(0xe9, b'a'));
        assert!(match_class(0xe9, b'A'));
    }

    #[test]
    fn test_bracket_sets() {
        assert!(set_matches(b'c', b"[a-z]"));
        assert!(!set_matches(b'C', b"[a-z]"));
        assert!(set_matches(b'C', b"[^a-z]"));
        assert!(set_matches(b'5', b"[%d_]"));
        assert!(set_matches(b'_', b"[%d_]"));
        assert!(set_matches(b']', b"[]]"));
        assert!(!set_matches(b']', b"[^]]"));
        assert!(set_matches(b'-', b"[a-]"));
        assert!(set_matches(b'%', b"[%%]"));
    }

    #[test]
    fn test_class_end() {
        assert_eq!(class_end(b"a*", 0), Ok(1));
        assert_eq!(class_end(b"%d+", 0), Ok(2));
        assert_eq!(class_end(b"[abc]x", 0), Ok(5));
        assert_eq!(class_end(b"[]]", 0), Ok(3));
        assert_eq!(class_end(b"[%]]", 0), Ok(4));
        assert_eq!(class_end(b"%", 0), Err(PatternError::EndsWithEscape));
        assert_eq!(class_end(b"[abc", 0), Err(PatternError::MissingBracket));
        assert_eq!(class_end(b"[a%", 0), Err(PatternError::MissingBracket));
    }
}
