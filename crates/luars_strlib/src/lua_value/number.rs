// Number <-> string conversions following Lua's lobject.c rules

use crate::lua_value::LuaValue;
use crate::lua_vm::LuaVersion;

/// Render a float the way `tostring` does (`%.14g`). From Lua 5.3 on an
/// integral result gets a `.0` suffix so it reads back as a float.
pub fn format_float(f: f64, version: LuaVersion) -> String {
    let mut out = if f.is_nan() {
        if f.is_sign_negative() { "-nan".to_string() } else { "nan".to_string() }
    } else if f.is_infinite() {
        if f < 0.0 { "-inf".to_string() } else { "inf".to_string() }
    } else {
        format_g14(f)
    };
    if version.has_integer_subtype() && out.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        out.push_str(".0");
    }
    out
}

/// `%.14g` for finite values.
fn format_g14(f: f64) -> String {
    const PRECISION: i32 = 14;
    if f == 0.0 {
        return if f.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }
    // Round to 14 significant digits first; the exponent of the rounded
    // value decides between fixed and scientific notation.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, f);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= PRECISION {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, f)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Parse a numeric string (lua_stringtonumber). Accepts surrounding
/// whitespace, decimal integers and floats, and hexadecimal integers.
/// Decimal integers that overflow become floats.
pub fn str_to_number(s: &[u8]) -> Option<LuaValue> {
    let s = s.trim_ascii();
    if s.is_empty() {
        return None;
    }
    let (negative, digits) = match s[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if let Some(hex) = digits
        .strip_prefix(b"0x")
        .or_else(|| digits.strip_prefix(b"0X"))
    {
        if hex.is_empty() || !hex.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        // Hex integers wrap around modulo 2^64.
        let value = hex.iter().fold(0u64, |acc, &b| {
            let d = (b as char).to_digit(16).unwrap_or(0) as u64;
            acc.wrapping_mul(16).wrapping_add(d)
        }) as i64;
        return Some(LuaValue::integer(if negative { value.wrapping_neg() } else { value }));
    }
    if !digits
        .iter()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
        || !digits.first().is_some_and(|b| b.is_ascii_digit() || *b == b'.')
    {
        return None;
    }
    let text = std::str::from_utf8(s).ok()?;
    if digits.iter().all(u8::is_ascii_digit)
        && let Ok(i) = text.parse::<i64>()
    {
        return Some(LuaValue::integer(i));
    }
    text.parse::<f64>().ok().map(LuaValue::float)
}
