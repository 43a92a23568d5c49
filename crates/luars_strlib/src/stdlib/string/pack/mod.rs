// string.pack / string.unpack / string.packsize (Lua 5.3+)
//
// Sizes are fixed across platforms (see lua_limits); only `=` depends on
// the host byte order.

mod format;
mod primitives;

use tracing::trace;

use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaError, LuaResult, LuaState, LuaVersion};

pub use format::{Directive, DirectiveKind, Endian, FormatParser};
pub use primitives::{
    check_signed, check_size, check_unsigned, read_f32, read_f64, read_int, write_f32, write_f64,
    write_int,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("invalid format option '{0}'")]
    InvalidOption(char),
    #[error("missing size for format option 'c'")]
    MissingSize,
    #[error("integral size ({0}) out of limits [1,16]")]
    SizeOutOfLimits(usize),
    #[error("alignment must be between 1 and 16")]
    AlignmentOutOfRange,
    #[error("invalid next option for option 'X'")]
    InvalidNextOption,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("unsigned overflow")]
    UnsignedOverflow,
    #[error("string longer than given size")]
    StringTooLong,
    #[error("string contains zeros")]
    ContainsZeros,
    #[error("string length does not fit in given size")]
    LengthDoesNotFit,
    #[error("data string too short")]
    DataTooShort,
    #[error("unfinished string for format 'z'")]
    UnfinishedString,
    #[error("initial position out of string")]
    PositionOutOfString,
    #[error("variable-length format")]
    VariableLength,
    #[error("format result too large")]
    ResultTooLarge,
    #[error("{0}-byte integer does not fit into Lua Integer")]
    IntegerDoesNotFit(usize),
}

impl PackError {
    /// Report as a bad argument of `func`.
    pub fn at_arg(self, arg: usize, func: &'static str) -> LuaError {
        LuaError::BadArgument {
            arg,
            func,
            msg: self.to_string(),
        }
    }
}

// ======================== pack ========================

/// Encode the arguments of `l` from `first_arg` on according to `fmt`.
pub fn pack_args(l: &LuaState, fmt: &[u8], first_arg: usize) -> LuaResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut arg = first_arg;
    for directive in FormatParser::new(fmt) {
        let d = match directive {
            Ok(d) => d,
            Err(PackError::InvalidNextOption) => {
                return Err(PackError::InvalidNextOption.at_arg(1, "pack"));
            }
            Err(e) => return Err(e.into()),
        };
        let endian = d.endian;
        match d.kind {
            DirectiveKind::Int { .. } | DirectiveKind::Size => {
                let value = l.check_integer(arg, "pack")?;
                let in_range = match d.kind {
                    DirectiveKind::Int { signed: true } => check_signed(value, d.size),
                    DirectiveKind::Int { signed: false } => check_unsigned(value, d.size),
                    _ => check_size(value, d.size),
                };
                in_range.map_err(|e| e.at_arg(arg, "pack"))?;
                write_int(&mut out, value, d.size, endian);
            }
            DirectiveKind::Float => {
                let value = l.check_number(arg, "pack")?;
                write_f32(&mut out, value as f32, endian);
            }
            DirectiveKind::Double => {
                let value = l.check_number(arg, "pack")?;
                write_f64(&mut out, value, endian);
            }
            DirectiveKind::FixedString => {
                let s = l.check_string(arg, "pack")?;
                if s.len() > d.size {
                    return Err(PackError::StringTooLong.at_arg(arg, "pack"));
                }
                out.extend_from_slice(&s);
                out.resize(out.len() + (d.size - s.len()), 0);
            }
            DirectiveKind::ZeroString => {
                let s = l.check_string(arg, "pack")?;
                if s.contains(&0) {
                    return Err(PackError::ContainsZeros.at_arg(arg, "pack"));
                }
                out.extend_from_slice(&s);
                out.push(0);
            }
            DirectiveKind::LengthString => {
                let s = l.check_string(arg, "pack")?;
                let len = i64::try_from(s.len()).unwrap_or(i64::MAX);
                check_unsigned(len, d.size)
                    .map_err(|_| PackError::LengthDoesNotFit.at_arg(arg, "pack"))?;
                write_int(&mut out, len, d.size, endian);
                out.extend_from_slice(&s);
            }
            DirectiveKind::Padding => out.push(0),
            DirectiveKind::Align => {
                let pad = d.padding_at(out.len());
                out.resize(out.len() + pad, 0);
            }
        }
        if d.takes_value() {
            arg += 1;
        }
    }
    Ok(out)
}

// ======================== unpack ========================

fn take<'d>(data: &'d [u8], pos: usize, n: usize) -> Result<&'d [u8], LuaError> {
    pos.checked_add(n)
        .and_then(|end| data.get(pos..end))
        .ok_or_else(|| PackError::DataTooShort.at_arg(2, "unpack"))
}

/// Decode `data` from byte offset `pos` according to `fmt`. Returns the
/// values and the offset just past the last byte read.
pub fn unpack_bytes(
    fmt: &[u8],
    data: &[u8],
    mut pos: usize,
) -> LuaResult<(Vec<LuaValue>, usize)> {
    if pos > data.len() {
        return Err(PackError::PositionOutOfString.at_arg(3, "unpack"));
    }
    let mut values = Vec::new();
    for directive in FormatParser::new(fmt) {
        let d = match directive {
            Ok(d) => d,
            Err(PackError::InvalidNextOption) => {
                return Err(PackError::InvalidNextOption.at_arg(1, "unpack"));
            }
            Err(e) => return Err(e.into()),
        };
        let endian = d.endian;
        match d.kind {
            DirectiveKind::Int { .. } | DirectiveKind::Size => {
                let signed = d.kind == DirectiveKind::Int { signed: true };
                let bytes = take(data, pos, d.size)?;
                values.push(LuaValue::integer(read_int(bytes, signed, endian)?));
                pos += d.size;
            }
            DirectiveKind::Float => {
                let bytes = take(data, pos, 4)?;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                values.push(LuaValue::float(read_f32(raw, endian) as f64));
                pos += 4;
            }
            DirectiveKind::Double => {
                let bytes = take(data, pos, 8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                values.push(LuaValue::float(read_f64(raw, endian)));
                pos += 8;
            }
            DirectiveKind::FixedString => {
                values.push(LuaValue::string(take(data, pos, d.size)?));
                pos += d.size;
            }
            DirectiveKind::ZeroString => {
                let len = data[pos..]
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or_else(|| PackError::UnfinishedString.at_arg(2, "unpack"))?;
                values.push(LuaValue::string(&data[pos..pos + len]));
                pos += len + 1;
            }
            DirectiveKind::LengthString => {
                let header = take(data, pos, d.size)?;
                let len = read_int(header, false, endian)?;
                pos += d.size;
                let len = usize::try_from(len)
                    .map_err(|_| PackError::DataTooShort.at_arg(2, "unpack"))?;
                values.push(LuaValue::string(take(data, pos, len)?));
                pos += len;
            }
            DirectiveKind::Padding => {
                take(data, pos, 1)?;
                pos += 1;
            }
            DirectiveKind::Align => {
                let pad = d.padding_at(pos);
                take(data, pos, pad)?;
                pos += pad;
            }
        }
    }
    Ok((values, pos))
}

// ======================== packsize ========================

/// Total size of a format without variable-length directives.
pub fn packsize(fmt: &[u8]) -> LuaResult<usize> {
    let mut total: usize = 0;
    for directive in FormatParser::new(fmt) {
        let d = match directive {
            Ok(d) => d,
            Err(PackError::InvalidNextOption) => {
                return Err(PackError::InvalidNextOption.at_arg(1, "packsize"));
            }
            Err(e) => return Err(e.into()),
        };
        let size = match d.kind {
            DirectiveKind::Align => d.padding_at(total),
            _ => d
                .fixed_size()
                .ok_or_else(|| PackError::VariableLength.at_arg(1, "packsize"))?,
        };
        total = total
            .checked_add(size)
            .filter(|&t| t <= i32::MAX as usize)
            .ok_or_else(|| PackError::ResultTooLarge.at_arg(1, "packsize"))?;
    }
    Ok(total)
}

// ======================== Lua entry points ========================

/// Translate a 1-based, possibly negative, position into a 1-based
/// position counted from the start (posrelatI). Zero and positions before
/// the start clamp to 1.
fn posrelat(pos: i64, len: usize) -> u64 {
    let len = len as i64;
    if pos > 0 {
        pos as u64
    } else if pos == 0 || pos < -len {
        1
    } else {
        (len + pos + 1) as u64
    }
}

/// string.pack(fmt, v1, v2, ...)
pub fn string_pack(l: &mut LuaState) -> LuaResult<usize> {
    l.require_version("string.pack", LuaVersion::Lua53)?;
    let fmt = l.check_string(1, "pack")?;
    let bytes = pack_args(l, &fmt, 2)?;
    trace!(format_len = fmt.len(), packed = bytes.len(), "string.pack");
    l.push_value(LuaValue::string_owned(bytes))?;
    Ok(1)
}

/// string.unpack(fmt, s [, pos]) -> values..., next position
pub fn string_unpack(l: &mut LuaState) -> LuaResult<usize> {
    l.require_version("string.unpack", LuaVersion::Lua53)?;
    let fmt = l.check_string(1, "unpack")?;
    let data = l.check_string(2, "unpack")?;
    let pos = posrelat(l.opt_integer(3, "unpack", 1)?, data.len()) - 1;
    let pos = usize::try_from(pos).unwrap_or(usize::MAX);
    let (values, next) = unpack_bytes(&fmt, &data, pos)?;
    let n = values.len();
    for value in values {
        l.push_value(value)?;
    }
    l.push_value(LuaValue::integer(next as i64 + 1))?;
    Ok(n + 1)
}

/// string.packsize(fmt)
pub fn string_packsize(l: &mut LuaState) -> LuaResult<usize> {
    l.require_version("string.packsize", LuaVersion::Lua53)?;
    let fmt = l.check_string(1, "packsize")?;
    let size = packsize(&fmt)?;
    l.push_value(LuaValue::integer(size as i64))?;
    Ok(1)
}
