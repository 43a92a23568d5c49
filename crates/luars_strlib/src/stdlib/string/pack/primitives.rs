// Byte-level encode/decode for pack directives

use super::PackError;
use super::format::Endian;
use crate::lua_vm::lua_limits::SZINT;

/// Append `value` as a `size`-byte integer. Sizes above 8 are filled with
/// the sign extension of `value`.
pub fn write_int(out: &mut Vec<u8>, value: i64, size: usize, endian: Endian) {
    let ext = if value < 0 { 0xff } else { 0x00 };
    let le = value.to_le_bytes();
    let start = out.len();
    out.extend((0..size).map(|i| le.get(i).copied().unwrap_or(ext)));
    if endian == Endian::Big {
        out[start..].reverse();
    }
}

/// Decode an integer spanning all of `bytes` (1..=16 bytes).
///
/// Narrow signed values are sign-extended; 8-byte unsigned values wrap
/// into i64. Bytes beyond the eighth must only extend the sign.
pub fn read_int(bytes: &[u8], signed: bool, endian: Endian) -> Result<i64, PackError> {
    let size = bytes.len();
    // i-th byte counting from the least significant
    let byte = |i: usize| match endian {
        Endian::Little => bytes[i],
        Endian::Big => bytes[size - 1 - i],
    };
    let limit = size.min(SZINT);
    let mut res: u64 = 0;
    for i in (0..limit).rev() {
        res = (res << 8) | byte(i) as u64;
    }
    if size < SZINT {
        if signed {
            let mask = 1u64 << (size * 8 - 1);
            res = (res ^ mask).wrapping_sub(mask);
        }
    } else if size > SZINT {
        let ext = if !signed || (res as i64) >= 0 { 0x00 } else { 0xff };
        if (limit..size).any(|i| byte(i) != ext) {
            return Err(PackError::IntegerDoesNotFit(size));
        }
    }
    Ok(res as i64)
}

/// Range check for a signed integer of `size` bytes.
pub fn check_signed(value: i64, size: usize) -> Result<(), PackError> {
    if size < SZINT {
        let lim = 1i64 << (size * 8 - 1);
        if !(-lim..lim).contains(&value) {
            return Err(PackError::IntegerOverflow);
        }
    }
    Ok(())
}

/// Range check for an unsigned integer of `size` bytes. From 8 bytes up
/// any value is accepted and written with its i64 bit pattern, so unpack
/// results above i64::MAX pack back unchanged.
pub fn check_unsigned(value: i64, size: usize) -> Result<(), PackError> {
    if size < SZINT && (value as u64) >> (size * 8) != 0 {
        return Err(PackError::UnsignedOverflow);
    }
    Ok(())
}

/// Range check for a size_t field, which never holds a negative value.
pub fn check_size(value: i64, size: usize) -> Result<(), PackError> {
    if value < 0 {
        return Err(PackError::UnsignedOverflow);
    }
    check_unsigned(value, size)
}

pub fn write_f32(out: &mut Vec<u8>, value: f32, endian: Endian) {
    match endian {
        Endian::Little => out.extend_from_slice(&value.to_bits().to_le_bytes()),
        Endian::Big => out.extend_from_slice(&value.to_bits().to_be_bytes()),
    }
}

pub fn write_f64(out: &mut Vec<u8>, value: f64, endian: Endian) {
    match endian {
        Endian::Little => out.extend_from_slice(&value.to_bits().to_le_bytes()),
        Endian::Big => out.extend_from_slice(&value.to_bits().to_be_bytes()),
    }
}

pub fn read_f32(bytes: [u8; 4], endian: Endian) -> f32 {
    f32::from_bits(match endian {
        Endian::Little => u32::from_le_bytes(bytes),
        Endian::Big => u32::from_be_bytes(bytes),
    })
}

pub fn read_f64(bytes: [u8; 8], endian: Endian) -> f64 {
    f64::from_bits(match endian {
        Endian::Little => u64::from_le_bytes(bytes),
        Endian::Big => u64::from_be_bytes(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    fn packed(value: i64, size: usize, endian: Endian) -> Vec<u8> {
        let mut out = Vec::new();
        write_int(&mut out, value, size, endian);
        out
    }

    #[test]
    fn test_write_int_layout() {
        assert_eq!(packed(0x0102, 2, Endian::Little), vec![0x02, 0x01]);
        assert_eq!(packed(0x0102, 2, Endian::Big), vec![0x01, 0x02]);
        assert_eq!(packed(-1, 3, Endian::Big), vec![0xff; 3]);
        assert_eq!(packed(-2, 10, Endian::Little)[8..], [0xff, 0xff]);
        assert_eq!(packed(5, 10, Endian::Big)[..2], [0x00, 0x00]);
    }

    #[test]
    fn test_read_int_sign() {
        assert_eq!(read_int(&[0xff], true, Endian::Little), Ok(-1));
        assert_eq!(read_int(&[0xff], false, Endian::Little), Ok(255));
        assert_eq!(read_int(&[0x80, 0x00], true, Endian::Big), Ok(-32768));
        assert_eq!(read_int(&[0xff; 8], false, Endian::Little), Ok(-1));
    }

    #[test]
    fn test_read_wide_int() {
        let mut bytes = vec![0u8; 12];
        bytes[0] = 7;
        assert_eq!(read_int(&bytes, true, Endian::Little), Ok(7));
        bytes[9] = 1;
        assert_eq!(read_int(&bytes, true, Endian::Little), Err(PackError::IntegerDoesNotFit(12)));
        let neg = packed(-5, 12, Endian::Big);
        assert_eq!(read_int(&neg, true, Endian::Big), Ok(-5));
        // Unsigned wide values must be zero-extended.
        assert_eq!(read_int(&neg, false, Endian::Big), Err(PackError::IntegerDoesNotFit(12)));
    }

    #[test]
    fn test_range_checks() {
        assert!(check_signed(127, 1).is_ok());
        assert_eq!(check_signed(128, 1), Err(PackError::IntegerOverflow));
        assert_eq!(check_signed(-129, 1), Err(PackError::IntegerOverflow));
        assert!(check_signed(i64::MIN, 8).is_ok());
        assert!(check_unsigned(255, 1).is_ok());
        assert_eq!(check_unsigned(256, 1), Err(PackError::UnsignedOverflow));
        assert_eq!(check_unsigned(-1, 4), Err(PackError::UnsignedOverflow));
        assert!(check_unsigned(i64::MAX, 8).is_ok());
        // Wide unsigned fields take the i64 bit pattern as is.
        assert!(check_unsigned(-1, 8).is_ok());
        assert!(check_unsigned(-1, 16).is_ok());
        assert_eq!(check_size(-1, 8), Err(PackError::UnsignedOverflow));
        assert!(check_size(4096, 8).is_ok());
    }

    quickcheck! {
        fn prop_int_round_trip(value: i64, size: u8, big: bool) -> bool {
            let size = (size % 16) as usize + 1;
            let endian = if big { Endian::Big } else { Endian::Little };
            // Truncate to what a signed `size`-byte field can hold.
            let value = if size < 8 {
                let shift = 64 - size * 8;
                (value << shift) >> shift
            } else {
                value
            };
            read_int(&packed(value, size, endian), true, endian) == Ok(value)
        }

        fn prop_double_round_trip(value: f64, big: bool) -> bool {
            let endian = if big { Endian::Big } else { Endian::Little };
            let mut out = Vec::new();
            write_f64(&mut out, value, endian);
            let back = read_f64(out.try_into().unwrap(), endian);
            back.to_bits() == value.to_bits()
        }
    }
}
