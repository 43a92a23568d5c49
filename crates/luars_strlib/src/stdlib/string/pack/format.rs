// Format string tokenizer for string.pack / string.unpack / string.packsize
//
// Mode markers (< > = !n) and spaces are consumed here; callers only see
// the directives, each stamped with the byte order active at that point.

use super::PackError;
use crate::lua_vm::lua_limits::{
    MAXALIGN, MAXINTSIZE, SIZE_DOUBLE, SIZE_FLOAT, SIZE_INT, SIZE_LONG, SIZE_SHORT, SIZE_T, SZINT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub const NATIVE: Endian = if cfg!(target_endian = "big") {
        Endian::Big
    } else {
        Endian::Little
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Integer of `size` bytes
    Int { signed: bool },
    /// `T`: unsigned size_t, never negative
    Size,
    /// `f`
    Float,
    /// `d` / `n`
    Double,
    /// `cN`: exactly `size` bytes
    FixedString,
    /// `z`
    ZeroString,
    /// `sN`: string preceded by a `size`-byte unsigned length
    LengthString,
    /// `x`
    Padding,
    /// `Xop`: zero bytes up to a multiple of `size`
    Align,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub size: usize,
    pub endian: Endian,
}

impl Directive {
    /// Does this directive consume an argument (pack) / produce a value
    /// (unpack)?
    pub fn takes_value(&self) -> bool {
        !matches!(self.kind, DirectiveKind::Padding | DirectiveKind::Align)
    }

    /// Bytes this directive occupies when its size does not depend on the
    /// data. `None` for `z` and `s`.
    pub fn fixed_size(&self) -> Option<usize> {
        match self.kind {
            DirectiveKind::ZeroString | DirectiveKind::LengthString => None,
            DirectiveKind::Align => Some(0),
            _ => Some(self.size),
        }
    }

    /// Padding an `Align` directive inserts at byte offset `pos`.
    #[inline]
    pub fn padding_at(&self, pos: usize) -> usize {
        if self.kind == DirectiveKind::Align && self.size > 1 {
            (self.size - pos % self.size) % self.size
        } else {
            0
        }
    }
}

pub struct FormatParser<'a> {
    fmt: &'a [u8],
    pos: usize,
    endian: Endian,
    max_align: usize,
}

impl<'a> FormatParser<'a> {
    pub fn new(fmt: &'a [u8]) -> Self {
        Self {
            fmt,
            pos: 0,
            endian: Endian::NATIVE,
            max_align: 1,
        }
    }

    /// Optional decimal number at the cursor. Saturates instead of
    /// overflowing; the limit checks reject saturated values.
    fn read_number(&mut self) -> Option<usize> {
        let start = self.pos;
        let mut n: usize = 0;
        while let Some(&c) = self.fmt.get(self.pos).filter(|c| c.is_ascii_digit()) {
            n = n.saturating_mul(10).saturating_add((c - b'0') as usize);
            self.pos += 1;
        }
        (self.pos > start).then_some(n)
    }

    /// Integral size with default `df`, limited to [1, MAXINTSIZE].
    fn read_size_limit(&mut self, df: usize) -> Result<usize, PackError> {
        match self.read_number() {
            None => Ok(df),
            Some(n) if (1..=MAXINTSIZE).contains(&n) => Ok(n),
            Some(n) => Err(PackError::SizeOutOfLimits(n)),
        }
    }

    /// Parse the option at the cursor into `(kind, size)`. Returns `None`
    /// for mode markers and spaces, which only update parser state.
    fn read_option(&mut self) -> Result<Option<(DirectiveKind, usize)>, PackError> {
        let c = self.fmt[self.pos];
        self.pos += 1;
        let option = match c {
            b'b' => (DirectiveKind::Int { signed: true }, 1),
            b'B' => (DirectiveKind::Int { signed: false }, 1),
            b'h' => (DirectiveKind::Int { signed: true }, SIZE_SHORT),
            b'H' => (DirectiveKind::Int { signed: false }, SIZE_SHORT),
            b'l' => (DirectiveKind::Int { signed: true }, SIZE_LONG),
            b'L' => (DirectiveKind::Int { signed: false }, SIZE_LONG),
            b'j' => (DirectiveKind::Int { signed: true }, SZINT),
            b'J' => (DirectiveKind::Int { signed: false }, SZINT),
            b'T' => (DirectiveKind::Size, SIZE_T),
            b'i' => (DirectiveKind::Int { signed: true }, self.read_size_limit(SIZE_INT)?),
            b'I' => (DirectiveKind::Int { signed: false }, self.read_size_limit(SIZE_INT)?),
            b'f' => (DirectiveKind::Float, SIZE_FLOAT),
            b'd' | b'n' => (DirectiveKind::Double, SIZE_DOUBLE),
            b'c' => match self.read_number() {
                Some(n) => (DirectiveKind::FixedString, n),
                None => return Err(PackError::MissingSize),
            },
            b'z' => (DirectiveKind::ZeroString, 0),
            b's' => (DirectiveKind::LengthString, self.read_size_limit(SIZE_T)?),
            b'x' => (DirectiveKind::Padding, 1),
            b'X' => (DirectiveKind::Align, self.read_align_operand()?),
            b' ' => return Ok(None),
            b'<' => {
                self.endian = Endian::Little;
                return Ok(None);
            }
            b'>' => {
                self.endian = Endian::Big;
                return Ok(None);
            }
            b'=' => {
                self.endian = Endian::NATIVE;
                return Ok(None);
            }
            b'!' => {
                self.max_align = match self.read_number() {
                    None => 1,
                    Some(n) if (1..=MAXALIGN).contains(&n) => n,
                    Some(_) => return Err(PackError::AlignmentOutOfRange),
                };
                return Ok(None);
            }
            other => return Err(PackError::InvalidOption(other as char)),
        };
        Ok(Some(option))
    }

    /// Operand of `X`: any option with a natural size. The alignment is
    /// that size capped by the current `!` setting.
    fn read_align_operand(&mut self) -> Result<usize, PackError> {
        if self.pos >= self.fmt.len() {
            return Err(PackError::InvalidNextOption);
        }
        let (endian, max_align) = (self.endian, self.max_align);
        let option = self.read_option();
        // The operand is not a directive of its own and must not change
        // the byte order.
        self.endian = endian;
        self.max_align = max_align;
        match option {
            Ok(Some((kind, size)))
                if size > 0
                    && !matches!(
                        kind,
                        DirectiveKind::FixedString
                            | DirectiveKind::ZeroString
                            | DirectiveKind::LengthString
                            | DirectiveKind::Padding
                            | DirectiveKind::Align
                    ) =>
            {
                Ok(size.min(self.max_align))
            }
            Err(PackError::SizeOutOfLimits(n)) => Err(PackError::SizeOutOfLimits(n)),
            _ => Err(PackError::InvalidNextOption),
        }
    }
}

impl Iterator for FormatParser<'_> {
    type Item = Result<Directive, PackError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.fmt.len() {
            match self.read_option() {
                Ok(Some((kind, size))) => {
                    return Some(Ok(Directive {
                        kind,
                        size,
                        endian: self.endian,
                    }));
                }
                Ok(None) => continue,
                Err(e) => {
                    // Stop after the first error.
                    self.pos = self.fmt.len();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
