use crate::error::{DecodeError, Result};
use crate::tag::{self, tag_name};
use crate::term::Term;

/// Maximum nesting accepted by [`Decoder::decode_term`] and [`Decoder::skip_term`].
pub const MAX_DEPTH: usize = 64;

/// Cursor over an encoded term buffer.
///
/// Every `decode_*` method either consumes exactly one element and advances
/// the cursor, or fails and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Tag byte of the next element, without consuming it.
    pub fn peek_tag(&self) -> Result<u8> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::Truncated {
                offset: self.pos,
                needed: 1,
            })
    }

    pub fn decode_version(&mut self) -> Result<()> {
        let mut at = self.pos;
        let found = self.u8_at(&mut at)?;
        if found != tag::VERSION {
            return Err(DecodeError::BadVersion { found });
        }
        self.pos = at;
        Ok(())
    }

    /// Decode a tuple header and return its arity.
    pub fn decode_tuple_header(&mut self) -> Result<usize> {
        let mut at = self.pos;
        let arity = match self.u8_at(&mut at)? {
            tag::SMALL_TUPLE_EXT => self.u8_at(&mut at)? as usize,
            tag::LARGE_TUPLE_EXT => self.u32_at(&mut at)? as usize,
            other => return Err(self.unexpected("tuple", other)),
        };
        self.pos = at;
        Ok(arity)
    }

    /// Decode a list header and return its length.
    ///
    /// The empty list yields 0 and needs no tail. A non-empty list must be
    /// followed by its elements and then [`Decoder::decode_list_tail`].
    pub fn decode_list_header(&mut self) -> Result<usize> {
        let mut at = self.pos;
        let len = match self.u8_at(&mut at)? {
            tag::NIL_EXT => 0,
            tag::LIST_EXT => self.u32_at(&mut at)? as usize,
            other => return Err(self.unexpected("list", other)),
        };
        self.pos = at;
        Ok(len)
    }

    /// Consume the empty-list tail that closes a proper list.
    pub fn decode_list_tail(&mut self) -> Result<()> {
        let offset = self.pos;
        if self.peek_tag()? != tag::NIL_EXT {
            return Err(DecodeError::ImproperList { offset });
        }
        self.pos += 1;
        Ok(())
    }

    /// Decode a map header and return its number of key/value pairs.
    pub fn decode_map_header(&mut self) -> Result<usize> {
        let mut at = self.pos;
        let arity = match self.u8_at(&mut at)? {
            tag::MAP_EXT => self.u32_at(&mut at)? as usize,
            other => return Err(self.unexpected("map", other)),
        };
        self.pos = at;
        Ok(arity)
    }

    pub fn decode_atom(&mut self) -> Result<String> {
        let mut at = self.pos;
        let offset = at;
        let tag = self.u8_at(&mut at)?;
        let (len, utf8) = match tag {
            tag::ATOM_EXT => (self.u16_at(&mut at)? as usize, false),
            tag::SMALL_ATOM_EXT => (self.u8_at(&mut at)? as usize, false),
            tag::ATOM_UTF8_EXT => (self.u16_at(&mut at)? as usize, true),
            tag::SMALL_ATOM_UTF8_EXT => (self.u8_at(&mut at)? as usize, true),
            other => return Err(self.unexpected("atom", other)),
        };
        let raw = self.take(&mut at, len)?;
        let name = if utf8 {
            std::str::from_utf8(raw)
                .map_err(|_| DecodeError::BadAtom { offset })?
                .to_string()
        } else {
            raw.iter().map(|&b| b as char).collect()
        };
        self.pos = at;
        Ok(name)
    }

    /// Decode any integer term that fits an `i64`.
    pub fn decode_long(&mut self) -> Result<i64> {
        let mut at = self.pos;
        let offset = at;
        let (negative, magnitude) = self.integer_at(&mut at)?;
        let value = if negative {
            if magnitude > i64::MAX as u64 + 1 {
                return Err(DecodeError::IntegerOverflow {
                    target: "i64",
                    offset,
                });
            }
            (magnitude as i64).wrapping_neg()
        } else {
            i64::try_from(magnitude).map_err(|_| DecodeError::IntegerOverflow {
                target: "i64",
                offset,
            })?
        };
        self.pos = at;
        Ok(value)
    }

    /// Decode a non-negative integer term that fits a `u64`.
    pub fn decode_ulong(&mut self) -> Result<u64> {
        let mut at = self.pos;
        let offset = at;
        let (negative, magnitude) = self.integer_at(&mut at)?;
        if negative && magnitude != 0 {
            return Err(DecodeError::IntegerOverflow {
                target: "u64",
                offset,
            });
        }
        self.pos = at;
        Ok(magnitude)
    }

    pub fn decode_double(&mut self) -> Result<f64> {
        let mut at = self.pos;
        let value = match self.u8_at(&mut at)? {
            tag::NEW_FLOAT_EXT => f64::from_bits(self.u64_at(&mut at)?),
            tag::FLOAT_EXT => self.legacy_float_at(&mut at)?,
            other => return Err(self.unexpected("float", other)),
        };
        self.pos = at;
        Ok(value)
    }

    pub fn decode_binary(&mut self) -> Result<&'a [u8]> {
        let mut at = self.pos;
        let bytes = match self.u8_at(&mut at)? {
            tag::BINARY_EXT => {
                let len = self.u32_at(&mut at)? as usize;
                self.take(&mut at, len)?
            }
            other => return Err(self.unexpected("binary", other)),
        };
        self.pos = at;
        Ok(bytes)
    }

    /// Decode the next element, whatever its kind, into an owned [`Term`].
    pub fn decode_term(&mut self) -> Result<Term> {
        let mut probe = self.clone();
        let term = probe.term_at_depth(0)?;
        self.pos = probe.pos;
        Ok(term)
    }

    /// Advance past the next element without building it.
    pub fn skip_term(&mut self) -> Result<()> {
        let mut probe = self.clone();
        probe.skip_at_depth(0)?;
        self.pos = probe.pos;
        Ok(())
    }

    fn term_at_depth(&mut self, depth: usize) -> Result<Term> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep { max: MAX_DEPTH });
        }
        let offset = self.pos;
        let term = match self.peek_tag()? {
            tag::SMALL_INTEGER_EXT | tag::INTEGER_EXT | tag::SMALL_BIG_EXT | tag::LARGE_BIG_EXT => {
                Term::Integer(self.decode_long()?)
            }
            tag::NEW_FLOAT_EXT | tag::FLOAT_EXT => Term::Float(self.decode_double()?),
            tag::ATOM_EXT | tag::SMALL_ATOM_EXT | tag::ATOM_UTF8_EXT | tag::SMALL_ATOM_UTF8_EXT => {
                Term::Atom(self.decode_atom()?)
            }
            tag::BINARY_EXT => Term::Binary(self.decode_binary()?.to_vec()),
            tag::SMALL_TUPLE_EXT | tag::LARGE_TUPLE_EXT => {
                let arity = self.decode_tuple_header()?;
                let mut items = Vec::with_capacity(arity.min(self.remaining()));
                for _ in 0..arity {
                    items.push(self.term_at_depth(depth + 1)?);
                }
                Term::Tuple(items)
            }
            tag::STRING_EXT => {
                let mut at = self.pos + 1;
                let len = self.u16_at(&mut at)? as usize;
                let chars = self.take(&mut at, len)?;
                self.pos = at;
                Term::List(chars.iter().map(|&c| Term::Integer(c as i64)).collect())
            }
            tag::NIL_EXT | tag::LIST_EXT => {
                let len = self.decode_list_header()?;
                let mut items = Vec::with_capacity(len.min(self.remaining()));
                for _ in 0..len {
                    items.push(self.term_at_depth(depth + 1)?);
                }
                if len > 0 {
                    self.decode_list_tail()?;
                }
                Term::List(items)
            }
            tag::MAP_EXT => {
                let arity = self.decode_map_header()?;
                let mut entries = Vec::with_capacity(arity.min(self.remaining()));
                for _ in 0..arity {
                    let key = self.term_at_depth(depth + 1)?;
                    let value = self.term_at_depth(depth + 1)?;
                    entries.push((key, value));
                }
                Term::Map(entries)
            }
            other => return Err(DecodeError::UnknownTag { tag: other, offset }),
        };
        Ok(term)
    }

    fn skip_at_depth(&mut self, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep { max: MAX_DEPTH });
        }
        let offset = self.pos;
        let mut at = self.pos;
        match self.u8_at(&mut at)? {
            tag::SMALL_INTEGER_EXT => self.skip_bytes(&mut at, 1)?,
            tag::INTEGER_EXT => self.skip_bytes(&mut at, 4)?,
            tag::NEW_FLOAT_EXT => self.skip_bytes(&mut at, 8)?,
            tag::FLOAT_EXT => self.skip_bytes(&mut at, 31)?,
            tag::SMALL_BIG_EXT => {
                let n = self.u8_at(&mut at)? as usize;
                self.skip_bytes(&mut at, n + 1)?;
            }
            tag::LARGE_BIG_EXT => {
                let n = self.u32_at(&mut at)? as usize;
                self.skip_bytes(&mut at, n + 1)?;
            }
            tag::ATOM_EXT | tag::ATOM_UTF8_EXT | tag::STRING_EXT => {
                let n = self.u16_at(&mut at)? as usize;
                self.skip_bytes(&mut at, n)?;
            }
            tag::SMALL_ATOM_EXT | tag::SMALL_ATOM_UTF8_EXT => {
                let n = self.u8_at(&mut at)? as usize;
                self.skip_bytes(&mut at, n)?;
            }
            tag::BINARY_EXT => {
                let n = self.u32_at(&mut at)? as usize;
                self.skip_bytes(&mut at, n)?;
            }
            tag::NIL_EXT => {}
            tag::SMALL_TUPLE_EXT | tag::LARGE_TUPLE_EXT => {
                let arity = self.decode_tuple_header()?;
                for _ in 0..arity {
                    self.skip_at_depth(depth + 1)?;
                }
                return Ok(());
            }
            tag::LIST_EXT => {
                let len = self.decode_list_header()?;
                for _ in 0..len {
                    self.skip_at_depth(depth + 1)?;
                }
                return self.decode_list_tail();
            }
            tag::MAP_EXT => {
                let arity = self.decode_map_header()?;
                for _ in 0..arity * 2 {
                    self.skip_at_depth(depth + 1)?;
                }
                return Ok(());
            }
            other => return Err(DecodeError::UnknownTag { tag: other, offset }),
        }
        self.pos = at;
        Ok(())
    }

    /// Sign and magnitude of the integer at `at`.
    fn integer_at(&self, at: &mut usize) -> Result<(bool, u64)> {
        let offset = *at;
        match self.u8_at(at)? {
            tag::SMALL_INTEGER_EXT => Ok((false, self.u8_at(at)? as u64)),
            tag::INTEGER_EXT => {
                let value = self.u32_at(at)? as i32;
                Ok((value < 0, value.unsigned_abs() as u64))
            }
            tag::SMALL_BIG_EXT => {
                let n = self.u8_at(at)? as usize;
                self.big_at(at, n, offset)
            }
            tag::LARGE_BIG_EXT => {
                let n = self.u32_at(at)? as usize;
                self.big_at(at, n, offset)
            }
            other => Err(self.unexpected("integer", other)),
        }
    }

    fn big_at(&self, at: &mut usize, n: usize, offset: usize) -> Result<(bool, u64)> {
        let sign = self.u8_at(at)?;
        let digits = self.take(at, n)?;
        let mut magnitude = 0u64;
        for (i, &digit) in digits.iter().enumerate() {
            if digit == 0 {
                continue;
            }
            if i >= 8 {
                return Err(DecodeError::IntegerOverflow {
                    target: "u64",
                    offset,
                });
            }
            magnitude |= (digit as u64) << (8 * i);
        }
        Ok((sign != 0, magnitude))
    }

    fn legacy_float_at(&self, at: &mut usize) -> Result<f64> {
        let offset = *at;
        let raw = self.take(at, 31)?;
        let text = std::str::from_utf8(raw)
            .map_err(|_| DecodeError::BadFloat { offset })?
            .trim_end_matches('\0')
            .trim();
        text.parse().map_err(|_| DecodeError::BadFloat { offset })
    }

    fn unexpected(&self, expected: &'static str, found: u8) -> DecodeError {
        if tag_name(found) == "unknown" {
            return DecodeError::UnknownTag {
                tag: found,
                offset: self.pos,
            };
        }
        DecodeError::UnexpectedTag {
            expected,
            found: tag_name(found),
            offset: self.pos,
        }
    }

    fn take(&self, at: &mut usize, len: usize) -> Result<&'a [u8]> {
        let end = at.checked_add(len).filter(|&end| end <= self.buf.len());
        match end {
            Some(end) => {
                let bytes = &self.buf[*at..end];
                *at = end;
                Ok(bytes)
            }
            None => Err(DecodeError::Truncated {
                offset: *at,
                needed: len - (self.buf.len() - (*at).min(self.buf.len())),
            }),
        }
    }

    fn skip_bytes(&self, at: &mut usize, len: usize) -> Result<()> {
        self.take(at, len).map(|_| ())
    }

    fn u8_at(&self, at: &mut usize) -> Result<u8> {
        Ok(self.take(at, 1)?[0])
    }

    fn u16_at(&self, at: &mut usize) -> Result<u16> {
        let raw = self.take(at, 2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    fn u32_at(&self, at: &mut usize) -> Result<u32> {
        let raw = self.take(at, 4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn u64_at(&self, at: &mut usize) -> Result<u64> {
        let raw = self.take(at, 8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(raw);
        Ok(u64::from_be_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_request_envelope() {
        // {:read_area, {0x84, 1, 2, 4, 2}} as sent by term_to_binary/1
        let buf = [
            131, 104, 2, 119, 9, b'r', b'e', b'a', b'd', b'_', b'a', b'r', b'e', b'a', 104, 5, 97,
            0x84, 97, 1, 97, 2, 97, 4, 97, 2,
        ];
        let mut decoder = Decoder::new(&buf);
        decoder.decode_version().unwrap();
        assert_eq!(decoder.decode_tuple_header().unwrap(), 2);
        assert_eq!(decoder.decode_atom().unwrap(), "read_area");
        assert_eq!(decoder.decode_tuple_header().unwrap(), 5);
        let values: Vec<u64> = (0..5).map(|_| decoder.decode_ulong().unwrap()).collect();
        assert_eq!(values, vec![0x84, 1, 2, 4, 2]);
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn mismatch_does_not_advance() {
        let buf = [109, 0, 0, 0, 2, 0xAA, 0xBB];
        let mut decoder = Decoder::new(&buf);

        let err = decoder.decode_long().unwrap_err();
        assert!(!err.is_structural());
        assert_eq!(decoder.position(), 0);

        assert_eq!(decoder.decode_binary().unwrap(), &[0xAA, 0xBB]);
        assert_eq!(decoder.position(), buf.len());
    }

    #[test]
    fn negative_integer_ext() {
        let buf = [98, 0xFF, 0xFF, 0xFF, 0xFE];
        assert_eq!(Decoder::new(&buf).decode_long().unwrap(), -2);

        let err = Decoder::new(&buf).decode_ulong().unwrap_err();
        assert!(matches!(err, DecodeError::IntegerOverflow { target: "u64", .. }));
    }

    #[test]
    fn small_big_values() {
        // 2^32 as SMALL_BIG_EXT
        let buf = [110, 5, 0, 0, 0, 0, 0, 1];
        assert_eq!(Decoder::new(&buf).decode_ulong().unwrap(), 1 << 32);

        // -(2^40)
        let buf = [110, 6, 1, 0, 0, 0, 0, 0, 1];
        assert_eq!(Decoder::new(&buf).decode_long().unwrap(), -(1i64 << 40));

        // 2^64 does not fit
        let buf = [110, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        let err = Decoder::new(&buf).decode_ulong().unwrap_err();
        assert!(!err.is_structural());

        // u64::MAX fits u64 but not i64
        let buf = [110, 8, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(Decoder::new(&buf).decode_ulong().unwrap(), u64::MAX);
        assert!(Decoder::new(&buf).decode_long().is_err());

        // i64::MIN is representable
        let buf = [110, 8, 1, 0, 0, 0, 0, 0, 0, 0, 0x80];
        assert_eq!(Decoder::new(&buf).decode_long().unwrap(), i64::MIN);
    }

    #[test]
    fn latin1_atom() {
        let buf = [100, 0, 3, b'n', 0xE9, b'e'];
        assert_eq!(Decoder::new(&buf).decode_atom().unwrap(), "née");
    }

    #[test]
    fn invalid_utf8_atom_is_structural() {
        let buf = [119, 2, 0xC3, 0x28];
        let err = Decoder::new(&buf).decode_atom().unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn truncated_binary() {
        let buf = [109, 0, 0, 0, 8, 1, 2];
        let mut decoder = Decoder::new(&buf);
        let err = decoder.decode_binary().unwrap_err();
        assert_eq!(err, DecodeError::Truncated { offset: 5, needed: 6 });
        assert!(err.is_structural());
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn bad_version() {
        let err = Decoder::new(&[130, 106]).decode_version().unwrap_err();
        assert_eq!(err, DecodeError::BadVersion { found: 130 });
    }

    #[test]
    fn string_ext_is_a_list_of_bytes() {
        let buf = [107, 0, 2, b'h', b'i'];
        assert_eq!(
            Decoder::new(&buf).decode_term().unwrap(),
            Term::List(vec![Term::Integer(104), Term::Integer(105)])
        );
    }

    #[test]
    fn improper_list_rejected() {
        // [1 | 2]
        let buf = [108, 0, 0, 0, 1, 97, 1, 97, 2];
        let err = Decoder::new(&buf).decode_term().unwrap_err();
        assert_eq!(err, DecodeError::ImproperList { offset: 7 });
    }

    #[test]
    fn legacy_float() {
        let mut buf = vec![99];
        let mut text = b"1.50000000000000000000e+00".to_vec();
        text.resize(31, 0);
        buf.extend_from_slice(&text);
        assert_eq!(Decoder::new(&buf).decode_double().unwrap(), 1.5);
    }

    #[test]
    fn skip_nested_term() {
        // {[%{a: <<1>>}], 5} followed by atom ok
        let buf = [
            104, 2, 108, 0, 0, 0, 1, 116, 0, 0, 0, 1, 119, 1, b'a', 109, 0, 0, 0, 1, 1, 106, 97,
            5, 119, 2, b'o', b'k',
        ];
        let mut decoder = Decoder::new(&buf);
        decoder.skip_term().unwrap();
        assert_eq!(decoder.decode_atom().unwrap(), "ok");
    }

    #[test]
    fn unknown_tag_is_structural() {
        let buf = [200, 0];
        let err = Decoder::new(&buf).decode_term().unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag { tag: 200, offset: 0 });
        assert!(Decoder::new(&buf).decode_long().unwrap_err().is_structural());
    }

    #[test]
    fn depth_limit() {
        let mut buf = Vec::new();
        for _ in 0..=MAX_DEPTH + 1 {
            buf.extend_from_slice(&[104, 1]);
        }
        buf.push(106);
        let err = Decoder::new(&buf).decode_term().unwrap_err();
        assert_eq!(err, DecodeError::TooDeep { max: MAX_DEPTH });
    }
}
