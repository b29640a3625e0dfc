use bytes::{BufMut, Bytes, BytesMut};

use crate::tag;
use crate::term::Term;

const INITIAL_CAPACITY: usize = 256;

/// Growable term encoder.
///
/// Integers take the smallest representation that holds them (small
/// integer, 32-bit integer, then small big). Atoms are written as UTF-8
/// atoms.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn encode_version(&mut self) {
        self.buf.put_u8(tag::VERSION);
    }

    /// Write `name` as a small UTF-8 atom.
    ///
    /// The VM caps atoms at 255 characters; a name over 255 bytes is cut at
    /// the last character boundary that fits.
    pub fn encode_atom(&mut self, name: &str) {
        let mut len = name.len().min(u8::MAX as usize);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.buf.put_u8(tag::SMALL_ATOM_UTF8_EXT);
        self.buf.put_u8(len as u8);
        self.buf.put_slice(&name.as_bytes()[..len]);
    }

    pub fn encode_boolean(&mut self, value: bool) {
        self.encode_atom(if value { "true" } else { "false" });
    }

    pub fn encode_long(&mut self, value: i64) {
        if (0..=u8::MAX as i64).contains(&value) {
            self.buf.put_u8(tag::SMALL_INTEGER_EXT);
            self.buf.put_u8(value as u8);
        } else if let Ok(value) = i32::try_from(value) {
            self.buf.put_u8(tag::INTEGER_EXT);
            self.buf.put_i32(value);
        } else {
            self.encode_big(value < 0, value.unsigned_abs());
        }
    }

    pub fn encode_ulong(&mut self, value: u64) {
        match i64::try_from(value) {
            Ok(value) => self.encode_long(value),
            Err(_) => self.encode_big(false, value),
        }
    }

    fn encode_big(&mut self, negative: bool, magnitude: u64) {
        let digits = magnitude.to_le_bytes();
        let len = 8 - (magnitude.leading_zeros() as usize / 8);
        self.buf.put_u8(tag::SMALL_BIG_EXT);
        self.buf.put_u8(len as u8);
        self.buf.put_u8(negative as u8);
        self.buf.put_slice(&digits[..len]);
    }

    pub fn encode_double(&mut self, value: f64) {
        self.buf.put_u8(tag::NEW_FLOAT_EXT);
        self.buf.put_f64(value);
    }

    pub fn encode_binary(&mut self, bytes: &[u8]) {
        self.buf.put_u8(tag::BINARY_EXT);
        self.buf.put_u32(bytes.len() as u32);
        self.buf.put_slice(bytes);
    }

    pub fn encode_tuple_header(&mut self, arity: usize) {
        if arity <= u8::MAX as usize {
            self.buf.put_u8(tag::SMALL_TUPLE_EXT);
            self.buf.put_u8(arity as u8);
        } else {
            self.buf.put_u8(tag::LARGE_TUPLE_EXT);
            self.buf.put_u32(arity as u32);
        }
    }

    /// Start a list of `len` elements.
    ///
    /// For `len > 0` the elements must follow, then [`Encoder::encode_empty_list`]
    /// as the tail. A zero-length header is written as the empty list itself.
    pub fn encode_list_header(&mut self, len: usize) {
        if len == 0 {
            self.encode_empty_list();
            return;
        }
        self.buf.put_u8(tag::LIST_EXT);
        self.buf.put_u32(len as u32);
    }

    pub fn encode_empty_list(&mut self) {
        self.buf.put_u8(tag::NIL_EXT);
    }

    pub fn encode_map_header(&mut self, arity: usize) {
        self.buf.put_u8(tag::MAP_EXT);
        self.buf.put_u32(arity as u32);
    }

    pub fn encode_term(&mut self, term: &Term) {
        match term {
            Term::Integer(value) => self.encode_long(*value),
            Term::Float(value) => self.encode_double(*value),
            Term::Atom(name) => self.encode_atom(name),
            Term::Binary(bytes) => self.encode_binary(bytes),
            Term::Tuple(items) => {
                self.encode_tuple_header(items.len());
                for item in items {
                    self.encode_term(item);
                }
            }
            Term::List(items) => {
                self.encode_list_header(items.len());
                if items.is_empty() {
                    return;
                }
                for item in items {
                    self.encode_term(item);
                }
                self.encode_empty_list();
            }
            Term::Map(entries) => {
                self.encode_map_header(entries.len());
                for (key, value) in entries {
                    self.encode_term(key);
                    self.encode_term(value);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}
