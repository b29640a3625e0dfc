use bytes::Bytes;

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::Result;

/// An owned external-format term.
///
/// Strings sent as character lists decode to [`Term::List`] of integers;
/// the VM's `nil`, `true` and `false` are plain atoms.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Integer(i64),
    Float(f64),
    Atom(String),
    Binary(Vec<u8>),
    Tuple(Vec<Term>),
    List(Vec<Term>),
    Map(Vec<(Term, Term)>),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    /// The `nil` atom.
    pub fn nil() -> Self {
        Term::Atom("nil".to_string())
    }

    pub fn boolean(value: bool) -> Self {
        Term::atom(if value { "true" } else { "false" })
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Term::Binary(bytes.into())
    }

    /// `Some(value)` as the value itself, `None` as `nil`.
    pub fn or_nil(value: Option<Term>) -> Self {
        value.unwrap_or_else(Term::nil)
    }

    /// Build a map keyed by atoms, in the given order.
    pub fn atom_map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Term)>,
        K: Into<String>,
    {
        Term::Map(
            entries
                .into_iter()
                .map(|(key, value)| (Term::atom(key), value))
                .collect(),
        )
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Term::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Term::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Look up an atom key in a map term.
    pub fn get(&self, key: &str) -> Option<&Term> {
        match self {
            Term::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_atom() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Encode with a leading version marker.
    pub fn to_bytes(&self) -> Bytes {
        let mut encoder = Encoder::new();
        encoder.encode_version();
        encoder.encode_term(self);
        encoder.into_bytes()
    }

    /// Decode a version-prefixed buffer holding exactly one term.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(buf);
        decoder.decode_version()?;
        decoder.decode_term()
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Integer(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::Atom(value.to_string())
    }
}
