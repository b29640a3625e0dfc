/// Errors that can occur while decoding a term.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended before the term did.
    #[error("term truncated at offset {offset} ({needed} more bytes needed)")]
    Truncated { offset: usize, needed: usize },

    /// The buffer does not start with the term format version byte.
    #[error("bad version marker {found} (expected 131)")]
    BadVersion { found: u8 },

    /// A tag byte that is not part of the supported term format.
    #[error("unknown term tag {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// A well-formed term of another kind was found where one kind was expected.
    #[error("expected {expected} at offset {offset}, found {found}")]
    UnexpectedTag {
        expected: &'static str,
        found: &'static str,
        offset: usize,
    },

    /// An integer term that does not fit the requested Rust type.
    #[error("integer at offset {offset} does not fit {target}")]
    IntegerOverflow { target: &'static str, offset: usize },

    /// A list whose tail is not the empty list.
    #[error("improper list at offset {offset}")]
    ImproperList { offset: usize },

    /// Atom text that is neither valid UTF-8 nor latin-1 representable.
    #[error("invalid atom text at offset {offset}")]
    BadAtom { offset: usize },

    /// A legacy textual float that does not parse.
    #[error("invalid float text at offset {offset}")]
    BadFloat { offset: usize },

    /// Nested terms beyond the decoder's depth limit.
    #[error("term nesting exceeds {max} levels")]
    TooDeep { max: usize },
}

impl DecodeError {
    /// Whether the error means the byte stream itself is malformed.
    ///
    /// Non-structural errors ([`DecodeError::UnexpectedTag`],
    /// [`DecodeError::IntegerOverflow`]) describe a well-formed term with the
    /// wrong value for the caller.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            DecodeError::UnexpectedTag { .. } | DecodeError::IntegerOverflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
