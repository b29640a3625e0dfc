use s7port_client::{Area, BlockType, DataItem, Param, WordLen};
use s7port_frame::MAX_PAYLOAD;
use s7port_term::{DecodeError, Decoder};

use crate::error::CommandError;
use crate::response::{
    Reason, Response, BINARY_HEADER, LIST_FRAMING, REPLY_ENVELOPE, STATUS_TERM_MAX,
};

/// Largest buffer a handler allocates; `{ok, <<data>>}` must fit one frame.
pub(crate) const MAX_BUFFER: usize = MAX_PAYLOAD - REPLY_ENVELOPE - BINARY_HEADER;

/// Room one batch read entry takes in the reply: its data, or its error map
/// when the PLC refuses the item.
fn batch_entry_len(data_len: usize) -> usize {
    (BINARY_HEADER + data_len).max(STATUS_TERM_MAX)
}

/// Why a handler did not produce a PLC outcome.
#[derive(Debug)]
pub(crate) enum HandlerError {
    /// Answer `{error, reason}` and keep serving.
    Reject(Reason),
    /// Stop the port.
    Fatal(CommandError),
}

impl From<CommandError> for HandlerError {
    fn from(err: CommandError) -> Self {
        HandlerError::Fatal(err)
    }
}

pub(crate) type HandlerResult = Result<Response, HandlerError>;

pub(crate) fn desync(message: impl Into<String>) -> HandlerError {
    HandlerError::Fatal(CommandError::ProtocolDesync(message.into()))
}

fn einval() -> HandlerError {
    HandlerError::Reject(Reason::Einval)
}

/// Classify a decode failure: malformed bytes are fatal, a value of the wrong
/// kind is `einval`.
fn leaf(err: DecodeError) -> HandlerError {
    if err.is_structural() {
        desync(err.to_string())
    } else {
        einval()
    }
}

fn shape(err: DecodeError) -> HandlerError {
    desync(err.to_string())
}

/// Typed reader over a command argument.
pub(crate) struct Args<'a> {
    decoder: Decoder<'a>,
}

impl<'a> Args<'a> {
    pub(crate) fn new(decoder: Decoder<'a>) -> Self {
        Self { decoder }
    }

    /// Require a tuple of exactly `arity` elements.
    pub(crate) fn tuple(&mut self, arity: usize) -> Result<(), HandlerError> {
        let found = self.decoder.decode_tuple_header().map_err(shape)?;
        if found != arity {
            return Err(desync(format!(
                "expected {arity}-tuple argument, found arity {found}"
            )));
        }
        Ok(())
    }

    pub(crate) fn long(&mut self) -> Result<i64, HandlerError> {
        self.decoder.decode_long().map_err(leaf)
    }

    /// An integer narrowed to `T`; out of range is `einval`.
    pub(crate) fn int<T: TryFrom<i64>>(&mut self) -> Result<T, HandlerError> {
        T::try_from(self.long()?).map_err(|_| einval())
    }

    pub(crate) fn binary(&mut self) -> Result<&'a [u8], HandlerError> {
        self.decoder.decode_binary().map_err(leaf)
    }

    /// A binary holding UTF-8 text, such as an IP address.
    pub(crate) fn text(&mut self) -> Result<String, HandlerError> {
        let bytes = self.binary()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| einval())
    }

    pub(crate) fn area(&mut self) -> Result<Area, HandlerError> {
        Area::from_code(self.long()?).ok_or_else(einval)
    }

    pub(crate) fn word_len(&mut self) -> Result<WordLen, HandlerError> {
        WordLen::from_code(self.long()?).ok_or_else(einval)
    }

    pub(crate) fn block_type(&mut self) -> Result<BlockType, HandlerError> {
        BlockType::from_code(self.long()?).ok_or_else(einval)
    }

    pub(crate) fn param(&mut self) -> Result<Param, HandlerError> {
        Param::from_code(self.long()?).ok_or_else(einval)
    }

    /// A buffer size, capped so the reply still fits one frame.
    pub(crate) fn size(&mut self) -> Result<usize, HandlerError> {
        let size: usize = self.int()?;
        if size > MAX_BUFFER {
            return Err(einval());
        }
        Ok(size)
    }

    /// `{count, [item, ...]}` of a batch request.
    ///
    /// `count` must match the list length and every element must be a map.
    /// A read whose reply would not fit one frame is `einval`.
    pub(crate) fn batch(&mut self, with_data: bool) -> Result<Vec<DataItem>, HandlerError> {
        self.tuple(2)?;
        let count: usize = self.int()?;
        let len = self.decoder.decode_list_header().map_err(shape)?;
        if len != count {
            return Err(desync(format!(
                "batch count {count} does not match {len} items"
            )));
        }

        let mut items = Vec::with_capacity(len.min(self.decoder.remaining()));
        let mut reply_len = REPLY_ENVELOPE + LIST_FRAMING;
        for _ in 0..len {
            let item = self.batch_item(with_data)?;
            if !with_data {
                reply_len += batch_entry_len(item.data.len());
                if reply_len > MAX_PAYLOAD {
                    return Err(einval());
                }
            }
            items.push(item);
        }
        if len > 0 {
            self.decoder.decode_list_tail().map_err(shape)?;
        }
        Ok(items)
    }

    fn batch_item(&mut self, with_data: bool) -> Result<DataItem, HandlerError> {
        let pairs = self.decoder.decode_map_header().map_err(shape)?;

        let mut area = None;
        let mut word_len = None;
        let mut db_number = None;
        let mut start = None;
        let mut amount = None;
        let mut data = None;

        for _ in 0..pairs {
            let key = match self.decoder.decode_atom() {
                Ok(key) => key,
                Err(err) if err.is_structural() => return Err(shape(err)),
                Err(_) => {
                    self.skip()?;
                    self.skip()?;
                    continue;
                }
            };
            match key.as_str() {
                "area" => area = Some(self.area()?),
                "word_len" => word_len = Some(self.word_len()?),
                "db_number" => db_number = Some(self.int::<u16>()?),
                "start" => start = Some(self.int::<u32>()?),
                "amount" => amount = Some(self.int::<u32>()?),
                "data" if with_data => data = Some(self.binary()?.to_vec()),
                _ => self.skip()?,
            }
        }

        let missing = || HandlerError::Reject(Reason::Enoent);
        let area = area.ok_or_else(missing)?;
        let word_len = word_len.ok_or_else(missing)?;
        let db_number = db_number.ok_or_else(missing)?;
        let start = start.ok_or_else(missing)?;
        let amount = amount.ok_or_else(missing)?;

        let expected = data_len(word_len, amount)?;

        let data = if with_data {
            let data = data.ok_or_else(missing)?;
            check_len(data.len(), expected)?;
            data
        } else {
            vec![0; expected]
        };

        Ok(DataItem {
            area,
            word_len,
            db_number,
            start,
            amount,
            data,
            result: None,
        })
    }

    fn skip(&mut self) -> Result<(), HandlerError> {
        self.decoder.skip_term().map_err(shape)
    }
}

/// Bytes taken by `amount` elements of `word_len`.
pub(crate) fn data_len(word_len: WordLen, amount: u32) -> Result<usize, HandlerError> {
    word_len
        .buffer_len(amount)
        .filter(|&len| len <= MAX_BUFFER)
        .ok_or_else(einval)
}

/// Zeroed read buffer for `amount` elements of `word_len`.
pub(crate) fn buffer(word_len: WordLen, amount: u32) -> Result<Vec<u8>, HandlerError> {
    Ok(vec![0; data_len(word_len, amount)?])
}

/// Write data must be exactly the size it claims.
pub(crate) fn check_len(actual: usize, expected: usize) -> Result<(), HandlerError> {
    if actual != expected {
        return Err(desync(format!(
            "write data is {actual} bytes, request describes {expected}"
        )));
    }
    Ok(())
}
