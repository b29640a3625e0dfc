use bytes::Bytes;
use s7port_client::status::{LIBRARY_ERRORS, TRANSPORT_ERRORS};
use s7port_client::{
    BlockInfo, BlocksList, CpInfo, CpuInfo, ErrorName, OrderCode, PduLength, PlcDateTime,
    Protection, Status, Szl,
};
use s7port_term::{Encoder, Term};

/// Response tag, version marker, `{ok, _}` tuple header and the `ok` atom.
pub(crate) const REPLY_ENVELOPE: usize = 1 + 1 + 2 + 4;

/// Tag and 32-bit length of a binary.
pub(crate) const BINARY_HEADER: usize = 5;

/// List header and the closing nil.
pub(crate) const LIST_FRAMING: usize = 5 + 1;

/// Upper bound on an encoded `{error, %{es7, eiso, etcp}}`.
pub(crate) const STATUS_TERM_MAX: usize = 2 // tuple header
    + 7 // error
    + 5 // map header
    + 5 + name_max(&LIBRARY_ERRORS)
    + 6 + name_max(&TRANSPORT_ERRORS)
    + 6 + 5;

/// Largest encoding of a table entry, of the integer index standing in for
/// an unlisted one, or of `nil`.
const fn name_max(table: &[&str]) -> usize {
    let mut max = 5;
    let mut i = 0;
    while i < table.len() {
        if 2 + table[i].len() > max {
            max = 2 + table[i].len();
        }
        i += 1;
    }
    max
}

/// Reason atom of an `{error, reason}` reply for a rejected argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// A value of the wrong kind or out of range.
    Einval,
    /// A required batch item key is missing.
    Enoent,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Einval => "einval",
            Reason::Enoent => "enoent",
        }
    }
}

/// The outcome of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `ok`
    Ok,
    /// `{ok, value}`
    Value(Reply),
    /// `{error, reason}`
    Error(Reason),
    /// `{error, %{es7, eiso, etcp}}`
    Status(Status),
}

/// Payload of an `{ok, value}` reply.
///
/// Strings inside records travel as binaries with trailing NULs removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Int(i64),
    Bytes(Vec<u8>),
    Atom(&'static str),
    Bool(bool),
    /// Per-item data of a batch read, or that item's error.
    BatchItems(Vec<Result<Vec<u8>, Status>>),
    Words(Vec<u16>),
    BlockCounts(BlocksList),
    BlockInfo(BlockInfo),
    OrderCode(OrderCode),
    CpuInfo(CpuInfo),
    CpInfo(CpInfo),
    /// Native clock; encoded with a 1-based month and an absolute year.
    DateTime(PlcDateTime),
    Protection(Protection),
    Szl(Szl),
    PduLength(PduLength),
}

impl Response {
    pub fn to_term(&self) -> Term {
        match self {
            Response::Ok => Term::atom("ok"),
            Response::Value(reply) => Term::Tuple(vec![Term::atom("ok"), reply.to_term()]),
            Response::Error(reason) => {
                Term::Tuple(vec![Term::atom("error"), Term::atom(reason.as_str())])
            }
            Response::Status(status) => status_term(*status),
        }
    }

    /// Encode as a version-prefixed term, ready to follow the response tag.
    pub fn encode(&self) -> Bytes {
        let mut encoder = Encoder::new();
        encoder.encode_version();
        encoder.encode_term(&self.to_term());
        encoder.into_bytes()
    }
}

/// `{error, %{es7, eiso, etcp}}` for a failed call.
pub fn status_term(status: Status) -> Term {
    Term::Tuple(vec![Term::atom("error"), error_map(status)])
}

/// The `%{es7, eiso, etcp}` breakdown of a status.
pub fn error_map(status: Status) -> Term {
    let parts = status.breakdown();
    Term::atom_map([
        ("es7", Term::or_nil(parts.library.map(name_term))),
        ("eiso", Term::or_nil(parts.transport.map(name_term))),
        ("etcp", Term::or_nil(parts.numeric.map(|n| Term::Integer(i64::from(n))))),
    ])
}

fn name_term(name: ErrorName) -> Term {
    match name {
        ErrorName::Known(name) => Term::atom(name),
        ErrorName::Unlisted(index) => Term::Integer(i64::from(index)),
    }
}

fn int(value: impl Into<i64>) -> Term {
    Term::Integer(value.into())
}

fn text(value: &str) -> Term {
    Term::binary(value.trim_end_matches('\0').as_bytes())
}

impl Reply {
    pub fn to_term(&self) -> Term {
        match self {
            Reply::Int(value) => int(*value),
            Reply::Bytes(bytes) => Term::binary(bytes.as_slice()),
            Reply::Atom(name) => Term::atom(*name),
            Reply::Bool(value) => Term::boolean(*value),
            Reply::BatchItems(items) => Term::List(
                items
                    .iter()
                    .map(|item| match item {
                        Ok(data) => Term::binary(data.as_slice()),
                        Err(status) => status_term(*status),
                    })
                    .collect(),
            ),
            Reply::Words(words) => Term::List(words.iter().map(|&w| int(w)).collect()),
            Reply::BlockCounts(counts) => Term::atom_map([
                ("ob_count", int(counts.ob_count)),
                ("fb_count", int(counts.fb_count)),
                ("fc_count", int(counts.fc_count)),
                ("sfb_count", int(counts.sfb_count)),
                ("sfc_count", int(counts.sfc_count)),
                ("db_count", int(counts.db_count)),
                ("sdb_count", int(counts.sdb_count)),
            ]),
            Reply::BlockInfo(info) => Term::atom_map([
                ("block_type", int(info.block_type)),
                ("block_number", int(info.block_number)),
                ("block_lang", int(info.block_lang)),
                ("block_flags", int(info.block_flags)),
                ("mc7_size", int(info.mc7_size)),
                ("load_size", int(info.load_size)),
                ("local_data", int(info.local_data)),
                ("sbb_length", int(info.sbb_length)),
                ("checksum", int(info.checksum)),
                ("version", int(info.version)),
                ("code_date", text(&info.code_date)),
                ("intf_date", text(&info.intf_date)),
                ("author", text(&info.author)),
                ("family", text(&info.family)),
                ("header", text(&info.header)),
            ]),
            Reply::OrderCode(order) => Term::atom_map([
                ("code", text(&order.code)),
                ("v1", int(order.v1)),
                ("v2", int(order.v2)),
                ("v3", int(order.v3)),
            ]),
            Reply::CpuInfo(info) => Term::atom_map([
                ("module_type_name", text(&info.module_type_name)),
                ("serial_number", text(&info.serial_number)),
                ("as_name", text(&info.as_name)),
                ("copyright", text(&info.copyright)),
                ("module_name", text(&info.module_name)),
            ]),
            Reply::CpInfo(info) => Term::atom_map([
                ("max_pdu_length", int(info.max_pdu_length)),
                ("max_connections", int(info.max_connections)),
                ("max_mpi_rate", int(info.max_mpi_rate)),
                ("max_bus_rate", int(info.max_bus_rate)),
            ]),
            Reply::DateTime(dt) => Term::atom_map([
                ("sec", int(dt.sec)),
                ("min", int(dt.min)),
                ("hour", int(dt.hour)),
                ("mday", int(dt.mday)),
                ("mon", int(i64::from(dt.mon) + 1)),
                ("year", int(i64::from(dt.year) + 1900)),
                ("wday", int(dt.wday)),
                ("yday", int(dt.yday)),
                ("isdst", int(dt.isdst)),
            ]),
            Reply::Protection(p) => Term::atom_map([
                ("sch_schal", int(p.sch_schal)),
                ("sch_par", int(p.sch_par)),
                ("sch_rel", int(p.sch_rel)),
                ("bart_sch", int(p.bart_sch)),
                ("anl_sch", int(p.anl_sch)),
            ]),
            Reply::Szl(szl) => Term::atom_map([
                ("record_length", int(szl.record_length)),
                ("record_count", int(szl.record_count)),
                ("data", Term::binary(szl.data.as_slice())),
            ]),
            Reply::PduLength(pdu) => Term::Tuple(vec![int(pdu.requested), int(pdu.negotiated)]),
        }
    }
}
