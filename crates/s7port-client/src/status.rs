use std::fmt;

/// Library-level error names, indexed from 1 by the top 12 bits of a status.
pub const LIBRARY_ERRORS: [&str; 38] = [
    "errNegotiatingPDU",
    "errCliInvalidParams",
    "errCliJobPending",
    "errCliTooManyItems",
    "errCliInvalidWordLen",
    "errCliPartialDataWritten",
    "errCliSizeOverPDU",
    "errCliInvalidPlcAnswer",
    "errCliAddressOutOfRange",
    "errCliInvalidTransportSize",
    "errCliWriteDataSizeMismatch",
    "errCliItemNotAvailable",
    "errCliInvalidValue",
    "errCliCannotStartPLC",
    "errCliAlreadyRun",
    "errCliCannotStopPLC",
    "errCliCannotCopyRamToRom",
    "errCliCannotCompress",
    "errCliAlreadyStop",
    "errCliFunNotAvailable",
    "errCliUploadSequenceFailed",
    "errCliInvalidDataSizeRecvd",
    "errCliInvalidBlockType",
    "errCliInvalidBlockNumber",
    "errCliInvalidBlockSize",
    "errCliDownloadSequenceFailed",
    "errCliInsertRefused",
    "errCliDeleteRefused",
    "errCliNeedPassword",
    "errCliInvalidPassword",
    "errCliNoPasswordToSetOrClear",
    "errCliJobTimeout",
    "errCliPartialDataRead",
    "errCliBufferTooSmall",
    "errCliFunctionRefused",
    "errCliDestroying",
    "errCliInvalidParamNumber",
    "errCliCannotChangeParam",
];

/// ISO transport error names, indexed from 1 by bits 16..20 of a status.
pub const TRANSPORT_ERRORS: [&str; 15] = [
    "errIsoConnect",
    "errIsoDisconnect",
    "errIsoInvalidPDU",
    "errIsoInvalidDataSize",
    "errIsoNullPointer",
    "errIsoShortPacket",
    "errIsoTooManyFragments",
    "errIsoPduOverflow",
    "errIsoSendPacket",
    "errIsoRecvPacket",
    "errIsoInvalidParams",
    "errIsoResvd_1",
    "errIsoResvd_2",
    "errIsoResvd_3",
    "errIsoResvd_4",
];

/// Result of a single client operation.
pub type S7Result<T> = std::result::Result<T, Status>;

/// A non-zero packed status code returned by a client operation.
///
/// Layout: bits 20..32 index the library error table, bits 16..20 the
/// transport error table, and bits 0..16 carry the socket or OS error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(u32);

impl Status {
    pub const INVALID_PARAMS: Status = Status(0x0020_0000);
    pub const INVALID_WORD_LEN: Status = Status(0x0050_0000);
    pub const ITEM_NOT_AVAILABLE: Status = Status(0x00C0_0000);
    pub const JOB_TIMEOUT: Status = Status(0x0200_0000);
    pub const BUFFER_TOO_SMALL: Status = Status(0x0220_0000);
    pub const INVALID_PARAM_NUMBER: Status = Status(0x0250_0000);

    /// Wrap a raw code. Zero means success and yields `None`.
    pub const fn new(code: u32) -> Option<Self> {
        if code == 0 {
            None
        } else {
            Some(Status(code))
        }
    }

    /// Turn a C return code into a result.
    pub fn check(code: i32) -> S7Result<()> {
        match Status::new(code as u32) {
            None => Ok(()),
            Some(status) => Err(status),
        }
    }

    pub const fn code(self) -> u32 {
        self.0
    }

    pub const fn library_index(self) -> u32 {
        self.0 >> 20
    }

    pub const fn transport_index(self) -> u32 {
        (self.0 >> 16) & 0xF
    }

    pub const fn numeric(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Split into the three named sub-codes. Total over every `u32`.
    pub fn breakdown(self) -> Breakdown {
        let library = match self.library_index() {
            0 => None,
            index => Some(lookup(&LIBRARY_ERRORS, index)),
        };
        let transport = match self.transport_index() {
            0 => None,
            index => Some(lookup(&TRANSPORT_ERRORS, index)),
        };
        let numeric = match self.numeric() {
            0 => None,
            value => Some(value),
        };
        Breakdown {
            library,
            transport,
            numeric,
        }
    }
}

fn lookup(table: &[&'static str], index: u32) -> ErrorName {
    table
        .get(index as usize - 1)
        .map_or(ErrorName::Unlisted(index), |name| ErrorName::Known(*name))
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.breakdown();
        write!(f, "{:#010x} (", self.0)?;
        write_part(f, "es7", parts.library.as_ref().map(|n| n as &dyn fmt::Display))?;
        f.write_str(", ")?;
        write_part(f, "eiso", parts.transport.as_ref().map(|n| n as &dyn fmt::Display))?;
        f.write_str(", ")?;
        write_part(f, "etcp", parts.numeric.as_ref().map(|n| n as &dyn fmt::Display))?;
        f.write_str(")")
    }
}

fn write_part(
    f: &mut fmt::Formatter<'_>,
    key: &str,
    value: Option<&dyn fmt::Display>,
) -> fmt::Result {
    match value {
        Some(value) => write!(f, "{key}={value}"),
        None => write!(f, "{key}=nil"),
    }
}

impl std::error::Error for Status {}

/// A sub-code resolved against its name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorName {
    Known(&'static str),
    /// Index past the end of the table, reported as the raw index.
    Unlisted(u32),
}

impl fmt::Display for ErrorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorName::Known(name) => f.write_str(name),
            ErrorName::Unlisted(index) => write!(f, "{index}"),
        }
    }
}

/// The three parts of a status code; `None` where the part is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakdown {
    pub library: Option<ErrorName>,
    pub transport: Option<ErrorName>,
    pub numeric: Option<u16>,
}
