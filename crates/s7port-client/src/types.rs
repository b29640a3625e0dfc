//! Typed requests and records exchanged with a [`crate::PlcClient`].

/// Connection type used when negotiating with the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    /// Programming device (default).
    Pg,
    /// Operator panel.
    Op,
    S7Basic,
}

impl ConnectionType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0x01 => Some(ConnectionType::Pg),
            0x02 => Some(ConnectionType::Op),
            0x03 => Some(ConnectionType::S7Basic),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            ConnectionType::Pg => 0x01,
            ConnectionType::Op => 0x02,
            ConnectionType::S7Basic => 0x03,
        }
    }
}

/// PLC memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Process inputs (PE).
    Inputs,
    /// Process outputs (PA).
    Outputs,
    /// Merkers (MK).
    Merkers,
    /// Data blocks (DB).
    DataBlock,
    /// Counters (CT).
    Counters,
    /// Timers (TM).
    Timers,
}

impl Area {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0x81 => Some(Area::Inputs),
            0x82 => Some(Area::Outputs),
            0x83 => Some(Area::Merkers),
            0x84 => Some(Area::DataBlock),
            0x1C => Some(Area::Counters),
            0x1D => Some(Area::Timers),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Area::Inputs => 0x81,
            Area::Outputs => 0x82,
            Area::Merkers => 0x83,
            Area::DataBlock => 0x84,
            Area::Counters => 0x1C,
            Area::Timers => 0x1D,
        }
    }
}

/// Element size of an area transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordLen {
    Bit,
    Byte,
    Word,
    DWord,
    Real,
    Counter,
    Timer,
}

impl WordLen {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0x01 => Some(WordLen::Bit),
            0x02 => Some(WordLen::Byte),
            0x04 => Some(WordLen::Word),
            0x06 => Some(WordLen::DWord),
            0x08 => Some(WordLen::Real),
            0x1C => Some(WordLen::Counter),
            0x1D => Some(WordLen::Timer),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            WordLen::Bit => 0x01,
            WordLen::Byte => 0x02,
            WordLen::Word => 0x04,
            WordLen::DWord => 0x06,
            WordLen::Real => 0x08,
            WordLen::Counter => 0x1C,
            WordLen::Timer => 0x1D,
        }
    }

    /// Bytes occupied by one element. A bit travels in a whole byte.
    pub fn byte_width(self) -> usize {
        match self {
            WordLen::Bit | WordLen::Byte => 1,
            WordLen::Word | WordLen::Counter | WordLen::Timer => 2,
            WordLen::DWord | WordLen::Real => 4,
        }
    }

    /// Buffer size for `amount` elements, `None` on overflow.
    pub fn buffer_len(self, amount: u32) -> Option<usize> {
        (amount as usize).checked_mul(self.byte_width())
    }
}

/// Program block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Ob,
    Db,
    Sdb,
    Fc,
    Sfc,
    Fb,
    Sfb,
}

impl BlockType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0x38 => Some(BlockType::Ob),
            0x41 => Some(BlockType::Db),
            0x42 => Some(BlockType::Sdb),
            0x43 => Some(BlockType::Fc),
            0x44 => Some(BlockType::Sfc),
            0x45 => Some(BlockType::Fb),
            0x46 => Some(BlockType::Sfb),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            BlockType::Ob => 0x38,
            BlockType::Db => 0x41,
            BlockType::Sdb => 0x42,
            BlockType::Fc => 0x43,
            BlockType::Sfc => 0x44,
            BlockType::Fb => 0x45,
            BlockType::Sfb => 0x46,
        }
    }
}

/// Client parameter addressed by `get_param`/`set_param`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    RemotePort,
    PingTimeout,
    SendTimeout,
    RecvTimeout,
    SrcRef,
    DstRef,
    SrcTsap,
    PduRequest,
}

impl Param {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(Param::RemotePort),
            3 => Some(Param::PingTimeout),
            4 => Some(Param::SendTimeout),
            5 => Some(Param::RecvTimeout),
            7 => Some(Param::SrcRef),
            8 => Some(Param::DstRef),
            9 => Some(Param::SrcTsap),
            10 => Some(Param::PduRequest),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Param::RemotePort => 2,
            Param::PingTimeout => 3,
            Param::SendTimeout => 4,
            Param::RecvTimeout => 5,
            Param::SrcRef => 7,
            Param::DstRef => 8,
            Param::SrcTsap => 9,
            Param::PduRequest => 10,
        }
    }

    /// Ports, references and TSAPs are 16-bit; the rest are 32-bit signed.
    pub fn is_u16(self) -> bool {
        matches!(
            self,
            Param::RemotePort | Param::SrcRef | Param::DstRef | Param::SrcTsap
        )
    }

    /// Whether `value` fits the parameter's native width.
    pub fn accepts(self, value: i64) -> bool {
        if self.is_u16() {
            u16::try_from(value).is_ok()
        } else {
            i32::try_from(value).is_ok()
        }
    }
}

/// Run state reported by `get_plc_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStatus {
    Unknown,
    Stop,
    Run,
}

impl CpuStatus {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0x00 => Some(CpuStatus::Unknown),
            0x04 => Some(CpuStatus::Stop),
            0x08 => Some(CpuStatus::Run),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            CpuStatus::Unknown => 0x00,
            CpuStatus::Stop => 0x04,
            CpuStatus::Run => 0x08,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CpuStatus::Unknown => "S7CpuStatusUnknown",
            CpuStatus::Stop => "S7CpuStatusStop",
            CpuStatus::Run => "S7CpuStatusRun",
        }
    }
}

/// One variable of a batch read or write.
///
/// `data` is sized `amount * word_len.byte_width()`; reads fill it, writes
/// send it. `result` holds the per-item outcome after the batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    pub area: Area,
    pub word_len: WordLen,
    pub db_number: u16,
    pub start: u32,
    pub amount: u32,
    pub data: Vec<u8>,
    pub result: Option<crate::Status>,
}

impl DataItem {
    /// A read item with a zeroed buffer of the right size.
    pub fn read(area: Area, word_len: WordLen, db_number: u16, start: u32, amount: u32) -> Self {
        let len = word_len.buffer_len(amount).unwrap_or(0);
        Self {
            area,
            word_len,
            db_number,
            start,
            amount,
            data: vec![0; len],
            result: None,
        }
    }

    /// Expected data length for this item.
    pub fn expected_len(&self) -> Option<usize> {
        self.word_len.buffer_len(self.amount)
    }
}

/// Number of blocks of each kind loaded in the CPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlocksList {
    pub ob_count: i32,
    pub fb_count: i32,
    pub fc_count: i32,
    pub sfb_count: i32,
    pub sfc_count: i32,
    pub db_count: i32,
    pub sdb_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_type: i32,
    pub block_number: i32,
    pub block_lang: i32,
    pub block_flags: i32,
    pub mc7_size: i32,
    pub load_size: i32,
    pub local_data: i32,
    pub sbb_length: i32,
    pub checksum: i32,
    pub version: i32,
    pub code_date: String,
    pub intf_date: String,
    pub author: String,
    pub family: String,
    pub header: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderCode {
    pub code: String,
    pub v1: u8,
    pub v2: u8,
    pub v3: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    pub module_type_name: String,
    pub serial_number: String,
    pub as_name: String,
    pub copyright: String,
    pub module_name: String,
}

/// Communication processor limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpInfo {
    pub max_pdu_length: i32,
    pub max_connections: i32,
    pub max_mpi_rate: i32,
    pub max_bus_rate: i32,
}

/// Protection levels, see SZL 0x0232 index 0x0004.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Protection {
    pub sch_schal: u16,
    pub sch_par: u16,
    pub sch_rel: u16,
    pub bart_sch: u16,
    pub anl_sch: u16,
}

/// PLC clock in C `struct tm` convention: `mon` counts from 0, `year` from
/// 1900.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlcDateTime {
    pub sec: i32,
    pub min: i32,
    pub hour: i32,
    pub mday: i32,
    pub mon: i32,
    pub year: i32,
    pub wday: i32,
    pub yday: i32,
    pub isdst: i32,
}

/// A system status list extract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Szl {
    /// Length of one record in bytes.
    pub record_length: u16,
    pub record_count: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PduLength {
    pub requested: i32,
    pub negotiated: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_len_widths() {
        let cases = [
            (0x01, 1),
            (0x02, 1),
            (0x04, 2),
            (0x1C, 2),
            (0x1D, 2),
            (0x06, 4),
            (0x08, 4),
        ];
        for (code, width) in cases {
            let word_len = WordLen::from_code(code).unwrap();
            assert_eq!(word_len.byte_width(), width, "code {code:#x}");
            assert_eq!(i64::from(word_len.code()), code);
        }
        for code in [0x00, 0x03, 0x05, 0x07, 0x09, 0x1E, -1] {
            assert_eq!(WordLen::from_code(code), None);
        }
    }

    #[test]
    fn area_codes() {
        for code in [0x81, 0x82, 0x83, 0x84, 0x1C, 0x1D] {
            assert_eq!(i64::from(Area::from_code(code).unwrap().code()), code);
        }
        assert_eq!(Area::from_code(0x85), None);
    }

    #[test]
    fn block_type_codes() {
        for code in 0x41..=0x46 {
            assert_eq!(i64::from(BlockType::from_code(code).unwrap().code()), code);
        }
        assert_eq!(BlockType::from_code(0x38), Some(BlockType::Ob));
        assert_eq!(BlockType::from_code(0x40), None);
    }

    #[test]
    fn param_widths() {
        assert!(Param::RemotePort.accepts(102));
        assert!(!Param::RemotePort.accepts(70_000));
        assert!(!Param::SrcTsap.accepts(-1));
        assert!(Param::PingTimeout.accepts(-1));
        assert!(!Param::PduRequest.accepts(i64::from(i32::MAX) + 1));
        assert_eq!(Param::from_code(1), None);
        assert_eq!(Param::from_code(6), None);
        assert_eq!(Param::from_code(10).map(Param::code), Some(10));
    }

    #[test]
    fn cpu_status_names() {
        assert_eq!(CpuStatus::from_code(0x08).map(CpuStatus::as_str), Some("S7CpuStatusRun"));
        assert_eq!(CpuStatus::from_code(0x04).map(CpuStatus::as_str), Some("S7CpuStatusStop"));
        assert_eq!(CpuStatus::from_code(0x00).map(CpuStatus::as_str), Some("S7CpuStatusUnknown"));
        assert_eq!(CpuStatus::from_code(0x05), None);
    }

    #[test]
    fn read_item_buffer_sized_by_width() {
        let item = DataItem::read(Area::DataBlock, WordLen::DWord, 1, 0, 3);
        assert_eq!(item.data.len(), 12);
        assert_eq!(item.expected_len(), Some(12));
        assert!(item.result.is_none());
    }
}
