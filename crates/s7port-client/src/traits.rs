use crate::status::S7Result;
use crate::types::{
    Area, BlockInfo, BlockType, BlocksList, ConnectionType, CpInfo, CpuInfo, DataItem, OrderCode,
    Param, PduLength, PlcDateTime, Protection, Szl, WordLen,
};

/// One S7 client session.
///
/// Every method maps to a single client call and reports failure as the
/// call's packed [`crate::Status`]. Implementations own the connection state;
/// callers never gate on it. Buffers passed to reads must already be sized
/// for the request (`amount * word_len.byte_width()`).
///
/// The lean area helpers (`db_read`, `mb_write`, ...) default to
/// [`PlcClient::read_area`] and [`PlcClient::write_area`].
pub trait PlcClient {
    // Connection

    fn set_connection_type(&mut self, connection_type: ConnectionType) -> S7Result<()>;

    fn connect_to(&mut self, address: &str, rack: u16, slot: u16) -> S7Result<()>;

    fn set_connection_params(
        &mut self,
        address: &str,
        local_tsap: u16,
        remote_tsap: u16,
    ) -> S7Result<()>;

    fn connect(&mut self) -> S7Result<()>;

    fn disconnect(&mut self) -> S7Result<()>;

    fn get_param(&mut self, param: Param) -> S7Result<i64>;

    /// `value` has been range-checked with [`Param::accepts`].
    fn set_param(&mut self, param: Param, value: i64) -> S7Result<()>;

    // Data I/O

    fn read_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buf: &mut [u8],
    ) -> S7Result<()>;

    fn write_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        data: &[u8],
    ) -> S7Result<()>;

    fn db_read(&mut self, db_number: u16, start: u32, buf: &mut [u8]) -> S7Result<()> {
        let amount = buf.len() as u32;
        self.read_area(Area::DataBlock, db_number, start, amount, WordLen::Byte, buf)
    }

    fn db_write(&mut self, db_number: u16, start: u32, data: &[u8]) -> S7Result<()> {
        let amount = data.len() as u32;
        self.write_area(Area::DataBlock, db_number, start, amount, WordLen::Byte, data)
    }

    fn ab_read(&mut self, start: u32, buf: &mut [u8]) -> S7Result<()> {
        let amount = buf.len() as u32;
        self.read_area(Area::Outputs, 0, start, amount, WordLen::Byte, buf)
    }

    fn ab_write(&mut self, start: u32, data: &[u8]) -> S7Result<()> {
        let amount = data.len() as u32;
        self.write_area(Area::Outputs, 0, start, amount, WordLen::Byte, data)
    }

    fn eb_read(&mut self, start: u32, buf: &mut [u8]) -> S7Result<()> {
        let amount = buf.len() as u32;
        self.read_area(Area::Inputs, 0, start, amount, WordLen::Byte, buf)
    }

    fn eb_write(&mut self, start: u32, data: &[u8]) -> S7Result<()> {
        let amount = data.len() as u32;
        self.write_area(Area::Inputs, 0, start, amount, WordLen::Byte, data)
    }

    fn mb_read(&mut self, start: u32, buf: &mut [u8]) -> S7Result<()> {
        let amount = buf.len() as u32;
        self.read_area(Area::Merkers, 0, start, amount, WordLen::Byte, buf)
    }

    fn mb_write(&mut self, start: u32, data: &[u8]) -> S7Result<()> {
        let amount = data.len() as u32;
        self.write_area(Area::Merkers, 0, start, amount, WordLen::Byte, data)
    }

    fn tm_read(&mut self, start: u32, amount: u32, buf: &mut [u8]) -> S7Result<()> {
        self.read_area(Area::Timers, 0, start, amount, WordLen::Timer, buf)
    }

    fn tm_write(&mut self, start: u32, amount: u32, data: &[u8]) -> S7Result<()> {
        self.write_area(Area::Timers, 0, start, amount, WordLen::Timer, data)
    }

    fn ct_read(&mut self, start: u32, amount: u32, buf: &mut [u8]) -> S7Result<()> {
        self.read_area(Area::Counters, 0, start, amount, WordLen::Counter, buf)
    }

    fn ct_write(&mut self, start: u32, amount: u32, data: &[u8]) -> S7Result<()> {
        self.write_area(Area::Counters, 0, start, amount, WordLen::Counter, data)
    }

    /// Read several variables in one request. Per-item outcomes land in
    /// [`DataItem::result`]; the returned status covers the request itself.
    fn read_multi_vars(&mut self, items: &mut [DataItem]) -> S7Result<()>;

    fn write_multi_vars(&mut self, items: &mut [DataItem]) -> S7Result<()>;

    // Directory

    fn list_blocks(&mut self) -> S7Result<BlocksList>;

    /// Block numbers of one kind, at most `max_items` of them.
    fn list_blocks_of_type(&mut self, block_type: BlockType, max_items: usize)
        -> S7Result<Vec<u16>>;

    fn get_ag_block_info(&mut self, block_type: BlockType, block_number: u16)
        -> S7Result<BlockInfo>;

    /// Parse the header of a block previously uploaded.
    fn get_pg_block_info(&mut self, block: &[u8]) -> S7Result<BlockInfo>;

    // Blocks

    fn full_upload(
        &mut self,
        block_type: BlockType,
        block_number: u16,
        max_size: usize,
    ) -> S7Result<Vec<u8>>;

    fn upload(
        &mut self,
        block_type: BlockType,
        block_number: u16,
        max_size: usize,
    ) -> S7Result<Vec<u8>>;

    fn download(&mut self, block_number: i32, block: &[u8]) -> S7Result<()>;

    fn delete(&mut self, block_type: BlockType, block_number: u16) -> S7Result<()>;

    fn db_get(&mut self, db_number: u16, max_size: usize) -> S7Result<Vec<u8>>;

    fn db_fill(&mut self, db_number: u16, fill: u8) -> S7Result<()>;

    // Date/time

    fn get_plc_date_time(&mut self) -> S7Result<PlcDateTime>;

    fn set_plc_date_time(&mut self, date_time: &PlcDateTime) -> S7Result<()>;

    /// Set the PLC clock to the host clock.
    fn set_plc_system_date_time(&mut self) -> S7Result<()>;

    // System info

    fn read_szl(&mut self, id: u16, index: u16) -> S7Result<Szl>;

    fn read_szl_list(&mut self) -> S7Result<Vec<u16>>;

    fn get_order_code(&mut self) -> S7Result<OrderCode>;

    fn get_cpu_info(&mut self) -> S7Result<CpuInfo>;

    fn get_cp_info(&mut self) -> S7Result<CpInfo>;

    // PLC control

    fn plc_hot_start(&mut self) -> S7Result<()>;

    fn plc_cold_start(&mut self) -> S7Result<()>;

    fn plc_stop(&mut self) -> S7Result<()>;

    fn copy_ram_to_rom(&mut self, timeout_ms: i32) -> S7Result<()>;

    fn compress(&mut self, timeout_ms: i32) -> S7Result<()>;

    /// Raw run-state code; see [`crate::CpuStatus`].
    fn get_plc_status(&mut self) -> S7Result<i32>;

    // Security

    fn set_session_password(&mut self, password: &[u8]) -> S7Result<()>;

    fn clear_session_password(&mut self) -> S7Result<()>;

    fn get_protection(&mut self) -> S7Result<Protection>;

    // Low level

    /// Exchange a raw S7 PDU; returns the reply PDU.
    fn iso_exchange_buffer(&mut self, pdu: &[u8]) -> S7Result<Vec<u8>>;

    // Diagnostics

    /// Duration of the last job in milliseconds.
    fn get_exec_time(&mut self) -> S7Result<i32>;

    fn get_last_error(&mut self) -> S7Result<i32>;

    fn get_pdu_length(&mut self) -> S7Result<PduLength>;

    fn get_connected(&mut self) -> S7Result<bool>;
}
