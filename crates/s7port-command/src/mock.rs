//! Scripted [`PlcClient`] for tests. Also compiled into `tests/` by path.
#![allow(dead_code)]

use s7port_client::{
    Area, BlockInfo, BlockType, BlocksList, ConnectionType, CpInfo, CpuInfo, DataItem, OrderCode,
    Param, PduLength, PlcClient, PlcDateTime, Protection, S7Result, Status, Szl, WordLen,
};

/// Records every call and answers with canned data.
///
/// When `fail` is set every call returns that status. Reads fill their
/// buffer with the byte index (`0, 1, 2, ...`).
#[derive(Debug, Default)]
pub struct MockClient {
    pub calls: Vec<String>,
    pub fail: Option<Status>,
    pub plc_status: i32,
    pub date_time: PlcDateTime,
    /// Per-item outcomes applied by batch calls, by position.
    pub item_results: Vec<Option<Status>>,
    /// Buffer length of each item seen by the last batch call.
    pub batch_sizes: Vec<usize>,
    /// Data of the last write.
    pub written: Vec<u8>,
}

impl MockClient {
    pub fn failing(status: Status) -> Self {
        Self {
            fail: Some(status),
            ..Self::default()
        }
    }

    fn call(&mut self, entry: String) -> S7Result<()> {
        self.calls.push(entry);
        match self.fail {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn batch(&mut self, name: &str, items: &mut [DataItem]) -> S7Result<()> {
        self.call(format!("{name} {}", items.len()))?;
        self.batch_sizes = items.iter().map(|item| item.data.len()).collect();
        for (index, item) in items.iter_mut().enumerate() {
            item.result = self.item_results.get(index).copied().flatten();
        }
        Ok(())
    }
}

fn fill(buf: &mut [u8]) {
    for (index, byte) in buf.iter_mut().enumerate() {
        *byte = index as u8;
    }
}

impl PlcClient for MockClient {
    fn set_connection_type(&mut self, connection_type: ConnectionType) -> S7Result<()> {
        self.call(format!("set_connection_type {}", connection_type.code()))
    }

    fn connect_to(&mut self, address: &str, rack: u16, slot: u16) -> S7Result<()> {
        self.call(format!("connect_to {address} {rack} {slot}"))
    }

    fn set_connection_params(
        &mut self,
        address: &str,
        local_tsap: u16,
        remote_tsap: u16,
    ) -> S7Result<()> {
        self.call(format!(
            "set_connection_params {address} {local_tsap:#06x} {remote_tsap:#06x}"
        ))
    }

    fn connect(&mut self) -> S7Result<()> {
        self.call("connect".into())
    }

    fn disconnect(&mut self) -> S7Result<()> {
        self.call("disconnect".into())
    }

    fn get_param(&mut self, param: Param) -> S7Result<i64> {
        self.call(format!("get_param {param:?}"))?;
        Ok(i64::from(param.code()) * 100)
    }

    fn set_param(&mut self, param: Param, value: i64) -> S7Result<()> {
        self.call(format!("set_param {param:?} {value}"))
    }

    fn read_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buf: &mut [u8],
    ) -> S7Result<()> {
        self.call(format!(
            "read_area {area:?} {db_number} {start} {amount} {word_len:?}"
        ))?;
        fill(buf);
        Ok(())
    }

    fn write_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        data: &[u8],
    ) -> S7Result<()> {
        self.call(format!(
            "write_area {area:?} {db_number} {start} {amount} {word_len:?}"
        ))?;
        self.written = data.to_vec();
        Ok(())
    }

    fn read_multi_vars(&mut self, items: &mut [DataItem]) -> S7Result<()> {
        self.batch("read_multi_vars", items)?;
        for item in items.iter_mut().filter(|item| item.result.is_none()) {
            fill(&mut item.data);
        }
        Ok(())
    }

    fn write_multi_vars(&mut self, items: &mut [DataItem]) -> S7Result<()> {
        self.batch("write_multi_vars", items)
    }

    fn list_blocks(&mut self) -> S7Result<BlocksList> {
        self.call("list_blocks".into())?;
        Ok(BlocksList {
            ob_count: 3,
            fb_count: 2,
            fc_count: 5,
            sfb_count: 0,
            sfc_count: 40,
            db_count: 7,
            sdb_count: 1,
        })
    }

    fn list_blocks_of_type(
        &mut self,
        block_type: BlockType,
        max_items: usize,
    ) -> S7Result<Vec<u16>> {
        self.call(format!("list_blocks_of_type {block_type:?} {max_items}"))?;
        Ok((1..=max_items.min(3) as u16).collect())
    }

    fn get_ag_block_info(
        &mut self,
        block_type: BlockType,
        block_number: u16,
    ) -> S7Result<BlockInfo> {
        self.call(format!("get_ag_block_info {block_type:?} {block_number}"))?;
        Ok(BlockInfo {
            block_type: block_type.code(),
            block_number: i32::from(block_number),
            author: "ACME".into(),
            ..BlockInfo::default()
        })
    }

    fn get_pg_block_info(&mut self, block: &[u8]) -> S7Result<BlockInfo> {
        self.call(format!("get_pg_block_info {}", block.len()))?;
        Ok(BlockInfo {
            load_size: block.len() as i32,
            ..BlockInfo::default()
        })
    }

    fn full_upload(
        &mut self,
        block_type: BlockType,
        block_number: u16,
        max_size: usize,
    ) -> S7Result<Vec<u8>> {
        self.call(format!("full_upload {block_type:?} {block_number} {max_size}"))?;
        Ok(vec![0x70; max_size.min(4)])
    }

    fn upload(
        &mut self,
        block_type: BlockType,
        block_number: u16,
        max_size: usize,
    ) -> S7Result<Vec<u8>> {
        self.call(format!("upload {block_type:?} {block_number} {max_size}"))?;
        Ok(vec![0x70; max_size.min(2)])
    }

    fn download(&mut self, block_number: i32, block: &[u8]) -> S7Result<()> {
        self.call(format!("download {block_number} {}", block.len()))
    }

    fn delete(&mut self, block_type: BlockType, block_number: u16) -> S7Result<()> {
        self.call(format!("delete {block_type:?} {block_number}"))
    }

    fn db_get(&mut self, db_number: u16, max_size: usize) -> S7Result<Vec<u8>> {
        self.call(format!("db_get {db_number} {max_size}"))?;
        let mut data = vec![0; max_size.min(8)];
        fill(&mut data);
        Ok(data)
    }

    fn db_fill(&mut self, db_number: u16, fill: u8) -> S7Result<()> {
        self.call(format!("db_fill {db_number} {fill}"))
    }

    fn get_plc_date_time(&mut self) -> S7Result<PlcDateTime> {
        self.call("get_plc_date_time".into())?;
        Ok(self.date_time)
    }

    fn set_plc_date_time(&mut self, date_time: &PlcDateTime) -> S7Result<()> {
        self.call("set_plc_date_time".into())?;
        self.date_time = *date_time;
        Ok(())
    }

    fn set_plc_system_date_time(&mut self) -> S7Result<()> {
        self.call("set_plc_system_date_time".into())
    }

    fn read_szl(&mut self, id: u16, index: u16) -> S7Result<Szl> {
        self.call(format!("read_szl {id:#06x} {index:#06x}"))?;
        Ok(Szl {
            record_length: 2,
            record_count: 2,
            data: vec![0x00, 0x11, 0x01, 0x11],
        })
    }

    fn read_szl_list(&mut self) -> S7Result<Vec<u16>> {
        self.call("read_szl_list".into())?;
        Ok(vec![0x0011, 0x0111, 0x0424])
    }

    fn get_order_code(&mut self) -> S7Result<OrderCode> {
        self.call("get_order_code".into())?;
        Ok(OrderCode {
            code: "6ES7 315-2EH14-0AB0 ".into(),
            v1: 3,
            v2: 2,
            v3: 6,
        })
    }

    fn get_cpu_info(&mut self) -> S7Result<CpuInfo> {
        self.call("get_cpu_info".into())?;
        Ok(CpuInfo {
            module_type_name: "CPU 315-2 PN/DP".into(),
            serial_number: "S C-C2UR28922012".into(),
            as_name: "SNAP7-SERVER".into(),
            copyright: "Original Siemens Equipment".into(),
            module_name: "CPU 315-2 PN/DP".into(),
        })
    }

    fn get_cp_info(&mut self) -> S7Result<CpInfo> {
        self.call("get_cp_info".into())?;
        Ok(CpInfo {
            max_pdu_length: 240,
            max_connections: 16,
            max_mpi_rate: 187,
            max_bus_rate: 0,
        })
    }

    fn plc_hot_start(&mut self) -> S7Result<()> {
        self.call("plc_hot_start".into())
    }

    fn plc_cold_start(&mut self) -> S7Result<()> {
        self.call("plc_cold_start".into())
    }

    fn plc_stop(&mut self) -> S7Result<()> {
        self.call("plc_stop".into())
    }

    fn copy_ram_to_rom(&mut self, timeout_ms: i32) -> S7Result<()> {
        self.call(format!("copy_ram_to_rom {timeout_ms}"))
    }

    fn compress(&mut self, timeout_ms: i32) -> S7Result<()> {
        self.call(format!("compress {timeout_ms}"))
    }

    fn get_plc_status(&mut self) -> S7Result<i32> {
        self.call("get_plc_status".into())?;
        Ok(self.plc_status)
    }

    fn set_session_password(&mut self, password: &[u8]) -> S7Result<()> {
        self.call(format!(
            "set_session_password {}",
            String::from_utf8_lossy(password)
        ))
    }

    fn clear_session_password(&mut self) -> S7Result<()> {
        self.call("clear_session_password".into())
    }

    fn get_protection(&mut self) -> S7Result<Protection> {
        self.call("get_protection".into())?;
        Ok(Protection {
            sch_schal: 1,
            sch_par: 0,
            sch_rel: 1,
            bart_sch: 2,
            anl_sch: 0,
        })
    }

    fn iso_exchange_buffer(&mut self, pdu: &[u8]) -> S7Result<Vec<u8>> {
        self.call(format!("iso_exchange_buffer {}", pdu.len()))?;
        Ok(pdu.iter().rev().copied().collect())
    }

    fn get_exec_time(&mut self) -> S7Result<i32> {
        self.call("get_exec_time".into())?;
        Ok(12)
    }

    fn get_last_error(&mut self) -> S7Result<i32> {
        self.call("get_last_error".into())?;
        Ok(0)
    }

    fn get_pdu_length(&mut self) -> S7Result<PduLength> {
        self.call("get_pdu_length".into())?;
        Ok(PduLength {
            requested: 480,
            negotiated: 240,
        })
    }

    fn get_connected(&mut self) -> S7Result<bool> {
        self.call("get_connected".into())?;
        Ok(true)
    }
}
