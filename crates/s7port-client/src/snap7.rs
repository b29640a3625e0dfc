//! [`PlcClient`] over the Snap7 C library.
//!
//! The library is opened with `dlopen` when the client is created, so the
//! binary builds and starts without it and reports a clean error when it is
//! missing. Every entry point is resolved up front; a library lacking any of
//! them is rejected before a client handle is created.

use std::ffi::{c_void, CStr, CString};
use std::mem;

use libc::c_int;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::status::{S7Result, Status};
use crate::traits::PlcClient;
use crate::types::{
    Area, BlockInfo, BlockType, BlocksList, ConnectionType, CpInfo, CpuInfo, DataItem, OrderCode,
    Param, PduLength, PlcDateTime, Protection, Szl, WordLen,
};

/// Library name tried when no path is configured.
pub const DEFAULT_LIBRARY: &str = if cfg!(target_os = "macos") {
    "libsnap7.dylib"
} else {
    "libsnap7.so"
};

/// Smallest reply buffer handed to `Cli_IsoExchangeBuffer`.
const ISO_BUFFER_MIN: usize = 4096;

/// Capacity of the block number list filled by `Cli_ListBlocksOfType`.
const BLOCK_LIST_CAPACITY: usize = 0x2000;

const SZL_DATA_LEN: usize = 0x4000 - 4;
const SZL_LIST_LEN: usize = 0x2000 - 2;

type S7Object = usize;

#[repr(C)]
struct TS7DataItem {
    area: c_int,
    word_len: c_int,
    result: c_int,
    db_number: c_int,
    start: c_int,
    amount: c_int,
    pdata: *mut c_void,
}

#[repr(C)]
#[derive(Default)]
struct TS7BlocksList {
    ob_count: c_int,
    fb_count: c_int,
    fc_count: c_int,
    sfb_count: c_int,
    sfc_count: c_int,
    db_count: c_int,
    sdb_count: c_int,
}

#[repr(C)]
#[derive(Default)]
struct TS7BlockInfo {
    block_type: c_int,
    block_number: c_int,
    block_lang: c_int,
    block_flags: c_int,
    mc7_size: c_int,
    load_size: c_int,
    local_data: c_int,
    sbb_length: c_int,
    checksum: c_int,
    version: c_int,
    code_date: [u8; 11],
    intf_date: [u8; 11],
    author: [u8; 9],
    family: [u8; 9],
    header: [u8; 9],
}

#[repr(C)]
#[derive(Default)]
struct TS7OrderCode {
    code: [u8; 21],
    v1: u8,
    v2: u8,
    v3: u8,
}

#[repr(C)]
struct TS7CpuInfo {
    module_type_name: [u8; 33],
    serial_number: [u8; 25],
    as_name: [u8; 25],
    copyright: [u8; 27],
    module_name: [u8; 25],
}

#[repr(C)]
#[derive(Default)]
struct TS7CpInfo {
    max_pdu_length: c_int,
    max_connections: c_int,
    max_mpi_rate: c_int,
    max_bus_rate: c_int,
}

#[repr(C)]
#[derive(Default)]
struct TS7Protection {
    sch_schal: u16,
    sch_par: u16,
    sch_rel: u16,
    bart_sch: u16,
    anl_sch: u16,
}

#[repr(C)]
struct TS7SZL {
    record_length: u16,
    record_count: u16,
    data: [u8; SZL_DATA_LEN],
}

#[repr(C)]
struct TS7SZLList {
    record_length: u16,
    record_count: u16,
    list: [u16; SZL_LIST_LEN],
}

/// Declares the entry point table and its loader.
macro_rules! snap7_api {
    ($($field:ident = $symbol:literal: fn($($arg:ty),* $(,)?) $(-> $ret:ty)?;)+) => {
        struct Api {
            $($field: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)+
        }

        impl Api {
            fn load(library: &Library) -> Result<Self> {
                Ok(Self {
                    $($field: {
                        let ptr = library.symbol($symbol)?;
                        // SAFETY: `ptr` is the non-null address of the named Snap7 export,
                        // whose C signature is the one declared in this table.
                        unsafe {
                            mem::transmute::<*mut c_void, unsafe extern "C" fn($($arg),*) $(-> $ret)?>(ptr)
                        }
                    },)+
                })
            }
        }

        /// Entry points resolved when a client is opened.
        pub const SYMBOLS: &[&str] = &[$($symbol),+];
    };
}

snap7_api! {
    create = "Cli_Create": fn() -> S7Object;
    destroy = "Cli_Destroy": fn(*mut S7Object);
    set_connection_type = "Cli_SetConnectionType": fn(S7Object, u16) -> c_int;
    connect_to = "Cli_ConnectTo": fn(S7Object, *const libc::c_char, c_int, c_int) -> c_int;
    set_connection_params =
        "Cli_SetConnectionParams": fn(S7Object, *const libc::c_char, u16, u16) -> c_int;
    connect = "Cli_Connect": fn(S7Object) -> c_int;
    disconnect = "Cli_Disconnect": fn(S7Object) -> c_int;
    get_param = "Cli_GetParam": fn(S7Object, c_int, *mut c_void) -> c_int;
    set_param = "Cli_SetParam": fn(S7Object, c_int, *mut c_void) -> c_int;
    read_area = "Cli_ReadArea": fn(S7Object, c_int, c_int, c_int, c_int, c_int, *mut c_void) -> c_int;
    write_area = "Cli_WriteArea": fn(S7Object, c_int, c_int, c_int, c_int, c_int, *mut c_void) -> c_int;
    read_multi_vars = "Cli_ReadMultiVars": fn(S7Object, *mut TS7DataItem, c_int) -> c_int;
    write_multi_vars = "Cli_WriteMultiVars": fn(S7Object, *mut TS7DataItem, c_int) -> c_int;
    list_blocks = "Cli_ListBlocks": fn(S7Object, *mut TS7BlocksList) -> c_int;
    list_blocks_of_type = "Cli_ListBlocksOfType": fn(S7Object, c_int, *mut u16, *mut c_int) -> c_int;
    get_ag_block_info = "Cli_GetAgBlockInfo": fn(S7Object, c_int, c_int, *mut TS7BlockInfo) -> c_int;
    get_pg_block_info = "Cli_GetPgBlockInfo": fn(S7Object, *mut c_void, *mut TS7BlockInfo, c_int) -> c_int;
    full_upload = "Cli_FullUpload": fn(S7Object, c_int, c_int, *mut c_void, *mut c_int) -> c_int;
    upload = "Cli_Upload": fn(S7Object, c_int, c_int, *mut c_void, *mut c_int) -> c_int;
    download = "Cli_Download": fn(S7Object, c_int, *mut c_void, c_int) -> c_int;
    delete = "Cli_Delete": fn(S7Object, c_int, c_int) -> c_int;
    db_get = "Cli_DBGet": fn(S7Object, c_int, *mut c_void, *mut c_int) -> c_int;
    db_fill = "Cli_DBFill": fn(S7Object, c_int, c_int) -> c_int;
    get_plc_date_time = "Cli_GetPlcDateTime": fn(S7Object, *mut libc::tm) -> c_int;
    set_plc_date_time = "Cli_SetPlcDateTime": fn(S7Object, *mut libc::tm) -> c_int;
    set_plc_system_date_time = "Cli_SetPlcSystemDateTime": fn(S7Object) -> c_int;
    read_szl = "Cli_ReadSZL": fn(S7Object, c_int, c_int, *mut TS7SZL, *mut c_int) -> c_int;
    read_szl_list = "Cli_ReadSZLList": fn(S7Object, *mut TS7SZLList, *mut c_int) -> c_int;
    get_order_code = "Cli_GetOrderCode": fn(S7Object, *mut TS7OrderCode) -> c_int;
    get_cpu_info = "Cli_GetCpuInfo": fn(S7Object, *mut TS7CpuInfo) -> c_int;
    get_cp_info = "Cli_GetCpInfo": fn(S7Object, *mut TS7CpInfo) -> c_int;
    plc_hot_start = "Cli_PlcHotStart": fn(S7Object) -> c_int;
    plc_cold_start = "Cli_PlcColdStart": fn(S7Object) -> c_int;
    plc_stop = "Cli_PlcStop": fn(S7Object) -> c_int;
    copy_ram_to_rom = "Cli_CopyRamToRom": fn(S7Object, c_int) -> c_int;
    compress = "Cli_Compress": fn(S7Object, c_int) -> c_int;
    get_plc_status = "Cli_GetPlcStatus": fn(S7Object, *mut c_int) -> c_int;
    set_session_password = "Cli_SetSessionPassword": fn(S7Object, *mut libc::c_char) -> c_int;
    clear_session_password = "Cli_ClearSessionPassword": fn(S7Object) -> c_int;
    get_protection = "Cli_GetProtection": fn(S7Object, *mut TS7Protection) -> c_int;
    iso_exchange_buffer = "Cli_IsoExchangeBuffer": fn(S7Object, *mut c_void, *mut c_int) -> c_int;
    get_exec_time = "Cli_GetExecTime": fn(S7Object, *mut c_int) -> c_int;
    get_last_error = "Cli_GetLastError": fn(S7Object, *mut c_int) -> c_int;
    get_pdu_length = "Cli_GetPduLength": fn(S7Object, *mut c_int, *mut c_int) -> c_int;
    get_connected = "Cli_GetConnected": fn(S7Object, *mut c_int) -> c_int;
}

/// An open `dlopen` handle, closed on drop.
struct Library {
    handle: *mut c_void,
    path: String,
}

impl Library {
    fn open(path: &str) -> Result<Self> {
        let load_error = |message: String| ClientError::LibraryLoad {
            path: path.to_string(),
            message,
        };
        let c_path = CString::new(path).map_err(|_| load_error("path contains NUL".into()))?;

        // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(load_error(last_dl_error()));
        }

        Ok(Self {
            handle,
            path: path.to_string(),
        })
    }

    fn symbol(&self, name: &'static str) -> Result<*mut c_void> {
        let c_name = CString::new(name).map_err(|_| ClientError::MissingSymbol(name))?;
        // SAFETY: `handle` is a live handle from `dlopen` and `c_name` is NUL-terminated.
        let ptr = unsafe { libc::dlsym(self.handle, c_name.as_ptr()) };
        if ptr.is_null() {
            return Err(ClientError::MissingSymbol(name));
        }
        Ok(ptr)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        // SAFETY: `handle` came from a successful `dlopen` and is closed exactly once.
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

fn last_dl_error() -> String {
    // SAFETY: `dlerror` returns null or a pointer to a NUL-terminated string
    // that stays valid until the next dl* call on this thread.
    let message = unsafe { libc::dlerror() };
    if message.is_null() {
        return "unknown dlopen error".to_string();
    }
    // SAFETY: checked non-null above.
    unsafe { CStr::from_ptr(message) }
        .to_string_lossy()
        .into_owned()
}

/// A Snap7 client handle together with the library that created it.
pub struct Snap7Client {
    handle: S7Object,
    api: Api,
    library: Library,
}

impl Snap7Client {
    /// Load the library at `path` (or [`DEFAULT_LIBRARY`]) and create a client.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_LIBRARY);
        let library = Library::open(path)?;
        let api = Api::load(&library)?;

        // SAFETY: `create` is the resolved `Cli_Create`, which takes no arguments.
        let handle = unsafe { (api.create)() };
        if handle == 0 {
            return Err(ClientError::CreateFailed);
        }

        debug!(path, symbols = SYMBOLS.len(), "snap7 client created");
        Ok(Self {
            handle,
            api,
            library,
        })
    }

    /// Path the library was loaded from.
    pub fn library_path(&self) -> &str {
        &self.library.path
    }

    fn get_int(&self, call: unsafe extern "C" fn(S7Object, *mut c_int) -> c_int) -> S7Result<i32> {
        let mut value: c_int = 0;
        // SAFETY: `value` is a valid writable int for the duration of the call.
        Status::check(unsafe { call(self.handle, &mut value) })?;
        Ok(value)
    }

    fn run(&self, call: unsafe extern "C" fn(S7Object) -> c_int) -> S7Result<()> {
        // SAFETY: the call only takes the live client handle.
        Status::check(unsafe { call(self.handle) })
    }

    fn fetch_block(
        &self,
        call: unsafe extern "C" fn(S7Object, c_int, c_int, *mut c_void, *mut c_int) -> c_int,
        block_type: BlockType,
        block_number: u16,
        max_size: usize,
    ) -> S7Result<Vec<u8>> {
        let mut buf = vec![0u8; max_size];
        let mut size = int(max_size)?;
        // SAFETY: `buf` holds `size` writable bytes and the library never writes more.
        let rc = unsafe {
            call(
                self.handle,
                block_type.code(),
                c_int::from(block_number),
                buf.as_mut_ptr().cast(),
                &mut size,
            )
        };
        Status::check(rc)?;
        truncate(&mut buf, size);
        Ok(buf)
    }
}

impl Drop for Snap7Client {
    fn drop(&mut self) {
        // SAFETY: `handle` was returned by `Cli_Create` and is destroyed exactly once.
        unsafe { (self.api.destroy)(&mut self.handle) };
        debug!("snap7 client destroyed");
    }
}

impl std::fmt::Debug for Snap7Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snap7Client")
            .field("handle", &self.handle)
            .field("library", &self.library.path)
            .finish()
    }
}

fn int<T: TryInto<c_int>>(value: T) -> S7Result<c_int> {
    value.try_into().map_err(|_| Status::INVALID_PARAMS)
}

fn c_string(value: &[u8]) -> S7Result<CString> {
    CString::new(value).map_err(|_| Status::INVALID_PARAMS)
}

/// Shrink `buf` to the length reported by the library.
fn truncate(buf: &mut Vec<u8>, size: c_int) {
    let len = usize::try_from(size).unwrap_or(0).min(buf.len());
    buf.truncate(len);
}

/// Text of a fixed-width C char field, up to the first NUL.
fn c_text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn ensure_len(buf_len: usize, amount: u32, word_len: WordLen) -> S7Result<()> {
    match word_len.buffer_len(amount) {
        Some(needed) if needed <= buf_len => Ok(()),
        _ => Err(Status::BUFFER_TOO_SMALL),
    }
}

fn raw_item(item: &mut DataItem) -> S7Result<TS7DataItem> {
    ensure_len(item.data.len(), item.amount, item.word_len)?;
    Ok(TS7DataItem {
        area: item.area.code(),
        word_len: item.word_len.code(),
        result: 0,
        db_number: c_int::from(item.db_number),
        start: int(item.start)?,
        amount: int(item.amount)?,
        pdata: item.data.as_mut_ptr().cast(),
    })
}

impl From<TS7BlockInfo> for BlockInfo {
    fn from(raw: TS7BlockInfo) -> Self {
        Self {
            block_type: raw.block_type,
            block_number: raw.block_number,
            block_lang: raw.block_lang,
            block_flags: raw.block_flags,
            mc7_size: raw.mc7_size,
            load_size: raw.load_size,
            local_data: raw.local_data,
            sbb_length: raw.sbb_length,
            checksum: raw.checksum,
            version: raw.version,
            code_date: c_text(&raw.code_date),
            intf_date: c_text(&raw.intf_date),
            author: c_text(&raw.author),
            family: c_text(&raw.family),
            header: c_text(&raw.header),
        }
    }
}

fn to_tm(value: &PlcDateTime) -> libc::tm {
    // SAFETY: `tm` is plain old data; all-zero is a valid value (null `tm_zone` included).
    let mut tm: libc::tm = unsafe { mem::zeroed() };
    tm.tm_sec = value.sec;
    tm.tm_min = value.min;
    tm.tm_hour = value.hour;
    tm.tm_mday = value.mday;
    tm.tm_mon = value.mon;
    tm.tm_year = value.year;
    tm.tm_wday = value.wday;
    tm.tm_yday = value.yday;
    tm.tm_isdst = value.isdst;
    tm
}

fn from_tm(tm: &libc::tm) -> PlcDateTime {
    PlcDateTime {
        sec: tm.tm_sec,
        min: tm.tm_min,
        hour: tm.tm_hour,
        mday: tm.tm_mday,
        mon: tm.tm_mon,
        year: tm.tm_year,
        wday: tm.tm_wday,
        yday: tm.tm_yday,
        isdst: tm.tm_isdst,
    }
}

impl PlcClient for Snap7Client {
    fn set_connection_type(&mut self, connection_type: ConnectionType) -> S7Result<()> {
        // SAFETY: plain value arguments on a live handle.
        Status::check(unsafe { (self.api.set_connection_type)(self.handle, connection_type.code()) })
    }

    fn connect_to(&mut self, address: &str, rack: u16, slot: u16) -> S7Result<()> {
        let address = c_string(address.as_bytes())?;
        // SAFETY: `address` is NUL-terminated and outlives the call.
        let rc = unsafe {
            (self.api.connect_to)(
                self.handle,
                address.as_ptr(),
                c_int::from(rack),
                c_int::from(slot),
            )
        };
        Status::check(rc)
    }

    fn set_connection_params(
        &mut self,
        address: &str,
        local_tsap: u16,
        remote_tsap: u16,
    ) -> S7Result<()> {
        let address = c_string(address.as_bytes())?;
        // SAFETY: `address` is NUL-terminated and outlives the call.
        let rc = unsafe {
            (self.api.set_connection_params)(self.handle, address.as_ptr(), local_tsap, remote_tsap)
        };
        Status::check(rc)
    }

    fn connect(&mut self) -> S7Result<()> {
        self.run(self.api.connect)
    }

    fn disconnect(&mut self) -> S7Result<()> {
        self.run(self.api.disconnect)
    }

    fn get_param(&mut self, param: Param) -> S7Result<i64> {
        if param.is_u16() {
            let mut value: u16 = 0;
            // SAFETY: 16-bit parameters are written through a `u16` pointer.
            let rc = unsafe {
                (self.api.get_param)(self.handle, param.code(), (&mut value as *mut u16).cast())
            };
            Status::check(rc)?;
            Ok(i64::from(value))
        } else {
            let mut value: i32 = 0;
            // SAFETY: 32-bit parameters are written through an `i32` pointer.
            let rc = unsafe {
                (self.api.get_param)(self.handle, param.code(), (&mut value as *mut i32).cast())
            };
            Status::check(rc)?;
            Ok(i64::from(value))
        }
    }

    fn set_param(&mut self, param: Param, value: i64) -> S7Result<()> {
        let rc = if param.is_u16() {
            let mut value = u16::try_from(value).map_err(|_| Status::INVALID_PARAMS)?;
            // SAFETY: 16-bit parameters are read through a `u16` pointer.
            unsafe {
                (self.api.set_param)(self.handle, param.code(), (&mut value as *mut u16).cast())
            }
        } else {
            let mut value = i32::try_from(value).map_err(|_| Status::INVALID_PARAMS)?;
            // SAFETY: 32-bit parameters are read through an `i32` pointer.
            unsafe {
                (self.api.set_param)(self.handle, param.code(), (&mut value as *mut i32).cast())
            }
        };
        Status::check(rc)
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
        ensure_len(buf.len(), amount, word_len)?;
        // SAFETY: `buf` holds at least `amount * width` writable bytes (checked above).
        let rc = unsafe {
            (self.api.read_area)(
                self.handle,
                area.code(),
                c_int::from(db_number),
                int(start)?,
                int(amount)?,
                word_len.code(),
                buf.as_mut_ptr().cast(),
            )
        };
        Status::check(rc)
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
        ensure_len(data.len(), amount, word_len)?;
        // SAFETY: `data` holds at least `amount * width` bytes; the library only reads them.
        let rc = unsafe {
            (self.api.write_area)(
                self.handle,
                area.code(),
                c_int::from(db_number),
                int(start)?,
                int(amount)?,
                word_len.code(),
                data.as_ptr().cast_mut().cast(),
            )
        };
        Status::check(rc)
    }

    fn read_multi_vars(&mut self, items: &mut [DataItem]) -> S7Result<()> {
        let mut raw = items
            .iter_mut()
            .map(raw_item)
            .collect::<S7Result<Vec<_>>>()?;
        // SAFETY: every `pdata` points into an item buffer of the checked size;
        // the buffers are not moved until the call returns.
        let rc = unsafe { (self.api.read_multi_vars)(self.handle, raw.as_mut_ptr(), int(raw.len())?) };
        Status::check(rc)?;
        for (item, raw) in items.iter_mut().zip(&raw) {
            item.result = Status::new(raw.result as u32);
        }
        Ok(())
    }

    fn write_multi_vars(&mut self, items: &mut [DataItem]) -> S7Result<()> {
        let mut raw = items
            .iter_mut()
            .map(raw_item)
            .collect::<S7Result<Vec<_>>>()?;
        // SAFETY: as for `read_multi_vars`; the library only reads the buffers.
        let rc =
            unsafe { (self.api.write_multi_vars)(self.handle, raw.as_mut_ptr(), int(raw.len())?) };
        Status::check(rc)?;
        for (item, raw) in items.iter_mut().zip(&raw) {
            item.result = Status::new(raw.result as u32);
        }
        Ok(())
    }

    fn list_blocks(&mut self) -> S7Result<BlocksList> {
        let mut raw = TS7BlocksList::default();
        // SAFETY: `raw` is a writable TS7BlocksList.
        Status::check(unsafe { (self.api.list_blocks)(self.handle, &mut raw) })?;
        Ok(BlocksList {
            ob_count: raw.ob_count,
            fb_count: raw.fb_count,
            fc_count: raw.fc_count,
            sfb_count: raw.sfb_count,
            sfc_count: raw.sfc_count,
            db_count: raw.db_count,
            sdb_count: raw.sdb_count,
        })
    }

    fn list_blocks_of_type(
        &mut self,
        block_type: BlockType,
        max_items: usize,
    ) -> S7Result<Vec<u16>> {
        let capacity = max_items.min(BLOCK_LIST_CAPACITY);
        let mut list = vec![0u16; capacity];
        let mut count = int(capacity)?;
        // SAFETY: `list` holds `count` writable words and the library fills at most that many.
        let rc = unsafe {
            (self.api.list_blocks_of_type)(self.handle, block_type.code(), list.as_mut_ptr(), &mut count)
        };
        Status::check(rc)?;
        list.truncate(usize::try_from(count).unwrap_or(0).min(capacity));
        Ok(list)
    }

    fn get_ag_block_info(
        &mut self,
        block_type: BlockType,
        block_number: u16,
    ) -> S7Result<BlockInfo> {
        let mut raw = TS7BlockInfo::default();
        // SAFETY: `raw` is a writable TS7BlockInfo.
        let rc = unsafe {
            (self.api.get_ag_block_info)(
                self.handle,
                block_type.code(),
                c_int::from(block_number),
                &mut raw,
            )
        };
        Status::check(rc)?;
        Ok(raw.into())
    }

    fn get_pg_block_info(&mut self, block: &[u8]) -> S7Result<BlockInfo> {
        let mut raw = TS7BlockInfo::default();
        // SAFETY: the library reads `block.len()` bytes of `block` and writes `raw`.
        let rc = unsafe {
            (self.api.get_pg_block_info)(
                self.handle,
                block.as_ptr().cast_mut().cast(),
                &mut raw,
                int(block.len())?,
            )
        };
        Status::check(rc)?;
        Ok(raw.into())
    }

    fn full_upload(
        &mut self,
        block_type: BlockType,
        block_number: u16,
        max_size: usize,
    ) -> S7Result<Vec<u8>> {
        self.fetch_block(self.api.full_upload, block_type, block_number, max_size)
    }

    fn upload(
        &mut self,
        block_type: BlockType,
        block_number: u16,
        max_size: usize,
    ) -> S7Result<Vec<u8>> {
        self.fetch_block(self.api.upload, block_type, block_number, max_size)
    }

    fn download(&mut self, block_number: i32, block: &[u8]) -> S7Result<()> {
        // SAFETY: the library reads `block.len()` bytes of `block`.
        let rc = unsafe {
            (self.api.download)(
                self.handle,
                block_number,
                block.as_ptr().cast_mut().cast(),
                int(block.len())?,
            )
        };
        Status::check(rc)
    }

    fn delete(&mut self, block_type: BlockType, block_number: u16) -> S7Result<()> {
        // SAFETY: plain value arguments on a live handle.
        let rc = unsafe {
            (self.api.delete)(self.handle, block_type.code(), c_int::from(block_number))
        };
        Status::check(rc)
    }

    fn db_get(&mut self, db_number: u16, max_size: usize) -> S7Result<Vec<u8>> {
        let mut buf = vec![0u8; max_size];
        let mut size = int(max_size)?;
        // SAFETY: `buf` holds `size` writable bytes.
        let rc = unsafe {
            (self.api.db_get)(
                self.handle,
                c_int::from(db_number),
                buf.as_mut_ptr().cast(),
                &mut size,
            )
        };
        Status::check(rc)?;
        truncate(&mut buf, size);
        Ok(buf)
    }

    fn db_fill(&mut self, db_number: u16, fill: u8) -> S7Result<()> {
        // SAFETY: plain value arguments on a live handle.
        let rc = unsafe {
            (self.api.db_fill)(self.handle, c_int::from(db_number), c_int::from(fill))
        };
        Status::check(rc)
    }

    fn get_plc_date_time(&mut self) -> S7Result<PlcDateTime> {
        let mut tm = to_tm(&PlcDateTime::default());
        // SAFETY: `tm` is a writable `struct tm`.
        Status::check(unsafe { (self.api.get_plc_date_time)(self.handle, &mut tm) })?;
        Ok(from_tm(&tm))
    }

    fn set_plc_date_time(&mut self, date_time: &PlcDateTime) -> S7Result<()> {
        let mut tm = to_tm(date_time);
        // SAFETY: `tm` is a valid `struct tm` that outlives the call.
        Status::check(unsafe { (self.api.set_plc_date_time)(self.handle, &mut tm) })
    }

    fn set_plc_system_date_time(&mut self) -> S7Result<()> {
        self.run(self.api.set_plc_system_date_time)
    }

    fn read_szl(&mut self, id: u16, index: u16) -> S7Result<Szl> {
        let mut raw = Box::new(TS7SZL {
            record_length: 0,
            record_count: 0,
            data: [0; SZL_DATA_LEN],
        });
        let mut size = int(mem::size_of::<TS7SZL>())?;
        // SAFETY: `raw` is a writable TS7SZL of `size` bytes.
        let rc = unsafe {
            (self.api.read_szl)(
                self.handle,
                c_int::from(id),
                c_int::from(index),
                &mut *raw,
                &mut size,
            )
        };
        Status::check(rc)?;
        let len = (usize::from(raw.record_length) * usize::from(raw.record_count)).min(SZL_DATA_LEN);
        Ok(Szl {
            record_length: raw.record_length,
            record_count: raw.record_count,
            data: raw.data[..len].to_vec(),
        })
    }

    fn read_szl_list(&mut self) -> S7Result<Vec<u16>> {
        let mut raw = Box::new(TS7SZLList {
            record_length: 0,
            record_count: 0,
            list: [0; SZL_LIST_LEN],
        });
        let mut count = int(SZL_LIST_LEN)?;
        // SAFETY: `raw` is a writable TS7SZLList holding `count` list entries.
        Status::check(unsafe { (self.api.read_szl_list)(self.handle, &mut *raw, &mut count) })?;
        let len = usize::try_from(count).unwrap_or(0).min(SZL_LIST_LEN);
        Ok(raw.list[..len].to_vec())
    }

    fn get_order_code(&mut self) -> S7Result<OrderCode> {
        let mut raw = TS7OrderCode::default();
        // SAFETY: `raw` is a writable TS7OrderCode.
        Status::check(unsafe { (self.api.get_order_code)(self.handle, &mut raw) })?;
        Ok(OrderCode {
            code: c_text(&raw.code),
            v1: raw.v1,
            v2: raw.v2,
            v3: raw.v3,
        })
    }

    fn get_cpu_info(&mut self) -> S7Result<CpuInfo> {
        let mut raw = TS7CpuInfo {
            module_type_name: [0; 33],
            serial_number: [0; 25],
            as_name: [0; 25],
            copyright: [0; 27],
            module_name: [0; 25],
        };
        // SAFETY: `raw` is a writable TS7CpuInfo.
        Status::check(unsafe { (self.api.get_cpu_info)(self.handle, &mut raw) })?;
        Ok(CpuInfo {
            module_type_name: c_text(&raw.module_type_name),
            serial_number: c_text(&raw.serial_number),
            as_name: c_text(&raw.as_name),
            copyright: c_text(&raw.copyright),
            module_name: c_text(&raw.module_name),
        })
    }

    fn get_cp_info(&mut self) -> S7Result<CpInfo> {
        let mut raw = TS7CpInfo::default();
        // SAFETY: `raw` is a writable TS7CpInfo.
        Status::check(unsafe { (self.api.get_cp_info)(self.handle, &mut raw) })?;
        Ok(CpInfo {
            max_pdu_length: raw.max_pdu_length,
            max_connections: raw.max_connections,
            max_mpi_rate: raw.max_mpi_rate,
            max_bus_rate: raw.max_bus_rate,
        })
    }

    fn plc_hot_start(&mut self) -> S7Result<()> {
        self.run(self.api.plc_hot_start)
    }

    fn plc_cold_start(&mut self) -> S7Result<()> {
        self.run(self.api.plc_cold_start)
    }

    fn plc_stop(&mut self) -> S7Result<()> {
        self.run(self.api.plc_stop)
    }

    fn copy_ram_to_rom(&mut self, timeout_ms: i32) -> S7Result<()> {
        // SAFETY: plain value arguments on a live handle.
        Status::check(unsafe { (self.api.copy_ram_to_rom)(self.handle, timeout_ms) })
    }

    fn compress(&mut self, timeout_ms: i32) -> S7Result<()> {
        // SAFETY: plain value arguments on a live handle.
        Status::check(unsafe { (self.api.compress)(self.handle, timeout_ms) })
    }

    fn get_plc_status(&mut self) -> S7Result<i32> {
        self.get_int(self.api.get_plc_status)
    }

    fn set_session_password(&mut self, password: &[u8]) -> S7Result<()> {
        let password = c_string(password)?;
        // SAFETY: `password` is NUL-terminated and outlives the call; the library copies it.
        let rc = unsafe {
            (self.api.set_session_password)(self.handle, password.as_ptr().cast_mut())
        };
        Status::check(rc)
    }

    fn clear_session_password(&mut self) -> S7Result<()> {
        self.run(self.api.clear_session_password)
    }

    fn get_protection(&mut self) -> S7Result<Protection> {
        let mut raw = TS7Protection::default();
        // SAFETY: `raw` is a writable TS7Protection.
        Status::check(unsafe { (self.api.get_protection)(self.handle, &mut raw) })?;
        Ok(Protection {
            sch_schal: raw.sch_schal,
            sch_par: raw.sch_par,
            sch_rel: raw.sch_rel,
            bart_sch: raw.bart_sch,
            anl_sch: raw.anl_sch,
        })
    }

    fn iso_exchange_buffer(&mut self, pdu: &[u8]) -> S7Result<Vec<u8>> {
        let mut buf = vec![0u8; pdu.len().max(ISO_BUFFER_MIN)];
        buf[..pdu.len()].copy_from_slice(pdu);
        let mut size = int(pdu.len())?;
        // SAFETY: `buf` holds the request and room for a reply PDU.
        let rc = unsafe {
            (self.api.iso_exchange_buffer)(self.handle, buf.as_mut_ptr().cast(), &mut size)
        };
        Status::check(rc)?;
        truncate(&mut buf, size);
        Ok(buf)
    }

    fn get_exec_time(&mut self) -> S7Result<i32> {
        self.get_int(self.api.get_exec_time)
    }

    fn get_last_error(&mut self) -> S7Result<i32> {
        self.get_int(self.api.get_last_error)
    }

    fn get_pdu_length(&mut self) -> S7Result<PduLength> {
        let mut requested: c_int = 0;
        let mut negotiated: c_int = 0;
        // SAFETY: both out-pointers are valid writable ints.
        let rc = unsafe { (self.api.get_pdu_length)(self.handle, &mut requested, &mut negotiated) };
        Status::check(rc)?;
        Ok(PduLength {
            requested,
            negotiated,
        })
    }

    fn get_connected(&mut self) -> S7Result<bool> {
        Ok(self.get_int(self.api.get_connected)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_load_error() {
        let err = Snap7Client::open(Some("/nonexistent/libsnap7-missing.so")).unwrap_err();
        match err {
            ClientError::LibraryLoad { path, message } => {
                assert_eq!(path, "/nonexistent/libsnap7-missing.so");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nul_in_path_is_load_error() {
        let err = Snap7Client::open(Some("lib\0snap7.so")).unwrap_err();
        assert!(matches!(err, ClientError::LibraryLoad { .. }));
    }

    #[test]
    fn c_text_stops_at_nul() {
        assert_eq!(c_text(b"6ES7 315\0\0\0"), "6ES7 315");
        assert_eq!(c_text(b"full"), "full");
        assert_eq!(c_text(b"\0junk"), "");
    }

    #[test]
    fn truncate_clamps_reported_size() {
        let mut buf = vec![0u8; 8];
        truncate(&mut buf, 20);
        assert_eq!(buf.len(), 8);
        truncate(&mut buf, 3);
        assert_eq!(buf.len(), 3);
        truncate(&mut buf, -1);
        assert!(buf.is_empty());
    }

    #[test]
    fn buffer_length_checked_against_word_len() {
        assert_eq!(ensure_len(8, 4, WordLen::Word), Ok(()));
        assert_eq!(ensure_len(7, 4, WordLen::Word), Err(Status::BUFFER_TOO_SMALL));
        assert_eq!(ensure_len(4, 1, WordLen::Real), Ok(()));
    }

    #[test]
    fn tm_conversion_keeps_native_offsets() {
        let value = PlcDateTime {
            sec: 5,
            min: 4,
            hour: 3,
            mday: 2,
            mon: 0,
            year: 124,
            wday: 1,
            yday: 1,
            isdst: 0,
        };
        assert_eq!(from_tm(&to_tm(&value)), value);
    }

    #[test]
    fn symbol_table_is_complete() {
        assert_eq!(SYMBOLS.len(), 45);
        assert!(SYMBOLS.contains(&"Cli_Create"));
        assert!(SYMBOLS.contains(&"Cli_IsoExchangeBuffer"));
    }
}
