//! One function per command.
//!
//! Each handler decodes its argument, makes exactly one client call and maps
//! the outcome: success to `ok` or `{ok, value}`, a status to the error map.

use s7port_client::{ConnectionType, CpuStatus, PlcClient, PlcDateTime, S7Result};

use crate::args::{buffer, check_len, data_len, Args, HandlerError, HandlerResult};
use crate::error::CommandError;
use crate::response::{Reason, Reply, Response};

type Client<'c> = &'c mut dyn PlcClient;

fn done(result: S7Result<()>) -> Response {
    match result {
        Ok(()) => Response::Ok,
        Err(status) => Response::Status(status),
    }
}

fn respond(result: S7Result<Reply>) -> Response {
    match result {
        Ok(reply) => Response::Value(reply),
        Err(status) => Response::Status(status),
    }
}

pub(crate) fn test(_client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(Response::Ok)
}

// Connection

pub(crate) fn set_connection_type(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let connection_type = ConnectionType::from_code(args.long()?)
        .ok_or(HandlerError::Reject(Reason::Einval))?;
    Ok(done(client.set_connection_type(connection_type)))
}

pub(crate) fn connect_to(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(3)?;
    let address = args.text()?;
    let rack = args.int()?;
    let slot = args.int()?;
    Ok(done(client.connect_to(&address, rack, slot)))
}

pub(crate) fn set_connection_params(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(3)?;
    let address = args.text()?;
    let local_tsap = args.int()?;
    let remote_tsap = args.int()?;
    Ok(done(client.set_connection_params(&address, local_tsap, remote_tsap)))
}

pub(crate) fn connect(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(done(client.connect()))
}

pub(crate) fn disconnect(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(done(client.disconnect()))
}

pub(crate) fn get_params(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let param = args.param()?;
    Ok(respond(client.get_param(param).map(Reply::Int)))
}

pub(crate) fn set_params(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let param = args.param()?;
    let value = args.long()?;
    if !param.accepts(value) {
        return Err(HandlerError::Reject(Reason::Einval));
    }
    Ok(done(client.set_param(param, value)))
}

// Data I/O

pub(crate) fn read_area(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(5)?;
    let area = args.area()?;
    let db_number = args.int()?;
    let start = args.int()?;
    let amount = args.int()?;
    let word_len = args.word_len()?;
    let mut buf = buffer(word_len, amount)?;
    let result = client.read_area(area, db_number, start, amount, word_len, &mut buf);
    Ok(respond(result.map(|()| Reply::Bytes(buf))))
}

pub(crate) fn write_area(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(6)?;
    let area = args.area()?;
    let db_number = args.int()?;
    let start = args.int()?;
    let amount = args.int()?;
    let word_len = args.word_len()?;
    let data = args.binary()?;
    check_len(data.len(), data_len(word_len, amount)?)?;
    Ok(done(client.write_area(area, db_number, start, amount, word_len, data)))
}

pub(crate) fn db_read(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(3)?;
    let db_number = args.int()?;
    let start = args.int()?;
    let mut buf = vec![0; args.size()?];
    let result = client.db_read(db_number, start, &mut buf);
    Ok(respond(result.map(|()| Reply::Bytes(buf))))
}

pub(crate) fn db_write(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(4)?;
    let db_number = args.int()?;
    let start = args.int()?;
    let size = args.size()?;
    let data = args.binary()?;
    check_len(data.len(), size)?;
    Ok(done(client.db_write(db_number, start, data)))
}

/// `{start, size}` reads and `{start, size, data}` writes of a byte area.
macro_rules! byte_area_handlers {
    ($($read:ident / $write:ident;)+) => {
        $(
            pub(crate) fn $read(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
                args.tuple(2)?;
                let start = args.int()?;
                let mut buf = vec![0; args.size()?];
                let result = client.$read(start, &mut buf);
                Ok(respond(result.map(|()| Reply::Bytes(buf))))
            }

            pub(crate) fn $write(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
                args.tuple(3)?;
                let start = args.int()?;
                let size = args.size()?;
                let data = args.binary()?;
                check_len(data.len(), size)?;
                Ok(done(client.$write(start, data)))
            }
        )+
    };
}

byte_area_handlers! {
    ab_read / ab_write;
    eb_read / eb_write;
    mb_read / mb_write;
}

/// `{start, amount}` reads and `{start, amount, data}` writes of 16-bit
/// timer or counter cells.
macro_rules! word_area_handlers {
    ($($read:ident / $write:ident: $word_len:ident;)+) => {
        $(
            pub(crate) fn $read(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
                args.tuple(2)?;
                let start = args.int()?;
                let amount = args.int()?;
                let mut buf = buffer(s7port_client::WordLen::$word_len, amount)?;
                let result = client.$read(start, amount, &mut buf);
                Ok(respond(result.map(|()| Reply::Bytes(buf))))
            }

            pub(crate) fn $write(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
                args.tuple(3)?;
                let start = args.int()?;
                let amount = args.int()?;
                let data = args.binary()?;
                check_len(data.len(), data_len(s7port_client::WordLen::$word_len, amount)?)?;
                Ok(done(client.$write(start, amount, data)))
            }
        )+
    };
}

word_area_handlers! {
    tm_read / tm_write: Timer;
    ct_read / ct_write: Counter;
}

pub(crate) fn read_multi_vars(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let mut items = args.batch(false)?;
    let result = client.read_multi_vars(&mut items);
    Ok(respond(result.map(|()| {
        Reply::BatchItems(
            items
                .into_iter()
                .map(|item| match item.result {
                    None => Ok(item.data),
                    Some(status) => Err(status),
                })
                .collect(),
        )
    })))
}

pub(crate) fn write_multi_vars(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let mut items = args.batch(true)?;
    if let Err(status) = client.write_multi_vars(&mut items) {
        return Ok(Response::Status(status));
    }
    // The request went through; report the first item the PLC refused.
    Ok(match items.iter().find_map(|item| item.result) {
        Some(status) => Response::Status(status),
        None => Response::Ok,
    })
}

// Directory

pub(crate) fn list_blocks(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.list_blocks().map(Reply::BlockCounts)))
}

pub(crate) fn list_blocks_of_type(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let block_type = args.block_type()?;
    let max_items = args.size()?;
    Ok(respond(
        client
            .list_blocks_of_type(block_type, max_items)
            .map(Reply::Words),
    ))
}

pub(crate) fn get_ag_block_info(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let block_type = args.block_type()?;
    let block_number = args.int()?;
    Ok(respond(
        client
            .get_ag_block_info(block_type, block_number)
            .map(Reply::BlockInfo),
    ))
}

pub(crate) fn get_pg_block_info(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let block = args.binary()?;
    Ok(respond(client.get_pg_block_info(block).map(Reply::BlockInfo)))
}

// Blocks

pub(crate) fn full_upload(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(3)?;
    let block_type = args.block_type()?;
    let block_number = args.int()?;
    let size = args.size()?;
    Ok(respond(
        client
            .full_upload(block_type, block_number, size)
            .map(Reply::Bytes),
    ))
}

pub(crate) fn upload(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(3)?;
    let block_type = args.block_type()?;
    let block_number = args.int()?;
    let size = args.size()?;
    Ok(respond(
        client
            .upload(block_type, block_number, size)
            .map(Reply::Bytes),
    ))
}

pub(crate) fn download(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let block_number = args.int()?;
    let block = args.binary()?;
    Ok(done(client.download(block_number, block)))
}

pub(crate) fn delete(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let block_type = args.block_type()?;
    let block_number = args.int()?;
    Ok(done(client.delete(block_type, block_number)))
}

pub(crate) fn db_get(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let db_number = args.int()?;
    let size = args.size()?;
    Ok(respond(client.db_get(db_number, size).map(Reply::Bytes)))
}

pub(crate) fn db_fill(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let db_number = args.int()?;
    let fill = args.int()?;
    Ok(done(client.db_fill(db_number, fill)))
}

// Date/time

pub(crate) fn get_plc_date_time(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.get_plc_date_time().map(Reply::DateTime)))
}

pub(crate) fn set_plc_date_time(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(9)?;
    let sec = args.int()?;
    let min = args.int()?;
    let hour = args.int()?;
    let mday = args.int()?;
    let mon = calendar_offset(args.long()?, 1)?;
    let year = calendar_offset(args.long()?, 1900)?;
    let wday = args.int()?;
    let yday = args.int()?;
    let isdst = args.int()?;
    let date_time = PlcDateTime {
        sec,
        min,
        hour,
        mday,
        mon,
        year,
        wday,
        yday,
        isdst,
    };
    Ok(done(client.set_plc_date_time(&date_time)))
}

/// A calendar field shifted to its `struct tm` base; out of range is `einval`.
fn calendar_offset(value: i64, base: i64) -> Result<i32, HandlerError> {
    value
        .checked_sub(base)
        .and_then(|shifted| i32::try_from(shifted).ok())
        .ok_or(HandlerError::Reject(Reason::Einval))
}

pub(crate) fn set_plc_system_date_time(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(done(client.set_plc_system_date_time()))
}

// System info

pub(crate) fn read_szl(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    args.tuple(2)?;
    let id = args.int()?;
    let index = args.int()?;
    Ok(respond(client.read_szl(id, index).map(Reply::Szl)))
}

pub(crate) fn read_szl_list(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.read_szl_list().map(Reply::Words)))
}

pub(crate) fn get_order_code(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.get_order_code().map(Reply::OrderCode)))
}

pub(crate) fn get_cpu_info(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.get_cpu_info().map(Reply::CpuInfo)))
}

pub(crate) fn get_cp_info(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.get_cp_info().map(Reply::CpInfo)))
}

// PLC control

pub(crate) fn plc_hot_start(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(done(client.plc_hot_start()))
}

pub(crate) fn plc_cold_start(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(done(client.plc_cold_start()))
}

pub(crate) fn plc_stop(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(done(client.plc_stop()))
}

pub(crate) fn copy_ram_to_rom(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let timeout_ms = args.int()?;
    Ok(done(client.copy_ram_to_rom(timeout_ms)))
}

pub(crate) fn compress(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let timeout_ms = args.int()?;
    Ok(done(client.compress(timeout_ms)))
}

pub(crate) fn get_plc_status(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    let code = match client.get_plc_status() {
        Ok(code) => code,
        Err(status) => return Ok(Response::Status(status)),
    };
    let state = CpuStatus::from_code(code).ok_or(CommandError::UnexpectedCpuStatus(code))?;
    Ok(Response::Value(Reply::Atom(state.as_str())))
}

// Security

pub(crate) fn set_session_password(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let password = args.binary()?;
    Ok(done(client.set_session_password(password)))
}

pub(crate) fn clear_session_password(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(done(client.clear_session_password()))
}

pub(crate) fn get_protection(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.get_protection().map(Reply::Protection)))
}

// Low level

pub(crate) fn iso_exchange_buffer(client: Client<'_>, args: &mut Args<'_>) -> HandlerResult {
    let pdu = args.binary()?;
    Ok(respond(client.iso_exchange_buffer(pdu).map(Reply::Bytes)))
}

// Diagnostics

pub(crate) fn get_exec_time(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(
        client.get_exec_time().map(|ms| Reply::Int(i64::from(ms))),
    ))
}

pub(crate) fn get_last_error(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(
        client.get_last_error().map(|code| Reply::Int(i64::from(code))),
    ))
}

pub(crate) fn get_pdu_length(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.get_pdu_length().map(Reply::PduLength)))
}

pub(crate) fn get_connected(client: Client<'_>, _args: &mut Args<'_>) -> HandlerResult {
    Ok(respond(client.get_connected().map(Reply::Bool)))
}
