use s7port_client::PlcClient;
use s7port_term::Decoder;
use tracing::{debug, warn};

use crate::args::{Args, HandlerError, HandlerResult};
use crate::error::{CommandError, Result};
use crate::handlers;
use crate::response::Response;

type Handler = fn(&mut dyn PlcClient, &mut Args<'_>) -> HandlerResult;

/// A named entry of the dispatch table.
pub struct Command {
    pub name: &'static str,
    /// Shape of the expected argument term.
    pub argument: &'static str,
    handler: Handler,
}

macro_rules! commands {
    ($($name:ident: $argument:literal),+ $(,)?) => {
        &[$(Command {
            name: stringify!($name),
            argument: $argument,
            handler: handlers::$name,
        }),+]
    };
}

/// Every command, in lookup order.
pub static COMMANDS: &[Command] = commands![
    test: "any",
    set_connection_type: "type",
    connect_to: "{ip, rack, slot}",
    set_connection_params: "{ip, local_tsap, remote_tsap}",
    connect: "any",
    disconnect: "any",
    get_params: "param_number",
    set_params: "{param_number, value}",
    read_area: "{area, db, start, amount, word_len}",
    write_area: "{area, db, start, amount, word_len, data}",
    db_read: "{db, start, size}",
    db_write: "{db, start, size, data}",
    ab_read: "{start, size}",
    ab_write: "{start, size, data}",
    eb_read: "{start, size}",
    eb_write: "{start, size, data}",
    mb_read: "{start, size}",
    mb_write: "{start, size, data}",
    tm_read: "{start, amount}",
    tm_write: "{start, amount, data}",
    ct_read: "{start, amount}",
    ct_write: "{start, amount, data}",
    read_multi_vars: "{count, [%{area, db_number, start, amount, word_len}]}",
    write_multi_vars: "{count, [%{area, db_number, start, amount, word_len, data}]}",
    list_blocks: "any",
    list_blocks_of_type: "{block_type, max_items}",
    get_ag_block_info: "{block_type, block_number}",
    get_pg_block_info: "block",
    full_upload: "{block_type, block_number, size}",
    upload: "{block_type, block_number, size}",
    download: "{block_number, block}",
    delete: "{block_type, block_number}",
    db_get: "{db, size}",
    db_fill: "{db, fill_byte}",
    get_plc_date_time: "any",
    set_plc_date_time: "{sec, min, hour, mday, mon, year, wday, yday, isdst}",
    set_plc_system_date_time: "any",
    read_szl: "{id, index}",
    read_szl_list: "any",
    get_order_code: "any",
    get_cpu_info: "any",
    get_cp_info: "any",
    plc_hot_start: "any",
    plc_cold_start: "any",
    plc_stop: "any",
    copy_ram_to_rom: "timeout_ms",
    compress: "timeout_ms",
    get_plc_status: "any",
    set_session_password: "password",
    clear_session_password: "any",
    get_protection: "any",
    iso_exchange_buffer: "pdu",
    get_exec_time: "any",
    get_last_error: "any",
    get_pdu_length: "any",
    get_connected: "any",
];

/// Names of all registered commands, in table order.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|command| command.name)
}

fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| command.name == name)
}

/// Decode one request payload, run its handler and return the reply.
///
/// The payload must be a version-prefixed `{command, argument}` term.
pub fn dispatch(client: &mut dyn PlcClient, payload: &[u8]) -> Result<Response> {
    let mut decoder = Decoder::new(payload);
    decoder.decode_version()?;
    let arity = decoder.decode_tuple_header()?;
    if arity != 2 {
        return Err(CommandError::ProtocolDesync(format!(
            "request is a {arity}-tuple, expected {{command, argument}}"
        )));
    }
    let name = decoder.decode_atom()?;

    let command = lookup(&name).ok_or_else(|| CommandError::UnknownCommand(name.clone()))?;
    debug!(command = command.name, "dispatching");

    let mut args = Args::new(decoder);
    match (command.handler)(client, &mut args) {
        Ok(Response::Status(status)) => {
            warn!(command = command.name, %status, "PLC call failed");
            Ok(Response::Status(status))
        }
        Ok(response) => Ok(response),
        Err(HandlerError::Reject(reason)) => {
            debug!(command = command.name, reason = reason.as_str(), "argument rejected");
            Ok(Response::Error(reason))
        }
        Err(HandlerError::Fatal(err)) => Err(err),
    }
}
