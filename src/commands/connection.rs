//! Per-connection commands: PING, ECHO, SELECT, AUTH, QUIT.

use bytes::Bytes;

use crate::error::CommandError;
use crate::resp::RespValue;

pub fn ping(arg: Option<&Bytes>) -> RespValue {
    match arg {
        Some(msg) => RespValue::bulk(msg.clone()),
        None => RespValue::status("PONG"),
    }
}

pub fn echo(msg: &Bytes) -> RespValue {
    RespValue::bulk(msg.clone())
}

pub fn select(num_databases: usize, index_arg: &Bytes) -> Result<usize, CommandError> {
    let index = crate::util::parse_i64_arg(index_arg)?;
    if index < 0 || index as usize >= num_databases {
        return Err(CommandError::generic("DB index is out of range"));
    }
    Ok(index as usize)
}

pub fn auth() -> RespValue {
    RespValue::error("ERR Client sent AUTH, but no password is set")
}
