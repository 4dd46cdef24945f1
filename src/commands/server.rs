//! Server-wide introspection and administration: DBSIZE, FLUSHDB, FLUSHALL,
//! INFO, TIME, DEBUG, COMMAND.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::CommandError;
use crate::keyspace::Keyspace;
use crate::resp::RespValue;

pub fn dbsize(keyspace: &Keyspace, db_index: usize) -> RespValue {
    RespValue::integer(keyspace.db_ref(db_index).len() as i64)
}

pub fn flushdb(keyspace: &mut Keyspace, db_index: usize) -> RespValue {
    keyspace.flush_db(db_index);
    RespValue::ok()
}

pub fn flushall(keyspace: &mut Keyspace) -> RespValue {
    keyspace.flush_all();
    RespValue::ok()
}

pub fn info(keyspace: &Keyspace) -> RespValue {
    let mut lines = Vec::new();
    lines.push(format!("server:{}", env!("CARGO_PKG_NAME")));
    lines.push(format!("os:{} {} {}", os_sysname(), os_release(), os_machine()));
    lines.push(format!("rust:{}", rustc_tag()));
    for i in 0..keyspace.num_databases() {
        let len = keyspace.db_ref(i).len();
        if len > 0 {
            lines.push(format!("db{}:keys={}", i, len));
        }
    }
    lines.push(String::new());
    RespValue::bulk(Bytes::from(lines.join("\r\n")))
}

fn os_sysname() -> &'static str {
    std::env::consts::OS
}

fn os_release() -> &'static str {
    // Rust's standard library has no uname(); the original source shells out
    // to os.uname() for this field. We have no equivalent dependency in the
    // corpus, so this is a fixed placeholder rather than a fabricated crate.
    "unknown"
}

fn os_machine() -> &'static str {
    std::env::consts::ARCH
}

fn rustc_tag() -> &'static str {
    option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown")
}

pub fn time() -> Result<RespValue, CommandError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| CommandError::generic("system clock is before the epoch"))?;
    Ok(RespValue::array(vec![
        RespValue::bulk(Bytes::from(now.as_secs().to_string())),
        RespValue::bulk(Bytes::from(now.subsec_micros().to_string())),
    ]))
}

pub fn debug(args: &[Bytes]) -> RespValue {
    if args.first().map(|a| a.eq_ignore_ascii_case(b"SEGFAULT")).unwrap_or(false) {
        std::process::abort();
    }
    RespValue::ok()
}

pub fn command() -> RespValue {
    RespValue::array(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbsize_counts_current_database() {
        let mut keyspace = Keyspace::new(4);
        keyspace.db(0).insert(Bytes::from_static(b"k"), crate::value::Value::Bstr(Bytes::new()));
        assert_eq!(dbsize(&keyspace, 0), RespValue::integer(1));
        assert_eq!(dbsize(&keyspace, 1), RespValue::integer(0));
    }

    #[test]
    fn flushdb_only_clears_target_database() {
        let mut keyspace = Keyspace::new(2);
        keyspace.db(0).insert(Bytes::from_static(b"k"), crate::value::Value::Bstr(Bytes::new()));
        keyspace.db(1).insert(Bytes::from_static(b"k"), crate::value::Value::Bstr(Bytes::new()));
        flushdb(&mut keyspace, 0);
        assert_eq!(dbsize(&keyspace, 0), RespValue::integer(0));
        assert_eq!(dbsize(&keyspace, 1), RespValue::integer(1));
    }

    #[test]
    fn info_lists_nonempty_databases_only() {
        let mut keyspace = Keyspace::new(2);
        keyspace.db(1).insert(Bytes::from_static(b"k"), crate::value::Value::Bstr(Bytes::new()));
        let reply = info(&keyspace);
        match reply {
            RespValue::Bulk(b) => {
                let text = String::from_utf8(b.to_vec()).unwrap();
                assert!(text.contains("db1:keys=1"));
                assert!(!text.contains("db0:keys"));
            }
            _ => panic!("expected bulk"),
        }
    }

    #[test]
    fn command_is_an_empty_array() {
        assert_eq!(command(), RespValue::array(Vec::new()));
    }
}
