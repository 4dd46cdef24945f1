//! DEL, EXISTS, KEYS, RENAME(NX), RANDOMKEY, TYPE, DUMP/RESTORE and the
//! explicit key-space non-goals (EXPIRE, PERSIST, TTL, MOVE, SORT).

use bytes::Bytes;
use rand::seq::IteratorRandom;

use crate::error::CommandError;
use crate::glob::glob_match;
use crate::keyspace::Database;
use crate::resp::RespValue;
use crate::util::parse_i64_arg;
use crate::value;

pub fn del(db: &mut Database, keys: &[Bytes]) -> RespValue {
    let mut count = 0i64;
    for key in keys {
        if db.remove(key).is_some() {
            count += 1;
        }
    }
    RespValue::integer(count)
}

pub fn exists(db: &Database, key: &Bytes) -> RespValue {
    RespValue::integer(db.contains_key(key) as i64)
}

pub fn keys_cmd(db: &Database, pattern: &Bytes) -> RespValue {
    let matched: Vec<RespValue> = db
        .keys()
        .filter(|k| glob_match(pattern, k))
        .map(|k| RespValue::bulk(k.clone()))
        .collect();
    RespValue::array(matched)
}

pub fn rename(db: &mut Database, key: &Bytes, newkey: &Bytes) -> Result<RespValue, CommandError> {
    if key == newkey {
        return Err(CommandError::generic("source and destination objects are the same"));
    }
    let value = db
        .remove(key)
        .ok_or_else(|| CommandError::generic("no such key"))?;
    db.insert(newkey.clone(), value);
    Ok(RespValue::ok())
}

pub fn renamenx(
    db: &mut Database,
    key: &Bytes,
    newkey: &Bytes,
) -> Result<RespValue, CommandError> {
    if key == newkey {
        return Err(CommandError::generic("source and destination objects are the same"));
    }
    if !db.contains_key(key) {
        return Err(CommandError::generic("no such key"));
    }
    if db.contains_key(newkey) {
        return Ok(RespValue::integer(0));
    }
    let value = db.remove(key).unwrap();
    db.insert(newkey.clone(), value);
    Ok(RespValue::integer(1))
}

pub fn randomkey(db: &Database) -> RespValue {
    let mut rng = rand::thread_rng();
    match db.keys().choose(&mut rng) {
        Some(k) => RespValue::bulk(k.clone()),
        None => RespValue::nil(),
    }
}

pub fn type_cmd(db: &Database, key: &Bytes) -> RespValue {
    let name = match db.get(key) {
        Some(v) => v.kind().name(),
        None => "none",
    };
    RespValue::status(name)
}

pub fn dump(db: &Database, key: &Bytes) -> RespValue {
    match db.get(key) {
        Some(v) => RespValue::bulk(value::dump(v)),
        None => RespValue::nil(),
    }
}

pub fn restore(
    db: &mut Database,
    key: &Bytes,
    ttl: &Bytes,
    payload: &Bytes,
) -> Result<RespValue, CommandError> {
    if ttl.as_ref() != b"0" {
        return Err(CommandError::NotImplemented);
    }
    if db.contains_key(key) {
        return Err(CommandError::generic("BUSYKEY Target key name already exists."));
    }
    let value = value::restore(payload)?;
    db.insert(key.clone(), value);
    Ok(RespValue::ok())
}

/// Parses (and validates the syntax of) `SORT key [BY pattern] [LIMIT off
/// count] [GET pattern ...] [ASC|DESC] [ALPHA] [STORE dest]`, then always
/// replies `ERR not implemented` — the original source parses this same
/// grammar before giving up.
pub fn sort(args: &[Bytes]) -> Result<RespValue, CommandError> {
    let mut i = 1; // args[0] is the key
    while i < args.len() {
        let token = String::from_utf8_lossy(&args[i]).to_ascii_uppercase();
        match token.as_str() {
            "BY" => {
                i += 1;
                if i >= args.len() {
                    return Err(CommandError::generic("syntax error"));
                }
                i += 1;
            }
            "LIMIT" => {
                if i + 2 >= args.len() {
                    return Err(CommandError::generic("syntax error"));
                }
                parse_i64_arg(&args[i + 1])?;
                parse_i64_arg(&args[i + 2])?;
                i += 3;
            }
            "GET" => {
                i += 1;
                if i >= args.len() {
                    return Err(CommandError::generic("syntax error"));
                }
                i += 1;
            }
            "ASC" | "DESC" | "ALPHA" => {
                i += 1;
            }
            "STORE" => {
                i += 1;
                if i >= args.len() {
                    return Err(CommandError::generic("syntax error"));
                }
                i += 1;
            }
            _ => return Err(CommandError::generic("syntax error")),
        }
    }
    Err(CommandError::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn key(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn del_counts_only_present_keys() {
        let mut db = Database::new();
        db.insert(key("a"), Value::Bstr(Bytes::new()));
        let reply = del(&mut db, &[key("a"), key("b")]);
        assert_eq!(reply, RespValue::integer(1));
        assert!(db.is_empty());
    }

    #[test]
    fn rename_requires_distinct_keys() {
        let mut db = Database::new();
        db.insert(key("a"), Value::Bstr(Bytes::new()));
        assert!(rename(&mut db, &key("a"), &key("a")).is_err());
    }

    #[test]
    fn renamenx_fails_if_destination_exists() {
        let mut db = Database::new();
        db.insert(key("a"), Value::Bstr(Bytes::from_static(b"1")));
        db.insert(key("b"), Value::Bstr(Bytes::from_static(b"2")));
        let reply = renamenx(&mut db, &key("a"), &key("b")).unwrap();
        assert_eq!(reply, RespValue::integer(0));
    }

    #[test]
    fn dump_restore_round_trip() {
        let mut db = Database::new();
        db.insert(key("a"), Value::Bstr(Bytes::from_static(b"hello")));
        let dumped = match dump(&db, &key("a")) {
            RespValue::Bulk(b) => b,
            _ => panic!("expected bulk"),
        };
        db.remove(&key("a"));
        restore(&mut db, &key("a"), &key("0"), &dumped).unwrap();
        assert_eq!(
            db.get(&key("a")).unwrap().as_bstr(),
            Some(&Bytes::from_static(b"hello"))
        );
    }

    #[test]
    fn type_cmd_reports_none_for_absent_key() {
        let db = Database::new();
        assert_eq!(type_cmd(&db, &key("missing")), RespValue::status("none"));
    }

    #[test]
    fn sort_parses_then_reports_not_implemented() {
        let args = vec![key("mylist"), key("BY"), key("weight_*")];
        assert!(matches!(sort(&args), Err(CommandError::NotImplemented)));
    }

    #[test]
    fn sort_rejects_unknown_option() {
        let bad = vec![key("mylist"), key("BOGUS")];
        assert!(!matches!(sort(&bad), Err(CommandError::NotImplemented)));
    }
}
