//! GET/SET and friends, plus the INCR family of counter operations.

use bytes::Bytes;

use crate::error::CommandError;
use crate::keyspace::{commit, Database};
use crate::resp::RespValue;
use crate::util::{canonical_float, canonical_integer, parse_stored_float, parse_stored_integer};
use crate::value::Value;

fn current(db: &Database, key: &Bytes) -> Result<Bytes, CommandError> {
    match db.get(key) {
        Some(Value::Bstr(b)) => Ok(b.clone()),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(Bytes::new()),
    }
}

pub fn get(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(Value::Bstr(b)) => Ok(RespValue::bulk(b.clone())),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::nil()),
    }
}

pub fn set(db: &mut Database, key: &Bytes, value: &Bytes) -> RespValue {
    db.insert(key.clone(), Value::Bstr(value.clone()));
    RespValue::ok()
}

pub fn getset(db: &mut Database, key: &Bytes, value: &Bytes) -> Result<RespValue, CommandError> {
    let existed = db.contains_key(key);
    let old = current(db, key)?;
    db.insert(key.clone(), Value::Bstr(value.clone()));
    Ok(if existed {
        RespValue::bulk(old)
    } else {
        RespValue::nil()
    })
}

pub fn setnx(db: &mut Database, key: &Bytes, value: &Bytes) -> RespValue {
    if db.contains_key(key) {
        RespValue::integer(0)
    } else {
        db.insert(key.clone(), Value::Bstr(value.clone()));
        RespValue::integer(1)
    }
}

pub fn append(db: &mut Database, key: &Bytes, suffix: &Bytes) -> Result<RespValue, CommandError> {
    let mut old = current(db, key)?.to_vec();
    old.extend_from_slice(suffix);
    let new_len = old.len();
    db.insert(key.clone(), Value::Bstr(Bytes::from(old)));
    Ok(RespValue::integer(new_len as i64))
}

pub fn strlen(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    Ok(RespValue::integer(current(db, key)?.len() as i64))
}

pub fn mget(db: &Database, keys: &[Bytes]) -> RespValue {
    let values = keys
        .iter()
        .map(|k| match db.get(k) {
            Some(Value::Bstr(b)) => RespValue::bulk(b.clone()),
            _ => RespValue::nil(),
        })
        .collect();
    RespValue::array(values)
}

pub fn mset(db: &mut Database, args: &[Bytes]) -> Result<RespValue, CommandError> {
    if args.len() % 2 != 0 {
        return Err(CommandError::generic("wrong number of arguments for MSET"));
    }
    for pair in args.chunks(2) {
        db.insert(pair[0].clone(), Value::Bstr(pair[1].clone()));
    }
    Ok(RespValue::ok())
}

pub fn msetnx(db: &mut Database, args: &[Bytes]) -> Result<RespValue, CommandError> {
    if args.len() % 2 != 0 {
        return Err(CommandError::generic("wrong number of arguments for MSETNX"));
    }
    if args.chunks(2).any(|pair| db.contains_key(&pair[0])) {
        return Ok(RespValue::integer(0));
    }
    for pair in args.chunks(2) {
        db.insert(pair[0].clone(), Value::Bstr(pair[1].clone()));
    }
    Ok(RespValue::integer(1))
}

pub fn getrange(
    db: &Database,
    key: &Bytes,
    start: i64,
    end: i64,
) -> Result<RespValue, CommandError> {
    let value = current(db, key)?;
    match crate::util::clamp_range(value.len(), start, end) {
        Some((lo, hi)) => Ok(RespValue::bulk(value.slice(lo..hi))),
        None => Ok(RespValue::bulk(Bytes::new())),
    }
}

pub fn setrange(
    db: &mut Database,
    key: &Bytes,
    offset: i64,
    value: &Bytes,
) -> Result<RespValue, CommandError> {
    if offset < 0 {
        return Err(CommandError::generic("offset is out of range"));
    }
    if value.is_empty() {
        return Ok(RespValue::integer(current(db, key)?.len() as i64));
    }
    let offset = offset as usize;
    let mut old = current(db, key)?.to_vec();
    if old.len() < offset + value.len() {
        old.resize(offset + value.len(), 0);
    }
    old[offset..offset + value.len()].copy_from_slice(value);
    let new_len = old.len();
    commit(db, key.clone(), Value::Bstr(Bytes::from(old)));
    Ok(RespValue::integer(new_len as i64))
}

fn incr_by(db: &mut Database, key: &Bytes, delta: i64) -> Result<RespValue, CommandError> {
    let current_value = match db.get(key) {
        Some(Value::Bstr(b)) => b.clone(),
        Some(_) => return Err(CommandError::WrongType),
        None => Bytes::new(),
    };
    let n = parse_stored_integer(&current_value)?;
    let sum = n
        .checked_add(delta)
        .ok_or_else(|| CommandError::generic("increment or decrement would overflow"))?;
    let text = canonical_integer(sum);
    db.insert(key.clone(), Value::Bstr(text.clone()));
    Ok(RespValue::integer(sum))
}

pub fn incr(db: &mut Database, key: &Bytes) -> Result<RespValue, CommandError> {
    incr_by(db, key, 1)
}

pub fn decr(db: &mut Database, key: &Bytes) -> Result<RespValue, CommandError> {
    incr_by(db, key, -1)
}

pub fn incrby(db: &mut Database, key: &Bytes, delta: i64) -> Result<RespValue, CommandError> {
    incr_by(db, key, delta)
}

pub fn decrby(db: &mut Database, key: &Bytes, delta: i64) -> Result<RespValue, CommandError> {
    incr_by(db, key, -delta)
}

pub fn incrbyfloat(
    db: &mut Database,
    key: &Bytes,
    delta: f64,
) -> Result<RespValue, CommandError> {
    if delta.is_nan() || delta.is_infinite() {
        return Err(CommandError::generic("value is not a valid float"));
    }
    let current_value = match db.get(key) {
        Some(Value::Bstr(b)) => b.clone(),
        Some(_) => return Err(CommandError::WrongType),
        None => Bytes::new(),
    };
    let n = parse_stored_float(&current_value)?;
    let sum = n + delta;
    if sum.is_nan() {
        return Err(CommandError::generic("would produce NaN"));
    }
    if sum.is_infinite() {
        return Err(CommandError::generic("would produce Infinity"));
    }
    let text = canonical_float(sum);
    db.insert(key.clone(), Value::Bstr(text.clone()));
    Ok(RespValue::bulk(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }
    fn val(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut db = Database::new();
        set(&mut db, &key("foo"), &val("bar"));
        assert_eq!(get(&db, &key("foo")).unwrap(), RespValue::bulk(val("bar")));
    }

    #[test]
    fn get_missing_key_is_nil() {
        let db = Database::new();
        assert_eq!(get(&db, &key("missing")).unwrap(), RespValue::nil());
    }

    #[test]
    fn append_creates_then_extends() {
        let mut db = Database::new();
        assert_eq!(append(&mut db, &key("k"), &val("Hello ")).unwrap(), RespValue::integer(6));
        assert_eq!(append(&mut db, &key("k"), &val("World")).unwrap(), RespValue::integer(11));
        assert_eq!(get(&db, &key("k")).unwrap(), RespValue::bulk(val("Hello World")));
    }

    #[test]
    fn incr_canonicalizes_decimal() {
        let mut db = Database::new();
        assert_eq!(incr(&mut db, &key("c")).unwrap(), RespValue::integer(1));
        assert_eq!(incrby(&mut db, &key("c"), 9).unwrap(), RespValue::integer(10));
        assert_eq!(decrby(&mut db, &key("c"), 3).unwrap(), RespValue::integer(7));
        assert_eq!(get(&db, &key("c")).unwrap(), RespValue::bulk(val("7")));
    }

    #[test]
    fn incr_rejects_whitespace_padded_value() {
        let mut db = Database::new();
        db.insert(key("c"), Value::Bstr(val(" 1")));
        assert!(matches!(incr(&mut db, &key("c")), Err(CommandError::NotAnInteger)));
    }

    #[test]
    fn incrbyfloat_strips_trailing_zeros() {
        let mut db = Database::new();
        let reply = incrbyfloat(&mut db, &key("f"), 10.5).unwrap();
        assert_eq!(reply, RespValue::bulk(val("10.5")));
    }

    #[test]
    fn setrange_pads_with_zero_bytes() {
        let mut db = Database::new();
        setrange(&mut db, &key("k"), 5, &val("hi")).unwrap();
        let stored = current(&db, &key("k")).unwrap();
        assert_eq!(&stored[..], b"\x00\x00\x00\x00\x00hi");
    }

    #[test]
    fn setrange_with_empty_value_is_a_no_op() {
        let mut db = Database::new();
        assert_eq!(setrange(&mut db, &key("missing"), 5, &val("")).unwrap(), RespValue::integer(0));
        assert!(!db.contains_key(&key("missing")));

        set(&mut db, &key("k"), &val("abc"));
        assert_eq!(setrange(&mut db, &key("k"), 5, &val("")).unwrap(), RespValue::integer(3));
        assert_eq!(get(&db, &key("k")).unwrap(), RespValue::bulk(val("abc")));
    }

    #[test]
    fn getrange_clamps_out_of_range() {
        let mut db = Database::new();
        set(&mut db, &key("k"), &val("Hello World"));
        assert_eq!(
            getrange(&db, &key("k"), 0, -1).unwrap(),
            RespValue::bulk(val("Hello World"))
        );
        assert_eq!(
            getrange(&db, &key("k"), -5, -1).unwrap(),
            RespValue::bulk(val("World"))
        );
    }

    #[test]
    fn getset_returns_nil_for_absent_key() {
        let mut db = Database::new();
        assert_eq!(getset(&mut db, &key("k"), &val("new")).unwrap(), RespValue::nil());
        assert_eq!(get(&db, &key("k")).unwrap(), RespValue::bulk(val("new")));
    }

    #[test]
    fn getset_returns_previous_value() {
        let mut db = Database::new();
        set(&mut db, &key("k"), &val("old"));
        assert_eq!(getset(&mut db, &key("k"), &val("new")).unwrap(), RespValue::bulk(val("old")));
    }

    #[test]
    fn mset_and_msetnx() {
        let mut db = Database::new();
        mset(&mut db, &[key("a"), val("1"), key("b"), val("2")]).unwrap();
        assert_eq!(
            msetnx(&mut db, &[key("a"), val("9"), key("c"), val("3")]).unwrap(),
            RespValue::integer(0)
        );
        assert_eq!(get(&db, &key("a")).unwrap(), RespValue::bulk(val("1")));
    }
}
