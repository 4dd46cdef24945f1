//! The hash field/value command family.

use bytes::Bytes;

use crate::error::CommandError;
use crate::keyspace::{with_value, Database};
use crate::resp::RespValue;
use crate::util::{canonical_float, canonical_integer, parse_f64_arg, parse_i64_arg};
use crate::value::Kind;

pub fn hget(db: &Database, key: &Bytes, field: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Hash => {
            Ok(RespValue::bulk_or_nil(v.as_hash().unwrap().get(field).cloned()))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::nil()),
    }
}

pub fn hset(
    db: &mut Database,
    key: &Bytes,
    field: &Bytes,
    value: &Bytes,
) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::Hash, |v| {
        let hash = v.as_hash_mut().unwrap();
        let is_new = !hash.contains_key(field);
        hash.insert(field.clone(), value.clone());
        Ok(RespValue::integer(is_new as i64))
    })
}

pub fn hsetnx(
    db: &mut Database,
    key: &Bytes,
    field: &Bytes,
    value: &Bytes,
) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::Hash, |v| {
        let hash = v.as_hash_mut().unwrap();
        if hash.contains_key(field) {
            Ok(RespValue::integer(0))
        } else {
            hash.insert(field.clone(), value.clone());
            Ok(RespValue::integer(1))
        }
    })
}

pub fn hmset(db: &mut Database, key: &Bytes, args: &[Bytes]) -> Result<RespValue, CommandError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(CommandError::generic("wrong number of arguments for HMSET"));
    }
    with_value(db, key, Kind::Hash, |v| {
        let hash = v.as_hash_mut().unwrap();
        for pair in args.chunks(2) {
            hash.insert(pair[0].clone(), pair[1].clone());
        }
        Ok(RespValue::ok())
    })
}

pub fn hmget(db: &Database, key: &Bytes, fields: &[Bytes]) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Hash => {
            let hash = v.as_hash().unwrap();
            Ok(RespValue::array(
                fields
                    .iter()
                    .map(|f| RespValue::bulk_or_nil(hash.get(f).cloned()))
                    .collect(),
            ))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(fields.iter().map(|_| RespValue::nil()).collect())),
    }
}

pub fn hdel(db: &mut Database, key: &Bytes, fields: &[Bytes]) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::Hash, |v| {
        let hash = v.as_hash_mut().unwrap();
        let mut removed = 0i64;
        for field in fields {
            if hash.remove(field).is_some() {
                removed += 1;
            }
        }
        Ok(RespValue::integer(removed))
    })
}

pub fn hexists(db: &Database, key: &Bytes, field: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Hash => {
            Ok(RespValue::integer(v.as_hash().unwrap().contains_key(field) as i64))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn hkeys(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Hash => Ok(RespValue::array(
            v.as_hash().unwrap().keys().map(|k| RespValue::bulk(k.clone())).collect(),
        )),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn hvals(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Hash => Ok(RespValue::array(
            v.as_hash().unwrap().values().map(|val| RespValue::bulk(val.clone())).collect(),
        )),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn hgetall(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Hash => {
            let mut items = Vec::new();
            for (field, val) in v.as_hash().unwrap() {
                items.push(RespValue::bulk(field.clone()));
                items.push(RespValue::bulk(val.clone()));
            }
            Ok(RespValue::array(items))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn hlen(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Hash => Ok(RespValue::integer(v.as_hash().unwrap().len() as i64)),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn hincrby(
    db: &mut Database,
    key: &Bytes,
    field: &Bytes,
    delta_arg: &Bytes,
) -> Result<RespValue, CommandError> {
    let delta = parse_i64_arg(delta_arg)?;
    with_value(db, key, Kind::Hash, |v| {
        let hash = v.as_hash_mut().unwrap();
        let current = match hash.get(field) {
            Some(b) => crate::util::parse_stored_integer(b)?,
            None => 0,
        };
        let sum = current
            .checked_add(delta)
            .ok_or_else(|| CommandError::generic("increment or decrement would overflow"))?;
        hash.insert(field.clone(), canonical_integer(sum));
        Ok(RespValue::integer(sum))
    })
}

pub fn hincrbyfloat(
    db: &mut Database,
    key: &Bytes,
    field: &Bytes,
    delta_arg: &Bytes,
) -> Result<RespValue, CommandError> {
    let delta = parse_f64_arg(delta_arg)?;
    with_value(db, key, Kind::Hash, |v| {
        let hash = v.as_hash_mut().unwrap();
        let current = match hash.get(field) {
            Some(b) => crate::util::parse_stored_float(b)?,
            None => 0.0,
        };
        let sum = current + delta;
        if sum.is_nan() || sum.is_infinite() {
            return Err(CommandError::generic("would produce NaN or Infinity"));
        }
        let text = canonical_float(sum);
        hash.insert(field.clone(), text.clone());
        Ok(RespValue::bulk(text))
    })
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
    fn hset_reports_new_vs_update() {
        let mut db = Database::new();
        assert_eq!(hset(&mut db, &key("h"), &key("f"), &val("1")).unwrap(), RespValue::integer(1));
        assert_eq!(hset(&mut db, &key("h"), &key("f"), &val("2")).unwrap(), RespValue::integer(0));
        assert_eq!(hget(&db, &key("h"), &key("f")).unwrap(), RespValue::bulk(val("2")));
    }

    #[test]
    fn hdel_counts_only_removed_fields() {
        let mut db = Database::new();
        hset(&mut db, &key("h"), &key("a"), &val("1")).unwrap();
        hset(&mut db, &key("h"), &key("b"), &val("2")).unwrap();
        let reply = hdel(&mut db, &key("h"), &[key("a"), key("missing")]).unwrap();
        assert_eq!(reply, RespValue::integer(1));
    }

    #[test]
    fn hdel_prunes_empty_hash() {
        let mut db = Database::new();
        hset(&mut db, &key("h"), &key("a"), &val("1")).unwrap();
        hdel(&mut db, &key("h"), &[key("a")]).unwrap();
        assert!(!db.contains_key(&key("h")));
    }

    #[test]
    fn hmset_then_hmget_and_hgetall() {
        let mut db = Database::new();
        hmset(&mut db, &key("h"), &[key("f1"), val("v1"), key("f2"), val("v2")]).unwrap();
        let reply = hmget(&db, &key("h"), &[key("f1"), key("missing")]).unwrap();
        assert_eq!(reply, RespValue::array(vec![RespValue::bulk(val("v1")), RespValue::nil()]));
    }

    #[test]
    fn hincrby_tracks_running_total() {
        let mut db = Database::new();
        assert_eq!(hincrby(&mut db, &key("h"), &key("c"), &val("5")).unwrap(), RespValue::integer(5));
        assert_eq!(hincrby(&mut db, &key("h"), &key("c"), &val("-2")).unwrap(), RespValue::integer(3));
    }

    #[test]
    fn hget_on_wrong_type_errors() {
        let mut db = Database::new();
        db.insert(key("h"), crate::value::Value::Bstr(val("x")));
        assert!(matches!(hget(&db, &key("h"), &key("f")), Err(CommandError::WrongType)));
    }
}
