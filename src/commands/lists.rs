//! The list command family: push/pop at either end, indexed access, and the
//! splice operations (LINSERT, LREM, LSET, LTRIM, RPOPLPUSH).

use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::CommandError;
use crate::keyspace::{commit, with_value, Database};
use crate::resp::RespValue;
use crate::util::clamp_range;
use crate::value::Kind;

pub fn lpush(db: &mut Database, key: &Bytes, values: &[Bytes]) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::List, |v| {
        let list = v.as_list_mut().unwrap();
        for value in values {
            list.push_front(value.clone());
        }
        Ok(RespValue::integer(list.len() as i64))
    })
}

pub fn rpush(db: &mut Database, key: &Bytes, values: &[Bytes]) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::List, |v| {
        let list = v.as_list_mut().unwrap();
        for value in values {
            list.push_back(value.clone());
        }
        Ok(RespValue::integer(list.len() as i64))
    })
}

pub fn lpushx(db: &mut Database, key: &Bytes, values: &[Bytes]) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::List => lpush(db, key, values),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn rpushx(db: &mut Database, key: &Bytes, values: &[Bytes]) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::List => rpush(db, key, values),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn lpop(db: &mut Database, key: &Bytes) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::List, |v| {
        Ok(RespValue::bulk_or_nil(v.as_list_mut().unwrap().pop_front()))
    })
}

pub fn rpop(db: &mut Database, key: &Bytes) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::List, |v| {
        Ok(RespValue::bulk_or_nil(v.as_list_mut().unwrap().pop_back()))
    })
}

pub fn llen(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::List => Ok(RespValue::integer(v.as_list().unwrap().len() as i64)),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn lindex(db: &Database, key: &Bytes, index: i64) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::List => {
            let list = v.as_list().unwrap();
            let idx = normalize_index(list.len(), index);
            Ok(RespValue::bulk_or_nil(idx.and_then(|i| list.get(i).cloned())))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::nil()),
    }
}

fn normalize_index(len: usize, index: i64) -> Option<usize> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved as usize >= len {
        None
    } else {
        Some(resolved as usize)
    }
}

pub fn lrange(db: &Database, key: &Bytes, start: i64, stop: i64) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::List => {
            let list = v.as_list().unwrap();
            let items = match clamp_range(list.len(), start, stop) {
                Some((lo, hi)) => list.iter().skip(lo).take(hi - lo).map(|b| RespValue::bulk(b.clone())).collect(),
                None => Vec::new(),
            };
            Ok(RespValue::array(items))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn linsert(
    db: &mut Database,
    key: &Bytes,
    before: bool,
    pivot: &Bytes,
    value: &Bytes,
) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::List => {}
        Some(_) => return Err(CommandError::WrongType),
        None => return Ok(RespValue::integer(0)),
    }
    with_value(db, key, Kind::List, |v| {
        let list = v.as_list_mut().unwrap();
        match list.iter().position(|item| item == pivot) {
            Some(pos) => {
                let at = if before { pos } else { pos + 1 };
                list.insert(at, value.clone());
                Ok(RespValue::integer(list.len() as i64))
            }
            None => Ok(RespValue::integer(-1)),
        }
    })
}

pub fn lrem(db: &mut Database, key: &Bytes, count: i64, value: &Bytes) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::List, |v| {
        let list = v.as_list_mut().unwrap();
        let removed = remove_occurrences(list, count, value);
        Ok(RespValue::integer(removed))
    })
}

fn remove_occurrences(list: &mut VecDeque<Bytes>, count: i64, value: &Bytes) -> i64 {
    let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() as usize };
    let mut removed = 0usize;
    if count >= 0 {
        let mut i = 0;
        while i < list.len() && removed < limit {
            if list[i] == *value {
                list.remove(i);
                removed += 1;
            } else {
                i += 1;
            }
        }
    } else {
        let mut i = list.len();
        while i > 0 && removed < limit {
            i -= 1;
            if list[i] == *value {
                list.remove(i);
                removed += 1;
            }
        }
    }
    removed as i64
}

pub fn lset(db: &mut Database, key: &Bytes, index: i64, value: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::List => {
            if v.as_list().unwrap().is_empty() {
                return Err(CommandError::generic("no such key"));
            }
        }
        Some(_) => return Err(CommandError::WrongType),
        None => return Err(CommandError::generic("no such key")),
    }
    with_value(db, key, Kind::List, |v| {
        let list = v.as_list_mut().unwrap();
        let len = list.len();
        match normalize_index(len, index) {
            Some(i) => {
                list[i] = value.clone();
                Ok(RespValue::ok())
            }
            None => Err(CommandError::generic("index out of range")),
        }
    })
}

pub fn ltrim(db: &mut Database, key: &Bytes, start: i64, stop: i64) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::List, |v| {
        let list = v.as_list_mut().unwrap();
        match clamp_range(list.len(), start, stop) {
            Some((lo, hi)) => {
                let trimmed: VecDeque<Bytes> = list.iter().skip(lo).take(hi - lo).cloned().collect();
                *list = trimmed;
            }
            None => list.clear(),
        }
        Ok(RespValue::ok())
    })
}

pub fn rpoplpush(db: &mut Database, src: &Bytes, dst: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(src) {
        Some(v) if v.kind() == Kind::List => {
            if v.as_list().unwrap().is_empty() {
                return Ok(RespValue::nil());
            }
        }
        Some(_) => return Err(CommandError::WrongType),
        None => return Ok(RespValue::nil()),
    }
    if matches!(db.get(dst), Some(v) if v.kind() != Kind::List) {
        return Err(CommandError::WrongType);
    }

    if src == dst {
        let mut list = db.get(src).unwrap().as_list().unwrap().clone();
        let value = list.pop_back().unwrap();
        list.push_front(value.clone());
        commit(db, src.clone(), crate::value::Value::List(list));
        return Ok(RespValue::bulk(value));
    }

    let mut src_list = db.get(src).unwrap().as_list().unwrap().clone();
    let value = src_list.pop_back().unwrap();
    let mut dst_list = match db.get(dst) {
        Some(v) => v.as_list().unwrap().clone(),
        None => VecDeque::new(),
    };
    dst_list.push_front(value.clone());

    commit(db, src.clone(), crate::value::Value::List(src_list));
    commit(db, dst.clone(), crate::value::Value::List(dst_list));
    Ok(RespValue::bulk(value))
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
    fn lpush_reverses_argument_order() {
        let mut db = Database::new();
        lpush(&mut db, &key("l"), &[val("a"), val("b"), val("c")]).unwrap();
        let reply = lrange(&db, &key("l"), 0, -1).unwrap();
        assert_eq!(
            reply,
            RespValue::array(vec![RespValue::bulk(val("c")), RespValue::bulk(val("b")), RespValue::bulk(val("a"))])
        );
    }

    #[test]
    fn lpushx_noop_on_absent_key() {
        let mut db = Database::new();
        assert_eq!(lpushx(&mut db, &key("l"), &[val("a")]).unwrap(), RespValue::integer(0));
        assert!(!db.contains_key(&key("l")));
    }

    #[test]
    fn lpop_rpop_empty_list_prunes_key() {
        let mut db = Database::new();
        rpush(&mut db, &key("l"), &[val("only")]).unwrap();
        assert_eq!(lpop(&mut db, &key("l")).unwrap(), RespValue::bulk(val("only")));
        assert!(!db.contains_key(&key("l")));
    }

    #[test]
    fn lindex_supports_negative() {
        let mut db = Database::new();
        rpush(&mut db, &key("l"), &[val("a"), val("b"), val("c")]).unwrap();
        assert_eq!(lindex(&db, &key("l"), -1).unwrap(), RespValue::bulk(val("c")));
    }

    #[test]
    fn linsert_before_and_missing_pivot() {
        let mut db = Database::new();
        rpush(&mut db, &key("l"), &[val("a"), val("c")]).unwrap();
        assert_eq!(
            linsert(&mut db, &key("l"), true, &val("c"), &val("b")).unwrap(),
            RespValue::integer(3)
        );
        assert_eq!(
            linsert(&mut db, &key("l"), true, &val("zzz"), &val("x")).unwrap(),
            RespValue::integer(-1)
        );
    }

    #[test]
    fn lrem_respects_sign_and_zero() {
        let mut db = Database::new();
        rpush(&mut db, &key("l"), &[val("a"), val("b"), val("a"), val("a")]).unwrap();
        assert_eq!(lrem(&mut db, &key("l"), 2, &val("a")).unwrap(), RespValue::integer(2));
    }

    #[test]
    fn lset_out_of_range_is_error() {
        let mut db = Database::new();
        rpush(&mut db, &key("l"), &[val("a")]).unwrap();
        assert!(lset(&mut db, &key("l"), 5, &val("x")).is_err());
    }

    #[test]
    fn lset_absent_key_reports_no_such_key() {
        let mut db = Database::new();
        let err = lset(&mut db, &key("l"), 0, &val("x")).unwrap_err();
        assert_eq!(err.to_string(), "ERR no such key");
    }

    #[test]
    fn ltrim_keeps_inclusive_range() {
        let mut db = Database::new();
        rpush(&mut db, &key("l"), &[val("a"), val("b"), val("c"), val("d")]).unwrap();
        ltrim(&mut db, &key("l"), 1, 2).unwrap();
        assert_eq!(
            lrange(&db, &key("l"), 0, -1).unwrap(),
            RespValue::array(vec![RespValue::bulk(val("b")), RespValue::bulk(val("c"))])
        );
    }

    #[test]
    fn rpoplpush_moves_tail_to_head() {
        let mut db = Database::new();
        rpush(&mut db, &key("src"), &[val("a"), val("b")]).unwrap();
        assert_eq!(rpoplpush(&mut db, &key("src"), &key("dst")).unwrap(), RespValue::bulk(val("b")));
        assert_eq!(
            lrange(&db, &key("dst"), 0, -1).unwrap(),
            RespValue::array(vec![RespValue::bulk(val("b"))])
        );
    }

    #[test]
    fn rpoplpush_on_empty_source_is_nil_and_skips_dst() {
        let mut db = Database::new();
        assert_eq!(rpoplpush(&mut db, &key("src"), &key("dst")).unwrap(), RespValue::nil());
        assert!(!db.contains_key(&key("dst")));
    }

    #[test]
    fn rpoplpush_same_key_rotates_without_duplicating() {
        let mut db = Database::new();
        rpush(&mut db, &key("l"), &[val("a"), val("b")]).unwrap();
        assert_eq!(rpoplpush(&mut db, &key("l"), &key("l")).unwrap(), RespValue::bulk(val("b")));
        assert_eq!(
            lrange(&db, &key("l"), 0, -1).unwrap(),
            RespValue::array(vec![RespValue::bulk(val("b")), RespValue::bulk(val("a"))])
        );
    }
}
