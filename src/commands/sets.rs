//! The unordered-set command family, including SMOVE and the SDIFF/SINTER/
//! SUNION algebra and their STORE variants.

use std::collections::HashSet;

use bytes::Bytes;
use rand::seq::IteratorRandom;
use rand::Rng;

use crate::error::CommandError;
use crate::keyspace::{commit, with_value, Database};
use crate::resp::RespValue;
use crate::value::{Kind, Value};

pub fn sadd(db: &mut Database, key: &Bytes, members: &[Bytes]) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::Set, |v| {
        let set = v.as_set_mut().unwrap();
        let mut added = 0i64;
        for m in members {
            if set.insert(m.clone()) {
                added += 1;
            }
        }
        Ok(RespValue::integer(added))
    })
}

pub fn srem(db: &mut Database, key: &Bytes, members: &[Bytes]) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::Set, |v| {
        let set = v.as_set_mut().unwrap();
        let mut removed = 0i64;
        for m in members {
            if set.remove(m) {
                removed += 1;
            }
        }
        Ok(RespValue::integer(removed))
    })
}

pub fn smembers(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Set => {
            Ok(RespValue::array(v.as_set().unwrap().iter().map(|m| RespValue::bulk(m.clone())).collect()))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn scard(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Set => Ok(RespValue::integer(v.as_set().unwrap().len() as i64)),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn sismember(db: &Database, key: &Bytes, member: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Set => Ok(RespValue::integer(v.as_set().unwrap().contains(member) as i64)),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn smove(
    db: &mut Database,
    src: &Bytes,
    dst: &Bytes,
    member: &Bytes,
) -> Result<RespValue, CommandError> {
    match db.get(src) {
        Some(v) if v.kind() == Kind::Set => {
            if !v.as_set().unwrap().contains(member) {
                return Ok(RespValue::integer(0));
            }
        }
        Some(_) => return Err(CommandError::WrongType),
        None => return Ok(RespValue::integer(0)),
    }
    if matches!(db.get(dst), Some(v) if v.kind() != Kind::Set) {
        return Err(CommandError::WrongType);
    }

    let mut src_set = db.get(src).unwrap().as_set().unwrap().clone();
    src_set.remove(member);
    let mut dst_set = match db.get(dst) {
        Some(v) => v.as_set().unwrap().clone(),
        None => HashSet::new(),
    };
    dst_set.insert(member.clone());

    commit(db, src.clone(), Value::Set(src_set));
    commit(db, dst.clone(), Value::Set(dst_set));
    Ok(RespValue::integer(1))
}

pub fn spop(db: &mut Database, key: &Bytes) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::Set, |v| {
        let set = v.as_set_mut().unwrap();
        let mut rng = rand::thread_rng();
        let picked = set.iter().choose(&mut rng).cloned();
        match picked {
            Some(m) => {
                set.remove(&m);
                Ok(RespValue::bulk(m))
            }
            None => Ok(RespValue::nil()),
        }
    })
}

pub fn srandmember(db: &Database, key: &Bytes, count: Option<i64>) -> Result<RespValue, CommandError> {
    let set = match db.get(key) {
        Some(v) if v.kind() == Kind::Set => v.as_set().unwrap(),
        Some(_) => return Err(CommandError::WrongType),
        None => match count {
            Some(_) => return Ok(RespValue::array(Vec::new())),
            None => return Ok(RespValue::nil()),
        },
    };
    let mut rng = rand::thread_rng();
    match count {
        None => Ok(RespValue::bulk_or_nil(set.iter().choose(&mut rng).cloned())),
        Some(n) if n >= 0 => {
            let members: Vec<Bytes> =
                set.iter().cloned().choose_multiple(&mut rng, n as usize);
            Ok(RespValue::array(members.into_iter().map(RespValue::bulk).collect()))
        }
        Some(n) => {
            let items: Vec<&Bytes> = set.iter().collect();
            if items.is_empty() {
                return Ok(RespValue::array(Vec::new()));
            }
            let picks: Vec<RespValue> = (0..n.unsigned_abs())
                .map(|_| RespValue::bulk(items[rng.gen_range(0..items.len())].clone()))
                .collect();
            Ok(RespValue::array(picks))
        }
    }
}

fn set_of(db: &Database, key: &Bytes) -> Result<HashSet<Bytes>, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::Set => Ok(v.as_set().unwrap().clone()),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(HashSet::new()),
    }
}

pub fn sdiff(db: &Database, base: &Bytes, others: &[Bytes]) -> Result<RespValue, CommandError> {
    let result = sdiff_set(db, base, others)?;
    Ok(RespValue::array(result.into_iter().map(RespValue::bulk).collect()))
}

pub fn sinter(db: &Database, base: &Bytes, others: &[Bytes]) -> Result<RespValue, CommandError> {
    let result = sinter_set(db, base, others)?;
    Ok(RespValue::array(result.into_iter().map(RespValue::bulk).collect()))
}

pub fn sunion(db: &Database, base: &Bytes, others: &[Bytes]) -> Result<RespValue, CommandError> {
    let result = sunion_set(db, base, others)?;
    Ok(RespValue::array(result.into_iter().map(RespValue::bulk).collect()))
}

pub fn sdiffstore(
    db: &mut Database,
    dest: &Bytes,
    base: &Bytes,
    others: &[Bytes],
) -> Result<RespValue, CommandError> {
    store_algebra(db, dest, base, others, sdiff_set)
}

pub fn sinterstore(
    db: &mut Database,
    dest: &Bytes,
    base: &Bytes,
    others: &[Bytes],
) -> Result<RespValue, CommandError> {
    store_algebra(db, dest, base, others, sinter_set)
}

pub fn sunionstore(
    db: &mut Database,
    dest: &Bytes,
    base: &Bytes,
    others: &[Bytes],
) -> Result<RespValue, CommandError> {
    store_algebra(db, dest, base, others, sunion_set)
}

fn sdiff_set(db: &Database, base: &Bytes, others: &[Bytes]) -> Result<HashSet<Bytes>, CommandError> {
    let mut result = set_of(db, base)?;
    for other in others {
        let other_set = set_of(db, other)?;
        result.retain(|m| !other_set.contains(m));
    }
    Ok(result)
}

fn sinter_set(db: &Database, base: &Bytes, others: &[Bytes]) -> Result<HashSet<Bytes>, CommandError> {
    let mut result = set_of(db, base)?;
    for other in others {
        let other_set = set_of(db, other)?;
        result.retain(|m| other_set.contains(m));
    }
    Ok(result)
}

fn sunion_set(db: &Database, base: &Bytes, others: &[Bytes]) -> Result<HashSet<Bytes>, CommandError> {
    let mut result = set_of(db, base)?;
    for other in others {
        result.extend(set_of(db, other)?);
    }
    Ok(result)
}

fn store_algebra(
    db: &mut Database,
    dest: &Bytes,
    base: &Bytes,
    others: &[Bytes],
    op: fn(&Database, &Bytes, &[Bytes]) -> Result<HashSet<Bytes>, CommandError>,
) -> Result<RespValue, CommandError> {
    let result = op(db, base, others)?;
    let count = result.len() as i64;
    commit(db, dest.clone(), Value::Set(result));
    Ok(RespValue::integer(count))
}
