//! The sorted-set command family.

use bytes::Bytes;

use crate::error::CommandError;
use crate::keyspace::{commit, with_value, Database};
use crate::resp::RespValue;
use crate::util::{canonical_float, clamp_range};
use crate::value::{Kind, SortedSet, Value};

pub fn zadd(db: &mut Database, key: &Bytes, pairs: &[(f64, Bytes)]) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::ZSet, |v| {
        let zset = v.as_zset_mut().unwrap();
        let mut added = 0i64;
        for (score, member) in pairs {
            if zset.insert(member.clone(), *score) {
                added += 1;
            }
        }
        Ok(RespValue::integer(added))
    })
}

pub fn zcard(db: &Database, key: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => Ok(RespValue::integer(v.as_zset().unwrap().len() as i64)),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn zscore(db: &Database, key: &Bytes, member: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => {
            Ok(RespValue::bulk_or_nil(v.as_zset().unwrap().score(member).map(canonical_float)))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::nil()),
    }
}

pub fn zincrby(
    db: &mut Database,
    key: &Bytes,
    delta: f64,
    member: &Bytes,
) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::ZSet, |v| {
        let zset = v.as_zset_mut().unwrap();
        let current = zset.score(member).unwrap_or(0.0);
        let sum = current + delta;
        if sum.is_nan() {
            return Err(CommandError::generic("resulting score is not a number (NaN)"));
        }
        zset.insert(member.clone(), sum);
        Ok(RespValue::bulk(canonical_float(sum)))
    })
}

fn rank_window(zset: &SortedSet, start: i64, stop: i64) -> Vec<(Bytes, f64)> {
    match clamp_range(zset.len(), start, stop) {
        Some((lo, hi)) => zset.iter_ascending().skip(lo).take(hi - lo).map(|(m, s)| (m.clone(), s)).collect(),
        None => Vec::new(),
    }
}

fn render_range(items: Vec<(Bytes, f64)>, with_scores: bool) -> RespValue {
    let mut out = Vec::new();
    for (member, score) in items {
        out.push(RespValue::bulk(member));
        if with_scores {
            out.push(RespValue::bulk(canonical_float(score)));
        }
    }
    RespValue::array(out)
}

pub fn zrange(
    db: &Database,
    key: &Bytes,
    start: i64,
    stop: i64,
    with_scores: bool,
) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => Ok(render_range(rank_window(v.as_zset().unwrap(), start, stop), with_scores)),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn zrevrange(
    db: &Database,
    key: &Bytes,
    start: i64,
    stop: i64,
    with_scores: bool,
) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => {
            let mut items = rank_window(v.as_zset().unwrap(), start, stop);
            items.reverse();
            Ok(render_range(items, with_scores))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn zrank(db: &Database, key: &Bytes, member: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => {
            Ok(v.as_zset().unwrap().rank(member).map(|r| RespValue::integer(r as i64)).unwrap_or(RespValue::nil()))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::nil()),
    }
}

pub fn zrevrank(db: &Database, key: &Bytes, member: &Bytes) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => {
            let zset = v.as_zset().unwrap();
            Ok(zset
                .rank(member)
                .map(|r| RespValue::integer((zset.len() - 1 - r) as i64))
                .unwrap_or(RespValue::nil()))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::nil()),
    }
}

pub fn zrem(db: &mut Database, key: &Bytes, members: &[Bytes]) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::ZSet, |v| {
        let zset = v.as_zset_mut().unwrap();
        let mut removed = 0i64;
        for m in members {
            if zset.remove(m) {
                removed += 1;
            }
        }
        Ok(RespValue::integer(removed))
    })
}

pub fn zrangebyscore(
    db: &Database,
    key: &Bytes,
    min: f64,
    max: f64,
    with_scores: bool,
) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => {
            let items: Vec<(Bytes, f64)> =
                v.as_zset().unwrap().range_by_score(min, max).map(|(m, s)| (m.clone(), s)).collect();
            Ok(render_range(items, with_scores))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn zrevrangebyscore(
    db: &Database,
    key: &Bytes,
    max: f64,
    min: f64,
    with_scores: bool,
) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => {
            let mut items: Vec<(Bytes, f64)> =
                v.as_zset().unwrap().range_by_score(min, max).map(|(m, s)| (m.clone(), s)).collect();
            items.reverse();
            Ok(render_range(items, with_scores))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(Vec::new())),
    }
}

pub fn zcount(db: &Database, key: &Bytes, min: f64, max: f64) -> Result<RespValue, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => {
            Ok(RespValue::integer(v.as_zset().unwrap().range_by_score(min, max).count() as i64))
        }
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

pub fn zremrangebyrank(
    db: &mut Database,
    key: &Bytes,
    start: i64,
    stop: i64,
) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::ZSet, |v| {
        let zset = v.as_zset_mut().unwrap();
        let victims: Vec<Bytes> = rank_window(zset, start, stop).into_iter().map(|(m, _)| m).collect();
        for m in &victims {
            zset.remove(m);
        }
        Ok(RespValue::integer(victims.len() as i64))
    })
}

pub fn zremrangebyscore(
    db: &mut Database,
    key: &Bytes,
    min: f64,
    max: f64,
) -> Result<RespValue, CommandError> {
    with_value(db, key, Kind::ZSet, |v| {
        let zset = v.as_zset_mut().unwrap();
        Ok(RespValue::integer(zset.remove_by_score(min, max) as i64))
    })
}

fn zset_of(db: &Database, key: &Bytes) -> Result<SortedSet, CommandError> {
    match db.get(key) {
        Some(v) if v.kind() == Kind::ZSet => Ok(v.as_zset().unwrap().clone()),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(SortedSet::default()),
    }
}

pub fn zinterstore(
    db: &mut Database,
    dest: &Bytes,
    keys: &[Bytes],
) -> Result<RespValue, CommandError> {
    let sets: Vec<SortedSet> = keys.iter().map(|k| zset_of(db, k)).collect::<Result<_, _>>()?;
    let Some(first) = sets.first() else {
        return Err(CommandError::generic("wrong number of arguments for ZINTERSTORE"));
    };
    let mut result = SortedSet::default();
    for (member, score) in first.iter_ascending() {
        let mut total = score;
        let mut present_everywhere = true;
        for other in &sets[1..] {
            match other.score(member) {
                Some(s) => total += s,
                None => {
                    present_everywhere = false;
                    break;
                }
            }
        }
        if present_everywhere {
            result.insert(member.clone(), total);
        }
    }
    let count = result.len() as i64;
    commit(db, dest.clone(), Value::ZSet(result));
    Ok(RespValue::integer(count))
}

pub fn zunionstore(
    db: &mut Database,
    dest: &Bytes,
    keys: &[Bytes],
) -> Result<RespValue, CommandError> {
    let sets: Vec<SortedSet> = keys.iter().map(|k| zset_of(db, k)).collect::<Result<_, _>>()?;
    let mut result = SortedSet::default();
    for set in &sets {
        for (member, score) in set.iter_ascending() {
            let total = result.score(member).unwrap_or(0.0) + score;
            result.insert(member.clone(), total);
        }
    }
    let count = result.len() as i64;
    commit(db, dest.clone(), Value::ZSet(result));
    Ok(RespValue::integer(count))
}
