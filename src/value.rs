//! The five value shapes that can live under a key, plus the DUMP/RESTORE
//! binary codec.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bstr,
    List,
    Hash,
    Set,
    ZSet,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bstr => "string",
            Kind::List => "list",
            Kind::Hash => "hash",
            Kind::Set => "set",
            Kind::ZSet => "zset",
        }
    }
}

/// Total-ordering wrapper over `f64`. Safe because NaN is rejected at every
/// score-accepting boundary before a `ScoreKey` is ever constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreKey(pub f64);

impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).expect("NaN score")
    }
}

#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    scores: HashMap<Bytes, f64>,
    by_rank: BTreeSet<(ScoreKey, Bytes)>,
}

impl SortedSet {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score(&self, member: &Bytes) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Inserts or updates `member`'s score. Returns `true` if the member was
    /// newly inserted.
    pub fn insert(&mut self, member: Bytes, score: f64) -> bool {
        if let Some(&old) = self.scores.get(&member) {
            self.by_rank.remove(&(ScoreKey(old), member.clone()));
            self.by_rank.insert((ScoreKey(score), member.clone()));
            self.scores.insert(member, score);
            false
        } else {
            self.by_rank.insert((ScoreKey(score), member.clone()));
            self.scores.insert(member, score);
            true
        }
    }

    pub fn remove(&mut self, member: &Bytes) -> bool {
        if let Some(score) = self.scores.remove(member) {
            self.by_rank.remove(&(ScoreKey(score), member.clone()));
            true
        } else {
            false
        }
    }

    /// Ascending iteration order: (score, member-lex).
    pub fn iter_ascending(&self) -> impl DoubleEndedIterator<Item = (&Bytes, f64)> {
        self.by_rank.iter().map(|(s, m)| (m, s.0))
    }

    /// 0-based ascending rank of `member`, or `None` if absent. O(rank).
    pub fn rank(&self, member: &Bytes) -> Option<usize> {
        let score = self.score(member)?;
        let key = (ScoreKey(score), member.clone());
        self.by_rank.iter().position(|entry| entry == &key)
    }

    pub fn range_by_score(&self, min: f64, max: f64) -> impl Iterator<Item = (&Bytes, f64)> {
        self.by_rank
            .range((ScoreKey(min), Bytes::new())..)
            .take_while(move |(s, _)| s.0 <= max)
            .filter(move |(s, _)| s.0 >= min)
            .map(|(s, m)| (m, s.0))
    }

    pub fn remove_by_score(&mut self, min: f64, max: f64) -> usize {
        let victims: Vec<Bytes> = self
            .range_by_score(min, max)
            .map(|(m, _)| m.clone())
            .collect();
        for m in &victims {
            self.remove(m);
        }
        victims.len()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Bstr(Bytes),
    List(VecDeque<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
    Set(HashSet<Bytes>),
    ZSet(SortedSet),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bstr(_) => Kind::Bstr,
            Value::List(_) => Kind::List,
            Value::Hash(_) => Kind::Hash,
            Value::Set(_) => Kind::Set,
            Value::ZSet(_) => Kind::ZSet,
        }
    }

    pub fn empty(kind: Kind) -> Self {
        match kind {
            Kind::Bstr => Value::Bstr(Bytes::new()),
            Kind::List => Value::List(VecDeque::new()),
            Kind::Hash => Value::Hash(HashMap::new()),
            Kind::Set => Value::Set(HashSet::new()),
            Kind::ZSet => Value::ZSet(SortedSet::default()),
        }
    }

    /// Bstr is never pruned on emptiness (an empty string is a legitimate
    /// value); only containers are subject to the no-empty-container rule.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Value::Bstr(_) => false,
            Value::List(l) => l.is_empty(),
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::ZSet(z) => z.is_empty(),
        }
    }

    pub fn as_bstr(&self) -> Option<&Bytes> {
        match self {
            Value::Bstr(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&VecDeque<Bytes>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut VecDeque<Bytes>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashMap<Bytes, Bytes>> {
        match self {
            Value::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_hash_mut(&mut self) -> Option<&mut HashMap<Bytes, Bytes>> {
        match self {
            Value::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&HashSet<Bytes>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut HashSet<Bytes>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_zset(&self) -> Option<&SortedSet> {
        match self {
            Value::ZSet(z) => Some(z),
            _ => None,
        }
    }

    pub fn as_zset_mut(&mut self) -> Option<&mut SortedSet> {
        match self {
            Value::ZSet(z) => Some(z),
            _ => None,
        }
    }
}

// --- DUMP / RESTORE -------------------------------------------------------
//
// A deterministic, self-describing binary encoding. Not wire-compatible with
// real Redis's RDB format; the only contract is the round trip in §4.4.

const TAG_BSTR: u8 = 0;
const TAG_LIST: u8 = 1;
const TAG_HASH: u8 = 2;
const TAG_SET: u8 = 3;
const TAG_ZSET: u8 = 4;

fn put_bytes(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u32(data.len() as u32);
    buf.put_slice(data);
}

fn take_bytes(data: &mut Bytes) -> Result<Bytes, CommandError> {
    if data.len() < 4 {
        return Err(CommandError::generic("bad DUMP payload"));
    }
    let len = data.get_u32() as usize;
    if data.len() < len {
        return Err(CommandError::generic("bad DUMP payload"));
    }
    Ok(data.split_to(len))
}

pub fn dump(value: &Value) -> Bytes {
    let mut buf = BytesMut::new();
    match value {
        Value::Bstr(b) => {
            buf.put_u8(TAG_BSTR);
            put_bytes(&mut buf, b);
        }
        Value::List(items) => {
            buf.put_u8(TAG_LIST);
            buf.put_u32(items.len() as u32);
            for item in items {
                put_bytes(&mut buf, item);
            }
        }
        Value::Hash(map) => {
            buf.put_u8(TAG_HASH);
            buf.put_u32(map.len() as u32);
            for (field, val) in map {
                put_bytes(&mut buf, field);
                put_bytes(&mut buf, val);
            }
        }
        Value::Set(set) => {
            buf.put_u8(TAG_SET);
            buf.put_u32(set.len() as u32);
            for member in set {
                put_bytes(&mut buf, member);
            }
        }
        Value::ZSet(zset) => {
            buf.put_u8(TAG_ZSET);
            buf.put_u32(zset.len() as u32);
            for (member, score) in zset.iter_ascending() {
                put_bytes(&mut buf, member);
                buf.put_f64(score);
            }
        }
    }
    buf.freeze()
}

pub fn restore(blob: &[u8]) -> Result<Value, CommandError> {
    let mut data = Bytes::copy_from_slice(blob);
    if data.is_empty() {
        return Err(CommandError::generic("bad DUMP payload"));
    }
    let tag = data.get_u8();
    match tag {
        TAG_BSTR => Ok(Value::Bstr(take_bytes(&mut data)?)),
        TAG_LIST => {
            let count = read_u32(&mut data)?;
            let mut items = VecDeque::with_capacity(count as usize);
            for _ in 0..count {
                items.push_back(take_bytes(&mut data)?);
            }
            Ok(Value::List(items))
        }
        TAG_HASH => {
            let count = read_u32(&mut data)?;
            let mut map = HashMap::with_capacity(count as usize);
            for _ in 0..count {
                let field = take_bytes(&mut data)?;
                let val = take_bytes(&mut data)?;
                map.insert(field, val);
            }
            Ok(Value::Hash(map))
        }
        TAG_SET => {
            let count = read_u32(&mut data)?;
            let mut set = HashSet::with_capacity(count as usize);
            for _ in 0..count {
                set.insert(take_bytes(&mut data)?);
            }
            Ok(Value::Set(set))
        }
        TAG_ZSET => {
            let count = read_u32(&mut data)?;
            let mut zset = SortedSet::default();
            for _ in 0..count {
                let member = take_bytes(&mut data)?;
                if data.len() < 8 {
                    return Err(CommandError::generic("bad DUMP payload"));
                }
                let score = data.get_f64();
                zset.insert(member, score);
            }
            Ok(Value::ZSet(zset))
        }
        _ => Err(CommandError::generic("bad DUMP payload")),
    }
}

fn read_u32(data: &mut Bytes) -> Result<u32, CommandError> {
    if data.len() < 4 {
        return Err(CommandError::generic("bad DUMP payload"));
    }
    Ok(data.get_u32())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_restore_round_trips_bstr() {
        let v = Value::Bstr(Bytes::from_static(b"hello"));
        let restored = restore(&dump(&v)).unwrap();
        assert_eq!(restored.as_bstr(), v.as_bstr());
    }

    #[test]
    fn dump_restore_round_trips_list() {
        let mut items = VecDeque::new();
        items.push_back(Bytes::from_static(b"a"));
        items.push_back(Bytes::from_static(b"b"));
        let v = Value::List(items.clone());
        let restored = restore(&dump(&v)).unwrap();
        assert_eq!(restored.as_list(), Some(&items));
    }

    #[test]
    fn dump_restore_round_trips_zset_scores() {
        let mut z = SortedSet::default();
        z.insert(Bytes::from_static(b"a"), 1.5);
        z.insert(Bytes::from_static(b"b"), -2.0);
        let v = Value::ZSet(z);
        let restored = restore(&dump(&v)).unwrap();
        let rz = restored.as_zset().unwrap();
        assert_eq!(rz.score(&Bytes::from_static(b"a")), Some(1.5));
        assert_eq!(rz.score(&Bytes::from_static(b"b")), Some(-2.0));
    }

    #[test]
    fn sorted_set_orders_by_score_then_member() {
        let mut z = SortedSet::default();
        z.insert(Bytes::from_static(b"c"), 1.0);
        z.insert(Bytes::from_static(b"a"), 1.0);
        z.insert(Bytes::from_static(b"b"), 0.5);
        let order: Vec<&[u8]> = z.iter_ascending().map(|(m, _)| m.as_ref()).collect();
        assert_eq!(order, vec![b"b".as_ref(), b"a".as_ref(), b"c".as_ref()]);
    }

    #[test]
    fn sorted_set_insert_returns_whether_new() {
        let mut z = SortedSet::default();
        assert!(z.insert(Bytes::from_static(b"a"), 1.0));
        assert!(!z.insert(Bytes::from_static(b"a"), 2.0));
        assert_eq!(z.score(&Bytes::from_static(b"a")), Some(2.0));
    }
}
