//! The keyspace: a fixed-size vector of databases, each a key → value map,
//! with the empty-container pruning rule enforced at a single choke point.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::CommandError;
use crate::value::{Kind, Value};

pub type Database = HashMap<Bytes, Value>;

pub struct Keyspace {
    databases: Vec<Database>,
}

impl Keyspace {
    pub fn new(num_databases: usize) -> Self {
        Keyspace {
            databases: (0..num_databases).map(|_| Database::new()).collect(),
        }
    }

    pub fn num_databases(&self) -> usize {
        self.databases.len()
    }

    pub fn db(&mut self, index: usize) -> &mut Database {
        &mut self.databases[index]
    }

    pub fn db_ref(&self, index: usize) -> &Database {
        &self.databases[index]
    }

    pub fn flush_db(&mut self, index: usize) {
        self.databases[index].clear();
    }

    pub fn flush_all(&mut self) {
        for db in &mut self.databases {
            db.clear();
        }
    }
}

/// Commits `value` back under `key`, deleting the key instead if the value
/// is an empty container. Bstr is never pruned (the empty string is a valid
/// value).
pub fn commit(db: &mut Database, key: Bytes, value: Value) {
    if value.is_empty_container() {
        db.remove(&key);
    } else {
        db.insert(key, value);
    }
}

/// The `with_value` combinator (§4.3 / §9): resolves or synthesizes the
/// value behind `key` with a type check, hands a clone to `f`, and commits
/// the (possibly mutated) result only if `f` succeeds. A failure leaves the
/// keyspace untouched — this is what makes each command atomic.
pub fn with_value<F>(
    db: &mut Database,
    key: &Bytes,
    kind: Kind,
    f: F,
) -> Result<crate::resp::RespValue, CommandError>
where
    F: FnOnce(&mut Value) -> Result<crate::resp::RespValue, CommandError>,
{
    let mut value = match db.get(key) {
        Some(v) if v.kind() == kind => v.clone(),
        Some(_) => return Err(CommandError::WrongType),
        None => Value::empty(kind),
    };
    let reply = f(&mut value)?;
    commit(db, key.clone(), value);
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resp::RespValue;

    #[test]
    fn with_value_synthesizes_empty_instance_for_absent_key() {
        let mut db = Database::new();
        let key = Bytes::from_static(b"k");
        let reply = with_value(&mut db, &key, Kind::List, |v| {
            let list = v.as_list_mut().unwrap();
            list.push_back(Bytes::from_static(b"x"));
            Ok(RespValue::ok())
        })
        .unwrap();
        assert_eq!(reply, RespValue::ok());
        assert_eq!(db.get(&key).unwrap().as_list().unwrap().len(), 1);
    }

    #[test]
    fn with_value_rejects_wrong_type() {
        let mut db = Database::new();
        let key = Bytes::from_static(b"k");
        db.insert(key.clone(), Value::Bstr(Bytes::from_static(b"x")));
        let err = with_value(&mut db, &key, Kind::List, |_| Ok(RespValue::ok())).unwrap_err();
        assert!(matches!(err, CommandError::WrongType));
    }

    #[test]
    fn with_value_rolls_back_on_handler_error() {
        let mut db = Database::new();
        let key = Bytes::from_static(b"k");
        db.insert(
            key.clone(),
            Value::List(std::collections::VecDeque::from(vec![Bytes::from_static(
                b"a",
            )])),
        );
        let err = with_value(&mut db, &key, Kind::List, |v| {
            v.as_list_mut().unwrap().push_back(Bytes::from_static(b"b"));
            Err(CommandError::generic("boom"))
        })
        .unwrap_err();
        assert!(matches!(err, CommandError::Generic(_)));
        assert_eq!(db.get(&key).unwrap().as_list().unwrap().len(), 1);
    }

    #[test]
    fn commit_prunes_empty_containers() {
        let mut db = Database::new();
        let key = Bytes::from_static(b"k");
        commit(&mut db, key.clone(), Value::List(Default::default()));
        assert!(!db.contains_key(&key));
    }

    #[test]
    fn commit_keeps_empty_bstr() {
        let mut db = Database::new();
        let key = Bytes::from_static(b"k");
        commit(&mut db, key.clone(), Value::Bstr(Bytes::new()));
        assert!(db.contains_key(&key));
    }
}
