//! Command-name routing: one connection's state plus the uppercase match
//! that turns a parsed `Frame` into a `RespValue` reply.

use bytes::Bytes;

use crate::commands::{connection, hashes, keys, lists, server, sets, strings, zsets};
use crate::error::CommandError;
use crate::keyspace::Keyspace;
use crate::parser::Frame;
use crate::resp::RespValue;
use crate::util::{parse_f64_arg, parse_i64_arg};

pub struct Connection {
    pub db_index: usize,
}

impl Connection {
    pub fn new() -> Self {
        Connection { db_index: 0 }
    }
}

/// What the dispatcher wants the driver to do after replying.
pub enum Outcome {
    Reply(RespValue),
    Close(RespValue),
}

fn arity_error(name: &str) -> CommandError {
    CommandError::Arity(name.to_string())
}

pub fn dispatch(keyspace: &mut Keyspace, conn: &mut Connection, frame: &Frame) -> Outcome {
    match dispatch_inner(keyspace, conn, frame) {
        Ok(outcome) => outcome,
        Err(err) => Outcome::Reply(RespValue::error(err.wire_text())),
    }
}

fn dispatch_inner(
    keyspace: &mut Keyspace,
    conn: &mut Connection,
    frame: &Frame,
) -> Result<Outcome, CommandError> {
    let Some(name_bytes) = frame.first() else {
        return Err(CommandError::generic("empty command"));
    };
    let name = String::from_utf8_lossy(name_bytes).to_ascii_uppercase();
    let args = &frame[1..];

    macro_rules! need {
        ($n:expr) => {
            if args.len() != $n {
                return Err(arity_error(&name));
            }
        };
    }
    macro_rules! need_at_least {
        ($n:expr) => {
            if args.len() < $n {
                return Err(arity_error(&name));
            }
        };
    }

    // These touch `keyspace` itself (database count, all databases, or none
    // at all) rather than a single selected database, so they're resolved
    // before `db` takes its mutable borrow below.
    match name.as_str() {
        "PING" => {
            if args.len() > 1 {
                return Err(arity_error(&name));
            }
            return Ok(Outcome::Reply(connection::ping(args.first())));
        }
        "ECHO" => {
            need!(1);
            return Ok(Outcome::Reply(connection::echo(&args[0])));
        }
        "SELECT" => {
            need!(1);
            conn.db_index = connection::select(keyspace.num_databases(), &args[0])?;
            return Ok(Outcome::Reply(RespValue::ok()));
        }
        "AUTH" => {
            need!(1);
            return Ok(Outcome::Reply(connection::auth()));
        }
        "QUIT" => return Ok(Outcome::Close(RespValue::ok())),
        "DBSIZE" => return Ok(Outcome::Reply(server::dbsize(keyspace, conn.db_index))),
        "FLUSHDB" => return Ok(Outcome::Reply(server::flushdb(keyspace, conn.db_index))),
        "FLUSHALL" => return Ok(Outcome::Reply(server::flushall(keyspace))),
        "INFO" => return Ok(Outcome::Reply(server::info(keyspace))),
        "TIME" => return Ok(Outcome::Reply(server::time()?)),
        "DEBUG" => return Ok(Outcome::Reply(server::debug(args))),
        "COMMAND" => return Ok(Outcome::Reply(server::command())),
        _ => {}
    }

    let db = keyspace.db(conn.db_index);

    let reply = match name.as_str() {
        "DEL" => {
            need_at_least!(1);
            keys::del(db, args)
        }
        "EXISTS" => {
            need!(1);
            keys::exists(db, &args[0])
        }
        "KEYS" => {
            need!(1);
            keys::keys_cmd(db, &args[0])
        }
        "RENAME" => {
            need!(2);
            keys::rename(db, &args[0], &args[1])?
        }
        "RENAMENX" => {
            need!(2);
            keys::renamenx(db, &args[0], &args[1])?
        }
        "RANDOMKEY" => {
            need!(0);
            keys::randomkey(db)
        }
        "TYPE" => {
            need!(1);
            keys::type_cmd(db, &args[0])
        }
        "DUMP" => {
            need!(1);
            keys::dump(db, &args[0])
        }
        "RESTORE" => {
            need!(3);
            keys::restore(db, &args[0], &args[1], &args[2])?
        }
        "EXPIRE" | "PERSIST" | "TTL" | "MOVE" => return Err(CommandError::NotImplemented),
        "SORT" => {
            need_at_least!(1);
            keys::sort(args)?
        }

        "GET" => {
            need!(1);
            strings::get(db, &args[0])?
        }
        "SET" => {
            need!(2);
            strings::set(db, &args[0], &args[1])
        }
        "GETSET" => {
            need!(2);
            strings::getset(db, &args[0], &args[1])?
        }
        "SETNX" => {
            need!(2);
            strings::setnx(db, &args[0], &args[1])
        }
        "APPEND" => {
            need!(2);
            strings::append(db, &args[0], &args[1])?
        }
        "STRLEN" => {
            need!(1);
            strings::strlen(db, &args[0])?
        }
        "MGET" => {
            need_at_least!(1);
            strings::mget(db, args)
        }
        "MSET" => {
            need_at_least!(2);
            strings::mset(db, args)?
        }
        "MSETNX" => {
            need_at_least!(2);
            strings::msetnx(db, args)?
        }
        "GETRANGE" => {
            need!(3);
            strings::getrange(db, &args[0], parse_i64_arg(&args[1])?, parse_i64_arg(&args[2])?)?
        }
        "SETRANGE" => {
            need!(3);
            strings::setrange(db, &args[0], parse_i64_arg(&args[1])?, &args[2])?
        }
        "INCR" => {
            need!(1);
            strings::incr(db, &args[0])?
        }
        "DECR" => {
            need!(1);
            strings::decr(db, &args[0])?
        }
        "INCRBY" => {
            need!(2);
            strings::incrby(db, &args[0], parse_i64_arg(&args[1])?)?
        }
        "DECRBY" => {
            need!(2);
            strings::decrby(db, &args[0], parse_i64_arg(&args[1])?)?
        }
        "INCRBYFLOAT" => {
            need!(2);
            strings::incrbyfloat(db, &args[0], parse_f64_arg(&args[1])?)?
        }

        "HGET" => {
            need!(2);
            hashes::hget(db, &args[0], &args[1])?
        }
        "HSET" => {
            need!(3);
            hashes::hset(db, &args[0], &args[1], &args[2])?
        }
        "HSETNX" => {
            need!(3);
            hashes::hsetnx(db, &args[0], &args[1], &args[2])?
        }
        "HMSET" => {
            need_at_least!(3);
            hashes::hmset(db, &args[0], &args[1..])?
        }
        "HMGET" => {
            need_at_least!(2);
            hashes::hmget(db, &args[0], &args[1..])?
        }
        "HDEL" => {
            need_at_least!(2);
            hashes::hdel(db, &args[0], &args[1..])?
        }
        "HEXISTS" => {
            need!(2);
            hashes::hexists(db, &args[0], &args[1])?
        }
        "HKEYS" => {
            need!(1);
            hashes::hkeys(db, &args[0])?
        }
        "HVALS" => {
            need!(1);
            hashes::hvals(db, &args[0])?
        }
        "HGETALL" => {
            need!(1);
            hashes::hgetall(db, &args[0])?
        }
        "HLEN" => {
            need!(1);
            hashes::hlen(db, &args[0])?
        }
        "HINCRBY" => {
            need!(3);
            hashes::hincrby(db, &args[0], &args[1], &args[2])?
        }
        "HINCRBYFLOAT" => {
            need!(3);
            hashes::hincrbyfloat(db, &args[0], &args[1], &args[2])?
        }

        "LPUSH" => {
            need_at_least!(2);
            lists::lpush(db, &args[0], &args[1..])?
        }
        "RPUSH" => {
            need_at_least!(2);
            lists::rpush(db, &args[0], &args[1..])?
        }
        "LPUSHX" => {
            need_at_least!(2);
            lists::lpushx(db, &args[0], &args[1..])?
        }
        "RPUSHX" => {
            need_at_least!(2);
            lists::rpushx(db, &args[0], &args[1..])?
        }
        "LPOP" => {
            need!(1);
            lists::lpop(db, &args[0])?
        }
        "RPOP" => {
            need!(1);
            lists::rpop(db, &args[0])?
        }
        "LLEN" => {
            need!(1);
            lists::llen(db, &args[0])?
        }
        "LINDEX" => {
            need!(2);
            lists::lindex(db, &args[0], parse_i64_arg(&args[1])?)?
        }
        "LRANGE" => {
            need!(3);
            lists::lrange(db, &args[0], parse_i64_arg(&args[1])?, parse_i64_arg(&args[2])?)?
        }
        "LINSERT" => {
            need!(4);
            let before = match args[1].to_ascii_uppercase().as_slice() {
                b"BEFORE" => true,
                b"AFTER" => false,
                _ => return Err(CommandError::generic("syntax error")),
            };
            lists::linsert(db, &args[0], before, &args[2], &args[3])?
        }
        "LREM" => {
            need!(3);
            lists::lrem(db, &args[0], parse_i64_arg(&args[1])?, &args[2])?
        }
        "LSET" => {
            need!(3);
            lists::lset(db, &args[0], parse_i64_arg(&args[1])?, &args[2])?
        }
        "LTRIM" => {
            need!(3);
            lists::ltrim(db, &args[0], parse_i64_arg(&args[1])?, parse_i64_arg(&args[2])?)?
        }
        "RPOPLPUSH" => {
            need!(2);
            lists::rpoplpush(db, &args[0], &args[1])?
        }

        "SADD" => {
            need_at_least!(2);
            sets::sadd(db, &args[0], &args[1..])?
        }
        "SREM" => {
            need_at_least!(2);
            sets::srem(db, &args[0], &args[1..])?
        }
        "SMEMBERS" => {
            need!(1);
            sets::smembers(db, &args[0])?
        }
        "SCARD" => {
            need!(1);
            sets::scard(db, &args[0])?
        }
        "SISMEMBER" => {
            need!(2);
            sets::sismember(db, &args[0], &args[1])?
        }
        "SMOVE" => {
            need!(3);
            sets::smove(db, &args[0], &args[1], &args[2])?
        }
        "SPOP" => {
            need!(1);
            sets::spop(db, &args[0])?
        }
        "SRANDMEMBER" => {
            need_at_least!(1);
            let count = match args.get(1) {
                Some(c) => Some(parse_i64_arg(c)?),
                None => None,
            };
            sets::srandmember(db, &args[0], count)?
        }
        "SDIFF" => {
            need_at_least!(1);
            sets::sdiff(db, &args[0], &args[1..])?
        }
        "SINTER" => {
            need_at_least!(1);
            sets::sinter(db, &args[0], &args[1..])?
        }
        "SUNION" => {
            need_at_least!(1);
            sets::sunion(db, &args[0], &args[1..])?
        }
        "SDIFFSTORE" => {
            need_at_least!(2);
            sets::sdiffstore(db, &args[0], &args[1], &args[2..])?
        }
        "SINTERSTORE" => {
            need_at_least!(2);
            sets::sinterstore(db, &args[0], &args[1], &args[2..])?
        }
        "SUNIONSTORE" => {
            need_at_least!(2);
            sets::sunionstore(db, &args[0], &args[1], &args[2..])?
        }

        "ZADD" => {
            need_at_least!(3);
            let pairs = parse_score_member_pairs(&args[1..])?;
            zsets::zadd(db, &args[0], &pairs)?
        }
        "ZCARD" => {
            need!(1);
            zsets::zcard(db, &args[0])?
        }
        "ZSCORE" => {
            need!(2);
            zsets::zscore(db, &args[0], &args[1])?
        }
        "ZINCRBY" => {
            need!(3);
            zsets::zincrby(db, &args[0], parse_f64_arg(&args[1])?, &args[2])?
        }
        "ZRANGE" => {
            need_at_least!(3);
            let with_scores = has_withscores(&args[3..])?;
            zsets::zrange(db, &args[0], parse_i64_arg(&args[1])?, parse_i64_arg(&args[2])?, with_scores)?
        }
        "ZREVRANGE" => {
            need_at_least!(3);
            let with_scores = has_withscores(&args[3..])?;
            zsets::zrevrange(db, &args[0], parse_i64_arg(&args[1])?, parse_i64_arg(&args[2])?, with_scores)?
        }
        "ZRANK" => {
            need!(2);
            zsets::zrank(db, &args[0], &args[1])?
        }
        "ZREVRANK" => {
            need!(2);
            zsets::zrevrank(db, &args[0], &args[1])?
        }
        "ZREM" => {
            need_at_least!(2);
            zsets::zrem(db, &args[0], &args[1..])?
        }
        "ZRANGEBYSCORE" => {
            need_at_least!(3);
            let with_scores = has_withscores(&args[3..])?;
            zsets::zrangebyscore(db, &args[0], parse_f64_arg(&args[1])?, parse_f64_arg(&args[2])?, with_scores)?
        }
        "ZREVRANGEBYSCORE" => {
            need_at_least!(3);
            let with_scores = has_withscores(&args[3..])?;
            zsets::zrevrangebyscore(db, &args[0], parse_f64_arg(&args[1])?, parse_f64_arg(&args[2])?, with_scores)?
        }
        "ZCOUNT" => {
            need!(3);
            zsets::zcount(db, &args[0], parse_f64_arg(&args[1])?, parse_f64_arg(&args[2])?)?
        }
        "ZREMRANGEBYRANK" => {
            need!(3);
            zsets::zremrangebyrank(db, &args[0], parse_i64_arg(&args[1])?, parse_i64_arg(&args[2])?)?
        }
        "ZREMRANGEBYSCORE" => {
            need!(3);
            zsets::zremrangebyscore(db, &args[0], parse_f64_arg(&args[1])?, parse_f64_arg(&args[2])?)?
        }
        "ZINTERSTORE" => {
            need_at_least!(3);
            zsets::zinterstore(db, &args[0], &parse_numkeys_keys(&args[1..])?)?
        }
        "ZUNIONSTORE" => {
            need_at_least!(3);
            zsets::zunionstore(db, &args[0], &parse_numkeys_keys(&args[1..])?)?
        }

        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };

    Ok(Outcome::Reply(reply))
}

fn has_withscores(tail: &[Bytes]) -> Result<bool, CommandError> {
    match tail {
        [] => Ok(false),
        [flag] if flag.eq_ignore_ascii_case(b"WITHSCORES") => Ok(true),
        _ => Err(CommandError::generic("syntax error")),
    }
}

fn parse_score_member_pairs(args: &[Bytes]) -> Result<Vec<(f64, Bytes)>, CommandError> {
    if args.len() % 2 != 0 {
        return Err(CommandError::generic("syntax error"));
    }
    args.chunks(2)
        .map(|pair| Ok((parse_f64_arg(&pair[0])?, pair[1].clone())))
        .collect()
}

/// `ZINTERSTORE dest numkeys key [key ...]`: validates `numkeys` matches the
/// number of keys given and returns just the key list.
fn parse_numkeys_keys(args: &[Bytes]) -> Result<Vec<Bytes>, CommandError> {
    let numkeys = parse_i64_arg(&args[0])?;
    if numkeys < 1 || numkeys as usize != args.len() - 1 {
        return Err(CommandError::generic("syntax error"));
    }
    Ok(args[1..].to_vec())
}
