//! RESP reply values and their wire encoding.
//!
//! This is the teacher's `DataType` generalized to binary-safe `Bytes`
//! instead of `String`, since keys and values must be 8-bit clean.

use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    NullBulk,
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::Status("OK".to_string())
    }

    pub fn status(text: impl Into<String>) -> Self {
        RespValue::Status(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        RespValue::Error(text.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::Bulk(data.into())
    }

    pub fn nil() -> Self {
        RespValue::NullBulk
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(items)
    }

    /// A `none`/absent key translated to the null bulk reply.
    pub fn bulk_or_nil(data: Option<Bytes>) -> Self {
        match data {
            Some(b) => RespValue::Bulk(b),
            None => RespValue::NullBulk,
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            RespValue::Status(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.put_u8(b'-');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.put_u8(b':');
                buf.put_slice(n.to_string().as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Bulk(data) => {
                buf.put_u8(b'$');
                buf.put_slice(data.len().to_string().as_bytes());
                buf.put_slice(b"\r\n");
                buf.put_slice(data);
                buf.put_slice(b"\r\n");
            }
            RespValue::NullBulk => {
                buf.put_slice(b"$-1\r\n");
            }
            RespValue::Array(items) => {
                buf.put_u8(b'*');
                buf.put_slice(items.len().to_string().as_bytes());
                buf.put_slice(b"\r\n");
                for item in items {
                    item.encode_into(buf);
                }
            }
        }
    }
}
