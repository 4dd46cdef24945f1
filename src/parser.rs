//! Incremental request parser: multi-bulk form plus the inline fallback.
//!
//! The parser owns a growing buffer and no I/O. The connection driver feeds
//! it bytes as they arrive and pulls frames back out; this mirrors the
//! teacher's `decoders::v2::StreamDecoder` state machine but decouples
//! parsing from the socket so it can run (and be tested) synchronously.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::ProtocolError;

pub type Frame = Vec<Bytes>;

#[derive(Debug, Default)]
pub struct RequestParser {
    buf: BytesMut,
}

impl RequestParser {
    pub fn new() -> Self {
        RequestParser {
            buf: BytesMut::new(),
        }
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pulls the next complete frame out of the buffer, if any.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Blank inline lines and
    /// `*0\r\n` are swallowed and parsing continues at the next frame.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        loop {
            if self.buf.is_empty() {
                return Ok(None);
            }
            return match self.buf[0] {
                b'*' => match self.try_parse_multibulk()? {
                    Some(frame) if frame.is_empty() => continue,
                    other => Ok(other),
                },
                b'$' => Err(ProtocolError::Malformed),
                _ => match self.try_parse_inline()? {
                    Some(frame) if frame.is_empty() => continue,
                    other => Ok(other),
                },
            };
        }
    }

    fn try_parse_multibulk(&mut self) -> Result<Option<Frame>, ProtocolError> {
        let data = &self.buf[..];
        let mut pos = 1usize; // skip '*'

        let (count, consumed) = match read_decimal_line(&data[pos..])? {
            None => return Ok(None),
            Some(v) => v,
        };
        pos += consumed;
        if count < 0 {
            return Err(ProtocolError::InvalidMultibulkLength);
        }

        let n = count as usize;
        let mut args = Vec::with_capacity(n);
        for _ in 0..n {
            if pos >= data.len() {
                return Ok(None);
            }
            if data[pos] != b'$' {
                return Err(ProtocolError::ExpectedBulkLength);
            }
            pos += 1;

            let (len, consumed) = match read_decimal_line(&data[pos..])? {
                None => return Ok(None),
                Some(v) => v,
            };
            pos += consumed;
            if len < 0 {
                return Err(ProtocolError::InvalidBulkLength);
            }
            let l = len as usize;

            if data.len() < pos + l + 2 {
                return Ok(None);
            }
            let arg = Bytes::copy_from_slice(&data[pos..pos + l]);
            pos += l;
            if &data[pos..pos + 2] != b"\r\n" {
                return Err(ProtocolError::InvalidBulkLength);
            }
            pos += 2;
            args.push(arg);
        }

        self.buf.advance(pos);
        Ok(Some(args))
    }

    fn try_parse_inline(&mut self) -> Result<Option<Frame>, ProtocolError> {
        let data = &self.buf[..];
        let nl = match data.iter().position(|&b| b == b'\n') {
            Some(idx) => idx,
            None => return Ok(None),
        };
        let mut line_end = nl;
        if line_end > 0 && data[line_end - 1] == b'\r' {
            line_end -= 1;
        }
        let tokens: Frame = data[..line_end]
            .split(|b| b.is_ascii_whitespace())
            .filter(|tok| !tok.is_empty())
            .map(Bytes::copy_from_slice)
            .collect();
        self.buf.advance(nl + 1);
        Ok(Some(tokens))
    }
}

/// Reads ASCII decimal digits (optionally `-`-prefixed) up to and including
/// a trailing `\r\n`. Returns `(value, bytes consumed)` or `None` if the
/// terminator hasn't arrived yet.
fn read_decimal_line(data: &[u8]) -> Result<Option<(i64, usize)>, ProtocolError> {
    let nl = match data.iter().position(|&b| b == b'\n') {
        Some(idx) => idx,
        None => return Ok(None),
    };
    if nl == 0 || data[nl - 1] != b'\r' {
        return Err(ProtocolError::Malformed);
    }
    let line = &data[..nl - 1];
    let text = std::str::from_utf8(line).map_err(|_| ProtocolError::Malformed)?;
    let value: i64 = text.parse().map_err(|_| ProtocolError::Malformed)?;
    Ok(Some((value, nl + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_strings(frame: &Frame) -> Vec<String> {
        frame
            .iter()
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn parses_multibulk_in_one_shot() {
        let mut p = RequestParser::new();
        p.feed(b"*2\r\n$4\r\nLLEN\r\n$2\r\nml\r\n");
        let frame = p.next_frame().unwrap().unwrap();
        assert_eq!(frame_strings(&frame), vec!["LLEN", "ml"]);
        assert_eq!(p.next_frame().unwrap(), None);
    }

    #[test]
    fn parses_multibulk_split_across_arbitrary_boundaries() {
        let whole = b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n";
        for split in 0..whole.len() {
            let mut p = RequestParser::new();
            p.feed(&whole[..split]);
            assert_eq!(p.next_frame().unwrap(), None);
            p.feed(&whole[split..]);
            let frame = p.next_frame().unwrap().unwrap();
            assert_eq!(frame_strings(&frame), vec!["SET", "foo", "bar"]);
        }
    }

    #[test]
    fn parses_pipelined_frames_from_one_read() {
        let mut p = RequestParser::new();
        p.feed(b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n");
        assert!(p.next_frame().unwrap().is_some());
        assert!(p.next_frame().unwrap().is_some());
        assert_eq!(p.next_frame().unwrap(), None);
    }

    #[test]
    fn parses_empty_bulk_argument() {
        let mut p = RequestParser::new();
        p.feed(b"*1\r\n$0\r\n\r\n");
        let frame = p.next_frame().unwrap().unwrap();
        assert_eq!(frame, vec![Bytes::new()]);
    }

    #[test]
    fn parses_inline_form() {
        let mut p = RequestParser::new();
        p.feed(b"PING\r\n");
        let frame = p.next_frame().unwrap().unwrap();
        assert_eq!(frame_strings(&frame), vec!["PING"]);
    }

    #[test]
    fn parses_inline_form_with_bare_lf() {
        let mut p = RequestParser::new();
        p.feed(b"ECHO hello\n");
        let frame = p.next_frame().unwrap().unwrap();
        assert_eq!(frame_strings(&frame), vec!["ECHO", "hello"]);
    }

    #[test]
    fn skips_blank_inline_lines() {
        let mut p = RequestParser::new();
        p.feed(b"\r\nPING\r\n");
        let frame = p.next_frame().unwrap().unwrap();
        assert_eq!(frame_strings(&frame), vec!["PING"]);
    }

    #[test]
    fn skips_empty_multibulk() {
        let mut p = RequestParser::new();
        p.feed(b"*0\r\n*1\r\n$4\r\nPING\r\n");
        let frame = p.next_frame().unwrap().unwrap();
        assert_eq!(frame_strings(&frame), vec!["PING"]);
    }

    #[test]
    fn rejects_malformed_multibulk_length() {
        let mut p = RequestParser::new();
        p.feed(b"*x\r\n");
        assert!(p.next_frame().is_err());
    }

    #[test]
    fn rejects_bare_dollar_prefix() {
        let mut p = RequestParser::new();
        p.feed(b"$3\r\nfoo\r\n");
        assert!(p.next_frame().is_err());
    }
}
