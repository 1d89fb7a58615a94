use thiserror::Error;

pub const MAX_ARGS: usize = 32 << 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Should try to read more after this
    #[error("not enough bytes (want: {want}, got: {got})")]
    NotEnoughBytes { want: usize, got: usize },

    /// Should close connection after this
    #[error("protocol error (exceeding MAX_ARGS or invalid utf8)")]
    ProtocolError,
}

pub mod response {
    use hashtable::HashTable;
    use log::trace;

    pub const RES_NX: i32 = 1;
    pub const RES_OK: i32 = 0;
    pub const RES_ERR: i32 = -1;

    /// `len` counts the status code and the payload, not itself
    pub fn serialize(status_code: i32, data: &[u8], buf: &mut Vec<u8>) {
        let len = 4 + data.len();
        buf.reserve(4 + len);

        buf.extend_from_slice(&(len as u32).to_be_bytes());
        buf.extend_from_slice(&status_code.to_be_bytes());
        buf.extend_from_slice(data);
    }

    /// Runs one command against `map` and appends its response to `buf`
    pub fn handle_and_encode_request(cmd: &[String], map: &mut HashTable<String>, buf: &mut Vec<u8>) {
        trace!(target: "request", "{cmd:?}");
        match cmd {
            [op, key] if op == "get" => match map.read(key) {
                Some(v) => serialize(RES_OK, v.as_bytes(), buf),
                None => serialize(RES_NX, &[], buf),
            },
            [op, key] if op == "del" => match map.delete(key) {
                Ok(()) => serialize(RES_OK, &[], buf),
                Err(e) => serialize(RES_NX, e.to_string().as_bytes(), buf),
            },
            [op, key, value] if op == "set" => {
                map.insert(key.as_str(), value.clone());
                serialize(RES_OK, &[], buf)
            }
            [op] if op == "len" => serialize(RES_OK, map.len().to_string().as_bytes(), buf),
            _ => serialize(RES_ERR, b"unknown command", buf),
        }
    }
}

/// Parses one request off the front of `src`.
///
/// A request is a `u32` string count followed by that many
/// `u32` length-prefixed UTF-8 strings, all big-endian.
/// Returns the strings and the number of bytes consumed.
pub fn parse_request(src: &[u8]) -> Result<(Vec<String>, usize), ParseError> {
    let mut cursor = 0;
    let num_str = get_u32(src, cursor)? as usize;
    if num_str > MAX_ARGS {
        return Err(ParseError::ProtocolError);
    }
    cursor += 4;

    let mut dst = Vec::with_capacity(num_str.min(16));

    for _ in 0..num_str {
        let len = get_u32(src, cursor)? as usize;

        if len > MAX_ARGS {
            return Err(ParseError::ProtocolError);
        }
        cursor += 4;

        let s = get_str(src, cursor, cursor + len)?;
        dst.push(s.into());

        cursor += len;
    }

    Ok((dst, cursor))
}

/// Encodes `args` the way [`parse_request`] expects them
pub fn encode_request<S: AsRef<str>>(args: &[S], buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(args.len() as u32).to_be_bytes());
    for arg in args {
        let arg = arg.as_ref().as_bytes();
        buf.extend_from_slice(&(arg.len() as u32).to_be_bytes());
        buf.extend_from_slice(arg);
    }
}

/// Splits one response off the front of `src` into its status and payload
pub fn parse_response(src: &[u8]) -> Result<(i32, &[u8], usize), ParseError> {
    let len = get_u32(src, 0)? as usize;
    if len < 4 || len > MAX_ARGS {
        return Err(ParseError::ProtocolError);
    }
    if src.len() < 4 + len {
        return Err(ParseError::NotEnoughBytes {
            want: 4 + len,
            got: src.len(),
        });
    }
    let status = i32::from_be_bytes([src[4], src[5], src[6], src[7]]);
    Ok((status, &src[8..4 + len], 4 + len))
}

fn get_str(src: &[u8], start: usize, end: usize) -> Result<&str, ParseError> {
    if src.len() < end {
        Err(ParseError::NotEnoughBytes {
            want: end,
            got: src.len(),
        })
    } else {
        std::str::from_utf8(&src[start..end]).map_err(|_| ParseError::ProtocolError)
    }
}

fn get_u32(src: &[u8], start: usize) -> Result<u32, ParseError> {
    if src.len() < start + 4 {
        Err(ParseError::NotEnoughBytes {
            want: start + 4,
            got: src.len(),
        })
    } else {
        Ok(to_u32(&src[start..start + 4]))
    }
}

fn to_u32(n: &[u8]) -> u32 {
    u32::from_be_bytes([n[0], n[1], n[2], n[3]])
}

#[cfg(test)]
mod test {
    use hashtable::HashTable;

    use super::response::{RES_ERR, RES_NX, RES_OK, handle_and_encode_request};
    use super::{MAX_ARGS, ParseError, encode_request, parse_request, parse_response};

    fn run(map: &mut HashTable<String>, args: &[&str]) -> (i32, String) {
        let cmd: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut buf = Vec::new();
        handle_and_encode_request(&cmd, map, &mut buf);

        let (status, payload, used) = parse_response(&buf).unwrap();
        assert_eq!(used, buf.len());
        (status, String::from_utf8(payload.to_vec()).unwrap())
    }

    #[test]
    fn parse_encoded_request() {
        let mut buf = Vec::new();
        encode_request(&["set", "foo", "bar"], &mut buf);

        let (cmd, used) = parse_request(&buf).unwrap();
        assert_eq!(cmd, ["set", "foo", "bar"]);
        assert_eq!(used, buf.len());
    }

    #[test]
    fn parse_pipelined_requests() {
        let mut buf = Vec::new();
        encode_request(&["get", "a"], &mut buf);
        encode_request(&["len"], &mut buf);

        let (first, used) = parse_request(&buf).unwrap();
        assert_eq!(first, ["get", "a"]);
        let (second, rest) = parse_request(&buf[used..]).unwrap();
        assert_eq!(second, ["len"]);
        assert_eq!(used + rest, buf.len());
    }

    #[test]
    fn parse_incomplete_request() {
        let mut buf = Vec::new();
        encode_request(&["get", "some key"], &mut buf);

        for cut in 0..buf.len() {
            assert!(matches!(
                parse_request(&buf[..cut]),
                Err(ParseError::NotEnoughBytes { .. })
            ));
        }
        assert_eq!(
            parse_request(&buf[..2]),
            Err(ParseError::NotEnoughBytes { want: 4, got: 2 })
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        let too_many = ((MAX_ARGS + 1) as u32).to_be_bytes();
        assert_eq!(parse_request(&too_many), Err(ParseError::ProtocolError));

        let mut too_long = 1u32.to_be_bytes().to_vec();
        too_long.extend_from_slice(&((MAX_ARGS + 1) as u32).to_be_bytes());
        assert_eq!(parse_request(&too_long), Err(ParseError::ProtocolError));

        let mut not_utf8 = 1u32.to_be_bytes().to_vec();
        not_utf8.extend_from_slice(&2u32.to_be_bytes());
        not_utf8.extend_from_slice(&[0xC3, 0x28]);
        assert_eq!(parse_request(&not_utf8), Err(ParseError::ProtocolError));
    }

    #[test]
    fn commands() {
        let mut map = HashTable::new();

        assert_eq!(run(&mut map, &["get", "foo"]), (RES_NX, "".into()));
        assert_eq!(run(&mut map, &["set", "foo", "bar"]), (RES_OK, "".into()));
        assert_eq!(run(&mut map, &["get", "foo"]), (RES_OK, "bar".into()));
        assert_eq!(run(&mut map, &["set", "foo", ""]), (RES_OK, "".into()));
        assert_eq!(run(&mut map, &["get", "foo"]), (RES_OK, "".into()));
        assert_eq!(run(&mut map, &["len"]), (RES_OK, "1".into()));

        assert_eq!(run(&mut map, &["del", "foo"]), (RES_OK, "".into()));
        assert_eq!(run(&mut map, &["del", "foo"]), (RES_NX, "Key not found".into()));
        assert_eq!(run(&mut map, &["len"]), (RES_OK, "0".into()));
    }

    #[test]
    fn unknown_commands() {
        let mut map = HashTable::new();
        assert_eq!(run(&mut map, &[]).0, RES_ERR);
        assert_eq!(run(&mut map, &["get"]).0, RES_ERR);
        assert_eq!(run(&mut map, &["set", "k"]).0, RES_ERR);
        assert_eq!(run(&mut map, &["flush"]).0, RES_ERR);
        assert!(map.is_empty());
    }
}
