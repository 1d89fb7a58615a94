use std::{
    io::{Read, Write},
    net::{Shutdown, TcpStream},
    thread,
    time::Duration,
};

use kvtable::{
    Server,
    protocol::{
        MAX_ARGS, ParseError, encode_request, parse_response,
        response::{RES_NX, RES_OK},
    },
};

fn spawn_server() -> std::net::SocketAddr {
    let mut server = Server::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    addr
}

struct Client {
    sock: TcpStream,
    pending: Vec<u8>,
}

impl Client {
    fn connect(addr: std::net::SocketAddr) -> Self {
        Self {
            sock: TcpStream::connect(addr).unwrap(),
            pending: Vec::new(),
        }
    }

    fn send(&mut self, args: &[&str]) {
        let mut buf = Vec::new();
        encode_request(args, &mut buf);
        self.sock.write_all(&buf).unwrap();
    }

    fn recv(&mut self) -> (i32, String) {
        let mut chunk = [0; 1024];
        loop {
            match parse_response(&self.pending) {
                Ok((status, payload, used)) => {
                    let payload = String::from_utf8(payload.to_vec()).unwrap();
                    self.pending.drain(..used);
                    return (status, payload);
                }
                Err(ParseError::NotEnoughBytes { .. }) => {
                    let n = self.sock.read(&mut chunk).unwrap();
                    assert_ne!(n, 0, "server closed the connection");
                    self.pending.extend_from_slice(&chunk[..n]);
                }
                Err(e) => panic!("{e}"),
            }
        }
    }

    /// Reads until the server hangs up, failing if anything else arrives
    fn expect_eof(&mut self) {
        assert!(self.pending.is_empty(), "unread response: {:?}", self.pending);
        let mut chunk = [0; 64];
        match self.sock.read(&mut chunk) {
            Ok(n) => assert_eq!(n, 0, "got {:?} instead of EOF", &chunk[..n]),
            Err(e) => panic!("{e}"),
        }
    }

    fn call(&mut self, args: &[&str]) -> (i32, String) {
        self.send(args);
        self.recv()
    }
}

#[test]
fn set_get_del_over_tcp() {
    let mut client = Client::connect(spawn_server());

    assert_eq!(client.call(&["get", "tcp-key"]), (RES_NX, "".into()));
    assert_eq!(client.call(&["set", "tcp-key", "hello"]), (RES_OK, "".into()));
    assert_eq!(client.call(&["get", "tcp-key"]), (RES_OK, "hello".into()));
    assert_eq!(client.call(&["del", "tcp-key"]), (RES_OK, "".into()));
    assert_eq!(
        client.call(&["del", "tcp-key"]),
        (RES_NX, "Key not found".into())
    );
}

#[test]
fn pipelined_requests_answer_in_order() {
    let mut client = Client::connect(spawn_server());

    for i in 0..100 {
        client.send(&["set", &format!("pipe-{i}"), &format!("{i}")]);
    }
    for _ in 0..100 {
        assert_eq!(client.recv(), (RES_OK, "".into()));
    }

    for i in 0..100 {
        client.send(&["get", &format!("pipe-{i}")]);
    }
    for i in 0..100 {
        assert_eq!(client.recv(), (RES_OK, format!("{i}")));
    }
}

#[test]
fn clients_share_one_table() {
    let addr = spawn_server();
    let mut writer = Client::connect(addr);
    let mut reader = Client::connect(addr);

    assert_eq!(writer.call(&["set", "shared", "yes"]), (RES_OK, "".into()));
    assert_eq!(reader.call(&["get", "shared"]), (RES_OK, "yes".into()));
}

#[test]
fn replies_before_a_malformed_request_are_sent() {
    let addr = spawn_server();
    let mut client = Client::connect(addr);
    client
        .sock
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut batch = Vec::new();
    encode_request(&["set", "before-garbage", "applied"], &mut batch);
    encode_request(&["get", "before-garbage"], &mut batch);
    batch.extend_from_slice(&((MAX_ARGS + 1) as u32).to_be_bytes());
    client.sock.write_all(&batch).unwrap();

    assert_eq!(client.recv(), (RES_OK, "".into()));
    assert_eq!(client.recv(), (RES_OK, "applied".into()));
    client.expect_eof();

    let mut other = Client::connect(addr);
    assert_eq!(
        other.call(&["get", "before-garbage"]),
        (RES_OK, "applied".into())
    );
}

#[test]
fn requests_sent_before_eof_are_answered() {
    let mut client = Client::connect(spawn_server());
    client
        .sock
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    client.send(&["set", "half-closed", "1"]);
    client.send(&["get", "half-closed"]);
    client.sock.shutdown(Shutdown::Write).unwrap();

    assert_eq!(client.recv(), (RES_OK, "".into()));
    assert_eq!(client.recv(), (RES_OK, "1".into()));
    client.expect_eof();
}
