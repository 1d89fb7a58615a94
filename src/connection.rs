use crate::{
    SERVER,
    protocol::{ParseError, parse_request, response::handle_and_encode_request},
    storage,
    util::IoErrorExt,
};
use log::{debug, error, info, trace};
use mio::{
    Interest, Poll, Token,
    net::{TcpListener, TcpStream},
};
use std::{
    collections::HashMap,
    io::{self, Read, Write},
    net::SocketAddr,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    WantRead,
    WantWrite,
    WantClose,
}

/// A client socket with its unparsed requests and unsent responses
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    token: Token,
    state: ConnectionState,
    /// go to `WantClose` instead of `WantRead` once `outgoing` is drained
    close_after_flush: bool,
    incoming: Vec<u8>,
    outgoing: Vec<u8>,
}

impl Connection {
    pub fn new(stream: TcpStream, token: Token) -> Self {
        Self {
            stream,
            token,
            state: ConnectionState::WantRead,
            close_after_flush: false,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn close(&mut self) {
        self.state = ConnectionState::WantClose;
    }

    pub fn want_read(&self) -> bool {
        matches!(self.state, ConnectionState::WantRead)
    }
    pub fn want_write(&self) -> bool {
        matches!(self.state, ConnectionState::WantWrite)
    }
    pub fn want_close(&self) -> bool {
        matches!(self.state, ConnectionState::WantClose)
    }

    /// Drains the socket, answers every complete request and starts
    /// sending the answers.
    ///
    /// A malformed request or the peer's EOF still lets the responses
    /// queued before it go out; the connection closes after that.
    pub fn on_read(&mut self) -> io::Result<()> {
        assert_eq!(
            ConnectionState::WantRead,
            self.state,
            "calling read on non WantRead state"
        );
        let mut buf = [0; 1024 * 64];
        let mut eof = false;
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    debug!(target:"on_read", "{:?} sent EOF with {} bytes unparsed", self.token, self.incoming.len());
                    eof = true;
                    break;
                }
                Ok(n) => {
                    self.incoming.extend_from_slice(&buf[..n]);
                    trace!(target:"on_read", "got {n} bytes");
                }
                Err(ref e) if e.is_would_block() => break,
                Err(ref e) if e.is_interrupted() => continue,
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }

        if self.process_incoming() == ConnectionState::WantClose || eof {
            self.close_after_flush = true;
        }

        if self.outgoing.is_empty() {
            self.state = self.idle_state();
            return Ok(());
        }
        // skip one round trip through poll, the socket is most likely writable
        self.state = ConnectionState::WantWrite;
        self.on_write()
    }

    /// Writes queued responses until they are gone or the socket is full
    pub fn on_write(&mut self) -> io::Result<()> {
        assert_eq!(
            ConnectionState::WantWrite,
            self.state,
            "calling write on non WantWrite state"
        );

        while !self.outgoing.is_empty() {
            match self.stream.write(&self.outgoing) {
                Ok(0) => {
                    info!(target:"on_write", "{:?} accepted 0 bytes", self.token);
                    self.close();
                    return Ok(());
                }
                Ok(n) => {
                    debug!(target:"on_write", "wrote {} bytes, out of {}", n, self.outgoing.len());
                    self.outgoing.drain(..n);
                }
                Err(ref e) if e.is_would_block() => return Ok(()),
                Err(ref e) if e.is_interrupted() => continue,
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }

        self.state = self.idle_state();
        Ok(())
    }

    fn idle_state(&self) -> ConnectionState {
        if self.close_after_flush {
            ConnectionState::WantClose
        } else {
            ConnectionState::WantRead
        }
    }

    /// Answers every complete request buffered in `incoming`.
    ///
    /// Returns `WantRead` once the buffer holds no full request,
    /// `WantClose` on a malformed one.
    fn process_incoming(&mut self) -> ConnectionState {
        loop {
            let state = self.try_one_request();
            if state != ConnectionState::WantWrite {
                return state;
            }
        }
    }

    fn try_one_request(&mut self) -> ConnectionState {
        let (cmd, used) = match parse_request(&self.incoming) {
            Ok(parsed) => parsed,
            Err(ParseError::NotEnoughBytes { want, got }) => {
                trace!(target: "on_request", "not enough bytes, want {want} got {got}");
                return ConnectionState::WantRead;
            }
            Err(e) => {
                error!(target: "on_request", "dropping {:?}: {e}", self.token);
                self.incoming.clear();
                return ConnectionState::WantClose;
            }
        };

        handle_and_encode_request(&cmd, &mut storage::lock(), &mut self.outgoing);
        self.incoming.drain(..used);

        ConnectionState::WantWrite
    }
}

#[derive(Default)]
pub struct ConnectionManager {
    conns: HashMap<Token, Connection>,
    token_gen: TokenGen,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open connections
    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Accepts every pending connection on `server`.
    ///
    /// Accept failures (out of descriptors, aborted handshakes, ..)
    /// only concern the client being accepted, so they are logged
    /// and the listener is left for the next readiness event.
    pub fn handle_accept(&mut self, server: &TcpListener, poll: &Poll) {
        self.accept_with(|| server.accept(), poll)
    }

    fn accept_with<F>(&mut self, mut accept: F, poll: &Poll)
    where
        F: FnMut() -> io::Result<(TcpStream, SocketAddr)>,
    {
        loop {
            match accept() {
                Ok((stream, peer)) => self.register(stream, peer, poll),
                Err(ref e) if e.is_would_block() => return,
                Err(ref e) if e.is_interrupted() => continue,
                Err(e) => {
                    error!(target: "handle_accept", "accept failed: {e}");
                    return;
                }
            }
        }
    }

    fn register(&mut self, mut stream: TcpStream, peer: SocketAddr, poll: &Poll) {
        let token = self.token_gen.next();
        if let Err(e) =
            poll.registry()
                .register(&mut stream, token, Interest::READABLE | Interest::WRITABLE)
        {
            error!(target: "handle_accept", "could not register {peer}: {e}");
            return;
        }

        self.conns.insert(token, Connection::new(stream, token));
        trace!(target: "handle_accept", "{peer} is {token:?}, {} open", self.conns.len());
    }

    pub fn handle_close(&mut self, poll: &Poll, token: Token) {
        let Some(mut conn) = self.conns.remove(&token) else {
            return;
        };
        debug!(target: "handle_close", "closing {token:?}");
        if let Err(e) = poll.registry().deregister(&mut conn.stream) {
            error!(target: "handle_close", "deregistering {token:?}: {e}");
        }
    }

    pub fn get_connection_mut(&mut self, t: &Token) -> Option<&mut Connection> {
        self.conns.get_mut(t)
    }
}

/// Hands out connection tokens, never the listener's
struct TokenGen {
    next: usize,
}

impl Default for TokenGen {
    fn default() -> Self {
        Self { next: SERVER.0 + 1 }
    }
}

impl TokenGen {
    fn next(&mut self) -> Token {
        let t = Token(self.next);
        self.next += 1;
        t
    }
}
