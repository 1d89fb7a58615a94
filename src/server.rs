use std::{net::SocketAddr, time::Duration};

use log::{info, trace};
use mio::{Events, Interest, Poll, net::TcpListener};

use crate::{LoopError, SERVER, connection::ConnectionManager, util::IoErrorExt};

/// Single-threaded event loop serving the shared table
pub struct Server {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    conns: ConnectionManager,
}

impl Server {
    pub fn bind(addr: SocketAddr) -> Result<Self, LoopError> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        trace!("Listener: {:#?}", listener);

        poll.registry()
            .register(&mut listener, SERVER, Interest::READABLE)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(128),
            listener,
            conns: ConnectionManager::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn run(&mut self) -> Result<(), LoopError> {
        info!("listening on {}", self.local_addr()?);
        loop {
            self.poll_once(None)?;
        }
    }

    /// Waits for events at most `timeout` and handles all of them
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<(), LoopError> {
        if let Err(e) = self.poll.poll(&mut self.events, timeout) {
            if e.is_interrupted() {
                return Ok(());
            }
            return Err(e.into());
        }

        for event in self.events.iter() {
            match event.token() {
                SERVER => self.conns.handle_accept(&self.listener, &self.poll),
                token => {
                    trace!(target:"new_token", "new event with token {}", token.0);
                    let Some(conn) = self.conns.get_connection_mut(&token) else {
                        trace!(target:"new_token", "spurious wake");
                        continue;
                    };

                    if event.is_readable() && conn.want_read() {
                        let _ = conn.on_read().inspect_err(|e| {
                            trace!(target:"handle_read", "error during read: {}", e);
                        });
                    }

                    if event.is_writable() && conn.want_write() {
                        let _ = conn.on_write().inspect_err(
                            |e| trace!(target:"handle_write", "error during write: {}", e),
                        );
                        // readiness is edge triggered, pick up requests sent while we were writing
                        if conn.want_read() {
                            let _ = conn.on_read().inspect_err(|e| {
                                trace!(target:"handle_read", "error during read: {}", e);
                            });
                        }
                    }

                    if conn.want_close() {
                        self.conns.handle_close(&self.poll, token);
                    }
                }
            }
        }
        Ok(())
    }
}
