//! Connection Handler
//!
//! Serves one client connection: the request/response loop of a worker.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::error::{ReelError, Result};
use crate::protocol::{read_request, write_response, Response};

/// Handles a single client connection
///
/// Owns its socket and, through the dispatcher, its store handle. Both are
/// released when the connection is dropped.
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered, flushed once per response)
    writer: BufWriter<TcpStream>,

    /// Request executor with this connection's private store handle
    dispatcher: Dispatcher,

    /// Peer address for logging
    peer_addr: String,

    /// Requests served so far
    served: u64,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, dispatcher: Dispatcher) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm: header and body go out back to back
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            dispatcher,
            peer_addr,
            served: 0,
        })
    }

    /// Configure a read deadline (None blocks indefinitely)
    ///
    /// Without one a peer that stalls mid-request holds its worker forever.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and answers each before reading the next.
    /// Returns `Ok` when the client disconnects, `Err` on any other I/O
    /// failure; either way the connection is finished.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let (header, body) = match read_request(&mut self.reader) {
                Ok(request) => request,
                Err(ReelError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!(
                        "Client {} disconnected after {} requests",
                        self.peer_addr,
                        self.served
                    );
                    return Ok(());
                }
                Err(ReelError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    // Read deadline expired (Windows reports TimedOut)
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!(
                "Request from {}: command={} body_size={}",
                self.peer_addr,
                header.command,
                header.body_size
            );

            let response = self.dispatcher.dispatch(header, body);
            self.served += 1;

            if let Err(e) = self.send_response(&response) {
                if let ReelError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Number of requests answered on this connection
    pub fn served(&self) -> u64 {
        self.served
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::WriteZero
    )
}
