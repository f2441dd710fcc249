//! Frame transport
//!
//! Moves fixed-size headers and exact-length bodies over a byte stream.
//!
//! Every transfer either completes in full or fails with
//! [`ReelError::Io`]; callers treat that as fatal to the connection.
//! - Partial reads/writes are continued until the full length is moved
//! - `Interrupted` is retried on both sides, `WouldBlock` only when writing
//!   (on a blocking socket with a read deadline it means the deadline expired)
//! - A zero-byte write (`WriteZero`) or a read hitting end of stream before
//!   the full length (`UnexpectedEof`) means the peer went away

use std::io::{self, ErrorKind, Read, Write};

use crate::error::{ReelError, Result};
use super::{
    Command, RequestHeader, Response, ResponseHeader, MAX_BODY_SIZE, REQUEST_HEADER_SIZE,
    RESPONSE_HEADER_SIZE,
};

// =============================================================================
// Raw transfers
// =============================================================================

/// Write all of `bytes`, continuing after short writes
fn send_all<W: Write>(conn: &mut W, bytes: &[u8]) -> Result<()> {
    let mut sent = 0;
    while sent < bytes.len() {
        match conn.write(&bytes[sent..]) {
            Ok(0) => {
                return Err(ReelError::Io(io::Error::new(
                    ErrorKind::WriteZero,
                    format!("peer closed after {} of {} bytes", sent, bytes.len()),
                )))
            }
            Ok(n) => sent += n,
            Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                continue
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Fill `buf` completely, continuing after short reads
fn receive_exact<R: Read>(conn: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut received = 0;
    while received < buf.len() {
        match conn.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(ReelError::Io(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!(
                        "connection closed after {} of {} bytes",
                        received,
                        buf.len()
                    ),
                )))
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Send an encoded header
pub fn send_header<W: Write>(conn: &mut W, header: &[u8]) -> Result<()> {
    send_all(conn, header)
}

/// Receive a header of exactly `N` bytes
pub fn receive_header<R: Read, const N: usize>(conn: &mut R) -> Result<[u8; N]> {
    let mut header = [0u8; N];
    receive_exact(conn, &mut header)?;
    Ok(header)
}

/// Send exactly `body.len()` bytes
pub fn send_body<W: Write>(conn: &mut W, body: &[u8]) -> Result<()> {
    send_all(conn, body)
}

/// Receive exactly `len` bytes into a fresh buffer
///
/// The buffer carries no terminator; decoding works from its length.
pub fn receive_body<R: Read>(conn: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut body = vec![0u8; len];
    receive_exact(conn, &mut body)?;
    Ok(body)
}

// =============================================================================
// Requests
// =============================================================================

/// Read a request header and its body
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<(RequestHeader, Vec<u8>)> {
    let header = RequestHeader::from_bytes(receive_header::<_, REQUEST_HEADER_SIZE>(reader)?);

    let body = if header.body_size > 0 {
        receive_body(reader, header.body_size as usize)?
    } else {
        Vec::new()
    };

    Ok((header, body))
}

/// Write a request and flush it
pub fn write_request<W: Write>(writer: &mut W, command: Command, body: &[u8]) -> Result<()> {
    if body.len() > MAX_BODY_SIZE {
        return Err(ReelError::Protocol(format!(
            "Request body too large: {} bytes (max {})",
            body.len(),
            MAX_BODY_SIZE
        )));
    }

    let header = RequestHeader::new(command, body.len() as u16);
    send_header(writer, &header.to_bytes())?;
    if !body.is_empty() {
        send_body(writer, body)?;
    }
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Responses
// =============================================================================

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let header = ResponseHeader::from_bytes(receive_header::<_, RESPONSE_HEADER_SIZE>(reader)?);
    let status = header.status()?;

    let body = if header.body_size > 0 {
        receive_body(reader, header.body_size as usize)?
    } else {
        Vec::new()
    };

    Ok(Response {
        status,
        count: header.count,
        body,
    })
}

/// Write a response header, then its body if non-empty, and flush
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    send_header(writer, &response.header().to_bytes())?;
    if !response.body.is_empty() {
        send_body(writer, &response.body)?;
    }
    writer.flush()?;
    Ok(())
}
