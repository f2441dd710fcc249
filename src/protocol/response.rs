//! Response definitions
//!
//! Represents responses to clients.

use crate::error::{ReelError, Result};

/// Response header size: 2 bytes status + 2 bytes count + 2 bytes body length
pub const RESPONSE_HEADER_SIZE: usize = 6;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    NoError = 0,
    InternalError = 1,
    NotFound = 2,
}

impl TryFrom<u16> for Status {
    type Error = ReelError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Status::NoError),
            1 => Ok(Status::InternalError),
            2 => Ok(Status::NotFound),
            _ => Err(ReelError::Protocol(format!("Unknown response status: {}", value))),
        }
    }
}

/// Fixed-size header preceding every response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: u16,
    pub count: u16,
    pub body_size: u16,
}

impl ResponseHeader {
    pub fn to_bytes(&self) -> [u8; RESPONSE_HEADER_SIZE] {
        let mut bytes = [0u8; RESPONSE_HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.status.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.count.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.body_size.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; RESPONSE_HEADER_SIZE]) -> Self {
        Self {
            status: u16::from_be_bytes([bytes[0], bytes[1]]),
            count: u16::from_be_bytes([bytes[2], bytes[3]]),
            body_size: u16::from_be_bytes([bytes[4], bytes[5]]),
        }
    }

    pub fn status(&self) -> Result<Status> {
        Status::try_from(self.status)
    }
}

/// A response to send to a client
///
/// Error responses always carry a zero count and an empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Row count, or the assigned id for CREATE_FILM
    pub count: u16,

    /// Encoded records
    pub body: Vec<u8>,
}

impl Response {
    /// Create a NO_ERROR response
    ///
    /// Fails when `count` or the body length cannot be represented in the
    /// 16-bit header fields.
    pub fn ok(count: u64, body: Vec<u8>) -> Result<Self> {
        let count = u16::try_from(count).map_err(|_| {
            ReelError::Protocol(format!("Count {} does not fit in a response header", count))
        })?;
        if body.len() > super::MAX_BODY_SIZE {
            return Err(ReelError::Protocol(format!(
                "Response body too large: {} bytes (max {})",
                body.len(),
                super::MAX_BODY_SIZE
            )));
        }
        Ok(Self {
            status: Status::NoError,
            count,
            body,
        })
    }

    /// Create a NO_ERROR response with neither count nor body
    pub fn empty() -> Self {
        Self {
            status: Status::NoError,
            count: 0,
            body: Vec::new(),
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            count: 0,
            body: Vec::new(),
        }
    }

    /// Create an INTERNAL_ERROR response
    pub fn internal_error() -> Self {
        Self {
            status: Status::InternalError,
            count: 0,
            body: Vec::new(),
        }
    }

    /// Header describing this response
    pub fn header(&self) -> ResponseHeader {
        ResponseHeader {
            status: self.status as u16,
            count: self.count,
            // Bounded by Response::ok
            body_size: self.body.len() as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_headers_are_zeroed() {
        for response in [Response::not_found(), Response::internal_error()] {
            let header = response.header();
            assert_eq!(header.count, 0);
            assert_eq!(header.body_size, 0);
        }
        assert_eq!(Response::not_found().header().status, 2);
        assert_eq!(Response::internal_error().header().status, 1);
    }

    #[test]
    fn test_ok_rejects_oversized_fields() {
        assert!(Response::ok(70_000, Vec::new()).is_err());
        assert!(Response::ok(1, vec![b'x'; 70_000]).is_err());
        assert_eq!(Response::ok(3, b"abc".to_vec()).unwrap().header().body_size, 3);
    }

    #[test]
    fn test_header_bytes() {
        let header = ResponseHeader {
            status: 0,
            count: 0x0203,
            body_size: 0x0405,
        };
        assert_eq!(header.to_bytes(), [0, 0, 2, 3, 4, 5]);
        assert_eq!(ResponseHeader::from_bytes(header.to_bytes()), header);
    }
}
