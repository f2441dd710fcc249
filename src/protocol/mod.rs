//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//!
//! All header integers are big-endian (network byte order).
//!
//! ### Request Format
//! ```text
//! ┌────────────┬──────────────┬─────────────────────────────┐
//! │ Cmd (2)    │ BodyLen (2)  │         Body                │
//! └────────────┴──────────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0: CREATE_FILM   - Body: title US genre US director US year
//! - 1: REMOVE_FILM   - Body: id
//! - 2: ADD_GENRE     - Body: id US genre
//! - 3: LIST_TITLES   - Body: empty
//! - 4: LIST_FILMS    - Body: empty
//! - 5: GET_FILM      - Body: id (raw integer text)
//! - 6: LIST_BY_GENRE - Body: pattern (raw text)
//!
//! ### Response Format
//! ```text
//! ┌────────────┬────────────┬──────────────┬─────────────────┐
//! │ Status (2) │ Count (2)  │ BodyLen (2)  │      Body       │
//! └────────────┴────────────┴──────────────┴─────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0: NO_ERROR
//! - 1: INTERNAL_ERROR
//! - 2: NOT_FOUND
//!
//! ### Bodies
//! Fields are separated by the unit separator (0x1F), records by the
//! record separator (0x1E). See [`codec`].

mod command;
mod response;
pub mod codec;
pub mod frame;

pub use command::{Command, RequestHeader, REQUEST_HEADER_SIZE};
pub use response::{Response, ResponseHeader, Status, RESPONSE_HEADER_SIZE};
pub use codec::{FieldBuffer, FieldCursor, FIELD_SEPARATOR, RECORD_SEPARATOR};
pub use frame::{read_request, read_response, write_request, write_response};

/// Largest body a frame can declare
pub const MAX_BODY_SIZE: usize = u16::MAX as usize;
