//! Field/Record codec
//!
//! Splits and joins flat byte buffers into ordered fields and records.
//!
//! ## Body Encoding
//! ```text
//!   id US title US genre RS id US title US genre RS ...
//! ```
//! - US (0x1F) separates fields of one record
//! - RS (0x1E) introduces every record after the first
//!
//! The first record has no leading separator: joining into an empty
//! buffer aliases the field instead of prepending a delimiter. This lets a
//! single body hold any number of records without length prefixes.
//!
//! Both separators are reserved; text containing them is rejected before
//! encoding (see [`check_text`]).

use std::borrow::Cow;

use bytes::{Buf, Bytes};

use crate::error::{ReelError, Result};

/// Unit separator: between fields of the same record
pub const FIELD_SEPARATOR: u8 = 0x1F;

/// Record separator: before the first field of every record but the first
pub const RECORD_SEPARATOR: u8 = 0x1E;

// =============================================================================
// Split
// =============================================================================

/// Cursor over a buffer, yielding one delimited field at a time
///
/// Owned by the caller and threaded explicitly between calls, so two workers
/// parsing at the same time never see each other's position. Fields are
/// zero-copy slices of the underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct FieldCursor {
    remaining: Bytes,
    exhausted: bool,
}

impl FieldCursor {
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        Self {
            remaining: buffer.into(),
            exhausted: false,
        }
    }

    /// Start consuming a new buffer, discarding whatever was left
    pub fn reset(&mut self, buffer: impl Into<Bytes>) {
        self.remaining = buffer.into();
        self.exhausted = false;
    }

    /// Next field up to `delimiter`, or `None` once the buffer is used up
    ///
    /// A trailing delimiter is followed by one empty field.
    pub fn next_field(&mut self, delimiter: u8) -> Option<Bytes> {
        if self.exhausted {
            return None;
        }

        match self.remaining.iter().position(|&b| b == delimiter) {
            Some(pos) => {
                let field = self.remaining.split_to(pos);
                self.remaining.advance(1);
                Some(field)
            }
            None => {
                self.exhausted = true;
                Some(std::mem::take(&mut self.remaining))
            }
        }
    }

    /// Next field up to `delimiter`; empty once the buffer is used up
    pub fn split(&mut self, delimiter: u8) -> Bytes {
        self.next_field(delimiter).unwrap_or_default()
    }

    /// True when every field has been yielded
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> &[u8] {
        &self.remaining
    }
}

// =============================================================================
// Join
// =============================================================================

/// Growable buffer that fields are joined into
///
/// The first join makes the buffer alias the field (borrowed fields are not
/// copied, owned ones are moved in). The second join forces an owned
/// allocation and appends `delimiter + field`.
#[derive(Debug, Clone, Default)]
pub struct FieldBuffer<'a> {
    buf: Cow<'a, [u8]>,
    fields: usize,
}

impl<'a> FieldBuffer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `delimiter` then `field`
    pub fn join(&mut self, delimiter: u8, field: impl Into<Cow<'a, [u8]>>) {
        let field = field.into();
        if self.fields == 0 {
            self.buf = field;
        } else {
            let owned = self.buf.to_mut();
            owned.reserve(1 + field.len());
            owned.push(delimiter);
            owned.extend_from_slice(&field);
        }
        self.fields += 1;
    }

    /// Append one record: its first field behind a record separator, the
    /// rest behind field separators
    pub fn push_record<I, F>(&mut self, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Cow<'a, [u8]>>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            let delimiter = if i == 0 { RECORD_SEPARATOR } else { FIELD_SEPARATOR };
            self.join(delimiter, field);
        }
    }

    /// Number of fields joined so far
    pub fn field_count(&self) -> usize {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer still aliases the first joined field
    pub fn is_borrowed(&self) -> bool {
        matches!(self.buf, Cow::Borrowed(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.into_owned()
    }
}

// =============================================================================
// Records
// =============================================================================

/// Split a response body into records of exactly `width` fields
///
/// An empty body holds zero records.
pub fn decode_records(body: impl Into<Bytes>, width: usize) -> Result<Vec<Vec<Bytes>>> {
    let body = body.into();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    let mut outer = FieldCursor::new(body);
    while let Some(record) = outer.next_field(RECORD_SEPARATOR) {
        let mut inner = FieldCursor::new(record);
        let mut fields = Vec::with_capacity(width);
        for _ in 0..width {
            let field = inner.next_field(FIELD_SEPARATOR).ok_or_else(|| {
                ReelError::Protocol(format!(
                    "Record {} has {} fields, expected {}",
                    records.len(),
                    fields.len(),
                    width
                ))
            })?;
            fields.push(field);
        }
        if !inner.is_exhausted() {
            return Err(ReelError::Protocol(format!(
                "Record {} has more than {} fields",
                records.len(),
                width
            )));
        }
        records.push(fields);
    }

    Ok(records)
}

/// Reject text that would corrupt the encoding
pub fn check_text(name: &str, text: &[u8]) -> Result<()> {
    if text.iter().any(|&b| b == FIELD_SEPARATOR || b == RECORD_SEPARATOR) {
        return Err(ReelError::validation(format!(
            "{} contains a reserved separator byte",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_consumes_fields_in_order() {
        let mut cursor = FieldCursor::new(&b"a\x1Fbc\x1F\x1Fd"[..]);
        assert_eq!(cursor.split(FIELD_SEPARATOR), &b"a"[..]);
        assert_eq!(cursor.split(FIELD_SEPARATOR), &b"bc"[..]);
        assert_eq!(cursor.split(FIELD_SEPARATOR), &b""[..]);
        assert!(!cursor.is_exhausted());
        assert_eq!(cursor.split(FIELD_SEPARATOR), &b"d"[..]);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.split(FIELD_SEPARATOR), &b""[..]);
        assert_eq!(cursor.next_field(FIELD_SEPARATOR), None);
    }

    #[test]
    fn test_reset_discards_previous_buffer() {
        let mut cursor = FieldCursor::new(&b"x\x1Fy"[..]);
        cursor.split(FIELD_SEPARATOR);
        cursor.reset(&b"z"[..]);
        assert_eq!(cursor.split(FIELD_SEPARATOR), &b"z"[..]);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_first_join_aliases() {
        let title = b"Dune".to_vec();
        let mut buffer = FieldBuffer::new();
        buffer.join(FIELD_SEPARATOR, &title[..]);
        assert!(buffer.is_borrowed());
        assert_eq!(buffer.as_bytes().as_ptr(), title.as_ptr());

        buffer.join(FIELD_SEPARATOR, &b"2021"[..]);
        assert!(!buffer.is_borrowed());
        assert_eq!(buffer.as_bytes(), b"Dune\x1F2021");
    }

    #[test]
    fn test_check_text() {
        assert!(check_text("title", b"Alien").is_ok());
        assert!(check_text("title", b"Ali\x1Een").is_err());
        assert!(check_text("genre", b"\x1F").is_err());
    }
}
