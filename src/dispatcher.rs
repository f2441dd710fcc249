//! Dispatcher Module
//!
//! Turns one decoded request into one response.
//!
//! ## Request lifecycle
//! ```text
//!   DECODE ──► EXECUTE ──► ENCODE
//!     │           │           │
//!     │ fields    │ store     │ records
//!     ▼           ▼           ▼
//!  FieldCursor  CatalogStore  FieldBuffer
//! ```
//!
//! Receiving the request and sending the response belong to the
//! connection; the dispatcher never touches the socket and never fails:
//! every error is folded into a NOT_FOUND or INTERNAL_ERROR response.

use std::borrow::Cow;

use bytes::Bytes;

use crate::catalog::{parse_id, parse_text, parse_year, CatalogStore, Film, NewFilm};
use crate::error::{ReelError, Result};
use crate::protocol::{Command, FieldBuffer, FieldCursor, RequestHeader, Response, FIELD_SEPARATOR};

/// Executes requests against one private store handle
pub struct Dispatcher {
    store: CatalogStore,
}

impl Dispatcher {
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    /// Handle one request
    ///
    /// Validation, not-found and store failures all produce a response;
    /// the connection stays open after any of them.
    pub fn dispatch(&mut self, header: RequestHeader, body: Vec<u8>) -> Response {
        let command = match header.command() {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Rejecting request: {}", e);
                return Response::internal_error();
            }
        };

        tracing::trace!("Executing {} ({} byte body)", command.name(), body.len());

        match self.execute(command, Bytes::from(body)) {
            Ok(response) => response,
            Err(ReelError::NotFound) => Response::not_found(),
            Err(e @ ReelError::Validation(_)) => {
                tracing::warn!("{} rejected: {}", command.name(), e);
                Response::internal_error()
            }
            Err(e) => {
                tracing::error!("{} failed: {}", command.name(), e);
                Response::internal_error()
            }
        }
    }

    /// Access the underlying store
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    fn execute(&mut self, command: Command, body: Bytes) -> Result<Response> {
        match command {
            Command::CreateFilm => {
                let film = decode_new_film(body)?;
                let id = self.store.insert(&film)?;
                tracing::debug!("Created film {} ({:?})", id, film.title);
                // The row exists even if its id cannot be reported
                Response::ok(u64::try_from(id).unwrap_or(u64::MAX), Vec::new())
            }
            Command::RemoveFilm => {
                let mut cursor = FieldCursor::new(body);
                let id = parse_id(&expect_field(&mut cursor, "id")?)?;
                expect_end(&cursor)?;
                self.store.delete(id)?;
                Ok(Response::empty())
            }
            Command::AddGenre => {
                let mut cursor = FieldCursor::new(body);
                let id = parse_id(&expect_field(&mut cursor, "id")?)?;
                let genre = parse_text("genre", &expect_field(&mut cursor, "genre")?)?;
                expect_end(&cursor)?;
                if genre.is_empty() {
                    return Err(ReelError::validation("genre to add is empty"));
                }
                self.store.append_genre(id, &genre)?;
                Ok(Response::empty())
            }
            Command::ListTitles => {
                let titles = self.store.list_titles()?;
                encode_rows(&titles, |t| t.wire_fields())
            }
            Command::ListFilms => {
                let films = self.store.list_all()?;
                encode_rows(&films, Film::wire_fields)
            }
            Command::GetFilm => {
                let id = parse_id(&body)?;
                let film = self.store.get(id)?;
                encode_rows(std::slice::from_ref(&film), Film::wire_fields)
            }
            Command::ListByGenre => {
                let pattern = parse_text("pattern", &body)?;
                let films = self.store.list_by_genre(&pattern)?;
                encode_rows(&films, Film::wire_fields)
            }
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

fn decode_new_film(body: Bytes) -> Result<NewFilm> {
    let mut cursor = FieldCursor::new(body);
    let title = parse_text("title", &expect_field(&mut cursor, "title")?)?;
    let genre = parse_text("genre", &expect_field(&mut cursor, "genre")?)?;
    let director = parse_text("director", &expect_field(&mut cursor, "director")?)?;
    let year = parse_year(&expect_field(&mut cursor, "year")?)?;
    expect_end(&cursor)?;
    Ok(NewFilm {
        title,
        genre,
        director,
        year,
    })
}

fn expect_field(cursor: &mut FieldCursor, name: &str) -> Result<Bytes> {
    cursor
        .next_field(FIELD_SEPARATOR)
        .ok_or_else(|| ReelError::validation(format!("missing {} field", name)))
}

/// Surplus fields mean a separator byte leaked into a value
fn expect_end(cursor: &FieldCursor) -> Result<()> {
    if !cursor.is_exhausted() {
        return Err(ReelError::validation(format!(
            "unexpected trailing fields ({} bytes)",
            cursor.remaining().len()
        )));
    }
    Ok(())
}

// =============================================================================
// Encoding
// =============================================================================

fn encode_rows<'a, T, const N: usize>(
    rows: &'a [T],
    fields: impl Fn(&'a T) -> [Cow<'a, [u8]>; N],
) -> Result<Response> {
    let mut buffer = FieldBuffer::new();
    for row in rows {
        buffer.push_record(fields(row));
    }
    Response::ok(rows.len() as u64, buffer.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{codec::decode_records, Status};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(CatalogStore::open_in_memory().unwrap())
    }

    fn request(d: &mut Dispatcher, command: Command, body: &[u8]) -> Response {
        d.dispatch(RequestHeader::new(command, body.len() as u16), body.to_vec())
    }

    #[test]
    fn test_create_then_get() {
        let mut d = dispatcher();
        let created = request(&mut d, Command::CreateFilm, b"Dune\x1FSci-Fi\x1FVilleneuve\x1F2021");
        assert_eq!(created.status, Status::NoError);
        assert!(created.count > 0);
        assert!(created.body.is_empty());

        let id = created.count.to_string();
        let got = request(&mut d, Command::GetFilm, id.as_bytes());
        assert_eq!(got.status, Status::NoError);
        assert_eq!(got.count, 1);
        let records = decode_records(got.body, Film::WIRE_WIDTH).unwrap();
        let film = Film::from_fields(&records[0]).unwrap();
        assert_eq!(film.title, "Dune");
        assert_eq!(film.genre, "Sci-Fi");
        assert_eq!(film.director, "Villeneuve");
        assert_eq!(film.year, 2021);
    }

    #[test]
    fn test_validation_errors_skip_the_store() {
        let mut d = dispatcher();
        for (command, body) in [
            (Command::CreateFilm, &b"Dune\x1FSci-Fi\x1FVilleneuve\x1Fsoon"[..]),
            (Command::CreateFilm, &b"Dune\x1FSci-Fi\x1FVilleneuve"[..]),
            (Command::CreateFilm, &b"Dune\x1FSci-Fi\x1FVilleneuve\x1F2021\x1Fextra"[..]),
            (Command::RemoveFilm, &b""[..]),
            (Command::AddGenre, &b"one\x1FHorror"[..]),
            (Command::AddGenre, &b"1\x1F"[..]),
            (Command::GetFilm, &b"abc"[..]),
        ] {
            let response = request(&mut d, command, body);
            assert_eq!(response.status, Status::InternalError, "{:?} {:?}", command, body);
            assert_eq!(response.count, 0);
            assert!(response.body.is_empty());
        }
        assert_eq!(d.store().count().unwrap(), 0);
    }

    #[test]
    fn test_unknown_command() {
        let mut d = dispatcher();
        let header = RequestHeader {
            command: 42,
            body_size: 0,
        };
        assert_eq!(d.dispatch(header, Vec::new()).status, Status::InternalError);
    }

    #[test]
    fn test_list_titles_empty_catalog() {
        let mut d = dispatcher();
        let response = request(&mut d, Command::ListTitles, b"");
        assert_eq!(response.status, Status::NoError);
        assert_eq!(response.count, 0);
        assert!(response.body.is_empty());
    }
}
