//! Client
//!
//! Blocking client for the catalog protocol. One request is in flight at a
//! time; each call sends a request and waits for its response.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Bytes;

use crate::catalog::{Film, FilmTitle, NewFilm};
use crate::error::{ReelError, Result};
use crate::protocol::codec::{check_text, decode_records};
use crate::protocol::{read_response, write_request, Command, FieldBuffer, Response, Status, FIELD_SEPARATOR};

/// A connection to a ReelDB server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a raw request and return the raw response, whatever its status
    pub fn request(&mut self, command: Command, body: &[u8]) -> Result<Response> {
        write_request(&mut self.writer, command, body)?;
        read_response(&mut self.reader)
    }

    // =========================================================================
    // Typed commands
    // =========================================================================

    /// Create a film. Returns its assigned id.
    pub fn create_film(&mut self, film: &NewFilm) -> Result<i64> {
        film.validate()?;
        let mut body = FieldBuffer::new();
        for field in film.wire_fields() {
            body.join(FIELD_SEPARATOR, field);
        }
        let response = self.checked(Command::CreateFilm, body.as_bytes())?;
        Ok(i64::from(response.count))
    }

    pub fn remove_film(&mut self, id: i64) -> Result<()> {
        self.checked(Command::RemoveFilm, id.to_string().as_bytes())?;
        Ok(())
    }

    /// Append a genre to a film's genre list
    pub fn add_genre(&mut self, id: i64, genre: &str) -> Result<()> {
        check_text("genre", genre.as_bytes())?;
        let id = id.to_string();
        let mut body = FieldBuffer::new();
        body.join(FIELD_SEPARATOR, id.as_bytes());
        body.join(FIELD_SEPARATOR, genre.as_bytes());
        self.checked(Command::AddGenre, body.as_bytes())?;
        Ok(())
    }

    pub fn list_titles(&mut self) -> Result<Vec<FilmTitle>> {
        let response = self.checked(Command::ListTitles, &[])?;
        decode_rows(response, FilmTitle::WIRE_WIDTH, FilmTitle::from_fields)
    }

    pub fn list_films(&mut self) -> Result<Vec<Film>> {
        let response = self.checked(Command::ListFilms, &[])?;
        decode_rows(response, Film::WIRE_WIDTH, Film::from_fields)
    }

    pub fn get_film(&mut self, id: i64) -> Result<Film> {
        let response = self.checked(Command::GetFilm, id.to_string().as_bytes())?;
        decode_rows(response, Film::WIRE_WIDTH, Film::from_fields)?
            .pop()
            .ok_or_else(|| ReelError::Protocol("GET_FILM returned no record".to_string()))
    }

    /// Films whose genre text contains `pattern`
    pub fn list_by_genre(&mut self, pattern: &str) -> Result<Vec<Film>> {
        check_text("pattern", pattern.as_bytes())?;
        let response = self.checked(Command::ListByGenre, pattern.as_bytes())?;
        decode_rows(response, Film::WIRE_WIDTH, Film::from_fields)
    }

    /// Send a request and turn error statuses into errors
    fn checked(&mut self, command: Command, body: &[u8]) -> Result<Response> {
        let response = self.request(command, body)?;
        match response.status {
            Status::NoError => Ok(response),
            Status::NotFound => Err(ReelError::NotFound),
            Status::InternalError => Err(ReelError::Remote(format!("{} failed", command.name()))),
        }
    }
}

fn decode_rows<T>(
    response: Response,
    width: usize,
    parse: impl Fn(&[Bytes]) -> Result<T>,
) -> Result<Vec<T>> {
    let records = decode_records(response.body, width)?;
    if records.len() != response.count as usize {
        return Err(ReelError::Protocol(format!(
            "Header announced {} records, body holds {}",
            response.count,
            records.len()
        )));
    }
    records
        .iter()
        .map(|fields| parse(fields).map_err(|e| ReelError::Protocol(e.to_string())))
        .collect()
}
