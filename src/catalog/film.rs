//! Film records
//!
//! Row types and their conversion to and from wire fields.

use std::borrow::Cow;

use bytes::Bytes;

use crate::error::{ReelError, Result};
use crate::protocol::codec::check_text;

/// Latest release year a film may carry
pub const MAX_YEAR: u16 = 9999;

/// A stored film
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Film {
    pub id: i64,
    pub title: String,
    /// Comma-joined list of genre names
    pub genre: String,
    pub director: String,
    pub year: u16,
}

/// A film that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFilm {
    pub title: String,
    pub genre: String,
    pub director: String,
    pub year: u16,
}

/// The (id, title) projection returned by LIST_TITLES
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmTitle {
    pub id: i64,
    pub title: String,
}

impl NewFilm {
    pub fn new(
        title: impl Into<String>,
        genre: impl Into<String>,
        director: impl Into<String>,
        year: u16,
    ) -> Self {
        Self {
            title: title.into(),
            genre: genre.into(),
            director: director.into(),
            year,
        }
    }

    /// Check every field is encodable and the year is in range
    pub fn validate(&self) -> Result<()> {
        check_text("title", self.title.as_bytes())?;
        check_text("genre", self.genre.as_bytes())?;
        check_text("director", self.director.as_bytes())?;
        check_year(self.year)
    }

    /// Request body fields: title, genre, director, year
    pub fn wire_fields(&self) -> [Cow<'_, [u8]>; 4] {
        [
            Cow::Borrowed(self.title.as_bytes()),
            Cow::Borrowed(self.genre.as_bytes()),
            Cow::Borrowed(self.director.as_bytes()),
            Cow::Owned(self.year.to_string().into_bytes()),
        ]
    }
}

impl Film {
    /// Number of fields in an encoded film record
    pub const WIRE_WIDTH: usize = 5;

    /// Record fields in listing order: id, title, genre, director, year
    pub fn wire_fields(&self) -> [Cow<'_, [u8]>; 5] {
        [
            Cow::Owned(self.id.to_string().into_bytes()),
            Cow::Borrowed(self.title.as_bytes()),
            Cow::Borrowed(self.genre.as_bytes()),
            Cow::Borrowed(self.director.as_bytes()),
            Cow::Owned(self.year.to_string().into_bytes()),
        ]
    }

    pub fn from_fields(fields: &[Bytes]) -> Result<Self> {
        match fields {
            [id, title, genre, director, year] => Ok(Self {
                id: parse_id(id)?,
                title: parse_text("title", title)?,
                genre: parse_text("genre", genre)?,
                director: parse_text("director", director)?,
                year: parse_year(year)?,
            }),
            _ => Err(ReelError::validation(format!(
                "film record has {} fields, expected {}",
                fields.len(),
                Self::WIRE_WIDTH
            ))),
        }
    }

    /// Whether `name` is one of this film's comma-separated genres
    pub fn has_genre(&self, name: &str) -> bool {
        self.genres().any(|g| g == name)
    }

    /// Genre names in the order they were added
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre.split(',').map(str::trim).filter(|g| !g.is_empty())
    }
}

impl FilmTitle {
    pub const WIRE_WIDTH: usize = 2;

    pub fn wire_fields(&self) -> [Cow<'_, [u8]>; 2] {
        [
            Cow::Owned(self.id.to_string().into_bytes()),
            Cow::Borrowed(self.title.as_bytes()),
        ]
    }

    pub fn from_fields(fields: &[Bytes]) -> Result<Self> {
        match fields {
            [id, title] => Ok(Self {
                id: parse_id(id)?,
                title: parse_text("title", title)?,
            }),
            _ => Err(ReelError::validation(format!(
                "title record has {} fields, expected {}",
                fields.len(),
                Self::WIRE_WIDTH
            ))),
        }
    }
}

// =============================================================================
// Field parsing
// =============================================================================

/// Parse a decimal film id
pub fn parse_id(field: &[u8]) -> Result<i64> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            ReelError::validation(format!(
                "id should be an integer: {:?}",
                String::from_utf8_lossy(field)
            ))
        })
}

/// Parse a decimal release year in `0..=MAX_YEAR`
pub fn parse_year(field: &[u8]) -> Result<u16> {
    let year = std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| {
            ReelError::validation(format!(
                "year should be an integer: {:?}",
                String::from_utf8_lossy(field)
            ))
        })?;
    check_year(year)?;
    Ok(year)
}

/// Decode a UTF-8 text field that must not contain separator bytes
pub fn parse_text(name: &str, field: &[u8]) -> Result<String> {
    check_text(name, field)?;
    String::from_utf8(field.to_vec())
        .map_err(|_| ReelError::validation(format!("{} is not valid UTF-8", name)))
}

fn check_year(year: u16) -> Result<()> {
    if year > MAX_YEAR {
        return Err(ReelError::validation(format!(
            "year {} is outside 0..={}",
            year, MAX_YEAR
        )));
    }
    Ok(())
}
