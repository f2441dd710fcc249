//! Catalog store
//!
//! One store handle wraps one SQLite connection. Workers never share a
//! handle; they share only the database file, and SQLite's locking
//! serializes their transactions.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::{ReelError, Result};
use super::schema::{CREATE_SCHEMA, FILE_PRAGMAS};
use super::{Film, FilmTitle, NewFilm};

const FILM_COLUMNS: &str = "id, title, genre, director, year";

/// Private handle on the film catalog
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open (or create) the catalog at `path` and apply the schema
    ///
    /// `busy_timeout` bounds how long a statement waits for another
    /// connection's write lock before failing.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;
        // Set before anything else so concurrent opens wait on each other
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(FILE_PRAGMAS)?;
        conn.execute_batch(CREATE_SCHEMA)?;
        tracing::debug!("Opened catalog store at {}", path.display());
        Ok(Self { conn })
    }

    /// Create an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_SCHEMA)?;
        Ok(Self { conn })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a film. Returns the id the store assigned.
    pub fn insert(&self, film: &NewFilm) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO films (title, genre, director, year) VALUES (?1, ?2, ?3, ?4)",
            params![film.title, film.genre, film.director, film.year],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Delete a film by id
    pub fn delete(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM films WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(ReelError::NotFound);
        }
        Ok(())
    }

    /// Append `genre` to the film's comma-joined genre list
    ///
    /// Read-modify-write inside an IMMEDIATE transaction: the write lock is
    /// taken at BEGIN, so a concurrent append on the same film from another
    /// handle runs entirely before or entirely after this one. Any failure
    /// drops the transaction, which rolls it back.
    pub fn append_genre(&mut self, id: i64, genre: &str) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
            .query_row("SELECT genre FROM films WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(current) = current else {
            tracing::debug!("Film {} not found, rolling back genre append", id);
            tx.rollback()?;
            return Err(ReelError::NotFound);
        };

        let joined = if current.is_empty() {
            genre.to_string()
        } else {
            format!("{},{}", current, genre)
        };

        tx.execute(
            "UPDATE films SET genre = ?1 WHERE id = ?2",
            params![joined, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every film projected to (id, title)
    pub fn list_titles(&self) -> Result<Vec<FilmTitle>> {
        let mut stmt = self.conn.prepare("SELECT id, title FROM films ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(FilmTitle {
                id: row.get(0)?,
                title: row.get(1)?,
            })
        })?;
        let mut titles = Vec::new();
        for r in rows {
            titles.push(r?);
        }
        Ok(titles)
    }

    /// Every film, all columns
    pub fn list_all(&self) -> Result<Vec<Film>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM films ORDER BY id", FILM_COLUMNS))?;
        let rows = stmt.query_map([], map_film)?;
        let mut films = Vec::new();
        for r in rows {
            films.push(r?);
        }
        Ok(films)
    }

    /// A single film by id
    pub fn get(&self, id: i64) -> Result<Film> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM films WHERE id = ?1", FILM_COLUMNS),
                params![id],
                map_film,
            )
            .optional()?
            .ok_or(ReelError::NotFound)
    }

    /// Films whose genre text contains `pattern`
    ///
    /// Matching is a literal substring match using SQLite's default LIKE
    /// case rules (ASCII case-insensitive).
    pub fn list_by_genre(&self, pattern: &str) -> Result<Vec<Film>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM films WHERE genre LIKE ?1 ESCAPE '\\' ORDER BY id",
            FILM_COLUMNS
        ))?;
        let like = format!("%{}%", escape_like(pattern));
        let rows = stmt.query_map(params![like], map_film)?;
        let mut films = Vec::new();
        for r in rows {
            films.push(r?);
        }
        Ok(films)
    }

    /// Number of films in the catalog
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM films", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn map_film(row: &Row<'_>) -> rusqlite::Result<Film> {
    Ok(Film {
        id: row.get(0)?,
        title: row.get(1)?,
        genre: row.get(2)?,
        director: row.get(3)?,
        year: row.get(4)?,
    })
}

/// Escape LIKE wildcards so `pattern` only matches literally
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("orr"), "orr");
        assert_eq!(escape_like("100%_\\"), "100\\%\\_\\\\");
    }

    #[test]
    fn test_open_in_memory_is_empty() {
        let store = CatalogStore::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_append_genre_to_empty_genre_has_no_leading_comma() {
        let mut store = CatalogStore::open_in_memory().unwrap();
        let id = store.insert(&NewFilm::new("Untitled", "", "Nobody", 2000)).unwrap();
        store.append_genre(id, "Drama").unwrap();
        assert_eq!(store.get(id).unwrap().genre, "Drama");
    }
}
