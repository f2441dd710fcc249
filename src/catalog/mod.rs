//! Catalog Module
//!
//! Film records and the SQLite-backed store that persists them.
//!
//! ## Responsibilities
//! - Own one store handle (SQLite connection) per worker
//! - CRUD on the `films` table
//! - Transactional genre append, safe under concurrent connections
//!
//! ## Result convention
//! Every store operation is tri-state: `Ok(_)`, `Err(ReelError::NotFound)`
//! or any other error (reported to clients as an internal error).

mod film;
mod schema;
mod store;

pub use film::{parse_id, parse_text, parse_year, Film, FilmTitle, NewFilm, MAX_YEAR};
pub use schema::{CREATE_SCHEMA, FILE_PRAGMAS};
pub use store::CatalogStore;
