/// SQL statements for creating the catalog schema.
///
/// `AUTOINCREMENT` keeps ids of deleted films from ever being handed out
/// again.
pub const CREATE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS films (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    genre TEXT NOT NULL,
    director TEXT NOT NULL,
    year INTEGER NOT NULL
);
";

/// Pragmas for file-backed stores shared between connections.
pub const FILE_PRAGMAS: &str = "PRAGMA journal_mode=WAL;\
     PRAGMA synchronous=NORMAL;";
