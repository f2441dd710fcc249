//! # ReelDB
//!
//! A networked film catalog with:
//! - A compact binary protocol (fixed big-endian headers, delimited bodies)
//! - SQLite persistence, one private store handle per connection
//! - Thread-per-connection serving with a configurable connection limit
//! - Transactional genre appends that stay correct under concurrency
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │         (acceptor + one worker thread per client)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ header + body frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Dispatcher                               │
//! │          (decode fields → execute → encode records)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Field Codec │          │ CatalogStore│
//!   │ (US / RS)   │          │  (SQLite)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ shared file
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ streaming.db│
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod catalog;
pub mod dispatcher;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ReelError, Result};
pub use config::Config;
pub use catalog::{CatalogStore, Film, FilmTitle, NewFilm};
pub use client::Client;
pub use dispatcher::Dispatcher;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ReelDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
