//! Network Module
//!
//! TCP server and client connection handling.
//!
//! ## Architecture
//! - Single acceptor thread, bounded by a connection limiter
//! - One detached worker thread per connection
//! - Each worker opens its own store handle; only the database file is shared

mod server;
mod connection;
mod limiter;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use limiter::{ConnectionLimiter, ConnectionPermit};
