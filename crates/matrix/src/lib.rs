//! Matrix chat platform for yuta.
//!
//! Talks to a homeserver through the Client-Server API v3 with `reqwest`:
//! password or token login, long-poll `/sync` for inbound events, and
//! `m.room.message` sends for replies.

pub mod api;
pub mod error;
pub mod factory;
pub mod session;
pub mod sync;

pub use {factory::MatrixSessionFactory, session::MatrixSession};
