//! Persistence layer: libSQL-backed storage for the step layout and users.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, StoredUser};
