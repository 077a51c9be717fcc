pub mod connection;
pub mod entities;
pub mod models;
pub mod ratings;
pub mod setup;
pub mod store;

pub use connection::{DbConn, DbPool, create_memory_pool, create_pool, get_connection};
pub use models::*;
pub use store::SqliteStore;
