//! SQLite persistence for the push engine

pub mod manager;
pub mod pool;
pub mod sync_store;

pub use manager::DbManager;
pub use pool::{PoolConfig, SqliteConnection, SqlitePool};
pub use sync_store::{NewTimesheet, SqliteSyncStore};
