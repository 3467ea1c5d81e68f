// Share store implementations.

pub mod sqlite_share_store;

pub use sqlite_share_store::SqliteShareStore;
