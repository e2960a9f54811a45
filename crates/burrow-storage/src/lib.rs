//! Link storage backends.
//!
//! Three interchangeable implementations of [`burrow_core::Storage`]:
//! [`MemoryStore`], [`FileStore`] and [`PostgresStore`]. [`open_storage`]
//! picks one at startup from [`StorageSettings`].

pub mod file;
pub mod memory;
pub mod postgres;
pub mod selector;

pub use burrow_core::{LinkRecord, LinkStatus, ShortToken, Storage, StorageError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use selector::{open_storage, BackendKind, StorageSettings};
