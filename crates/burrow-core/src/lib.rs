//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the types shared by the storage backends and the
//! HTTP gateway: the short token, the persisted link record and the
//! [`Storage`] contract every backend implements.

pub mod error;
pub mod record;
pub mod storage;
pub mod token;

pub use error::{CoreError, StorageError};
pub use record::{LinkRecord, LinkStatus};
pub use storage::Storage;
pub use token::ShortToken;
