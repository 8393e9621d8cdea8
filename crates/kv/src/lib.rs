//! Key-value storage backends
//!
//! Keys and values are plain strings; callers store JSON text under fixed
//! collection keys.

mod file;
mod storage;

pub use file::FileBackedStorage;
pub use storage::{InMemoryStorage, Storage};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for KvError {
    fn from(e: serde_json::Error) -> Self {
        KvError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KvError>;
