//! Student import pipeline configuration.
//!
//! # Environment Variables
//!
//! - `IMPORT_MAX_FILE_BYTES`: Upload size ceiling in bytes (default: 10 MiB)
//! - `IMPORT_CHUNK_SIZE`: Records per atomic store write (default: `500`)
//! - `IMPORT_DETAIL_LIMIT`: Duplicate/error details kept in a result,
//!   `0` keeps all of them (default: `100`)
//! - `IMPORT_PREVIEW_ROWS`: Rows returned in a session preview (default: `50`)
//! - `IMPORT_SESSION_TTL_SECS`: Idle time after which a session that is not
//!   importing is discarded (default: `3600`)

use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_DETAIL_LIMIT: usize = 100;
pub const DEFAULT_PREVIEW_ROWS: usize = 50;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportConfig {
    pub max_file_bytes: usize,
    pub chunk_size: usize,
    /// `None` keeps every duplicate and error detail.
    pub detail_limit: Option<usize>,
    pub preview_rows: usize,
    pub session_ttl: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            detail_limit: Some(DEFAULT_DETAIL_LIMIT),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl ImportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Unparseable values fall
    /// back to their defaults; a zero chunk size is raised to one.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        let detail_limit = match number("IMPORT_DETAIL_LIMIT") {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => Some(DEFAULT_DETAIL_LIMIT),
        };

        Self {
            max_file_bytes: number("IMPORT_MAX_FILE_BYTES").unwrap_or(DEFAULT_MAX_FILE_BYTES),
            chunk_size: number("IMPORT_CHUNK_SIZE")
                .unwrap_or(DEFAULT_CHUNK_SIZE)
                .max(1),
            detail_limit,
            preview_rows: number("IMPORT_PREVIEW_ROWS").unwrap_or(DEFAULT_PREVIEW_ROWS),
            session_ttl: number("IMPORT_SESSION_TTL_SECS")
                .map(|secs| Duration::from_secs(secs as u64))
                .unwrap_or(DEFAULT_SESSION_TTL),
        }
    }
}
