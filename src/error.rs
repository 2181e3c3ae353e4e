//! Error type shared by every stage of the codec.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bit_channel::Mode;

#[derive(Error, Debug)]
pub enum HuffError {
    /// The underlying file could not be opened or created.
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A byte-level write to storage failed (disk full, closed pipe, ...).
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// A byte-level read from storage failed for a reason other than end of data.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// End of data reached while more bits or bytes were expected.
    #[error("compressed stream ended early while reading {context}")]
    TruncatedStream { context: &'static str },

    /// The serialized tree is not a full binary tree over distinct symbols.
    #[error("malformed code tree: {reason}")]
    MalformedTree { reason: String },

    /// An operation was called on a channel opened in the other mode.
    #[error("channel is not open for {expected:?}")]
    WrongMode { expected: Mode },

    /// The input has more symbols than the 32-bit length header can record.
    #[error("input of {len} bytes exceeds the 32-bit length header")]
    InputTooLarge { len: u64 },

    /// Source and destination resolve to the same file.
    #[error("input and output are the same file: {path}")]
    SamePath { path: PathBuf },

    #[error("invalid character {found:?} in bit string")]
    InvalidCode { found: char },

    #[error("code table dump failed: {0}")]
    CodeDump(#[from] bincode::Error),
}

impl HuffError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        HuffError::MalformedTree {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HuffError>;
