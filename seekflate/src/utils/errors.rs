use std::io;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("No checkpoint with id {0}")]
    CheckpointNotFound(i64),

    #[error("Checkpoint {id} is corrupt: {reason}")]
    CorruptCheckpoint { id: i64, reason: String },

    #[error("Short read from source stream at byte {offset}: {source}")]
    StreamRead {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Decompression failed for checkpoint {id}: {source}")]
    Decompression {
        id: i64,
        #[source]
        source: InflateError,
    },

    #[error("CRC-32 mismatch for checkpoint {id}: recorded {expected:#010x}, extracted {actual:#010x}")]
    ChecksumMismatch { id: i64, expected: u32, actual: u32 },

    #[error("Seed of checkpoint {id} is {len} bytes, longer than the {window}-byte window")]
    SeedExceedsWindow { id: i64, len: usize, window: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExtractError {
    pub(crate) fn corrupt(id: i64, reason: impl Into<String>) -> Self {
        Self::CorruptCheckpoint {
            id,
            reason: reason.into(),
        }
    }

    /// Whether more block input could fix this: the decoder ran dry, or the
    /// source ended before the requested bytes.
    pub fn is_short_input(&self) -> bool {
        match self {
            Self::Decompression {
                source: InflateError::Underflow { .. },
                ..
            } => true,
            Self::StreamRead { source, .. } => source.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InflateError {
    #[error("Invalid deflate data: {0}")]
    Corrupt(#[from] flate2::DecompressError),

    #[error("Input exhausted after {produced} of {expected} output bytes")]
    Underflow { produced: usize, expected: usize },

    #[error("Priming block did not reproduce the seed bytes")]
    SeedMismatch,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Checkpoint {id} has an invalid {column}: {value}")]
    InvalidColumn {
        id: i64,
        column: &'static str,
        value: String,
    },
}
