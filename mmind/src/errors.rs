use std::io;

use thiserror::Error;

/// A stable, machine-readable code for an error variant.
pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MmindError {
    #[error("Out of memory while allocating a chunk")]
    OutOfMemory,
    #[error("Write beyond the store capacity")]
    CapacityExceeded,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("All {max_attempts} attempts have been used")]
    QuotaExceeded { max_attempts: u32 },
    #[error("Caller is not authorized for this command")]
    PermissionDenied,
    #[error("Unsupported command code {0:#06x}")]
    UnsupportedCommand(u32),
    #[error("Interrupted while waiting for the session lock")]
    Interrupted,
    #[error("Malformed feedback record: {0}")]
    MalformedRecord(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ErrorCode for MmindError {
    fn code(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "ENOMEM",
            Self::CapacityExceeded => "ENOSPC",
            Self::InvalidArgument(_) => "EINVAL",
            Self::QuotaExceeded { .. } => "EDQUOT",
            Self::PermissionDenied => "EPERM",
            Self::UnsupportedCommand(_) => "ENOTTY",
            Self::Interrupted => "ERESTARTSYS",
            Self::MalformedRecord(_) => "EBADMSG",
            Self::Config(_) => "ECONFIG",
        }
    }
}

impl From<std::collections::TryReserveError> for MmindError {
    fn from(_: std::collections::TryReserveError) -> Self {
        MmindError::OutOfMemory
    }
}

impl From<MmindError> for io::Error {
    fn from(err: MmindError) -> Self {
        let kind = match err {
            MmindError::PermissionDenied => io::ErrorKind::PermissionDenied,
            MmindError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            MmindError::OutOfMemory => io::ErrorKind::OutOfMemory,
            MmindError::UnsupportedCommand(_) => io::ErrorKind::Unsupported,
            MmindError::MalformedRecord(_) => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, MmindError>;
