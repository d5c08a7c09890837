use std::{io, result};

use thiserror::Error;

pub type Result<T, E = Error> = result::Result<T, E>;

/// Error types for slotlist operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] io::Error),
    #[error(transparent)]
    ByteStore(#[from] bytestore::Error),
    #[cfg(feature = "serde_json")]
    #[error(transparent)]
    SerdeJSON(#[from] serde_json::Error),

    #[error("Index out of range: index: {index}, len: {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Element size must be at least 1 byte")]
    InvalidElementSize,
    #[error("Element size {declared} is below the natural width {natural} of the type")]
    ElementSizeTooSmall { declared: usize, natural: usize },
    #[error("Serializer writes {serializer}-byte slots but the store holds {store}-byte slots")]
    ElementSizeMismatch { serializer: usize, store: usize },
    #[error("Payload of {payload} bytes doesn't fit a {element_size}-byte slot")]
    PayloadTooLarge { payload: usize, element_size: usize },
    #[error("Wrong length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("Corrupted slot: {0}")]
    CorruptedSlot(String),
    #[error("Buffer size must be at least 1")]
    InvalidBufferSize,
    #[error("Chunked stores can't be reopened: chunk topology isn't persisted")]
    ChunkedReopen,
}
