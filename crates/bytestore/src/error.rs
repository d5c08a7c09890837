use std::{io, result};

use thiserror::Error;

pub type Result<T, E = Error> = result::Result<T, E>;

/// Error types for bytestore operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] io::Error),

    // Byte access errors
    #[error("Read of {len} bytes at offset {offset} is beyond store length {store_len}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        store_len: usize,
    },

    #[error("Store is closed")]
    Closed,

    // Slot errors
    #[error("Slot index {index} is out of range (len: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Access of {len} bytes is not aligned to the element size {element_size}")]
    Misaligned { len: usize, element_size: usize },

    #[error("Element size must be at least 1 byte")]
    InvalidElementSize,

    #[error("Chunk capacity of {chunk_bytes} bytes cannot hold an element of {element_size} bytes")]
    InvalidChunkCapacity {
        chunk_bytes: usize,
        element_size: usize,
    },

    #[error("Store length {store_len} is not a multiple of the element size {element_size}")]
    CorruptedLength {
        store_len: usize,
        element_size: usize,
    },
}
