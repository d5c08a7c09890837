#![doc = include_str!("../README.md")]

pub use bytestore::{
    AlignedByteStore, ArrayByteStore, ByteStore, ChunkDescriptor, ChunkManager, ChunkedByteStore,
    Error as ByteStoreError, FileByteStore, PAGE_SIZE, SlotStore,
};

mod buffered;
mod bytes;
mod element;
mod error;
mod list;
#[cfg(feature = "serde_json")]
mod object;
mod options;
mod serialized;
mod serializer;

pub use buffered::*;
pub use bytes::*;
pub use element::*;
pub use error::*;
pub use list::*;
#[cfg(feature = "serde_json")]
pub use object::*;
pub use options::*;
pub use serialized::*;
pub use serializer::*;
