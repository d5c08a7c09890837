#![doc = include_str!("../README.md")]

mod aligned;
mod array;
mod chunked;
pub mod error;
mod file;
mod manager;
mod slot;
mod store;

pub use aligned::*;
pub use array::*;
pub use chunked::*;
pub use error::*;
pub use file::*;
pub use manager::*;
pub use slot::*;
pub use store::*;

pub const PAGE_SIZE: usize = 4096;
pub const PAGE_SIZE_MINUS_1: usize = PAGE_SIZE - 1;

#[inline]
pub(crate) fn ceil_to_page_size_multiple(num: usize) -> usize {
    (num + PAGE_SIZE_MINUS_1) & !PAGE_SIZE_MINUS_1
}
