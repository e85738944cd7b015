//! Handwriting extraction: page -> deskewed text lines -> transparent glyphs
//!
//! Every stage reads and writes through a [`Storage`](crate::storage::Storage).

pub mod pipeline;
pub mod steps;

#[cfg(test)]
pub(crate) mod testing;

pub use pipeline::{ImageReport, Pipeline};
