//! Big-endian binary field reading, both sequentially over an [`std::io::Read`]
//! and at arbitrary offsets into an in-memory byte source.

pub mod be;

pub use be::{ByteReader, ReadAt};
