//! Read-only decoder for MOBI and PalmDoc ebooks.
//!
//! [`Document::parse`] takes the bytes of a `.mobi`/`.prc`/`.pdb` file and
//! returns its metadata (title, author, ISBN, ... from the MOBI header and
//! the EXTH block) together with the text, decompressed from the PalmDoc
//! text records.
//!
//! ```no_run
//! let book = mobi::Document::open("book.mobi")?;
//! println!("{:?} by {:?}", book.title(), book.authors());
//! # Ok::<(), mobi::MobiError>(())
//! ```

pub mod compression;
pub mod document;
pub mod error;
pub mod exth_header;
pub mod metadata;
pub mod mobi_header;
pub mod palmdoc_header;
pub mod trailing;

pub use compression::palmdoc_decompress;
pub use document::{Document, HeaderInfo, ParseOptions};
pub use error::{MobiError, Result};
pub use metadata::Metadata;
pub use palmdoc_header::{Compression, Encryption};
pub use trailing::TrailingFlags;
