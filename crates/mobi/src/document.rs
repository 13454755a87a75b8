use std::path::Path;

use log::{debug, trace, warn};
use palm_database::PDB;

use crate::compression::palmdoc_decompress;
use crate::error::{MobiError, Result};
use crate::exth_header::EXTHHeader;
use crate::metadata::Metadata;
use crate::mobi_header::MOBIHeader;
use crate::palmdoc_header::{Compression, Encryption, PalmDOCHeader};
use crate::trailing::TrailingFlags;

/// Knobs for [`Document::parse_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Trim and decompress the text records. When off, only the raw records
    /// and the metadata are produced.
    pub decode_text: bool,
    /// Treat a missing EXTH signature as fatal instead of carrying on with
    /// the fixed-header metadata.
    pub strict_exth: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            decode_text: true,
            strict_exth: false,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode_text(mut self, decode_text: bool) -> Self {
        self.decode_text = decode_text;
        self
    }

    pub fn strict_exth(mut self, strict_exth: bool) -> Self {
        self.strict_exth = strict_exth;
        self
    }
}

/// Header values the rest of the decode depends on. For a plain PalmDoc
/// file the MOBI-only fields are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub record_count: u16,
    pub first_record_offset: u32,
    pub header_length: u32,
    pub mobi_version: u32,
    pub compression: Compression,
    pub drm: Encryption,
    pub text_length: u32,
    pub text_record_count: u16,
    pub trailing_flags: TrailingFlags,
    pub has_exth: bool,
}

/// A decoded book: its metadata, the raw text records and, when they could
/// be decoded, the concatenated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    metadata: Metadata,
    header: HeaderInfo,
    text_records: Vec<Vec<u8>>,
    text: Option<Vec<u8>>,
    warnings: Vec<String>,
}

impl Document {
    /// Reads the whole file into memory and parses it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read(path)?;
        Self::parse(&source)
    }

    pub fn parse(source: &[u8]) -> Result<Self> {
        Self::parse_with(source, &ParseOptions::default())
    }

    pub fn parse_with(source: &[u8], options: &ParseOptions) -> Result<Self> {
        let pdb = PDB::parse(source)?;
        let first_record = pdb
            .records
            .first()
            .ok_or_else(|| MobiError::Format("database has no records".to_string()))?;
        let base = first_record.data_offset as usize;

        let palmdoc_header = PalmDOCHeader::parse(source, base)?;
        let mobi_header = if pdb.header.is_palmdoc() {
            None
        } else {
            Some(MOBIHeader::parse(source, base)?)
        };

        let header = HeaderInfo {
            record_count: pdb.header.number_of_records,
            first_record_offset: first_record.data_offset,
            header_length: mobi_header.as_ref().map_or(0, |h| h.header_length),
            mobi_version: mobi_header.as_ref().map_or(0, |h| h.file_version),
            compression: palmdoc_header.compression,
            drm: palmdoc_header.encryption,
            text_length: palmdoc_header.text_length,
            text_record_count: palmdoc_header.record_count,
            trailing_flags: mobi_header
                .as_ref()
                .map_or_else(TrailingFlags::default, |h| h.extra_record_data_flags),
            has_exth: mobi_header.as_ref().is_some_and(MOBIHeader::has_exth),
        };
        debug!("{header:?}");

        let mut warnings = Vec::new();

        let last_text_record = 1 + header.text_record_count as usize;
        let text_records: Vec<Vec<u8>> = pdb
            .records(source, 1..last_text_record)?
            .into_iter()
            .map(<[u8]>::to_vec)
            .collect();

        let text = if !options.decode_text {
            None
        } else if header.drm.is_encrypted() {
            warnings.push(format!("text is encrypted ({:?}), not decoded", header.drm));
            None
        } else {
            match header.compression {
                Compression::PalmDoc | Compression::None => {
                    Some(decode_text(&text_records, &header)?)
                }
                other => {
                    warnings.push(format!(
                        "{other:?} compression is not supported, text not decoded"
                    ));
                    None
                }
            }
        };

        let mut metadata = Metadata::new();
        match &mobi_header {
            Some(mobi_header) => {
                if !mobi_header.full_name.is_empty() {
                    metadata.insert("title", mobi_header.full_name.as_str());
                }
                if header.has_exth {
                    let offset = mobi_header.exth_offset(base);
                    match EXTHHeader::parse(source, offset) {
                        Ok(exth) => exth.extract_into(&mut metadata)?,
                        Err(MobiError::Format(message)) if !options.strict_exth => {
                            warnings.push(message);
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            None if !pdb.header.name.is_empty() => {
                metadata.insert("title", pdb.header.name.as_str());
            }
            None => {}
        }

        for warning in &warnings {
            warn!("{warning}");
        }

        Ok(Document {
            metadata,
            header,
            text_records,
            text,
            warnings,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn header(&self) -> &HeaderInfo {
        &self.header
    }

    /// Text records exactly as stored, trailing entries included.
    pub fn text_records(&self) -> &[Vec<u8>] {
        &self.text_records
    }

    /// The decompressed text, if the compression scheme is supported.
    pub fn text(&self) -> Option<&[u8]> {
        self.text.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.first("title")
    }

    pub fn authors(&self) -> &[String] {
        self.metadata.get("author").unwrap_or_default()
    }

    /// Conditions that did not stop the parse, such as a missing EXTH block.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn decode_record(index: usize, record: &[u8], header: &HeaderInfo) -> Result<Vec<u8>> {
    let payload = header.trailing_flags.trim(record)?;
    trace!(
        "text record {}: {} bytes, {} after trimming",
        index + 1,
        record.len(),
        payload.len()
    );
    match header.compression {
        Compression::PalmDoc => palmdoc_decompress(payload),
        _ => Ok(payload.to_vec()),
    }
}

#[cfg(not(feature = "parallel"))]
fn decode_text(records: &[Vec<u8>], header: &HeaderInfo) -> Result<Vec<u8>> {
    let mut text = Vec::new();
    for (index, record) in records.iter().enumerate() {
        text.extend_from_slice(&decode_record(index, record, header)?);
    }
    Ok(text)
}

#[cfg(feature = "parallel")]
fn decode_text(records: &[Vec<u8>], header: &HeaderInfo) -> Result<Vec<u8>> {
    use rayon::prelude::*;

    let decoded = records
        .par_iter()
        .enumerate()
        .map(|(index, record)| decode_record(index, record, header))
        .collect::<Result<Vec<_>>>()?;
    Ok(decoded.concat())
}
