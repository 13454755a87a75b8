use byyte::ReadAt;

use crate::trailing::TrailingFlags;

/// Offset of the MOBI identifier within record 0; the header length is
/// counted from here.
const MOBI_HEADER_START: usize = 0x10;

/// Bit in `exth_flags` announcing an EXTH block after the MOBI header.
pub const EXTH_PRESENT: u32 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Cp1252,
    Utf8,
    Other(u32),
}

impl TextEncoding {
    pub fn new(code: u32) -> TextEncoding {
        match code {
            1252 => TextEncoding::Cp1252,
            65001 => TextEncoding::Utf8,
            x => TextEncoding::Other(x),
        }
    }
}

/// Fields of the MOBI header. Offsets are relative to the start of record 0.
///
/// The fields needed to locate the title, the EXTH block and the trailing
/// entries are always read. The rest are only read when `header_length`
/// says the header is long enough to hold them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MOBIHeader {
    pub identifier: String,
    pub header_length: u32,
    pub file_version: u32,
    pub full_name_offset: u32,
    pub full_name_length: u32,
    pub full_name: String,
    pub exth_flags: u32,
    pub extra_record_data_flags: TrailingFlags,

    pub mobi_type: Option<u32>,
    pub text_encoding: Option<TextEncoding>,
    pub unique_id: Option<u32>,
    pub first_non_book_index: Option<u32>,
    pub locale: Option<u32>,
    pub min_version: Option<u32>,
    pub first_image_index: Option<u32>,
    pub huffman_record_offset: Option<u32>,
    pub huffman_record_count: Option<u32>,
}

impl MOBIHeader {
    pub fn parse(source: &[u8], base: usize) -> std::io::Result<Self> {
        let at = |offset: usize| base.saturating_add(offset);

        let identifier = source.read_string_at(at(0x10), 4)?;
        let header_length = source.read_u32_at(at(0x14))?;
        let file_version = source.read_u32_at(at(0x24))?;
        let full_name_offset = source.read_u32_at(at(0x54))?;
        let full_name_length = source.read_u32_at(at(0x58))?;
        let exth_flags = source.read_u32_at(at(0x80))?;

        let full_name = source.read_string_at(
            at(full_name_offset as usize),
            full_name_length as usize,
        )?;

        let extra_record_data_flags = if header_length > 0xE3 && file_version > 4 {
            TrailingFlags::new(source.read_u16_at(at(0xF2))?)
        } else {
            TrailingFlags::default()
        };

        let header_end = MOBI_HEADER_START + header_length as usize;
        let optional = |offset: usize| -> std::io::Result<Option<u32>> {
            if offset + 4 <= header_end {
                source.read_u32_at(at(offset)).map(Some)
            } else {
                Ok(None)
            }
        };

        Ok(MOBIHeader {
            identifier,
            header_length,
            file_version,
            full_name_offset,
            full_name_length,
            full_name,
            exth_flags,
            extra_record_data_flags,
            mobi_type: optional(0x18)?,
            text_encoding: optional(0x1C)?.map(TextEncoding::new),
            unique_id: optional(0x20)?,
            first_non_book_index: optional(0x50)?,
            locale: optional(0x5C)?,
            min_version: optional(0x68)?,
            first_image_index: optional(0x6C)?,
            huffman_record_offset: optional(0x70)?,
            huffman_record_count: optional(0x74)?,
        })
    }

    pub fn has_exth(&self) -> bool {
        self.exth_flags & EXTH_PRESENT != 0
    }

    /// Absolute offset of the EXTH block, directly after the MOBI header.
    pub fn exth_offset(&self, base: usize) -> usize {
        base.saturating_add(MOBI_HEADER_START)
            .saturating_add(self.header_length as usize)
    }
}
