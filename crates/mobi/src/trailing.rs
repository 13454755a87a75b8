use crate::error::{MobiError, Result};

/// The MOBI extra-record-data flags. Each set bit above bit 0 announces one
/// variable-size entry appended to every text record; bit 0 announces the
/// multibyte-character overlap bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrailingFlags(u16);

impl TrailingFlags {
    pub const MULTIBYTE: u16 = 0x0001;

    pub fn new(bits: u16) -> Self {
        TrailingFlags(bits)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn multibyte(&self) -> bool {
        self.0 & Self::MULTIBYTE != 0
    }

    /// Number of variable-size entries, not counting the multibyte bytes.
    pub fn entries(&self) -> u32 {
        (self.0 & !Self::MULTIBYTE).count_ones()
    }

    /// Strips the trailing entries from a raw text record, leaving only the
    /// compressed payload.
    ///
    /// Entries are appended in bit order, so they are removed from the
    /// highest bit down, with the multibyte bytes going last.
    pub fn trim<'a>(&self, record: &'a [u8]) -> Result<&'a [u8]> {
        let mut end = record.len();

        for bit in (1..u16::BITS).rev() {
            if self.0 & (1 << bit) == 0 {
                continue;
            }
            let size = trailing_entry_size(&record[..end]);
            end = end.checked_sub(size).ok_or_else(|| {
                MobiError::Decompression(format!(
                    "trailing entry for flag bit {bit} is {size} bytes but only {end} remain"
                ))
            })?;
        }

        if self.multibyte() {
            if let Some(&last) = record[..end].last() {
                let size = (last & 0x03) as usize + 1;
                end = end.checked_sub(size).ok_or_else(|| {
                    MobiError::Decompression(format!(
                        "multibyte overlap is {size} bytes but only {end} remain"
                    ))
                })?;
            }
        }

        Ok(&record[..end])
    }
}

/// Decodes the size stored at the end of `data`.
///
/// The size is a base-128 number written so it can be read backwards: the
/// last byte holds the low 7 bits and the first byte of the number carries
/// the 0x80 marker. At most four bytes are consulted. Scanning the final four
/// bytes forwards and restarting the accumulator at every marked byte gives
/// the same result. The size covers the size bytes themselves.
pub fn trailing_entry_size(data: &[u8]) -> usize {
    let mut size = 0usize;
    for (shift, &byte) in data.iter().rev().take(4).enumerate() {
        size |= ((byte & 0x7F) as usize) << (7 * shift);
        if byte & 0x80 != 0 {
            break;
        }
    }
    size
}
