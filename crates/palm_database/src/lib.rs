//! Reader for the PalmDB container: the fixed 78-byte database header, the
//! record table that follows it, and slicing of individual records out of
//! the in-memory source.

pub mod timestamp;

use std::io::Cursor;
use std::ops::Range;

use byyte::ByteReader;
use byyte::be::out_of_range;
use log::debug;
use thiserror::Error;

use crate::timestamp::from_palm_timestamp;

/// Offset of the 16-bit record count within the database header.
pub const RECORD_COUNT_OFFSET: usize = 0x4C;
/// Offset of the first record table entry.
pub const RECORD_TABLE_OFFSET: usize = 0x4E;
/// Size of one record table entry.
pub const RECORD_ENTRY_SIZE: usize = 8;

#[derive(Debug, Error)]
pub enum PDBError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record {index} is out of range ({count} records)")]
    RecordOutOfRange { index: usize, count: usize },
    #[error("record {index} starts at {start:#x}, before the previous record at {previous:#x}")]
    NonMonotonicOffsets {
        index: usize,
        start: u32,
        previous: u32,
    },
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, PDBError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDBHeader {
    pub name: String,
    pub attributes: u16,
    pub version: u16,
    pub creation_time: Option<chrono::NaiveDateTime>,
    pub modification_time: Option<chrono::NaiveDateTime>,
    pub last_backup_date: Option<chrono::NaiveDateTime>,
    pub modification_number: u32,
    pub app_info_id: u32,
    pub sort_info_id: u32,
    pub type_: String,
    pub creator: String,
    pub unique_id_seed: u32,
    pub next_record_list_id: u32,
    pub number_of_records: u16,
}

impl PDBHeader {
    pub fn new<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let name = reader.read_string(32)?;

        let attributes = reader.read_u16()?;
        let version = reader.read_u16()?;
        let creation_time = from_palm_timestamp(reader.read_u32()?);
        let modification_time = from_palm_timestamp(reader.read_u32()?);
        let last_backup_date = from_palm_timestamp(reader.read_u32()?);
        let modification_number = reader.read_u32()?;
        let app_info_id = reader.read_u32()?;
        let sort_info_id = reader.read_u32()?;
        let type_ = reader.read_string(4)?;
        let creator = reader.read_string(4)?;
        let unique_id_seed = reader.read_u32()?;
        let next_record_list_id = reader.read_u32()?;
        let number_of_records = reader.read_u16()?;

        Ok(PDBHeader {
            name,
            attributes,
            version,
            creation_time,
            modification_time,
            last_backup_date,
            modification_number,
            app_info_id,
            sort_info_id,
            type_,
            creator,
            unique_id_seed,
            next_record_list_id,
            number_of_records,
        })
    }

    /// Type and creator codes of a plain PalmDoc e-text.
    pub fn is_palmdoc(&self) -> bool {
        self.type_ == "TEXt" && self.creator == "REAd"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDBRecord {
    pub data_offset: u32,
    pub attributes: u8,
    pub unique_id: [u8; 3],
}

impl PDBRecord {
    pub fn new<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let data_offset = reader.read_u32()?;
        let attributes = reader.read_u8()?;
        let unique_id = reader.read_bytes::<3>()?;

        Ok(PDBRecord {
            data_offset,
            attributes,
            unique_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDB {
    pub header: PDBHeader,
    pub records: Vec<PDBRecord>,
}

impl PDB {
    /// Parses the database header and record table from the start of `source`.
    pub fn parse(source: &[u8]) -> Result<Self> {
        if source.len() < RECORD_TABLE_OFFSET {
            return Err(out_of_range(0, RECORD_TABLE_OFFSET, source.len()).into());
        }
        let mut reader = Cursor::new(source);
        let header = PDBHeader::new(&mut reader)?;

        let table_len = RECORD_ENTRY_SIZE * header.number_of_records as usize;
        if source.len() < RECORD_TABLE_OFFSET + table_len {
            return Err(out_of_range(RECORD_TABLE_OFFSET, table_len, source.len()).into());
        }
        let mut records = Vec::with_capacity(header.number_of_records as usize);

        for _ in 0..header.number_of_records {
            records.push(PDBRecord::new(&mut reader)?);
        }

        debug!(
            "PalmDB {:?}: type {:?}, creator {:?}, {} records",
            header.name,
            header.type_,
            header.creator,
            records.len()
        );

        Ok(PDB { header, records })
    }

    /// Byte range of record `index` within the source. A record ends where
    /// the next one starts; the last record runs to the end of the source.
    pub fn record_range(&self, source_len: usize, index: usize) -> Result<Range<usize>> {
        let record = self.records.get(index).ok_or(PDBError::RecordOutOfRange {
            index,
            count: self.records.len(),
        })?;
        let start = record.data_offset;

        if let Some(previous) = index.checked_sub(1).and_then(|i| self.records.get(i)) {
            if previous.data_offset > start {
                return Err(PDBError::NonMonotonicOffsets {
                    index,
                    start,
                    previous: previous.data_offset,
                });
            }
        }

        let end = match self.records.get(index + 1) {
            Some(next) if next.data_offset < start => {
                return Err(PDBError::NonMonotonicOffsets {
                    index: index + 1,
                    start: next.data_offset,
                    previous: start,
                });
            }
            Some(next) => next.data_offset as usize,
            None => source_len.max(start as usize),
        };

        let start = start as usize;
        if end > source_len {
            return Err(out_of_range(start, end - start, source_len).into());
        }

        Ok(start..end)
    }

    pub fn record<'a>(&self, source: &'a [u8], index: usize) -> Result<&'a [u8]> {
        let range = self.record_range(source.len(), index)?;
        Ok(&source[range])
    }

    /// Slices every record in `indices`, in order.
    pub fn records<'a>(&self, source: &'a [u8], indices: Range<usize>) -> Result<Vec<&'a [u8]>> {
        indices.map(|index| self.record(source, index)).collect()
    }
}
