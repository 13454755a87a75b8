use byyte::ReadAt;

use crate::error::{MobiError, Result};
use crate::metadata::Metadata;

/// Size of the `(type, length)` prefix of every EXTH record.
const RECORD_PREFIX_LEN: u32 = 8;

/// Metadata key for an EXTH record type, if the type is one we keep.
pub fn metadata_key(type_code: u32) -> Option<&'static str> {
    match type_code {
        100 => Some("author"),
        101 => Some("publisher"),
        103 => Some("description"),
        104 => Some("isbn"),
        105 => Some("subject"),
        106 => Some("pubdate"),
        113 | 504 => Some("asin"),
        503 => Some("title"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExthRecord<'a> {
    pub type_code: u32,
    /// Includes the 8-byte prefix.
    pub byte_length: u32,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone)]
pub struct EXTHHeader<'a> {
    pub header_length: u32,
    pub record_count: u32,
    source: &'a [u8],
    offset: usize,
}

impl<'a> EXTHHeader<'a> {
    /// Reads the EXTH block header at `offset`. A block that does not start
    /// with `EXTH` is a [`MobiError::Format`].
    pub fn parse(source: &'a [u8], offset: usize) -> Result<Self> {
        let identifier = source.read_bytes_at(offset, 4)?;
        if identifier != b"EXTH" {
            return Err(MobiError::Format(format!(
                "expected EXTH signature at offset {offset:#x}, found {identifier:02x?}"
            )));
        }

        let header_length = source.read_u32_at(offset.saturating_add(4))?;
        let record_count = source.read_u32_at(offset.saturating_add(8))?;

        Ok(EXTHHeader {
            header_length,
            record_count,
            source,
            offset,
        })
    }

    pub fn records(&self) -> ExthRecords<'a> {
        ExthRecords {
            source: self.source,
            position: self.offset.saturating_add(12),
            remaining: self.record_count,
        }
    }

    /// Adds the value of every recognized record to `metadata`.
    pub fn extract_into(&self, metadata: &mut Metadata) -> Result<()> {
        for record in self.records() {
            let record = record?;
            match metadata_key(record.type_code) {
                Some(key) => {
                    let value = String::from_utf8_lossy(record.payload);
                    if !metadata.insert(key, value) {
                        log::trace!("skipping repeated {key} value");
                    }
                }
                None => log::trace!("ignoring EXTH record type {}", record.type_code),
            }
        }
        Ok(())
    }
}

/// Walks the EXTH records in order. Stops after the first error.
#[derive(Debug, Clone)]
pub struct ExthRecords<'a> {
    source: &'a [u8],
    position: usize,
    remaining: u32,
}

impl<'a> ExthRecords<'a> {
    fn read_next(&mut self) -> Result<ExthRecord<'a>> {
        let type_code = self.source.read_u32_at(self.position)?;
        let byte_length = self.source.read_u32_at(self.position.saturating_add(4))?;
        if byte_length < RECORD_PREFIX_LEN {
            return Err(MobiError::Format(format!(
                "EXTH record at offset {:#x} has length {byte_length}, shorter than its prefix",
                self.position
            )));
        }

        let payload = self.source.read_bytes_at(
            self.position.saturating_add(RECORD_PREFIX_LEN as usize),
            (byte_length - RECORD_PREFIX_LEN) as usize,
        )?;
        self.position = self.position.saturating_add(byte_length as usize);

        Ok(ExthRecord {
            type_code,
            byte_length,
            payload,
        })
    }
}

impl<'a> Iterator for ExthRecords<'a> {
    type Item = Result<ExthRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let record = self.read_next();
        if record.is_err() {
            self.remaining = 0;
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exth(records: &[(u32, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (type_code, payload) in records {
            let payload = payload.as_bytes();
            body.extend_from_slice(&type_code.to_be_bytes());
            body.extend_from_slice(&(payload.len() as u32 + 8).to_be_bytes());
            body.extend_from_slice(payload);
        }

        let mut data = b"EXTH".to_vec();
        data.extend_from_slice(&(body.len() as u32 + 12).to_be_bytes());
        data.extend_from_slice(&(records.len() as u32).to_be_bytes());
        data.extend_from_slice(&body);
        data
    }

    fn extract(data: &[u8]) -> Result<Metadata> {
        let mut metadata = Metadata::new();
        EXTHHeader::parse(data, 0)?.extract_into(&mut metadata)?;
        Ok(metadata)
    }

    #[test]
    fn maps_known_types() {
        let data = exth(&[
            (100, "Jane Doe"),
            (101, "Acme"),
            (104, "9780000000000"),
            (503, "Long Title"),
            (113, "B000TEST"),
            (504, "B000OTHER"),
        ]);
        let metadata = extract(&data).unwrap();

        assert_eq!(metadata.get("author").unwrap(), ["Jane Doe"]);
        assert_eq!(metadata.get("publisher").unwrap(), ["Acme"]);
        assert_eq!(metadata.get("isbn").unwrap(), ["9780000000000"]);
        assert_eq!(metadata.get("title").unwrap(), ["Long Title"]);
        assert_eq!(metadata.get("asin").unwrap(), ["B000TEST", "B000OTHER"]);
    }

    #[test]
    fn repeated_values_are_kept_once() {
        let data = exth(&[(100, "Jane Doe"), (100, "Jane Doe"), (100, "John Roe")]);
        let metadata = extract(&data).unwrap();
        assert_eq!(metadata.get("author").unwrap(), ["Jane Doe", "John Roe"]);
    }

    #[test]
    fn unknown_types_are_skipped() {
        let data = exth(&[(999, "whatever"), (105, "Fiction")]);
        let metadata = extract(&data).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("subject").unwrap(), ["Fiction"]);
    }

    #[test]
    fn iterates_raw_records() {
        let data = exth(&[(201, "\0\0\0\x01"), (100, "A")]);
        let header = EXTHHeader::parse(&data, 0).unwrap();
        assert_eq!(header.record_count, 2);

        let records: Vec<_> = header.records().collect::<Result<_>>().unwrap();
        assert_eq!(records[0].type_code, 201);
        assert_eq!(records[0].byte_length, 12);
        assert_eq!(records[1].payload, b"A");
    }

    #[test]
    fn missing_signature_is_format_error() {
        let mut data = exth(&[(100, "Jane Doe")]);
        data[..4].copy_from_slice(b"EXTX");
        assert!(matches!(
            EXTHHeader::parse(&data, 0),
            Err(MobiError::Format(_))
        ));
    }

    #[test]
    fn short_record_length_is_format_error() {
        let mut data = exth(&[(100, "")]);
        data[16..20].copy_from_slice(&4u32.to_be_bytes());
        assert!(matches!(extract(&data), Err(MobiError::Format(_))));
    }

    #[test]
    fn truncated_payload_is_io_error() {
        let mut data = exth(&[(100, "Jane Doe")]);
        data.truncate(data.len() - 3);
        assert!(matches!(extract(&data), Err(MobiError::Io(_))));
    }
}
