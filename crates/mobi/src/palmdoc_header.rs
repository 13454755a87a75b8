use byyte::ReadAt;

/// Size of the PalmDoc header at the start of record 0.
pub const PALMDOC_HEADER_LEN: usize = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    PalmDoc,
    /// Recognized but never decoded.
    HuffCdic,
    Unknown(u16),
}

impl Compression {
    pub fn new(code: u16) -> Compression {
        match code {
            1 => Compression::None,
            2 => Compression::PalmDoc,
            17480 => Compression::HuffCdic,
            x => Compression::Unknown(x),
        }
    }

    pub fn value(&self) -> u16 {
        match self {
            Compression::None => 1,
            Compression::PalmDoc => 2,
            Compression::HuffCdic => 17480,
            Compression::Unknown(x) => *x,
        }
    }
}

/// DRM scheme applied to the text records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    Unencrypted,
    /// Old Mobipocket encryption.
    Deprecated,
    Encrypted,
    Unknown(u16),
}

impl Encryption {
    pub fn new(code: u16) -> Encryption {
        match code {
            0 => Encryption::Unencrypted,
            1 => Encryption::Deprecated,
            2 => Encryption::Encrypted,
            x => Encryption::Unknown(x),
        }
    }

    pub fn value(&self) -> u16 {
        match self {
            Encryption::Unencrypted => 0,
            Encryption::Deprecated => 1,
            Encryption::Encrypted => 2,
            Encryption::Unknown(x) => *x,
        }
    }

    /// Known DRM schemes. Unknown codes are only recorded.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Encryption::Deprecated | Encryption::Encrypted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalmDOCHeader {
    pub compression: Compression,
    pub text_length: u32,
    pub record_count: u16,
    pub record_size: u16,
    pub encryption: Encryption,
}

impl PalmDOCHeader {
    /// Reads the header of record 0, which starts at `base` within `source`.
    pub fn parse(source: &[u8], base: usize) -> std::io::Result<Self> {
        let at = |offset: usize| base.saturating_add(offset);

        Ok(PalmDOCHeader {
            compression: Compression::new(source.read_u16_at(at(0x00))?),
            text_length: source.read_u32_at(at(0x04))?,
            record_count: source.read_u16_at(at(0x08))?,
            record_size: source.read_u16_at(at(0x0A))?,
            encryption: Encryption::new(source.read_u16_at(at(0x0C))?),
        })
    }
}
