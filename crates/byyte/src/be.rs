use std::io;
use std::io::Result;

/// Error returned whenever a requested range is not fully available.
pub fn out_of_range(offset: usize, length: usize, available: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("cannot read {length} bytes at offset {offset:#x}: source has {available} bytes"),
    )
}

pub trait ByteReader: io::Read {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }
    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads a fixed-width, NUL-padded string. Invalid UTF-8 is replaced
    /// rather than rejected.
    fn read_string(&mut self, length: usize) -> Result<String> {
        let mut buf = vec![0u8; length];
        self.read_exact(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf)
            .trim_end_matches('\0')
            .to_string())
    }
}

impl<R: io::Read + ?Sized> ByteReader for R {}

/// Random-access reads at absolute offsets. Every read either returns the
/// full requested range or an [`io::ErrorKind::UnexpectedEof`] error naming
/// the offset and length; nothing is truncated.
pub trait ReadAt {
    fn read_bytes_at(&self, offset: usize, length: usize) -> Result<&[u8]>;

    fn read_u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.read_bytes_at(offset, 1)?[0])
    }
    fn read_u16_at(&self, offset: usize) -> Result<u16> {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(self.read_bytes_at(offset, 2)?);
        Ok(u16::from_be_bytes(buf))
    }
    fn read_u32_at(&self, offset: usize) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.read_bytes_at(offset, 4)?);
        Ok(u32::from_be_bytes(buf))
    }

    /// Raw bytes decoded as a string, without trimming. Invalid UTF-8 is
    /// replaced rather than rejected.
    fn read_string_at(&self, offset: usize, length: usize) -> Result<String> {
        Ok(String::from_utf8_lossy(self.read_bytes_at(offset, length)?).into_owned())
    }
}

impl ReadAt for [u8] {
    fn read_bytes_at(&self, offset: usize, length: usize) -> Result<&[u8]> {
        offset
            .checked_add(length)
            .and_then(|end| self.get(offset..end))
            .ok_or_else(|| out_of_range(offset, length, self.len()))
    }
}

impl ReadAt for Vec<u8> {
    fn read_bytes_at(&self, offset: usize, length: usize) -> Result<&[u8]> {
        self.as_slice().read_bytes_at(offset, length)
    }
}
