//! Builds small PalmDB/MOBI images for the integration tests.

pub struct Book {
    pub name: String,
    pub type_creator: [&'static [u8; 4]; 2],
    pub compression: u16,
    pub drm: u16,
    pub header_length: u32,
    pub version: u32,
    pub trailing_flags: u16,
    pub title: String,
    pub exth_flags: u32,
    pub exth_signature: [u8; 4],
    pub exth: Vec<(u32, String)>,
    pub text_records: Vec<Vec<u8>>,
}

impl Default for Book {
    fn default() -> Self {
        Book {
            name: "Sample_Book".to_string(),
            type_creator: [b"BOOK", b"MOBI"],
            compression: 2,
            drm: 0,
            header_length: 0xE8,
            version: 6,
            trailing_flags: 0,
            title: "A Sample Book".to_string(),
            exth_flags: 0x40,
            exth_signature: *b"EXTH",
            exth: Vec::new(),
            text_records: Vec::new(),
        }
    }
}

fn put_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

impl Book {
    /// A plain PalmDoc e-text: 16-byte record 0, no MOBI header.
    pub fn palmdoc() -> Self {
        Book {
            type_creator: [b"TEXt", b"REAd"],
            ..Book::default()
        }
    }

    fn is_palmdoc(&self) -> bool {
        self.type_creator == [b"TEXt", b"REAd"]
    }

    fn record0(&self) -> Vec<u8> {
        let mut data = vec![0u8; 0x10];
        put_u16(&mut data, 0x00, self.compression);
        put_u32(&mut data, 0x04, self.text_records.len() as u32 * 4096);
        put_u16(&mut data, 0x08, self.text_records.len() as u16);
        put_u16(&mut data, 0x0A, 4096);
        put_u16(&mut data, 0x0C, self.drm);
        if self.is_palmdoc() {
            return data;
        }

        data.resize(0x10 + self.header_length as usize, 0);
        data[0x10..0x14].copy_from_slice(b"MOBI");
        put_u32(&mut data, 0x14, self.header_length);
        put_u32(&mut data, 0x18, 2);
        put_u32(&mut data, 0x1C, 65001);
        put_u32(&mut data, 0x24, self.version);
        put_u32(&mut data, 0x80, self.exth_flags);
        put_u16(&mut data, 0xF2, self.trailing_flags);

        data.extend_from_slice(&self.exth_block());

        let title_offset = data.len();
        data.extend_from_slice(self.title.as_bytes());
        data.extend_from_slice(&[0, 0]);
        put_u32(&mut data, 0x54, title_offset as u32);
        put_u32(&mut data, 0x58, self.title.len() as u32);
        data
    }

    fn exth_block(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (type_code, value) in &self.exth {
            body.extend_from_slice(&type_code.to_be_bytes());
            body.extend_from_slice(&(value.len() as u32 + 8).to_be_bytes());
            body.extend_from_slice(value.as_bytes());
        }

        let mut block = self.exth_signature.to_vec();
        block.extend_from_slice(&(body.len() as u32 + 12).to_be_bytes());
        block.extend_from_slice(&(self.exth.len() as u32).to_be_bytes());
        block.extend_from_slice(&body);
        block
    }

    pub fn build(&self) -> Vec<u8> {
        let mut records = vec![self.record0()];
        records.extend(self.text_records.iter().cloned());

        let mut data = vec![0u8; 0x4E];
        let name = self.name.as_bytes();
        data[..name.len()].copy_from_slice(name);
        put_u32(&mut data, 0x24, 0x8000_0000 | 3_061_152_000);
        data[0x3C..0x40].copy_from_slice(self.type_creator[0]);
        data[0x40..0x44].copy_from_slice(self.type_creator[1]);
        put_u16(&mut data, 0x4C, records.len() as u16);

        // two bytes of padding after the record table, as real files have
        let mut offset = 0x4E + 8 * records.len() + 2;
        for (i, record) in records.iter().enumerate() {
            data.extend_from_slice(&(offset as u32).to_be_bytes());
            data.extend_from_slice(&[0, 0, 0, i as u8]);
            offset += record.len();
        }
        data.extend_from_slice(&[0, 0]);

        for record in &records {
            data.extend_from_slice(record);
        }
        data
    }
}
