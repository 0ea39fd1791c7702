use super::error::ContainerError;
use super::layout;
use crate::document::{ColorTable, Pixel, color_table_len};

/// Forward-only cursor over a GIF byte buffer.
///
/// The parser threads one `GifReader` through every grammar rule by `&mut`;
/// `peek*` methods inspect upcoming bytes without consuming them so rules can
/// try a match before committing.
pub struct GifReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> GifReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ContainerError> {
        if self.remaining() < needed {
            return Err(ContainerError::EndOfData {
                offset: self.offset,
                needed,
                actual: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn peek(&self, ahead: usize) -> Option<u8> {
        self.data.get(self.offset + ahead).copied()
    }

    /// True when the upcoming bytes equal `prefix`.
    pub fn peek_matches(&self, prefix: &[u8]) -> bool {
        self.data
            .get(self.offset..)
            .is_some_and(|rest| rest.starts_with(prefix))
    }

    pub fn read_u8(&mut self) -> Result<u8, ContainerError> {
        let byte = self.peek(0).ok_or(ContainerError::EndOfData {
            offset: self.offset,
            needed: 1,
            actual: 0,
        })?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, ContainerError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ContainerError> {
        self.require_len(len)?;
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ContainerError> {
        self.read_slice(len).map(|_| ())
    }

    /// Read `2^(size + 1)` consecutive RGB triples.
    pub fn read_color_table(&mut self, size: u8) -> Result<ColorTable, ContainerError> {
        let len = color_table_len(size);
        let bytes = self.read_slice(len * layout::COLOR_TABLE_ENTRY_LEN)?;
        Ok(bytes
            .chunks_exact(layout::COLOR_TABLE_ENTRY_LEN)
            .map(|rgb| Pixel {
                r: rgb[0],
                g: rgb[1],
                b: rgb[2],
            })
            .collect())
    }

    /// Read length-prefixed sub-blocks up to and including the zero-length
    /// terminator.
    pub fn read_sub_blocks(&mut self) -> Result<Vec<&'a [u8]>, ContainerError> {
        let mut blocks = Vec::new();
        loop {
            let len = self.read_u8()?;
            if len == layout::BLOCK_TERMINATOR {
                return Ok(blocks);
            }
            blocks.push(self.read_slice(len as usize)?);
        }
    }

    /// Read a sub-block sequence and concatenate its payloads.
    pub fn read_sub_block_data(&mut self) -> Result<Vec<u8>, ContainerError> {
        Ok(self.read_sub_blocks()?.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::GifReader;
    use crate::container::error::ContainerError;

    #[test]
    fn read_u16_is_little_endian() {
        let bytes = [0x34, 0x12];
        let mut reader = GifReader::new(&bytes);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn color_table_has_two_to_size_plus_one_entries() {
        for size in 0u8..=7 {
            let entries = 1usize << (size + 1);
            let bytes: Vec<u8> = (0..entries * 3).map(|i| i as u8).collect();
            let mut reader = GifReader::new(&bytes);
            let table = reader.read_color_table(size).unwrap();
            assert_eq!(table.len(), entries);
            assert_eq!(table[0].r, 0);
            assert_eq!(table[0].g, 1);
            assert_eq!(table[0].b, 2);
            let last = table[entries - 1];
            assert_eq!(last.b, (entries * 3 - 1) as u8);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn color_table_too_short() {
        let bytes = [0u8; 5];
        let mut reader = GifReader::new(&bytes);
        let err = reader.read_color_table(0).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::EndOfData {
                needed: 6,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn sub_blocks_are_concatenated() {
        let bytes = [2, b'a', b'b', 1, b'c', 0, 0xff];
        let mut reader = GifReader::new(&bytes);
        assert_eq!(reader.read_sub_block_data().unwrap(), b"abc");
        assert_eq!(reader.peek(0), Some(0xff));
    }

    #[test]
    fn sub_blocks_missing_terminator() {
        let bytes = [2, b'a', b'b'];
        let mut reader = GifReader::new(&bytes);
        let err = reader.read_sub_blocks().unwrap_err();
        assert!(matches!(err, ContainerError::EndOfData { offset: 3, .. }));
    }

    #[test]
    fn peek_does_not_consume() {
        let bytes = [0x21, 0xf9, 0x04];
        let reader = GifReader::new(&bytes);
        assert!(reader.peek_matches(&[0x21, 0xf9]));
        assert!(!reader.peek_matches(&[0x21, 0xfe]));
        assert!(!reader.peek_matches(&[0x21, 0xf9, 0x04, 0x00]));
        assert_eq!(reader.offset(), 0);
    }
}
