use super::error::LzwError;

/// Widest code a GIF LZW stream may use.
pub const MAX_CODE_SIZE: u8 = 12;

/// Reads variable-width codes packed least-significant-bit first.
///
/// Codes straddle byte boundaries without padding: the first code of a 5-bit
/// stream is the low five bits of byte 0, the second starts at bit 5 of byte 0
/// and continues into the low two bits of byte 1.
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    min_code_size: u8,
    code_size: u8,
    cache: u32,
    cached_bits: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8], min_code_size: u8) -> Self {
        Self {
            data,
            position: 0,
            min_code_size,
            code_size: min_code_size + 1,
            cache: 0,
            cached_bits: 0,
        }
    }

    /// Restore the initial width after a clear code.
    pub fn reset_code_size(&mut self) {
        self.code_size = self.min_code_size + 1;
    }

    pub fn increase_code_size(&mut self) {
        self.code_size += 1;
    }

    pub fn code_size(&self) -> u8 {
        self.code_size
    }

    /// Largest code representable at the current width.
    pub fn max_value_for_current_width(&self) -> u16 {
        ((1u32 << self.code_size) - 1) as u16
    }

    pub fn read(&mut self) -> Result<u16, LzwError> {
        while self.cached_bits < self.code_size {
            let byte = *self.data.get(self.position).ok_or(LzwError::EndOfData {
                consumed: self.position,
                code_size: self.code_size,
            })?;
            self.cache |= (byte as u32) << self.cached_bits;
            self.cached_bits += 8;
            self.position += 1;
        }
        let code = (self.cache & self.max_value_for_current_width() as u32) as u16;
        self.cache >>= self.code_size;
        self.cached_bits -= self.code_size;
        Ok(code)
    }
}
