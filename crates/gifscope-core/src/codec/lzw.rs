use tracing::trace;

use super::bit_reader::{BitReader, MAX_CODE_SIZE};
use super::error::LzwError;

/// Dictionary capacity of a 12-bit code space.
pub const MAX_CODES: usize = 1 << MAX_CODE_SIZE;

/// Color indexes of one frame after LZW expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzwOutput {
    /// Exactly `pixel_count` indexes, zero-padded past `decoded`.
    pub indexes: Vec<u8>,
    /// Number of indexes produced by the stream itself.
    pub decoded: usize,
    /// Why decoding stopped early, if it did not end cleanly.
    pub error: Option<LzwError>,
}

/// Expand one frame's LZW payload into exactly `pixel_count` color indexes.
///
/// Streams that end early (an end code before the last pixel, a short
/// payload or a corrupt code) are padded with index 0 so a partial frame is
/// still usable; the cause is returned in [`LzwOutput::error`].
pub fn decode(min_code_size: u8, data: &[u8], pixel_count: usize) -> LzwOutput {
    let mut indexes = Vec::with_capacity(pixel_count);
    let mut decoder = LzwDecoder::new(data, min_code_size);
    let error = decoder.decode_into(&mut indexes, pixel_count).err();
    indexes.truncate(pixel_count);
    let decoded = indexes.len();
    if decoded < pixel_count {
        trace!(decoded, pixel_count, "padding short LZW stream");
        indexes.resize(pixel_count, 0);
    }
    LzwOutput {
        indexes,
        decoded,
        error,
    }
}

/// Dictionary state for one frame.
///
/// `prefix`/`suffix` are dense arrays over the 12-bit code space; the first
/// `clear_code` entries are the literal palette indexes.
pub struct LzwDecoder<'a> {
    reader: BitReader<'a>,
    clear_code: u16,
    end_code: u16,
    next_key: u16,
    prev_code: Option<u16>,
    /// First index of the most recently emitted sequence.
    last_index: u8,
    prefix: [u16; MAX_CODES],
    suffix: [u8; MAX_CODES],
    stack: Vec<u8>,
}

impl<'a> LzwDecoder<'a> {
    /// `min_code_size` must be within `1..=8`; the parser rejects anything else.
    pub fn new(data: &'a [u8], min_code_size: u8) -> Self {
        let clear_code = 1u16 << min_code_size;
        let mut suffix = [0u8; MAX_CODES];
        for (index, entry) in suffix.iter_mut().enumerate().take(clear_code as usize) {
            *entry = index as u8;
        }
        Self {
            reader: BitReader::new(data, min_code_size),
            clear_code,
            end_code: clear_code + 1,
            next_key: clear_code + 2,
            prev_code: None,
            last_index: 0,
            prefix: [0u16; MAX_CODES],
            suffix,
            stack: Vec::with_capacity(MAX_CODES),
        }
    }

    pub fn code_size(&self) -> u8 {
        self.reader.code_size()
    }

    /// Append decoded indexes to `out` until it holds at least `pixel_count`
    /// entries or the end code is read. The last sequence may overshoot.
    pub fn decode_into(&mut self, out: &mut Vec<u8>, pixel_count: usize) -> Result<(), LzwError> {
        while out.len() < pixel_count {
            let code = self.reader.read()?;
            if code > self.next_key {
                return Err(self.corrupt(code));
            }
            if code == self.end_code {
                return Ok(());
            }
            if code == self.clear_code {
                self.clear();
                continue;
            }

            let Some(prev_code) = self.prev_code else {
                if code > self.clear_code {
                    return Err(self.corrupt(code));
                }
                let index = code as u8;
                out.push(index);
                self.prev_code = Some(code);
                self.last_index = index;
                continue;
            };

            self.resolve(code, prev_code);

            if (self.next_key as usize) < MAX_CODES {
                self.prefix[self.next_key as usize] = prev_code;
                self.suffix[self.next_key as usize] = self.last_index;
                self.next_key += 1;
                if self.next_key > self.reader.max_value_for_current_width()
                    && self.reader.code_size() < MAX_CODE_SIZE
                {
                    self.reader.increase_code_size();
                }
            }

            out.extend(self.stack.iter().rev());
            self.prev_code = Some(code);
        }
        Ok(())
    }

    /// Collect the sequence for `code` into `stack`, last index first.
    fn resolve(&mut self, code: u16, prev_code: u16) {
        self.stack.clear();
        let mut current = code;
        if code == self.next_key {
            self.stack.push(self.last_index);
            current = prev_code;
        }
        while current > self.clear_code {
            self.stack.push(self.suffix[current as usize]);
            current = self.prefix[current as usize];
        }
        self.last_index = self.suffix[current as usize];
        self.stack.push(self.last_index);
    }

    fn clear(&mut self) {
        self.reader.reset_code_size();
        self.next_key = self.clear_code + 2;
        self.prev_code = None;
    }

    fn corrupt(&self, code: u16) -> LzwError {
        LzwError::CorruptLzwStream {
            code,
            next_key: self.next_key,
        }
    }
}
