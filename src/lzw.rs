use std::io::{self, Read};

use log::warn;

use crate::bitreader::BitReader;
use crate::error::{DecodingError, Result};

const MAX_CODES: usize = 4096;
const MAX_CODE_SIZE: u8 = 12;

/// Turns one frame's compressed data into its palette index stream.
pub trait IndexDecoder {
    /// `data` yields the concatenated data sub-blocks of a single image.
    /// The result holds exactly `width * height` indices in row-major
    /// source order.
    fn decode_indices(
        &mut self,
        data: &mut dyn Read,
        min_code_size: u8,
        width: u16,
        height: u16,
    ) -> Result<Vec<u8>>;
}

/// The default [`IndexDecoder`], a variable-width LZW decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct LzwIndexDecoder;

impl IndexDecoder for LzwIndexDecoder {
    fn decode_indices(
        &mut self,
        data: &mut dyn Read,
        min_code_size: u8,
        width: u16,
        height: u16,
    ) -> Result<Vec<u8>> {
        if !(1..=8).contains(&min_code_size) {
            return Err(DecodingError::format(format!(
                "invalid LZW minimum code size {}",
                min_code_size
            )));
        }

        let mut indices = vec![0u8; width as usize * height as usize];
        let mut bits = BitReader::new(data);
        let mut table = CodeTable::new(min_code_size);
        let mut prev: Option<u16> = None;
        let mut filled = 0;

        while filled < indices.len() {
            let code = match bits.read_bits(table.code_size) {
                Ok(code) => code,
                // Missing end code.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };

            if code == table.clear_code() {
                table.reset();
                prev = None;
                continue;
            }
            if code == table.end_code() {
                break;
            }

            match prev {
                None if code < table.clear_code() => {}
                None => {
                    return Err(DecodingError::format(format!(
                        "LZW stream starts with code {}",
                        code
                    )));
                }
                Some(p) if code < table.next => {
                    let first = table.first[code as usize];
                    table.push(p, first);
                }
                Some(p) if code == table.next => {
                    let first = table.first[p as usize];
                    table.push(p, first);
                }
                Some(_) => {
                    return Err(DecodingError::format(format!("invalid LZW code {}", code)));
                }
            }

            filled += table.expand(code, &mut indices[filled..]);
            prev = Some(code);
        }

        if filled < indices.len() {
            warn!(
                "image data ended after {} of {} pixels, padding with index 0",
                filled,
                indices.len()
            );
        }

        Ok(indices)
    }
}

/// Dictionary of every code seen so far. Each entry is stored as its
/// prefix code plus one trailing index, with the string length and first
/// index cached so a code can be written straight into the output.
struct CodeTable {
    min_code_size: u8,
    code_size: u8,
    next: u16,
    prefix: [u16; MAX_CODES],
    suffix: [u8; MAX_CODES],
    first: [u8; MAX_CODES],
    length: [u16; MAX_CODES],
}

impl CodeTable {
    fn new(min_code_size: u8) -> Self {
        let mut table = Self {
            min_code_size,
            code_size: 0,
            next: 0,
            prefix: [0; MAX_CODES],
            suffix: [0; MAX_CODES],
            first: [0; MAX_CODES],
            length: [0; MAX_CODES],
        };
        for root in 0..table.clear_code() {
            table.suffix[root as usize] = root as u8;
            table.first[root as usize] = root as u8;
            table.length[root as usize] = 1;
        }
        table.reset();
        table
    }

    fn clear_code(&self) -> u16 {
        1 << self.min_code_size
    }

    fn end_code(&self) -> u16 {
        self.clear_code() + 1
    }

    fn reset(&mut self) {
        self.code_size = self.min_code_size + 1;
        self.next = self.end_code() + 1;
    }

    fn push(&mut self, prefix: u16, suffix: u8) {
        let slot = self.next as usize;
        if slot >= MAX_CODES {
            return;
        }
        self.prefix[slot] = prefix;
        self.suffix[slot] = suffix;
        self.first[slot] = self.first[prefix as usize];
        self.length[slot] = self.length[prefix as usize] + 1;
        self.next += 1;

        if self.next >= 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
            self.code_size += 1;
        }
    }

    /// Writes the string for `code` into `out`, truncated to its length.
    /// Returns the number of indices written.
    fn expand(&self, code: u16, out: &mut [u8]) -> usize {
        let len = self.length[code as usize] as usize;
        let mut code = code;
        for pos in (0..len).rev() {
            if let Some(slot) = out.get_mut(pos) {
                *slot = self.suffix[code as usize];
            }
            code = self.prefix[code as usize];
        }
        len.min(out.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x2 image, minimum code size 2: clear, 1, 0, 0, 1, end.
    const TWO_BY_TWO: [u8; 3] = [0x0C, 0x10, 0x05];

    #[test]
    fn decodes_small_stream() {
        let mut data = &TWO_BY_TWO[..];
        let indices = LzwIndexDecoder
            .decode_indices(&mut data, 2, 2, 2)
            .unwrap();
        assert_eq!(indices, vec![1, 0, 0, 1]);
    }

    #[test]
    fn data_after_end_code_is_ignored() {
        let mut data = TWO_BY_TWO.to_vec();
        data.extend_from_slice(&[0xFF, 0xFF]);
        let mut slice = &data[..];
        let indices = LzwIndexDecoder
            .decode_indices(&mut slice, 2, 3, 2)
            .unwrap();
        assert_eq!(indices, vec![1, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn long_strings_are_truncated_to_the_image() {
        // clear(4), 1, 6 ("1,1"), end(5); the image only has room for two.
        let bits: u16 = 0b101_110_001_100;
        let data = bits.to_le_bytes();
        let mut slice = &data[..];
        let indices = LzwIndexDecoder
            .decode_indices(&mut slice, 2, 2, 1)
            .unwrap();
        assert_eq!(indices, vec![1, 1]);
    }

    #[test]
    fn short_stream_is_padded() {
        let mut data = &TWO_BY_TWO[..];
        let indices = LzwIndexDecoder
            .decode_indices(&mut data, 2, 3, 2)
            .unwrap();
        assert_eq!(indices, vec![1, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn kwkwk_code() {
        // clear(4), 1, 6 (not yet defined: "1,1"), end(5) at 3 bits each.
        // Codes are packed LSB first.
        let bits: u16 = 0b101_110_001_100;
        let data = bits.to_le_bytes();
        let mut slice = &data[..];
        let indices = LzwIndexDecoder
            .decode_indices(&mut slice, 2, 3, 1)
            .unwrap();
        assert_eq!(indices, vec![1, 1, 1]);
    }

    #[test]
    fn undefined_code_is_format_error() {
        // clear(4), 7 at 3 bits.
        let bits: u16 = 0b111_100;
        let data = bits.to_le_bytes();
        let mut slice = &data[..];
        assert!(matches!(
            LzwIndexDecoder.decode_indices(&mut slice, 2, 2, 2),
            Err(DecodingError::Format(_))
        ));
    }

    #[test]
    fn rejects_bad_code_size() {
        let mut data = &TWO_BY_TWO[..];
        assert!(matches!(
            LzwIndexDecoder.decode_indices(&mut data, 12, 2, 2),
            Err(DecodingError::Format(_))
        ));
    }
}
