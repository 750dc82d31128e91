use std::io::{self, Read};

const CHUNK: usize = 256;

/// LSB-first code reader. Input is pulled in chunks so the LZW loop does
/// not issue one `read` call per byte.
pub struct BitReader<R> {
    input: R,
    chunk: [u8; CHUNK],
    chunk_len: usize,
    chunk_pos: usize,
    acc: u32,
    acc_bits: u8,
}

impl<R: Read> BitReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            chunk: [0; CHUNK],
            chunk_len: 0,
            chunk_pos: 0,
            acc: 0,
            acc_bits: 0,
        }
    }

    fn next_byte(&mut self) -> io::Result<u8> {
        if self.chunk_pos == self.chunk_len {
            self.chunk_len = loop {
                match self.input.read(&mut self.chunk) {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    other => break other?,
                }
            };
            self.chunk_pos = 0;
            if self.chunk_len == 0 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
        }
        let byte = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Ok(byte)
    }

    /// Reads one code of `width <= 16` bits.
    pub fn read_bits(&mut self, width: u8) -> io::Result<u16> {
        debug_assert!(width <= 16);

        while self.acc_bits < width {
            self.acc |= u32::from(self.next_byte()?) << self.acc_bits;
            self.acc_bits += 8;
        }

        let code = self.acc & ((1 << width) - 1);
        self.acc >>= width;
        self.acc_bits -= width;
        Ok(code as u16)
    }
}
