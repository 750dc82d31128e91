#![allow(dead_code)]

//! Builders for synthetic GIF streams.

pub const BLACK: [u8; 3] = [0, 0, 0];
pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];

pub const NONE: u8 = 0;
pub const DO_NOT_DISPOSE: u8 = 1;
pub const RESTORE_BACKGROUND: u8 = 2;
pub const RESTORE_PREVIOUS: u8 = 3;

pub fn rgba(c: [u8; 3]) -> [u8; 4] {
    [c[0], c[1], c[2], 255]
}

/// Exponent `n` such that `2 << n == len`.
fn table_exponent(len: usize) -> u8 {
    assert!(len.is_power_of_two() && (2..=256).contains(&len));
    (len.trailing_zeros() - 1) as u8
}

fn write_table(out: &mut Vec<u8>, table: &[[u8; 3]]) {
    for c in table {
        out.extend_from_slice(c);
    }
}

fn write_sub_blocks(out: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
}

struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl BitWriter {
    fn write(&mut self, code: u16, width: u8) {
        self.acc |= (code as u32) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.bytes.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.bytes.push(self.acc as u8);
        }
        self.bytes
    }
}

/// LZW-encodes without ever growing the code width: a clear code is sent
/// before the table would need a wider code.
pub fn lzw_encode(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    assert!(min_code_size >= 2);
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let width = min_code_size + 1;
    let run = (1usize << min_code_size) - 2;

    let mut w = BitWriter {
        bytes: Vec::new(),
        acc: 0,
        bits: 0,
    };
    for chunk in indices.chunks(run) {
        w.write(clear, width);
        for &i in chunk {
            w.write(i as u16, width);
        }
    }
    w.write(end, width);
    w.finish()
}

pub fn min_code_size_for(indices: &[u8]) -> u8 {
    let max = indices.iter().copied().max().unwrap_or(0);
    let bits = 8 - max.leading_zeros() as u8;
    bits.max(2)
}

#[derive(Clone, Debug)]
pub struct Image {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub local_table: Option<Vec<[u8; 3]>>,
    pub indices: Vec<u8>,
}

impl Image {
    pub fn new(left: u16, top: u16, width: u16, height: u16, indices: Vec<u8>) -> Self {
        assert_eq!(indices.len(), width as usize * height as usize);
        Self {
            left,
            top,
            width,
            height,
            interlaced: false,
            local_table: None,
            indices,
        }
    }

    pub fn filled(left: u16, top: u16, width: u16, height: u16, index: u8) -> Self {
        Self::new(left, top, width, height, vec![index; width as usize * height as usize])
    }

    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }

    pub fn local_table(mut self, table: &[[u8; 3]]) -> Self {
        self.local_table = Some(table.to_vec());
        self
    }
}

pub struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16, global: Option<&[[u8; 3]]>) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        match global {
            Some(table) => {
                bytes.push(0b1111_0000 | table_exponent(table.len()));
                bytes.extend_from_slice(&[0, 0]);
                write_table(&mut bytes, table);
            }
            None => bytes.extend_from_slice(&[0, 0, 0]),
        }
        Self { bytes }
    }

    pub fn control(mut self, disposal: u8, delay_cs: u16, transparent: Option<u8>) -> Self {
        let packed = (disposal << 2) | transparent.is_some() as u8;
        self.bytes.extend_from_slice(&[0x21, 0xF9, 4, packed]);
        self.bytes.extend_from_slice(&delay_cs.to_le_bytes());
        self.bytes.push(transparent.unwrap_or(0));
        self.bytes.push(0);
        self
    }

    pub fn image(mut self, image: &Image) -> Self {
        let out = &mut self.bytes;
        out.push(0x2C);
        out.extend_from_slice(&image.left.to_le_bytes());
        out.extend_from_slice(&image.top.to_le_bytes());
        out.extend_from_slice(&image.width.to_le_bytes());
        out.extend_from_slice(&image.height.to_le_bytes());

        let mut packed = 0u8;
        if image.interlaced {
            packed |= 0b0100_0000;
        }
        if let Some(table) = &image.local_table {
            packed |= 0b1000_0000 | table_exponent(table.len());
        }
        out.push(packed);
        if let Some(table) = &image.local_table {
            write_table(out, table);
        }

        let min_code_size = min_code_size_for(&image.indices);
        out.push(min_code_size);
        write_sub_blocks(out, &lzw_encode(&image.indices, min_code_size));
        self
    }

    pub fn comment(mut self, text: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFE]);
        write_sub_blocks(&mut self.bytes, text);
        self
    }

    pub fn netscape_loop(mut self, count: u16) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.extend_from_slice(&[3, 1]);
        self.bytes.extend_from_slice(&count.to_le_bytes());
        self.bytes.push(0);
        self
    }

    pub fn application(mut self, identifier: &[u8; 11], payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        self.bytes.extend_from_slice(identifier);
        write_sub_blocks(&mut self.bytes, payload);
        self
    }

    pub fn plain_text(mut self, text: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0x01, 12]);
        self.bytes.extend_from_slice(&[0; 12]);
        write_sub_blocks(&mut self.bytes, text);
        self
    }

    pub fn extension(mut self, label: u8, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, label]);
        write_sub_blocks(&mut self.bytes, payload);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Without a trailer.
    pub fn unterminated(self) -> Vec<u8> {
        self.bytes
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.push(0x3B);
        self.bytes
    }
}
