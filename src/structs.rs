//! Fixed-size GIF structures and their packed-field layouts.
//!
//! Every parser here is a pure function over a byte array; stream handling
//! lives in [`crate::reader`] and [`crate::decoder`].

use byteorder::{ByteOrder, LittleEndian};
use log::warn;

use crate::error::{DecodingError, Result};
use crate::options::Limits;

pub const SCREEN_DESCRIPTOR_LEN: usize = 7;
pub const IMAGE_DESCRIPTOR_LEN: usize = 9;
/// Block size byte, packed fields, delay, transparent index, terminator.
pub const GRAPHIC_CONTROL_LEN: usize = 6;

/// Upper bound on the byte length of any declared color table.
pub const MAX_COLOR_TABLE_BYTES: usize = 255 * 4;

// Logical screen descriptor packed fields.
const GLOBAL_TABLE_FLAG: u8 = 0b1000_0000;
const COLOR_RESOLUTION_MASK: u8 = 0b0111_0000;
const COLOR_RESOLUTION_SHIFT: u8 = 4;
const GLOBAL_SORT_FLAG: u8 = 0b0000_1000;

// Image descriptor packed fields.
const LOCAL_TABLE_FLAG: u8 = 0b1000_0000;
const INTERLACE_FLAG: u8 = 0b0100_0000;
const LOCAL_SORT_FLAG: u8 = 0b0010_0000;

// Shared by both descriptors.
const TABLE_SIZE_MASK: u8 = 0b0000_0111;

// Graphic control extension packed fields.
const DISPOSAL_MASK: u8 = 0b0001_1100;
const DISPOSAL_SHIFT: u8 = 2;
const USER_INPUT_FLAG: u8 = 0b0000_0010;
const TRANSPARENCY_FLAG: u8 = 0b0000_0001;

const GRAPHIC_CONTROL_BLOCK_SIZE: u8 = 4;

/// Number of entries declared by a 3-bit table size exponent.
fn table_entries(packed: u8) -> usize {
    2 << (packed & TABLE_SIZE_MASK)
}

fn check_table_size(which: &str, entries: usize) -> Result<()> {
    let bytes = entries * 3;
    if bytes > MAX_COLOR_TABLE_BYTES {
        return Err(DecodingError::format(format!(
            "{} color table of {} entries ({} bytes) exceeds {} bytes",
            which, entries, bytes, MAX_COLOR_TABLE_BYTES
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub has_global_color_table: bool,
    pub color_resolution: u8,
    pub sorted: bool,
    /// Entry count, meaningful only when `has_global_color_table` is set.
    pub global_color_table_size: usize,
    pub bg_color_index: u8,
    pub pixel_aspect_ratio: u8,
}

impl LogicalScreenDescriptor {
    pub fn parse(buf: &[u8; SCREEN_DESCRIPTOR_LEN]) -> Self {
        let packed = buf[4];
        Self {
            width: LittleEndian::read_u16(&buf[0..2]),
            height: LittleEndian::read_u16(&buf[2..4]),
            has_global_color_table: packed & GLOBAL_TABLE_FLAG != 0,
            color_resolution: ((packed & COLOR_RESOLUTION_MASK) >> COLOR_RESOLUTION_SHIFT) + 1,
            sorted: packed & GLOBAL_SORT_FLAG != 0,
            global_color_table_size: table_entries(packed),
            bg_color_index: buf[5],
            pixel_aspect_ratio: buf[6],
        }
    }

    /// Both failures are fatal: nothing after the descriptor can be trusted.
    pub fn validate(&self, limits: &Limits) -> Result<()> {
        if self.has_global_color_table {
            check_table_size("global", self.global_color_table_size)?;
        }
        limits.check("canvas", self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub has_local_color_table: bool,
    pub interlaced: bool,
    pub sorted: bool,
    pub local_color_table_size: usize,
}

impl ImageDescriptor {
    pub fn parse(buf: &[u8; IMAGE_DESCRIPTOR_LEN]) -> Self {
        let packed = buf[8];
        Self {
            left: LittleEndian::read_u16(&buf[0..2]),
            top: LittleEndian::read_u16(&buf[2..4]),
            width: LittleEndian::read_u16(&buf[4..6]),
            height: LittleEndian::read_u16(&buf[6..8]),
            has_local_color_table: packed & LOCAL_TABLE_FLAG != 0,
            interlaced: packed & INTERLACE_FLAG != 0,
            sorted: packed & LOCAL_SORT_FLAG != 0,
            local_color_table_size: table_entries(packed),
        }
    }

    pub fn validate(&self, limits: &Limits) -> Result<()> {
        if self.has_local_color_table {
            check_table_size("local", self.local_color_table_size)?;
        }
        limits.check("frame", self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    /// No disposal specified.
    #[default]
    NoAction,
    DoNotDispose,
    RestoreBackground,
    RestorePrevious,
}

impl DisposalMethod {
    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            0 => Some(DisposalMethod::NoAction),
            1 => Some(DisposalMethod::DoNotDispose),
            2 => Some(DisposalMethod::RestoreBackground),
            3 => Some(DisposalMethod::RestorePrevious),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicControl {
    /// Hundredths of a second.
    pub delay_cs: u16,
    pub disposal: DisposalMethod,
    pub user_input: bool,
    pub transparent_index: Option<u8>,
}

impl GraphicControl {
    pub fn parse(buf: &[u8; GRAPHIC_CONTROL_LEN]) -> Self {
        if buf[0] != GRAPHIC_CONTROL_BLOCK_SIZE {
            warn!(
                "graphic control block size is {}, expected {}",
                buf[0], GRAPHIC_CONTROL_BLOCK_SIZE
            );
        }

        let packed = buf[1];
        let raw_disposal = (packed & DISPOSAL_MASK) >> DISPOSAL_SHIFT;
        let disposal = DisposalMethod::from_u8(raw_disposal).unwrap_or_else(|| {
            warn!("reserved disposal method {}, treating as none", raw_disposal);
            DisposalMethod::NoAction
        });

        Self {
            delay_cs: LittleEndian::read_u16(&buf[2..4]),
            disposal,
            user_input: packed & USER_INPUT_FLAG != 0,
            transparent_index: if packed & TRANSPARENCY_FLAG != 0 {
                Some(buf[4])
            } else {
                None
            },
        }
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_cs as u32 * 10
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub type Palette = Vec<Color>;

/// Interprets packed RGB triples; a trailing partial triple is ignored.
pub fn parse_palette(bytes: &[u8]) -> Palette {
    bytes
        .chunks_exact(3)
        .map(|c| Color {
            r: c[0],
            g: c[1],
            b: c[2],
        })
        .collect()
}
