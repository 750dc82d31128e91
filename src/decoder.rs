use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use crate::error::{DecodingError, Result};
use crate::frame::Frame;
use crate::lzw::{IndexDecoder, LzwIndexDecoder};
use crate::options::DecodeOptions;
use crate::reader::BlockReader;
use crate::structs::{
    parse_palette, GraphicControl, ImageDescriptor, LogicalScreenDescriptor, Palette,
    GRAPHIC_CONTROL_LEN, IMAGE_DESCRIPTOR_LEN, SCREEN_DESCRIPTOR_LEN,
};

pub const SIGNATURE_LEN: usize = 6;

const IMAGE_SEPARATOR: u8 = 0x2C;
const EXTENSION_INTRODUCER: u8 = 0x21;
const TRAILER: u8 = 0x3B;

const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const COMMENT_LABEL: u8 = 0xFE;
const APPLICATION_LABEL: u8 = 0xFF;
const PLAIN_TEXT_LABEL: u8 = 0x01;

/// Block size byte plus identifier and authentication code.
const APPLICATION_HEADER_LEN: usize = 12;
/// Block size byte plus the twelve text grid bytes.
const PLAIN_TEXT_HEADER_LEN: u64 = 13;

const LOOPING_APPLICATIONS: [&[u8; 11]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];
const LOOP_SUB_BLOCK_ID: u8 = 1;

/// `GIF87a` or `GIF89a`.
pub fn is_gif(bytes: &[u8]) -> bool {
    bytes.len() >= SIGNATURE_LEN
        && &bytes[..4] == b"GIF8"
        && (bytes[4] == b'7' || bytes[4] == b'9')
        && bytes[5] == b'a'
}

/// Walks the block structure of a GIF stream, yielding one raw [`Frame`]
/// per image block.
pub struct Decoder<R, D = LzwIndexDecoder> {
    reader: BlockReader<R>,
    index_decoder: D,
    options: DecodeOptions,

    screen_descriptor: LogicalScreenDescriptor,
    global_palette: Option<Palette>,

    /// Set by a graphic control extension, consumed by the next image.
    pending_control: Option<GraphicControl>,
    first_control: Option<GraphicControl>,

    loop_count: Option<u16>,
    comments: Vec<Vec<u8>>,

    frames_read: usize,
    done: bool,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Result<Self> {
        Self::with_index_decoder(reader, options, LzwIndexDecoder)
    }
}

impl<R: Read, D: IndexDecoder> Decoder<R, D> {
    pub fn with_index_decoder(reader: R, options: DecodeOptions, index_decoder: D) -> Result<Self> {
        let mut reader = BlockReader::new(reader);

        if options.check_signature {
            let signature = reader.read_array::<SIGNATURE_LEN>()?;
            if !is_gif(&signature) {
                return Err(DecodingError::InvalidSignature);
            }
        }

        let screen_descriptor =
            LogicalScreenDescriptor::parse(&reader.read_array::<SCREEN_DESCRIPTOR_LEN>()?);
        screen_descriptor.validate(&options.limits)?;
        debug!("logical screen: {:?}", screen_descriptor);

        let global_palette = if screen_descriptor.has_global_color_table {
            let size = screen_descriptor.global_color_table_size;
            Some(parse_palette(&reader.read_vec(size * 3)?))
        } else {
            None
        };

        Ok(Self {
            reader,
            index_decoder,
            options,
            screen_descriptor,
            global_palette,
            pending_control: None,
            first_control: None,
            loop_count: None,
            comments: Vec::new(),
            frames_read: 0,
            done: false,
        })
    }

    pub fn screen_descriptor(&self) -> &LogicalScreenDescriptor {
        &self.screen_descriptor
    }

    pub fn global_palette(&self) -> Option<&Palette> {
        self.global_palette.as_ref()
    }

    /// The first graphic control extension seen so far.
    pub fn first_control(&self) -> Option<&GraphicControl> {
        self.first_control.as_ref()
    }

    pub fn loop_count(&self) -> Option<u16> {
        self.loop_count
    }

    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }

    pub(crate) fn take_comments(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.comments)
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Reads blocks until the next image, the trailer or the end of input.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        while !self.done {
            let block = match self.reader.read_byte()? {
                Some(b) => b,
                None => {
                    debug!("end of stream without trailer");
                    self.done = true;
                    break;
                }
            };

            match block {
                IMAGE_SEPARATOR => {
                    let frame = self.read_image()?;
                    self.frames_read += 1;
                    return Ok(Some(frame));
                }
                EXTENSION_INTRODUCER => self.read_extension()?,
                TRAILER => {
                    debug!("trailer after {} frames", self.frames_read);
                    self.done = true;
                }
                other => {
                    // Stray bytes between blocks are skipped one at a time.
                    warn!("unknown block 0x{:02X}, skipping", other);
                }
            }
        }

        Ok(None)
    }

    fn read_extension(&mut self) -> Result<()> {
        let label = self.reader.read_byte()?.ok_or(DecodingError::Truncated)?;

        match label {
            GRAPHIC_CONTROL_LABEL => {
                let buf = self.reader.read_array::<GRAPHIC_CONTROL_LEN>()?;
                let control = GraphicControl::parse(&buf);
                debug!("graphic control: {:?}", control);

                // The last byte should be the terminator; anything else
                // starts further sub-blocks.
                let trailing = buf[GRAPHIC_CONTROL_LEN - 1];
                if trailing != 0 {
                    warn!("graphic control extension is not terminated, skipping extra data");
                    self.reader.skip(trailing as u64)?;
                    self.reader.skip_sub_blocks()?;
                }

                if self.pending_control.is_some() {
                    debug!("graphic control replaces an unused one");
                }
                self.pending_control = Some(control);
                self.first_control.get_or_insert(control);
            }
            COMMENT_LABEL => {
                let comment = self.reader.read_sub_blocks()?.concat();
                debug!("comment of {} bytes", comment.len());
                self.comments.push(comment);
            }
            APPLICATION_LABEL => {
                let header = self.reader.read_array::<APPLICATION_HEADER_LEN>()?;
                let identifier = &header[1..];
                if LOOPING_APPLICATIONS.iter().any(|id| &id[..] == identifier) {
                    for block in self.reader.read_sub_blocks()? {
                        if block.len() >= 3 && block[0] == LOOP_SUB_BLOCK_ID {
                            let count = LittleEndian::read_u16(&block[1..3]);
                            debug!("loop count {}", count);
                            self.loop_count = Some(count);
                        }
                    }
                } else {
                    debug!(
                        "skipping application extension {}",
                        String::from_utf8_lossy(identifier)
                    );
                    self.reader.skip_sub_blocks()?;
                }
            }
            PLAIN_TEXT_LABEL => {
                self.reader.skip(PLAIN_TEXT_HEADER_LEN)?;
                self.reader.skip_sub_blocks()?;
            }
            other => {
                warn!("unknown extension label 0x{:02X}, skipping", other);
                self.reader.skip_sub_blocks()?;
            }
        }

        Ok(())
    }

    fn read_image(&mut self) -> Result<Frame> {
        let descriptor = ImageDescriptor::parse(&self.reader.read_array::<IMAGE_DESCRIPTOR_LEN>()?);
        descriptor.validate(&self.options.limits)?;
        debug!("image {}: {:?}", self.frames_read, descriptor);

        let local_palette = if descriptor.has_local_color_table {
            let size = descriptor.local_color_table_size;
            Some(parse_palette(&self.reader.read_vec(size * 3)?))
        } else {
            None
        };

        let min_code_size = self.reader.read_byte()?.ok_or(DecodingError::Truncated)?;

        let mut data = self.reader.sub_blocks();
        let indices = self.index_decoder.decode_indices(
            &mut data,
            min_code_size,
            descriptor.width,
            descriptor.height,
        )?;
        let trailing = data.drain()?;
        if trailing > 0 {
            debug!("discarded {} bytes of trailing image data", trailing);
        }

        Ok(Frame {
            descriptor,
            control: self.pending_control.take(),
            local_palette,
            indices,
        })
    }
}
