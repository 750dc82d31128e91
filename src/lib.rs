//! Decoding of GIF streams into composited RGBA animations.
//!
//! ```no_run
//! let file = std::fs::File::open("anim.gif")?;
//! let animation = gif_canvas::decode(std::io::BufReader::new(file))?;
//! for frame in &animation.frames {
//!     assert_eq!(frame.buffer.len(), animation.width as usize * animation.height as usize * 4);
//! }
//! # Ok::<(), gif_canvas::DecodingError>(())
//! ```
//!
//! For frame-by-frame consumption wrap a [`Decoder`] in an [`Animator`].

use std::io::Read;

pub mod animator;
pub mod compositor;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod lzw;
pub mod options;
pub mod reader;
pub mod structs;

mod bitreader;

pub use crate::animator::Animator;
pub use crate::decoder::{is_gif, Decoder};
pub use crate::error::{DecodingError, Result};
pub use crate::frame::{AnimatedImage, DecodedFrame, Frame};
pub use crate::lzw::{IndexDecoder, LzwIndexDecoder};
pub use crate::options::{DecodeOptions, Limits};
pub use crate::structs::DisposalMethod;

/// Decodes a whole GIF stream, signature included.
pub fn decode<R: Read>(reader: R) -> Result<AnimatedImage> {
    decode_with_options(reader, DecodeOptions::default())
}

pub fn decode_with_options<R: Read>(reader: R, options: DecodeOptions) -> Result<AnimatedImage> {
    Animator::new(Decoder::with_options(reader, options)?).into_animation()
}
