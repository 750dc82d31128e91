use crate::error::{DecodingError, Result};

/// Dimension limits enforced on the logical screen and on every frame.
///
/// The default accepts anything a GIF can declare. A 65535x65535 canvas
/// costs about 17 GB of RGBA plus 4 GB of indices for a full-size frame,
/// and a header of a few bytes is enough to request it, so set tighter
/// limits when decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_width: u16,
    pub max_height: u16,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_width: u16::MAX,
            max_height: u16::MAX,
        }
    }
}

impl Limits {
    pub fn new(max_width: u16, max_height: u16) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    pub(crate) fn check(&self, what: &'static str, width: u16, height: u16) -> Result<()> {
        if width > self.max_width || height > self.max_height {
            return Err(DecodingError::Range {
                what,
                width,
                height,
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }
        Ok(())
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub limits: Limits,
    /// When `false` the reader is expected to be positioned right after
    /// the `GIF87a`/`GIF89a` signature.
    pub check_signature: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            check_signature: true,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn check_signature(mut self, check: bool) -> Self {
        self.check_signature = check;
        self
    }
}
