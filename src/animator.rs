use std::io::Read;

use crate::compositor::Compositor;
use crate::decoder::Decoder;
use crate::error::Result;
use crate::frame::{AnimatedImage, DecodedFrame};
use crate::lzw::{IndexDecoder, LzwIndexDecoder};

/// Iterator over fully composited frames.
///
/// Stops after the first error.
pub struct Animator<R, D = LzwIndexDecoder> {
    decoder: Decoder<R, D>,
    compositor: Compositor,
    failed: bool,
}

impl<R: Read, D: IndexDecoder> Animator<R, D> {
    pub fn new(decoder: Decoder<R, D>) -> Self {
        let screen = decoder.screen_descriptor();
        let compositor = Compositor::new(screen.width, screen.height);

        Self {
            decoder,
            compositor,
            failed: false,
        }
    }

    pub fn decoder(&self) -> &Decoder<R, D> {
        &self.decoder
    }

    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>> {
        let frame = match self.decoder.next_frame()? {
            Some(f) => f,
            None => return Ok(None),
        };

        let decoded = self
            .compositor
            .compose(&frame, self.decoder.global_palette())?;
        Ok(Some(decoded))
    }

    /// Decodes the remaining frames.
    pub fn into_animation(mut self) -> Result<AnimatedImage> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }

        let screen = *self.decoder.screen_descriptor();
        Ok(AnimatedImage {
            width: screen.width,
            height: screen.height,
            frames,
            duration_ms: self.decoder.first_control().map_or(0, |c| c.delay_ms()),
            loop_count: self.decoder.loop_count(),
            comments: self.decoder.take_comments(),
        })
    }
}

impl<R: Read, D: IndexDecoder> Iterator for Animator<R, D> {
    type Item = Result<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
