//! Canvas state carried across frames.
//!
//! The compositor owns the only mutable canvas. Each call to
//! [`Compositor::compose`] draws one frame, hands out a copy of the result
//! and then applies that frame's disposal method, so the canvas is already
//! in the right state for the next frame.

use log::{trace, warn};

use crate::error::{DecodingError, Result};
use crate::frame::{DecodedFrame, Frame};
use crate::structs::{Color, DisposalMethod, Palette};

pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

const fn opaque(color: Color) -> [u8; 4] {
    [color.r, color.g, color.b, 255]
}

/// `(start, step)` of the four interlace passes.
const INTERLACE_PASSES: [(u16, u16); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Destination rows, relative to the frame's top, in the order an
/// interlaced image stores them.
pub fn interlaced_rows(height: u16) -> impl Iterator<Item = u16> {
    INTERLACE_PASSES
        .into_iter()
        .flat_map(move |(start, step)| (start..height).step_by(step as usize))
}

/// An RGBA8 buffer the size of the logical screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * 4
    }

    pub fn pixel(&self, x: u16, y: u16) -> [u8; 4] {
        let i = self.offset(x as usize, y as usize);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    fn put(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    /// Fills a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, left: u16, top: u16, width: u16, height: u16, rgba: [u8; 4]) {
        let x_end = (left as usize + width as usize).min(self.width as usize);
        let y_end = (top as usize + height as usize).min(self.height as usize);
        for y in top as usize..y_end {
            for x in left as usize..x_end {
                self.put(x, y, rgba);
            }
        }
    }
}

pub struct Compositor {
    width: u16,
    height: u16,
    canvas: Option<Canvas>,
}

impl Compositor {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            canvas: None,
        }
    }

    /// The canvas as it stands before the next frame, `None` until the
    /// first frame has been composed.
    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn compose(
        &mut self,
        frame: &Frame,
        global_palette: Option<&Palette>,
    ) -> Result<DecodedFrame> {
        let palette = frame
            .local_palette
            .as_ref()
            .or(global_palette)
            .ok_or_else(|| {
                DecodingError::format("image has neither a local nor a global color table")
            })?;

        let (width, height) = (self.width, self.height);
        let canvas = self.canvas.get_or_insert_with(|| Canvas::new(width, height));

        let disposal = frame.disposal();
        let previous = if disposal == DisposalMethod::RestorePrevious {
            Some(canvas.clone())
        } else {
            None
        };

        draw(canvas, frame, palette);

        let desc = &frame.descriptor;
        trace!(
            "composed {}x{} frame at ({}, {}), disposal {:?}",
            desc.width,
            desc.height,
            desc.left,
            desc.top,
            disposal
        );

        let decoded = DecodedFrame {
            width,
            height,
            delay_ms: frame.delay_ms(),
            buffer: canvas.pixels.clone(),
        };

        match disposal {
            DisposalMethod::NoAction | DisposalMethod::DoNotDispose => {}
            DisposalMethod::RestoreBackground => {
                canvas.fill_rect(desc.left, desc.top, desc.width, desc.height, TRANSPARENT);
            }
            DisposalMethod::RestorePrevious => {
                if let Some(previous) = previous {
                    *canvas = previous;
                }
            }
        }

        Ok(decoded)
    }
}

fn draw(canvas: &mut Canvas, frame: &Frame, palette: &Palette) {
    let desc = &frame.descriptor;
    let frame_width = desc.width as usize;
    if frame_width == 0 {
        return;
    }

    let transparent = frame.transparent_index();
    let mut out_of_range = false;

    let rows: Box<dyn Iterator<Item = u16>> = if desc.interlaced {
        Box::new(interlaced_rows(desc.height))
    } else {
        Box::new(0..desc.height)
    };

    // Source rows are always consumed in order; only the destination moves.
    for (src_row, dest_row) in frame.indices.chunks_exact(frame_width).zip(rows) {
        let y = desc.top as usize + dest_row as usize;
        if y >= canvas.height as usize {
            continue;
        }

        for (col, &index) in src_row.iter().enumerate() {
            let x = desc.left as usize + col;
            if x >= canvas.width as usize {
                break;
            }
            if transparent == Some(index) {
                continue;
            }

            let color = match palette.get(index as usize) {
                Some(&c) => c,
                None => {
                    out_of_range = true;
                    Color::default()
                }
            };
            canvas.put(x, y, opaque(color));
        }
    }

    if out_of_range {
        warn!(
            "frame uses palette indices beyond its {}-entry color table",
            palette.len()
        );
    }
}
