use crate::structs::{DisposalMethod, GraphicControl, ImageDescriptor, Palette};

/// One image block as read from the stream, before compositing.
#[derive(Debug, Clone)]
pub struct Frame {
    pub descriptor: ImageDescriptor,
    /// The graphic control extension that preceded this image, if any.
    pub control: Option<GraphicControl>,
    pub local_palette: Option<Palette>,
    /// `width * height` palette indices in row-major source order.
    pub indices: Vec<u8>,
}

impl Frame {
    pub fn disposal(&self) -> DisposalMethod {
        self.control.map(|c| c.disposal).unwrap_or_default()
    }

    pub fn transparent_index(&self) -> Option<u8> {
        self.control.and_then(|c| c.transparent_index)
    }

    pub fn delay_ms(&self) -> u32 {
        self.control.map(|c| c.delay_ms()).unwrap_or(0)
    }
}

/// A fully composited frame covering the whole logical screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub width: u16,
    pub height: u16,
    pub delay_ms: u32,
    /// RGBA8, row-major, straight alpha.
    pub buffer: Vec<u8>,
}

impl DecodedFrame {
    pub fn pixel(&self, x: u16, y: u16) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.buffer[i],
            self.buffer[i + 1],
            self.buffer[i + 2],
            self.buffer[i + 3],
        ]
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedImage {
    pub width: u16,
    pub height: u16,
    pub frames: Vec<DecodedFrame>,
    /// Delay of the first graphic control extension in the stream, in
    /// milliseconds; 0 when there was none.
    pub duration_ms: u32,
    /// From a NETSCAPE2.0 application extension; `Some(0)` loops forever.
    pub loop_count: Option<u16>,
    pub comments: Vec<Vec<u8>>,
}
