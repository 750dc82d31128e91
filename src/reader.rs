use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};
use log::warn;

use crate::error::Result;

/// Cursor over the raw GIF stream.
pub struct BlockReader<R> {
    inner: R,
}

impl<R: Read> BlockReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads exactly `N` bytes, failing with `Truncated` if the stream ends first.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Returns `None` at end of stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let buf = self.read_array::<2>()?;
        Ok(LittleEndian::read_u16(&buf))
    }

    /// Discards `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        if skipped < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "GIF stream truncated while skipping a block header",
            )
            .into());
        }
        Ok(())
    }

    /// Borrows the stream as a flat reader over the sub-block chain that
    /// starts at the current position.
    pub fn sub_blocks(&mut self) -> SubBlockReader<'_, R> {
        SubBlockReader::new(&mut self.inner)
    }

    /// Skips a sub-block chain up to and including its zero-length terminator.
    pub fn skip_sub_blocks(&mut self) -> Result<u64> {
        let mut chain = self.sub_blocks();
        Ok(io::copy(&mut chain, &mut io::sink())?)
    }

    /// Collects every sub-block of a chain, one `Vec` per sub-block.
    pub fn read_sub_blocks(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut blocks = Vec::new();
        while let Some(len) = self.read_byte()? {
            if len == 0 {
                return Ok(blocks);
            }
            blocks.push(self.read_vec(len as usize)?);
        }
        warn!("stream ended before sub-block terminator");
        Ok(blocks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    /// Next byte is a length prefix.
    AtPrefix,
    /// Bytes left in the current sub-block.
    InBlock(usize),
    Done,
}

/// Exposes a chain of length-prefixed sub-blocks as one contiguous stream.
///
/// The reader must be positioned on the first length prefix (or on the
/// terminator of an empty chain). Reading never goes past the terminator.
pub struct SubBlockReader<'a, R> {
    reader: &'a mut R,
    chain: Chain,
}

impl<'a, R: Read> SubBlockReader<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            chain: Chain::AtPrefix,
        }
    }

    /// Consumes whatever is left of the chain, terminator included.
    pub fn drain(&mut self) -> Result<u64> {
        Ok(io::copy(self, &mut io::sink())?)
    }

    fn advance(&mut self) -> io::Result<()> {
        let mut prefix = [0u8; 1];
        self.chain = match self.reader.read(&mut prefix)? {
            0 => {
                warn!("stream ended before sub-block terminator");
                Chain::Done
            }
            _ if prefix[0] == 0 => Chain::Done,
            _ => Chain::InBlock(prefix[0] as usize),
        };
        Ok(())
    }
}

impl<'a, R: Read> Read for SubBlockReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            match self.chain {
                Chain::Done => return Ok(0),
                Chain::AtPrefix => self.advance()?,
                Chain::InBlock(left) => {
                    let want = buf.len().min(left);
                    let got = self.reader.read(&mut buf[..want])?;
                    if got == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "GIF stream truncated inside a data sub-block",
                        ));
                    }
                    self.chain = if got == left {
                        Chain::AtPrefix
                    } else {
                        Chain::InBlock(left - got)
                    };
                    return Ok(got);
                }
            }
        }
    }
}
