//! Forward-only byte cursor with end-of-stream detection.

use std::io::{ErrorKind, Read};

use log::trace;

use super::types::error::{DataioError, Result};

/// Upper bound on the buffer reserved before any byte of a read arrives.
const MAX_PREALLOCATION: usize = 64 * 1024;

/// Sequential reader over any byte source.
///
/// Tracks the absolute offset of every byte handed out so truncation errors
/// can report where the stream ran out. There is no seeking and no peeking.
#[derive(Debug)]
pub struct StreamCursor<R> {
    inner: R,
    position: u64,
}

impl<R: Read> StreamCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Starts counting offsets from `position`, for streams opened mid-file.
    pub fn with_position(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    /// Offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads exactly `n` bytes.
    ///
    /// # Errors
    /// `EndOfStream` if the source is exhausted before `n` bytes arrive. The
    /// reported position is the offset at which the source ran dry; bytes read
    /// before that point are consumed. The buffer grows with the data actually
    /// read, so a corrupt length costs no more memory than the source holds.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(n.min(MAX_PREALLOCATION));
        let read = (&mut self.inner).take(n as u64).read_to_end(&mut buf);
        self.position += buf.len() as u64;
        read?;

        if buf.len() < n {
            trace!(
                "Stream exhausted at offset {} ({} of {} bytes read)",
                self.position,
                buf.len(),
                n
            );
            return Err(DataioError::EndOfStream {
                position: self.position,
                requested: n - buf.len(),
            });
        }
        Ok(buf)
    }

    /// Fixed-size variant of [`read_exact`](Self::read_exact) for primitives.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Reads one byte, or `None` if the source is already exhausted.
    ///
    /// Lets callers tell a clean end of stream at a record boundary apart
    /// from truncation inside a record.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let requested = buf.len();
        let mut filled = 0;
        while filled < requested {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.position += filled as u64;
                    trace!(
                        "Stream exhausted at offset {} ({} of {} bytes read)",
                        self.position, filled, requested
                    );
                    return Err(DataioError::EndOfStream {
                        position: self.position,
                        requested: requested - filled,
                    });
                }
                Ok(read) => filled += read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.position += filled as u64;
                    return Err(e.into());
                }
            }
        }
        self.position += requested as u64;
        Ok(())
    }
}

/// Lets a cursor feed another reader (e.g. a chained header prefix) while
/// keeping its offset accounting.
impl<R: Read> Read for StreamCursor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.position += read as u64;
        Ok(read)
    }
}
