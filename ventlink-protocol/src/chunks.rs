//! Delimiter-based splitting and merging of a serial byte stream
//!
//! The splitter accumulates bytes until the delimiter arrives and then hands
//! out the completed chunk. The merger appends the delimiter to an outgoing
//! chunk. Neither touches the chunk contents.

use heapless::Vec;

use crate::cobs::DELIMITER;
use crate::status::{ByteBuffer, OutputStatus};

/// Errors that can occur while splitting or merging chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChunkError {
    /// Chunk does not fit in the buffer
    InvalidLength,
}

/// Outcome of feeding one byte to a [`ChunkSplitter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChunkInputStatus {
    /// Byte appended to the current chunk
    Ok,
    /// Byte started a new chunk, discarding a completed chunk nobody consumed
    Overwritten,
    /// Delimiter received; the chunk can be taken with `output`
    OutputReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitState {
    /// Accumulating bytes below the maximum chunk size
    Accumulating,
    /// Bytes were dropped because the chunk grew past the maximum size
    Overflowed,
    /// Delimiter seen, chunk complete
    Ready { overflowed: bool },
}

/// Splits a byte stream into delimited chunks of at most `N` bytes
#[derive(Debug, Clone)]
pub struct ChunkSplitter<const N: usize> {
    buffer: Vec<u8, N>,
    delimiter: u8,
    include_delimiter: bool,
    state: SplitState,
}

impl<const N: usize> Default for ChunkSplitter<N> {
    fn default() -> Self {
        Self::new(DELIMITER, false)
    }
}

impl<const N: usize> ChunkSplitter<N> {
    /// Create a splitter for the given delimiter
    ///
    /// With `include_delimiter`, the delimiter is kept as the last byte of
    /// each chunk and counts toward its length.
    pub fn new(delimiter: u8, include_delimiter: bool) -> Self {
        Self {
            buffer: Vec::new(),
            delimiter,
            include_delimiter,
            state: SplitState::Accumulating,
        }
    }

    /// Discard any partial or unconsumed chunk
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = SplitState::Accumulating;
    }

    /// Feed a single byte
    ///
    /// Returns `Err(ChunkError::InvalidLength)` for every byte that does not
    /// fit; the chunk is then dropped when its delimiter arrives.
    pub fn input(&mut self, byte: u8) -> Result<ChunkInputStatus, ChunkError> {
        let mut status = ChunkInputStatus::Ok;
        if let SplitState::Ready { .. } = self.state {
            self.reset();
            status = ChunkInputStatus::Overwritten;
        }

        if byte == self.delimiter {
            let mut overflowed = self.state == SplitState::Overflowed;
            let mut result = Ok(ChunkInputStatus::OutputReady);
            if self.include_delimiter && self.buffer.push(byte).is_err() {
                overflowed = true;
                result = Err(ChunkError::InvalidLength);
            }
            self.state = SplitState::Ready { overflowed };
            return result;
        }

        // Once overflowed the buffer stays full, so every later byte lands here
        if self.buffer.push(byte).is_err() {
            self.state = SplitState::Overflowed;
            return Err(ChunkError::InvalidLength);
        }
        Ok(status)
    }

    /// Take the completed chunk, if any, replacing the contents of `output`
    ///
    /// Returns `Ok(OutputStatus::Waiting)` without touching `output` until a
    /// delimiter has been received. An over-length chunk is dropped with
    /// `Err(ChunkError::InvalidLength)`.
    pub fn output<const M: usize>(
        &mut self,
        output: &mut ByteBuffer<M>,
    ) -> Result<OutputStatus, ChunkError> {
        let overflowed = match self.state {
            SplitState::Ready { overflowed } => overflowed,
            _ => return Ok(OutputStatus::Waiting),
        };
        if overflowed || self.buffer.len() > M {
            self.reset();
            return Err(ChunkError::InvalidLength);
        }

        output.clear();
        let copied = output.extend_from_slice(&self.buffer);
        self.reset();
        copied.map_err(|_| ChunkError::InvalidLength)?;
        Ok(OutputStatus::Available)
    }
}

/// Terminates outgoing chunks with the delimiter
#[derive(Debug, Clone, Copy)]
pub struct ChunkMerger {
    delimiter: u8,
}

impl Default for ChunkMerger {
    fn default() -> Self {
        Self::new(DELIMITER)
    }
}

impl ChunkMerger {
    /// Create a merger for the given delimiter
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Append the delimiter to `buffer` in place
    pub fn transform<const N: usize>(&self, buffer: &mut ByteBuffer<N>) -> Result<(), ChunkError> {
        buffer
            .push(self.delimiter)
            .map_err(|_| ChunkError::InvalidLength)
    }
}
