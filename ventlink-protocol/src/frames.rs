//! Frame transport over a continuous serial byte stream
//!
//! Frame format:
//! - BODY (1-256 bytes): COBS-encoded payload, never contains `0x00`
//! - DELIMITER (1 byte): `0x00`
//!
//! The receiver accumulates bytes until the delimiter and then unstuffs the
//! body; the sender stuffs a payload and terminates it with the delimiter.

use crate::chunks::{ChunkError, ChunkInputStatus, ChunkMerger, ChunkSplitter};
use crate::cobs::{self, CobsError};
use crate::status::{ByteBuffer, OutputStatus};

/// Errors that can occur during frame transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame exceeds the chunk size or the destination buffer
    InvalidLength,
    /// Frame body is not valid COBS
    InvalidEncoding,
}

impl From<ChunkError> for FrameError {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::InvalidLength => FrameError::InvalidLength,
        }
    }
}

impl From<CobsError> for FrameError {
    fn from(err: CobsError) -> Self {
        match err {
            CobsError::BufferTooSmall => FrameError::InvalidLength,
            CobsError::InvalidEncoding => FrameError::InvalidEncoding,
        }
    }
}

/// Receives frames of at most `N` encoded bytes
#[derive(Debug, Clone, Default)]
pub struct FrameReceiver<const N: usize> {
    splitter: ChunkSplitter<N>,
}

impl<const N: usize> FrameReceiver<N> {
    /// Create a new frame receiver
    pub fn new() -> Self {
        Self {
            splitter: ChunkSplitter::default(),
        }
    }

    /// Feed a single byte from the serial link
    ///
    /// Returns `Ok(ChunkInputStatus::OutputReady)` once a frame is complete.
    pub fn input(&mut self, byte: u8) -> Result<ChunkInputStatus, FrameError> {
        Ok(self.splitter.input(byte)?)
    }

    /// Decode the completed frame into `output`
    ///
    /// A frame that overflowed or fails to unstuff is dropped and the
    /// receiver returns to accumulating.
    pub fn output<const M: usize>(
        &mut self,
        output: &mut ByteBuffer<M>,
    ) -> Result<OutputStatus, FrameError> {
        let mut chunk = ByteBuffer::<N>::new();
        if !self.splitter.output(&mut chunk)?.is_available() {
            return Ok(OutputStatus::Waiting);
        }

        cobs::decode(&chunk, output)?;
        Ok(OutputStatus::Available)
    }
}

/// Builds delimited frames for the serial link
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSender {
    merger: ChunkMerger,
}

impl FrameSender {
    /// Create a new frame sender
    pub fn new() -> Self {
        Self {
            merger: ChunkMerger::default(),
        }
    }

    /// Stuff `input` and append the delimiter, replacing the contents of `output`
    ///
    /// Fails with [`FrameError::InvalidLength`] before touching `output` if
    /// the complete frame does not fit.
    pub fn transform<const M: usize>(
        &self,
        input: &[u8],
        output: &mut ByteBuffer<M>,
    ) -> Result<(), FrameError> {
        if cobs::encoded_len(input) + 1 > M {
            return Err(FrameError::InvalidLength);
        }

        cobs::encode(input, output)?;
        self.merger.transform(output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: [u8; 11] = [0x98, 0xdb, 0xe3, 0x55, 0x01, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05];
    const FRAME: [u8; 13] = [
        0x0C, 0x98, 0xDB, 0xE3, 0x55, 0x01, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00,
    ];

    #[test]
    fn test_sender_frames_body() {
        let sender = FrameSender::new();
        let mut output = ByteBuffer::<256>::new();

        sender.transform(&BODY, &mut output).unwrap();
        assert_eq!(&output[..], &FRAME);
    }

    #[test]
    fn test_sender_no_room_for_delimiter() {
        let sender = FrameSender::new();
        let mut output = ByteBuffer::<12>::new();

        assert_eq!(sender.transform(&BODY, &mut output), Err(FrameError::InvalidLength));
        assert!(output.is_empty());
    }

    #[test]
    fn test_receiver_decodes_frame() {
        let mut receiver = FrameReceiver::<256>::new();
        let mut output = ByteBuffer::<254>::new();

        for &byte in &FRAME[..12] {
            assert_eq!(receiver.input(byte), Ok(ChunkInputStatus::Ok));
            assert_eq!(receiver.output(&mut output), Ok(OutputStatus::Waiting));
        }
        assert_eq!(receiver.input(0x00), Ok(ChunkInputStatus::OutputReady));
        assert_eq!(receiver.output(&mut output), Ok(OutputStatus::Available));
        assert_eq!(&output[..], &BODY);
    }

    #[test]
    fn test_receiver_drops_malformed_frame() {
        let mut receiver = FrameReceiver::<256>::new();
        let mut output = ByteBuffer::<254>::new();

        for byte in [0x01, 0x83, 0x01, 0x80, 0x00] {
            receiver.input(byte).unwrap();
        }
        assert_eq!(receiver.output(&mut output), Err(FrameError::InvalidEncoding));

        // The next frame is received normally
        for &byte in &FRAME {
            receiver.input(byte).unwrap();
        }
        assert_eq!(receiver.output(&mut output), Ok(OutputStatus::Available));
        assert_eq!(&output[..], &BODY);
    }

    #[test]
    fn test_receiver_drops_over_length_frame() {
        let mut receiver = FrameReceiver::<8>::new();
        let mut output = ByteBuffer::<8>::new();

        for _ in 0..8 {
            receiver.input(0x01).unwrap();
        }
        assert_eq!(receiver.input(0x01), Err(FrameError::InvalidLength));
        assert_eq!(receiver.input(0x00), Ok(ChunkInputStatus::OutputReady));
        assert_eq!(receiver.output(&mut output), Err(FrameError::InvalidLength));
        assert_eq!(receiver.output(&mut output), Ok(OutputStatus::Waiting));
    }

    #[test]
    fn test_round_trip_with_zeros() {
        let payload = [0x00, 0x12, 0x00, 0x00, 0x34];
        let sender = FrameSender::new();
        let mut frame = ByteBuffer::<16>::new();
        sender.transform(&payload, &mut frame).unwrap();
        assert_eq!(frame.iter().filter(|&&b| b == 0x00).count(), 1);

        let mut receiver = FrameReceiver::<16>::new();
        let mut output = ByteBuffer::<16>::new();
        for &byte in frame.iter() {
            receiver.input(byte).unwrap();
        }
        assert_eq!(receiver.output(&mut output), Ok(OutputStatus::Available));
        assert_eq!(&output[..], &payload);
    }
}
