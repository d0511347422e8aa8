//! Sequenced datagrams
//!
//! Datagram format:
//! - SEQ (1 byte): rolling sequence number, wraps 255 -> 0
//! - LEN (1 byte): payload length
//! - PAYLOAD (0-255 bytes)
//!
//! The parser takes the length field at face value; checking it against the
//! bytes actually present is left to [`DatagramReceiver`], so diagnostic
//! tools can still inspect inconsistent datagrams.

use crate::status::{overwrite, ByteBuffer, IndexError};

/// Size of the sequence and length fields
pub const HEADER_SIZE: usize = 2;

/// Offset of the payload within a datagram
pub const PAYLOAD_OFFSET: usize = HEADER_SIZE;

/// Largest payload the length field can describe
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Errors reported when receiving a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DatagramReceiveError {
    /// Body too short for the header, or payload too large
    InvalidParse,
    /// Length field disagrees with the payload bytes present
    InvalidLength,
    /// Sequence number is not the expected one
    InvalidSequence,
}

/// Errors reported when sending a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DatagramSendError {
    /// Payload and header do not fit in the output buffer
    InvalidLength,
}

/// A sequence-numbered payload of up to `N` bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Datagram<const N: usize> {
    seq: u8,
    length: u8,
    payload: ByteBuffer<N>,
}

impl<const N: usize> Datagram<N> {
    /// Create an empty datagram with sequence 0
    pub fn new() -> Self {
        Self {
            seq: 0,
            length: 0,
            payload: ByteBuffer::new(),
        }
    }

    /// Create a datagram holding a copy of `payload`
    pub fn with_payload(payload: &[u8], seq: u8) -> Result<Self, IndexError> {
        let length = u8::try_from(payload.len()).map_err(|_| IndexError::OutOfBounds)?;
        let mut datagram = Self::new();
        overwrite(&mut datagram.payload, payload)?;
        datagram.seq = seq;
        datagram.length = length;
        Ok(datagram)
    }

    /// Sequence number
    pub fn seq(&self) -> u8 {
        self.seq
    }

    /// Length field, as written or as read from the wire
    pub fn length(&self) -> u8 {
        self.length
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Write `[seq][len][payload]` to `output`, replacing its contents
    ///
    /// Fails without touching `output` if the datagram does not fit.
    pub fn write<const M: usize>(&self, output: &mut ByteBuffer<M>) -> Result<(), IndexError> {
        write_datagram(self.seq, &self.payload, output)
    }

    /// Read the header and payload from `input`
    ///
    /// Copies at most `length` payload bytes, fewer if the input ends early.
    /// Fails with the datagram unchanged if `input` is shorter than the header
    /// or the payload does not fit.
    pub fn parse(&mut self, input: &[u8]) -> Result<(), IndexError> {
        if input.len() < HEADER_SIZE {
            return Err(IndexError::OutOfBounds);
        }

        let length = input[1];
        let available = &input[PAYLOAD_OFFSET..];
        let copied = usize::from(length).min(available.len());
        overwrite(&mut self.payload, &available[..copied])?;
        self.seq = input[0];
        self.length = length;
        Ok(())
    }
}

fn write_datagram<const M: usize>(
    seq: u8,
    payload: &[u8],
    output: &mut ByteBuffer<M>,
) -> Result<(), IndexError> {
    let length = u8::try_from(payload.len()).map_err(|_| IndexError::OutOfBounds)?;
    if HEADER_SIZE + payload.len() > M {
        return Err(IndexError::OutOfBounds);
    }

    output.clear();
    output
        .extend_from_slice(&[seq, length])
        .map_err(|_| IndexError::OutOfBounds)?;
    output
        .extend_from_slice(payload)
        .map_err(|_| IndexError::OutOfBounds)
}

/// Checks datagram sequencing on the receiving side of a link
///
/// On a sequence mismatch the receiver resynchronizes to the sender instead
/// of rejecting every later datagram.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatagramReceiver {
    expected_seq: u8,
}

impl DatagramReceiver {
    /// Create a receiver expecting `expected_seq` next
    pub fn new(expected_seq: u8) -> Self {
        Self { expected_seq }
    }

    /// Sequence number expected for the next datagram
    pub fn expected_seq(&self) -> u8 {
        self.expected_seq
    }

    /// Parse `input` into `datagram` and check its length and sequence
    ///
    /// On [`DatagramReceiveError::InvalidSequence`] the datagram is fully
    /// parsed and the expected sequence has moved past it.
    pub fn transform<const N: usize>(
        &mut self,
        input: &[u8],
        datagram: &mut Datagram<N>,
    ) -> Result<(), DatagramReceiveError> {
        datagram
            .parse(input)
            .map_err(|_| DatagramReceiveError::InvalidParse)?;

        if usize::from(datagram.length()) != input.len() - HEADER_SIZE {
            return Err(DatagramReceiveError::InvalidLength);
        }

        let expected = self.expected_seq;
        self.expected_seq = datagram.seq().wrapping_add(1);
        if datagram.seq() != expected {
            return Err(DatagramReceiveError::InvalidSequence);
        }
        Ok(())
    }
}

/// Numbers outgoing datagrams
#[derive(Debug, Clone, Copy, Default)]
pub struct DatagramSender {
    next_seq: u8,
}

impl DatagramSender {
    /// Create a sender whose first datagram carries `next_seq`
    pub fn new(next_seq: u8) -> Self {
        Self { next_seq }
    }

    /// Sequence number the next datagram will carry
    pub fn next_seq(&self) -> u8 {
        self.next_seq
    }

    /// Write `payload` as the next datagram in sequence
    ///
    /// The sequence number only advances when the datagram is written.
    pub fn transform<const M: usize>(
        &mut self,
        payload: &[u8],
        output: &mut ByteBuffer<M>,
    ) -> Result<(), DatagramSendError> {
        write_datagram(self.next_seq, payload, output)
            .map_err(|_| DatagramSendError::InvalidLength)?;
        self.next_seq = self.next_seq.wrapping_add(1);
        Ok(())
    }
}
