//! Checksum-protected elements
//!
//! Element format:
//! - CRC (4 bytes): big-endian checksum of PAYLOAD
//! - PAYLOAD (0-N bytes)
//!
//! Parsing and verification are separate: [`CrcElement::parse`] exposes the
//! transmitted checksum and payload even when they disagree, while
//! [`CrcReceiver::transform`] also checks them against each other.

use crate::status::{overwrite, ByteBuffer, IndexError};

/// Size of the checksum field
pub const CRC_SIZE: usize = 4;

/// Offset of the payload within an element
pub const PAYLOAD_OFFSET: usize = CRC_SIZE;

/// A 32-bit checksum function
///
/// Takes `&mut self` so implementations may drive a hardware CRC unit.
pub trait Checksum {
    /// Compute the checksum of `data`
    fn compute(&mut self, data: &[u8]) -> u32;
}

/// Software CRC-32C (Castagnoli)
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32c;

impl Checksum for Crc32c {
    fn compute(&mut self, data: &[u8]) -> u32 {
        crc32c::crc32c(data)
    }
}

/// Errors reported when receiving an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrcReceiveError {
    /// Body too short for the checksum field, or payload too large
    InvalidParse,
    /// Transmitted checksum does not match the payload
    InvalidCrc,
}

/// Errors reported when sending an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrcSendError {
    /// Payload and checksum do not fit in the output buffer
    InvalidLength,
}

/// A payload of up to `N` bytes with its checksum
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrcElement<const N: usize> {
    crc: u32,
    payload: ByteBuffer<N>,
}

impl<const N: usize> CrcElement<N> {
    /// Create an element with an empty payload
    pub fn new() -> Self {
        Self {
            crc: 0,
            payload: ByteBuffer::new(),
        }
    }

    /// Create an element holding a copy of `payload`
    pub fn with_payload(payload: &[u8]) -> Result<Self, IndexError> {
        let mut element = Self::new();
        overwrite(&mut element.payload, payload)?;
        Ok(element)
    }

    /// Checksum last written or parsed
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Compute the checksum an element carrying `payload` would have
    pub fn compute_body_crc<C: Checksum>(payload: &[u8], checksum: &mut C) -> u32 {
        checksum.compute(payload)
    }

    /// Compute the checksum and write `[crc][payload]` to `output`
    ///
    /// Fails without touching `output` if the body does not fit.
    pub fn write<C: Checksum, const M: usize>(
        &mut self,
        output: &mut ByteBuffer<M>,
        checksum: &mut C,
    ) -> Result<(), IndexError> {
        let crc = Self::compute_body_crc(&self.payload, checksum);
        write_body(crc, &self.payload, output)?;
        self.crc = crc;
        Ok(())
    }

    /// Read the checksum and payload from `input` without verifying them
    pub fn parse(&mut self, input: &[u8]) -> Result<(), IndexError> {
        if input.len() < PAYLOAD_OFFSET {
            return Err(IndexError::OutOfBounds);
        }

        overwrite(&mut self.payload, &input[PAYLOAD_OFFSET..])?;
        self.crc = u32::from_be_bytes([input[0], input[1], input[2], input[3]]);
        Ok(())
    }
}

fn write_body<const M: usize>(
    crc: u32,
    payload: &[u8],
    output: &mut ByteBuffer<M>,
) -> Result<(), IndexError> {
    if PAYLOAD_OFFSET + payload.len() > M {
        return Err(IndexError::OutOfBounds);
    }

    output.clear();
    output
        .extend_from_slice(&crc.to_be_bytes())
        .map_err(|_| IndexError::OutOfBounds)?;
    output
        .extend_from_slice(payload)
        .map_err(|_| IndexError::OutOfBounds)
}

/// Parses elements and checks their checksums
#[derive(Debug, Clone, Default)]
pub struct CrcReceiver<C: Checksum> {
    checksum: C,
}

impl<C: Checksum> CrcReceiver<C> {
    /// Create a receiver using `checksum`
    pub fn new(checksum: C) -> Self {
        Self { checksum }
    }

    /// Parse `input` into `element` and verify its checksum
    ///
    /// On [`CrcReceiveError::InvalidCrc`] the element still holds the parsed
    /// checksum and payload.
    pub fn transform<const N: usize>(
        &mut self,
        input: &[u8],
        element: &mut CrcElement<N>,
    ) -> Result<(), CrcReceiveError> {
        element
            .parse(input)
            .map_err(|_| CrcReceiveError::InvalidParse)?;

        let computed = CrcElement::<N>::compute_body_crc(element.payload(), &mut self.checksum);
        if computed != element.crc() {
            return Err(CrcReceiveError::InvalidCrc);
        }
        Ok(())
    }
}

/// Prefixes payloads with their checksum
#[derive(Debug, Clone, Default)]
pub struct CrcSender<C: Checksum> {
    checksum: C,
}

impl<C: Checksum> CrcSender<C> {
    /// Create a sender using `checksum`
    pub fn new(checksum: C) -> Self {
        Self { checksum }
    }

    /// Write `[crc][payload]` to `output`
    pub fn transform<const M: usize>(
        &mut self,
        payload: &[u8],
        output: &mut ByteBuffer<M>,
    ) -> Result<(), CrcSendError> {
        let crc = self.checksum.compute(payload);
        write_body(crc, payload, output).map_err(|_| CrcSendError::InvalidLength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32c_check_values() {
        let mut crc = Crc32c;
        assert_eq!(crc.compute(&[]), 0x0000_0000);
        assert_eq!(crc.compute(b"123456789"), 0xE306_9283);
        assert_eq!(crc.compute(&[0x00]), 0x527D_5351);
        assert_eq!(crc.compute(&[0x01]), 0xA016_D052);
    }

    #[test]
    fn test_write_element() {
        let mut element = CrcElement::<254>::with_payload(&[0x01, 0x02, 0x05]).unwrap();
        assert_eq!(element.crc(), 0);

        let mut output = ByteBuffer::<254>::new();
        element.write(&mut output, &mut Crc32c).unwrap();

        assert_eq!(element.crc(), 0xD791_15F6);
        assert_eq!(&output[..], &[0xD7, 0x91, 0x15, 0xF6, 0x01, 0x02, 0x05]);
    }

    #[test]
    fn test_write_empty_element() {
        let mut element = CrcElement::<254>::new();
        let mut output = ByteBuffer::<254>::new();
        element.write(&mut output, &mut Crc32c).unwrap();

        assert_eq!(&output[..], &[0x00, 0x00, 0x00, 0x00]);
        assert!(element.payload().is_empty());
    }

    #[test]
    fn test_write_too_small() {
        let mut element = CrcElement::<254>::with_payload(&[1, 2, 3]).unwrap();
        let mut output = ByteBuffer::<6>::new();

        assert_eq!(element.write(&mut output, &mut Crc32c), Err(IndexError::OutOfBounds));
        assert!(output.is_empty());
        assert_eq!(element.crc(), 0);
    }

    #[test]
    fn test_parse_short_body() {
        let mut element = CrcElement::<254>::new();
        assert_eq!(element.parse(&[0x98, 0xdb, 0xe3]), Err(IndexError::OutOfBounds));
        assert_eq!(element.crc(), 0);
    }

    #[test]
    fn test_parse_does_not_verify() {
        let mut element = CrcElement::<254>::with_payload(&[0x12, 0x13, 0x14]).unwrap();
        let body = [0x12, 0x34, 0x56, 0x78, 0x03, 0x04, 0x00, 0xed, 0x30, 0x00];
        element.parse(&body).unwrap();

        assert_eq!(element.crc(), 0x1234_5678);
        assert_eq!(element.payload(), &[0x03, 0x04, 0x00, 0xed, 0x30, 0x00]);
    }

    #[test]
    fn test_write_parse_round_trip() {
        let data = [0x01, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05];
        let mut element = CrcElement::<254>::with_payload(&data).unwrap();
        let mut output = ByteBuffer::<254>::new();
        element.write(&mut output, &mut Crc32c).unwrap();
        assert_eq!(element.crc(), 0x98DB_E355);

        let mut parsed = CrcElement::<254>::new();
        parsed.parse(&output).unwrap();
        assert_eq!(parsed, element);
    }

    #[test]
    fn test_receiver_accepts_valid_body() {
        let mut receiver = CrcReceiver::new(Crc32c);
        let mut element = CrcElement::<254>::new();
        let body = [
            0x44, 0xeb, 0x77, 0x5f, 0x01, 0x07, 0x07, 0x12, 0x36, 0x57, 0x66, 0x77, 0x18,
        ];

        assert_eq!(receiver.transform(&body, &mut element), Ok(()));
        assert_eq!(element.crc(), 0x44EB_775F);
        assert_eq!(element.payload(), &body[PAYLOAD_OFFSET..]);
    }

    #[test]
    fn test_receiver_short_body() {
        let mut receiver = CrcReceiver::new(Crc32c);
        let mut element = CrcElement::<254>::new();

        assert_eq!(receiver.transform(&[], &mut element), Err(CrcReceiveError::InvalidParse));
        assert_eq!(
            receiver.transform(&[0x00, 0x01], &mut element),
            Err(CrcReceiveError::InvalidParse)
        );
        assert_eq!(element.crc(), 0);
    }

    #[test]
    fn test_receiver_mismatch_keeps_parsed_fields() {
        let mut receiver = CrcReceiver::new(Crc32c);
        let mut element = CrcElement::<254>::new();
        let body = [0x12, 0x34, 0x56, 0x78, 0x01, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05];

        assert_eq!(receiver.transform(&body, &mut element), Err(CrcReceiveError::InvalidCrc));
        assert_eq!(element.crc(), 0x1234_5678);
        assert_eq!(element.payload(), &body[PAYLOAD_OFFSET..]);
    }

    #[test]
    fn test_receiver_payload_too_large() {
        let mut receiver = CrcReceiver::new(Crc32c);
        let mut element = CrcElement::<2>::new();

        assert_eq!(
            receiver.transform(&[0, 0, 0, 0, 1, 2, 3], &mut element),
            Err(CrcReceiveError::InvalidParse)
        );
    }

    #[test]
    fn test_sender() {
        let mut sender = CrcSender::new(Crc32c);
        let mut output = ByteBuffer::<254>::new();

        sender.transform(&[0x13, 0x03, 0x05, 0x06, 0x23], &mut output).unwrap();
        assert_eq!(
            &output[..],
            &[0x81, 0xfc, 0x34, 0x57, 0x13, 0x03, 0x05, 0x06, 0x23]
        );
    }

    #[test]
    fn test_sender_output_too_small() {
        let mut sender = CrcSender::new(Crc32c);
        let mut output = ByteBuffer::<14>::new();
        let payload = [0x81, 0xfc, 0x34, 0x57, 0x13, 0x03, 0x05, 0x06, 0x23, 0x01, 0x09];

        assert_eq!(
            sender.transform(&payload, &mut output),
            Err(CrcSendError::InvalidLength)
        );
    }
}
