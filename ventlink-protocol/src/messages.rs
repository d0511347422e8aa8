//! Typed messages carried in datagram payloads
//!
//! Message format:
//! - TAG (1 byte): record type, `0` is reserved for unrecognized
//! - BODY (0-N bytes): type-specific encoding of the record
//!
//! The set of record types is a closed [`TaggedUnion`] defined by the
//! application; its codec dispatches on the tag with a `match`.

use crate::datagrams::{
    Datagram, DatagramReceiveError, DatagramReceiver, DatagramSendError, DatagramSender,
};
use crate::status::{overwrite, ByteBuffer};

/// Offset of the type tag within a message
pub const TAG_OFFSET: usize = 0;

/// Offset of the record body within a message
pub const BODY_OFFSET: usize = 1;

/// Errors reported by a record codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Output buffer cannot hold the encoded record
    BufferFull,
    /// Input is not a valid encoding of the record
    Malformed,
}

/// A closed set of records distinguished by a one-byte tag
pub trait TaggedUnion: Sized {
    /// Record type tag; unknown bytes convert to [`Self::UNRECOGNIZED`]
    type Tag: Copy + Eq + core::fmt::Debug + From<u8> + Into<u8>;

    /// Reserved tag that never identifies a record
    const UNRECOGNIZED: Self::Tag;

    /// Tag of this record
    fn tag(&self) -> Self::Tag;

    /// Encode the record body into `output`, returning the bytes written
    fn encode_body(&self, output: &mut [u8]) -> Result<usize, CodecError>;

    /// Decode a record body of type `tag`
    fn decode_body(tag: Self::Tag, input: &[u8]) -> Result<Self, CodecError>;
}

/// Errors that can occur while writing or parsing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Buffer is empty or too small for the tag and body
    InvalidLength,
    /// Tag is unrecognized or does not match the record
    InvalidType,
    /// Record body failed to encode or decode
    InvalidEncoding,
}

/// Errors reported when receiving a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageReceiveError {
    Datagram(DatagramReceiveError),
    Message(MessageError),
}

/// Errors reported when sending a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageSendError {
    Message(MessageError),
    Datagram(DatagramSendError),
}

impl From<MessageError> for MessageSendError {
    fn from(err: MessageError) -> Self {
        MessageSendError::Message(err)
    }
}

impl From<DatagramSendError> for MessageSendError {
    fn from(err: DatagramSendError) -> Self {
        MessageSendError::Datagram(err)
    }
}

/// A type tag and the record it selects
///
/// Reused across parses: every parse replaces both the tag and the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<T: TaggedUnion> {
    tag: T::Tag,
    payload: Option<T>,
}

impl<T: TaggedUnion> Default for Message<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TaggedUnion> Message<T> {
    /// Create an unrecognized message with no record
    pub fn new() -> Self {
        Self {
            tag: T::UNRECOGNIZED,
            payload: None,
        }
    }

    /// Create a message carrying `payload`
    pub fn from_payload(payload: T) -> Self {
        Self {
            tag: payload.tag(),
            payload: Some(payload),
        }
    }

    /// Replace the record and set the tag to match it
    pub fn set(&mut self, payload: T) {
        self.tag = payload.tag();
        self.payload = Some(payload);
    }

    /// Tag last set or parsed
    pub fn tag(&self) -> T::Tag {
        self.tag
    }

    /// The record, if the tag is recognized and selects it
    pub fn payload(&self) -> Option<&T> {
        self.payload
            .as_ref()
            .filter(|payload| self.tag != T::UNRECOGNIZED && payload.tag() == self.tag)
    }

    /// Take the record out of the message
    pub fn take_payload(&mut self) -> Option<T> {
        let payload = self.payload.take()?;
        if self.tag != T::UNRECOGNIZED && payload.tag() == self.tag {
            Some(payload)
        } else {
            None
        }
    }

    /// Write `[tag][body]` to `output`, replacing its contents
    ///
    /// Fails without touching `output`.
    pub fn write<const N: usize>(&self, output: &mut ByteBuffer<N>) -> Result<(), MessageError> {
        let payload = self.payload().ok_or(MessageError::InvalidType)?;
        if N < BODY_OFFSET {
            return Err(MessageError::InvalidLength);
        }

        let mut scratch = [0u8; N];
        scratch[TAG_OFFSET] = self.tag.into();
        let body_len = payload
            .encode_body(&mut scratch[BODY_OFFSET..])
            .map_err(|err| match err {
                CodecError::BufferFull => MessageError::InvalidLength,
                CodecError::Malformed => MessageError::InvalidEncoding,
            })?;

        overwrite(output, &scratch[..BODY_OFFSET + body_len])
            .map_err(|_| MessageError::InvalidLength)
    }

    /// Read the tag and decode the record from `input`
    ///
    /// An unknown tag leaves the message unrecognized; a body that fails to
    /// decode keeps the tag but clears the record.
    pub fn parse(&mut self, input: &[u8]) -> Result<(), MessageError> {
        let Some(&tag_byte) = input.get(TAG_OFFSET) else {
            return Err(MessageError::InvalidLength);
        };

        self.tag = T::Tag::from(tag_byte);
        self.payload = None;
        if self.tag == T::UNRECOGNIZED {
            return Err(MessageError::InvalidType);
        }

        let payload = T::decode_body(self.tag, &input[BODY_OFFSET..])
            .map_err(|_| MessageError::InvalidEncoding)?;
        self.payload = Some(payload);
        Ok(())
    }
}

/// Receives messages of up to `N` bytes carried in datagrams
#[derive(Debug, Clone, Default)]
pub struct MessageReceiver<const N: usize> {
    receiver: DatagramReceiver,
    datagram: Datagram<N>,
}

impl<const N: usize> MessageReceiver<N> {
    /// Create a receiver expecting sequence number `expected_seq` next
    pub fn new(expected_seq: u8) -> Self {
        Self {
            receiver: DatagramReceiver::new(expected_seq),
            datagram: Datagram::new(),
        }
    }

    /// Sequence number expected for the next datagram
    pub fn expected_seq(&self) -> u8 {
        self.receiver.expected_seq()
    }

    /// The last datagram received
    pub fn datagram(&self) -> &Datagram<N> {
        &self.datagram
    }

    /// Parse a datagram body and decode its message into `message`
    ///
    /// On a sequence mismatch the message is still decoded before
    /// `Datagram(InvalidSequence)` is reported.
    pub fn transform<T: TaggedUnion>(
        &mut self,
        input: &[u8],
        message: &mut Message<T>,
    ) -> Result<(), MessageReceiveError> {
        let sequence = match self.receiver.transform(input, &mut self.datagram) {
            Ok(()) => Ok(()),
            Err(err @ DatagramReceiveError::InvalidSequence) => Err(err),
            Err(err) => return Err(MessageReceiveError::Datagram(err)),
        };

        message
            .parse(self.datagram.payload())
            .map_err(MessageReceiveError::Message)?;
        sequence.map_err(MessageReceiveError::Datagram)
    }
}

/// Sends messages of up to `N` bytes as datagrams
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageSender<const N: usize> {
    sender: DatagramSender,
}

impl<const N: usize> MessageSender<N> {
    /// Create a sender whose first datagram carries `next_seq`
    pub fn new(next_seq: u8) -> Self {
        Self {
            sender: DatagramSender::new(next_seq),
        }
    }

    /// Sequence number the next datagram will carry
    pub fn next_seq(&self) -> u8 {
        self.sender.next_seq()
    }

    /// Write `message` as the next datagram in sequence
    pub fn transform<T: TaggedUnion, const M: usize>(
        &mut self,
        message: &Message<T>,
        output: &mut ByteBuffer<M>,
    ) -> Result<(), MessageSendError> {
        let mut body = ByteBuffer::<N>::new();
        message.write(&mut body)?;
        self.sender.transform(&body, output)?;
        Ok(())
    }
}
