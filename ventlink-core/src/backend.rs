//! Backend link stack
//!
//! Composes every protocol layer for the link to the companion computer:
//!
//! ```text
//! receive: byte -> FrameReceiver -> CrcReceiver -> MessageReceiver -> States
//! send:    States -> StateSynchronizer -> MessageSender -> CrcSender -> FrameSender
//! ```

use ventlink_protocol::crc::CRC_SIZE;
use ventlink_protocol::datagrams::HEADER_SIZE;
use ventlink_protocol::{
    ByteBuffer, ChunkInputStatus, Checksum, CrcElement, CrcReceiveError, CrcReceiver,
    CrcSendError, CrcSender, DatagramReceiveError, FrameError, FrameReceiver, FrameSender, Message,
    MessageReceiveError, MessageReceiver, MessageSendError, MessageSender, OutputStatus,
    ScheduleEntry, StateSynchronizer, SyncError,
};

use crate::schedule::STATE_SYNC_SCHEDULE;
use crate::states::{MessageType, StateSegment, States};

/// Largest byte-stuffed chunk, delimiter excluded
pub const CHUNK_MAX_SIZE: usize = 256;

/// Largest complete frame on the wire, delimiter included
pub const FRAME_MAX_SIZE: usize = CHUNK_MAX_SIZE + 1;

/// Largest unstuffed frame payload
pub const FRAME_PAYLOAD_MAX_SIZE: usize = CHUNK_MAX_SIZE - 2;

/// Largest CRC element
pub const CRC_ELEMENT_MAX_SIZE: usize = FRAME_PAYLOAD_MAX_SIZE;

/// Largest datagram
pub const DATAGRAM_MAX_SIZE: usize = CRC_ELEMENT_MAX_SIZE - CRC_SIZE;

/// Largest message
pub const MESSAGE_MAX_SIZE: usize = DATAGRAM_MAX_SIZE - HEADER_SIZE;

/// Message exchanged with the companion computer
pub type BackendMessage = Message<StateSegment>;

/// Buffer holding one complete outgoing frame
pub type FrameBuffer = ByteBuffer<FRAME_MAX_SIZE>;

/// Errors reported while receiving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackendError {
    Frame(FrameError),
    Crc(CrcReceiveError),
    Message(MessageReceiveError),
    Sync(SyncError),
}

/// Errors reported while sending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackendSendError {
    Sync(SyncError),
    Message(MessageSendError),
    Crc(CrcSendError),
    Frame(FrameError),
}

impl From<MessageSendError> for BackendSendError {
    fn from(err: MessageSendError) -> Self {
        BackendSendError::Message(err)
    }
}

impl From<CrcSendError> for BackendSendError {
    fn from(err: CrcSendError) -> Self {
        BackendSendError::Crc(err)
    }
}

impl From<FrameError> for BackendSendError {
    fn from(err: FrameError) -> Self {
        BackendSendError::Frame(err)
    }
}

/// Receives messages from the serial byte stream
#[derive(Debug, Clone)]
pub struct BackendReceiver<C: Checksum> {
    frame: FrameReceiver<CHUNK_MAX_SIZE>,
    crc: CrcReceiver<C>,
    message: MessageReceiver<MESSAGE_MAX_SIZE>,
}

impl<C: Checksum> BackendReceiver<C> {
    pub fn new(checksum: C) -> Self {
        Self {
            frame: FrameReceiver::new(),
            crc: CrcReceiver::new(checksum),
            message: MessageReceiver::new(0),
        }
    }

    /// Feed a single byte from the serial link
    pub fn input(&mut self, byte: u8) -> Result<ChunkInputStatus, BackendError> {
        self.frame.input(byte).map_err(BackendError::Frame)
    }

    /// Decode the completed frame into `message`
    ///
    /// A datagram that skipped sequence numbers is still delivered.
    pub fn output(&mut self, message: &mut BackendMessage) -> Result<OutputStatus, BackendError> {
        let mut body = ByteBuffer::<FRAME_PAYLOAD_MAX_SIZE>::new();
        let status = self.frame.output(&mut body).map_err(|err| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Dropped frame: {:?}", err);
            BackendError::Frame(err)
        })?;
        if !status.is_available() {
            return Ok(OutputStatus::Waiting);
        }

        let mut element = CrcElement::<DATAGRAM_MAX_SIZE>::new();
        self.crc.transform(&body, &mut element).map_err(|err| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Dropped datagram: {:?}", err);
            BackendError::Crc(err)
        })?;

        match self.message.transform(element.payload(), message) {
            Ok(()) => {}
            Err(MessageReceiveError::Datagram(DatagramReceiveError::InvalidSequence)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Sequence resynchronized to {}",
                    self.message.datagram().seq()
                );
            }
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Dropped message: {:?}", err);
                return Err(BackendError::Message(err));
            }
        }
        Ok(OutputStatus::Available)
    }
}

/// Turns messages into frames for the serial link
#[derive(Debug, Clone)]
pub struct BackendSender<C: Checksum> {
    message: MessageSender<MESSAGE_MAX_SIZE>,
    crc: CrcSender<C>,
    frame: FrameSender,
}

impl<C: Checksum> BackendSender<C> {
    pub fn new(checksum: C) -> Self {
        Self {
            message: MessageSender::new(0),
            crc: CrcSender::new(checksum),
            frame: FrameSender::new(),
        }
    }

    /// Sequence number the next frame will carry
    pub fn next_seq(&self) -> u8 {
        self.message.next_seq()
    }

    /// Write `message` as one complete frame, delimiter included
    pub fn transform(
        &mut self,
        message: &BackendMessage,
        output: &mut FrameBuffer,
    ) -> Result<(), BackendSendError> {
        let mut datagram = ByteBuffer::<DATAGRAM_MAX_SIZE>::new();
        self.message.transform(message, &mut datagram)?;

        let mut element = ByteBuffer::<CRC_ELEMENT_MAX_SIZE>::new();
        self.crc.transform(&datagram, &mut element)?;

        self.frame.transform(&element, output)?;
        Ok(())
    }
}

/// Full backend link: receiving, sending and state synchronization
///
/// The [`States`] aggregate is passed into each call, so other tasks can
/// update it between ticks.
#[derive(Debug, Clone)]
pub struct Backend<'a, C: Checksum> {
    receiver: BackendReceiver<C>,
    sender: BackendSender<C>,
    synchronizer: StateSynchronizer<'a, MessageType>,
}

impl<C: Checksum + Clone> Backend<'static, C> {
    /// Create a backend using [`STATE_SYNC_SCHEDULE`]
    pub fn new(checksum: C) -> Self {
        Self::with_schedule(checksum, &STATE_SYNC_SCHEDULE)
    }
}

impl<'a, C: Checksum + Clone> Backend<'a, C> {
    /// Create a backend with a custom output schedule
    pub fn with_schedule(checksum: C, schedule: &'a [ScheduleEntry<MessageType>]) -> Self {
        Self {
            receiver: BackendReceiver::new(checksum.clone()),
            sender: BackendSender::new(checksum),
            synchronizer: StateSynchronizer::new(schedule),
        }
    }

    /// Feed a byte from the serial link
    ///
    /// Returns `Ok(OutputStatus::Available)` once a complete message has
    /// been stored into `states`.
    pub fn input(&mut self, states: &mut States, byte: u8) -> Result<OutputStatus, BackendError> {
        if self.receiver.input(byte)? != ChunkInputStatus::OutputReady {
            return Ok(OutputStatus::Waiting);
        }

        let mut message = BackendMessage::new();
        if !self.receiver.output(&mut message)?.is_available() {
            return Ok(OutputStatus::Waiting);
        }

        self.synchronizer
            .input(states, &message)
            .map_err(BackendError::Sync)?;
        Ok(OutputStatus::Available)
    }

    /// Advance the scheduling clock
    pub fn update_clock(&mut self, time: u32) {
        self.synchronizer.input_time(time);
    }

    /// Write the next scheduled record into `output` as a frame
    pub fn output(
        &mut self,
        states: &States,
        output: &mut FrameBuffer,
    ) -> Result<OutputStatus, BackendSendError> {
        let mut message = BackendMessage::new();
        let status = self
            .synchronizer
            .output(states, &mut message)
            .map_err(BackendSendError::Sync)?;
        if !status.is_available() {
            return Ok(OutputStatus::Waiting);
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("Sending {}", message.tag().name());
        self.sender.transform(&message, output)?;
        Ok(OutputStatus::Available)
    }
}
