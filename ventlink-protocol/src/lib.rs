//! Ventilator Serial Link Protocol
//!
//! This crate implements the layered protocol between the ventilator's
//! control microcontroller and its companion computer. Every layer works on
//! fixed-capacity buffers, never allocates, and reports failures without
//! partially writing its output.
//!
//! # Protocol Overview
//!
//! Each frame on the wire nests the layers like this:
//! ```text
//! ┌─────────────────────────────────────────────────────┬───────┐
//! │ COBS( CRC │ SEQ │ LEN │ TAG │ BODY )                │ 0x00  │
//! │       4B  │ 1B  │ 1B  │ 1B  │ 0–247B                │ 1B    │
//! └─────────────────────────────────────────────────────┴───────┘
//! ```
//!
//! - [`frames`]: COBS byte stuffing and `0x00` delimiting ([`cobs`], [`chunks`])
//! - [`crc`]: big-endian CRC-32C over the datagram
//! - [`datagrams`]: rolling sequence number and length
//! - [`messages`]: type tag and record body
//! - [`states`]: schedule-driven output and inbound state updates

#![no_std]
#![deny(unsafe_code)]

pub mod chunks;
pub mod cobs;
pub mod crc;
pub mod datagrams;
pub mod frames;
pub mod messages;
pub mod states;
pub mod status;

pub use chunks::{ChunkError, ChunkInputStatus, ChunkMerger, ChunkSplitter};
pub use cobs::CobsError;
pub use crc::{Checksum, Crc32c, CrcElement, CrcReceiveError, CrcReceiver, CrcSendError, CrcSender};
pub use datagrams::{Datagram, DatagramReceiveError, DatagramReceiver, DatagramSendError, DatagramSender};
pub use frames::{FrameError, FrameReceiver, FrameSender};
pub use messages::{
    CodecError, Message, MessageError, MessageReceiveError, MessageReceiver, MessageSendError,
    MessageSender, TaggedUnion,
};
pub use states::{ScheduleEntry, StateStore, StateSynchronizer, SyncError};
pub use status::{ByteBuffer, IndexError, OutputStatus};
