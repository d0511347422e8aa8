//! Ventilator side of the companion computer link
//!
//! This crate contains the application layer on top of `ventlink-protocol`:
//!
//! - State record types and the message type tags
//! - The [`States`] aggregate shared with sensor and control tasks
//! - The fixed output schedule
//! - The backend stack composing every protocol layer
//!
//! The physical transport is not handled here: bytes are pushed in and
//! frames are taken out by the caller's UART task.

#![no_std]
#![deny(unsafe_code)]

pub mod backend;
pub mod schedule;
pub mod states;

pub use backend::{
    Backend, BackendError, BackendMessage, BackendReceiver, BackendSendError, BackendSender,
    FrameBuffer,
};
pub use schedule::STATE_SYNC_SCHEDULE;
pub use states::{MessageType, StateSegment, States};
