//! Message types and the tagged union of state records

use serde::{Deserialize, Serialize};
use ventlink_protocol::{CodecError, TaggedUnion};

use super::records::{
    Alarms, Announcement, CycleMeasurements, Parameters, ParametersRequest, Ping,
    SensorMeasurements,
};

/// Message type tag
///
/// Tag values are fixed by the wire format; `0` is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    #[default]
    Unrecognized,
    Alarms,
    SensorMeasurements,
    CycleMeasurements,
    Parameters,
    ParametersRequest,
    Ping,
    Announcement,
}

impl MessageType {
    /// Convert from the wire byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => MessageType::Alarms,
            2 => MessageType::SensorMeasurements,
            3 => MessageType::CycleMeasurements,
            4 => MessageType::Parameters,
            5 => MessageType::ParametersRequest,
            6 => MessageType::Ping,
            7 => MessageType::Announcement,
            _ => MessageType::Unrecognized,
        }
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            MessageType::Unrecognized => 0,
            MessageType::Alarms => 1,
            MessageType::SensorMeasurements => 2,
            MessageType::CycleMeasurements => 3,
            MessageType::Parameters => 4,
            MessageType::ParametersRequest => 5,
            MessageType::Ping => 6,
            MessageType::Announcement => 7,
        }
    }

    /// Short name for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            MessageType::Unrecognized => "unrecognized",
            MessageType::Alarms => "alarms",
            MessageType::SensorMeasurements => "sensor_measurements",
            MessageType::CycleMeasurements => "cycle_measurements",
            MessageType::Parameters => "parameters",
            MessageType::ParametersRequest => "parameters_request",
            MessageType::Ping => "ping",
            MessageType::Announcement => "announcement",
        }
    }
}

impl From<u8> for MessageType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<MessageType> for u8 {
    fn from(tag: MessageType) -> Self {
        tag.to_byte()
    }
}

/// One record of application state, selected by its message type
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateSegment {
    Alarms(Alarms),
    SensorMeasurements(SensorMeasurements),
    CycleMeasurements(CycleMeasurements),
    Parameters(Parameters),
    ParametersRequest(ParametersRequest),
    Ping(Ping),
    Announcement(Announcement),
}

impl TaggedUnion for StateSegment {
    type Tag = MessageType;
    const UNRECOGNIZED: MessageType = MessageType::Unrecognized;

    fn tag(&self) -> MessageType {
        match self {
            StateSegment::Alarms(_) => MessageType::Alarms,
            StateSegment::SensorMeasurements(_) => MessageType::SensorMeasurements,
            StateSegment::CycleMeasurements(_) => MessageType::CycleMeasurements,
            StateSegment::Parameters(_) => MessageType::Parameters,
            StateSegment::ParametersRequest(_) => MessageType::ParametersRequest,
            StateSegment::Ping(_) => MessageType::Ping,
            StateSegment::Announcement(_) => MessageType::Announcement,
        }
    }

    fn encode_body(&self, output: &mut [u8]) -> Result<usize, CodecError> {
        let used = match self {
            StateSegment::Alarms(record) => postcard::to_slice(record, output),
            StateSegment::SensorMeasurements(record) => postcard::to_slice(record, output),
            StateSegment::CycleMeasurements(record) => postcard::to_slice(record, output),
            StateSegment::Parameters(record) => postcard::to_slice(record, output),
            StateSegment::ParametersRequest(record) => postcard::to_slice(record, output),
            StateSegment::Ping(record) => postcard::to_slice(record, output),
            StateSegment::Announcement(record) => postcard::to_slice(record, output),
        }
        .map_err(|err| match err {
            postcard::Error::SerializeBufferFull => CodecError::BufferFull,
            _ => CodecError::Malformed,
        })?;
        Ok(used.len())
    }

    fn decode_body(tag: MessageType, input: &[u8]) -> Result<Self, CodecError> {
        match tag {
            MessageType::Alarms => decode(input).map(StateSegment::Alarms),
            MessageType::SensorMeasurements => decode(input).map(StateSegment::SensorMeasurements),
            MessageType::CycleMeasurements => decode(input).map(StateSegment::CycleMeasurements),
            MessageType::Parameters => decode(input).map(StateSegment::Parameters),
            MessageType::ParametersRequest => decode(input).map(StateSegment::ParametersRequest),
            MessageType::Ping => decode(input).map(StateSegment::Ping),
            MessageType::Announcement => decode(input).map(StateSegment::Announcement),
            MessageType::Unrecognized => Err(CodecError::Malformed),
        }
    }
}

/// Decode a whole record body; trailing bytes are malformed
fn decode<'de, R: Deserialize<'de>>(input: &'de [u8]) -> Result<R, CodecError> {
    let (record, rest) = postcard::take_from_bytes(input).map_err(|_| CodecError::Malformed)?;
    if !rest.is_empty() {
        return Err(CodecError::Malformed);
    }
    Ok(record)
}
