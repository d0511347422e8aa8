//! Output schedule for state synchronization

use ventlink_protocol::ScheduleEntry;

use crate::states::MessageType;

/// Ticks between scheduled outputs
pub const OUTPUT_INTERVAL: u32 = 10;

/// Order in which records are sent to the companion computer
///
/// Sensor measurements go out three times per cycle and alarms twice.
pub static STATE_SYNC_SCHEDULE: [ScheduleEntry<MessageType>; 9] = [
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::SensorMeasurements),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::Parameters),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::Alarms),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::SensorMeasurements),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::Ping),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::Alarms),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::SensorMeasurements),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::ParametersRequest),
    ScheduleEntry::new(OUTPUT_INTERVAL, MessageType::CycleMeasurements),
];
