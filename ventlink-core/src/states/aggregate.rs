//! Application state aggregate shared with the link

use ventlink_protocol::StateStore;

use super::records::{
    Alarms, Announcement, CycleMeasurements, Parameters, ParametersRequest, Ping,
    SensorMeasurements,
};
use super::segment::{MessageType, StateSegment};

/// Latest value of every record exchanged over the link
///
/// Producers and consumers outside the link read and write records through
/// the accessors; the synchronizer goes through [`StateStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct States {
    alarms: Alarms,
    sensor_measurements: SensorMeasurements,
    cycle_measurements: CycleMeasurements,
    parameters: Parameters,
    parameters_request: ParametersRequest,
    ping: Ping,
    announcement: Announcement,
}

impl States {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alarms(&self) -> &Alarms {
        &self.alarms
    }

    pub fn set_alarms(&mut self, alarms: Alarms) {
        self.alarms = alarms;
    }

    pub fn sensor_measurements(&self) -> &SensorMeasurements {
        &self.sensor_measurements
    }

    pub fn set_sensor_measurements(&mut self, sensor_measurements: SensorMeasurements) {
        self.sensor_measurements = sensor_measurements;
    }

    pub fn cycle_measurements(&self) -> &CycleMeasurements {
        &self.cycle_measurements
    }

    pub fn set_cycle_measurements(&mut self, cycle_measurements: CycleMeasurements) {
        self.cycle_measurements = cycle_measurements;
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: Parameters) {
        self.parameters = parameters;
    }

    pub fn parameters_request(&self) -> &ParametersRequest {
        &self.parameters_request
    }

    pub fn set_parameters_request(&mut self, parameters_request: ParametersRequest) {
        self.parameters_request = parameters_request;
    }

    pub fn ping(&self) -> &Ping {
        &self.ping
    }

    pub fn set_ping(&mut self, ping: Ping) {
        self.ping = ping;
    }

    pub fn announcement(&self) -> &Announcement {
        &self.announcement
    }

    pub fn set_announcement(&mut self, announcement: Announcement) {
        self.announcement = announcement;
    }

    /// Current record of the given type, as a segment
    pub fn segment(&self, tag: MessageType) -> Option<StateSegment> {
        let segment = match tag {
            MessageType::Alarms => StateSegment::Alarms(self.alarms),
            MessageType::SensorMeasurements => {
                StateSegment::SensorMeasurements(self.sensor_measurements)
            }
            MessageType::CycleMeasurements => {
                StateSegment::CycleMeasurements(self.cycle_measurements)
            }
            MessageType::Parameters => StateSegment::Parameters(self.parameters),
            MessageType::ParametersRequest => {
                StateSegment::ParametersRequest(self.parameters_request)
            }
            MessageType::Ping => StateSegment::Ping(self.ping),
            MessageType::Announcement => StateSegment::Announcement(self.announcement.clone()),
            MessageType::Unrecognized => return None,
        };
        Some(segment)
    }

    /// Replace the record of the segment's type
    pub fn set_segment(&mut self, segment: &StateSegment) {
        match segment {
            StateSegment::Alarms(record) => self.alarms = *record,
            StateSegment::SensorMeasurements(record) => self.sensor_measurements = *record,
            StateSegment::CycleMeasurements(record) => self.cycle_measurements = *record,
            StateSegment::Parameters(record) => self.parameters = *record,
            StateSegment::ParametersRequest(record) => self.parameters_request = *record,
            StateSegment::Ping(record) => self.ping = *record,
            StateSegment::Announcement(record) => self.announcement = record.clone(),
        }
    }
}

impl StateStore<StateSegment> for States {
    fn input(&mut self, record: &StateSegment) {
        self.set_segment(record);
    }

    fn output(&self, tag: MessageType) -> Option<StateSegment> {
        self.segment(tag)
    }
}
