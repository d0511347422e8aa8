//! Application state records
//!
//! Each record is one message type on the link. Bodies are encoded with
//! postcard, so field order is part of the wire format.

use heapless::Vec;
use serde::{Deserialize, Serialize};

/// Maximum announcement length in bytes
pub const MAX_ANNOUNCEMENT_LEN: usize = 64;

/// Ventilation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VentilationMode {
    /// Pressure control, assist control
    #[default]
    PcAc,
    /// Pressure control, synchronized intermittent mandatory ventilation
    PcSimv,
    /// Volume control, assist control
    VcAc,
    /// Volume control, synchronized intermittent mandatory ventilation
    VcSimv,
    /// Pressure support ventilation
    Psv,
    /// Non-invasive ventilation
    Niv,
    /// High-flow nasal cannula
    Hfnc,
}

/// Active alarm flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarms {
    /// Time of last update (ms)
    pub time: u32,
    pub alarm_one: bool,
    pub alarm_two: bool,
}

/// Continuously sampled sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorMeasurements {
    /// Time of sampling (ms)
    pub time: u32,
    /// Breath cycle counter
    pub cycle: u32,
    /// Airway pressure (cm H2O)
    pub paw: f32,
    /// Flow (L/min)
    pub flow: f32,
    /// Volume (mL)
    pub volume: f32,
    /// Fraction of inspired oxygen (%)
    pub fio2: f32,
    /// Oxygen saturation (%)
    pub spo2: f32,
    /// Heart rate (bpm)
    pub hr: f32,
}

/// Measurements summarizing the last breath cycle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleMeasurements {
    /// Time of cycle end (ms)
    pub time: u32,
    /// Tidal volume (mL)
    pub vt: f32,
    /// Respiratory rate (breaths/min)
    pub rr: f32,
    /// Positive end-expiratory pressure (cm H2O)
    pub peep: f32,
    /// Peak inspiratory pressure (cm H2O)
    pub pip: f32,
    /// Inspiratory pressure (cm H2O)
    pub ip: f32,
    /// Minute ventilation (L/min)
    pub ve: f32,
}

/// Ventilation parameters in effect
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Parameters {
    /// Time of last change (ms)
    pub time: u32,
    pub ventilating: bool,
    pub mode: VentilationMode,
    /// Peak inspiratory pressure (cm H2O)
    pub pip: f32,
    /// Positive end-expiratory pressure (cm H2O)
    pub peep: f32,
    /// Tidal volume (mL)
    pub vt: f32,
    /// Respiratory rate (breaths/min)
    pub rr: f32,
    /// Inspiratory:expiratory ratio
    pub ie: f32,
    /// Fraction of inspired oxygen (%)
    pub fio2: f32,
    /// Flow (L/min)
    pub flow: f32,
}

/// Ventilation parameters requested by the companion computer
///
/// Same layout as [`Parameters`]; the controller decides what to apply.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParametersRequest {
    pub time: u32,
    pub ventilating: bool,
    pub mode: VentilationMode,
    pub pip: f32,
    pub peep: f32,
    pub vt: f32,
    pub rr: f32,
    pub ie: f32,
    pub fio2: f32,
    pub flow: f32,
}

/// Link liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ping {
    pub time: u32,
    pub id: u32,
}

/// Free-form announcement bytes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Announcement {
    pub time: u32,
    pub announcement: Vec<u8, MAX_ANNOUNCEMENT_LEN>,
}
