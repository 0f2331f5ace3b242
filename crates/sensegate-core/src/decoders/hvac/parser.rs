use std::fmt;

use serde::Serialize;

use super::error::HvacError;
use super::layout::{self, DirectionLayout};
use super::reader::MessageReader;

/// Which bus endpoint sent the message. Selects the field-layout table;
/// any other marker byte is [`HvacError::UnknownDirection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    ControllerToUnits,
    UnitsToController,
}

impl Direction {
    fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            layout::MARKER_CONTROLLER_TO_UNITS => Some(Self::ControllerToUnits),
            layout::MARKER_UNITS_TO_CONTROLLER => Some(Self::UnitsToController),
            _ => None,
        }
    }

    fn layout(&self) -> &'static DirectionLayout {
        match self {
            Self::ControllerToUnits => &layout::CONTROLLER_TO_UNITS,
            Self::UnitsToController => &layout::UNITS_TO_CONTROLLER,
        }
    }
}

/// Operating mode from the mode bitmask. Bit patterns outside the known
/// set decode to `Unknown` with a warning; they occur on real hardware
/// and must not fail the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Cooling,
    Heating,
    Unknown,
}

impl Mode {
    fn from_bits(operation_mode: u8) -> Self {
        if operation_mode & layout::MODE_COOLING_BIT != 0 {
            return Self::Cooling;
        }
        if operation_mode & layout::MODE_HEATING_BIT != 0 {
            return Self::Heating;
        }
        log::warn!("unknown operation mode bits: {operation_mode:#04x}");
        Self::Unknown
    }

    /// Stable numeric id for metric sinks; `-1` for the sentinel.
    pub fn id(&self) -> i8 {
        match self {
            Self::Cooling => 1,
            Self::Heating => 2,
            Self::Unknown => -1,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cooling => "Cooling",
            Self::Heating => "Heating",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Fan speed from the fan bitmask, tested in priority order: low,
/// medium, high. The priority among overlapping bits follows the
/// captured traces and is a candidate for hardware-verified correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FanSpeed {
    Low,
    Medium,
    High,
    Unknown,
}

impl FanSpeed {
    fn from_bits(fan_speed: u8) -> Self {
        if fan_speed & layout::FAN_SPEED_LOW_BIT != 0 {
            return Self::Low;
        }
        if fan_speed & layout::FAN_SPEED_MEDIUM_BIT != 0 {
            return Self::Medium;
        }
        if fan_speed & layout::FAN_SPEED_HIGH_BIT != 0 {
            return Self::High;
        }
        log::warn!("unknown fan speed bits: {fan_speed:#04x}");
        Self::Unknown
    }

    /// Stable numeric id for metric sinks; `-1` for the sentinel.
    pub fn id(&self) -> i8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Unknown => -1,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// One decoded operating-state snapshot.
///
/// `error_code` is meaningful only for the units-to-controller
/// direction; the other direction carries none and reports zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HvacState {
    pub direction: Direction,
    pub running: bool,
    pub mode: Mode,
    pub fan_speed: FanSpeed,
    pub temperature_celsius: u8,
    pub test_mode: bool,
    pub error_code: u8,
}

/// Decode one hex-encoded bus message into an operating-state snapshot.
///
/// Validation order: hex decoding, direction marker (recoverable on
/// mismatch, regardless of the rest of the message), minimum length for
/// the direction's layout, XOR checksum, then field extraction.
pub fn decode(message: &str) -> Result<HvacState, HvacError> {
    let bytes = hex::decode(message)?;
    let reader = MessageReader::new(&bytes);

    let marker = reader.read_u8(layout::DIRECTION_OFFSET)?;
    let direction =
        Direction::from_marker(marker).ok_or(HvacError::UnknownDirection { marker })?;
    let direction_layout = direction.layout();
    reader.require_len(direction_layout.min_len())?;

    let (computed, carried) = reader.xor_checksum()?;
    if computed != carried {
        return Err(HvacError::InvalidChecksum { computed, carried });
    }

    let operation_mode = reader.read_u8(layout::OPERATION_MODE_OFFSET)?;
    let running = operation_mode & layout::RUNNING_BIT != 0;
    let mode = Mode::from_bits(operation_mode);
    let fan_speed = FanSpeed::from_bits(reader.read_u8(layout::FAN_SPEED_OFFSET)?);
    let temperature_celsius = reader.read_u8(layout::TEMPERATURE_OFFSET)?;
    let test_mode =
        reader.read_u8(direction_layout.test_mode_offset)? & direction_layout.test_mode_mask != 0;
    let error_code = match direction_layout.error_code_offset {
        Some(offset) => reader.read_u8(offset)?,
        None => 0,
    };

    Ok(HvacState {
        direction,
        running,
        mode,
        fan_speed,
        temperature_celsius,
        test_mode,
        error_code,
    })
}
