use serde::Serialize;

use super::error::MiBeaconError;
use super::layout;
use super::reader::FrameReader;

/// One typed sensor event, keyed by the event-type code on the wire.
///
/// The set is closed: a code outside the table below is
/// [`MiBeaconError::UnknownEventType`], never a silently-dropped variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    /// Signed, 0.1 °C resolution on the wire.
    Temperature { celsius: f64 },
    /// Unsigned, 0.1 % resolution on the wire.
    Humidity { percent: f64 },
    /// Unsigned, composed from three little-endian bytes, 0.01 lux units.
    Illuminance { lux_hundredths: u32 },
    Moisture { percent: u8 },
    /// Raw signed sensor value (µS/cm scale is device-specific).
    Fertility { raw: i16 },
    Battery { percent: u8 },
    TemperatureAndHumidity { celsius: f64, humidity_percent: f64 },
}

pub(crate) fn parse_event(
    event_type: u16,
    reader: &mut FrameReader<'_>,
) -> Result<Event, MiBeaconError> {
    match event_type {
        layout::EVENT_TEMPERATURE => Ok(Event::Temperature {
            celsius: f64::from(reader.read_i16_le()?) / 10.0,
        }),
        layout::EVENT_HUMIDITY => Ok(Event::Humidity {
            percent: f64::from(reader.read_u16_le()?) / 10.0,
        }),
        layout::EVENT_ILLUMINANCE => Ok(Event::Illuminance {
            lux_hundredths: reader.read_u24_le()?,
        }),
        layout::EVENT_MOISTURE => Ok(Event::Moisture {
            percent: reader.read_u8()?,
        }),
        layout::EVENT_FERTILITY => Ok(Event::Fertility {
            raw: reader.read_i16_le()?,
        }),
        layout::EVENT_BATTERY => Ok(Event::Battery {
            percent: reader.read_u8()?,
        }),
        layout::EVENT_TEMPERATURE_AND_HUMIDITY => Ok(Event::TemperatureAndHumidity {
            celsius: f64::from(reader.read_i16_le()?) / 10.0,
            humidity_percent: f64::from(reader.read_u16_le()?) / 10.0,
        }),
        other => Err(MiBeaconError::UnknownEventType { event_type: other }),
    }
}
