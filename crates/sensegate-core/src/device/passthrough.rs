use serde_json::json;

use super::{Device, DeviceConfig, DeviceError};
use crate::DeviceData;

pub(crate) const DEVICE_TYPE: &str = "passthrough";

/// Forwards every message unchanged, annotated with the configured
/// device identity. Useful for wiring sinks before a real adapter
/// exists.
struct Passthrough {
    config: DeviceConfig,
}

pub(crate) fn factory(config: &DeviceConfig) -> Result<Box<dyn Device>, DeviceError> {
    Ok(Box::new(Passthrough {
        config: config.clone(),
    }))
}

impl Device for Passthrough {
    fn decode(&self, data: &DeviceData) -> Result<Option<DeviceData>, DeviceError> {
        let mut properties = data.properties.clone();
        properties.insert("deviceName".to_string(), json!(self.config.name));
        properties.insert("deviceType".to_string(), json!(self.config.device_type));
        properties.insert(
            "deviceProperties".to_string(),
            json!(self.config.properties),
        );
        properties.insert(
            "value".to_string(),
            json!(String::from_utf8_lossy(&data.payload)),
        );
        Ok(Some(DeviceData::with_properties(
            data.payload.clone(),
            properties,
        )))
    }
}
