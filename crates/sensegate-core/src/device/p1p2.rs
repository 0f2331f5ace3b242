use serde_json::json;

use super::{Device, DeviceConfig, DeviceError};
use crate::DeviceData;
use crate::decoders::hvac::{self, HvacError};

pub(crate) const DEVICE_TYPE: &str = "p1p2";

const ALLOWED_PREFIXES_PROPERTY: &str = "allowedPrefixes";
const INPUT_TOPIC_PROPERTY: &str = "inputTopic";

/// HVAC bus adapter fed by a P1/P2 monitor bridge. The bridge publishes
/// text lines of the form `R <date> <time> <marker> [<rssi>:] <hex>`;
/// only read (`R`) lines carry bus frames. Address-only 2-byte frames
/// and frames from unknown directions are normal traffic and are
/// skipped.
struct P1p2 {
    allowed_prefixes: Vec<String>,
}

pub(crate) fn factory(config: &DeviceConfig) -> Result<Box<dyn Device>, DeviceError> {
    let allowed_prefixes = config
        .property(ALLOWED_PREFIXES_PROPERTY)
        .map(|prefixes| {
            prefixes
                .split(',')
                .map(|prefix| prefix.trim().to_string())
                .filter(|prefix| !prefix.is_empty())
                .collect()
        })
        .unwrap_or_default();
    Ok(Box::new(P1p2 { allowed_prefixes }))
}

impl Device for P1p2 {
    fn decode(&self, data: &DeviceData) -> Result<Option<DeviceData>, DeviceError> {
        let input_topic = match data
            .properties
            .get(INPUT_TOPIC_PROPERTY)
            .and_then(serde_json::Value::as_str)
        {
            Some(topic) => topic.trim().to_string(),
            None => return Ok(Some(data.clone())),
        };

        if !self.allowed_prefixes.is_empty()
            && !self
                .allowed_prefixes
                .iter()
                .any(|prefix| input_topic.starts_with(prefix.as_str()))
        {
            return Ok(None);
        }

        let bridge = match input_topic.rsplit_once('/') {
            Some((_, bridge)) => bridge.to_string(),
            None => return Ok(Some(data.clone())),
        };

        let line = String::from_utf8_lossy(&data.payload);
        let line = line.trim();
        if !line.starts_with("R ") {
            return Ok(None);
        }
        let hex_message = monitor_line_message(line).ok_or_else(|| DeviceError::InvalidPayload {
            message: format!("invalid monitor line: {line}"),
        })?;
        // Two-byte frames carry only the bus address.
        if hex_message.len() == 4 {
            return Ok(None);
        }

        let state = match hvac::decode(hex_message) {
            Ok(state) => state,
            Err(HvacError::UnknownDirection { .. }) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut properties = data.properties.clone();
        properties.insert("type".to_string(), json!(DEVICE_TYPE));
        properties.insert("bridge".to_string(), json!(bridge));
        properties.insert(
            "temperature".to_string(),
            json!(state.temperature_celsius.to_string()),
        );
        properties.insert("mode".to_string(), json!(state.mode.to_string()));
        properties.insert("modeId".to_string(), json!(state.mode.id()));
        properties.insert("fanSpeed".to_string(), json!(state.fan_speed.to_string()));
        properties.insert("fanSpeedId".to_string(), json!(state.fan_speed.id()));
        properties.insert("status".to_string(), json!(state.running.to_string()));
        properties.insert("testMode".to_string(), json!(state.test_mode.to_string()));
        properties.insert(
            "errorCode".to_string(),
            json!(state.error_code.to_string()),
        );

        Ok(Some(DeviceData::with_properties(
            data.payload.clone(),
            properties,
        )))
    }
}

/// Extract the hex frame from a monitor line:
/// `R <date> <time> <marker> [<rssi>:] <hex>`.
fn monitor_line_message(line: &str) -> Option<&str> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 || fields.len() > 6 {
        return None;
    }
    if fields.len() == 6 && !fields[4].ends_with(':') {
        return None;
    }
    let message = fields[fields.len() - 1];
    if message.is_empty()
        || message.len() % 2 != 0
        || !message.bytes().all(|byte| byte.is_ascii_hexdigit())
    {
        return None;
    }
    Some(message)
}
