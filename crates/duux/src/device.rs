use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::payload;

/// Identifier domain used in device registry entries.
pub const DOMAIN: &str = "duux";

const DEFAULT_MANUFACTURER: &str = "Duux";
const UNKNOWN_MODEL: &str = "Unknown";

/// A heater as listed in the account's device inventory.
///
/// The raw descriptor is kept alongside the parsed fields because some
/// firmware nests preset metadata inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Cloud-side numeric id, rendered as a string.
    pub id: String,

    /// MAC-style address the command API is keyed on.
    pub address: String,

    pub name: Option<String>,

    pub manufacturer: String,

    /// Hardware family code (`sensorTypeId`) as reported, never null.
    pub sensor_type_id: Option<Value>,

    /// Model name from `sensorType.name`.
    pub model: String,

    raw: Value,
}

impl DeviceDescriptor {
    /// Parse a descriptor from the inventory JSON.
    ///
    /// Only `id` and `deviceId` are required.
    pub fn from_json(raw: Value) -> Result<Self> {
        let map = raw
            .as_object()
            .ok_or_else(|| Error::InvalidDevice("descriptor is not an object".to_string()))?;

        let id = map
            .get("id")
            .filter(|v| !v.is_null())
            .map(payload::render)
            .ok_or_else(|| Error::InvalidDevice("missing 'id'".to_string()))?;

        let address = map
            .get("deviceId")
            .filter(|v| !v.is_null())
            .map(payload::render)
            .ok_or_else(|| Error::InvalidDevice(format!("device {id} has no 'deviceId'")))?;

        let name = payload::first_alias(map, &["displayName", "name"]).map(payload::render);

        let manufacturer = map
            .get("manufacturer")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MANUFACTURER)
            .to_string();

        let sensor_type_id = map.get("sensorTypeId").filter(|v| !v.is_null()).cloned();

        let model = map
            .get("sensorType")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_MODEL)
            .to_string();

        Ok(Self {
            id,
            address,
            name,
            manufacturer,
            sensor_type_id,
            model,
            raw,
        })
    }

    /// The hardware code when it is a whole number (`49` or `49.0`).
    pub fn sensor_type_code(&self) -> Option<i64> {
        self.sensor_type_id.as_ref().and_then(payload::whole_number)
    }

    /// The descriptor exactly as the inventory returned it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![(DOMAIN.to_string(), self.id.clone())],
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
        }
    }
}

/// Device registry block attached to every entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, String)>,
    pub name: Option<String>,
    pub manufacturer: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let device = DeviceDescriptor::from_json(json!({
            "id": 1234,
            "deviceId": "aa:bb:cc:dd:ee:ff",
            "displayName": "Bedroom heater",
            "name": "Threesixty",
            "manufacturer": "Duux",
            "sensorTypeId": 49,
            "sensorType": {"name": "Threesixty 2023"},
        }))
        .unwrap();

        assert_eq!(device.id, "1234");
        assert_eq!(device.address, "aa:bb:cc:dd:ee:ff");
        assert_eq!(device.name.as_deref(), Some("Bedroom heater"));
        assert_eq!(device.sensor_type_id, Some(json!(49)));
        assert_eq!(device.sensor_type_code(), Some(49));
        assert_eq!(device.model, "Threesixty 2023");
    }

    #[test]
    fn test_defaults() {
        let device = DeviceDescriptor::from_json(json!({
            "id": "7",
            "deviceId": "11:22",
            "displayName": "",
            "name": "Edge",
        }))
        .unwrap();

        assert_eq!(device.name.as_deref(), Some("Edge"));
        assert_eq!(device.manufacturer, "Duux");
        assert_eq!(device.model, "Unknown");
        assert_eq!(device.sensor_type_id, None);
        assert_eq!(device.sensor_type_code(), None);
        assert_eq!(
            device.device_info(),
            DeviceInfo {
                identifiers: vec![("duux".to_string(), "7".to_string())],
                name: Some("Edge".to_string()),
                manufacturer: "Duux".to_string(),
                model: "Unknown".to_string(),
            }
        );
    }

    #[test]
    fn test_sensor_type_shapes() {
        let parse = |code: Value| {
            DeviceDescriptor::from_json(json!({"id": 1, "deviceId": "x", "sensorTypeId": code}))
                .unwrap()
        };

        assert_eq!(parse(json!(50.0)).sensor_type_code(), Some(50));

        let text = parse(json!("77"));
        assert_eq!(text.sensor_type_id, Some(json!("77")));
        assert_eq!(text.sensor_type_code(), None);

        assert_eq!(parse(json!(null)).sensor_type_id, None);
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(matches!(
            DeviceDescriptor::from_json(json!({"deviceId": "11:22"})),
            Err(Error::InvalidDevice(_))
        ));
        assert!(matches!(
            DeviceDescriptor::from_json(json!({"id": 1})),
            Err(Error::InvalidDevice(_))
        ));
        assert!(matches!(
            DeviceDescriptor::from_json(json!([1, 2])),
            Err(Error::InvalidDevice(_))
        ));
    }
}
