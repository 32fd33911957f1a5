use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use tracing::warn;

use crate::api::DuuxApi;
use crate::climate::ClimateEntity;
use crate::coordinator::Coordinator;
use crate::device::DeviceDescriptor;
use crate::family::HeaterFamily;
use crate::payload;

/// Coordinators keyed by device address (`deviceId`).
pub type Coordinators = HashMap<String, Arc<dyn Coordinator>>;

/// Build one climate entity per device in the inventory.
///
/// Unknown hardware codes fall back to the generic family with a warning.
/// Descriptors that cannot be parsed, or whose address has no coordinator,
/// are skipped.
pub fn setup_entities(
    devices: &[Value],
    coordinators: &Coordinators,
    api: Arc<dyn DuuxApi>,
) -> Vec<ClimateEntity> {
    let mut entities = Vec::with_capacity(devices.len());

    for raw in devices {
        let device = match DeviceDescriptor::from_json(raw.clone()) {
            Ok(device) => device,
            Err(e) => {
                warn!("Skipping device: {}", e);
                continue;
            }
        };

        let Some(coordinator) = coordinators.get(&device.address) else {
            warn!("No coordinator for device {}, skipping", device.address);
            continue;
        };

        let family = HeaterFamily::from_sensor_type(device.sensor_type_code());
        if family.is_generic() {
            match &device.sensor_type_id {
                Some(code) => warn!(
                    "Unknown heater type {}, using generic entity",
                    payload::render(code)
                ),
                None => warn!("Heater {} reports no type, using generic entity", device.address),
            }
        }

        let entity = ClimateEntity::new(device, family, Arc::clone(coordinator), Arc::clone(&api));
        info!(
            "Set up {} entity {} ({} presets)",
            family,
            entity.unique_id(),
            entity.preset_modes().len()
        );
        entities.push(entity);
    }

    entities
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::climate::HvacMode;
    use crate::testing::FakeHeater;

    /// Collects formatted log output so tests can assert on diagnostics.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs.contents())
    }

    fn device(id: i64, address: &str, sensor_type: Value) -> Value {
        json!({
            "id": id,
            "deviceId": address,
            "name": format!("Heater {id}"),
            "sensorTypeId": sensor_type,
        })
    }

    #[test]
    fn test_dispatch_by_sensor_type() {
        let heater = FakeHeater::new(json!({"power": 1}));
        let devices = vec![
            device(1, "a", json!(49)),
            device(2, "b", json!(50)),
            device(3, "c", json!(31)),
        ];
        let coordinators: Coordinators = ["a", "b", "c"]
            .into_iter()
            .map(|address| {
                let coordinator: Arc<dyn Coordinator> = heater.coordinator(address);
                (address.to_string(), coordinator)
            })
            .collect();

        let (entities, logs) = with_logs(|| setup_entities(&devices, &coordinators, heater.clone()));

        let families: Vec<HeaterFamily> = entities.iter().map(|e| e.family()).collect();
        assert_eq!(
            families,
            vec![
                HeaterFamily::Threesixty2023,
                HeaterFamily::EdgeV2,
                HeaterFamily::ThreesixtyTwo,
            ]
        );
        assert!(logs.is_empty(), "unexpected warnings: {logs}");
    }

    #[tokio::test]
    async fn test_unknown_type_falls_back_with_warning() {
        let heater = FakeHeater::new(json!({"temp": 15, "sp": 19, "power": 0}));
        let devices = vec![device(9, "z", json!(999))];
        let coordinators: Coordinators =
            HashMap::from([("z".to_string(), heater.coordinator("z") as Arc<dyn Coordinator>)]);

        let (entities, logs) = with_logs(|| setup_entities(&devices, &coordinators, heater.clone()));

        assert_eq!(entities.len(), 1);
        let climate = &entities[0];
        assert_eq!(climate.family(), HeaterFamily::Generic(Some(999)));
        assert!(climate.preset_modes().is_empty());
        assert!(logs.contains("WARN"), "missing warning: {logs}");
        assert!(logs.contains("Unknown heater type 999"), "missing warning: {logs}");

        climate.set_temperature(Some(21.0)).await.unwrap();
        climate.turn_on().await.unwrap();
        assert_eq!(climate.target_temperature(), Some(21.0));
        assert_eq!(climate.hvac_mode(), HvacMode::Heat);
    }

    #[test]
    fn test_sensor_type_codes_beyond_integers() {
        let heater = FakeHeater::new(json!({}));
        let devices = vec![device(1, "a", json!(49.0)), device(2, "b", json!("77"))];
        let coordinators: Coordinators = ["a", "b"]
            .into_iter()
            .map(|address| {
                let coordinator: Arc<dyn Coordinator> = heater.coordinator(address);
                (address.to_string(), coordinator)
            })
            .collect();

        let (entities, logs) = with_logs(|| setup_entities(&devices, &coordinators, heater.clone()));

        assert_eq!(entities[0].family(), HeaterFamily::Threesixty2023);
        assert_eq!(entities[1].family(), HeaterFamily::Generic(None));
        assert!(logs.contains("Unknown heater type 77"), "{logs}");
        assert!(!logs.contains("reports no type"), "{logs}");
        assert!(!logs.contains("Unknown heater type 49"), "{logs}");
    }

    #[test]
    fn test_invalid_and_orphaned_devices_are_skipped() {
        let heater = FakeHeater::new(json!({}));
        let devices = vec![
            json!({"deviceId": "no-id"}),
            device(5, "orphan", json!(49)),
            device(6, "known", json!(49)),
        ];
        let coordinators: Coordinators = HashMap::from([(
            "known".to_string(),
            heater.coordinator("known") as Arc<dyn Coordinator>,
        )]);

        let (entities, logs) = with_logs(|| setup_entities(&devices, &coordinators, heater.clone()));

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].unique_id(), "duux_6");
        assert!(logs.contains("missing 'id'"), "{logs}");
        assert!(logs.contains("No coordinator for device orphan"), "{logs}");
    }
}
