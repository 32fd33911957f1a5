//! Preset discovery.
//!
//! Newer heaters describe their operating modes in an `availableModes`
//! structure, either in the live state or buried somewhere in the inventory
//! descriptor. Its shape varies by firmware: sometimes an object, sometimes a
//! list of candidate objects, with field names in snake_case, camelCase or a
//! short form. Discovery flattens whatever is there into a list of [`Preset`]s
//! and never fails; anything it cannot make sense of yields no presets.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::coordinator::Snapshot;
use crate::family::HeaterFamily;
use crate::payload;

const AVAILABLE_MODES: &str = "availableModes";
const SETTINGS: &str = "settings";
const COMMAND_KEY_ALIASES: [&str; 3] = ["command_key", "commandKey", "key"];
const NAME_ALIASES: [&str; 3] = ["setting_name", "settingName", "name"];
const VALUE_ALIASES: [&str; 3] = ["setting_value", "settingValue", "value"];

/// A named operating mode and the command that selects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub command: String,
    /// The mode value as reported back in the state's `mode` field.
    pub value: Option<String>,
}

/// Derive presets from the current snapshot, falling back to the device
/// descriptor when the snapshot has no `availableModes`.
pub fn discover_presets(
    snapshot: Option<&Snapshot>,
    device: &Value,
    family: HeaterFamily,
) -> Vec<Preset> {
    let modes = snapshot
        .and_then(|s| s.get(AVAILABLE_MODES))
        .filter(|v| !v.is_null())
        .or_else(|| payload::deep_find(device, AVAILABLE_MODES).next());

    let modes = match modes {
        Some(Value::Array(candidates)) => candidates.iter().find(|candidate| {
            candidate
                .get(SETTINGS)
                .is_some_and(|settings| payload::is_truthy(settings))
        }),
        other => other,
    };

    let Some(modes) = modes.and_then(Value::as_object) else {
        debug!("No available modes found");
        return Vec::new();
    };

    let Some(settings) = modes.get(SETTINGS).and_then(Value::as_array) else {
        debug!("No settings found in available modes");
        return Vec::new();
    };

    let command_prefix = payload::first_alias(modes, &COMMAND_KEY_ALIASES);

    let presets: Vec<Preset> = settings
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|setting| {
            let name = payload::first_alias(setting, &NAME_ALIASES)
                .filter(|name| payload::is_truthy(name))
                .map(payload::render);
            let value = payload::first_alias(setting, &VALUE_ALIASES);
            let name = family.normalize_preset_name(name, value)?;

            let command = match (setting.get("command").filter(|c| !c.is_null()), value) {
                (Some(command), _) => payload::render(command),
                (None, Some(value)) => match command_prefix.filter(|p| payload::is_truthy(p)) {
                    Some(prefix) => {
                        format!("{} {}", payload::render(prefix), payload::render(value))
                    }
                    None => payload::render(value),
                },
                (None, None) => return None,
            };

            Some(Preset {
                name,
                command,
                value: value.map(payload::render),
            })
        })
        .collect();

    debug!("Discovered presets: {:?}", presets);

    presets
}
