//! Climate entity for Duux heaters.
//!
//! One entity per heater. State is read from the coordinator's latest
//! snapshot; every command goes through the [`DuuxApi`] and is followed by a
//! refresh so the next read reflects what the device accepted.

use std::sync::Arc;

use bitflags::bitflags;
use serde::Serialize;
use serde_json::Value;
use strum::Display;
use strum::EnumString;
use tracing::info;

use crate::api::DuuxApi;
use crate::coordinator::Coordinator;
use crate::device::DeviceDescriptor;
use crate::device::DeviceInfo;
use crate::entity::Entity;
use crate::error::Error;
use crate::error::Result;
use crate::family;
use crate::family::FamilyProfile;
use crate::family::HeaterFamily;
use crate::family::PresetScheme;
use crate::payload;
use crate::preset::Preset;
use crate::preset::discover_presets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Off,
    Heat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum TemperatureUnit {
    #[strum(serialize = "°C")]
    #[serde(rename = "°C")]
    Celsius,
}

bitflags! {
    /// Capabilities advertised to the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClimateFeatures: u32 {
        const TARGET_TEMPERATURE = 1;
        const PRESET_MODE = 16;
        const TURN_OFF = 128;
        const TURN_ON = 256;
    }
}

enum Presets {
    /// Cached at construction and never re-derived.
    Discovered(Vec<Preset>),
    EdgeTable,
}

pub struct ClimateEntity {
    device: DeviceDescriptor,
    family: HeaterFamily,
    profile: FamilyProfile,
    presets: Presets,
    coordinator: Arc<dyn Coordinator>,
    api: Arc<dyn DuuxApi>,
}

impl ClimateEntity {
    pub fn new(
        device: DeviceDescriptor,
        family: HeaterFamily,
        coordinator: Arc<dyn Coordinator>,
        api: Arc<dyn DuuxApi>,
    ) -> Self {
        let profile = family.profile();
        let presets = match profile.presets {
            PresetScheme::Discovered => {
                let snapshot = coordinator.snapshot();
                Presets::Discovered(discover_presets(
                    snapshot.as_deref(),
                    device.raw(),
                    family,
                ))
            }
            PresetScheme::EdgeTable => Presets::EdgeTable,
        };

        Self {
            device,
            family,
            profile,
            presets,
            coordinator,
            api,
        }
    }

    pub fn unique_id(&self) -> String {
        format!("duux_{}", self.device.id)
    }

    pub fn name(&self) -> Option<&str> {
        self.device.name.as_deref()
    }

    pub fn address(&self) -> &str {
        &self.device.address
    }

    pub fn family(&self) -> HeaterFamily {
        self.family
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.device.device_info()
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    pub fn hvac_modes(&self) -> [HvacMode; 2] {
        [HvacMode::Off, HvacMode::Heat]
    }

    pub fn supported_features(&self) -> ClimateFeatures {
        ClimateFeatures::TARGET_TEMPERATURE
            | ClimateFeatures::PRESET_MODE
            | ClimateFeatures::TURN_OFF
            | ClimateFeatures::TURN_ON
    }

    pub fn min_temp(&self) -> f64 {
        self.profile.min_temp
    }

    pub fn max_temp(&self) -> f64 {
        self.profile.max_temp
    }

    pub fn target_temperature_step(&self) -> f64 {
        self.profile.temp_step
    }

    /// Mirrors whether the coordinator's last refresh succeeded.
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    /// The coordinator pushes updates, so the host never needs to poll.
    pub fn should_poll(&self) -> bool {
        false
    }

    /// Discovered presets. Empty for families with a fixed preset table.
    pub fn presets(&self) -> &[Preset] {
        match &self.presets {
            Presets::Discovered(presets) => presets,
            Presets::EdgeTable => &[],
        }
    }

    fn field(&self, key: &str) -> Option<Value> {
        self.coordinator.snapshot()?.get(key).cloned()
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.field("temp").as_ref().and_then(payload::number)
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.field("sp").as_ref().and_then(payload::number)
    }

    pub fn hvac_mode(&self) -> HvacMode {
        let on = match self.field("power") {
            Some(Value::Bool(on)) => on,
            Some(power) => payload::number(&power).is_some_and(|p| p != 0.0),
            None => false,
        };

        if on { HvacMode::Heat } else { HvacMode::Off }
    }

    pub fn preset_mode(&self) -> Option<String> {
        match &self.presets {
            Presets::Discovered(presets) => {
                let mode = payload::render(&self.field("mode")?);
                presets
                    .iter()
                    .find(|p| p.value.as_deref() == Some(mode.as_str()))
                    .map(|p| p.name.clone())
            }
            Presets::EdgeTable => {
                let snapshot = self.coordinator.snapshot()?;
                let code = snapshot.get("heatin").and_then(payload::integer);
                Some(family::edge_label(code).to_string())
            }
        }
    }

    pub fn preset_modes(&self) -> Vec<String> {
        match &self.presets {
            Presets::Discovered(presets) => presets.iter().map(|p| p.name.clone()).collect(),
            Presets::EdgeTable => family::EDGE_PRESETS
                .iter()
                .map(|(_, label)| label.to_string())
                .collect(),
        }
    }

    /// Set the target temperature. `None` is ignored.
    pub async fn set_temperature(&self, temperature: Option<f64>) -> Result<()> {
        let Some(temperature) = temperature else {
            return Ok(());
        };

        info!("[{}] Setting temperature to {}", self.address(), temperature);
        self.api
            .set_temperature(self.address(), temperature)
            .await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        let on = mode == HvacMode::Heat;
        info!("[{}] Setting power {}", self.address(), on);
        self.api.set_power(self.address(), on).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.set_hvac_mode(HvacMode::Heat).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.set_hvac_mode(HvacMode::Off).await
    }

    /// Force a refresh of the heater's state without sending a command.
    pub async fn update(&self) {
        self.coordinator.request_refresh().await;
    }

    /// Select a preset by name.
    ///
    /// Discovered presets are sent as a raw `tune set` command and must exist
    /// in the cached list. Edge heaters go through `set_mode`, where an
    /// unrecognised name selects code 1.
    pub async fn set_preset_mode(&self, preset_mode: &str) -> Result<()> {
        match &self.presets {
            Presets::Discovered(presets) => {
                let preset = presets
                    .iter()
                    .find(|p| p.name == preset_mode)
                    .ok_or_else(|| Error::UnknownPreset {
                        entity_id: self.unique_id(),
                        preset: preset_mode.to_string(),
                    })?;

                let command = format!("tune set {}", preset.command);
                info!("[{}] Sending '{}'", self.address(), command);
                self.api.send_command(self.address(), &command).await?;
            }
            Presets::EdgeTable => {
                let code = family::edge_code(preset_mode).to_string();
                info!("[{}] Setting mode {}", self.address(), code);
                self.api.set_mode(self.address(), &code).await?;
            }
        }

        self.coordinator.request_refresh().await;
        Ok(())
    }
}

impl Entity for ClimateEntity {
    fn state_json(&self) -> Value {
        serde_json::json!({
            "unique_id": self.unique_id(),
            "name": self.name(),
            "platform": self.platform(),
            "family": self.family.to_string(),
            "available": self.available(),
            "state": self.hvac_mode(),
            "attributes": {
                "current_temperature": self.current_temperature(),
                "temperature": self.target_temperature(),
                "min_temp": self.min_temp(),
                "max_temp": self.max_temp(),
                "target_temp_step": self.target_temperature_step(),
                "temperature_unit": self.temperature_unit(),
                "hvac_modes": self.hvac_modes(),
                "preset_mode": self.preset_mode(),
                "preset_modes": self.preset_modes(),
                "supported_features": self.supported_features().bits(),
            },
            "device": self.device_info(),
        })
    }

    fn platform(&self) -> &'static str {
        "climate"
    }
}
