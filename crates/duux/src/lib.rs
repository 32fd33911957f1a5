pub mod api;
pub mod climate;
pub mod config;
pub mod coordinator;
pub mod device;
mod entity;
mod error;
pub mod family;
pub mod payload;
pub mod preset;
mod registry;

#[cfg(test)]
mod testing;

pub use api::Blocking;
pub use api::BlockingDuuxApi;
pub use api::DuuxApi;
pub use climate::ClimateEntity;
pub use climate::HvacMode;
pub use config::Config;
pub use config::LogLevel;
pub use coordinator::Coordinator;
pub use coordinator::Snapshot;
pub use coordinator::WatchCoordinator;
pub use device::DeviceDescriptor;
pub use entity::Entity;
pub use error::Error;
pub use error::Result;
pub use family::HeaterFamily;
pub use preset::Preset;
pub use preset::discover_presets;
pub use registry::Coordinators;
pub use registry::setup_entities;
