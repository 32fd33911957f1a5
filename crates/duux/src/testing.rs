//! Test doubles shared by the unit tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;

use crate::api::ApiError;
use crate::api::ApiResult;
use crate::api::DuuxApi;
use crate::coordinator::Snapshot;
use crate::coordinator::SnapshotSource;
use crate::coordinator::WatchCoordinator;

pub fn snapshot(value: Value) -> Snapshot {
    match value {
        Value::Object(map) => map,
        other => panic!("snapshot must be an object, got {other}"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetTemperature(String, f64),
    SetPower(String, bool),
    SetMode(String, String),
    SendCommand(String, String),
}

/// In-memory heater: records every command and reflects it in the state it
/// serves back on the next fetch.
#[derive(Debug, Default)]
pub struct FakeHeater {
    pub state: Mutex<Snapshot>,
    pub calls: Mutex<Vec<Call>>,
    pub fetches: AtomicUsize,
    pub fail_commands: AtomicBool,
}

impl FakeHeater {
    pub fn new(state: Value) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(snapshot(state)),
            ..Self::default()
        })
    }

    /// A coordinator for `address` fed by this heater, already holding the
    /// initial state.
    pub fn coordinator(self: &Arc<Self>, address: &str) -> Arc<WatchCoordinator> {
        let coordinator = WatchCoordinator::new(address, self.clone());
        coordinator.publish(self.state.lock().unwrap().clone());
        Arc::new(coordinator)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn record(&self, address: &str, call: Call) -> ApiResult<()> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(ApiError::Request {
                address: address.to_string(),
                message: "cloud unreachable".to_string(),
            });
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn set(&self, key: &str, value: Value) {
        self.state.lock().unwrap().insert(key.to_string(), value);
    }
}

#[async_trait]
impl DuuxApi for FakeHeater {
    async fn set_temperature(&self, address: &str, temperature: f64) -> ApiResult<()> {
        self.record(address, Call::SetTemperature(address.to_string(), temperature))?;
        self.set("sp", json!(temperature));
        Ok(())
    }

    async fn set_power(&self, address: &str, on: bool) -> ApiResult<()> {
        self.record(address, Call::SetPower(address.to_string(), on))?;
        self.set("power", json!(u8::from(on)));
        Ok(())
    }

    async fn set_mode(&self, address: &str, mode: &str) -> ApiResult<()> {
        self.record(address, Call::SetMode(address.to_string(), mode.to_string()))?;
        if let Ok(code) = mode.parse::<i64>() {
            self.set("heatin", json!(code));
        }
        Ok(())
    }

    async fn send_command(&self, address: &str, command: &str) -> ApiResult<()> {
        self.record(
            address,
            Call::SendCommand(address.to_string(), command.to_string()),
        )?;
        // `tune set <key> <value>`: the trailing token becomes the mode.
        if let Some(value) = command.split_whitespace().last() {
            self.set("mode", json!(value));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for FakeHeater {
    async fn fetch(&self, _address: &str) -> ApiResult<Snapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().clone())
    }
}
