//! Command interface to the Duux cloud.
//!
//! The wire protocol lives outside this crate. Entities only see the
//! [`DuuxApi`] trait; synchronous clients are wrapped in [`Blocking`] so each
//! call runs on tokio's blocking pool instead of stalling the executor.

use std::sync::Arc;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {address} failed: {message}")]
    Request { address: String, message: String },

    #[error("device {address} rejected command: {message}")]
    Rejected { address: String, message: String },

    #[error("blocking API task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Commands a heater accepts, addressed by its MAC-style device id.
#[async_trait]
pub trait DuuxApi: Send + Sync {
    async fn set_temperature(&self, address: &str, temperature: f64) -> ApiResult<()>;

    async fn set_power(&self, address: &str, on: bool) -> ApiResult<()>;

    /// Select a heating mode by its numeric code (sent as a string).
    async fn set_mode(&self, address: &str, mode: &str) -> ApiResult<()>;

    /// Send a raw command string, e.g. `tune set mode 2`.
    async fn send_command(&self, address: &str, command: &str) -> ApiResult<()>;
}

/// Synchronous flavour of [`DuuxApi`] for clients built on blocking I/O.
pub trait BlockingDuuxApi: Send + Sync + 'static {
    fn set_temperature(&self, address: &str, temperature: f64) -> ApiResult<()>;

    fn set_power(&self, address: &str, on: bool) -> ApiResult<()>;

    fn set_mode(&self, address: &str, mode: &str) -> ApiResult<()>;

    fn send_command(&self, address: &str, command: &str) -> ApiResult<()>;
}

/// Runs a [`BlockingDuuxApi`] on the blocking thread pool.
pub struct Blocking<A> {
    inner: Arc<A>,
}

impl<A: BlockingDuuxApi> Blocking<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl<A: BlockingDuuxApi> DuuxApi for Blocking<A> {
    async fn set_temperature(&self, address: &str, temperature: f64) -> ApiResult<()> {
        let inner = Arc::clone(&self.inner);
        let address = address.to_owned();
        tokio::task::spawn_blocking(move || inner.set_temperature(&address, temperature)).await?
    }

    async fn set_power(&self, address: &str, on: bool) -> ApiResult<()> {
        let inner = Arc::clone(&self.inner);
        let address = address.to_owned();
        tokio::task::spawn_blocking(move || inner.set_power(&address, on)).await?
    }

    async fn set_mode(&self, address: &str, mode: &str) -> ApiResult<()> {
        let inner = Arc::clone(&self.inner);
        let address = address.to_owned();
        let mode = mode.to_owned();
        tokio::task::spawn_blocking(move || inner.set_mode(&address, &mode)).await?
    }

    async fn send_command(&self, address: &str, command: &str) -> ApiResult<()> {
        let inner = Arc::clone(&self.inner);
        let address = address.to_owned();
        let command = command.to_owned();
        tokio::task::spawn_blocking(move || inner.send_command(&address, &command)).await?
    }
}
