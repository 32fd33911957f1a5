/// Entity abstraction shared by everything this crate exposes to a host.
pub trait Entity: Send + Sync {
    /// Serialize current state and attributes to JSON for the host
    fn state_json(&self) -> serde_json::Value;

    /// Return the platform type of this entity (e.g. "climate")
    fn platform(&self) -> &'static str;
}
