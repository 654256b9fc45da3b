/// Loopback host the bridge binds to unless overridden.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port shared by the bridge and its connectors.
pub const DEFAULT_PORT: u16 = 9877;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Prefix applied to every environment override (for example `LIVEWIRE_PORT`).
pub const ENV_PREFIX: &str = "LIVEWIRE_";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
