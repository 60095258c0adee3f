pub(crate) const DEFAULT_USER_AGENT: &str = concat!("vuload/", env!("CARGO_PKG_VERSION"));

/// Scenario documents looked up in the working directory, in order.
pub(crate) const DEFAULT_CONFIG_TOML: &str = "vuload.toml";
pub(crate) const DEFAULT_CONFIG_JSON: &str = "vuload.json";
