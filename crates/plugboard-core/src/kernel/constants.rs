/// Application name
pub const APP_NAME: &str = "Plugboard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a configuration file to load at startup
pub const CONFIG_ENV_VAR: &str = "PLUGBOARD_CONFIG";
