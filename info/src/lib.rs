/// The name the service reports about itself.
pub const SERVICE_NAME: &str = "Oracle Data Provider API";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const REVISION: Option<&str> = option_env!("DRUM_ORACLE_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("BUILD_TIMESTAMP");
