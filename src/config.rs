use std::env;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use warp::http::Uri;

use crate::errors::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_RECORDS: usize = 10000;
pub const DEFAULT_CORS_MAX_AGE: u64 = 3600;

/// Whether error responses may include internal details.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Only `production` hides details; every other name is treated as
    /// development.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Mode::Production
        } else {
            Mode::Development
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => f.write_str("development"),
            Mode::Production => f.write_str("production"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigin {
    Any,
    Exact(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub mode: Mode,
    pub max_records: usize,
    pub cors_origin: CorsOrigin,
    pub cors_max_age: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            mode: Mode::Development,
            max_records: DEFAULT_MAX_RECORDS,
            cors_origin: CorsOrigin::Any,
            cors_max_age: DEFAULT_CORS_MAX_AGE,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, falling back to the
    /// defaults for variables that are unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_number(&lookup, "PORT", DEFAULT_PORT)?;
        let max_records = parse_number(&lookup, "MAX_RECORDS_PER_REQUEST", DEFAULT_MAX_RECORDS)?;
        let cors_max_age = parse_number(&lookup, "CORS_MAX_AGE", DEFAULT_CORS_MAX_AGE)?;

        if max_records == 0 {
            return Err(ConfigError::Zero {
                name: "MAX_RECORDS_PER_REQUEST",
            });
        }

        let mode = get_variable_or(&lookup, "DRUM_ORACLE_ENVIRONMENT", || {
            get_variable_or(&lookup, "NODE_ENV", || "development".to_owned())
        });

        let cors_origin = parse_cors_origin(get_variable_or(&lookup, "CORS_ORIGIN", || {
            "*".to_owned()
        }))?;

        Ok(Config {
            port,
            mode: Mode::from_name(&mode),
            max_records,
            cors_origin,
            cors_max_age,
        })
    }
}

/// Returns the value of the named variable, or the default if it is
/// unset or blank.
pub fn get_variable_or<F, D>(lookup: &F, name: &str, default: D) -> String
where
    F: Fn(&str) -> Option<String>,
    D: FnOnce() -> String,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(default)
}

fn parse_number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = ParseIntError> + ToString,
{
    let value = get_variable_or(lookup, name, || default.to_string());

    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidNumber {
            name,
            value,
            source,
        })
}

fn parse_cors_origin(value: String) -> Result<CorsOrigin, ConfigError> {
    let value = value.trim();

    if value == "*" {
        return Ok(CorsOrigin::Any);
    }

    match value.parse::<Uri>() {
        Ok(uri)
            if uri.scheme().is_some()
                && uri.authority().is_some()
                && uri.path_and_query().map_or(true, |p| p.as_str() == "/") =>
        {
            Ok(CorsOrigin::Exact(value.trim_end_matches('/').to_owned()))
        }
        _ => Err(ConfigError::InvalidCorsOrigin(value.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Config, CorsOrigin, Mode};
    use crate::errors::ConfigError;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();

        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).expect("build config");

        assert_eq!(config.port, 3000);
        assert_eq!(config.max_records, 10000);
        assert_eq!(config.cors_max_age, 3600);
        assert_eq!(config.cors_origin, CorsOrigin::Any);
        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("MAX_RECORDS_PER_REQUEST", " 250 "),
            ("CORS_ORIGIN", "https://dashboard.example.com/"),
            ("CORS_MAX_AGE", "60"),
            ("NODE_ENV", "production"),
        ])
        .expect("build config");

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_records, 250);
        assert_eq!(config.cors_max_age, 60);
        assert_eq!(
            config.cors_origin,
            CorsOrigin::Exact("https://dashboard.example.com".to_owned())
        );
        assert_eq!(config.mode, Mode::Production);
    }

    #[test]
    fn service_environment_wins_over_node_env() {
        let config = config_from(&[
            ("NODE_ENV", "production"),
            ("DRUM_ORACLE_ENVIRONMENT", "staging"),
        ])
        .expect("build config");

        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn blank_values_fall_back() {
        let config = config_from(&[("PORT", ""), ("CORS_ORIGIN", "  ")]).expect("build config");

        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origin, CorsOrigin::Any);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidNumber { name: "PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("MAX_RECORDS_PER_REQUEST", "0")]),
            Err(ConfigError::Zero { .. })
        ));
        assert!(matches!(
            config_from(&[("CORS_ORIGIN", "not an origin")]),
            Err(ConfigError::InvalidCorsOrigin(_))
        ));
        assert!(matches!(
            config_from(&[("CORS_ORIGIN", "https://example.com/path")]),
            Err(ConfigError::InvalidCorsOrigin(_))
        ));
    }
}
