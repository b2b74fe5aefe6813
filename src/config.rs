use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;

/// Connection settings for the alerts database.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub encrypt: bool,
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("encrypt", &self.encrypt)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub init_schema: bool,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("missing required environment variable {}", key))
        };

        let database = DatabaseConfig {
            server: required("DB_SERVER")?,
            port: parse_or(lookup("DB_PORT"), 5432),
            database: required("DB_DATABASE")?,
            username: required("DB_USERNAME")?,
            password: required("DB_PASSWORD")?,
            encrypt: parse_flag(lookup("DB_ENCRYPT"), true),
            max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), 10),
        };

        let init_schema = parse_flag(lookup("DB_INIT_SCHEMA"), false);
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        // Azure Functions hands custom handlers their port through this variable.
        let port = lookup("FUNCTIONS_CUSTOMHANDLER_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            database,
            init_schema,
            host,
            port,
            log_level,
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("DB_SERVER", "db.internal"),
        ("DB_DATABASE", "alerts"),
        ("DB_USERNAME", "svc"),
        ("DB_PASSWORD", "hunter2"),
    ];

    #[test]
    fn test_defaults_with_required_vars() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.database.server, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert!(config.database.encrypt);
        assert_eq!(config.database.max_connections, 10);
        assert!(!config.init_schema);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_required_var_is_named() {
        let err = AppConfig::from_lookup(lookup_from(&REQUIRED[..3])).unwrap_err();
        assert!(err.to_string().contains("DB_PASSWORD"));
    }

    #[test]
    fn test_empty_required_var_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("DB_SERVER", "");
        let err = AppConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.to_string().contains("DB_SERVER"));
    }

    #[test]
    fn test_custom_handler_port_wins_over_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("FUNCTIONS_CUSTOMHANDLER_PORT", "7071"));
        vars.push(("PORT", "9000"));
        let config = AppConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.port, 7071);
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("DB_PORT", "6543"),
            ("DB_ENCRYPT", "false"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("DB_INIT_SCHEMA", "YES"),
            ("PORT", "9000"),
            ("LOG_LEVEL", "debug"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.database.port, 6543);
        assert!(!config.database.encrypt);
        assert_eq!(config.database.max_connections, 3);
        assert!(config.init_schema);
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
