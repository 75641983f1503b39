//! Database configuration read from the environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_PATH: &str = "storefront.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: String,

    /// Turn on SQLite foreign key enforcement for the connection
    pub foreign_keys: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
            foreign_keys: true,
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            ..Self::default()
        }
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("STOREFRONT_DATABASE_PATH")
            .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
        if path.trim().is_empty() {
            return Err(Error::config("STOREFRONT_DATABASE_PATH cannot be empty"));
        }

        let foreign_keys = match std::env::var("STOREFRONT_FOREIGN_KEYS") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                Error::config(format!("Invalid STOREFRONT_FOREIGN_KEYS value: {}", value))
            })?,
            Err(_) => true,
        };

        Ok(Self { path, foreign_keys })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Both env cases live in one test so they never race each other.
    #[test]
    fn test_config_from_env() {
        env::remove_var("STOREFRONT_DATABASE_PATH");
        env::remove_var("STOREFRONT_FOREIGN_KEYS");

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config, DatabaseConfig::default());

        env::set_var("STOREFRONT_DATABASE_PATH", ":memory:");
        env::set_var("STOREFRONT_FOREIGN_KEYS", "off");
        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.path, ":memory:");
        assert!(!config.foreign_keys);

        env::set_var("STOREFRONT_FOREIGN_KEYS", "sometimes");
        assert!(matches!(DatabaseConfig::from_env(), Err(Error::Config(_))));

        env::remove_var("STOREFRONT_DATABASE_PATH");
        env::remove_var("STOREFRONT_FOREIGN_KEYS");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
