// src/config/settings.rs

use std::{net::SocketAddr, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} deve ser definida")]
    Missing(&'static str),

    #[error("{name} inválida: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Configuração lida do ambiente (e do `.env`, quando existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub session_ttl_days: i64,
    pub functions_base_url: String,
    pub functions_api_key: String,
    pub remote_timeout: Duration,
    pub read_retry_attempts: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let functions_base_url = required("FUNCTIONS_BASE_URL")?;
        if !functions_base_url.starts_with("http://") && !functions_base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                name: "FUNCTIONS_BASE_URL",
                value: functions_base_url,
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            functions_base_url: functions_base_url.trim_end_matches('/').to_string(),
            functions_api_key: required("FUNCTIONS_API_KEY")?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            remote_timeout: Duration::from_secs(parse_or(&lookup, "REMOTE_TIMEOUT_SECS", 30)?),
            session_ttl_days: parse_or(&lookup, "SESSION_TTL_DAYS", 7)?,
            read_retry_attempts: parse_or(&lookup, "READ_RETRY_ATTEMPTS", 3)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/vintusure"),
        ("JWT_SECRET", "segredo"),
        ("FUNCTIONS_BASE_URL", "https://functions.example.com/"),
        ("FUNCTIONS_API_KEY", "chave"),
    ];

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let settings = Settings::from_lookup(env(REQUIRED)).unwrap();

        assert_eq!(settings.bind_addr.port(), 3000);
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.remote_timeout, Duration::from_secs(30));
        assert_eq!(settings.functions_base_url, "https://functions.example.com");
    }

    #[test]
    fn missing_required_value_fails() {
        let partial: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "JWT_SECRET")
            .collect();
        assert!(matches!(
            Settings::from_lookup(env(&partial)),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn malformed_optional_value_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REMOTE_TIMEOUT_SECS", "trinta"));
        assert!(matches!(
            Settings::from_lookup(env(&pairs)),
            Err(ConfigError::Invalid { name: "REMOTE_TIMEOUT_SECS", .. })
        ));
    }
}
