use std::env;

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Seconds to wait for a free connection before failing the request.
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Reads `DATABASE_URL` (required), `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_ACQUIRE_TIMEOUT`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let url = lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            acquire_timeout_secs: lookup("DATABASE_ACQUIRE_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_url() {
        assert!(DatabaseConfig::from_lookup(|_| None).is_err());
    }

    #[test]
    fn test_reads_pool_size() {
        let config = DatabaseConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/scholaris".to_string()),
            "DATABASE_MAX_CONNECTIONS" => Some("32".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.max_connections, 32);
        assert_eq!(config.acquire_timeout_secs, 5);
    }
}
