use anyhow::{Context, Result};

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub kafka_brokers: String,
    pub bind_addr: String,
    pub port: u16,
    /// Whether order creation broadcasts `order:update` like transitions do.
    /// Off by default; creation is observable by polling.
    pub broadcast_on_create: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            kafka_brokers: env_or("KAFKA_BROKERS", "127.0.0.1:9092"),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0"),
            port: env_or("PORT", "8080").parse().context("PORT must be a number")?,
            broadcast_on_create: env_or("BROADCAST_ON_CREATE", "false")
                .parse()
                .context("BROADCAST_ON_CREATE must be true or false")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_prefers_default_when_unset() {
        assert_eq!(env_or("ZAIKA_TEST_UNSET_KEY", "fallback"), "fallback");
    }
}
