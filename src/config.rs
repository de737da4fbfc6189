use std::net::SocketAddr;
use std::time::Duration;

use tracing::warn;

/// Runtime configuration, read from the environment with sane defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub sweep_interval: Duration,
    pub pending_assign_threshold: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            sweep_interval: Duration::from_secs(120),
            pending_assign_threshold: Duration::from_secs(5 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: parse_env("BIND_ADDR", defaults.bind_addr),
            sweep_interval: Duration::from_secs(parse_env(
                "SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )),
            pending_assign_threshold: Duration::from_secs(parse_env(
                "PENDING_ASSIGN_THRESHOLD_SECS",
                defaults.pending_assign_threshold.as_secs(),
            )),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(name, raw, "Unparsable environment variable, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_legacy_behavior() {
        let config = Config::default();
        assert_eq!(config.pending_assign_threshold, Duration::from_secs(300));
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
