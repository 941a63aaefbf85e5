use std::env;
use std::time::Duration;

/// Configuration for the console binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Name of the worker in log output.
    pub worker_name: String,
    /// Latency the simulated engine applies to every command.
    pub default_latency: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            worker_name: "console".to_string(),
            default_latency: Duration::ZERO,
        }
    }
}

impl ConsoleConfig {
    /// Builds a configuration from `TRACKLINK_*` environment variables,
    /// falling back to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let worker_name = lookup("TRACKLINK_WORKER_NAME").unwrap_or(defaults.worker_name);
        anyhow::ensure!(!worker_name.trim().is_empty(), "worker name must not be empty");

        let default_latency = match lookup("TRACKLINK_LATENCY_MS") {
            Some(value) => {
                let ms: u64 = value.trim().parse().map_err(|_| {
                    anyhow::anyhow!("TRACKLINK_LATENCY_MS must be milliseconds, got '{value}'")
                })?;
                Duration::from_millis(ms)
            }
            None => defaults.default_latency,
        };

        Ok(Self {
            worker_name,
            default_latency,
        })
    }

    /// Applies command line overrides.
    pub fn with_overrides(mut self, worker_name: Option<String>, latency_ms: Option<u64>) -> Self {
        if let Some(name) = worker_name {
            self.worker_name = name;
        }
        if let Some(ms) = latency_ms {
            self.default_latency = Duration::from_millis(ms);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn test_environment_values() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            ("TRACKLINK_WORKER_NAME", "bench"),
            ("TRACKLINK_LATENCY_MS", "25"),
        ]))
        .unwrap();
        assert_eq!(config.worker_name, "bench");
        assert_eq!(config.default_latency, Duration::from_millis(25));
    }

    #[test]
    fn test_invalid_latency() {
        assert!(ConsoleConfig::from_lookup(lookup(&[("TRACKLINK_LATENCY_MS", "fast")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ConsoleConfig::default().with_overrides(Some("cli".into()), Some(7));
        assert_eq!(config.worker_name, "cli");
        assert_eq!(config.default_latency, Duration::from_millis(7));
    }
}
