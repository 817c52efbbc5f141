// ABOUTME: Configuration loading and validation for the flowforge server and CLI.
// ABOUTME: Reads FLOWFORGE_* environment variables and applies defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use flowforge_core::{Target, UnknownTarget};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FLOWFORGE_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("FLOWFORGE_TARGET: {0}")]
    InvalidTarget(#[from] UnknownTarget),

    #[error("FLOWFORGE_RUN_TIMEOUT_SECS must be a positive number of seconds: {0}")]
    InvalidTimeout(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct FlowforgeConfig {
    pub home: PathBuf,
    pub bind: SocketAddr,
    pub target: Target,
    pub python: String,
    pub block_stale: bool,
    pub run_timeout: Option<Duration>,
}

impl FlowforgeConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - FLOWFORGE_HOME: definitions and compiled output (default: ./flowforge-home)
    /// - FLOWFORGE_BIND: socket address to bind (default: 127.0.0.1:8000)
    /// - FLOWFORGE_TARGET: agent framework to emit (default: pydantic-ai)
    /// - FLOWFORGE_PYTHON: interpreter used to run workflows (default: python3)
    /// - FLOWFORGE_BLOCK_STALE: refuse to run a stale artifact (default: false)
    /// - FLOWFORGE_RUN_TIMEOUT_SECS: kill runs that take longer (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = std::env::var("FLOWFORGE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("flowforge-home"));

        let bind_str =
            std::env::var("FLOWFORGE_BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let target = match std::env::var("FLOWFORGE_TARGET") {
            Ok(t) if !t.is_empty() => t.parse()?,
            _ => Target::PydanticAi,
        };

        let python = std::env::var("FLOWFORGE_PYTHON")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "python3".to_string());

        let block_stale = std::env::var("FLOWFORGE_BLOCK_STALE")
            .map(|v| v == "true" || v == "1" || v == "yes")
            .unwrap_or(false);

        let run_timeout = match std::env::var("FLOWFORGE_RUN_TIMEOUT_SECS") {
            Ok(v) if !v.is_empty() => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::InvalidTimeout(v)),
            },
            _ => None,
        };

        Ok(Self {
            home,
            bind,
            target,
            python,
            block_stale,
            run_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests in this module mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "FLOWFORGE_HOME",
        "FLOWFORGE_BIND",
        "FLOWFORGE_TARGET",
        "FLOWFORGE_PYTHON",
        "FLOWFORGE_BLOCK_STALE",
        "FLOWFORGE_RUN_TIMEOUT_SECS",
    ];

    fn clear_env() {
        // SAFETY: test-only code, serialized by ENV_LOCK
        unsafe {
            for var in VARS {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn config_loads_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = FlowforgeConfig::from_env().unwrap();

        assert_eq!(config.home, PathBuf::from("flowforge-home"));
        assert_eq!(config.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.target, Target::PydanticAi);
        assert_eq!(config.python, "python3");
        assert!(!config.block_stale);
        assert!(config.run_timeout.is_none());
    }

    #[test]
    fn config_reads_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_LOCK
        unsafe {
            std::env::set_var("FLOWFORGE_HOME", "/srv/flowforge");
            std::env::set_var("FLOWFORGE_BIND", "0.0.0.0:9100");
            std::env::set_var("FLOWFORGE_TARGET", "crewai");
            std::env::set_var("FLOWFORGE_PYTHON", "/opt/venv/bin/python");
            std::env::set_var("FLOWFORGE_BLOCK_STALE", "true");
            std::env::set_var("FLOWFORGE_RUN_TIMEOUT_SECS", "30");
        }

        let config = FlowforgeConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.home, PathBuf::from("/srv/flowforge"));
        assert_eq!(config.bind.port(), 9100);
        assert_eq!(config.target, Target::CrewAi);
        assert_eq!(config.python, "/opt/venv/bin/python");
        assert!(config.block_stale);
        assert_eq!(config.run_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn config_rejects_invalid_bind() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_LOCK
        unsafe {
            std::env::set_var("FLOWFORGE_BIND", "not-an-address");
        }

        let result = FlowforgeConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidBind(_))));
    }

    #[test]
    fn config_rejects_unknown_target() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_LOCK
        unsafe {
            std::env::set_var("FLOWFORGE_TARGET", "langgraph");
        }

        let result = FlowforgeConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidTarget(_))));
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_LOCK
        unsafe {
            std::env::set_var("FLOWFORGE_RUN_TIMEOUT_SECS", "0");
        }

        let result = FlowforgeConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))));
    }
}
