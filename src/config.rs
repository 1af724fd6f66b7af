//! Process-wide configuration, loaded once at startup and immutable after.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow};
use ledger::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Credentials and endpoint of the storage engine.
    pub database_url: String,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Per-call deadline.
    pub command_timeout: Duration,
    /// Retries after the first attempt on serialization conflicts.
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
}

impl Settings {
    /// Reads configuration from the environment (and `.env` when present).
    /// Malformed values fail startup instead of being silently defaulted.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://finledger.db".to_string());
        let storage = StorageSettings {
            command_timeout: Duration::from_secs(parse_or(
                "STORAGE_COMMAND_TIMEOUT_SECONDS",
                30,
            )?),
            retry_max_attempts: parse_or("STORAGE_RETRY_MAX_ATTEMPTS", 3)?,
            retry_base_delay: Duration::from_millis(parse_or("STORAGE_RETRY_BASE_DELAY_MS", 10)?),
        };
        Ok(Self {
            database_url,
            storage,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.storage.retry_max_attempts,
            base_delay: self.storage.retry_base_delay,
            command_timeout: self.storage.command_timeout,
        }
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| anyhow!("invalid value for {name}: {err}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_or;

    #[test]
    fn absent_variables_fall_back_to_defaults() {
        assert_eq!(parse_or("FINLEDGER_TEST_UNSET_VARIABLE", 30u64).unwrap(), 30);
    }

    #[test]
    fn malformed_values_are_errors() {
        // SAFETY: test-local variable name, nothing else reads it
        unsafe { std::env::set_var("FINLEDGER_TEST_MALFORMED", "not-a-number") };
        assert!(parse_or("FINLEDGER_TEST_MALFORMED", 30u64).is_err());
        unsafe { std::env::remove_var("FINLEDGER_TEST_MALFORMED") };
    }
}
