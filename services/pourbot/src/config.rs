use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported backend providers for the oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub transcript_path: PathBuf,
    pub poll_interval: Duration,
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub dispense_command: String,
    pub flag_path: PathBuf,
    pub system_prompt_path: Option<PathBuf>,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let transcript_path = std::env::var("TRANSCRIPT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("transcriptions/transcriptions.txt"));

        let poll_interval_str =
            std::env::var("POLL_INTERVAL_MS").unwrap_or_else(|_| "500".to_string());
        let poll_interval_ms = poll_interval_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "POLL_INTERVAL_MS".to_string(),
                format!("'{}' is not a valid number of milliseconds", poll_interval_str),
            )
        })?;
        let poll_interval = Duration::from_millis(poll_interval_ms);

        let provider_str =
            std::env::var("ORACLE_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            _ => Provider::OpenAi,
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| match provider {
            Provider::OpenAi => "gpt-4o".to_string(),
            Provider::Gemini => "gemini-1.5-flash-latest".to_string(),
        });

        let dispense_command = std::env::var("DISPENSE_COMMAND")
            .map_err(|_| ConfigError::MissingVar("DISPENSE_COMMAND".to_string()))?;
        if dispense_command.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "DISPENSE_COMMAND".to_string(),
                "command must not be empty".to_string(),
            ));
        }

        let flag_path = std::env::var("DISPENSE_FLAG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dispense_done.flag"));

        let system_prompt_path = std::env::var("SYSTEM_PROMPT_PATH").map(PathBuf::from).ok();

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        match provider {
            Provider::OpenAi => {
                if openai_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                    ));
                }
            }
            Provider::Gemini => {
                if gemini_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            transcript_path,
            poll_interval,
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            dispense_command,
            flag_path,
            system_prompt_path,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("TRANSCRIPT_PATH");
            env::remove_var("POLL_INTERVAL_MS");
            env::remove_var("ORACLE_PROVIDER");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("DISPENSE_COMMAND");
            env::remove_var("DISPENSE_FLAG_PATH");
            env::remove_var("SYSTEM_PROMPT_PATH");
            env::remove_var("RUST_LOG");
        }
    }

    fn set_minimal_env_openai() {
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
            env::set_var("DISPENSE_COMMAND", "/usr/local/bin/dispense");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_openai() {
        clear_env_vars();
        set_minimal_env_openai();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(
            config.transcript_path,
            PathBuf::from("transcriptions/transcriptions.txt")
        );
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.openai_api_key, Some("test-openai-key".to_string()));
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.dispense_command, "/usr/local/bin/dispense");
        assert_eq!(config.flag_path, PathBuf::from("dispense_done.flag"));
        assert_eq!(config.system_prompt_path, None);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_gemini_provider() {
        clear_env_vars();
        unsafe {
            env::set_var("ORACLE_PROVIDER", "gemini");
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("DISPENSE_COMMAND", "dispense");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.gemini_api_key, Some("test-gemini-key".to_string()));
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.chat_model, "gemini-1.5-flash-latest");
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("TRANSCRIPT_PATH", "/var/log/transcripts.txt");
            env::set_var("POLL_INTERVAL_MS", "250");
            env::set_var("ORACLE_PROVIDER", "openai");
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("CHAT_MODEL", "gpt-4o-mini");
            env::set_var("DISPENSE_COMMAND", "dispense --valve 2");
            env::set_var("DISPENSE_FLAG_PATH", "/tmp/dispensed.flag");
            env::set_var("SYSTEM_PROMPT_PATH", "/etc/pourbot/prompt.md");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(
            config.transcript_path,
            PathBuf::from("/var/log/transcripts.txt")
        );
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.dispense_command, "dispense --valve 2");
        assert_eq!(config.flag_path, PathBuf::from("/tmp/dispensed.flag"));
        assert_eq!(
            config.system_prompt_path,
            Some(PathBuf::from("/etc/pourbot/prompt.md"))
        );
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_config_missing_dispense_command() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "DISPENSE_COMMAND"),
            _ => panic!("Expected MissingVar for DISPENSE_COMMAND"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_provider_key() {
        clear_env_vars();
        unsafe {
            env::set_var("ORACLE_PROVIDER", "gemini");
            env::set_var("DISPENSE_COMMAND", "dispense");
        }

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    #[serial]
    fn test_config_invalid_poll_interval() {
        clear_env_vars();
        set_minimal_env_openai();
        unsafe {
            env::set_var("POLL_INTERVAL_MS", "half-a-second");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "POLL_INTERVAL_MS"),
            _ => panic!("Expected InvalidValue for POLL_INTERVAL_MS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env_openai();
        unsafe {
            env::set_var("RUST_LOG", "chatty");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }
}
