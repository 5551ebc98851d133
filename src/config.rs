use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

/// Chokai Admin - console client for the listening-exam platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Backend API origin
    #[arg(short = 'u', long, env = "CHOKAI_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Path to the credential database
    #[arg(
        short = 'c',
        long,
        env = "CHOKAI_CREDENTIALS_FILE",
        default_value = "chokai-credentials.db"
    )]
    pub credentials_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "120")]
    pub request_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        /// Account email; prompted for when omitted
        #[arg(long)]
        email: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show the logged-in user's profile
    Whoami,
    /// Exam operations
    Exams {
        #[command(subcommand)]
        command: ExamCommand,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ExamCommand {
    /// List exams
    List,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub credentials_file: PathBuf,
    pub log_level: String,
    pub connect_timeout: u64,
    pub request_timeout: u64,
}

impl Config {
    /// Load configuration with priority: CLI > environment > defaults.
    /// Returns the selected subcommand alongside the settings.
    pub fn load() -> Result<(Self, Command)> {
        // Pick up a .env file when present
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let config = Self {
            api_url: args.api_url,
            credentials_file: args.credentials_file,
            log_level: args.log_level,
            connect_timeout: args.connect_timeout,
            request_timeout: args.request_timeout,
        };
        config.validate()?;

        Ok((config, args.command))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!("API URL must start with http:// or https://: {}", self.api_url);
        }
        if self.connect_timeout == 0 || self.request_timeout == 0 {
            bail!("HTTP timeouts must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            api_url: "http://localhost:8000".to_string(),
            credentials_file: PathBuf::from("creds.db"),
            log_level: "info".to_string(),
            connect_timeout: 10,
            request_timeout: 120,
        }
    }

    #[test]
    fn test_validate_accepts_http_origin() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut config = base_config();
        config.api_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = base_config();
        config.request_timeout = 0;
        assert!(config.validate().is_err());
    }
}
