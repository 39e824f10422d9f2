use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:3333/buyer";
const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_FORGOT_PASSWORD_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("expected a positive number of milliseconds, got {0:?}")]
    InvalidTimeout(String),
    #[error("expected an http:// or https:// URL, got {0:?}")]
    InvalidBackendUrl(String),
}

/// Upper bound for each outbound call, per flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimeouts {
    pub login: Duration,
    pub forgot_password: Duration,
    pub registration: Duration,
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_TIMEOUT,
            forgot_password: DEFAULT_FORGOT_PASSWORD_TIMEOUT,
            registration: DEFAULT_REGISTRATION_TIMEOUT,
        }
    }
}

/// Gateway settings; every flag can also come from the environment or `.env`.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about = "Buyer form gateway", long_about = None)]
pub struct AppConfig {
    /// address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,
    /// base URL every forwarded call is sent to
    #[arg(
        long,
        env = "BACKEND_BASE_URL",
        default_value = DEFAULT_BACKEND_BASE_URL,
        value_parser = parse_backend_url
    )]
    pub backend_base_url: String,
    /// login call timeout in milliseconds
    #[arg(
        long = "login-timeout-ms",
        env = "LOGIN_TIMEOUT_MS",
        default_value = "10000",
        value_parser = parse_timeout_ms
    )]
    pub login_timeout: Duration,
    /// forgot-password call timeout in milliseconds
    #[arg(
        long = "forgot-password-timeout-ms",
        env = "FORGOT_PASSWORD_TIMEOUT_MS",
        default_value = "10000",
        value_parser = parse_timeout_ms
    )]
    pub forgot_password_timeout: Duration,
    /// registration call timeout in milliseconds
    #[arg(
        long = "registration-timeout-ms",
        env = "REGISTRATION_TIMEOUT_MS",
        default_value = "30000",
        value_parser = parse_timeout_ms
    )]
    pub registration_timeout: Duration,
    /// reject invalid submissions with 400 instead of forwarding them
    #[arg(
        long,
        env = "VALIDATE_SUBMISSIONS",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub validate_submissions: bool,
    /// comma-separated browser origins allowed by CORS
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Reads flags and the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, clap::Error> {
        if dotenv::dotenv().is_ok() {
            debug!("Loaded .env file");
        }
        Self::try_parse()
    }

    pub fn timeouts(&self) -> FlowTimeouts {
        FlowTimeouts {
            login: self.login_timeout,
            forgot_password: self.forgot_password_timeout,
            registration: self.registration_timeout,
        }
    }

    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn parse_backend_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::InvalidBackendUrl(raw.to_string()))
    }
}
