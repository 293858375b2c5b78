use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub invite: InviteConfig,
    pub services: ServicesConfig,
    /// Outbound invite mail configuration
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::DatabaseConfig {
        persistence::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Shared secret for service-to-service calls, sent in `Authorization`.
    #[serde(default)]
    pub internal_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteConfig {
    /// Public URL prefix that invite tokens are appended to.
    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            link_prefix: default_link_prefix(),
        }
    }
}

/// Addresses of the platform services this one calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    pub account_address: String,
    pub auth_address: String,

    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

/// SMTP settings for invite letters.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Whether invite letters are sent at all
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: String,

    #[serde(default)]
    pub smtp_password: String,

    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Minimum spacing between two sends while deliveries succeed
    #[serde(default = "default_mail_timespan")]
    pub timespan_secs: u64,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl MailConfig {
    pub fn timespan(&self) -> Duration {
        Duration::from_secs(self.timespan_secs)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            timespan_secs: default_mail_timespan(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_link_prefix() -> String {
    domain::services::DEFAULT_LINK_PREFIX.to_string()
}
fn default_client_timeout() -> u64 {
    10
}
fn default_smtp_port() -> u16 {
    25
}
fn default_sender_email() -> String {
    "noreply@nl-mail.ru".to_string()
}
fn default_sender_name() -> String {
    "Groups".to_string()
}
fn default_mail_timespan() -> u64 {
    1
}
fn default_queue_capacity() -> usize {
    domain::services::QUEUE_CAPACITY
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration (optional)
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with GROUPS__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("GROUPS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            internal_secret = "test-secret"

            [services]
            account_address = "http://localhost:8081"
            auth_address = "http://localhost:8082"

            [mail]
            enabled = false
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "GROUPS__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.security.internal_secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "GROUPS__SECURITY__INTERNAL_SECRET environment variable must be set".to_string(),
            ));
        }

        if self.mail.enabled && self.mail.smtp_host.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "mail.smtp_host is required when mail is enabled".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
