use ::config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::environment::RuntimeMode;
use crate::error::{RelayError, RelayResult};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAILER_HOST: &str = "localhost";
pub const DEFAULT_MAILER_PORT: u16 = 587;
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 2 * 1024 * 1024; // 2MiB
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024; // 8MiB
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = [".doc", ".docx", ".pdf"];

/// Environment variables read into [`Settings`].
pub const RECOGNISED_VARS: [&str; 16] = [
    "NODE_ENV",
    "PORT",
    "BIND_ADDRESS",
    "CORS_ORIGIN",
    "MAIL_TO",
    "MAIL_FROM",
    "MAILER_HOST",
    "MAILER_PORT",
    "MAILER_USER",
    "MAILER_PASS",
    "MAX_UPLOAD_SIZE",
    "UPLOAD_REJECTION_STATUS",
    "MAX_REQUEST_SIZE",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "LOG_FILE",
];

/// Flat view of the process environment (and optional config file), one
/// field per recognised variable. Empty variables are treated as unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub node_env: Option<String>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub cors_origin: Option<String>,
    pub mail_to: Option<String>,
    pub mail_from: Option<String>,
    pub mailer_host: Option<String>,
    pub mailer_port: Option<u16>,
    pub mailer_user: Option<String>,
    pub mailer_pass: Option<String>,
    pub max_upload_size: Option<usize>,
    pub upload_rejection_status: Option<String>,
    pub max_request_size: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: RuntimeMode,
    pub server: ServerConfig,
    pub mail: MailConfig,
    pub mailer: MailerConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub max_request_size: usize,
}

/// Addresses the contact form is relayed between. `None` when the variable
/// is unset or empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailConfig {
    pub to: Option<String>,
    pub from: Option<String>,
}

/// Connection parameters for the configured (non-disposable) SMTP host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub allowed_extensions: Vec<String>,
    pub max_file_size: usize,
    pub rejection_status: RejectionStatus,
}

/// How upload rejections are reported over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionStatus {
    /// 400 for every rejection.
    Uniform,
    /// 415 for a disallowed type, 413 for an oversized file, 400 otherwise.
    Specific,
}

impl FromStr for RejectionStatus {
    type Err = RelayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "uniform" | "400" => Ok(Self::Uniform),
            "specific" => Ok(Self::Specific),
            other => Err(RelayError::configuration(format!(
                "UPLOAD_REJECTION_STATUS must be 'uniform' or 'specific', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from `.env` (outside production), an optional
    /// `config/default` file and the process environment.
    pub fn load() -> RelayResult<Self> {
        if !RuntimeMode::from_env().is_production() {
            dotenvy::dotenv().ok();
        }

        let vars: Map<String, String> = std::env::vars()
            .filter(|(key, _)| RECOGNISED_VARS.contains(&key.as_str()))
            .collect();

        let settings: Settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::default().source(Some(vars)).ignore_empty(true))
            .build()?
            .try_deserialize()?;

        Self::from_settings(settings)
    }

    pub fn from_settings(settings: Settings) -> RelayResult<Self> {
        let mode = RuntimeMode::classify(settings.node_env.as_deref());

        let rejection_status = settings
            .upload_rejection_status
            .as_deref()
            .map(RejectionStatus::from_str)
            .transpose()?
            .unwrap_or(RejectionStatus::Specific);

        let default_level = if mode.is_production() { "warn" } else { "debug" };
        let level = non_empty(settings.log_level).unwrap_or_else(|| default_level.to_string());

        Ok(Self {
            mode,
            server: ServerConfig {
                host: non_empty(settings.bind_address).unwrap_or_else(|| "0.0.0.0".to_string()),
                port: settings.port.unwrap_or(DEFAULT_PORT),
                cors_origins: settings
                    .cors_origin
                    .as_deref()
                    .map(split_origins)
                    .unwrap_or_default(),
                max_request_size: settings.max_request_size.unwrap_or(DEFAULT_MAX_REQUEST_SIZE),
            },
            mail: MailConfig {
                to: non_empty(settings.mail_to),
                from: non_empty(settings.mail_from),
            },
            mailer: MailerConfig {
                host: non_empty(settings.mailer_host)
                    .unwrap_or_else(|| DEFAULT_MAILER_HOST.to_string()),
                port: settings.mailer_port.unwrap_or(DEFAULT_MAILER_PORT),
                username: non_empty(settings.mailer_user),
                password: settings.mailer_pass,
            },
            upload: UploadConfig {
                allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
                max_file_size: settings.max_upload_size.unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
                rejection_status,
            },
            logging: LoggingConfig {
                level,
                format: non_empty(settings.log_format).unwrap_or_else(|| "pretty".to_string()),
                file_path: non_empty(settings.log_file),
            },
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_settings(Settings::default())
            .unwrap_or_else(|_| unreachable!("default settings are always valid"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.mode, RuntimeMode::Unspecified);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.mailer.host, "localhost");
        assert_eq!(config.mailer.port, 587);
        assert_eq!(config.upload.max_file_size, 2_097_152);
        assert_eq!(config.upload.allowed_extensions, vec![".doc", ".docx", ".pdf"]);
        assert_eq!(config.upload.rejection_status, RejectionStatus::Specific);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_production_logs_warnings_only() {
        let config = AppConfig::from_settings(Settings {
            node_env: Some("production".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.mode, RuntimeMode::Production);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_cors_origins_split_on_whitespace() {
        let config = AppConfig::from_settings(Settings {
            cors_origin: Some("https://a.example  https://b.example\thttps://c.example".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[test]
    fn test_blank_addresses_are_unset() {
        let config = AppConfig::from_settings(Settings {
            mail_to: Some("   ".into()),
            mail_from: Some("".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(config.mail.to.is_none());
        assert!(config.mail.from.is_none());
    }

    #[test]
    fn test_rejection_status_parsing() {
        assert_eq!("uniform".parse::<RejectionStatus>().unwrap(), RejectionStatus::Uniform);
        assert_eq!("400".parse::<RejectionStatus>().unwrap(), RejectionStatus::Uniform);
        assert_eq!("Specific".parse::<RejectionStatus>().unwrap(), RejectionStatus::Specific);
        assert!("teapot".parse::<RejectionStatus>().is_err());

        let result = AppConfig::from_settings(Settings {
            upload_rejection_status: Some("418".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(RelayError::Configuration { .. })));
    }
}
