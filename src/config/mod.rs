use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

use crate::domain::{AssignIdOn, AwardPolicy};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub members: MemberConfig,
    #[serde(default)]
    pub points: PointsConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL of the frontend, used for links in outgoing mail.
    pub base_url: String,
    pub uploads_dir: String,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Key for signing attendance QR tokens.
    pub session_secret: String,
    pub session_duration_hours: i64,
    pub verification_token_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemberConfig {
    pub id_prefix: String,
    pub default_category: String,
    pub assign_id_on: AssignIdOn,
}

impl Default for MemberConfig {
    fn default() -> Self {
        Self {
            id_prefix: "DAIC".to_string(),
            default_category: "GEN".to_string(),
            assign_id_on: AssignIdOn::Registration,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PointsConfig {
    #[serde(default)]
    pub award_policy: AwardPolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from_address: "Clubhouse <no-reply@localhost>".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:3000")?
            .set_default("server.uploads_dir", "uploads")?
            .set_default("database.url", "sqlite://clubhouse.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_secret", "change-me-in-production")?
            .set_default("auth.session_duration_hours", 168)?
            .set_default("auth.verification_token_hours", 24)?
            .set_default("members.id_prefix", "DAIC")?
            .set_default("members.default_category", "GEN")?
            .set_default("members.assign_id_on", "registration")?
            .set_default("points.award_policy", "at_most_once")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with CLUBHOUSE__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("CLUBHOUSE").separator("__"))

            .build()?;

        config.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:3000".to_string(),
                uploads_dir: "uploads".to_string(),
                cors_origin: None,
            },
            database: DatabaseConfig {
                url: "sqlite://clubhouse.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_secret: "change-me-in-production".to_string(),
                session_duration_hours: 168,
                verification_token_hours: 24,
            },
            members: MemberConfig::default(),
            points: PointsConfig::default(),
            email: EmailConfig::default(),
        }
    }
}
