use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing and lifetime settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub signing_secret: String,
    pub access_token_ttl_seconds: i64,   // default 3600 (1 hour)
    pub refresh_token_ttl_hours: i64,    // default 1440 (60 days)
}

const MAX_ACCESS_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24 * 30;
const MAX_REFRESH_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

impl AuthSettings {
    /// Reject settings that would issue unusable tokens or overflow
    /// timestamp arithmetic at login.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.signing_secret must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_ACCESS_TOKEN_TTL_SECONDS).contains(&self.access_token_ttl_seconds) {
            return Err(ConfigError::Message(format!(
                "auth.access_token_ttl_seconds must be between 1 and {}",
                MAX_ACCESS_TOKEN_TTL_SECONDS
            )));
        }
        if !(1..=MAX_REFRESH_TOKEN_TTL_HOURS).contains(&self.refresh_token_ttl_hours) {
            return Err(ConfigError::Message(format!(
                "auth.refresh_token_ttl_hours must be between 1 and {}",
                MAX_REFRESH_TOKEN_TTL_HOURS
            )));
        }
        Ok(())
    }
}

/// Load settings from `configuration.yaml` (optional) and `APP__*`
/// environment variables, e.g. `APP__AUTH__SIGNING_SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("auth.access_token_ttl_seconds", 3600)?
        .set_default("auth.refresh_token_ttl_hours", 1440)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
