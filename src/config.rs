use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub datastore: DatastoreSettings,
    #[serde(default)]
    pub zone: ZoneSettings,
    #[serde(default)]
    pub estimator: EstimatorSettings,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreSettings {
    pub url: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
    #[serde(default)]
    pub tables: TableSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    #[serde(default = "default_messages_table")]
    pub messages: String,
    #[serde(default = "default_product_chats_table")]
    pub product_chats: String,
    #[serde(default = "default_requests_table")]
    pub requests: String,
    #[serde(default = "default_donations_table")]
    pub donations: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            messages: default_messages_table(),
            product_chats: default_product_chats_table(),
            requests: default_requests_table(),
            donations: default_donations_table(),
        }
    }
}

fn default_feed_limit() -> usize { 500 }

fn default_messages_table() -> String { "messages".to_string() }
fn default_product_chats_table() -> String { "product_chats".to_string() }
fn default_requests_table() -> String { "requests".to_string() }
fn default_donations_table() -> String { "donations".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSettings {
    #[serde(default = "default_radius_meters")]
    pub radius_meters: u32,
    #[serde(default = "default_max_radius_meters")]
    pub max_radius_meters: u32,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_product_cache_size")]
    pub product_cache_size: u64,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            radius_meters: default_radius_meters(),
            max_radius_meters: default_max_radius_meters(),
            cache_ttl_secs: default_cache_ttl_secs(),
            channel_capacity: default_channel_capacity(),
            product_cache_size: default_product_cache_size(),
        }
    }
}

fn default_radius_meters() -> u32 { 1000 }
fn default_max_radius_meters() -> u32 { 50_000 }
fn default_cache_ttl_secs() -> u64 { 5 }
fn default_channel_capacity() -> usize { 256 }
fn default_product_cache_size() -> u64 { 1000 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimatorSettings {
    /// Replaces the bundled rate tables when set
    pub tables_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    #[serde(default = "default_interval_millis")]
    pub interval_millis: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_timeout_secs")]
    pub max_timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_millis: default_interval_millis(),
            timeout_secs: default_timeout_secs(),
            max_timeout_secs: default_max_timeout_secs(),
        }
    }
}

fn default_interval_millis() -> u64 { 2000 }
fn default_timeout_secs() -> u64 { 60 }
fn default_max_timeout_secs() -> u64 { 120 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with WALLS_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., WALLS__ZONE__RADIUS_METERS -> zone.radius_meters
            .add_source(
                Environment::with_prefix("WALLS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("WALLS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_millis == 0 {
            return Err(ConfigError::Message(
                "poll.interval_millis must be at least 1".into(),
            ));
        }
        if self.zone.channel_capacity == 0 {
            return Err(ConfigError::Message(
                "zone.channel_capacity must be at least 1".into(),
            ));
        }
        if self.datastore.feed_limit == 0 {
            return Err(ConfigError::Message(
                "datastore.feed_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Apply the datastore variables the web client shares with this service
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let url = env::var("SUPABASE_URL")
        .or_else(|_| env::var("NEXT_PUBLIC_SUPABASE_URL"))
        .ok();
    let api_key = env::var("SUPABASE_ANON_KEY")
        .or_else(|_| env::var("NEXT_PUBLIC_SUPABASE_ANON_KEY"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = url {
        builder = builder.set_override("datastore.url", url)?;
    }
    if let Some(api_key) = api_key {
        builder = builder.set_override("datastore.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_zone_defaults() {
        let zone = ZoneSettings::default();
        assert_eq!(zone.radius_meters, 1000);
        assert_eq!(zone.max_radius_meters, 50_000);
        assert_eq!(zone.channel_capacity, 256);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    fn parse(source: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const BASE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [datastore]
        url = "https://walls.supabase.test"
        api_key = "anon"
    "#;

    #[test]
    fn test_rejects_zero_poll_interval() {
        let settings = parse(&format!("{}\n[poll]\ninterval_millis = 0\n", BASE));
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("poll.interval_millis"));
    }

    #[test]
    fn test_rejects_zero_channel_capacity() {
        let settings = parse(&format!("{}\n[zone]\nchannel_capacity = 0\n", BASE));
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("zone.channel_capacity"));
    }

    #[test]
    fn test_rejects_zero_feed_limit() {
        let source = BASE.replace("api_key = \"anon\"", "api_key = \"anon\"\nfeed_limit = 0");
        let err = parse(&source).validate().unwrap_err();
        assert!(err.to_string().contains("datastore.feed_limit"));
    }

    #[test]
    fn test_load_from_validates() {
        let path =
            std::env::temp_dir().join(format!("walls-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, format!("{}\n[poll]\ninterval_millis = 0\n", BASE)).unwrap();

        let result = Settings::load_from(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ConfigError::Message(_))));
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let source = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [datastore]
            url = "https://walls.supabase.test"
            api_key = "anon"

            [zone]
            radius_meters = 250
        "#;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.zone.radius_meters, 250);
        assert_eq!(settings.zone.cache_ttl_secs, 5);
        assert_eq!(settings.datastore.tables.messages, "messages");
        assert_eq!(settings.poll.interval_millis, 2000);
        assert_eq!(settings.datastore.feed_limit, 500);
        assert!(settings.estimator.tables_path.is_none());
        assert!(settings.validate().is_ok());
    }
}
