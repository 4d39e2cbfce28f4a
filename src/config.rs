use sqlx::mysql::MySqlConnectOptions;
use sqlx::ConnectOptions;

/// Rows processed per loader batch (pacing and logging unit, not a transaction)
pub const BATCH_SIZE: usize = 50;

/// Maximum ids bound into a single existence probe query
pub const PROBE_BATCH_SIZE: usize = 20;

/// Detailed diagnostics emitted per entity before the rest are suppressed
pub const LOG_FIRST_N: u32 = 5;

/// Connection attempts before the run is declared fatal
pub const CONNECT_MAX_RETRIES: u32 = 3;

/// Delay between connection attempts
pub const CONNECT_RETRY_DELAY_SECS: u64 = 2;

/// Pool acquire timeout
pub const ACQUIRE_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_PASSWORD: &str = "";
pub const DEFAULT_DB_NAME: &str = "travel_booking";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Connection settings for the target store.
///
/// `url` wins when present; otherwise a MySQL URL is assembled from the parts.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_size: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            database: DEFAULT_DB_NAME.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl DbConfig {
    /// Config for a URL that is used as-is (SQLite files, test databases).
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// URL handed to the pool. Built through the MySQL options so user and
    /// password are percent-encoded.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let mut opts = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        if !self.password.is_empty() {
            opts = opts.password(&self.password);
        }
        opts.to_url_lossy().to_string()
    }

    /// Connection target with the password masked, for logs.
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(url) => match url.split_once('@') {
                Some((_, rest)) => format!("***@{rest}"),
                None => url.clone(),
            },
            None => format!(
                "{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}
