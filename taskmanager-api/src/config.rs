/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file loaded
/// first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string; the in-memory store is used when unset
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `AUTH_TOKEN_LENGTH`: Length of issued auth tokens (default: 20, 16 to 127)
/// - `RUST_LOG`: Log filter (default: taskmanager_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use taskmanager_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;

use taskmanager_shared::auth::token::{DEFAULT_TOKEN_LENGTH, MAX_TOKEN_LENGTH, MIN_TOKEN_LENGTH};
use taskmanager_shared::db::pool::DatabaseConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    /// `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,

    pub auth: AuthConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (enables HSTS)
    pub production: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Auth token configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Characters per issued token
    pub token_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: None,
            auth: AuthConfig {
                token_length: DEFAULT_TOKEN_LENGTH,
            },
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value or the
    /// token length is below the minimum.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = lookup("API_HOST").unwrap_or(defaults.api.host);
        let port = match lookup("API_PORT") {
            Some(port) => port.parse::<u16>()?,
            None => defaults.api.port,
        };
        let production = match lookup("API_PRODUCTION") {
            Some(flag) => flag.parse::<bool>()?,
            None => defaults.api.production,
        };
        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.api.cors_origins,
        };

        let database = match lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => {
                let mut database = DatabaseConfig {
                    url,
                    ..Default::default()
                };
                if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
                    database.max_connections = max.parse::<u32>()?;
                }
                Some(database)
            }
            None => None,
        };

        let token_length = match lookup("AUTH_TOKEN_LENGTH") {
            Some(length) => length.parse::<usize>()?,
            None => defaults.auth.token_length,
        };
        if !(MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&token_length) {
            anyhow::bail!(
                "AUTH_TOKEN_LENGTH must be between {} and {} characters",
                MIN_TOKEN_LENGTH,
                MAX_TOKEN_LENGTH
            );
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            database,
            auth: AuthConfig { token_length },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
