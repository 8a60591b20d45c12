use std::{env, io::Write};

use chrono::Duration;
use log::*;
use marketplace_engine::mkt_api::account_objects::Registration;
use mkt_common::{helpers::parse_boolean_flag, Secret};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(48);
const DEFAULT_EXPIRY_CHECK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Run the embedded migrations when the server starts
    pub auto_migrate: bool,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The time before an order without a payment report is cancelled.
    pub unpaid_order_timeout: Duration,
    /// How often the expiry worker looks for stale orders.
    pub expiry_check_interval: std::time::Duration,
    /// If set, this admin account is created (or promoted) on startup.
    pub admin: Option<AdminBootstrap>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auto_migrate: true,
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            expiry_check_interval: DEFAULT_EXPIRY_CHECK_INTERVAL,
            admin: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env::var("MKT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKT_PORT. {e} Using the default, {DEFAULT_MKT_PORT}, instead."
                    );
                    DEFAULT_MKT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auto_migrate = parse_boolean_flag(env::var("MKT_AUTO_MIGRATE").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("MKT_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("MKT_USE_FORWARDED").ok(), false);
        let unpaid_order_timeout = configure_unpaid_order_timeout();
        let expiry_check_interval = configure_expiry_check_interval();
        let admin = AdminBootstrap::from_env();
        Self {
            host,
            port,
            database_url,
            auto_migrate,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            unpaid_order_timeout,
            expiry_check_interval,
            admin,
        }
    }
}

fn configure_unpaid_order_timeout() -> Duration {
    env::var("MKT_UNPAID_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ MKT_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid configuration value for MKT_UNPAID_ORDER_TIMEOUT. {e}"))
        })
        .and_then(|h| {
            if h > 0 {
                Ok(Duration::hours(h))
            } else {
                warn!("🪛️ MKT_UNPAID_ORDER_TIMEOUT must be at least one hour");
                Err(())
            }
        })
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT)
}

fn configure_expiry_check_interval() -> std::time::Duration {
    env::var("MKT_EXPIRY_CHECK_INTERVAL")
        .map_err(|_| {
            info!(
                "🪛️ MKT_EXPIRY_CHECK_INTERVAL is not set. Using the default value of {} s.",
                DEFAULT_EXPIRY_CHECK_INTERVAL.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for MKT_EXPIRY_CHECK_INTERVAL. {e}"))
        })
        .and_then(|secs| {
            if secs > 0 {
                Ok(std::time::Duration::from_secs(secs))
            } else {
                warn!("🪛️ MKT_EXPIRY_CHECK_INTERVAL must be at least one second");
                Err(())
            }
        })
        .ok()
        .unwrap_or(DEFAULT_EXPIRY_CHECK_INTERVAL)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an access token stays valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT operate \
             on production like this since every token is invalidated when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "MKT_JWT_SECRET={secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, you \
                     are doing it wrong! Set the MKT_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("MKT_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [MKT_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "MKT_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        let token_lifetime = match env::var("MKT_JWT_EXPIRY_HOURS") {
            Ok(s) => match s.parse::<i64>() {
                Ok(h) if h > 0 => Duration::hours(h),
                _ => {
                    warn!("🪛️ Invalid configuration value for MKT_JWT_EXPIRY_HOURS: {s}. Using the default.");
                    DEFAULT_TOKEN_LIFETIME
                },
            },
            Err(_) => DEFAULT_TOKEN_LIFETIME,
        };
        Ok(Self::new(secret, token_lifetime))
    }
}

//-------------------------------------------------  AdminBootstrap  ---------------------------------------------------
/// Credentials for the admin account that is created when the server starts.
#[derive(Clone, Debug)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
}

impl AdminBootstrap {
    pub fn from_env() -> Option<Self> {
        let username = env::var("MKT_ADMIN_USERNAME").ok();
        let email = env::var("MKT_ADMIN_EMAIL").ok();
        let password = env::var("MKT_ADMIN_PASSWORD").ok();
        match (username, email, password) {
            (Some(username), Some(email), Some(password)) => {
                info!("🪛️ Bootstrap admin account '{username}' is configured");
                Some(Self { username, email, password: Secret::new(password) })
            },
            (None, None, None) => None,
            _ => {
                warn!(
                    "🪛️ MKT_ADMIN_USERNAME, MKT_ADMIN_EMAIL and MKT_ADMIN_PASSWORD must all be set to create an admin \
                     account. Skipping."
                );
                None
            },
        }
    }

    pub fn registration(&self) -> Registration {
        Registration::new(self.username.as_str(), self.email.as_str(), self.password.reveal().as_str())
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
