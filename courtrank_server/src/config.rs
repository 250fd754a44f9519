use std::env;

use chrono::Duration;
use cr_common::Secret;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_CR_HOST: &str = "127.0.0.1";
const DEFAULT_CR_PORT: u16 = 8390;
const DEFAULT_CONFIRM_WINDOW: Duration = Duration::hours(24);
const DEFAULT_CHALLENGE_TTL: Duration = Duration::hours(168);
const DEFAULT_INVITE_TTL: Duration = Duration::hours(1);
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// How long the opponent has to confirm or contest a posted result before the sweep auto-accepts it.
    pub confirm_window: Duration,
    /// How long a challenge stays pending before the sweep expires it.
    pub challenge_ttl: Duration,
    /// How long an open invite token stays redeemable before the sweep expires it.
    pub invite_ttl: Duration,
    /// The interval between sweep runs, in seconds. Zero disables the sweep worker entirely.
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CR_HOST.to_string(),
            port: DEFAULT_CR_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            confirm_window: DEFAULT_CONFIRM_WINDOW,
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            invite_ttl: DEFAULT_INVITE_TTL,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CR_HOST").ok().unwrap_or_else(|| DEFAULT_CR_HOST.into());
        let port = env::var("CR_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for CR_PORT. {e} Using the default, {DEFAULT_CR_PORT}, instead.");
                    DEFAULT_CR_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CR_PORT);
        let database_url = env::var("CR_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CR_DATABASE_URL is not set. Please set it to the URL for the CourtRank database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let (confirm_window, challenge_ttl, invite_ttl) = configure_timeouts();
        let sweep_interval_secs = env::var("CR_SWEEP_INTERVAL_SECS")
            .map_err(|_| {
                info!(
                    "🪛️ CR_SWEEP_INTERVAL_SECS is not set. Using the default value of {DEFAULT_SWEEP_INTERVAL_SECS} \
                     seconds."
                )
            })
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for CR_SWEEP_INTERVAL_SECS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        if sweep_interval_secs == 0 {
            warn!(
                "🪛️ CR_SWEEP_INTERVAL_SECS is 0, so the sweep worker is disabled. Overdue results will not be \
                 auto-accepted and stale challenges will not expire until the sweep endpoints are called manually."
            );
        }
        Self { host, port, database_url, auth, confirm_window, challenge_ttl, invite_ttl, sweep_interval_secs }
    }
}

fn duration_from_env(var: &str, default: Duration) -> Duration {
    env::var(var)
        .map_err(|_| info!("🪛️ {var} is not set. Using the default value of {} hrs.", default.num_hours()))
        .and_then(|s| {
            s.parse::<i64>().map(Duration::hours).map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}"))
        })
        .ok()
        .unwrap_or(default)
}

fn configure_timeouts() -> (Duration, Duration, Duration) {
    let confirm_window = duration_from_env("CR_CONFIRM_WINDOW_HOURS", DEFAULT_CONFIRM_WINDOW);
    let challenge_ttl = duration_from_env("CR_CHALLENGE_TTL_HOURS", DEFAULT_CHALLENGE_TTL);
    let invite_ttl = duration_from_env("CR_INVITE_TTL_HOURS", DEFAULT_INVITE_TTL);
    (confirm_window, challenge_ttl, invite_ttl)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign and verify player access tokens.
    pub auth_secret: Secret<String>,
    /// The shared secret that gates the admin endpoints.
    pub admin_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The token signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this, since every player token becomes invalid when the server restarts. Set \
             the CR_AUTH_SECRET and CR_ADMIN_SECRET environment variables instead. 🚨️🚨️🚨️"
        );
        Self { auth_secret: Secret::new(random_secret()), admin_secret: Secret::new(random_secret()) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, crate::errors::ServerError> {
        let auth_secret = env::var("CR_AUTH_SECRET")
            .map_err(|e| crate::errors::ServerError::ConfigurationError(format!("{e} [CR_AUTH_SECRET]")))?;
        let admin_secret = env::var("CR_ADMIN_SECRET")
            .map_err(|e| crate::errors::ServerError::ConfigurationError(format!("{e} [CR_ADMIN_SECRET]")))?;
        Ok(Self { auth_secret: Secret::new(auth_secret), admin_secret: Secret::new(admin_secret) })
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect()
}

//-------------------------------------------------  FlowSettings  -----------------------------------------------------
/// The subset of the server configuration that request handlers need. Kept small, and free of secrets, so it can be
/// passed around the system as app data.
#[derive(Clone, Copy, Debug)]
pub struct FlowSettings {
    pub confirm_window: Duration,
    pub challenge_ttl: Duration,
    pub invite_ttl: Duration,
}

impl FlowSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            confirm_window: config.confirm_window,
            challenge_ttl: config.challenge_ttl,
            invite_ttl: config.invite_ttl,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::new("0.0.0.0", 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4000);
        assert_eq!(config.confirm_window, Duration::hours(24));
        assert_eq!(config.challenge_ttl, Duration::days(7));
        assert_eq!(config.invite_ttl, Duration::hours(1));
        assert_eq!(config.sweep_interval_secs, 300);
    }

    #[test]
    fn default_secrets_are_random_and_masked() {
        let a = AuthConfig::default();
        let b = AuthConfig::default();
        assert_ne!(a.auth_secret.reveal(), b.auth_secret.reveal());
        assert_eq!(format!("{:?}", a.auth_secret), "****");
    }
}
