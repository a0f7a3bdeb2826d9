//! Configuration for the load test and the provisioning script.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables prefixed with `LOADTEST__`
//! 2. The Supabase variables `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `SUPABASE_SERVICE_KEY`
//! 3. YAML configuration file
//! 4. Defaults
//!
//! # Environment Variables
//!
//! `LOADTEST__` variables use double underscores (`__`) to denote nested configuration
//! structures. For example:
//!
//! - `LOADTEST__SLOW_REQUEST_THRESHOLD=500ms` lowers the slow request threshold
//! - `LOADTEST__SUPABASE__TIMEOUT=5s` shortens the timeout of auth requests
//!
//! # YAML Configuration File
//!
//! ```yaml
//! supabase:
//!   url: https://example.supabase.co
//!   anon_key: eyJhbGciOi...
//!   timeout: 5s
//!
//! slow_request_threshold: 500ms
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use secrecy::{CloneableSecret, ExposeSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};

/// Environment variable prefix for all load test options.
const ENV_PREFIX: &str = "LOADTEST__";

/// Prefix of the environment variables shared with the Smart Split deployment.
const SUPABASE_ENV_PREFIX: &str = "SUPABASE_";

/// Environment variable naming the YAML file read by the load test binary.
pub const CONFIG_PATH_ENV: &str = "LOADTEST_CONFIG";

/// Password shared by all accounts of the credential pool.
const DEFAULT_TEST_PASSWORD: &str = "LoadTest123!";

/// Newtype around `String` that protects against accidental logging of keys and passwords. Use
/// with [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl std::ops::Deref for ConfigSecret {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Connection settings for the Supabase auth service (GoTrue).
///
/// Used in: [`Config::supabase`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Supabase {
    /// Base URL of the Supabase project, without the `/auth/v1` suffix.
    ///
    /// # Environment Variables
    ///
    /// - `SUPABASE_URL`
    /// - `LOADTEST__SUPABASE__URL`
    pub url: String,

    /// The public anon key, sent as `apikey` when logging in test accounts.
    ///
    /// # Environment Variables
    ///
    /// - `SUPABASE_ANON_KEY`
    /// - `LOADTEST__SUPABASE__ANON_KEY`
    pub anon_key: Option<SecretBox<ConfigSecret>>,

    /// The `service_role` key, required by the admin API to create users.
    ///
    /// Get it from the Supabase dashboard under *Settings → API*. Never use this key in the load
    /// test itself.
    ///
    /// # Environment Variables
    ///
    /// - `SUPABASE_SERVICE_KEY`
    /// - `LOADTEST__SUPABASE__SERVICE_KEY`
    pub service_key: Option<SecretBox<ConfigSecret>>,

    /// Timeout applied to every request against the auth service.
    ///
    /// # Default
    ///
    /// `10s`
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for Supabase {
    fn default() -> Self {
        Self {
            url: "https://cizakzarkdgieclbwljy.supabase.co".into(),
            anon_key: None,
            service_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Main configuration struct for the load test and the provisioning script.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings for the Supabase auth service.
    pub supabase: Supabase,

    /// Password of the accounts in the credential pool.
    ///
    /// Must match the password the accounts were provisioned with.
    ///
    /// # Default
    ///
    /// `LoadTest123!`
    ///
    /// # Environment Variable
    ///
    /// `LOADTEST__TEST_PASSWORD`
    pub test_password: SecretBox<ConfigSecret>,

    /// Requests taking longer than this are reported as slow.
    ///
    /// # Default
    ///
    /// `2s`
    ///
    /// # Environment Variable
    ///
    /// `LOADTEST__SLOW_REQUEST_THRESHOLD`
    #[serde(with = "humantime_serde")]
    pub slow_request_threshold: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase: Supabase::default(),
            test_password: SecretBox::new(Box::new(DEFAULT_TEST_PASSWORD.into())),
            slow_request_threshold: Duration::from_secs(2),
        }
    }
}

impl Config {
    /// Loads configuration from defaults, an optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML file cannot be read or parsed, or if environment variables
    /// contain invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let mut config: Config = figment
            .merge(
                Env::prefixed(SUPABASE_ENV_PREFIX).map(|key| format!("supabase.{key}").into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        // `SUPABASE_SERVICE_KEY=` as left in a copied env file means "not configured"
        config.supabase.anon_key = non_empty(config.supabase.anon_key.take());
        config.supabase.service_key = non_empty(config.supabase.service_key.take());

        Ok(config)
    }

    /// Loads configuration for the load test binary, reading the YAML path from
    /// `LOADTEST_CONFIG`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV);
        Self::load(path.as_deref().map(Path::new))
    }

    /// The password shared by the credential pool.
    pub fn test_password(&self) -> &str {
        self.test_password.expose_secret().as_str()
    }
}

fn non_empty(secret: Option<SecretBox<ConfigSecret>>) -> Option<SecretBox<ConfigSecret>> {
    secret.filter(|secret| !secret.expose_secret().trim().is_empty())
}
