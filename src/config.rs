//! Load test configuration read from the environment.
//!
//! Everything about *how hard* to load the application (`--host`, `--users`,
//! `--hatch-rate`, `--run-time`, ...) is a Goose command line option. The
//! settings here describe *who* the simulated user is and how long it pauses
//! between pages.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::LoadTestError;

/// Username submitted to the credentials form.
pub const USERNAME_VAR: &str = "LOADTEST_USERNAME";
/// Password submitted to the credentials form.
pub const PASSWORD_VAR: &str = "LOADTEST_PASSWORD";
/// Role the verified session must report.
pub const EXPECTED_ROLE_VAR: &str = "LOADTEST_EXPECTED_ROLE";
/// Default host, used when `--host` is not passed on the command line.
pub const HOST_VAR: &str = "LOADTEST_HOST";
/// Minimum pause between page requests, in milliseconds.
pub const WAIT_MIN_VAR: &str = "LOADTEST_WAIT_MIN_MS";
/// Maximum pause between page requests, in milliseconds.
pub const WAIT_MAX_VAR: &str = "LOADTEST_WAIT_MAX_MS";

pub const DEFAULT_EXPECTED_ROLE: &str = "CODER";
pub const DEFAULT_WAIT_MIN_MS: u64 = 1_000;
pub const DEFAULT_WAIT_MAX_MS: u64 = 3_000;

/// Login credentials shared by every simulated user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

// Keep the password out of debug logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Everything the coder scenario needs besides Goose's own options.
#[derive(Clone, Debug)]
pub struct LoadTestConfig {
    pub credentials: Credentials,
    /// Session role required after logging in, `CODER` by default.
    pub expected_role: String,
    /// Optional default for `--host`.
    pub host: Option<String>,
    /// Random pause between page requests, `None` to run them back to back.
    pub wait_time: Option<(Duration, Duration)>,
}

impl LoadTestConfig {
    /// A configuration with default role and wait time and no default host.
    pub fn new(credentials: Credentials) -> Self {
        LoadTestConfig {
            credentials,
            expected_role: DEFAULT_EXPECTED_ROLE.to_string(),
            host: None,
            wait_time: Some((
                Duration::from_millis(DEFAULT_WAIT_MIN_MS),
                Duration::from_millis(DEFAULT_WAIT_MAX_MS),
            )),
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, LoadTestError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// the named variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoadTestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = required(&lookup, USERNAME_VAR)?;
        let password = required(&lookup, PASSWORD_VAR)?;

        let mut config = LoadTestConfig::new(Credentials { username, password });

        if let Some(role) = optional(&lookup, EXPECTED_ROLE_VAR) {
            config.expected_role = role;
        }
        config.host = optional(&lookup, HOST_VAR);

        let min_wait = milliseconds(&lookup, WAIT_MIN_VAR, DEFAULT_WAIT_MIN_MS)?;
        let max_wait = milliseconds(&lookup, WAIT_MAX_VAR, DEFAULT_WAIT_MAX_MS)?;
        config.wait_time = Some(wait_range(min_wait, max_wait)?);

        Ok(config)
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, name: &str) -> Result<String, LoadTestError>
where
    F: Fn(&str) -> Option<String>,
{
    // Values are kept verbatim, only an all-blank value counts as missing.
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(LoadTestError::MissingCredential {
            variable: name.to_string(),
            detail: format!("set {} and {} before starting", USERNAME_VAR, PASSWORD_VAR),
        }),
    }
}

fn milliseconds<F>(lookup: &F, name: &str, default: u64) -> Result<u64, LoadTestError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, name) {
        None => Ok(default),
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| LoadTestError::InvalidOption {
                option: name.to_string(),
                value,
                detail: "must be a whole number of milliseconds".to_string(),
            }),
    }
}

/// Builds the wait range handed to Goose, which samples from `min..max`.
fn wait_range(min_wait: u64, max_wait: u64) -> Result<(Duration, Duration), LoadTestError> {
    if min_wait > max_wait {
        return Err(LoadTestError::InvalidOption {
            option: WAIT_MIN_VAR.to_string(),
            value: min_wait.to_string(),
            detail: format!("must not exceed {} ({})", WAIT_MAX_VAR, max_wait),
        });
    }
    // An empty range can't be sampled; treat min == max as a fixed pause.
    let max_wait = if min_wait == max_wait {
        max_wait + 1
    } else {
        max_wait
    };
    Ok((
        Duration::from_millis(min_wait),
        Duration::from_millis(max_wait),
    ))
}
