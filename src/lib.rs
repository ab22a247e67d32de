//! # coder-loadtest
//!
//! A [Goose](https://docs.rs/goose/) load test simulating coders using the
//! school's web application.
//!
//! Each simulated user logs in once through the application's credentials
//! flow (see [`auth`]) and then keeps loading the coder dashboard pages (see
//! [`pages`]), pausing a random one to three seconds between pages. The
//! dashboard itself is loaded three times as often as the other pages.
//!
//! ## Running
//!
//! Credentials are read from the environment, everything else is a regular
//! Goose option:
//!
//! ```bash
//! $ LOADTEST_USERNAME=coder1 LOADTEST_PASSWORD=secret \
//!     cargo run --release -- --host https://lms.example.com --users 50 --hatch-rate 5 --run-time 10m
//! ```
//!
//! See [`config`] for the full list of environment variables. Goose prints its
//! metrics when the run ends; the login requests appear as
//! `GET /api/auth/csrf`, `POST /api/auth/callback/credentials` and
//! `GET /api/auth/session`, each dashboard page as `GET <path>`.
//!
//! ## Failed logins
//!
//! A user whose login fails (no CSRF token, rejected credentials, or a session
//! without the expected role) records the failure against the offending
//! request and then stays idle: it never requests a dashboard page.

pub mod auth;
pub mod config;
pub mod error;
pub mod pages;

use goose::prelude::*;

use crate::config::LoadTestConfig;

/// Name of the scenario, as shown in Goose metrics.
pub const SCENARIO_NAME: &str = "CoderUser";

/// Builds the scenario simulating a single coder.
pub fn coder_scenario(config: &LoadTestConfig) -> Result<Scenario, GooseError> {
    let mut scenario = scenario!(SCENARIO_NAME);

    if let Some((min_wait, max_wait)) = config.wait_time {
        scenario = scenario.set_wait_time(min_wait, max_wait)?;
    }

    scenario = scenario.register_transaction(auth::log_in_transaction(config));

    for page in pages::CODER_PAGES {
        scenario = scenario.register_transaction(pages::page_transaction(page)?);
    }

    Ok(scenario)
}

/// Registers the coder scenario on `goose_attack`, and applies the configured
/// default host.
pub fn build_attack(
    goose_attack: GooseAttack,
    config: &LoadTestConfig,
) -> Result<GooseAttack, GooseError> {
    let mut goose_attack = goose_attack.register_scenario(coder_scenario(config)?);

    if let Some(host) = &config.host {
        goose_attack = *goose_attack.set_default(GooseDefault::Host, host.as_str())?;
    }

    Ok(goose_attack)
}
