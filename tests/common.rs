// Not all helpers are used by all tests.
#![allow(dead_code)]

use gumdrop::Options;
use httpmock::{Method::GET, Method::POST, Mock, MockServer};
use serde_json::json;
use std::time::Duration;

use coder_loadtest::auth::{CREDENTIALS_PATH, CSRF_PATH, SESSION_PATH};
use coder_loadtest::config::{Credentials, LoadTestConfig};
use coder_loadtest::pages::CODER_PAGES;
use goose::config::GooseConfiguration;
use goose::metrics::GooseMetrics;
use goose::GooseAttack;

// Credentials the mock credentials endpoint accepts.
pub const USERNAME: &str = "coder1";
pub const PASSWORD: &str = "secret";

// Token handed out by the mock CSRF endpoint.
pub const CSRF_TOKEN: &str = "0f3c9d2a7b";

// Indexes to the auth endpoints returned by setup_auth_endpoints.
pub const CSRF_KEY: usize = 0;
pub const CREDENTIALS_KEY: usize = 1;
pub const SESSION_KEY: usize = 2;

/// How the mock application answers the login handshake.
#[derive(Clone, Copy, Debug)]
pub enum AuthBehavior {
    // Every step succeeds, the session belongs to a CODER.
    Valid,
    // The CSRF endpoint returns a server error.
    CsrfUnavailable,
    // The CSRF endpoint answers without a token.
    MissingCsrfToken,
    // The CSRF endpoint answers with something that isn't JSON.
    InvalidCsrfResponse,
    // The credentials are rejected.
    LoginRejected,
    // The credentials are accepted with a redirect instead of JSON.
    LoginRedirected,
    // The session endpoint returns a server error.
    SessionUnavailable,
    // The session endpoint answers with something that isn't JSON.
    InvalidSessionResponse,
    // The session belongs to a user with another role.
    WrongRole,
    // The session is anonymous.
    AnonymousSession,
}

/// The following options are configured by default, if not set to a custom value:
///  --host <mock-server>
///  --users 1
///  --hatch-rate 1
///  --run-time 1
pub fn build_configuration(server: &MockServer, custom: Vec<&str>) -> GooseConfiguration {
    // Start with an empty configuration.
    let mut configuration: Vec<&str> = vec![];
    // Declare server_url here no matter what, so its lifetime is sufficient when needed.
    let server_url = server.base_url();

    // Merge in all custom options first.
    configuration.extend_from_slice(&custom);

    // Default to using mock server if not otherwise configured.
    if !configuration.contains(&"--host") {
        configuration.extend_from_slice(&["--host", &server_url]);
    }

    // Default to testing with 1 user if not otherwise configured.
    if !configuration.contains(&"--users") {
        configuration.extend_from_slice(&["--users", "1"]);
    }

    // Default to hatch 1 user per second if not otherwise configured.
    if !configuration.contains(&"--hatch-rate") {
        configuration.extend_from_slice(&["--hatch-rate", "1"]);
    }

    // Default to running for 1 second if not otherwise configured.
    if !configuration.contains(&"--run-time") {
        configuration.extend_from_slice(&["--run-time", "1"]);
    }

    // Parse these options to generate a GooseConfiguration.
    GooseConfiguration::parse_args_default(&configuration)
        .expect("failed to parse options and generate a configuration")
}

/// Load test configuration logging in with the credentials the mock server
/// accepts, optionally pausing between pages.
pub fn build_loadtest_config(wait_time: Option<(Duration, Duration)>) -> LoadTestConfig {
    let mut config = LoadTestConfig::new(Credentials::new(USERNAME, PASSWORD));
    config.wait_time = wait_time;
    config
}

/// Create a GooseAttack object running the coder scenario.
pub fn build_load_test(configuration: GooseConfiguration, config: &LoadTestConfig) -> GooseAttack {
    let goose_attack = GooseAttack::initialize_with_config(configuration)
        .expect("failed to initialize load test");

    coder_loadtest::build_attack(goose_attack, config).expect("failed to build coder scenario")
}

/// Run the actual load test, returning the GooseMetrics.
pub async fn run_load_test(goose_attack: GooseAttack) -> GooseMetrics {
    goose_attack.execute().await.expect("load test failed")
}

/// Set up the three login endpoints, stored in the returned vector at
/// CSRF_KEY, CREDENTIALS_KEY and SESSION_KEY.
pub fn setup_auth_endpoints(server: &MockServer, behavior: AuthBehavior) -> Vec<Mock> {
    let csrf = match behavior {
        AuthBehavior::CsrfUnavailable => server.mock(|when, then| {
            when.method(GET).path(CSRF_PATH);
            then.status(500);
        }),
        AuthBehavior::MissingCsrfToken => server.mock(|when, then| {
            when.method(GET).path(CSRF_PATH);
            then.status(200).json_body(json!({}));
        }),
        AuthBehavior::InvalidCsrfResponse => server.mock(|when, then| {
            when.method(GET).path(CSRF_PATH);
            then.status(200)
                .header("content-type", "text/html")
                .body("<html><body>maintenance</body></html>");
        }),
        _ => server.mock(|when, then| {
            when.method(GET).path(CSRF_PATH);
            then.status(200).json_body(json!({ "csrfToken": CSRF_TOKEN }));
        }),
    };

    let credentials = match behavior {
        AuthBehavior::LoginRejected => server.mock(|when, then| {
            when.method(POST).path(CREDENTIALS_PATH);
            then.status(401)
                .json_body(json!({ "url": "/api/auth/error?error=CredentialsSignin" }));
        }),
        // No Location header, so the client hands the 302 back as is.
        AuthBehavior::LoginRedirected => server.mock(|when, then| {
            when.method(POST)
                .path(CREDENTIALS_PATH)
                .body_includes(format!("csrfToken={}", CSRF_TOKEN));
            then.status(302);
        }),
        // Only a complete form with the right token and credentials is accepted,
        // anything else falls through to httpmock's 404.
        _ => server.mock(|when, then| {
            when.method(POST)
                .path(CREDENTIALS_PATH)
                .body_includes(format!("csrfToken={}", CSRF_TOKEN))
                .body_includes(format!("username={}", USERNAME))
                .body_includes(format!("password={}", PASSWORD))
                .body_includes("redirect=false")
                .body_includes("json=true");
            then.status(200).json_body(json!({ "url": "/" }));
        }),
    };

    let session = match behavior {
        AuthBehavior::WrongRole => server.mock(|when, then| {
            when.method(GET).path(SESSION_PATH);
            then.status(200)
                .json_body(json!({ "user": { "name": "Coach", "role": "COACH" } }));
        }),
        AuthBehavior::AnonymousSession => server.mock(|when, then| {
            when.method(GET).path(SESSION_PATH);
            then.status(200).json_body(json!({}));
        }),
        AuthBehavior::SessionUnavailable => server.mock(|when, then| {
            when.method(GET).path(SESSION_PATH);
            then.status(500);
        }),
        AuthBehavior::InvalidSessionResponse => server.mock(|when, then| {
            when.method(GET).path(SESSION_PATH);
            then.status(200)
                .header("content-type", "text/html")
                .body("<html><body>sign in</body></html>");
        }),
        _ => server.mock(|when, then| {
            when.method(GET).path(SESSION_PATH);
            then.status(200)
                .json_body(json!({ "user": { "name": "Coder One", "role": "CODER" } }));
        }),
    };

    vec![csrf, credentials, session]
}

/// Set up one endpoint per coder page, in the same order as CODER_PAGES.
pub fn setup_page_endpoints(server: &MockServer) -> Vec<Mock> {
    CODER_PAGES
        .iter()
        .map(|page| {
            server.mock(|when, then| {
                when.method(GET).path(page.path);
                then.status(200).body("<html><body>coder</body></html>");
            })
        })
        .collect()
}
