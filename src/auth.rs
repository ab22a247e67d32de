//! The login handshake every simulated coder performs once, when it starts.
//!
//! The application uses a credentials flow protected by an anti-forgery
//! token:
//!
//!  1. `GET /api/auth/csrf` returns `{"csrfToken": "..."}` and sets a cookie
//!     the token is bound to.
//!  2. `POST /api/auth/callback/credentials` submits the token together with
//!     the username and password as a form.
//!  3. `GET /api/auth/session` returns the logged in user, whose role must be
//!     the expected one (`CODER` by default).
//!
//! Cookies are kept by each [`GooseUser`]'s own client, so once the handshake
//! succeeds every later request of that user is authenticated. A verified
//! login is recorded as a [`CoderSession`] in the user's session data.

use goose::metrics::GooseRequestMetric;
use goose::prelude::*;
use log::{debug, info};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{Credentials, LoadTestConfig};

pub const CSRF_PATH: &str = "/api/auth/csrf";
pub const CREDENTIALS_PATH: &str = "/api/auth/callback/credentials";
pub const SESSION_PATH: &str = "/api/auth/session";

/// Name of the on_start transaction in transaction metrics.
pub const LOG_IN_TRANSACTION: &str = "log in";

/// Session data attached to a [`GooseUser`] after a verified login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoderSession {
    pub username: String,
    pub role: String,
}

/// Body of `GET /api/auth/csrf`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfResponse {
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl CsrfResponse {
    /// The token, unless it is missing or empty.
    pub fn token(&self) -> Option<&str> {
        self.csrf_token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Body of `GET /api/auth/session`. An anonymous session is `{}`.
#[derive(Debug, Default, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub role: Option<String>,
}

impl SessionResponse {
    pub fn role(&self) -> Option<&str> {
        self.user.as_ref().and_then(|user| user.role.as_deref())
    }
}

/// Builds the credentials form submitted with the anti-forgery token.
pub fn login_form<'a>(
    csrf_token: &'a str,
    credentials: &'a Credentials,
) -> [(&'static str, &'a str); 6] {
    [
        ("csrfToken", csrf_token),
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
        ("redirect", "false"),
        ("json", "true"),
        ("callbackUrl", "/"),
    ]
}

/// The credentials callback answers with JSON (200), or with a redirect when
/// the application ignores `redirect=false`.
pub fn login_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::FOUND
}

/// Returns the on_start transaction logging each user in with the configured
/// credentials.
pub fn log_in_transaction(config: &LoadTestConfig) -> Transaction {
    let login = Arc::new(Login {
        credentials: config.credentials.clone(),
        expected_role: config.expected_role.clone(),
    });

    let closure: TransactionFunction = Arc::new(move |user| {
        let login = Arc::clone(&login);
        Box::pin(async move { log_in(user, &login.credentials, &login.expected_role).await })
    });

    Transaction::new(closure)
        .set_name(LOG_IN_TRANSACTION)
        .set_on_start()
}

struct Login {
    credentials: Credentials,
    expected_role: String,
}

/// A fully read response, kept around so failures can be logged with the
/// headers and body the server sent.
struct AuthResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl AuthResponse {
    fn fail(
        &self,
        user: &mut GooseUser,
        request: &mut GooseRequestMetric,
        reason: &str,
    ) -> TransactionResult {
        user.set_failure(
            &format!("{}: {}", request.raw.url, reason),
            request,
            Some(&self.headers),
            Some(&self.body),
        )
    }
}

async fn read_response(
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<AuthResponse, String> {
    let response = response.map_err(|e| format!("no response from server: {}", e))?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| format!("failed to read response: {}", e))?;

    Ok(AuthResponse {
        status,
        headers,
        body,
    })
}

fn fail_request(
    user: &mut GooseUser,
    request: &mut GooseRequestMetric,
    reason: &str,
) -> TransactionResult {
    user.set_failure(
        &format!("{}: {}", request.raw.url, reason),
        request,
        None,
        None,
    )
}

/// Performs the full handshake, storing a [`CoderSession`] only if every
/// step succeeds.
pub async fn log_in(
    user: &mut GooseUser,
    credentials: &Credentials,
    expected_role: &str,
) -> TransactionResult {
    // Fetch the anti-forgery token.
    let mut goose = user.get_named(CSRF_PATH, CSRF_PATH).await?;
    let csrf = match read_response(goose.response).await {
        Ok(csrf) => csrf,
        Err(reason) => return fail_request(user, &mut goose.request, &reason),
    };
    if csrf.status != StatusCode::OK {
        return csrf.fail(user, &mut goose.request, "failed to fetch CSRF token");
    }
    let csrf_token = match serde_json::from_str::<CsrfResponse>(&csrf.body) {
        Ok(parsed) => match parsed.token() {
            Some(token) => token.to_string(),
            None => return csrf.fail(user, &mut goose.request, "missing CSRF token"),
        },
        Err(_) => return csrf.fail(user, &mut goose.request, "invalid CSRF response"),
    };
    debug!("user {}: fetched CSRF token", user.weighted_users_index);

    // Submit the credentials form.
    let form = login_form(&csrf_token, credentials);
    let request_builder = user
        .get_request_builder(&GooseMethod::Post, CREDENTIALS_PATH)?
        .form(&form);
    let goose_request = GooseRequest::builder()
        .method(GooseMethod::Post)
        .path(CREDENTIALS_PATH)
        .name(CREDENTIALS_PATH)
        .set_request_builder(request_builder)
        .build();
    let mut goose = user.request(goose_request).await?;
    let login = match read_response(goose.response).await {
        Ok(login) => login,
        Err(reason) => return fail_request(user, &mut goose.request, &reason),
    };
    if !login_accepted(login.status) {
        let reason = format!("login failed: {}", login.status.as_u16());
        return login.fail(user, &mut goose.request, &reason);
    }
    // Goose fails every non-2xx response, but a redirect here is a login.
    if login.status == StatusCode::FOUND {
        user.set_success(&mut goose.request)?;
    }

    // Confirm the session belongs to a user with the expected role.
    let mut goose = user.get_named(SESSION_PATH, SESSION_PATH).await?;
    let session = match read_response(goose.response).await {
        Ok(session) => session,
        Err(reason) => return fail_request(user, &mut goose.request, &reason),
    };
    if session.status != StatusCode::OK {
        return session.fail(user, &mut goose.request, "failed to verify session");
    }
    let role = match serde_json::from_str::<SessionResponse>(&session.body) {
        Ok(parsed) => parsed.role().map(str::to_string),
        Err(_) => return session.fail(user, &mut goose.request, "invalid session response"),
    };
    if role.as_deref() != Some(expected_role) {
        let reason = format!("unexpected role: {}", role.as_deref().unwrap_or("none"));
        return session.fail(user, &mut goose.request, &reason);
    }

    info!(
        "user {}: logged in as {} ({})",
        user.weighted_users_index, credentials.username, expected_role
    );
    user.set_session_data(CoderSession {
        username: credentials.username.clone(),
        role: expected_role.to_string(),
    });

    Ok(())
}
