//! Client for the Supabase auth service (GoTrue).
//!
//! Only the two endpoints the load test needs are covered: the password grant used to log in the
//! test accounts, and the admin API used to provision them.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};

use crate::accounts::TestAccount;
use crate::config::{ConfigSecret, Supabase};

const USER_AGENT: &str = concat!("smartsplit-loadtest/", env!("CARGO_PKG_VERSION"));

/// Longest cookie value the Supabase SSR helpers write before splitting into `.0`, `.1`, ...
const MAX_COOKIE_CHUNK: usize = 3180;

/// Prefix marking a base64url encoded session in the SSR cookie.
const COOKIE_BASE64_PREFIX: &str = "base64-";

/// Errors talking to the auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Any error emitted from the underlying [`reqwest`] client, including timeouts.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// The configured project URL cannot be parsed.
    #[error("invalid auth url `{url}`: {message}")]
    InvalidUrl {
        /// The configured URL.
        url: String,
        /// Why parsing failed.
        message: String,
    },
    /// A key required for the request is not configured.
    #[error("{0} is not configured")]
    MissingKey(&'static str),
    /// The service answered with a status the caller does not handle.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// Status of the response.
        status: StatusCode,
        /// Response body, empty if it could not be read.
        body: String,
    },
    /// The session returned by the password grant cannot be stored in a cookie.
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Credentials of a logged in test account, kept for the lifetime of one virtual user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSession {
    /// The JWT access token.
    pub access_token: String,
    /// The auth service's id of the account.
    pub user_id: String,
    /// Name of the session cookie read by the web application.
    pub cookie_name: String,
    /// The session as the SSR helpers store it: `base64-` followed by the base64url encoded
    /// session JSON.
    pub cookie_value: String,
}

impl AuthSession {
    /// Value of the `Authorization` header for API requests.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Value of the `Cookie` header for page requests.
    ///
    /// Values longer than a single cookie allows are split into numbered chunks
    /// (`<name>.0`, `<name>.1`, ...), which the application joins again.
    pub fn cookie(&self) -> String {
        if self.cookie_value.len() <= MAX_COOKIE_CHUNK {
            return format!("{}={}", self.cookie_name, self.cookie_value);
        }

        // the value is ASCII, so byte chunks are character chunks
        self.cookie_value
            .as_bytes()
            .chunks(MAX_COOKIE_CHUNK)
            .enumerate()
            .map(|(index, chunk)| {
                let chunk = String::from_utf8_lossy(chunk);
                format!("{}.{index}={chunk}", self.cookie_name)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Successful outcomes of creating a user through the admin API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserCreation {
    /// The user was created (`200` or `201`).
    Created,
    /// A user with this email exists already (`422`).
    AlreadyExists,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Session returned by the password grant. It is written back into the session cookie as is.
#[derive(Debug, Deserialize, Serialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    user: TokenUser,
}

fn default_token_type() -> String {
    "bearer".into()
}

#[derive(Debug, Deserialize, Serialize)]
struct TokenUser {
    id: String,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl TokenResponse {
    fn encode_cookie(&self) -> Result<String, AuthError> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{COOKIE_BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
    }
}

#[derive(Serialize)]
struct CreateUser<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: UserMetadata<'a>,
}

#[derive(Serialize)]
struct UserMetadata<'a> {
    full_name: &'a str,
}

/// Client for the password grant and admin endpoints of a Supabase project.
#[derive(Debug)]
pub struct SupabaseAuth {
    client: reqwest::Client,
    url: String,
    cookie_name: String,
    anon_key: Option<SecretBox<ConfigSecret>>,
    service_key: Option<SecretBox<ConfigSecret>>,
}

impl SupabaseAuth {
    /// Creates a client for the project at `url` with the given per-request timeout.
    pub fn new(url: &str, timeout: std::time::Duration) -> Result<Self, AuthError> {
        let parsed = Url::parse(url).map_err(|err| AuthError::InvalidUrl {
            url: url.to_owned(),
            message: err.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_owned(),
            cookie_name: session_cookie_name(&parsed),
            anon_key: None,
            service_key: None,
        })
    }

    /// Creates a client from the `supabase` section of the configuration.
    pub fn from_config(config: &Supabase) -> Result<Self, AuthError> {
        let mut auth = Self::new(&config.url, config.timeout)?;
        auth.anon_key = config.anon_key.clone();
        auth.service_key = config.service_key.clone();
        Ok(auth)
    }

    /// Sets the public anon key used for logins.
    pub fn with_anon_key(mut self, key: &str) -> Self {
        self.anon_key = Some(SecretBox::new(Box::new(key.into())));
        self
    }

    /// Sets the `service_role` key used for the admin API.
    pub fn with_service_key(mut self, key: &str) -> Self {
        self.service_key = Some(SecretBox::new(Box::new(key.into())));
        self
    }

    /// Returns `true` if test accounts can log in.
    pub fn has_anon_key(&self) -> bool {
        self.anon_key.is_some()
    }

    /// Returns `true` if the admin API can be used.
    pub fn has_service_key(&self) -> bool {
        self.service_key.is_some()
    }

    /// The project URL without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Exchanges email and password for a session.
    ///
    /// Returns `None` on any non-200 response, transport error or undecodable body. The reason is
    /// logged, never returned: callers treat a missing session as "skip authenticated work".
    pub async fn login(&self, email: &str, password: &str) -> Option<AuthSession> {
        match self.password_grant(email, password).await {
            Ok(session) => {
                tracing::debug!(email, user_id = %session.user_id, "logged in");
                Some(session)
            }
            Err(error) => {
                tracing::warn!(email, %error, "login failed");
                None
            }
        }
    }

    async fn password_grant(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let anon_key = self
            .anon_key
            .as_ref()
            .ok_or(AuthError::MissingKey("SUPABASE_ANON_KEY"))?;

        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.url))
            .query(&[("grant_type", "password")])
            .header("apikey", anon_key.expose_secret().as_str())
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::UnexpectedStatus { status, body });
        }

        let token: TokenResponse = response.json().await?;
        let cookie_value = token.encode_cookie()?;
        Ok(AuthSession {
            access_token: token.access_token,
            user_id: token.user.id,
            cookie_name: self.cookie_name.clone(),
            cookie_value,
        })
    }

    /// Creates a confirmed user through the admin API.
    ///
    /// Both a fresh creation and an existing user count as success. Every other status is
    /// returned as [`AuthError::UnexpectedStatus`] with the response body.
    pub async fn create_user(&self, account: &TestAccount) -> Result<UserCreation, AuthError> {
        let service_key = self
            .service_key
            .as_ref()
            .ok_or(AuthError::MissingKey("SUPABASE_SERVICE_KEY"))?
            .expose_secret();

        let response = self
            .client
            .post(format!("{}/auth/v1/admin/users", self.url))
            .header("apikey", service_key.as_str())
            .bearer_auth(service_key.as_str())
            .json(&CreateUser {
                email: &account.email,
                password: &account.password,
                email_confirm: true,
                user_metadata: UserMetadata {
                    full_name: &account.name,
                },
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(UserCreation::Created),
            StatusCode::UNPROCESSABLE_ENTITY => Ok(UserCreation::AlreadyExists),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AuthError::UnexpectedStatus { status, body })
            }
        }
    }
}

/// Name of the cookie the Supabase SSR helpers keep the session in: `sb-<project-ref>-auth-token`.
///
/// The project ref is the first label of the project's host name.
fn session_cookie_name(url: &Url) -> String {
    let project_ref = url
        .host_str()
        .and_then(|host| host.split('.').next())
        .unwrap_or("localhost");
    format!("sb-{project_ref}-auth-token")
}
