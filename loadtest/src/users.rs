//! Virtual user profiles and the goose scenarios built from them.
//!
//! Every profile is a weighted list of [`Endpoint`]s. A task issues exactly one request for its
//! endpoint and classifies the response once, or issues nothing if the endpoint needs a session
//! the user does not have. Scheduling, think time and statistics are left to goose.

use std::sync::Arc;
use std::time::Duration;

use goose::goose::{GooseResponse, TransactionFunction};
use goose::prelude::*;

use crate::accounts::{self, TestAccount};
use crate::auth::{AuthError, AuthSession, SupabaseAuth};
use crate::check::Verdict;
use crate::config::Config;
use crate::endpoints::{self, Access, Endpoint, Method, Payload};
use crate::feedback::Feedback;
use crate::report;

/// State shared read-only by all virtual users of a run.
#[derive(Debug)]
pub struct Context {
    /// Client used by authenticated profiles to log in.
    pub auth: SupabaseAuth,
    /// The credential pool.
    pub accounts: Vec<TestAccount>,
    /// Requests slower than this are logged.
    pub slow_request_threshold: Duration,
}

impl Context {
    /// Builds the context from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        Ok(Self {
            auth: SupabaseAuth::from_config(&config.supabase)?,
            accounts: accounts::test_accounts(config.test_password()),
            slow_request_threshold: config.slow_request_threshold,
        })
    }
}

/// A kind of simulated client.
#[derive(Clone, Copy, Debug)]
pub struct Profile {
    /// Scenario name in the goose report.
    pub name: &'static str,
    /// Relative share of virtual users running this profile.
    pub weight: usize,
    /// Bounds of the random pause after each task.
    pub wait: (Duration, Duration),
    /// Whether the user logs in with a pool account before its first task.
    pub login: bool,
    /// Endpoints with their relative selection weight.
    pub tasks: &'static [(usize, Endpoint)],
}

const fn secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

const fn millis(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Anonymous visitors browsing public pages.
pub const PUBLIC_USER: Profile = Profile {
    name: "PublicUser",
    weight: 3,
    wait: (secs(1), secs(5)),
    login: false,
    tasks: &[
        (10, endpoints::LANDING_PAGE),
        (5, endpoints::LOGIN_PAGE),
        (5, endpoints::REGISTER_PAGE),
        (3, endpoints::FEEDBACK_PAGE),
        (2, endpoints::FORGOT_PASSWORD),
    ],
};

/// Search engine crawlers fetching SEO and PWA metadata.
pub const SEO_CRAWLER: Profile = Profile {
    name: "SeoCrawler",
    weight: 1,
    wait: (secs(2), secs(10)),
    login: false,
    tasks: &[
        (5, endpoints::SITEMAP),
        (5, endpoints::ROBOTS),
        (2, endpoints::MANIFEST),
    ],
};

/// Anonymous clients of the public API, including the rate limited feedback endpoint.
pub const API_TESTER: Profile = Profile {
    name: "ApiTester",
    weight: 2,
    wait: (millis(500), secs(2)),
    login: false,
    tasks: &[
        (5, endpoints::API_HEALTH),
        (3, endpoints::CACHE_HEALTH),
        (2, endpoints::SUBMIT_FEEDBACK),
    ],
};

/// Static asset fetches, exercising CDN caching.
pub const STATIC_ASSET_LOADER: Profile = Profile {
    name: "StaticAssetLoader",
    weight: 1,
    wait: (millis(100), millis(500)),
    login: false,
    tasks: &[(5, endpoints::FAVICON), (3, endpoints::LOGO)],
};

/// High frequency requests probing capacity and rate limiting. May trigger DDoS protection.
pub const AGGRESSIVE_LOAD_TESTER: Profile = Profile {
    name: "AggressiveLoadTester",
    weight: 1,
    wait: (millis(100), millis(300)),
    login: false,
    tasks: &[
        (10, endpoints::RAPID_LANDING),
        (5, endpoints::RAPID_HEALTH),
    ],
};

/// Logged in users browsing the application with a session cookie.
pub const AUTHENTICATED_USER: Profile = Profile {
    name: "AuthenticatedUser",
    weight: 2,
    wait: (secs(1), secs(5)),
    login: true,
    tasks: &[
        (5, endpoints::DASHBOARD),
        (3, endpoints::GROUPS),
        (3, endpoints::EXPENSES),
        (2, endpoints::ACTIVITY),
        (1, endpoints::PROFILE_SETTINGS),
        (1, endpoints::FEEDBACK_HISTORY),
    ],
};

/// Logged in API clients sending a bearer token.
pub const AUTHENTICATED_API_USER: Profile = Profile {
    name: "AuthenticatedApiUser",
    weight: 1,
    wait: (millis(500), secs(2)),
    login: true,
    tasks: &[
        (3, endpoints::MY_FEEDBACK),
        (2, endpoints::SUBMIT_FEEDBACK_AUTHENTICATED),
        (1, endpoints::API_HEALTH_AUTHENTICATED),
    ],
};

/// All profiles of a full run.
pub const PROFILES: [Profile; 7] = [
    PUBLIC_USER,
    SEO_CRAWLER,
    API_TESTER,
    STATIC_ASSET_LOADER,
    AGGRESSIVE_LOAD_TESTER,
    AUTHENTICATED_USER,
    AUTHENTICATED_API_USER,
];

/// Registers a scenario for each of `profiles`.
pub fn register_profiles(
    mut attack: GooseAttack,
    profiles: &[Profile],
    context: &Arc<Context>,
) -> Result<GooseAttack, GooseError> {
    for profile in profiles {
        attack = attack.register_scenario(scenario(profile, context)?);
    }
    Ok(attack)
}

/// Builds the goose scenario for `profile`.
pub fn scenario(profile: &Profile, context: &Arc<Context>) -> Result<Scenario, GooseError> {
    let (min_wait, max_wait) = profile.wait;
    let mut scenario = Scenario::new(profile.name)
        .set_weight(profile.weight)?
        .set_wait_time(min_wait, max_wait)?;

    if profile.login {
        scenario = scenario.register_transaction(login_transaction(context));
    }
    for (weight, endpoint) in profile.tasks {
        let transaction = endpoint_transaction(*endpoint, context).set_weight(*weight)?;
        scenario = scenario.register_transaction(transaction);
    }

    Ok(scenario)
}

fn login_transaction(context: &Arc<Context>) -> Transaction {
    let context = Arc::clone(context);
    let function: TransactionFunction = Arc::new(move |user| {
        let context = Arc::clone(&context);
        Box::pin(async move { log_in(user, &context).await })
    });

    Transaction::new(function).set_name("Login").set_on_start()
}

fn endpoint_transaction(endpoint: Endpoint, context: &Arc<Context>) -> Transaction {
    let context = Arc::clone(context);
    let function: TransactionFunction = Arc::new(move |user| {
        let context = Arc::clone(&context);
        Box::pin(async move { request(user, &endpoint, &context).await })
    });

    Transaction::new(function).set_name(endpoint.name)
}

/// Logs the user in with its pool account and keeps the session as user data.
///
/// A failed login leaves the user without session, turning its authenticated tasks into no-ops.
async fn log_in(user: &mut GooseUser, context: &Context) -> TransactionResult {
    let Some(account) = accounts::account_for_user(&context.accounts, user.weighted_users_index)
    else {
        tracing::warn!("credential pool is empty, skipping login");
        return Ok(());
    };

    match context.auth.login(&account.email, &account.password).await {
        Some(session) => user.set_session_data(session),
        None => tracing::warn!(
            email = %account.email,
            "continuing without session, authenticated tasks are skipped"
        ),
    }

    Ok(())
}

async fn request(user: &mut GooseUser, endpoint: &Endpoint, context: &Context) -> TransactionResult {
    let session = match endpoint.access {
        Access::Anonymous => None,
        Access::SessionCookie | Access::BearerToken => {
            match user.get_session_data::<AuthSession>() {
                Some(session) => Some(session.clone()),
                None => return Ok(()),
            }
        }
    };

    let method = match endpoint.method {
        Method::Get => GooseMethod::Get,
        Method::Post => GooseMethod::Post,
    };

    let mut builder = user.get_request_builder(&method, endpoint.path)?;
    if let Some(session) = &session {
        builder = match endpoint.access {
            Access::SessionCookie => builder.header("Cookie", session.cookie()),
            Access::BearerToken => builder.header("Authorization", session.bearer()),
            Access::Anonymous => builder,
        };
    }
    if endpoint.payload == Payload::Feedback {
        builder = builder.json(&Feedback::random(&mut rand::rng()));
    }

    let goose_request = GooseRequest::builder()
        .method(method)
        .path(endpoint.path)
        .name(endpoint.name)
        .set_request_builder(builder)
        .build();
    let GooseResponse {
        mut request,
        response,
        ..
    } = user.request(goose_request).await?;

    report::observe_response_time(
        endpoint.name,
        request.response_time,
        context.slow_request_threshold,
    );

    let Some(check) = endpoint.check else {
        return Ok(());
    };

    // reqwest follows redirects, so a rejected session shows up as a different final path
    let landed = response
        .as_ref()
        .ok()
        .map(|response| response.url().path().to_owned());
    let body = match (check.body_marker, response) {
        (Some(_), Ok(response)) => response.text().await.ok(),
        _ => None,
    };

    let verdict = check.classify_at(
        endpoint.path,
        landed.as_deref(),
        request.status_code,
        body.as_deref(),
    );
    match verdict {
        Verdict::Success => user.set_success(&mut request),
        Verdict::Failure(message) => user.set_failure(&message, &mut request, None, None),
    }
}
