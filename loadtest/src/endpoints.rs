//! Catalogue of the Smart Split endpoints exercised by the load test.

use crate::check::{Check, StatusPolicy};

/// HTTP method of an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

/// Session state an endpoint is requested with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// No credentials at all.
    Anonymous,
    /// The Supabase session cookie, as sent by a logged in browser.
    SessionCookie,
    /// An `Authorization: Bearer` header, as sent by an API client.
    BearerToken,
}

/// Request body of an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    /// No body.
    Empty,
    /// A randomly generated feedback submission, see [`crate::feedback`].
    Feedback,
}

/// A single request issued by a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Name under which the request is reported.
    pub name: &'static str,
    /// HTTP method of the request.
    pub method: Method,
    /// Path relative to the target host. Responses redirected elsewhere fail.
    pub path: &'static str,
    /// Credentials sent with the request.
    pub access: Access,
    /// Request body.
    pub payload: Payload,
    /// Response classification, or `None` to keep goose's default verdict.
    pub check: Option<Check>,
}

impl Endpoint {
    /// An anonymous `GET` accepting only `200 OK`.
    pub const fn page(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            method: Method::Get,
            path,
            access: Access::Anonymous,
            payload: Payload::Empty,
            check: Some(Check::ok()),
        }
    }

    /// Replaces the response classification.
    pub const fn check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }

    /// Leaves the verdict to goose, which fails non-2xx responses.
    pub const fn unchecked(mut self) -> Self {
        self.check = None;
        self
    }

    /// Requests the endpoint with the given credentials.
    pub const fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Turns the request into a `POST` with `payload` as body.
    pub const fn post(mut self, payload: Payload) -> Self {
        self.method = Method::Post;
        self.payload = payload;
        self
    }

    /// Returns `true` if the request carries session credentials.
    pub fn requires_session(&self) -> bool {
        self.access != Access::Anonymous
    }
}

// Public pages.
/// The landing page.
pub const LANDING_PAGE: Endpoint = Endpoint::page("Landing Page", "/");
/// The login form.
pub const LOGIN_PAGE: Endpoint = Endpoint::page("Login Page", "/login");
/// The sign up form.
pub const REGISTER_PAGE: Endpoint = Endpoint::page("Register Page", "/register");
/// The public feedback form.
pub const FEEDBACK_PAGE: Endpoint = Endpoint::page("Feedback Page", "/feedback");
/// The password reset form.
pub const FORGOT_PASSWORD: Endpoint = Endpoint::page("Forgot Password", "/forgot-password");

// SEO and PWA metadata.
/// The XML sitemap, which must contain a `urlset`.
pub const SITEMAP: Endpoint = Endpoint::page("Sitemap", "/sitemap.xml")
    .check(Check::new(StatusPolicy::Ok, "Invalid sitemap").with_body_marker("urlset"));
/// Crawler rules.
pub const ROBOTS: Endpoint = Endpoint::page("Robots.txt", "/robots.txt");
/// The PWA manifest.
pub const MANIFEST: Endpoint = Endpoint::page("Manifest", "/manifest.json");

// Public API.
/// Application health check.
pub const API_HEALTH: Endpoint = Endpoint::page("API Health", "/api/health")
    .check(Check::new(StatusPolicy::Ok, "Health check failed"));
/// Cache health check, `503` while the cache is degraded.
pub const CACHE_HEALTH: Endpoint = Endpoint::page("Cache Health", "/api/cache/health")
    .check(Check::new(StatusPolicy::OkOrDegraded, "Cache health failed"));
/// Anonymous feedback submission, rate limited with `429`.
pub const SUBMIT_FEEDBACK: Endpoint = Endpoint::page("Submit Feedback", "/api/feedback")
    .post(Payload::Feedback)
    .check(Check::new(
        StatusPolicy::OkOrRateLimited,
        "Feedback submission failed",
    ));

// Static assets.
/// The favicon.
pub const FAVICON: Endpoint = Endpoint::page("Favicon", "/favicon.svg");
/// The logo icon.
pub const LOGO: Endpoint = Endpoint::page("Logo", "/logo-icon.svg");

// Capacity probing, judged by goose alone.
/// The landing page under aggressive load.
pub const RAPID_LANDING: Endpoint = Endpoint::page("Rapid Landing", "/").unchecked();
/// The health check under aggressive load.
pub const RAPID_HEALTH: Endpoint = Endpoint::page("Rapid Health", "/api/health").unchecked();

// Pages behind the login, requested with the session cookie.
/// Overview of the logged in user.
pub const DASHBOARD: Endpoint =
    Endpoint::page("Dashboard", "/dashboard").access(Access::SessionCookie);
/// Expense groups of the user.
pub const GROUPS: Endpoint = Endpoint::page("Groups", "/groups").access(Access::SessionCookie);
/// Expenses across all groups.
pub const EXPENSES: Endpoint =
    Endpoint::page("Expenses", "/expenses").access(Access::SessionCookie);
/// Recent activity feed.
pub const ACTIVITY: Endpoint =
    Endpoint::page("Activity", "/activity").access(Access::SessionCookie);
/// Profile settings.
pub const PROFILE_SETTINGS: Endpoint =
    Endpoint::page("Profile Settings", "/settings/profile").access(Access::SessionCookie);
/// Feedback the user submitted before.
pub const FEEDBACK_HISTORY: Endpoint =
    Endpoint::page("Feedback History", "/feedback/history").access(Access::SessionCookie);

// API calls with a bearer token.
/// Feedback of the user, listed through the API.
pub const MY_FEEDBACK: Endpoint = Endpoint::page("My Feedback", "/api/feedback")
    .access(Access::BearerToken)
    .check(Check::new(StatusPolicy::Ok, "Feedback listing failed"));
/// Feedback submission with a bearer token, rate limited with `429`.
pub const SUBMIT_FEEDBACK_AUTHENTICATED: Endpoint =
    Endpoint::page("Submit Feedback (authenticated)", "/api/feedback")
        .post(Payload::Feedback)
        .access(Access::BearerToken)
        .check(Check::new(
            StatusPolicy::OkOrRateLimited,
            "Feedback submission failed",
        ));
/// Health check with a bearer token.
pub const API_HEALTH_AUTHENTICATED: Endpoint =
    Endpoint::page("API Health (authenticated)", "/api/health")
        .access(Access::BearerToken)
        .check(Check::new(StatusPolicy::Ok, "Health check failed"));

#[cfg(test)]
mod tests {
    use crate::check::Verdict;

    use super::*;

    #[test]
    fn public_endpoints_are_anonymous() {
        for endpoint in [
            LANDING_PAGE,
            LOGIN_PAGE,
            REGISTER_PAGE,
            FEEDBACK_PAGE,
            FORGOT_PASSWORD,
            SITEMAP,
            ROBOTS,
            MANIFEST,
            API_HEALTH,
            CACHE_HEALTH,
            SUBMIT_FEEDBACK,
            FAVICON,
            LOGO,
            RAPID_LANDING,
            RAPID_HEALTH,
        ] {
            assert!(!endpoint.requires_session(), "{}", endpoint.name);
        }
    }

    #[test]
    fn documented_exceptions() {
        let cache = CACHE_HEALTH.check.unwrap();
        assert_eq!(cache.classify(503, None), Verdict::Success);

        let feedback = SUBMIT_FEEDBACK.check.unwrap();
        assert_eq!(feedback.classify(429, None), Verdict::Success);
        assert_eq!(SUBMIT_FEEDBACK.method, Method::Post);
        assert_eq!(SUBMIT_FEEDBACK.payload, Payload::Feedback);

        // everything else rejects both
        let landing = LANDING_PAGE.check.unwrap();
        assert_eq!(
            landing.classify(503, None),
            Verdict::Failure("Status code: 503".into())
        );
        assert_eq!(
            landing.classify(429, None),
            Verdict::Failure("Status code: 429".into())
        );
    }

    #[test]
    fn sitemap_needs_urlset() {
        let sitemap = SITEMAP.check.unwrap();

        assert_eq!(sitemap.classify(200, Some("<urlset/>")), Verdict::Success);
        assert_eq!(
            sitemap.classify(200, Some("not found")),
            Verdict::Failure("Invalid sitemap: 200".into())
        );
    }

    #[test]
    fn authenticated_endpoints() {
        assert_eq!(DASHBOARD.access, Access::SessionCookie);
        assert_eq!(MY_FEEDBACK.access, Access::BearerToken);
        assert!(SUBMIT_FEEDBACK_AUTHENTICATED.requires_session());
        assert!(RAPID_HEALTH.check.is_none());
    }
}
