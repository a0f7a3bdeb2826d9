//! Classification of responses into successes and failures.

/// Status codes accepted as success for an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Only `200 OK`.
    Ok,
    /// `200 OK`, or `503 Service Unavailable` reporting a degraded but running dependency.
    OkOrDegraded,
    /// `200 OK`, or `429 Too Many Requests` from correctly working rate limiting.
    OkOrRateLimited,
}

impl StatusPolicy {
    /// Returns `true` if `status` counts as success under this policy.
    pub fn accepts(self, status: u16) -> bool {
        match self {
            StatusPolicy::Ok => status == 200,
            StatusPolicy::OkOrDegraded => matches!(status, 200 | 503),
            StatusPolicy::OkOrRateLimited => matches!(status, 200 | 429),
        }
    }
}

/// How the response of an endpoint is judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Check {
    /// Accepted status codes.
    pub policy: StatusPolicy,
    /// Prefix of the failure message, followed by the status code.
    pub failure: &'static str,
    /// Text the response body must contain in addition to an accepted status.
    pub body_marker: Option<&'static str>,
}

impl Check {
    /// Accepts `200 OK` and reports other statuses as `Status code: <status>`.
    pub const fn ok() -> Self {
        Self::new(StatusPolicy::Ok, "Status code")
    }

    /// Accepts statuses under `policy` and prefixes failure messages with `failure`.
    pub const fn new(policy: StatusPolicy, failure: &'static str) -> Self {
        Self {
            policy,
            failure,
            body_marker: None,
        }
    }

    /// Additionally requires `marker` in the response body.
    pub const fn with_body_marker(mut self, marker: &'static str) -> Self {
        self.body_marker = Some(marker);
        self
    }

    /// Judges a response with the given status and, if read, body.
    ///
    /// The body is only inspected when a marker is configured. A missing body never satisfies a
    /// marker.
    pub fn classify(&self, status: u16, body: Option<&str>) -> Verdict {
        let body_ok = match self.body_marker {
            Some(marker) => body.is_some_and(|body| body.contains(marker)),
            None => true,
        };

        if self.policy.accepts(status) && body_ok {
            Verdict::Success
        } else {
            Verdict::Failure(format!("{}: {status}", self.failure))
        }
    }

    /// Like [`classify`](Self::classify), but fails responses that were redirected away from
    /// `requested`.
    ///
    /// `landed` is the path of the final URL after following redirects. A page that sends the user
    /// to `/login` ends in a `200 OK` there, so the status alone does not reveal a rejected
    /// session.
    pub fn classify_at(
        &self,
        requested: &str,
        landed: Option<&str>,
        status: u16,
        body: Option<&str>,
    ) -> Verdict {
        match landed {
            Some(landed) if landed != requested => {
                Verdict::Failure(format!("Redirected to {landed}: {status}"))
            }
            _ => self.classify(status, body),
        }
    }
}

/// Outcome of a single task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The response was accepted.
    Success,
    /// Failure with a message naming the status code.
    Failure(String),
}
