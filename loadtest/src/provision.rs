//! Creates the accounts of the credential pool through the admin API.

use std::fmt;

use yansi::Paint;

use crate::accounts::TestAccount;
use crate::auth::{SupabaseAuth, UserCreation};

/// Result of provisioning a single account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The account was created.
    Created,
    /// The account existed before, which counts as success.
    AlreadyExists,
    /// The account could not be created, with the reason.
    Failed(String),
}

impl Outcome {
    /// Returns `true` unless the account could not be created.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

/// Tally of a provisioning run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Per-account outcomes, in pool order.
    pub outcomes: Vec<(String, Outcome)>,
}

impl Report {
    /// Number of accounts that are ready to use.
    pub fn ready(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .count()
    }

    /// Number of accounts attempted.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} users ready", self.ready(), self.total())
    }
}

/// Provisions `accounts` one after another.
///
/// Failures are printed and do not stop the run.
pub async fn provision(auth: &SupabaseAuth, accounts: &[TestAccount]) -> Report {
    let mut report = Report::default();

    for account in accounts {
        let outcome = match auth.create_user(account).await {
            Ok(UserCreation::Created) => {
                println!("{} Created user: {}", "✓".green(), account.email);
                Outcome::Created
            }
            Ok(UserCreation::AlreadyExists) => {
                println!("{} User already exists: {}", "!".yellow(), account.email);
                Outcome::AlreadyExists
            }
            Err(error) => {
                println!(
                    "{} Failed to create {}: {}",
                    "✗".red(),
                    account.email,
                    error.red()
                );
                tracing::debug!(email = %account.email, %error, "user creation failed");
                Outcome::Failed(error.to_string())
            }
        };

        report.outcomes.push((account.email.clone(), outcome));
    }

    report
}
