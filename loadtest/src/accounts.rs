//! The fixed pool of test accounts shared by provisioning and the authenticated profiles.

/// Email addresses of the provisioned load test accounts.
const EMAILS: [&str; 3] = [
    "loadtest1@smartsplit.test",
    "loadtest2@smartsplit.test",
    "loadtest3@smartsplit.test",
];

/// A single test account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestAccount {
    /// Login email, also the unique key in the auth service.
    pub email: String,
    /// Login password.
    pub password: String,
    /// Display name stored as `full_name` in the user metadata.
    pub name: String,
}

/// Builds the credential pool, with every account using `password`.
pub fn test_accounts(password: &str) -> Vec<TestAccount> {
    EMAILS
        .iter()
        .enumerate()
        .map(|(index, email)| TestAccount {
            email: (*email).to_owned(),
            password: password.to_owned(),
            name: format!("Load Test User {}", index + 1),
        })
        .collect()
}

/// Picks the account for the virtual user with the given index.
///
/// Users are spread round-robin over the pool, so concurrent users share accounts once there are
/// more users than accounts.
pub fn account_for_user(accounts: &[TestAccount], user_index: usize) -> Option<&TestAccount> {
    if accounts.is_empty() {
        return None;
    }
    accounts.get(user_index % accounts.len())
}
