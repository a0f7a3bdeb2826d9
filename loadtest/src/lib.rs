//! Load testing for the Smart Split web application.
//!
//! The load test is a set of virtual user [`Profile`](users::Profile)s, each a weighted list of
//! requests against public pages, authenticated pages and the REST API. Running them is left to
//! [goose], which spawns the virtual users, paces them and aggregates the statistics.
//!
//! Authenticated profiles log in through the Supabase auth service with accounts from a fixed
//! pool. The pool is provisioned once with the `setup-test-users` binary, see [`provision`].
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod accounts;
pub mod auth;
pub mod check;
pub mod config;
pub mod endpoints;
pub mod feedback;
pub mod observability;
pub mod provision;
pub mod report;
pub mod users;

#[cfg(test)]
mod test_server;
