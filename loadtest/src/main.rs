//! Runs all virtual user profiles against a Smart Split deployment.
//!
//! Goose owns the command line:
//!
//! ```sh
//! smartsplit-loadtest --host https://smart-split.example --users 100 --hatch-rate 10 \
//!     --run-time 60s
//! ```
//!
//! Supabase credentials for the authenticated profiles are read from the environment, see
//! [`smartsplit_loadtest::config`].

use std::sync::Arc;

use anyhow::{Context as _, Result};
use goose::prelude::*;

use smartsplit_loadtest::config::Config;
use smartsplit_loadtest::users::{self, Context, PROFILES};
use smartsplit_loadtest::{observability, report};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::debug!(?config);

    let context = Arc::new(Context::from_config(&config).context("invalid auth configuration")?);
    if !context.auth.has_anon_key() {
        tracing::warn!("SUPABASE_ANON_KEY is not set, authenticated profiles will not log in");
    }

    let attack = GooseAttack::initialize()?;
    let attack = users::register_profiles(attack, &PROFILES, &context)?;

    report::print_start_banner(report::target_host(std::env::args()).as_deref());
    attack.execute().await?;
    report::print_stop_banner();

    Ok(())
}
