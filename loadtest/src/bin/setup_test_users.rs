//! Creates the load test accounts in the Supabase project.
//!
//! Requires the `service_role` key in `SUPABASE_SERVICE_KEY`; the anon key is not allowed to
//! create users.

use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use yansi::Paint;

use smartsplit_loadtest::accounts::test_accounts;
use smartsplit_loadtest::auth::SupabaseAuth;
use smartsplit_loadtest::config::Config;
use smartsplit_loadtest::{observability, provision};

const RULE: &str = "==================================================";

/// Provision the Smart Split load test accounts.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    observability::init_tracing();

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;

    println!("{RULE}");
    println!("{}", "Smart Split Load Test User Setup".bold());
    println!("{RULE}");
    println!();

    let auth = SupabaseAuth::from_config(&config.supabase).context("invalid auth configuration")?;
    if !auth.has_service_key() {
        print_missing_service_key();
        return Ok(());
    }

    println!("Supabase URL: {}", auth.url().blue());
    println!();

    let accounts = test_accounts(config.test_password());
    let report = provision::provision(&auth, &accounts).await;

    println!();
    println!("{RULE}");
    if report.ready() == report.total() {
        println!("Setup complete: {}", report.bold().green());
    } else {
        println!("Setup complete: {}", report.bold().yellow());
    }
    println!("{RULE}");
    println!();
    println!("Next steps:");
    println!("1. Export SUPABASE_URL and SUPABASE_ANON_KEY");
    println!("2. Run: smartsplit-loadtest --host=https://smart-split-one.vercel.app");

    Ok(())
}

fn print_missing_service_key() {
    println!("{}", "SUPABASE_SERVICE_KEY environment variable not set!".red());
    println!();
    println!("To set it:");
    println!("  export SUPABASE_SERVICE_KEY='your_service_role_key'");
    println!();
    println!("Get the key from:");
    println!("  Supabase Dashboard → Settings → API → service_role (secret)");
    println!();
}
