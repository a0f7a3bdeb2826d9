//! Console output around a load test run.
//!
//! The request statistics themselves are printed by goose once the run completes.

use std::time::Duration;

use yansi::Paint;

const RULE: &str = "============================================================";

/// Prints the banner shown before the first virtual user starts.
pub fn print_start_banner(host: Option<&str>) {
    println!("{RULE}");
    println!("{}", "Smart Split Load Test Starting".bold());
    println!("   Target: {}", host.unwrap_or("(not set)").blue());
    println!("{RULE}");
}

/// Prints the banner shown once goose has finished.
pub fn print_stop_banner() {
    println!("{RULE}");
    println!("{}", "Smart Split Load Test Complete".bold().green());
    println!("{RULE}");
}

/// Extracts the value of goose's `--host`/`-H` flag from the command line.
pub fn target_host<I>(args: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if let Some(host) = arg.strip_prefix("--host=") {
            return Some(host.to_owned());
        }
        if arg == "--host" || arg == "-H" {
            return args.next();
        }
        if let Some(host) = arg.strip_prefix("-H").filter(|host| !host.is_empty()) {
            return Some(host.to_owned());
        }
    }
    None
}

/// Returns `true` if a request took longer than `threshold`.
pub fn is_slow(response_time_ms: u64, threshold: Duration) -> bool {
    u128::from(response_time_ms) > threshold.as_millis()
}

/// Logs requests that exceeded the slow request threshold.
pub fn observe_response_time(name: &str, response_time_ms: u64, threshold: Duration) {
    if is_slow(response_time_ms, threshold) {
        tracing::warn!(request = name, response_time_ms, "slow request");
    }
}
