//! Admin metrics.
//!
//! # Metrics
//! - `lb_admin_commits_total` (counter): committed applies by `node_kind`
//! - `lb_admin_commit_failures_total` (counter): failed applies by
//!   `node_kind`, `reason`
//! - `lb_admin_commands_total` (counter): command invocations by `command`,
//!   `outcome`

use metrics::counter;

pub fn record_commit(node_kind: &str) {
    counter!("lb_admin_commits_total", "node_kind" => node_kind.to_string()).increment(1);
}

pub fn record_commit_failure(node_kind: &str, reason: &str) {
    counter!(
        "lb_admin_commit_failures_total",
        "node_kind" => node_kind.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn record_command(command: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "lb_admin_commands_total",
        "command" => command.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
