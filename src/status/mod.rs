pub mod monitor;
pub mod types;

pub use monitor::PullRequestMonitor;
pub use types::{Badge, PresentationItem, StatusCommand, TriggerMode};

use colored::Colorize;
use tracing::{error, warn};

use crate::pulls::{FetchError, HealthScore, RelevantPullRequests};

pub const BROWSE_PULL_REQUESTS: &str = "Browse your pull requests.";
pub const OFFLINE_TOOLTIP: &str = "The server cannot be reached. Click to retry the connection.";

const PULL_REQUEST_ICON: &str = "octicon-git-pull-request";
const SEARCH_ICON: &str = "octicon-search";

/// Collaborator that displays the pull request badge (a status bar item in
/// an editor, a line on the terminal here).
pub trait StatusIndicator: Send + Sync {
    fn show(&self, badge: &Badge);
}

/// Stable icon key for a health score. Every score has its own key.
pub fn presentation_key(score: HealthScore) -> &'static str {
    match score {
        HealthScore::Succeeded => "octicon-check",
        HealthScore::Failed => "octicon-stop",
        HealthScore::Waiting => "octicon-watch",
        HealthScore::NoResponse => PULL_REQUEST_ICON,
    }
}

fn icon(key: &str) -> String {
    format!("$(icon {key}) ")
}

/// Badge text for `total` pull requests.
pub fn badge_text(total: usize) -> String {
    format!("{}{}", icon(PULL_REQUEST_ICON), total)
}

/// Badge text shown when the count is unknown.
pub fn degraded_badge_text() -> String {
    format!("{}???", icon(PULL_REQUEST_ICON))
}

pub fn count_badge(pull_requests: &RelevantPullRequests) -> Badge {
    Badge {
        text: badge_text(pull_requests.count()),
        tooltip: BROWSE_PULL_REQUESTS.to_string(),
        command: StatusCommand::BrowsePullRequests,
        degraded: false,
    }
}

/// Badge for a failed poll. Offline failures offer a retry, anything else
/// (a token without the right scopes, say) shows the failure message.
pub fn failure_badge(err: &FetchError) -> Badge {
    if err.is_offline() {
        Badge {
            text: degraded_badge_text(),
            tooltip: OFFLINE_TOOLTIP.to_string(),
            command: StatusCommand::RetryConnection,
            degraded: true,
        }
    } else {
        Badge {
            text: degraded_badge_text(),
            tooltip: err.to_string(),
            command: StatusCommand::BrowsePullRequests,
            degraded: true,
        }
    }
}

/// Interactive list: the "browse all" entry first, then every pull request
/// in merge order.
pub fn presentation_list(pull_requests: &RelevantPullRequests) -> Vec<PresentationItem> {
    let mut items = Vec::with_capacity(pull_requests.count() + 1);
    items.push(PresentationItem {
        label: format!("{}{}", icon(SEARCH_ICON), BROWSE_PULL_REQUESTS),
        description: None,
        id: None,
        health_score: None,
    });
    items.extend(pull_requests.records.iter().map(|record| PresentationItem {
        label: format!(
            "{} ({}) {}",
            icon(presentation_key(record.health_score)),
            record.author_display_name,
            record.title
        ),
        description: record.description.clone(),
        id: Some(record.id),
        health_score: Some(record.health_score),
    }));
    items
}

/// Route a refresh failure according to who triggered the refresh.
///
/// Polling never fails: the error is logged and the badge degrades.
/// Interactive refreshes hand the error back for display.
pub fn handle_failure(
    err: FetchError,
    mode: TriggerMode,
    indicator: &dyn StatusIndicator,
) -> Result<(), FetchError> {
    match mode {
        TriggerMode::Polling => {
            error!(offline = err.is_offline(), "attempting to poll my pull requests: {err}");
            indicator.show(&failure_badge(&err));
            Ok(())
        }
        TriggerMode::Interactive => {
            if err.is_offline() {
                warn!("error selecting pull request: {err}");
            } else {
                error!("error selecting pull request: {err}");
            }
            Err(err)
        }
    }
}

/// Prints the badge to stdout.
#[derive(Debug, Default)]
pub struct TerminalStatus;

impl StatusIndicator for TerminalStatus {
    fn show(&self, badge: &Badge) {
        let text = if badge.degraded {
            badge.text.yellow().bold()
        } else {
            badge.text.cyan().bold()
        };
        match badge.command {
            StatusCommand::BrowsePullRequests => println!("{}  {}", text, badge.tooltip.dimmed()),
            StatusCommand::RetryConnection => {
                println!("{}  {} {}", text, badge.tooltip.dimmed(), "(retrying on next poll)".dimmed())
            }
        }
    }
}

/// Print the interactive list to the terminal.
pub fn print_items(items: &[PresentationItem]) {
    println!();
    for item in items {
        let label = match item.health_score {
            None => item.label.bold(),
            Some(HealthScore::Succeeded) => item.label.green(),
            Some(HealthScore::Failed) => item.label.red(),
            Some(HealthScore::Waiting) => item.label.yellow(),
            Some(HealthScore::NoResponse) => item.label.normal(),
        };
        if item.is_browse_all() {
            println!("  {:<7} {}", "", label);
        } else {
            println!("  #{:<6} {}", item.id.unwrap_or_default(), label);
        }
        if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
            println!("  {:<7} {}", "", description.dimmed());
        }
    }
    println!();
}
