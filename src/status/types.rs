use crate::pulls::HealthScore;

/// One entry of the interactive pull request list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationItem {
    /// Icon-prefixed text shown for the entry
    pub label: String,
    /// Secondary text (the pull request description)
    pub description: Option<String>,
    /// Pull request id; None for the "browse all" entry
    pub id: Option<u64>,
    /// Health of the pull request; None for the "browse all" entry
    pub health_score: Option<HealthScore>,
}

impl PresentationItem {
    pub fn is_browse_all(&self) -> bool {
        self.id.is_none()
    }
}

/// What activating the status indicator should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCommand {
    /// Open the pull request list.
    BrowsePullRequests,
    /// Re-run the poll after a connectivity failure.
    RetryConnection,
}

/// Everything a status indicator displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub tooltip: String,
    pub command: StatusCommand,
    /// True when the count could not be refreshed
    pub degraded: bool,
}

/// Who asked for a refresh. Decides how failures reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Explicit request: failures are returned so they can be shown.
    Interactive,
    /// Timer tick: failures are logged and reflected on the badge only.
    Polling,
}
