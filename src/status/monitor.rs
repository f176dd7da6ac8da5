use std::time::Duration;

use tracing::{info, info_span, Instrument};

use super::{count_badge, handle_failure, presentation_list, PresentationItem, StatusIndicator, TriggerMode};
use crate::pulls::{get_relevant, FetchError, PullRequestSource};

/// Keeps the pull request badge of one repository up to date.
///
/// The source and the indicator are handed in at construction; each refresh
/// is self-contained and nothing carries over between cycles.
pub struct PullRequestMonitor<S, I> {
    source: S,
    indicator: I,
    user_id: String,
    repository_id: String,
}

impl<S, I> PullRequestMonitor<S, I>
where
    S: PullRequestSource,
    I: StatusIndicator,
{
    pub fn new(source: S, indicator: I, user_id: impl Into<String>, repository_id: impl Into<String>) -> Self {
        Self {
            source,
            indicator,
            user_id: user_id.into(),
            repository_id: repository_id.into(),
        }
    }

    #[cfg(test)]
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Refresh the badge and return the list, failing on any fetch error.
    pub async fn list(&self) -> Result<Vec<PresentationItem>, FetchError> {
        self.refresh()
            .await
            .or_else(|err| handle_failure(err, TriggerMode::Interactive, &self.indicator).map(|()| Vec::new()))
    }

    /// Refresh the badge. Failures only degrade the badge.
    pub async fn poll(&self) {
        if let Err(err) = self.refresh().await {
            // Polling failures are absorbed by handle_failure.
            let _ = handle_failure(err, TriggerMode::Polling, &self.indicator);
        }
    }

    /// Poll every `interval`, `cycles` times (forever when None). The first
    /// poll happens immediately.
    pub async fn run(&self, interval: Duration, cycles: Option<u64>) {
        let mut ticker = tokio::time::interval(interval);
        let mut completed = 0u64;
        loop {
            if cycles.is_some_and(|limit| completed >= limit) {
                break;
            }
            ticker.tick().await;
            self.poll()
                .instrument(info_span!("poll", cycle = completed + 1))
                .await;
            completed += 1;
        }
        info!(cycles = completed, "polling finished");
    }

    async fn refresh(&self) -> Result<Vec<PresentationItem>, FetchError> {
        let pull_requests = get_relevant(&self.source, &self.user_id, &self.repository_id).await?;
        self.indicator.show(&count_badge(&pull_requests));
        Ok(presentation_list(&pull_requests))
    }
}
