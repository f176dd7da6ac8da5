pub mod client;
pub mod score;
pub mod types;

pub use types::{HealthScore, PullRequestQuery, PullRequestRecord, RelevantPullRequests, RemotePullRequest};

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, info_span, instrument, Instrument};

#[derive(Debug, Error)]
pub enum FetchError {
    /// The server could not be reached at all.
    #[error("Unable to reach the server: {0}")]
    Offline(String),

    /// The server answered with a failure status.
    #[error("{message} (HTTP {status})")]
    Remote { status: u16, message: String },

    #[error("Unexpected response from the server: {0}")]
    Decode(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to configure the HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Offline failures get a retry affordance instead of an error message.
    pub fn is_offline(&self) -> bool {
        matches!(self, FetchError::Offline(_))
    }
}

/// Capability to search a repository's pull requests.
/// Must be Send + Sync so both searches can run concurrently via tokio::join!.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn fetch(&self, query: &PullRequestQuery) -> Result<Vec<RemotePullRequest>, FetchError>;
}

/// Fetch the active pull requests the user authored and those awaiting their
/// review, then merge them.
///
/// Both searches run concurrently. If either fails the whole call fails with
/// that error and nothing is returned.
#[instrument(skip(source))]
pub async fn get_relevant<S>(
    source: &S,
    user_id: &str,
    repository_id: &str,
) -> Result<RelevantPullRequests, FetchError>
where
    S: PullRequestSource + ?Sized,
{
    let authored_query = PullRequestQuery::authored_by(repository_id, user_id);
    let reviewing_query = PullRequestQuery::reviewed_by(repository_id, user_id);

    let (authored, reviewing) = tokio::join!(
        source
            .fetch(&authored_query)
            .instrument(info_span!("fetch", set = "authored")),
        source
            .fetch(&reviewing_query)
            .instrument(info_span!("fetch", set = "reviewing")),
    );
    let authored = authored?;
    info!(count = authored.len(), "retrieved pull requests I requested");
    let reviewing = reviewing?;
    info!(count = reviewing.len(), "retrieved pull requests I am reviewing");

    let merged = merge(authored, reviewing);
    debug!(total = merged.count(), "merged pull request sets");
    Ok(merged)
}

/// Concatenate authored then reviewing pull requests, keeping the first
/// occurrence of each id. Fetch order is preserved within each set.
pub fn merge(
    authored: Vec<RemotePullRequest>,
    reviewing: Vec<RemotePullRequest>,
) -> RelevantPullRequests {
    let mut seen = HashSet::new();
    let records = authored
        .into_iter()
        .chain(reviewing)
        .filter(|pr| seen.insert(pr.pull_request_id))
        .map(PullRequestRecord::from_remote)
        .collect();
    RelevantPullRequests { records }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pulls::types::{IdentityRef, MergeStatus, Reviewer};
    use std::sync::Mutex;

    /// Helper to create a pull request with a distinguishable title.
    pub fn test_pull_request(id: u64, title: &str) -> RemotePullRequest {
        RemotePullRequest {
            pull_request_id: id,
            title: title.to_string(),
            description: Some(format!("description of {title}")),
            created_by: IdentityRef {
                display_name: "testuser".to_string(),
                id: Some("user-1".to_string()),
            },
            reviewers: vec![],
            merge_status: MergeStatus::NotSet,
        }
    }

    /// In-memory source answering authored and reviewing searches from
    /// fixed lists, recording every query it sees.
    #[derive(Default)]
    pub struct FakeSource {
        pub authored: Vec<RemotePullRequest>,
        pub reviewing: Vec<RemotePullRequest>,
        pub fail_authored: bool,
        pub fail_reviewing: bool,
        pub offline: bool,
        pub queries: Mutex<Vec<PullRequestQuery>>,
    }

    impl FakeSource {
        pub fn new(authored: Vec<RemotePullRequest>, reviewing: Vec<RemotePullRequest>) -> Self {
            Self {
                authored,
                reviewing,
                ..Self::default()
            }
        }

        fn failure(&self) -> FetchError {
            if self.offline {
                FetchError::Offline("connection refused".to_string())
            } else {
                FetchError::Remote {
                    status: 401,
                    message: "Unauthorized".to_string(),
                }
            }
        }
    }

    #[async_trait]
    impl PullRequestSource for FakeSource {
        async fn fetch(&self, query: &PullRequestQuery) -> Result<Vec<RemotePullRequest>, FetchError> {
            self.queries.lock().unwrap().push(query.clone());
            if query.creator_id.is_some() {
                if self.fail_authored {
                    return Err(self.failure());
                }
                Ok(self.authored.clone())
            } else {
                if self.fail_reviewing {
                    return Err(self.failure());
                }
                Ok(self.reviewing.clone())
            }
        }
    }

    #[test]
    fn test_merge_dedups_and_keeps_order() {
        let merged = merge(
            vec![test_pull_request(1, "a1"), test_pull_request(2, "a2")],
            vec![test_pull_request(2, "b2"), test_pull_request(3, "b3")],
        );
        assert_eq!(merged.ids(), vec![1, 2, 3]);
        assert_eq!(merged.records[1].title, "a2");
        assert_eq!(merged.count(), 3);
    }

    #[test]
    fn test_merge_does_not_sort() {
        let merged = merge(
            vec![test_pull_request(9, "a9"), test_pull_request(4, "a4")],
            vec![test_pull_request(7, "b7"), test_pull_request(1, "b1")],
        );
        assert_eq!(merged.ids(), vec![9, 4, 7, 1]);
    }

    #[test]
    fn test_merge_empty_sets() {
        let merged = merge(vec![], vec![]);
        assert_eq!(merged.count(), 0);
    }

    #[test]
    fn test_merge_scores_records() {
        let mut rejected = test_pull_request(5, "rejected");
        rejected.reviewers = vec![Reviewer {
            vote: -10,
            is_required: true,
            display_name: None,
        }];
        let merged = merge(vec![rejected], vec![test_pull_request(6, "quiet")]);
        assert_eq!(merged.records[0].health_score, HealthScore::Failed);
        assert_eq!(merged.records[1].health_score, HealthScore::NoResponse);
    }

    #[tokio::test]
    async fn test_get_relevant_issues_both_queries() {
        let source = FakeSource::new(
            vec![test_pull_request(1, "a1"), test_pull_request(2, "a2")],
            vec![test_pull_request(2, "b2"), test_pull_request(3, "b3")],
        );
        let relevant = get_relevant(&source, "me", "repo-1").await.unwrap();
        assert_eq!(relevant.ids(), vec![1, 2, 3]);
        assert_eq!(relevant.records[1].title, "a2");

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries.contains(&PullRequestQuery::authored_by("repo-1", "me")));
        assert!(queries.contains(&PullRequestQuery::reviewed_by("repo-1", "me")));
    }

    #[tokio::test]
    async fn test_get_relevant_fails_when_authored_fetch_fails() {
        let source = FakeSource {
            fail_authored: true,
            ..FakeSource::new(vec![], vec![test_pull_request(3, "b3")])
        };
        let err = get_relevant(&source, "me", "repo-1").await.unwrap_err();
        assert!(matches!(err, FetchError::Remote { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_get_relevant_fails_when_reviewing_fetch_fails() {
        let source = FakeSource {
            fail_reviewing: true,
            offline: true,
            ..FakeSource::new(vec![test_pull_request(1, "a1")], vec![])
        };
        let err = get_relevant(&source, "me", "repo-1").await.unwrap_err();
        assert!(err.is_offline());
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Remote {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Forbidden (HTTP 403)");
        assert!(!err.is_offline());
    }
}
