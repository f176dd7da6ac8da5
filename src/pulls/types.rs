use serde::Deserialize;

/// Compact review/build state of a pull request, used for iconography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthScore {
    NoResponse,
    Waiting,
    Succeeded,
    Failed,
}

/// Server-side status filter for pull request searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestStatus {
    Active,
}

impl PullRequestStatus {
    pub fn as_query_value(self) -> &'static str {
        match self {
            PullRequestStatus::Active => "active",
        }
    }
}

/// One search against a repository's pull requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestQuery {
    pub repository_id: String,
    pub creator_id: Option<String>,
    pub reviewer_id: Option<String>,
    pub status: PullRequestStatus,
}

impl PullRequestQuery {
    /// Active pull requests created by `user_id`.
    pub fn authored_by(repository_id: &str, user_id: &str) -> Self {
        Self {
            repository_id: repository_id.to_string(),
            creator_id: Some(user_id.to_string()),
            reviewer_id: None,
            status: PullRequestStatus::Active,
        }
    }

    /// Active pull requests where `user_id` is a reviewer.
    pub fn reviewed_by(repository_id: &str, user_id: &str) -> Self {
        Self {
            repository_id: repository_id.to_string(),
            creator_id: None,
            reviewer_id: Some(user_id.to_string()),
            status: PullRequestStatus::Active,
        }
    }
}

/// Asynchronous merge state reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStatus {
    #[default]
    NotSet,
    Queued,
    Conflicts,
    Succeeded,
    RejectedByPolicy,
    Failure,
    #[serde(other)]
    Unrecognized,
}

impl MergeStatus {
    /// Whether the merge attempt reports a blocking problem.
    pub fn is_failing(self) -> bool {
        matches!(
            self,
            MergeStatus::Conflicts | MergeStatus::Failure | MergeStatus::RejectedByPolicy
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    #[allow(dead_code)] // Deserialized for completeness, records only keep the display name
    pub id: Option<String>,
}

/// A reviewer and their vote.
///
/// Votes: 10 approved, 5 approved with suggestions, 0 no vote,
/// -5 waiting for author, -10 rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    #[serde(default)]
    pub vote: i32,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    #[allow(dead_code)] // Scoring only looks at votes
    pub display_name: Option<String>,
}

/// Pull request as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePullRequest {
    pub pull_request_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: IdentityRef,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub merge_status: MergeStatus,
}

/// Envelope the REST API wraps collections in.
#[derive(Debug, Deserialize)]
pub struct ValueList<T> {
    pub value: Vec<T>,
}

/// A pull request ready for presentation. Rebuilt on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub id: u64,
    pub author_display_name: String,
    pub title: String,
    pub description: Option<String>,
    pub health_score: HealthScore,
}

impl PullRequestRecord {
    pub fn from_remote(pull_request: RemotePullRequest) -> Self {
        let health_score = super::score::health_score(&pull_request);
        Self {
            id: pull_request.pull_request_id,
            author_display_name: pull_request.created_by.display_name,
            title: pull_request.title,
            description: pull_request.description,
            health_score,
        }
    }
}

/// Deduplicated pull requests relevant to the current user, authored ones
/// first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevantPullRequests {
    pub records: Vec<PullRequestRecord>,
}

impl RelevantPullRequests {
    /// Number of pull requests, the value shown on the status badge.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn ids(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_list_deserializes() {
        let json = r#"{
            "count": 1,
            "value": [{
                "pullRequestId": 17,
                "title": "Fix login",
                "description": "Resolves the redirect loop",
                "createdBy": { "displayName": "Dana", "id": "u-1" },
                "mergeStatus": "conflicts",
                "reviewers": [
                    { "displayName": "Lee", "vote": 10, "isRequired": true },
                    { "displayName": "Sam", "vote": -5 }
                ]
            }]
        }"#;
        let list: ValueList<RemotePullRequest> = serde_json::from_str(json).unwrap();
        let pr = &list.value[0];
        assert_eq!(pr.pull_request_id, 17);
        assert_eq!(pr.created_by.display_name, "Dana");
        assert_eq!(pr.merge_status, MergeStatus::Conflicts);
        assert_eq!(pr.reviewers.len(), 2);
        assert!(pr.reviewers[0].is_required);
        assert!(!pr.reviewers[1].is_required);
    }

    #[test]
    fn test_unrecognized_merge_status() {
        let pr: RemotePullRequest =
            serde_json::from_str(r#"{ "pullRequestId": 1, "mergeStatus": "somethingNew" }"#).unwrap();
        assert_eq!(pr.merge_status, MergeStatus::Unrecognized);
        assert!(!pr.merge_status.is_failing());
        assert!(pr.reviewers.is_empty());
    }

    #[test]
    fn test_queries_filter_active() {
        let authored = PullRequestQuery::authored_by("repo", "me");
        assert_eq!(authored.creator_id.as_deref(), Some("me"));
        assert!(authored.reviewer_id.is_none());
        assert_eq!(authored.status, PullRequestStatus::Active);

        let reviewing = PullRequestQuery::reviewed_by("repo", "me");
        assert!(reviewing.creator_id.is_none());
        assert_eq!(reviewing.reviewer_id.as_deref(), Some("me"));
        assert_eq!(reviewing.status.as_query_value(), "active");
    }

    #[test]
    fn test_record_from_remote() {
        let pr = RemotePullRequest {
            pull_request_id: 9,
            title: "Bump deps".to_string(),
            description: None,
            created_by: IdentityRef {
                display_name: "Ari".to_string(),
                id: None,
            },
            reviewers: vec![],
            merge_status: MergeStatus::Succeeded,
        };
        let record = PullRequestRecord::from_remote(pr);
        assert_eq!(record.id, 9);
        assert_eq!(record.author_display_name, "Ari");
        assert_eq!(record.health_score, HealthScore::NoResponse);
    }
}
