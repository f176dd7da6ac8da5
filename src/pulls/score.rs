use super::types::{HealthScore, RemotePullRequest, Reviewer};

const VOTE_REJECTED: i32 = -10;
const VOTE_NONE: i32 = 0;

/// Reduce merge state and reviewer votes to a single health score.
///
/// Precedence, first match wins:
/// 1. failing merge (conflicts, failure, rejected by policy) => `Failed`
/// 2. any rejecting vote => `Failed`
/// 3. nobody voted => `NoResponse`
/// 4. no negative vote and every required reviewer approved => `Succeeded`
/// 5. otherwise => `Waiting`
pub fn health_score(pull_request: &RemotePullRequest) -> HealthScore {
    if pull_request.merge_status.is_failing() {
        return HealthScore::Failed;
    }
    score_votes(&pull_request.reviewers)
}

fn score_votes(reviewers: &[Reviewer]) -> HealthScore {
    if reviewers.iter().any(|r| r.vote <= VOTE_REJECTED) {
        return HealthScore::Failed;
    }

    if reviewers.iter().all(|r| r.vote == VOTE_NONE) {
        return HealthScore::NoResponse;
    }

    // Past the check above at least one vote is cast, so a vote set without
    // negatives contains an approval.
    let no_objections = reviewers.iter().all(|r| r.vote >= VOTE_NONE);
    let required_approved = reviewers
        .iter()
        .filter(|r| r.is_required)
        .all(|r| r.vote > VOTE_NONE);

    if no_objections && required_approved {
        HealthScore::Succeeded
    } else {
        HealthScore::Waiting
    }
}
