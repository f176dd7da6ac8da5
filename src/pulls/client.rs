use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::types::{PullRequestQuery, RemotePullRequest, ValueList};
use super::{FetchError, PullRequestSource};
use crate::config::ServerConfig;
use crate::repo::RemoteDescriptor;

const USER_AGENT: &str = concat!("tfs-pulse/", env!("CARGO_PKG_VERSION"));

/// Maps failures while sending a request. Body reads and JSON decoding are
/// classified in `get_json`.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::InvalidEndpoint(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Remote {
                status: status.as_u16(),
                message: message_for_status(status),
            }
        } else {
            FetchError::Offline(err.to_string())
        }
    }
}

/// Human-readable explanation of a failure status.
pub fn message_for_status(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Unauthorized. Check that your personal access token is valid".to_string(),
        403 => "Forbidden. Your token lacks permission for this resource".to_string(),
        404 => "The requested resource was not found on the server".to_string(),
        407 => "Proxy authentication is required".to_string(),
        500..=599 => format!(
            "The server encountered an error: {}",
            status.canonical_reason().unwrap_or("server error")
        ),
        code => format!(
            "The request failed with status {code}: {}",
            status.canonical_reason().unwrap_or("unknown status")
        ),
    }
}

/// Build a remote failure, keeping the server's own error message when the
/// body carries one.
fn remote_error(status: StatusCode, body: &str) -> FetchError {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let mut message = message_for_status(status);
    if let Ok(detail) = serde_json::from_str::<ErrorBody>(body) {
        message.push_str(": ");
        message.push_str(&detail.message);
    }
    FetchError::Remote {
        status: status.as_u16(),
        message,
    }
}

/// Thin REST transport for TFS/Team Services.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    token: Option<String>,
    api_version: String,
}

impl RestClient {
    pub fn new(config: &ServerConfig, token: Option<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self {
            http,
            token,
            api_version: config.api_version.clone(),
        })
    }

    /// Ask the server which collection, project and repository a remote
    /// belongs to.
    #[instrument(skip(self))]
    pub async fn fetch_descriptor(&self, remote_url: &str) -> Result<RemoteDescriptor, FetchError> {
        let url = endpoint(remote_url, &["vsts", "info"])?;
        self.get_json(url).await
    }

    /// Identifier of the user the configured token belongs to.
    #[instrument(skip(self))]
    pub async fn current_user_id(&self, account_url: &str) -> Result<String, FetchError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct AuthenticatedUser {
            id: String,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ConnectionData {
            authenticated_user: AuthenticatedUser,
        }

        let url = endpoint(account_url, &["_apis", "connectionData"])?;
        let data: ConnectionData = self.get_json(url).await?;
        Ok(data.authenticated_user.id)
    }

    /// Search the pull requests of one repository in a collection.
    #[instrument(skip(self, query), fields(repository = %query.repository_id))]
    pub async fn pull_requests(
        &self,
        collection_url: &str,
        query: &PullRequestQuery,
    ) -> Result<Vec<RemotePullRequest>, FetchError> {
        let url = self.pull_requests_url(collection_url, query)?;
        let list: ValueList<RemotePullRequest> = self.get_json(url).await?;
        Ok(list.value)
    }

    fn pull_requests_url(&self, collection_url: &str, query: &PullRequestQuery) -> Result<Url, FetchError> {
        let mut url = endpoint(
            collection_url,
            &[
                "_apis",
                "git",
                "repositories",
                query.repository_id.as_str(),
                "pullrequests",
            ],
        )?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("searchCriteria.status", query.status.as_query_value());
            if let Some(creator) = &query.creator_id {
                pairs.append_pair("searchCriteria.creatorId", creator);
            }
            if let Some(reviewer) = &query.reviewer_id {
                pairs.append_pair("searchCriteria.reviewerId", reviewer);
            }
            pairs.append_pair("api-version", &self.api_version);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "GET");
        let mut request = self.http.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.basic_auth("", Some(token));
        }
        let response = request.send().await?;
        let status = response.status();
        // The connection can still drop while the body streams in.
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Offline(err.to_string()))?;
        debug!(%status, bytes = body.len(), "received response");
        if !status.is_success() {
            return Err(remote_error(status, &body));
        }
        serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }
}

/// A [`PullRequestSource`] bound to one collection.
#[derive(Debug, Clone)]
pub struct CollectionSource {
    client: RestClient,
    collection_url: String,
}

impl CollectionSource {
    pub fn new(client: RestClient, collection_url: impl Into<String>) -> Self {
        Self {
            client,
            collection_url: collection_url.into(),
        }
    }
}

#[async_trait]
impl PullRequestSource for CollectionSource {
    async fn fetch(&self, query: &PullRequestQuery) -> Result<Vec<RemotePullRequest>, FetchError> {
        self.client.pull_requests(&self.collection_url, query).await
    }
}

/// Append path segments to a base URL, keeping the base's own path.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = Url::parse(base).map_err(|_| FetchError::InvalidEndpoint(base.to_string()))?;
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
