use serde::{Deserialize, Serialize};

/// Which flavour of server a Git remote points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteKind {
    /// Hosted, multi-tenant service addressed through an account subdomain.
    CloudService,
    /// Self-managed server instance.
    OnPremisesServer,
    /// Anything else (third-party hosting, malformed input, ...).
    Unknown,
}

impl std::fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteKind::CloudService => write!(f, "Team Services"),
            RemoteKind::OnPremisesServer => write!(f, "Team Foundation Server"),
            RemoteKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Repository description as returned by the server's `vsts/info` endpoint.
///
/// Every field is optional: a partially filled descriptor still resolves,
/// leaving whatever is missing absent on the context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDescriptor {
    #[serde(default)]
    pub repository: Option<RepositoryDescriptor>,
    #[serde(default)]
    pub collection: Option<CollectionDescriptor>,
    /// Canonical account URL; only honoured for on-premises servers.
    #[serde(default)]
    pub server_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDescriptor {
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Immutable identity of a repository on a Team Services/TFS server.
///
/// Built once by [`super::resolve_from_url`] or
/// [`super::resolve_from_descriptor`]. A new remote means a new context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub(super) host: Option<String>,
    pub(super) protocol: Option<String>,
    pub(super) path: Option<String>,
    pub(super) query: Option<String>,
    pub(super) kind: RemoteKind,
    pub(super) account: Option<String>,
    pub(super) collection_name: Option<String>,
    pub(super) collection_id: Option<String>,
    pub(super) repository_id: Option<String>,
    pub(super) repository_name: Option<String>,
    pub(super) team_project: Option<String>,
    pub(super) server_url: Option<String>,
}

impl RepositoryContext {
    /// A context carrying nothing at all (the remote could not be parsed).
    pub(super) fn empty() -> Self {
        Self {
            host: None,
            protocol: None,
            path: None,
            query: None,
            kind: RemoteKind::Unknown,
            account: None,
            collection_name: None,
            collection_id: None,
            repository_id: None,
            repository_name: None,
            team_project: None,
            server_url: None,
        }
    }

    /// Host as it appeared in the remote, including a non-default port.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// URL scheme without the trailing colon (e.g. `https`).
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn kind(&self) -> RemoteKind {
        self.kind
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection_name.as_deref()
    }

    pub fn collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }

    pub fn repository_id(&self) -> Option<&str> {
        self.repository_id.as_deref()
    }

    pub fn repository_name(&self) -> Option<&str> {
        self.repository_name.as_deref()
    }

    pub fn team_project(&self) -> Option<&str> {
        self.team_project.as_deref()
    }

    pub fn server_url(&self) -> Option<&str> {
        self.server_url.as_deref()
    }

    pub fn is_team_foundation(&self) -> bool {
        self.kind != RemoteKind::Unknown
    }

    pub fn is_team_foundation_server(&self) -> bool {
        self.kind == RemoteKind::OnPremisesServer
    }

    pub fn is_team_services(&self) -> bool {
        self.kind == RemoteKind::CloudService
    }

    /// Root URL of the account.
    ///
    /// Cloud accounts are derived from the remote's scheme and host. On-premises
    /// servers can live behind arbitrary ports or virtual directories, so their
    /// account URL is only known when the descriptor supplied `serverUrl`.
    pub fn account_url(&self) -> Option<String> {
        match self.kind {
            RemoteKind::CloudService => {
                let protocol = self.protocol.as_deref()?;
                let host = self.host.as_deref()?;
                Some(format!("{protocol}://{host}"))
            }
            RemoteKind::OnPremisesServer => self
                .server_url
                .as_deref()
                .map(|url| url.trim_end_matches('/'))
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            RemoteKind::Unknown => None,
        }
    }

    /// Collection URL. Accounts whose single collection carries the account
    /// name (the cloud default) map to the account URL itself.
    pub fn collection_url(&self) -> Option<String> {
        let collection = self.collection_name.as_deref()?;
        let account = self.account.as_deref()?;
        let account_url = self.account_url()?;
        if account.to_lowercase() == collection.to_lowercase() {
            Some(account_url)
        } else {
            Some(format!("{account_url}/{collection}"))
        }
    }

    pub fn team_project_url(&self) -> Option<String> {
        let team_project = self.team_project.as_deref()?;
        Some(format!("{}/{}", self.collection_url()?, team_project))
    }

    pub fn repository_url(&self) -> Option<String> {
        let repository_name = self.repository_name.as_deref()?;
        Some(format!("{}/_git/{}", self.team_project_url()?, repository_name))
    }
}
