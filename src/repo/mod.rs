pub mod classify;
pub mod types;

pub use classify::classify;
pub use types::{RemoteDescriptor, RemoteKind, RepositoryContext};

use reqwest::Url;
use tracing::debug;

/// Resolve a context from a bare Git remote URL.
///
/// Only the account can be derived this way; collection, project and
/// repository identifiers need the server's descriptor (see
/// [`resolve_from_descriptor`]). Never fails: unusable input yields an
/// `Unknown` context.
pub fn resolve_from_url(remote_url: &str) -> RepositoryContext {
    debug!(remote_url, "resolving repository context from remote url");
    resolve(remote_url, None)
}

/// Resolve a context from the structured descriptor returned by the server.
pub fn resolve_from_descriptor(descriptor: &RemoteDescriptor) -> RepositoryContext {
    let remote_url = descriptor
        .repository
        .as_ref()
        .and_then(|repository| repository.remote_url.as_deref())
        .unwrap_or_default();
    debug!(remote_url, "resolving repository context from descriptor");
    resolve(remote_url, Some(descriptor))
}

fn resolve(remote_url: &str, descriptor: Option<&RemoteDescriptor>) -> RepositoryContext {
    let Ok(url) = Url::parse(remote_url) else {
        debug!("remote url could not be parsed");
        return RepositoryContext::empty();
    };

    let mut context = RepositoryContext::empty();
    context.host = authority_host(&url);
    context.protocol = Some(url.scheme().to_string()).filter(|scheme| !scheme.is_empty());
    context.path = Some(url.path().to_string()).filter(|path| !path.is_empty());
    context.query = url.query().map(str::to_string);

    let kind = classify::classify_url(&url);
    if kind == RemoteKind::Unknown {
        debug!("remote is not a Team Foundation git repository");
        return context;
    }

    let host_name = url.host_str().unwrap_or_default();
    let account = match kind {
        RemoteKind::CloudService => account_from_host(host_name),
        _ => host_name,
    };
    context.account = Some(account.to_string());
    context.kind = kind;
    debug!(kind = %kind, account = ?context.account, "classified remote");

    if let Some(descriptor) = descriptor {
        apply_descriptor(&mut context, descriptor);
    }

    context
}

fn apply_descriptor(context: &mut RepositoryContext, descriptor: &RemoteDescriptor) {
    if let Some(collection) = &descriptor.collection {
        context.collection_name = collection.name.clone();
        context.collection_id = collection.id.clone();
    }
    if let Some(repository) = &descriptor.repository {
        context.repository_id = repository.id.clone();
        context.repository_name = repository.name.clone();
        context.team_project = repository
            .project
            .as_ref()
            .and_then(|project| project.name.clone());
    }
    if context.kind == RemoteKind::OnPremisesServer {
        context.server_url = descriptor.server_url.clone();
    }
    debug!(
        collection = ?context.collection_name,
        collection_id = ?context.collection_id,
        repository = ?context.repository_name,
        repository_id = ?context.repository_id,
        team_project = ?context.team_project,
        server_url = ?context.server_url,
        "applied descriptor fields"
    );
}

/// Host plus explicit port, the way it appears in the remote.
fn authority_host(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|host| !host.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// First DNS label of a host; a dotless host is its own account.
fn account_from_host(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}
