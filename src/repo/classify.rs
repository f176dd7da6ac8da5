use reqwest::Url;

use super::types::RemoteKind;

/// Host suffixes of the hosted service. `tfsallin.net` is the service's
/// internal dogfood domain.
const CLOUD_HOST_SUFFIXES: &[&str] = &[".visualstudio.com", ".tfsallin.net"];

/// Path marker every Git remote served by TFS or Team Services carries.
const GIT_PATH_MARKER: &str = "/_git/";

/// Classify a Git remote URL. Total: malformed input is `Unknown`.
pub fn classify(remote_url: &str) -> RemoteKind {
    match Url::parse(remote_url) {
        Ok(url) => classify_url(&url),
        Err(_) => RemoteKind::Unknown,
    }
}

pub(super) fn classify_url(url: &Url) -> RemoteKind {
    let Some(host) = url.host_str().filter(|host| !host.is_empty()) else {
        return RemoteKind::Unknown;
    };

    if !url.path().to_ascii_lowercase().contains(GIT_PATH_MARKER) {
        return RemoteKind::Unknown;
    }

    if is_cloud_host(host) {
        RemoteKind::CloudService
    } else {
        RemoteKind::OnPremisesServer
    }
}

fn is_cloud_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    CLOUD_HOST_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}
