//! Web page URLs for a repository: pull request pages, blame and history.
//!
//! Every builder is a pure function of its inputs. Bases are used as given,
//! minus a trailing slash.

use std::path::{Component, Path};

use url::form_urlencoded;

pub fn create_pull_request_url(remote_url: &str, branch: &str) -> String {
    format!(
        "{}/pullrequestcreate?sourceRef={}",
        trim_base(remote_url),
        encode_component(branch)
    )
}

pub fn pull_requests_url(repository_url: &str) -> String {
    format!("{}/pullrequests", trim_base(repository_url))
}

pub fn pull_request_discussion_url(repository_url: &str, pull_request_id: u64) -> String {
    format!(
        "{}/pullrequest/{}?view=discussion",
        trim_base(repository_url),
        pull_request_id
    )
}

pub fn file_blame_url(remote_url: &str, relative_path: &str, branch: &str) -> String {
    format!(
        "{}#path={}&version=GB{}&annotate=true",
        trim_base(remote_url),
        encode_path(relative_path),
        encode_component(branch)
    )
}

pub fn file_history_url(remote_url: &str, relative_path: &str, branch: &str) -> String {
    format!(
        "{}#path={}&version=GB{}&_a=history",
        trim_base(remote_url),
        encode_path(relative_path),
        encode_component(branch)
    )
}

pub fn repository_history_url(remote_url: &str, branch: &str) -> String {
    format!(
        "{}/history?itemVersion=GB{}&_a=history",
        trim_base(remote_url),
        encode_component(branch)
    )
}

/// Rewrite a repository-relative path with `/` separators and a leading `/`,
/// whatever separator the host platform used.
pub fn normalize_relative_path(path: &str) -> String {
    let joined = path
        .split(['\\', '/'])
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// Path of `file` relative to the repository root, normalised for URLs.
/// None when the file lies outside the root.
pub fn relative_file_path(repository_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(repository_root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(normalize_relative_path(&segments.join("/")))
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

/// Percent-encode a value the way `encodeURIComponent` does for the
/// characters that matter here (spaces become `%20`, not `+`).
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Encode each segment of a normalised path, keeping the separators.
fn encode_path(relative_path: &str) -> String {
    normalize_relative_path(relative_path)
        .split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}
