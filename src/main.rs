mod config;
mod links;
mod pulls;
mod repo;
mod status;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::pulls::client::{CollectionSource, RestClient};
use crate::repo::{RemoteDescriptor, RemoteKind, RepositoryContext};
use crate::status::{PullRequestMonitor, TerminalStatus};

/// tfs-pulse — resolve which Team Services/TFS account, collection and project
/// a Git remote belongs to, and keep an eye on your active pull requests.
#[derive(Parser, Debug)]
#[command(name = "tfs-pulse", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a remote locally, without contacting the server
    Resolve {
        /// Git remote URL (e.g., https://account.visualstudio.com/Project/_git/repo)
        remote: String,

        /// JSON descriptor as returned by the server's vsts/info endpoint
        #[arg(long)]
        descriptor: Option<PathBuf>,
    },

    /// Ask the server for the repository's collection, project and ids
    Discover {
        /// Git remote URL
        remote: String,
    },

    /// List your active pull requests: authored by you or awaiting your review
    Pulls {
        /// Git remote URL
        remote: String,
    },

    /// Keep the pull request count up to date
    Poll {
        /// Git remote URL
        remote: String,

        /// Seconds between polls (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many polls
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Print a web page URL for the repository
    Link {
        /// Git remote URL
        remote: String,

        /// Which page to link to
        #[arg(value_enum)]
        kind: LinkKind,

        /// Branch the page refers to
        #[arg(short, long, default_value = "main")]
        branch: String,

        /// File for blame/history pages
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Local repository root; makes --file relative to it
        #[arg(long)]
        root: Option<PathBuf>,

        /// Pull request id for the discussion page
        #[arg(long)]
        id: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LinkKind {
    CreatePullRequest,
    PullRequests,
    PullRequest,
    Blame,
    History,
    RepositoryHistory,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Resolve { remote, descriptor } => {
            let _span = info_span!("resolve", remote = %remote).entered();
            let context = match descriptor {
                Some(path) => {
                    let descriptor = with_remote(load_descriptor(&path)?, &remote);
                    repo::resolve_from_descriptor(&descriptor)
                }
                None => repo::resolve_from_url(&remote),
            };
            print_context(&context);
        }
        Command::Discover { remote } => {
            let config = Config::load()?;
            let client = RestClient::new(&config.server, config.token())?;
            let context = discover(&client, &remote).await?;
            print_context(&context);
        }
        Command::Pulls { remote } => {
            let config = Config::load()?;
            let monitor = connect(&remote, &config).await?;
            info!("getting pull requests");
            let items = monitor.list().await?;
            status::print_items(&items);
        }
        Command::Poll {
            remote,
            interval,
            cycles,
        } => {
            let mut config = Config::load()?;
            if let Some(interval) = interval {
                config.polling.interval_secs = interval;
            }
            let monitor = connect(&remote, &config).await?;
            let interval = config.polling.effective_interval_secs();
            info!(interval_secs = interval, "polling pull requests");
            monitor.run(Duration::from_secs(interval), cycles).await;
        }
        Command::Link {
            remote,
            kind,
            branch,
            file,
            root,
            id,
        } => {
            let url = build_link(&remote, kind, &branch, file.as_deref(), root.as_deref(), id)?;
            println!("{url}");
        }
    }

    Ok(())
}

fn load_descriptor(path: &Path) -> Result<RemoteDescriptor, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// The remote given on the command line wins over the descriptor's own.
fn with_remote(mut descriptor: RemoteDescriptor, remote: &str) -> RemoteDescriptor {
    let repository = descriptor.repository.get_or_insert_with(Default::default);
    if let Some(existing) = repository.remote_url.as_deref().filter(|url| *url != remote) {
        warn!(descriptor = existing, remote, "descriptor names a different remote, using the command line");
    }
    repository.remote_url = Some(remote.to_string());
    descriptor
}

/// Classify the remote locally first so non-TFS remotes never hit the
/// network, then resolve from the server's descriptor.
async fn discover(client: &RestClient, remote: &str) -> Result<RepositoryContext, Box<dyn Error>> {
    if repo::classify(remote) == RemoteKind::Unknown {
        return Err(format!("{remote} is not a Team Services or Team Foundation Server git remote").into());
    }
    info!("fetching repository descriptor");
    let mut descriptor = client.fetch_descriptor(remote).await?;
    // Older servers omit the remote url from the descriptor.
    descriptor
        .repository
        .get_or_insert_with(Default::default)
        .remote_url
        .get_or_insert_with(|| remote.to_string());
    let context = repo::resolve_from_descriptor(&descriptor);
    debug!(kind = %context.kind(), repository = ?context.repository_name(), "resolved repository context");
    Ok(context)
}

/// Where the pull request commands talk to, taken from a discovered context.
#[derive(Debug, PartialEq)]
struct ServiceEndpoints {
    /// Identity lookups (`_apis/connectionData`) go to the account.
    account_url: String,
    collection_url: String,
    repository_id: String,
}

impl ServiceEndpoints {
    fn from_context(context: &RepositoryContext) -> Result<Self, Box<dyn Error>> {
        let account_url = context
            .account_url()
            .ok_or("the server did not report a usable account url for this repository")?;
        let collection_url = context
            .collection_url()
            .ok_or("the server did not report a usable collection url for this repository")?;
        let repository_id = context
            .repository_id()
            .ok_or("the server did not report a repository id")?
            .to_string();
        Ok(Self {
            account_url,
            collection_url,
            repository_id,
        })
    }
}

async fn connect(
    remote: &str,
    config: &Config,
) -> Result<PullRequestMonitor<CollectionSource, TerminalStatus>, Box<dyn Error>> {
    let client = RestClient::new(&config.server, config.token())?;
    let context = discover(&client, remote).await?;

    let endpoints = ServiceEndpoints::from_context(&context)?;
    let user_id = match config.user_id() {
        Some(id) => id,
        None => {
            info!("looking up the current user");
            client.current_user_id(&endpoints.account_url).await?
        }
    };
    let ServiceEndpoints {
        collection_url,
        repository_id,
        ..
    } = endpoints;
    debug!(%collection_url, %repository_id, %user_id, "connected");

    Ok(PullRequestMonitor::new(
        CollectionSource::new(client, collection_url),
        TerminalStatus,
        user_id,
        repository_id,
    ))
}

fn build_link(
    remote: &str,
    kind: LinkKind,
    branch: &str,
    file: Option<&Path>,
    root: Option<&Path>,
    id: Option<u64>,
) -> Result<String, Box<dyn Error>> {
    let relative = match (file, root) {
        (Some(file), Some(root)) => Some(
            links::relative_file_path(root, file)
                .ok_or_else(|| format!("{} is not inside {}", file.display(), root.display()))?,
        ),
        (Some(file), None) => Some(file.to_string_lossy().into_owned()),
        (None, _) => None,
    };

    let url = match kind {
        LinkKind::CreatePullRequest => links::create_pull_request_url(remote, branch),
        LinkKind::PullRequests => links::pull_requests_url(remote),
        LinkKind::PullRequest => {
            let id = id.ok_or("--id is required for the pull-request link")?;
            links::pull_request_discussion_url(remote, id)
        }
        LinkKind::Blame => {
            let relative = relative.ok_or("--file is required for the blame link")?;
            links::file_blame_url(remote, &relative, branch)
        }
        // Without a file the history page of the whole repository is the
        // closest match.
        LinkKind::History => match relative {
            Some(relative) => links::file_history_url(remote, &relative, branch),
            None => links::repository_history_url(remote, branch),
        },
        LinkKind::RepositoryHistory => links::repository_history_url(remote, branch),
    };
    Ok(url)
}

fn print_context(context: &RepositoryContext) {
    fn row(name: &str, value: Option<&str>) {
        match value {
            Some(value) => println!("  {:<16} {}", name.bold(), value),
            None => println!("  {:<16} {}", name.bold(), "-".dimmed()),
        }
    }

    println!();
    println!("Kind: {}", context.kind().to_string().cyan().bold());
    row("Host", context.host());
    row("Protocol", context.protocol());
    row("Path", context.path());
    row("Query", context.query());
    row("Account", context.account());
    row("Account URL", context.account_url().as_deref());
    row("Collection", context.collection_name());
    row("Collection ID", context.collection_id());
    row("Collection URL", context.collection_url().as_deref());
    row("Team project", context.team_project());
    row("Project URL", context.team_project_url().as_deref());
    row("Repository", context.repository_name());
    row("Repository ID", context.repository_id());
    row("Repository URL", context.repository_url().as_deref());
    row("Server URL", context.server_url());
    println!(
        "  {:<16} TFS: {} | Team Services: {} | Team Foundation: {}",
        "Flags".bold(),
        context.is_team_foundation_server(),
        context.is_team_services(),
        context.is_team_foundation()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::types::{CollectionDescriptor, RepositoryDescriptor};

    const REMOTE: &str = "https://contoso.visualstudio.com/Fabrikam/_git/website";

    #[test]
    fn test_cli_parses_link_command() {
        let cli = Cli::try_parse_from([
            "tfs-pulse", "link", REMOTE, "blame", "--file", "src\\lib.rs", "--branch", "dev",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Link {
                kind: LinkKind::Blame,
                ..
            }
        ));
    }

    #[test]
    fn test_blame_link_from_windows_path() {
        let url = build_link(REMOTE, LinkKind::Blame, "main", Some(Path::new("a\\b\\c.txt")), None, None).unwrap();
        assert_eq!(url, format!("{REMOTE}#path=/a/b/c.txt&version=GBmain&annotate=true"));
    }

    #[test]
    fn test_link_relative_to_root() {
        let url = build_link(
            REMOTE,
            LinkKind::History,
            "main",
            Some(Path::new("/work/site/src/app.rs")),
            Some(Path::new("/work/site")),
            None,
        )
        .unwrap();
        assert_eq!(url, format!("{REMOTE}#path=/src/app.rs&version=GBmain&_a=history"));
    }

    #[test]
    fn test_history_without_file_links_repository_history() {
        let url = build_link(REMOTE, LinkKind::History, "main", None, None, None).unwrap();
        assert_eq!(url, links::repository_history_url(REMOTE, "main"));
    }

    #[test]
    fn test_link_missing_arguments() {
        assert!(build_link(REMOTE, LinkKind::Blame, "main", None, None, None).is_err());
        assert!(build_link(REMOTE, LinkKind::PullRequest, "main", None, None, None).is_err());
        assert!(build_link(
            REMOTE,
            LinkKind::Blame,
            "main",
            Some(Path::new("/elsewhere/x.rs")),
            Some(Path::new("/work/site")),
            None
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_discover_rejects_foreign_remote_without_network() {
        let client = RestClient::new(&Config::default().server, None).unwrap();
        let err = discover(&client, "https://github.com/x/y").await.unwrap_err();
        assert!(err.to_string().contains("not a Team Services"));
    }

    #[test]
    fn test_print_context_does_not_panic() {
        print_context(&repo::resolve_from_url(REMOTE));
        print_context(&repo::resolve_from_url("https://github.com/x/y"));
    }

    fn server_descriptor(remote_url: Option<&str>) -> RemoteDescriptor {
        RemoteDescriptor {
            repository: Some(RepositoryDescriptor {
                remote_url: remote_url.map(str::to_string),
                id: Some("5f6d1f2e-repo".to_string()),
                name: Some("website".to_string()),
                project: None,
            }),
            collection: Some(CollectionDescriptor {
                name: Some("DefaultCollection".to_string()),
                id: None,
            }),
            server_url: Some("http://buildserver:8080/tfs".to_string()),
        }
    }

    #[test]
    fn test_command_line_remote_overrides_descriptor() {
        let descriptor = with_remote(server_descriptor(Some("https://github.com/x/y")), REMOTE);
        let remote_url = descriptor.repository.unwrap().remote_url;
        assert_eq!(remote_url.as_deref(), Some(REMOTE));
    }

    #[test]
    fn test_command_line_remote_fills_missing_descriptor_remote() {
        let descriptor = with_remote(RemoteDescriptor::default(), REMOTE);
        let context = repo::resolve_from_descriptor(&descriptor);
        assert_eq!(context.kind(), RemoteKind::CloudService);
        assert_eq!(context.account(), Some("contoso"));
    }

    #[test]
    fn test_identity_lookup_goes_to_account_url() {
        let remote = "http://buildserver:8080/tfs/DefaultCollection/Fabrikam/_git/website";
        let context = repo::resolve_from_descriptor(&server_descriptor(Some(remote)));
        let endpoints = ServiceEndpoints::from_context(&context).unwrap();
        assert_eq!(endpoints.account_url, "http://buildserver:8080/tfs");
        assert_eq!(endpoints.collection_url, "http://buildserver:8080/tfs/DefaultCollection");
        assert_eq!(endpoints.repository_id, "5f6d1f2e-repo");
    }

    #[test]
    fn test_endpoints_need_discovered_fields() {
        let context = repo::resolve_from_url(REMOTE);
        assert!(ServiceEndpoints::from_context(&context).is_err());
    }
}
