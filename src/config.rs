use crate::catalogue::SortOrder;
use crate::client::{ClientOptions, DEFAULT_SOURCE_URL};
use crate::coordinator::CoordinatorOptions;
use crate::relay::RelayConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URL of the prompt feed document
    #[arg(long, env = "VIRAL_PROMPTS_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Base URL of a relay to fetch through instead of the source directly
    #[arg(long, env = "VIRAL_PROMPTS_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Storage backend type (filesystem, postgres, memory)
    #[arg(
        long,
        env = "VIRAL_PROMPTS_STORAGE",
        value_enum,
        default_value_t = StorageKind::Filesystem
    )]
    pub storage: StorageKind,

    /// Directory for cache and likes (when using filesystem storage)
    #[arg(long, env = "VIRAL_PROMPTS_DATA_DIR", default_value = "./.viral-prompts")]
    pub data_dir: PathBuf,

    /// PostgreSQL connection URL
    #[arg(long, env = "VIRAL_PROMPTS_DB_URL")]
    pub db_url: Option<String>,

    /// Per-attempt fetch timeout in seconds
    #[arg(long, env = "VIRAL_PROMPTS_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Extra fetch attempts after a failure
    #[arg(long, env = "VIRAL_PROMPTS_RETRIES", default_value_t = 2)]
    pub retries: u32,

    /// Age in seconds after which cached data counts as stale
    #[arg(long, env = "VIRAL_PROMPTS_STALE_AFTER_SECS", default_value_t = 300)]
    pub stale_after_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    Filesystem,
    Postgres,
    Memory,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List prompts, refreshing the cache when it is stale
    List {
        /// Case-insensitive text to search for
        #[arg(long)]
        search: Option<String>,

        /// Only prompts in this category
        #[arg(long)]
        category: Option<String>,

        /// Only liked prompts
        #[arg(long)]
        liked: bool,

        /// most-copied or newest
        #[arg(long, default_value = "most-copied")]
        sort: SortOrder,
    },
    /// Show one prompt by its url title
    Show { url_title: String },
    /// Toggle the like on a prompt
    Like { url_title: String },
    /// Fetch the feed now
    Refresh,
    /// Delete the cache and fetch from scratch
    ClearCache,
    /// Serve the relay endpoint
    Relay {
        /// Port to run the relay on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.timeout(),
        }
    }

    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            retries: self.retries,
            stale_after: Duration::from_secs(self.stale_after_secs),
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            source_url: self.source_url.clone(),
            timeout: self.timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["viral-prompts", "refresh"]).unwrap();
        assert_eq!(cli.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(cli.storage, StorageKind::Filesystem);
        assert_eq!(cli.client_options().timeout, Duration::from_secs(15));
        assert_eq!(cli.coordinator_options().retries, 2);
        assert_eq!(cli.coordinator_options().stale_after, Duration::from_secs(300));
    }

    #[test]
    fn list_arguments() {
        let cli = Cli::try_parse_from([
            "viral-prompts",
            "--storage",
            "memory",
            "list",
            "--search",
            "cat",
            "--sort",
            "newest",
            "--liked",
        ])
        .unwrap();
        match cli.command {
            Command::List { search, sort, liked, category } => {
                assert_eq!(search.as_deref(), Some("cat"));
                assert_eq!(sort, SortOrder::Newest);
                assert!(liked);
                assert_eq!(category, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn relay_subcommand_takes_a_port() {
        let cli = Cli::try_parse_from(["viral-prompts", "relay", "--port", "9090"]).unwrap();
        assert!(matches!(cli.command, Command::Relay { port: 9090 }));
        assert_eq!(cli.relay_config().source_url, DEFAULT_SOURCE_URL);

        let cli = Cli::try_parse_from(["viral-prompts", "relay"]).unwrap();
        assert!(matches!(cli.command, Command::Relay { port: 8080 }));
    }

    #[test]
    fn rejects_unknown_sort() {
        assert!(Cli::try_parse_from(["viral-prompts", "list", "--sort", "oldest"]).is_err());
    }
}
