use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};
use viral_prompts::cache::PromptCache;
use viral_prompts::catalogue::{canonical_url, how_to_use_steps, image_url, CatalogueQuery};
use viral_prompts::client::PromptClient;
use viral_prompts::config::{Cli, Command, StorageKind};
use viral_prompts::coordinator::{PromptsCoordinator, Snapshot};
use viral_prompts::likes::LikedPrompts;
use viral_prompts::relay;
use viral_prompts::storage::postgres::PostgresStore;
use viral_prompts::storage::{FileSystemStore, KeyValueStore, MemoryStore};
use viral_prompts::transport::{HttpTransport, RelayTransport, Transport};

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    // Use `RUST_LOG=info` (or debug, trace, etc.) to control log level
    // Example: RUST_LOG=viral_prompts=debug cargo run -- list
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    tracing::debug!(args = ?args, "Starting viral prompts client");

    match &args.command {
        Command::Relay { port } => return relay::serve(args.relay_config(), *port).await,
        Command::List {
            search,
            category,
            liked,
            sort,
        } => {
            let store = open_store(&args).await?;
            let coordinator = open_coordinator(&args, store.clone()).await?;
            let snapshot = current_or_refreshed(&coordinator).await;
            report_status(&snapshot);
            let likes = LikedPrompts::load(store).await;
            let query = CatalogueQuery {
                search: search.clone(),
                category: category.clone(),
                liked_only: *liked,
                sort: *sort,
            };
            for prompt in query.apply(&snapshot.prompts, Some(&likes)) {
                let heart = if likes.is_liked(&prompt.url_title) { "♥" } else { " " };
                let copied = prompt
                    .copied_count
                    .map(|c| format!("{:>6}", c))
                    .unwrap_or_else(|| "     -".to_string());
                println!("{} {} {}  {}", heart, copied, prompt.url_title, prompt.title);
            }
        }
        Command::Show { url_title } => {
            let store = open_store(&args).await?;
            let coordinator = open_coordinator(&args, store.clone()).await?;
            let snapshot = current_or_refreshed(&coordinator).await;
            report_status(&snapshot);
            let Some(prompt) = snapshot.find(url_title) else {
                bail!("No prompt with url title '{}'", url_title);
            };
            let likes = LikedPrompts::load(store).await;
            let heart = if likes.is_liked(&prompt.url_title) { " ♥" } else { "" };
            println!("{}{}", prompt.title, heart);
            println!("{}", canonical_url(&prompt.url_title));
            if let Some(description) = &prompt.description {
                println!("\n{}", description);
            }
            if let Some(image) = image_url(prompt.image.as_deref()) {
                println!("image: {}", image);
            }
            if !prompt.categories().is_empty() {
                println!("categories: {}", prompt.categories().join(", "));
            }
            println!("\n{}\n", prompt.prompt);
            let steps = how_to_use_steps(prompt.how_to_use.as_deref());
            for (n, step) in steps.iter().enumerate() {
                println!("{}. {}", n + 1, step);
            }
        }
        Command::Like { url_title } => {
            let mut likes = LikedPrompts::load(open_store(&args).await?).await;
            let liked = likes.toggle(url_title).await;
            println!("{} {}", if liked { "Liked" } else { "Unliked" }, url_title);
        }
        Command::Refresh => {
            let coordinator = open_coordinator(&args, open_store(&args).await?).await?;
            let snapshot = coordinator.refresh().await;
            report_status(&snapshot);
            println!("{} prompts available", snapshot.prompts.len());
        }
        Command::ClearCache => {
            let coordinator = open_coordinator(&args, open_store(&args).await?).await?;
            let snapshot = coordinator
                .clear_cache_and_refresh()
                .await
                .context("Clearing the cache failed")?;
            report_status(&snapshot);
            println!("{} prompts available", snapshot.prompts.len());
        }
    }
    Ok(())
}

async fn open_store(args: &Cli) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match args.storage {
        StorageKind::Filesystem => {
            tracing::debug!(path = %args.data_dir.display(), "Using filesystem storage");
            Arc::new(FileSystemStore::new(&args.data_dir))
        }
        StorageKind::Postgres => {
            let Some(db_url) = args.db_url.as_deref() else {
                bail!("--db-url is required for postgres storage");
            };
            let store = PostgresStore::new(db_url).await?;
            store.init_schema().await?;
            Arc::new(store)
        }
        StorageKind::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

async fn open_coordinator(
    args: &Cli,
    store: Arc<dyn KeyValueStore>,
) -> Result<PromptsCoordinator> {
    let transport: Arc<dyn Transport> = match &args.relay_url {
        Some(relay_url) => {
            tracing::info!(relay = %relay_url, "Fetching through relay");
            Arc::new(RelayTransport::new(relay_url, args.timeout())?)
        }
        None => Arc::new(HttpTransport::new(args.source_url.clone(), args.timeout())?),
    };
    let client = PromptClient::with_options(transport, args.client_options());
    let cache = PromptCache::new(store);
    Ok(PromptsCoordinator::bootstrap(client, cache, args.coordinator_options()).await)
}

/// A one-shot CLI cannot wait for a background refresh, so stale data is
/// refreshed in the foreground; fresh cached data is used as is.
async fn current_or_refreshed(coordinator: &PromptsCoordinator) -> Snapshot {
    if coordinator.is_stale() {
        coordinator.refresh().await
    } else {
        coordinator.snapshot()
    }
}

fn report_status(snapshot: &Snapshot) {
    if let Some(err) = &snapshot.error {
        if snapshot.is_using_cache {
            eprintln!("Showing cached data: {}", err.user_message());
        } else {
            eprintln!("Failed to load prompts: {}", err.user_message());
        }
    }
}
