use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use graph::{BuildWorker, Commit, EntryView, GitStore, HistoryConfig, MergeOrder, Snapshot};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "gitup-history")]
#[command(about = "Build the commit history list of a Git repository", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the history list
    Log {
        /// Path to the repository
        #[arg(default_value = ".")]
        path: PathBuf,
        #[command(flatten)]
        build: BuildArgs,
        /// Number of entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show history statistics
    Stats {
        /// Path to the repository
        #[arg(default_value = ".")]
        path: PathBuf,
        #[command(flatten)]
        build: BuildArgs,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Start from every branch, remote branch and tag, not just HEAD
    #[arg(short, long)]
    all: bool,
    /// Order for walking merge parents: discovery or reverse
    #[arg(long)]
    merge_order: Option<MergeOrder>,
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl BuildArgs {
    /// File settings first, then command line overrides
    fn history_config(&self) -> Result<HistoryConfig> {
        let mut config = match &self.config {
            Some(path) => HistoryConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => HistoryConfig::default(),
        };

        if self.all {
            config.all_refs = true;
        }
        if let Some(order) = self.merge_order {
            config.merge_order = order;
        }

        Ok(config)
    }
}

async fn build_snapshot(path: PathBuf, args: &BuildArgs) -> Result<Snapshot> {
    let config = args.history_config()?;
    let all_refs = config.all_refs;

    let heads = tokio::task::spawn_blocking(move || -> Result<Vec<Commit>> {
        let mut store = GitStore::open(Some(path.as_path()))
            .with_context(|| format!("Failed to open repository at {}", path.display()))?;
        let heads = store.load_heads(all_refs).context("Failed to load commits")?;
        info!("loaded {} commits from {} heads", store.cached(), heads.len());
        Ok(heads)
    })
    .await??;

    let worker = BuildWorker::new(config);
    worker
        .request(heads)
        .await??
        .ok_or_else(|| anyhow!("History build was cancelled"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Log { path, build, limit, json } => {
            let history = build_snapshot(path, &build).await?;
            let shown = limit.unwrap_or(history.len());

            if json {
                let views: Vec<EntryView> =
                    history.entries().iter().take(shown).map(EntryView::from).collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for entry in history.entries().iter().take(shown) {
                    let children: Vec<&str> =
                        entry.children.iter().map(Commit::short_id).collect();
                    println!(
                        "{}  [{}]  {}",
                        entry.commit.short_id(),
                        children.join(" "),
                        entry.commit.meta().summary
                    );
                }
            }
        }
        Commands::Stats { path, build, json } => {
            let history = build_snapshot(path, &build).await?;
            let stats = history.stats();

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("History statistics:");
                println!("  Total commits: {}", stats.total_commits);
                println!("  Merge commits: {}", stats.merge_commits);
                println!("  Root commits: {}", stats.root_commits);
                println!("  Head commits: {}", stats.head_commits);
                println!("  Child links: {}", stats.total_child_links);
            }
        }
    }

    Ok(())
}
