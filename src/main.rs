//! WealthBlocks - block-proportional wealth visualization backend
//!
//! Thin CLI over the refresh pipeline: run a cycle, export the current
//! view, inspect or clear the snapshot cache.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wealthblocks_backend::{
    cache::CacheStatus,
    config::Config,
    export,
    normalize::format_compact,
    session::{RefreshOutcome, RefreshSession, SnapshotOrigin},
    view::{
        build_view,
        compare::compare,
        filter::{CategoryFilter, SearchFilter, ViewFilter},
        render::render_plan,
        SortBy, View,
    },
};

#[derive(Parser)]
#[command(
    name = "wealthblocks",
    about = "Reconcile, quantize and export the wealth snapshot"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full refresh cycle and print the resulting view summary
    Refresh {
        /// Clear the cache first and rebuild from the baseline
        #[arg(long)]
        force: bool,
        /// Comma-separated search terms (name, slug or category)
        #[arg(long)]
        search: Option<String>,
        /// Restrict to a single category id
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Value)]
        sort: SortArg,
    },
    /// Export the current filtered view as a JSON artifact
    Export {
        /// Output path (default: wealth-data-export-YYYY-MM-DD.json)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Compare a chosen set of records against each other
    Compare {
        /// Record ids to compare
        ids: Vec<String>,
    },
    /// Show snapshot cache status
    Status,
    /// Drop the cached snapshot
    ClearCache,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Value,
    Name,
    Category,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Value => SortBy::Value,
            SortArg::Name => SortBy::Name,
            SortArg::Category => SortBy::Category,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Refresh {
            force,
            search,
            category,
            sort,
        } => {
            let session = RefreshSession::new(config)?;
            let outcome = if force {
                session.force_refresh().await?
            } else {
                session.run().await?
            };

            let filter = build_filter(search, category);
            let view = build_view(
                &outcome.snapshot,
                &filter,
                sort.into(),
                session.config().scale_per_block,
            );
            print_summary(&outcome, &view, session.config().scale_per_block);
        }
        Command::Export {
            out,
            search,
            category,
        } => {
            let session = RefreshSession::new(config)?;
            let outcome = session.run().await?;

            let filter = build_filter(search, category);
            let view = build_view(
                &outcome.snapshot,
                &filter,
                SortBy::Value,
                session.config().scale_per_block,
            );
            let document = export::build_export(&outcome.snapshot.metadata, &view);
            let path = out.unwrap_or_else(export::default_export_path);
            export::write_export(&document, &path)?;
            info!(path = %path.display(), items = document.filtered_items.len(), "export written");
            println!("Exported {} items to {}", document.filtered_items.len(), path.display());
        }
        Command::Compare { ids } => {
            let session = RefreshSession::new(config)?;
            let outcome = session.run().await?;
            let entries = compare(
                &outcome.snapshot,
                &ids,
                session.config().scale_per_block,
            );
            if entries.is_empty() {
                println!("No matching records");
            }
            for entry in entries {
                println!(
                    "{} [{}]: {} | {} blocks | {:.1}% of largest",
                    entry.name,
                    entry.category_name,
                    format_compact(entry.value_billions),
                    entry.blocks,
                    entry.ratio_of_largest * 100.0
                );
            }
        }
        Command::Status => {
            let session = RefreshSession::new(config)?;
            match session.cache().status() {
                CacheStatus::Absent => println!("No cache"),
                CacheStatus::Fresh { age_minutes } if age_minutes < 60 => {
                    println!("Cached ({}m ago)", age_minutes)
                }
                CacheStatus::Fresh { age_minutes } => {
                    println!("Cached ({}h ago)", age_minutes / 60)
                }
                CacheStatus::Stale { age_minutes } => {
                    println!("Stale ({}h ago)", age_minutes / 60)
                }
            }
        }
        Command::ClearCache => {
            let session = RefreshSession::new(config)?;
            session.cache().clear();
            println!("Cache cleared");
        }
    }

    Ok(())
}

fn build_filter(search: Option<String>, category: Option<String>) -> ViewFilter {
    ViewFilter {
        search: search.as_deref().map(SearchFilter::new),
        category: category.as_deref().map(CategoryFilter::new),
    }
}

fn print_summary(outcome: &RefreshOutcome, view: &View, scale_per_block: f64) {
    let origin = match outcome.origin {
        SnapshotOrigin::Baseline => "baseline",
        SnapshotOrigin::CacheOnly => "cache only",
        SnapshotOrigin::Fallback => "embedded fallback",
    };

    println!(
        "Snapshot v{} ({origin}), {} live updates applied{}",
        outcome.snapshot.metadata.data_version,
        outcome.live_updates_applied,
        if outcome.version_changed {
            ", data version changed"
        } else {
            ""
        }
    );
    println!(
        "Each block = ${}B | {} items | {} live | total {} | {} blocks",
        scale_per_block,
        view.stats.total_items,
        view.stats.live_items,
        format_compact(view.stats.total_value),
        view.stats.total_blocks
    );

    let plan = render_plan(view);
    for run in &plan.runs {
        let partial = run
            .partial
            .as_ref()
            .map(|p| format!(" + {:.0}%", p.ratio * 100.0))
            .unwrap_or_default();
        println!("  {} {} blocks{}", run.label, run.full_blocks, partial);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wealthblocks_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
