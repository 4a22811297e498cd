mod catalog;
mod config;
mod fetcher;
mod parser;
mod resolver;
mod store;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use catalog::CatalogOptions;
use fetcher::WikiClient;

#[derive(Parser)]
#[command(name = "quest_catalog", about = "Quest catalog extractor for the ARC Raiders wiki")]
struct Cli {
    /// Settings file (default: ./quests.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the Quests page and every quest page, write the catalog JSON
    Run {
        /// Output file (default from settings)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only resolve and keep the first N quests
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Parallel quest-page fetches
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Parse a saved index page offline (no quest pages fetched)
    Table {
        /// File holding the raw wikitext of the Quests page
        file: PathBuf,
    },
    /// Resolve previous/next quests for one quest
    Links {
        /// Quest name as shown in the tables, e.g. "Clearer Skies"
        name: String,
    },
    /// Summarize a saved catalog
    Stats {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Compact table of a saved catalog
    Overview {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Only quests from this trader
        #[arg(short, long)]
        trader: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = config::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Run {
            output,
            limit,
            workers,
        } => {
            let client = WikiClient::new(&settings)?;
            let mut opts = CatalogOptions::from_settings(&settings)?;
            opts.limit = limit;
            if let Some(w) = workers {
                opts.workers = w.max(1);
            }
            let output = output.unwrap_or_else(|| settings.output.clone());

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                    .progress_chars("=> "),
            );

            let records = catalog::build_catalog(&client, &opts, &pb)
                .context("Catalog run aborted; nothing written")?;
            store::write_catalog(&output, &records)?;
            println!("Parsed {} quests -> {}", records.len(), output.display());
            Ok(())
        }
        Commands::Table { file } => {
            let markup = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let opts = CatalogOptions::from_settings(&settings)?;
            let quests = parser::parse_index(&markup, &opts.table_class, &opts.layout);
            if quests.is_empty() {
                println!("No quest rows found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<32} | {:<14} | {:<20} | {:>4} | {:>4}",
                "#", "Quest", "Trader", "Location", "Obj", "Rew"
            );
            println!("{}", "-".repeat(92));
            for (i, q) in quests.iter().enumerate() {
                println!(
                    "{:>3} | {:<32} | {:<14} | {:<20} | {:>4} | {:>4}",
                    i + 1,
                    truncate(&q.name, 32),
                    truncate(&q.trader, 14),
                    truncate(&q.required_location, 20),
                    q.objective.len(),
                    q.reward.len()
                );
            }
            println!("\n{} quests", quests.len());
            Ok(())
        }
        Commands::Links { name } => {
            let client = WikiClient::new(&settings)?;
            let links = resolver::resolve_links(&client, &name, &settings.infobox_template);
            let previous = catalog::normalize_previous(links.previous, &settings.sentinel);
            println!("Quest:    {}", name);
            println!("Previous: {}", join_or_dash(&previous));
            println!("Next:     {}", join_or_dash(&links.next));
            Ok(())
        }
        Commands::Stats { input } => {
            let path = input.unwrap_or_else(|| settings.output.clone());
            let records = store::read_catalog(&path)?;
            let s = store::stats(&records);
            println!("Quests:        {}", s.total);
            println!("Unique names:  {}", s.unique_names);
            println!("Traders:       {}", s.traders);
            println!("With previous: {}", s.with_previous);
            println!("With next:     {}", s.with_next);
            println!("No objective:  {}", s.without_objective);
            println!("Dangling:      {}", s.dangling.len());
            for name in &s.dangling {
                println!("  {}", name);
            }
            Ok(())
        }
        Commands::Overview {
            input,
            trader,
            limit,
        } => {
            let path = input.unwrap_or_else(|| settings.output.clone());
            let records = store::read_catalog(&path)?;
            let rows: Vec<_> = records
                .iter()
                .filter(|r| {
                    trader
                        .as_deref()
                        .map_or(true, |t| r.trader.eq_ignore_ascii_case(t))
                })
                .take(limit)
                .collect();
            if rows.is_empty() {
                println!("No quests found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<12} | {:<24} | {:<24}",
                "#", "Quest", "Trader", "Previous", "Next"
            );
            println!("{}", "-".repeat(103));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<12} | {:<24} | {:<24}",
                    i + 1,
                    truncate(&r.name, 28),
                    truncate(&r.trader, 12),
                    truncate(&join_or_dash(&r.previous_quests), 24),
                    truncate(&join_or_dash(&r.next_quests), 24)
                );
            }
            println!("\n{} of {} quests", rows.len(), records.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Café", 4), "Café");
        assert_eq!(truncate("Picking Up The Pieces", 7), "Picking...");
    }

    #[test]
    fn durations() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from(["quest_catalog", "run", "-n", "3", "-w", "4"]).unwrap();
        match cli.command {
            Commands::Run { limit, workers, .. } => {
                assert_eq!(limit, Some(3));
                assert_eq!(workers, Some(4));
            }
            _ => panic!("expected run"),
        }
    }
}
