//! pb-archive main entry point
//!
//! This is the command-line interface for the pb-archive forum archiver.

use anyhow::Context;
use clap::Parser;
use pb_archive::config::{load_config_with_hash, Config, RateLimitConfig};
use pb_archive::scrape::{run_archive, ArchiveOptions, ArchiveSummary};
use pb_archive::storage::InsertMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// pb-archive: a ProBoards forum archiver
///
/// Scrapes a ProBoards forum into a SQLite database plus a directory of
/// downloaded images. The URL decides the scope: the homepage scrapes the
/// whole site, /members only the users, /user/{id} a single user,
/// /board/{id}/... a board subtree, /thread/{id}/... a single thread.
#[derive(Parser, Debug)]
#[command(name = "pb-archive")]
#[command(version)]
#[command(about = "Archive a ProBoards forum into SQLite", long_about = None)]
struct Cli {
    /// Forum URL to scrape
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for forum.db and images/ (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Login username (requires auth.helper-command in the config)
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Login password
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// TOML file with previously captured session cookies
    #[arg(long, value_name = "FILE", conflicts_with_all = ["username", "password"])]
    cookies_file: Option<PathBuf>,

    /// Skip scraping user profiles (homepage scrapes only)
    #[arg(long)]
    skip_users: bool,

    /// Disable all request throttling (may trigger server-side limits)
    #[arg(long)]
    no_delay: bool,

    /// Overwrite entities that already exist in the database
    #[arg(long)]
    update: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            let (config, hash) =
                load_config_with_hash(path).context("failed to load configuration")?;
            tracing::info!(
                "Configuration loaded from {} (hash: {})",
                path.display(),
                hash
            );
            config
        }
        None => Config::default(),
    };

    if let Some(out_dir) = &cli.out_dir {
        config.output.out_dir = out_dir.display().to_string();
    }

    if cli.no_delay {
        tracing::info!("Request throttling disabled");
        config.rate_limit = RateLimitConfig::disabled();
    }

    let options = ArchiveOptions {
        username: cli.username,
        password: cli.password,
        cookies_file: cli.cookies_file,
        skip_users: cli.skip_users,
        mode: if cli.update {
            InsertMode::Update
        } else {
            InsertMode::Skip
        },
    };

    let out_dir = config.output.out_dir.clone();
    let summary = run_archive(config, &cli.url, options)
        .await
        .context("scrape failed")?;

    if !cli.quiet {
        print_summary(&out_dir, &summary);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pb_archive=info,warn"),
            1 => EnvFilter::new("pb_archive=debug,info"),
            2 => EnvFilter::new("pb_archive=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_summary(out_dir: &str, summary: &ArchiveSummary) {
    let counts = &summary.counts;

    println!("=== Archive Summary ===\n");
    println!("Output: {out_dir}/forum.db");
    println!("Requests made: {}", summary.requests);
    println!();
    println!("  Users:          {}", counts.users);
    println!("  Categories:     {}", counts.categories);
    println!("  Boards:         {}", counts.boards);
    println!("  Moderators:     {}", counts.moderators);
    println!("  Threads:        {}", counts.threads);
    println!("  Posts:          {}", counts.posts);
    println!("  Polls:          {}", counts.polls);
    println!("  Poll options:   {}", counts.poll_options);
    println!("  Poll voters:    {}", counts.poll_voters);
    println!("  Images:         {}", counts.images);
    println!("  Avatars:        {}", counts.avatars);
    println!("  Shoutbox posts: {}", counts.shoutbox_posts);
    println!();
    println!(
        "  {} new, {} unchanged, {} failed",
        summary.report.users_inserted + summary.report.content_inserted,
        summary.report.users_unchanged + summary.report.content_unchanged,
        summary.report.failed
    );
}
