use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use showgap::config::{AppConfig, DataMode};
use showgap::models::{Show, ShowTrack};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "showgap",
    version,
    about = "Live-show catalog enricher: show ordinals, song gaps, set timing"
)]
struct Cli {
    /// Directory holding the track and show JSON files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use the small trial files instead of the full catalog
    #[arg(short, long, global = true)]
    test: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download raw track records from the catalog API
    Fetch {
        /// Only fetch shows after the last date already on disk
        #[arg(short, long)]
        update: bool,
    },

    /// Enrich raw tracks into the nested per-show document
    Transform,

    /// Drop raw tracks after a cutoff date (YYYY-MM-DD, inclusive)
    Prune {
        cutoff: String,
    },

    /// Show catalog statistics and the biggest bust-outs
    Stats {
        /// Number of bust-outs to list
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// View one show's enriched setlist
    Show {
        /// Show date (YYYY-MM-DD)
        date: String,
    },

    /// List every performance of one or more songs
    Song {
        /// Song slugs (e.g. tweezer mikes-song)
        #[arg(required = true)]
        slugs: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();
    let mode = DataMode::from_flag(cli.test);
    let paths = config.data_paths(cli.data_dir.as_deref(), mode);
    log::info!("Raw tracks: {}", paths.raw_tracks.display());

    match cli.command {
        Commands::Fetch { update } => {
            let result = showgap::fetch::run_fetch(&config.api, &paths.raw_tracks, mode, update)
                .context("Fetch failed")?;

            if !result.written {
                println!("No tracks fetched.");
                return Ok(());
            }
            println!();
            println!("{}", "=".repeat(50));
            println!("Saved to: {}", paths.raw_tracks.display());
            println!("Fetched:  {}", result.fetched);
            println!("Tracks:   {}", result.total_tracks);
            println!("Shows:    {}", result.total_shows);
            if let (Some(first), Some(last)) = (&result.first_date, &result.last_date) {
                println!("Range:    {first} to {last}");
            }
            println!("{}", "=".repeat(50));
        }

        Commands::Transform => {
            let result = showgap::pipeline::transform(&paths.raw_tracks, &paths.shows)
                .context("Transform failed")?;

            if !result.written {
                println!("No tracks to process.");
                return Ok(());
            }
            println!("{}", "=".repeat(50));
            println!("Input:  {}", paths.raw_tracks.display());
            println!("Output: {}", paths.shows.display());
            println!("Shows:  {}", result.shows);
            println!("Tracks: {}", result.tracks);
            println!("{}", "=".repeat(50));
        }

        Commands::Prune { cutoff } => {
            let result = showgap::catalog::prune::prune_file(&paths.raw_tracks, &cutoff)
                .context("Prune failed")?;
            println!("Original tracks: {}", result.original);
            println!("Removed tracks after {}: {}", cutoff, result.removed);
            println!("Remaining tracks: {}", result.remaining);
        }

        Commands::Stats { limit } => {
            let catalog = showgap::pipeline::build_catalog(&paths.raw_tracks)?;
            if catalog.is_empty() {
                println!("No tracks to process.");
                return Ok(());
            }

            let stats = showgap::stats::CatalogStats::from_catalog(&catalog);
            println!("Catalog Statistics");
            println!("==================");
            println!("Shows:   {}", stats.shows);
            println!("Tracks:  {}", stats.tracks);
            println!("Songs:   {}", stats.songs);
            println!("Debuts:  {}", stats.debuts);
            if let (Some(first), Some(last)) = (&stats.first_date, &stats.last_date) {
                println!("Range:   {first} to {last}");
            }
            println!();

            println!("Shows per year:");
            for (year, count) in &stats.shows_per_year {
                println!("  {year}  {count}");
            }
            println!();

            let top = showgap::stats::bust_outs(&catalog, limit);
            if !top.is_empty() {
                println!("Biggest bust-outs:");
                println!();
                print_bust_out_table(&top);
            }
        }

        Commands::Show { date } => {
            let catalog = showgap::pipeline::build_catalog(&paths.raw_tracks)?;
            match catalog.find_by_date(&date) {
                Some(show) => print_show(show),
                None => println!("No show on {}.", date),
            }
        }

        Commands::Song { slugs } => {
            let catalog = showgap::pipeline::build_catalog(&paths.raw_tracks)?;
            let index = showgap::stats::SongIndex::from_catalog(&catalog);
            for slug in &slugs {
                if index.shows_for(slug).is_empty() {
                    log::warn!("Unknown song slug: {slug}");
                }
            }

            let shows = index.filter_to_songs(&slugs);
            if shows.is_empty() {
                println!("No shows with {}.", slugs.join(", "));
                return Ok(());
            }
            println!("{} shows with {}", shows.len(), slugs.join(", "));
            println!();
            print_song_table(&index.matching_tracks(&slugs));
        }
    }

    Ok(())
}

/// Truncate long titles for table display.
fn clip(title: &str, width: usize) -> String {
    if title.chars().count() > width {
        let head: String = title.chars().take(width - 3).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Print a show header and its track table.
fn print_show(show: &Show) {
    println!("Show #{}: {}", show.show_id, show.datestr);
    println!("{}, {}", show.venue_name, show.location);
    println!();

    println!(
        "{:>3} {:>6} {:>5}  {:<40} {:>5} {:>6}",
        "Set", "Start", "Min", "Song", "Gap", "Days"
    );
    println!("{}", "-".repeat(72));

    for t in &show.tracks {
        println!(
            "{:>3} {:>6.1} {:>5.1}  {:<40} {:>5} {:>6}",
            t.set,
            t.start_time,
            t.duration,
            clip(&t.song_name, 40),
            t.shows_since_played,
            t.days_since_played,
        );
    }

    println!();
    println!("Gap = shows since last played  Days = days since last played");
}

/// Print every matching performance with its gap and the song's age.
fn print_song_table(tracks: &[&ShowTrack]) {
    let today = chrono::Local::now().date_naive();

    println!(
        "{:>10} {:>3} {:>6} {:>5} {:>6} {:>5}  {:<30}",
        "Date", "Set", "Start", "Gap", "Days", "Age", "Song"
    );
    println!("{}", "-".repeat(72));

    for t in tracks {
        let age = showgap::stats::song_age_years(&t.first_date_played, today)
            .map(|years| format!("{years:.1}"))
            .unwrap_or_default();
        println!(
            "{:>10} {:>3} {:>6.1} {:>5} {:>6} {:>5}  {:<30}",
            t.datestr,
            t.set,
            t.start_time,
            t.shows_since_played,
            t.days_since_played,
            age,
            clip(&t.song_name, 30),
        );
    }

    println!();
    println!("Gap = shows since last played  Days = days since last played");
    println!("Age = years since first played");
}

/// Print a table of bust-out tracks.
fn print_bust_out_table(tracks: &[&ShowTrack]) {
    println!(
        "{:<30} {:>10} {:>5} {:>6}  {:<10}",
        "Song", "Date", "Gap", "Days", "Last"
    );
    println!("{}", "-".repeat(68));

    for t in tracks {
        let last = showgap::stats::last_played(t).unwrap_or_default();

        println!(
            "{:<30} {:>10} {:>5} {:>6}  {:<10}",
            clip(&t.song_name, 30),
            t.datestr,
            t.shows_since_played,
            t.days_since_played,
            last,
        );
    }
}
