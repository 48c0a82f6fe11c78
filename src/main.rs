use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use movie_ratings_api::{MovieStore, Row, MOVIES, RATINGS, RUNTIME_RULES};
use movie_ratings_api::transform::DEFAULT_RUNTIME_MINUTES;

/// Load the datasets the way the server does and report on them
#[derive(Parser, Debug)]
#[command(name = "movie-ratings", version)]
struct Args {
    /// Movies CSV file
    #[arg(long, default_value = MOVIES.source_file)]
    movies: PathBuf,

    /// Ratings CSV file
    #[arg(long, default_value = RATINGS.source_file)]
    ratings: PathBuf,

    /// Print one canned query as JSON instead of the summary
    #[arg(long, value_enum)]
    query: Option<Query>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Query {
    LongestDurationMovies,
    TopRatedMovies,
    GenreMoviesWithSubtotals,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    match args.query {
        Some(query) => run_query(&args, query),
        None => run_check(&args),
    }
}

fn run_query(args: &Args, query: Query) -> Result<()> {
    let store = MovieStore::bootstrap(&args.movies, &args.ratings)?;

    let rows = match query {
        Query::LongestDurationMovies => store.longest_duration_movies()?,
        Query::TopRatedMovies => store.top_rated_movies()?,
        Query::GenreMoviesWithSubtotals => store.genre_movies_with_subtotals()?,
    };
    println!("{}", serde_json::to_string_pretty(&rows)?);

    store.close()
}

fn run_check(args: &Args) -> Result<()> {
    println!("🎬 Movie Ratings - Dataset Check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = MovieStore::open_in_memory()?;

    // 1. Load CSVs
    println!("\n📂 Loading datasets...");
    let movies = store.load_dataset(&MOVIES, &args.movies)?;
    println!("✓ Loaded {} movies from {}", movies, args.movies.display());
    let ratings = store.load_dataset(&RATINGS, &args.ratings)?;
    println!("✓ Loaded {} ratings from {}", ratings, args.ratings.display());

    // 2. Runtime adjustment
    println!("\n🔧 Applying runtime adjustment...");
    for rule in RUNTIME_RULES {
        println!("   genres ~ {:<12} +{} min", rule.genre, rule.minutes);
    }
    println!("   otherwise            +{} min", DEFAULT_RUNTIME_MINUTES);
    let adjusted = store.apply_runtime_adjustment()?;
    println!("✓ Adjusted {} movies", adjusted);

    // 3. Verify counts
    println!("\n🔍 Verifying store...");
    let movie_count = store.count(&MOVIES)?;
    let rating_count = store.count(&RATINGS)?;
    println!("✓ movies:  {} rows", movie_count);
    println!("✓ ratings: {} rows", rating_count);

    // 4. Preview
    println!("\n⏱️  Longest movies:");
    for row in store.longest_duration_movies()? {
        println!("   {}", describe(&row));
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if movie_count == movies as i64 && rating_count == ratings as i64 {
        println!("✅ Datasets ready to serve");
    } else {
        println!("⚠️  Row counts differ from the files");
    }

    store.close()
}

fn describe(row: &Row) -> String {
    let field = |key: &str| {
        row.get(key)
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
            .unwrap_or_default()
    };

    format!(
        "{} {} ({} min) [{}]",
        field("tconst"),
        field("primaryTitle"),
        field("runtimeMinutes"),
        field("genres")
    )
}
