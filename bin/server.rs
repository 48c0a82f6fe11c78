// Movie Ratings - Web Server
// Loads movies.csv and ratings.csv, adjusts runtimes, serves /api/v1

use anyhow::{Context, Result};
use clap::Parser;
use movie_ratings_api::{serve, MovieStore, ServerConfig, VERSION};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "movie-ratings-server", version, about = "Movie ratings HTTP API")]
struct Args {
    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,

    /// Movies CSV file
    #[arg(long)]
    movies: Option<PathBuf>,

    /// Ratings CSV file
    #[arg(long)]
    ratings: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            movies_path: self.movies.unwrap_or(defaults.movies_path),
            ratings_path: self.ratings.unwrap_or(defaults.ratings_path),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    info!(version = VERSION, "Movie Ratings API starting");

    // Nothing is served unless both datasets load
    let store = MovieStore::bootstrap(&config.movies_path, &config.ratings_path)
        .context("Failed to load datasets")?;
    let store = Arc::new(store);

    serve(&config, Arc::clone(&store)).await?;

    match Arc::try_unwrap(store) {
        Ok(store) => {
            store.close()?;
            info!("Store closed");
        }
        // A connection task still holds a handle; the store closes when it drops
        Err(_) => warn!("Store still referenced after shutdown"),
    }

    Ok(())
}
