//! `localgeo`: run the discovery engine against local JSON files.

mod files;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use localgeo_common::{Config, GeoPoint, GeoTag};
use localgeo_discovery::{
    shared_feed, DiscoveryService, EventAggregator, FeedQuery, TonightQuery,
};

use files::{JsonFileEventSource, JsonFilePinStore, JsonFilePlaceSource};

#[derive(Parser)]
#[command(name = "localgeo")]
#[command(about = "Proximity-aware discovery over local pins and events")]
#[command(version)]
struct Cli {
    /// JSON array of stored pins (overrides LOCALGEO_PINS_FILE)
    #[arg(long, global = true)]
    pins_file: Option<PathBuf>,

    /// JSON array of raw event payloads (overrides LOCALGEO_EVENTS_FILE)
    #[arg(long, global = true)]
    events_file: Option<PathBuf>,

    /// JSON array of place records (overrides LOCALGEO_PLACES_FILE)
    #[arg(long, global = true)]
    places_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shared pins near a point, newest first
    Pins {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Radius in miles; omit for no distance filter
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Page size (defaults to LOCALGEO_FEED_PAGE_SIZE)
        #[arg(long)]
        size: Option<usize>,
        /// Pin type filter, or "all"
        #[arg(long = "type", default_value = "all")]
        pin_type: String,
    },

    /// Events starting in the next few hours, ranked by time and distance
    Tonight {
        #[arg(long)]
        region: String,
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
        /// Mood filter, e.g. "chill", "loud", "date night"
        #[arg(long)]
        mood: Option<String>,
        /// Radius in miles (defaults to LOCALGEO_DEFAULT_RADIUS_MILES)
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Events, restaurants and attractions for a region
    Discover {
        #[arg(long)]
        region: String,
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
        /// Event day, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only one category: events, restaurants, attractions or an alias
        #[arg(long, conflicts_with = "search")]
        category: Option<String>,
        /// Keep only entries whose name or address contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// One event or place by source and id
    Item {
        /// "file" for the events file, "file-places" for the places file
        #[arg(long)]
        source: String,
        #[arg(long)]
        id: String,
    },

    /// Print the geo-tag for a point
    Tag {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("localgeo=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.log_summary();

    match cli.command {
        Commands::Pins {
            lat,
            lng,
            radius,
            page,
            size,
            pin_type,
        } => {
            let path = file_arg(cli.pins_file, &config.pins_file, "pins", "LOCALGEO_PINS_FILE")?;
            let store = JsonFilePinStore::new(path);
            let query = FeedQuery::builder()
                .center(GeoPoint::new(lat, lng)?)
                .radius_miles(radius)
                .page(page)
                .size(size.unwrap_or(config.feed_page_size))
                .pin_type(pin_type)
                .build();
            let pins = shared_feed(&store, &query).await?;
            info!(results = pins.len(), "Shared feed ready");
            print_json(&pins)
        }

        Commands::Tonight {
            region,
            lat,
            lng,
            mood,
            radius,
        } => {
            let service = discovery_service(&cli.events_file, &cli.places_file, &config)?;
            let query = TonightQuery::builder()
                .region(region)
                .viewer(viewer(lat, lng)?)
                .mood(mood)
                .radius_miles(radius)
                .build();
            print_json(&service.tonight(&query).await)
        }

        Commands::Discover {
            region,
            lat,
            lng,
            date,
            category,
            search,
        } => {
            let service = discovery_service(&cli.events_file, &cli.places_file, &config)?;
            let viewer = viewer(lat, lng)?;
            let bundle = match (category, search) {
                (Some(category), _) => {
                    service
                        .fetch_by_category(&category, &region, viewer.as_ref(), date)
                        .await
                }
                (None, Some(search)) => service.search_all(&search, &region, viewer.as_ref()).await,
                (None, None) => service.fetch_all(&region, viewer.as_ref(), date).await,
            };
            print_json(&bundle)
        }

        Commands::Item { source, id } => {
            let service = discovery_service(&cli.events_file, &cli.places_file, &config)?;
            match service.item_by_id(&source, &id).await {
                Some(item) => print_json(&item),
                None => bail!("No item {id} from source {source}"),
            }
        }

        Commands::Tag { lat, lng } => {
            let point = GeoPoint::new(lat, lng)?;
            let tag = GeoTag::of(&point)?;
            print_json(&json!({
                "latitude": point.lat(),
                "longitude": point.lng(),
                "geoTag": tag,
            }))
        }
    }
}

fn discovery_service(
    events_file: &Option<PathBuf>,
    places_file: &Option<PathBuf>,
    config: &Config,
) -> Result<DiscoveryService> {
    let events_path = file_arg(
        events_file.clone(),
        &config.events_file,
        "events",
        "LOCALGEO_EVENTS_FILE",
    )?;
    let places_path = places_file
        .clone()
        .or_else(|| config.places_file.as_ref().map(PathBuf::from));

    let events = EventAggregator::new(Arc::new(JsonFileEventSource::new(events_path)));
    let places = Arc::new(JsonFilePlaceSource::new(places_path));
    Ok(DiscoveryService::new(events, places, config.clone()))
}

/// The command-line path if given, else the configured one.
fn file_arg(
    flag: Option<PathBuf>,
    configured: &Option<String>,
    what: &str,
    env_key: &str,
) -> Result<PathBuf> {
    match flag.or_else(|| configured.as_ref().map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => bail!("No {what} file: pass --{what}-file or set {env_key}"),
    }
}

fn viewer(lat: Option<f64>, lng: Option<f64>) -> Result<Option<GeoPoint>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng)?)),
        (None, None) => Ok(None),
        _ => bail!("--lat and --lng must be given together"),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
