use clap::Parser;
use forecast_fusion::{
    Config, FetchCache, FetchedForecast, FieldKind, ForecastRequest, GeocodingClient, Location,
    OpenMeteoClient, Pipeline, SourceDescriptor,
};
use futures_util::future::join_all;
use std::time::Duration;
use tracing::{error, info, warn};

/// Compare global forecast models per day-part window.
#[derive(Debug, Parser)]
#[command(name = "multi_model")]
struct Args {
    /// Place names to analyze (geocoded); defaults to the configured location
    #[arg(short, long)]
    location: Vec<String>,

    /// Analyze every favorite location from the configuration
    #[arg(short, long)]
    favorites: bool,

    /// Keep refreshing on the configured interval
    #[arg(short, long)]
    watch: bool,
}

/// The global models compared against each other, with their origin labels.
const MODEL_ROSTER: &[(&str, &str)] = &[
    ("ecmwf_ifs", "Europe"),
    ("gfs_seamless", "USA"),
    ("jma_seamless", "Japan"),
    ("icon_seamless", "Germany"),
    ("gem_seamless", "Canada"),
    ("meteofrance_seamless", "France"),
    ("ukmo_seamless", "UK"),
];

fn roster_sources() -> Vec<SourceDescriptor> {
    MODEL_ROSTER
        .iter()
        .map(|(id, _)| SourceDescriptor::deterministic(*id, FieldKind::ALL.to_vec()))
        .collect()
}

fn origin_of(model_id: &str) -> &'static str {
    MODEL_ROSTER
        .iter()
        .find(|(id, _)| *id == model_id)
        .map(|(_, origin)| *origin)
        .unwrap_or("-")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Configuration falls back to defaults when no file is present
    let config = Config::load().unwrap_or_default();
    forecast_fusion::utils::init_from_config(&config.logging);

    let args = Args::parse();

    info!("╔════════════════════════════════════════════════╗");
    info!("║   Forecast Fusion - MULTI-MODEL COMPARISON     ║");
    info!("╚════════════════════════════════════════════════╝");

    let geocoder = GeocodingClient::from_config(&config.fetch);
    let client = OpenMeteoClient::from_config(&config.fetch);
    let cache = FetchCache::from_config(&config.fetch);
    let pipeline = Pipeline::from_config(&config);

    // Resolve requested locations up front; unresolvable names are skipped.
    let mut locations: Vec<Location> = Vec::new();
    for name in &args.location {
        match geocoder.resolve(name).await {
            Ok(location) => locations.push(location),
            Err(e) => warn!("✗ Could not resolve '{}': {}", name, e),
        }
    }
    if args.favorites {
        locations.extend(config.general.favorites.iter().map(|fav| Location {
            name: fav.name.clone(),
            latitude: fav.latitude,
            longitude: fav.longitude,
            timezone: Some(fav.timezone.clone()),
        }));
    }
    if locations.is_empty() {
        if !args.location.is_empty() {
            anyhow::bail!("none of the requested locations could be resolved");
        }
        locations.push(Location {
            name: config.general.location.clone(),
            latitude: config.general.latitude,
            longitude: config.general.longitude,
            timezone: Some(config.general.timezone.clone()),
        });
    }

    info!("✓ Analyzing {} location(s)", locations.len());

    loop {
        // Fetch every location concurrently; the cache absorbs refetches
        // inside its TTL.
        let fetches = locations.iter().map(|location| {
            let request = ForecastRequest {
                latitude: location.latitude,
                longitude: location.longitude,
                timezone: location
                    .timezone
                    .clone()
                    .unwrap_or_else(|| config.general.timezone.clone()),
                forecast_days: config.fetch.forecast_days,
                sources: roster_sources(),
            };
            let client = &client;
            let cache = &cache;
            async move { (location, cache.get_or_fetch(client, &request).await) }
        });

        for (location, result) in join_all(fetches).await {
            match result {
                Ok(snapshot) => report_location(location, &snapshot, &pipeline),
                Err(e) => error!("✗ Fetch failed for {}: {}", location.name, e),
            }
        }

        if !args.watch {
            break;
        }
        tokio::time::sleep(Duration::from_secs(config.general.refresh_interval_secs)).await;
    }

    Ok(())
}

fn report_location(location: &Location, snapshot: &FetchedForecast, pipeline: &Pipeline) {
    let now = snapshot.local_now();
    let reports = pipeline.run(&snapshot.series, now);

    info!("");
    info!(
        "📍 {} ({:.4}, {:.4}) | local time {}",
        location.name,
        snapshot.latitude,
        snapshot.longitude,
        now.format("%d %b %Y %H:%M")
    );

    for report in &reports {
        info!(
            "📅 {} ({:02}-{:02}) | {}",
            report.bucket.label.to_uppercase(),
            report.bucket.start_hour,
            report.bucket.end_hour,
            report.bucket.date.format("%d %B %Y")
        );

        for summary in &report.summaries {
            let model = summary
                .source_id
                .split('_')
                .next()
                .unwrap_or(&summary.source_id)
                .to_uppercase();
            info!(
                "   {:<12} {:<8} {:<22} T {:>9}°C  RH {:>7}%  rain {:>4}  {:>5} mm  wind {}",
                model,
                origin_of(&summary.source_id),
                summary
                    .dominant_description()
                    .unwrap_or_else(|| "-".to_string()),
                fmt_range(summary.temperature.as_ref()),
                fmt_range(summary.humidity.as_ref()),
                fmt_pct(summary.rain_probability_pct),
                fmt_mm(summary.precipitation_mm),
                fmt_wind(summary),
            );
        }

        if let Some(agreement) = &report.consensus.agreement {
            info!(
                "   🎯 Consensus: {} ({:.0}% of {} models, {} confidence)",
                agreement.dominant.label(),
                agreement.agreement_pct,
                agreement.valid_sources,
                agreement.tier.label()
            );
        }

        if report.alert.is_warning() {
            warn!(
                "   ⚠️  WORST-CASE SCENARIO: {} (est. {:.1} mm)",
                report.alert.worst_condition(),
                report.alert.peak_precipitation_mm()
            );
        } else {
            info!(
                "   ✅ No extreme weather expected (worst case {:.1} mm)",
                report.alert.peak_precipitation_mm()
            );
        }
    }
}

fn fmt_range(range: Option<&forecast_fusion::FieldRange>) -> String {
    match range {
        Some(r) => format!("{:.1}-{:.1}", r.min, r.max),
        None => "-".to_string(),
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}%", v),
        None => "-".to_string(),
    }
}

fn fmt_mm(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

fn fmt_wind(summary: &forecast_fusion::SourceSummary) -> String {
    match (summary.wind_speed.as_ref(), summary.wind_octant) {
        (Some(speed), Some(octant)) => format!("{:.1} km/h {}", speed.mean, octant),
        (Some(speed), None) => format!("{:.1} km/h", speed.mean),
        _ => "-".to_string(),
    }
}
