use clap::Parser;
use forecast_fusion::{
    Config, FetchCache, FetchedForecast, FieldKind, ForecastRequest, GeocodingClient, Location,
    OpenMeteoClient, Pipeline, SourceDescriptor,
};
use std::time::Duration;
use tracing::{error, info, warn};

/// Watch the 51-member ECMWF ensemble for one location.
#[derive(Debug, Parser)]
#[command(name = "ensemble_watch")]
struct Args {
    /// Place name to analyze (geocoded); defaults to the configured location
    #[arg(short, long)]
    location: Option<String>,

    /// Keep refreshing on the configured interval
    #[arg(short, long)]
    watch: bool,
}

/// ECMWF IFS 0.25 degree ensemble: control run plus 50 perturbed members.
/// The declared count of 51 is also the probability denominator.
fn ensemble_source() -> SourceDescriptor {
    SourceDescriptor::ensemble(
        "ecmwf_ifs025_ensemble",
        51,
        vec![
            FieldKind::Temperature,
            FieldKind::Humidity,
            FieldKind::WindSpeed,
            FieldKind::Precipitation,
            FieldKind::WeatherCode,
        ],
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::load().unwrap_or_default();
    forecast_fusion::utils::init_from_config(&config.logging);

    let args = Args::parse();

    info!("╔════════════════════════════════════════════════╗");
    info!("║   Forecast Fusion - ENSEMBLE WATCH (51 mem)    ║");
    info!("╚════════════════════════════════════════════════╝");

    let client = OpenMeteoClient::from_config(&config.fetch);
    let cache = FetchCache::from_config(&config.fetch);
    let pipeline = Pipeline::from_config(&config);

    let location = match &args.location {
        Some(name) => GeocodingClient::from_config(&config.fetch)
            .resolve(name)
            .await?,
        None => Location {
            name: config.general.location.clone(),
            latitude: config.general.latitude,
            longitude: config.general.longitude,
            timezone: Some(config.general.timezone.clone()),
        },
    };

    info!("✓ Analysis point: {}", location.name);

    let request = ForecastRequest {
        latitude: location.latitude,
        longitude: location.longitude,
        timezone: location
            .timezone
            .clone()
            .unwrap_or_else(|| config.general.timezone.clone()),
        forecast_days: config.fetch.forecast_days,
        sources: vec![ensemble_source()],
    };

    loop {
        match cache.get_or_fetch(&client, &request).await {
            Ok(snapshot) => report(&location, &snapshot, &pipeline),
            Err(e) => error!("✗ Ensemble fetch failed: {}", e),
        }

        if !args.watch {
            break;
        }
        tokio::time::sleep(Duration::from_secs(config.general.refresh_interval_secs)).await;
    }

    Ok(())
}

fn report(location: &Location, snapshot: &FetchedForecast, pipeline: &Pipeline) {
    let now = snapshot.local_now();
    let reports = pipeline.run(&snapshot.series, now);

    info!("");
    info!(
        "📍 {} | local time {} | {} buckets ahead",
        location.name,
        now.format("%d %b %Y %H:%M"),
        reports.len()
    );

    for report in &reports {
        info!(
            "📅 {} ({:02}-{:02}) | {}",
            report.bucket.label.to_uppercase(),
            report.bucket.start_hour,
            report.bucket.end_hour,
            report.bucket.date.format("%d %B %Y")
        );

        // Single-source run: the one summary is the ensemble's.
        if let Some(summary) = report.summaries.first() {
            info!(
                "   Dominant condition : {}",
                summary
                    .dominant_description()
                    .unwrap_or_else(|| "-".to_string())
            );
            if let Some(temp) = &summary.temperature {
                info!(
                    "   Temperature        : {:.1}°C (members span {:.1}-{:.1})",
                    temp.mean, temp.min, temp.max
                );
            }
            if let Some(prob) = summary.rain_probability_pct {
                info!("   💧 Rain probability : {:.0}%", prob);
            }
        }

        for spread in &report.consensus.spread {
            info!(
                "   🎯 Member spread    : {:.2}°C std dev ({} confidence)",
                spread.mean_std_dev,
                spread.tier.label()
            );
        }

        if report.alert.is_warning() {
            warn!(
                "   ⚠️  EARLY WARNING: worst member sees {} (est. {:.1} mm)",
                report.alert.worst_condition(),
                report.alert.peak_precipitation_mm()
            );
        } else {
            info!(
                "   ✅ STATUS: no extreme weather detected (worst case {:.1} mm)",
                report.alert.peak_precipitation_mm()
            );
        }
    }
}
