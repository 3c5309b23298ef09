//! Nimbus command line: answer "what is the weather near (lat, lon)?"
//! through the geo-cached resolver.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use nimbus_core::{AppError, Config};
use nimbus_weather::{OpenWeatherMapClient, Point, WeatherReading, WeatherResolver};

/// Geospatially cached weather lookup
#[derive(Parser)]
#[command(name = "nimbus", about = "Geospatially cached weather lookup", allow_negative_numbers = true)]
struct Cli {
    /// Latitude of the query point, decimal degrees
    lat: f64,

    /// Longitude of the query point, decimal degrees
    lon: f64,

    /// Override the configured cache search radius, in kilometers
    #[arg(long)]
    radius_km: Option<f64>,

    /// Print the reading as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    nimbus_core::init()?;

    let cli = Cli::parse();

    let (config, _validation) = Config::load_validated()?;
    let api_key = config
        .upstream
        .effective_api_key()
        .context("No API key configured; set upstream.api_key or NIMBUS_API_KEY")?;

    let client = OpenWeatherMapClient::new(
        &config.upstream.api_url,
        api_key,
        Duration::from_secs(config.upstream.timeout_secs),
    )
    .context("Failed to build HTTP client")?;

    let radius_km = cli.radius_km.unwrap_or(config.cache.radius_km);
    let ttl = chrono::Duration::minutes(config.cache.ttl_minutes as i64);
    let resolver = WeatherResolver::new(client, radius_km, ttl);

    let point = Point::new(cli.lat, cli.lon);
    tracing::info!(%point, radius_km, "resolving weather");

    match resolver.resolve(point).await {
        Ok(reading) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reading)?);
            } else {
                print_reading(&reading);
            }
            Ok(())
        }
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!("{}", err);
            eprintln!("{}", err.user_message());
            std::process::exit(1);
        }
    }
}

fn print_reading(reading: &WeatherReading) {
    println!("Weather near ({}, {})", reading.latitude, reading.longitude);
    if !reading.condition_descriptions.is_empty() {
        println!("  Conditions:  {}", reading.condition_descriptions.join(", "));
    }
    println!("  Temperature: {:.1} °C", reading.temperature_c);
    println!("  Humidity:    {}%", reading.humidity_pct);
    println!("  Wind:        {:.1} m/s", reading.wind_speed_mps);
    println!("  Cloudiness:  {}%", reading.cloudiness_pct);
    println!("  Sunrise:     {}", reading.sunrise.format("%H:%M"));
    println!("  Sunset:      {}", reading.sunset.format("%H:%M"));
}
