use std::time::Duration;

use clap::Parser;
use snow_depth_service::api::select_stations;
use snow_depth_service::config::{
    clamp_timeout_secs, clamp_workers, parse_stations, utc_offset_from_hours, DEFAULT_KMA_SNOW_URL,
    DEFAULT_STATIONS,
};
use snow_depth_service::fetcher::KmaSnowFetcher;
use snow_depth_service::models::parse_query_date;
use snow_depth_service::services::SnowService;

#[derive(Parser)]
#[command(name = "snow-query")]
#[command(about = "Query hourly snow readings for one day and print them", long_about = None)]
struct Cli {
    /// Date to query (YYYYMMDD), defaults to today
    #[arg(long)]
    date: Option<String>,

    /// Station code, or "all"
    #[arg(long, default_value = "all")]
    station: String,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// KMA API hub credential
    #[arg(long, env = "KMA_AUTH_KEY")]
    auth_key: String,

    #[arg(long, env = "KMA_SNOW_URL", default_value = DEFAULT_KMA_SNOW_URL)]
    url: String,

    #[arg(long, env = "STATIONS", default_value = DEFAULT_STATIONS)]
    stations: String,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 5)]
    timeout_secs: u64,

    #[arg(long, env = "FETCH_WORKERS", default_value_t = 10)]
    workers: usize,

    #[arg(long, env = "UTC_OFFSET_HOURS", default_value_t = 9, allow_hyphen_values = true)]
    utc_offset_hours: i32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let all_stations = parse_stations(&cli.stations)?;
    let stations = select_stations(&all_stations, Some(cli.station.as_str()))?;
    let utc_offset = utc_offset_from_hours(cli.utc_offset_hours)
        .ok_or_else(|| format!("Invalid UTC offset: {}", cli.utc_offset_hours))?;

    let fetcher = KmaSnowFetcher::new(
        cli.url.clone(),
        cli.auth_key.clone(),
        Duration::from_secs(clamp_timeout_secs(cli.timeout_secs)),
    )?;
    let service = SnowService::new(fetcher, clamp_workers(cli.workers), utc_offset);

    let date = match cli.date.as_deref() {
        Some(raw) => parse_query_date(raw)
            .ok_or_else(|| format!("Invalid date '{raw}', expected YYYYMMDD"))?,
        None => service.today(),
    };

    println!(
        "Querying {} for {} station(s)...\n",
        date.format("%Y-%m-%d"),
        stations.len()
    );

    let Some(rows) = service.aggregate(date, &stations).await else {
        println!("No snow data for {}", date.format("%Y-%m-%d"));
        return Ok(());
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<6} {:<12} {:>10} {:>10}", "Hour", "Station", "Total(cm)", "New(cm)");
    println!("{}", "-".repeat(41));
    for row in &rows {
        println!(
            "{:<6} {:<12} {:>10} {:>10}",
            format!("{}:00", row.hour),
            row.name,
            row.tot.as_str(),
            row.day.as_str()
        );
    }
    println!("\n{} rows", rows.len());

    Ok(())
}
