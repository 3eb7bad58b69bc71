//! Command line client for a running Trivsel gateway.
//!
//! Prints gateway responses as pretty JSON.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use trivsel_core::BoundingBox;
use trivsel_sdk::{GridRequest, TrivselClient};

/// Query the Trivsel environmental data gateway
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Gateway URL
    #[arg(long, env = "TRIVSEL_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Liveness check
    Health,
    /// List upstream data sources and attributions
    Sources,
    /// Data for one coordinate
    Point {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Which layer to fetch
        #[arg(long, value_enum, default_value_t = Layer::Summary)]
        layer: Layer,
    },
    /// Sample a box as a grid of points
    Grid {
        #[arg(long)]
        min_lat: f64,
        #[arg(long)]
        max_lat: f64,
        #[arg(long)]
        min_lon: f64,
        #[arg(long)]
        max_lon: f64,
        /// Number of samples (gateway clamps to 1..=40)
        #[arg(long)]
        points: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Layer {
    Summary,
    Climate,
    Pollution,
    Elevation,
    Energy,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = TrivselClient::new(&args.url);

    match args.command {
        Command::Health => print_json(&client.health().await?),
        Command::Sources => print_json(&client.sources().await?),
        Command::Point { lat, lon, layer } => match layer {
            Layer::Summary => print_json(&client.summary(lat, lon).await?),
            Layer::Climate => print_json(&client.climate(lat, lon).await?),
            Layer::Pollution => print_json(&client.pollution(lat, lon).await?),
            Layer::Elevation => print_json(&client.elevation(lat, lon).await?),
            Layer::Energy => print_json(&client.energy(lat, lon).await?),
        },
        Command::Grid {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            points,
        } => {
            let request = GridRequest {
                bounds: BoundingBox {
                    min_lat,
                    max_lat,
                    min_lon,
                    max_lon,
                },
                points,
            };
            let grid = client.grid(request).await?;
            eprintln!("{} points", grid.len());
            print_json(&grid)
        }
    }
}
