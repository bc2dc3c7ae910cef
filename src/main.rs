use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use decatur_drill::config::DrillConfig;
use decatur_drill::drill::Drill;
use decatur_drill::geo::Coord;
use decatur_drill::geocode::AnyGeocoder;
use decatur_drill::route::{RouteProvider, compare_paths};
use decatur_drill::svg::render_areas;

#[derive(Parser)]
#[clap(name = "decatur-drill", version, about = "Learn the streets of Decatur, IL one random address at a time")]
struct Cli {
    /// JSON configuration file, Decatur defaults when missing
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible rounds
    #[clap(long, global = true)]
    seed: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the stations
    Stations {
        /// Geocode stations without a coordinate first
        #[clap(long)]
        resolve: bool,
    },
    /// Partition the city between the stations
    Areas {
        /// Write the areas as SVG to this file
        #[clap(long)]
        svg: Option<PathBuf>,
        /// Print the areas as JSON
        #[clap(long)]
        json: bool,
    },
    /// Play rounds: find the address, answer with "lat,lng"
    Drill {
        /// Only pick addresses in this station's area
        #[clap(long)]
        station: Option<String>,
        #[clap(long, default_value_t = 1)]
        rounds: usize,
    },
    /// Compare a traced path with the driving route between its ends
    Route {
        from: Coord,
        to: Coord,
        /// Intermediate points of the traced path
        #[clap(long)]
        via: Vec<Coord>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DrillConfig::from_file(path)?,
        None => DrillConfig::default(),
    };
    let config = config.env().context("config: check the DRILL_* environment variables")?;
    config.log();

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Command::Stations { resolve } => stations(new_drill(config, rng)?, resolve).await,
        Command::Areas { svg, json } => areas(new_drill(config, rng)?, svg, json).await,
        Command::Drill { station, rounds } => play(new_drill(config, rng)?, station, rounds).await,
        Command::Route { from, to, via } => route(&config, from, to, via).await,
    }
}

type CliDrill = Drill<AnyGeocoder, StdRng>;

fn new_drill(config: DrillConfig, rng: StdRng) -> anyhow::Result<CliDrill> {
    let geocoder = config.geocoder.build()?;
    Ok(Drill::new(config, geocoder, rng))
}

async fn stations(mut drill: CliDrill, resolve: bool) -> anyhow::Result<()> {
    if resolve {
        let resolved = drill.resolve_stations().await;
        log::info!("Resolved {resolved} station(s)");
    }

    for station in drill.stations().iter() {
        let coord = station.coord.map_or("unresolved".to_string(), |c| c.to_string());
        println!("{:>3}  {:<26} {:<24} {}  {}", station.id, station.name, coord, station.color, station.address);
    }

    Ok(())
}

async fn areas(mut drill: CliDrill, svg: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    drill.resolve_stations().await;
    let areas = drill
        .areas()
        .ok_or_else(|| anyhow!("not enough resolved stations to partition the city"))?;

    if let Some(path) = svg {
        std::fs::write(&path, render_areas(areas, drill.stations()))
            .with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }

    if json {
        let value: Vec<serde_json::Value> = areas
            .iter()
            .map(|area| {
                let rings: Vec<Vec<[f64; 2]>> = area
                    .polygon()
                    .rings()
                    .iter()
                    .map(|ring| ring.iter().map(|p| [p.x, p.y]).collect())
                    .collect();
                serde_json::json!({
                    "station_id": area.station_id(),
                    "clipped": area.is_clipped(),
                    "rings": rings,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for area in areas.iter() {
            let bbox = area.bounding_box();
            println!(
                "{:>3}  {} vertices  lat {:.4}..{:.4}  lng {:.4}..{:.4}{}",
                area.station_id(),
                area.polygon().exterior().len(),
                bbox.bottom(),
                bbox.top(),
                bbox.left(),
                bbox.right(),
                if area.is_clipped() { "" } else { "  (unclipped)" }
            );
        }
    }

    Ok(())
}

async fn play(mut drill: CliDrill, station: Option<String>, rounds: usize) -> anyhow::Result<()> {
    drill.resolve_stations().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    for round in 1..=rounds {
        let target = match drill.new_round(station.as_deref()).await {
            Ok(target) => target.clone(),
            Err(e) => {
                println!("Round {round}: {e}");
                continue;
            }
        };

        println!("Round {round}: find {}", target.label);
        loop {
            stdout.write_all(b"guess (lat,lng) or 'skip': ").await?;
            stdout.flush().await?;

            let line = match lines.next_line().await? {
                Some(line) => line,
                None => return Ok(()),
            };

            if line.trim() == "skip" {
                drill.abandon();
                println!("Skipped. It was at {}.", target.coord);
                break;
            }

            match line.parse::<Coord>() {
                Ok(guess) => {
                    if let Some(result) = drill.guess(guess) {
                        println!("{} The address is at {}.", result.message(), target.coord);
                    }
                    break;
                }
                Err(e) => println!("{e}"),
            }
        }
    }

    Ok(())
}

async fn route(config: &DrillConfig, from: Coord, to: Coord, via: Vec<Coord>) -> anyhow::Result<()> {
    let provider = config.route_provider()?;
    let route = provider.route(from, to).await?;

    let traced: Vec<Coord> = std::iter::once(from).chain(via).chain(std::iter::once(to)).collect();
    let comparison = compare_paths(&traced, &route);

    println!("{}", comparison.message());
    println!("Driving time: {:.0} s", route.duration_s);

    Ok(())
}
