use chrono::{TimeZone, Utc};
use rainviewer::{RainViewerAPI, TileOptions};
use std::env;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <command> [args...]", args[0]);
        eprintln!("Commands:");
        eprintln!("  frames - List past and nowcast radar frames");
        eprintln!("  tile <z> <x> <y> - Fetch the latest past frame tile");
        eprintln!("");
        eprintln!("Examples:");
        eprintln!("  {} frames", args[0]);
        eprintln!("  {} tile 7 60 48", args[0]);
        std::process::exit(1);
    }

    let command = &args[1];

    let api = RainViewerAPI::new()?;
    let options = TileOptions::default();

    match command.as_str() {
        "frames" => {
            let maps = api.fetch_weather_maps().await?;
            if let Some(generated) = maps.generated.and_then(|g| Utc.timestamp_opt(g, 0).single()) {
                println!("Generated: {}", generated.to_rfc3339());
            }
            for (kind, frames) in [("past", &maps.radar.past), ("nowcast", &maps.radar.nowcast)] {
                println!("{} ({} frames):", kind, frames.len());
                for frame in frames {
                    let time = Utc
                        .timestamp_opt(frame.time, 0)
                        .single()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| frame.time.to_string());
                    println!("  {}  {}", time, options.tile_template(&frame.path));
                }
            }
        }

        "tile" => {
            if args.len() < 5 {
                eprintln!("Not enough arguments for tile command");
                std::process::exit(1);
            }

            let z: u32 = args[2].parse()?;
            let x: u32 = args[3].parse()?;
            let y: u32 = args[4].parse()?;

            let maps = api.fetch_weather_maps().await?;
            let Some(frame) = maps.radar.past.last() else {
                eprintln!("No past radar frames available");
                std::process::exit(1);
            };

            let data = api.fetch_tile(&options, &frame.path, z, x, y).await?;

            let filename = format!("radar_{}_{}_{}_{}.png", frame.time, z, x, y);
            std::fs::write(&filename, &data)?;
            println!("Tile saved to: {}", filename);
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }

    Ok(())
}
