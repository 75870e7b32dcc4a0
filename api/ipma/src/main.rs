use ipma::{districts, IpmaAPI};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let command = env::args().nth(1).unwrap_or_else(|| "warnings".to_string());

    match command.as_str() {
        "warnings" => {
            println!("Fetching IPMA warnings...");
            let api = IpmaAPI::new()?;
            match api.fetch_warnings().await {
                Ok(warnings) => {
                    let json = serde_json::to_string_pretty(&warnings)?;
                    println!("{}", json);
                }
                Err(e) => {
                    eprintln!("Failed to fetch warnings: {}", e);
                }
            }
        }
        "districts" => {
            for d in districts() {
                println!("{}  {:<32} {:>7.2} {:>7.2}", d.code, d.name, d.lat, d.lon);
            }
        }
        other => {
            eprintln!("Unknown command: {} (use 'warnings' or 'districts')", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
