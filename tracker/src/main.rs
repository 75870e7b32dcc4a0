extern crate pretty_env_logger;
#[macro_use] extern crate log;

use std::future::Future;
use std::sync::Arc;

use ipma::{IpmaAPI, RawWarning};
use ptstorms::app::providers::{AlertSource, FrameSource};
use ptstorms::app::render;
use ptstorms::{Config, RadarController, WarningsProcessor};
use rainviewer::{RainViewerAPI, TileOptions, WeatherMaps};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Outcome of a background fetch, applied on the event loop
enum Fetched {
    Radar(anyhow::Result<WeatherMaps>),
    Warnings(anyhow::Result<Vec<RawWarning>>),
}

/// Run a fetch in the background and post its outcome to the event loop
fn spawn_fetch<F, T>(fetch: F, wrap: fn(anyhow::Result<T>) -> Fetched, tx: &mpsc::UnboundedSender<Fetched>)
where
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let fetched = fetch.await;
        // Receiver gone means we are shutting down.
        let _ = tx.send(wrap(fetched));
    });
}

fn spawn_radar_fetch(api: &Arc<RainViewerAPI>, tx: &mpsc::UnboundedSender<Fetched>) {
    let api = Arc::clone(api);
    spawn_fetch(async move { api.fetch_frame_data().await }, Fetched::Radar, tx);
}

fn spawn_warnings_fetch(api: &Arc<IpmaAPI>, tx: &mpsc::UnboundedSender<Fetched>) {
    let api = Arc::clone(api);
    spawn_fetch(async move { api.fetch_alerts().await }, Fetched::Warnings, tx);
}

fn show_radar(radar: &RadarController, tiles: &TileOptions) {
    info!("{}", render::radar_line(radar, tiles));
}

fn show_warnings(warnings: &WarningsProcessor) {
    for line in render::warnings_panel(warnings.snapshot()) {
        info!("{}", line);
    }
    for marker in warnings.markers() {
        if let Some((lat, lon)) = marker.location {
            info!("marker {} at {:.2},{:.2} ({})", marker.region, lat, lon, marker.severity.color());
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  r       refresh radar and warnings");
    println!("  p       play / pause radar animation");
    println!("  l       show / hide radar layer");
    println!("  w       show / hide warning markers");
    println!("  <n>     select radar frame n (0-based)");
    println!("  s       print radar status as JSON");
    println!("  legend  print the color legend");
    println!("  q       quit");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    info!("Starting PTStorms...");

    let config = Config::load()?;
    let tiles = config.rainviewer.tile_options();

    let radar_api = Arc::new(RainViewerAPI::with_url(&config.rainviewer.api_url)?);
    let ipma_api = Arc::new(IpmaAPI::with_url(&config.ipma.warnings_url)?);

    let mut radar = RadarController::new(config.intervals.animation());
    let mut warnings = WarningsProcessor::new();

    // Initial load, radar and warnings in parallel
    let (radar_fetched, warnings_fetched) = tokio::join!(radar_api.fetch_frame_data(), ipma_api.fetch_alerts());
    match radar.load_result(radar_fetched) {
        Ok(()) => info!("Radar initialized"),
        Err(e) => warn!("Radar initialization failed: {}", e),
    }
    warnings.ingest_result(warnings_fetched);
    show_radar(&radar, &tiles);
    show_warnings(&warnings);

    let (tx, mut rx) = mpsc::unbounded_channel::<Fetched>();

    let mut radar_refresh = interval_at(Instant::now() + config.intervals.radar(), config.intervals.radar());
    radar_refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut warnings_refresh = interval_at(Instant::now() + config.intervals.warnings(), config.intervals.warnings());
    warnings_refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    print_help();
    info!("PTStorms ready");

    loop {
        tokio::select! {
            _ = radar.timer_mut().tick() => {
                radar.tick();
                show_radar(&radar, &tiles);
            }
            _ = radar_refresh.tick() => {
                debug!("Radar refresh due");
                spawn_radar_fetch(&radar_api, &tx);
            }
            _ = warnings_refresh.tick() => {
                debug!("Warnings refresh due");
                spawn_warnings_fetch(&ipma_api, &tx);
            }
            Some(fetched) = rx.recv() => {
                match fetched {
                    Fetched::Radar(result) => {
                        if let Err(e) = radar.refresh(result) {
                            // Last good frames stay on screen.
                            warn!("Radar refresh failed: {}", e);
                        }
                        show_radar(&radar, &tiles);
                    }
                    Fetched::Warnings(result) => {
                        warnings.ingest_result(result);
                        show_warnings(&warnings);
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                let command = match line {
                    Ok(Some(command)) => command,
                    Ok(None) => {
                        info!("stdin closed, running without commands");
                        stdin_open = false;
                        continue;
                    }
                    Err(e) => {
                        error!("Failed to read command: {}", e);
                        stdin_open = false;
                        continue;
                    }
                };

                match command.trim().to_lowercase().as_str() {
                    "q" | "quit" => break,
                    "r" => {
                        spawn_radar_fetch(&radar_api, &tx);
                        spawn_warnings_fetch(&ipma_api, &tx);
                    }
                    "p" => {
                        radar.toggle_animation();
                        show_radar(&radar, &tiles);
                    }
                    "l" => {
                        radar.toggle_visibility();
                        show_radar(&radar, &tiles);
                    }
                    "w" => {
                        warnings.toggle_visibility();
                        show_warnings(&warnings);
                    }
                    "s" => match serde_json::to_string_pretty(&radar.status()) {
                        Ok(json) => println!("{}", json),
                        Err(e) => error!("Failed to encode status: {}", e),
                    },
                    "legend" => {
                        for line in render::legend_lines() {
                            println!("{}", line);
                        }
                    }
                    "" => {}
                    other if other.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
                        radar.select_frame(other);
                        show_radar(&radar, &tiles);
                    }
                    other => {
                        println!("Unknown command: {}", other);
                        print_help();
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    radar.pause();
    info!("PTStorms stopped");
    Ok(())
}
