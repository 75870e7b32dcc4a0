use chrono::{DateTime, Local, Utc};
use rainviewer::TileOptions;

use crate::app::legend;
use crate::app::radar::RadarController;
use crate::app::timer::FrameTimer;
use crate::app::warnings::{Alert, AlertSnapshot};

/// Keep untrusted feed text from driving the terminal
pub fn plain_text(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

fn short_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%d/%m %H:%M").to_string()
}

/// One-line summary of what the radar layer should show
pub fn radar_line<T: FrameTimer>(radar: &RadarController<T>, tiles: &TileOptions) -> String {
    let position = format!("{}/{}", radar.active_index() + 1, radar.frames().len());
    let state = if radar.is_animating() { "playing" } else { "paused" };

    match radar.displayed_frame() {
        Some(frame) => format!(
            "radar [{}] {} {} {}",
            state,
            position,
            radar.label().map(|l| l.to_string()).unwrap_or_default(),
            tiles.tile_template(&frame.path)
        ),
        None if !radar.is_visible() => format!("radar [{}] hidden", state),
        None => "radar no frames".to_string(),
    }
}

pub fn alert_line(alert: &Alert) -> String {
    let mut line = format!(
        "[{}] {} - {} ({} to {})",
        alert.severity.as_str().to_uppercase(),
        plain_text(&alert.category),
        plain_text(&alert.region),
        short_time(alert.valid_from),
        short_time(alert.valid_until)
    );
    if !alert.description.is_empty() {
        line.push_str(": ");
        line.push_str(&plain_text(&alert.description));
    }
    line
}

/// Warnings panel: count header followed by one line per alert
pub fn warnings_panel(snapshot: &AlertSnapshot) -> Vec<String> {
    let counts = snapshot.counts;
    if counts.total == 0 {
        return vec!["Sem avisos ativos".to_string()];
    }

    let mut lines = vec![format!(
        "{} avisos (vermelho {}, laranja {}, amarelo {})",
        counts.total, counts.red, counts.orange, counts.yellow
    )];
    lines.extend(snapshot.alerts.iter().map(alert_line));
    lines
}

pub fn legend_lines() -> Vec<String> {
    let mut lines: Vec<String> = legend::legend_entries()
        .map(|band| format!("{} {:>3}-{:<3} dBZ {}", band.color.unwrap_or("-"), band.min, band.max, band.label))
        .collect();
    lines.extend(
        legend::warning_levels()
            .iter()
            .map(|level| format!("{} {}", level.color(), level.label())),
    );
    lines
}
