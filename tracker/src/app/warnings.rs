use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ipma::RawWarning;
use serde::Serialize;
use std::fmt;

use crate::app::error::TrackerError;
use crate::app::providers::{IpmaDistricts, RegionDirectory};

/// IPMA awareness level, ordered from least to most severe
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Orange,
    Red,
}

impl Severity {
    /// Map a source level tag. Tags are case-sensitive; anything unknown is Yellow.
    pub fn from_level(level: Option<&str>) -> Self {
        match level {
            Some("green") => Severity::Green,
            Some("yellow") => Severity::Yellow,
            Some("orange") => Severity::Orange,
            Some("red") => Severity::Red,
            _ => Severity::Yellow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Green => "green",
            Severity::Yellow => "yellow",
            Severity::Orange => "orange",
            Severity::Red => "red",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Green => "#48bb78",
            Severity::Yellow => "#ecc94b",
            Severity::Orange => "#ed8936",
            Severity::Red => "#f56565",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Green => "Verde - Normal",
            Severity::Yellow => "Amarelo - Atenção",
            Severity::Orange => "Laranja - Moderado",
            Severity::Red => "Vermelho - Extremo",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-ready weather warning
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub category: String,
    pub severity: Severity,
    pub region: String,
    /// (latitude, longitude)
    pub location: Option<(f64, f64)>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    /// Untrusted source text. Plain data, never markup.
    pub description: String,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AlertCounts {
    pub total: usize,
    pub red: usize,
    pub orange: usize,
    pub yellow: usize,
}

impl AlertCounts {
    fn tally(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut counts, alert| {
            counts.total += 1;
            match alert.severity {
                Severity::Red => counts.red += 1,
                Severity::Orange => counts.orange += 1,
                Severity::Yellow => counts.yellow += 1,
                Severity::Green => {}
            }
            counts
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AlertSnapshot {
    pub alerts: Vec<Alert>,
    pub counts: AlertCounts,
}

/// Parse a feed instant. IPMA publishes local wall-clock times without an
/// offset; those are read in the host time zone.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    // Date-only strings are midnight UTC.
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Turns raw warning records into a filtered, severity-sorted snapshot
pub struct WarningsProcessor<D: RegionDirectory = IpmaDistricts> {
    snapshot: AlertSnapshot,
    directory: D,
    visible: bool,
    clock: fn() -> DateTime<Utc>,
}

impl Default for WarningsProcessor<IpmaDistricts> {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningsProcessor<IpmaDistricts> {
    pub fn new() -> Self {
        Self::with_directory(IpmaDistricts)
    }
}

impl<D: RegionDirectory> WarningsProcessor<D> {
    pub fn with_directory(directory: D) -> Self {
        Self {
            snapshot: AlertSnapshot::default(),
            directory,
            visible: false,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Recompute the snapshot from a fresh batch. `None` stands for "no data
    /// this cycle" and yields an empty snapshot.
    pub fn ingest(&mut self, records: Option<&[RawWarning]>) -> &AlertSnapshot {
        let now = (self.clock)();
        let records = records.unwrap_or_default();

        let mut alerts: Vec<Alert> = records
            .iter()
            .filter_map(|raw| match self.to_alert(raw, now) {
                Ok(alert) => alert,
                Err(e) => {
                    debug!("warnings: dropping record: {}", e);
                    None
                }
            })
            .collect();
        // Stable: equal severities keep feed order.
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));

        let counts = AlertCounts::tally(&alerts);
        info!(
            "warnings: {} active of {} records (red {}, orange {}, yellow {})",
            counts.total,
            records.len(),
            counts.red,
            counts.orange,
            counts.yellow
        );
        self.snapshot = AlertSnapshot { alerts, counts };
        &self.snapshot
    }

    /// Ingest the outcome of a fetch; failures count as an empty update.
    pub fn ingest_result(&mut self, fetched: anyhow::Result<Vec<RawWarning>>) -> &AlertSnapshot {
        match fetched {
            Ok(records) => self.ingest(Some(&records)),
            Err(e) => {
                error!("warnings: fetch failed, showing no warnings: {:#}", e);
                self.ingest(None)
            }
        }
    }

    pub fn snapshot(&self) -> &AlertSnapshot {
        &self.snapshot
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.snapshot.alerts
    }

    pub fn counts(&self) -> AlertCounts {
        self.snapshot.counts
    }

    pub fn toggle_visibility(&mut self) -> bool {
        self.visible = !self.visible;
        info!("warnings: markers {}", if self.visible { "shown" } else { "hidden" });
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Alerts to pin on the map: located ones, and only while shown
    pub fn markers(&self) -> Vec<&Alert> {
        if !self.visible {
            return Vec::new();
        }
        self.snapshot
            .alerts
            .iter()
            .filter(|a| a.location.is_some())
            .collect()
    }

    /// `Ok(None)` for records that are valid but not worth showing.
    fn to_alert(&self, raw: &RawWarning, now: DateTime<Utc>) -> Result<Option<Alert>, TrackerError> {
        let id = raw.id_area_aviso.clone().unwrap_or_default();
        let severity = Severity::from_level(raw.awareness_level_id.as_deref());

        let valid_until = raw
            .end_time
            .as_deref()
            .and_then(parse_instant)
            .ok_or_else(|| TrackerError::MalformedRecord {
                id: id.clone(),
                reason: format!("unreadable end time {:?}", raw.end_time),
            })?;

        if severity == Severity::Green || valid_until <= now {
            return Ok(None);
        }

        let valid_from = match raw.start_time.as_deref().and_then(parse_instant) {
            Some(start) => start,
            None => {
                debug!("warnings: record {} has unreadable start time {:?}, using now", id, raw.start_time);
                now
            }
        };

        let (region, location) = match self.directory.region_of(&id) {
            Some(info) => (info.name, Some(info.coordinate)),
            None => (id.clone(), None),
        };

        Ok(Some(Alert {
            id,
            category: raw.awareness_type_name.clone().unwrap_or_default(),
            severity,
            region,
            location,
            valid_from,
            valid_until,
            description: raw.text.clone().unwrap_or_default(),
        }))
    }
}
