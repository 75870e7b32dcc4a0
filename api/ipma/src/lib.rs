#[macro_use] extern crate log;

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_WARNINGS_URL: &str = "https://api.ipma.pt/open-data/forecast/warnings/warnings_www.json";

/// One entry of `warnings_www.json` as published by IPMA
///
/// Every field is optional: the feed is not validated upstream and a record
/// with missing pieces is still worth keeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWarning {
    #[serde(rename = "idAreaAviso", default)]
    pub id_area_aviso: Option<String>,
    #[serde(rename = "awarenessLevelID", default)]
    pub awareness_level_id: Option<String>,
    #[serde(rename = "awarenessTypeName", default)]
    pub awareness_type_name: Option<String>,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Mainland district or island group with a display centroid
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub code: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

static DISTRICTS: Lazy<HashMap<&'static str, District>> = Lazy::new(|| {
    [
        ("AVR", "Aveiro", 40.64, -8.65),
        ("BJA", "Beja", 38.02, -7.87),
        ("BRG", "Braga", 41.55, -8.43),
        ("BGC", "Bragança", 41.81, -6.76),
        ("CBR", "Castelo Branco", 39.82, -7.49),
        ("COI", "Coimbra", 40.21, -8.43),
        ("EVR", "Évora", 38.57, -7.91),
        ("FAR", "Faro", 37.02, -7.93),
        ("GDA", "Guarda", 40.54, -7.27),
        ("LRA", "Leiria", 39.75, -8.81),
        ("LSB", "Lisboa", 38.72, -9.14),
        ("PTG", "Portalegre", 39.29, -7.43),
        ("PTO", "Porto", 41.15, -8.61),
        ("STM", "Santarém", 39.24, -8.69),
        ("STB", "Setúbal", 38.52, -8.89),
        ("VCT", "Viana do Castelo", 41.69, -8.83),
        ("VRL", "Vila Real", 41.30, -7.74),
        ("VSE", "Viseu", 40.66, -7.91),
        ("MCN", "Madeira - Costa Norte", 32.75, -17.0),
        ("MCS", "Madeira - Costa Sul", 32.65, -16.9),
        ("MRM", "Madeira - Regiões Montanhosas", 32.72, -16.95),
        ("MPS", "Porto Santo", 33.07, -16.34),
        ("AOR", "Açores - Grupo Oriental", 37.78, -25.5),
        ("ACE", "Açores - Grupo Central", 38.72, -27.22),
        ("AOC", "Açores - Grupo Ocidental", 39.45, -31.13),
    ]
    .into_iter()
    .map(|(code, name, lat, lon)| (code, District { code, name, lat, lon }))
    .collect()
});

/// Look up a warning area identifier
pub fn district(id: &str) -> Option<&'static District> {
    DISTRICTS.get(id)
}

/// All known districts, sorted by code
pub fn districts() -> Vec<&'static District> {
    let mut all: Vec<_> = DISTRICTS.values().collect();
    all.sort_by_key(|d| d.code);
    all
}

/// Decode a warnings payload without failing on individual records
///
/// Anything that is not a JSON array decodes to no warnings. Entries that do
/// not fit [`RawWarning`] are skipped.
pub fn parse_warnings(value: serde_json::Value) -> Vec<RawWarning> {
    let serde_json::Value::Array(items) = value else {
        warn!("Warnings payload is not an array, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<RawWarning>(item) {
            Ok(warning) => Some(warning),
            Err(e) => {
                warn!("Skipping malformed warning record #{}: {}", index, e);
                None
            }
        })
        .collect()
}

/// IPMA open-data warnings client
pub struct IpmaAPI {
    client: Client,
    warnings_url: String,
}

impl IpmaAPI {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::with_url(DEFAULT_WARNINGS_URL)
    }

    pub fn with_url(warnings_url: &str) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: Client::builder().build()?,
            warnings_url: warnings_url.to_string(),
        })
    }

    pub fn warnings_url(&self) -> &str {
        &self.warnings_url
    }

    /// Fetch the raw warnings feed
    pub async fn fetch_warnings(&self) -> Result<Vec<RawWarning>, anyhow::Error> {
        info!("Fetching IPMA warnings from: {}", self.warnings_url);
        let response = self.client.get(&self.warnings_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            error!("Warnings fetch failed with status {}", status);
            return Err(anyhow::anyhow!("HTTP {}: {}", status, self.warnings_url));
        }

        let value: serde_json::Value = response.json().await?;
        let warnings = parse_warnings(value);
        info!("Received {} warning records", warnings.len());
        Ok(warnings)
    }
}
