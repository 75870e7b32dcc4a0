use anyhow::{anyhow, Result};
use log::info;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.rainviewer.com/public/weather-maps.json";
pub const DEFAULT_TILE_HOST: &str = "https://tilecache.rainviewer.com";

/// RainViewer public API client for radar frame listings
pub struct RainViewerAPI {
    client: Client,
    api_url: String,
}

/// Full `weather-maps.json` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherMaps {
    #[serde(default)]
    pub version: Option<String>,
    /// Epoch seconds at which the listing was generated
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub generated: Option<i64>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient_section")]
    pub radar: RadarSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadarSection {
    #[serde(default, deserialize_with = "lenient_frames")]
    pub past: Vec<RadarFrame>,
    #[serde(default, deserialize_with = "lenient_frames")]
    pub nowcast: Vec<RadarFrame>,
}

/// One radar image reference as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarFrame {
    /// Epoch seconds
    pub time: i64,
    pub path: String,
}

impl RadarFrame {
    /// Epoch milliseconds, `None` when the seconds value is out of range
    pub fn time_ms(&self) -> Option<i64> {
        self.time.checked_mul(1000)
    }
}

// A sub-list that is null, not an array, or holds broken entries must not
// fail the whole listing.
fn lenient_frames<'de, D>(deserializer: D) -> std::result::Result<Vec<RadarFrame>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

// A null or non-object radar section is an empty listing.
fn lenient_section<'de, D>(deserializer: D) -> std::result::Result<RadarSection, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => RadarSection::default(),
    })
}

fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

/// Tile rendering options appended to a frame path
#[derive(Debug, Clone, PartialEq)]
pub struct TileOptions {
    pub host: String,
    pub size: u32,
    pub color_scheme: u8,
    pub smooth: u8,
    pub snow: u8,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_TILE_HOST.to_string(),
            size: 256,
            color_scheme: 4,
            smooth: 1,
            snow: 1,
        }
    }
}

impl TileOptions {
    /// Slippy-map template with `{z}/{x}/{y}` placeholders left in place
    pub fn tile_template(&self, path: &str) -> String {
        format!(
            "{}{}/{}/{{z}}/{{x}}/{{y}}/{}/{}_{}.png",
            self.host, path, self.size, self.color_scheme, self.smooth, self.snow
        )
    }

    /// Concrete tile URL for one map tile
    pub fn tile_url(&self, path: &str, z: u32, x: u32, y: u32) -> String {
        format!(
            "{}{}/{}/{}/{}/{}/{}/{}_{}.png",
            self.host, path, self.size, z, x, y, self.color_scheme, self.smooth, self.snow
        )
    }
}

impl RainViewerAPI {
    /// Create a new RainViewer API client
    pub fn new() -> Result<Self> {
        Self::with_url(DEFAULT_API_URL)
    }

    pub fn with_url(api_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            api_url: api_url.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the current past + nowcast frame listing
    pub async fn fetch_weather_maps(&self) -> Result<WeatherMaps> {
        info!("Fetching radar frame listing from: {}", self.api_url);

        let response = self.client.get(&self.api_url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {}: {}", response.status(), self.api_url));
        }

        let maps: WeatherMaps = response.json().await?;
        info!(
            "Received {} past and {} nowcast frames",
            maps.radar.past.len(),
            maps.radar.nowcast.len()
        );
        Ok(maps)
    }

    /// Fetch a single tile image
    pub async fn fetch_tile(&self, options: &TileOptions, path: &str, z: u32, x: u32, y: u32) -> Result<Vec<u8>> {
        let url = options.tile_url(path, z, x, y);
        info!("Fetching radar tile from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {}: {}", response.status(), url));
        }

        let bytes = response.bytes().await?;
        info!("Successfully fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
