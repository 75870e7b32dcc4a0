use anyhow::{Context, Result};
use rainviewer::TileOptions;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_ENV: &str = "PTSTORMS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "ptstorms.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rainviewer: RainViewerConfig,
    pub ipma: IpmaConfig,
    pub intervals: Intervals,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RainViewerConfig {
    pub api_url: String,
    pub tile_host: String,
    pub tile_size: u32,
    pub opacity: f32,
    pub color_scheme: u8,
    pub smooth_data: u8,
    pub snow_colors: u8,
}

impl Default for RainViewerConfig {
    fn default() -> Self {
        Self {
            api_url: rainviewer::DEFAULT_API_URL.to_string(),
            tile_host: rainviewer::DEFAULT_TILE_HOST.to_string(),
            tile_size: 256,
            opacity: 0.7,
            color_scheme: 4,
            smooth_data: 1,
            snow_colors: 1,
        }
    }
}

impl RainViewerConfig {
    pub fn tile_options(&self) -> TileOptions {
        TileOptions {
            host: self.tile_host.clone(),
            size: self.tile_size,
            color_scheme: self.color_scheme,
            smooth: self.smooth_data,
            snow: self.snow_colors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IpmaConfig {
    pub warnings_url: String,
}

impl Default for IpmaConfig {
    fn default() -> Self {
        Self {
            warnings_url: ipma::DEFAULT_WARNINGS_URL.to_string(),
        }
    }
}

/// Refresh and animation periods, in milliseconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Intervals {
    pub radar_ms: u64,
    pub warnings_ms: u64,
    pub animation_ms: u64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            radar_ms: 5 * 60 * 1000,
            warnings_ms: 10 * 60 * 1000,
            animation_ms: 500,
        }
    }
}

impl Intervals {
    pub fn radar(&self) -> Duration {
        Duration::from_millis(self.radar_ms)
    }

    pub fn warnings(&self) -> Duration {
        Duration::from_millis(self.warnings_ms)
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms.max(1))
    }
}

impl Config {
    /// Load from `$PTSTORMS_CONFIG`, or `ptstorms.json` in the working directory
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// A missing file yields the defaults; a file that exists must parse.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = serde_json::from_str(&content)
                    .with_context(|| format!("invalid config file {}", path.display()))?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("could not read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ptstorms-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.intervals.radar(), Duration::from_secs(300));
        assert_eq!(config.intervals.warnings(), Duration::from_secs(600));
        assert_eq!(config.intervals.animation(), Duration::from_millis(500));
        assert_eq!(config.rainviewer.tile_options(), TileOptions::default());
        assert_eq!(config.ipma.warnings_url, ipma::DEFAULT_WARNINGS_URL);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from(temp_path("missing")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let path = temp_path("partial");
        std::fs::write(&path, r#"{"intervals": {"animation_ms": 250}, "rainviewer": {"color_scheme": 2}}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.intervals.animation_ms, 250);
        assert_eq!(config.intervals.radar_ms, 300_000);
        assert_eq!(config.rainviewer.color_scheme, 2);
        assert_eq!(config.rainviewer.tile_size, 256);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ not json").unwrap();
        let result = Config::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
