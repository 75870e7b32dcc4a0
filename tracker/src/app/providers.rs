use async_trait::async_trait;
use ipma::{IpmaAPI, RawWarning};
use rainviewer::{RainViewerAPI, WeatherMaps};

/// Source of radar frame listings
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn fetch_frame_data(&self) -> anyhow::Result<WeatherMaps>;
}

/// Source of raw alert records
#[async_trait]
pub trait AlertSource: Send + Sync {
    async fn fetch_alerts(&self) -> anyhow::Result<Vec<RawWarning>>;
}

/// Resolved display data for a warning area
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInfo {
    pub name: String,
    pub coordinate: (f64, f64),
}

pub trait RegionDirectory {
    fn region_of(&self, id: &str) -> Option<RegionInfo>;
}

#[async_trait]
impl FrameSource for RainViewerAPI {
    async fn fetch_frame_data(&self) -> anyhow::Result<WeatherMaps> {
        self.fetch_weather_maps().await
    }
}

#[async_trait]
impl AlertSource for IpmaAPI {
    async fn fetch_alerts(&self) -> anyhow::Result<Vec<RawWarning>> {
        self.fetch_warnings().await
    }
}

/// Portuguese districts and island groups from the IPMA area table
#[derive(Debug, Default, Clone, Copy)]
pub struct IpmaDistricts;

impl RegionDirectory for IpmaDistricts {
    fn region_of(&self, id: &str) -> Option<RegionInfo> {
        ipma::district(id).map(|d| RegionInfo {
            name: d.name.to_string(),
            coordinate: (d.lat, d.lon),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::error::TrackerError;
    use crate::app::radar::RadarController;
    use crate::app::timer::ManualTimer;
    use crate::app::warnings::WarningsProcessor;
    use anyhow::anyhow;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use rainviewer::{RadarFrame, RadarSection};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    const NOW: i64 = 1_700_000_000;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).unwrap()
    }

    /// Hands out queued listings in order; `None` entries fail the fetch
    struct TestFrameSource {
        replies: Mutex<VecDeque<Option<WeatherMaps>>>,
        fetches: Arc<Mutex<u32>>,
    }

    impl TestFrameSource {
        fn new(replies: Vec<Option<WeatherMaps>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                fetches: Arc::new(Mutex::new(0)),
            }
        }
    }

    #[async_trait]
    impl FrameSource for TestFrameSource {
        async fn fetch_frame_data(&self) -> anyhow::Result<WeatherMaps> {
            *self.fetches.lock().await += 1;
            match self.replies.lock().await.pop_front() {
                Some(Some(maps)) => Ok(maps),
                _ => Err(anyhow!("HTTP 503 Service Unavailable")),
            }
        }
    }

    struct TestAlertSource {
        fail_with: Option<String>,
        records: Vec<RawWarning>,
    }

    #[async_trait]
    impl AlertSource for TestAlertSource {
        async fn fetch_alerts(&self) -> anyhow::Result<Vec<RawWarning>> {
            if let Some(err) = &self.fail_with {
                return Err(anyhow!(err.clone()));
            }
            Ok(self.records.clone())
        }
    }

    fn listing(paths: &[&str]) -> WeatherMaps {
        WeatherMaps {
            generated: Some(NOW),
            radar: RadarSection {
                past: paths
                    .iter()
                    .enumerate()
                    .map(|(i, path)| RadarFrame {
                        time: NOW - 600 * (paths.len() - 1 - i) as i64,
                        path: path.to_string(),
                    })
                    .collect(),
                nowcast: vec![],
            },
            ..Default::default()
        }
    }

    fn warning(area: &str, level: &str) -> RawWarning {
        RawWarning {
            id_area_aviso: Some(area.to_string()),
            awareness_level_id: Some(level.to_string()),
            awareness_type_name: Some("Vento".to_string()),
            start_time: Some((fixed_now() - ChronoDuration::hours(1)).to_rfc3339()),
            end_time: Some((fixed_now() + ChronoDuration::hours(6)).to_rfc3339()),
            text: None,
        }
    }

    #[test]
    fn test_ipma_districts() {
        let porto = IpmaDistricts.region_of("PTO").unwrap();
        assert_eq!(porto.name, "Porto");
        assert_eq!(porto.coordinate, (41.15, -8.61));
        assert!(IpmaDistricts.region_of("ZZZ").is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_good_frames() {
        let source = TestFrameSource::new(vec![Some(listing(&["/a", "/b", "/c"])), None]);
        let mut radar = RadarController::with_timer(ManualTimer::default(), Duration::from_millis(500)).with_clock(fixed_now);

        radar.load_result(source.fetch_frame_data().await).unwrap();
        assert_eq!(radar.frames().len(), 3);
        assert_eq!(radar.active_index(), 2);

        let result = radar.load_result(source.fetch_frame_data().await);
        assert!(matches!(result, Err(TrackerError::DataUnavailable(ref m)) if m.contains("503")));
        assert_eq!(radar.frames().len(), 3);
        assert_eq!(radar.active_frame().unwrap().path, "/c");
        assert_eq!(*source.fetches.lock().await, 2);
    }

    #[tokio::test]
    async fn test_refresh_through_source_while_playing() {
        let source = TestFrameSource::new(vec![Some(listing(&["/a", "/b"])), None, Some(listing(&["/x", "/y", "/z"]))]);
        let mut radar = RadarController::with_timer(ManualTimer::default(), Duration::from_millis(500)).with_clock(fixed_now);

        radar.load_result(source.fetch_frame_data().await).unwrap();
        radar.play();
        radar.tick();

        assert!(radar.refresh(source.fetch_frame_data().await).is_err());
        assert!(radar.is_animating());
        assert_eq!(radar.frames().len(), 2);

        radar.refresh(source.fetch_frame_data().await).unwrap();
        assert!(radar.is_animating());
        assert_eq!(radar.frames().len(), 3);
        assert_eq!(radar.active_index(), 2);
    }

    #[tokio::test]
    async fn test_failed_alert_fetch_empties_snapshot() {
        let mut warnings = WarningsProcessor::new().with_clock(fixed_now);

        let healthy = TestAlertSource {
            fail_with: None,
            records: vec![warning("LSB", "orange"), warning("PTO", "red")],
        };
        warnings.ingest_result(healthy.fetch_alerts().await);
        assert_eq!(warnings.counts().total, 2);
        assert_eq!(warnings.alerts()[0].region, "Porto");

        let broken = TestAlertSource {
            fail_with: Some("connection reset".to_string()),
            records: vec![],
        };
        let snapshot = warnings.ingest_result(broken.fetch_alerts().await);
        assert!(snapshot.alerts.is_empty());
        assert_eq!(snapshot.counts.total, 0);
    }
}
