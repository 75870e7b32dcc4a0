use serde::Serialize;

use crate::app::warnings::Severity;

/// One reflectivity band of the radar color scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IntensityBand {
    /// dBZ, inclusive
    pub min: u8,
    /// dBZ, exclusive
    pub max: u8,
    /// `None` for the transparent "no precipitation" band
    pub color: Option<&'static str>,
    pub label: &'static str,
}

pub static PRECIPITATION_BANDS: [IntensityBand; 7] = [
    IntensityBand { min: 0, max: 5, color: None, label: "Sem precipitação" },
    IntensityBand { min: 5, max: 20, color: Some("#88DDFF"), label: "Muito leve" },
    IntensityBand { min: 20, max: 30, color: Some("#0088FF"), label: "Leve" },
    IntensityBand { min: 30, max: 40, color: Some("#00FF00"), label: "Moderada" },
    IntensityBand { min: 40, max: 50, color: Some("#FFFF00"), label: "Forte" },
    IntensityBand { min: 50, max: 60, color: Some("#FF8800"), label: "Muito forte" },
    IntensityBand { min: 60, max: 100, color: Some("#FF0000"), label: "Extrema" },
];

/// Bands worth drawing in a legend
pub fn legend_entries() -> impl Iterator<Item = &'static IntensityBand> {
    PRECIPITATION_BANDS.iter().filter(|band| band.color.is_some())
}

/// Band a reflectivity value falls in; values past the scale land in the top band
pub fn band_for(dbz: f32) -> &'static IntensityBand {
    PRECIPITATION_BANDS
        .iter()
        .find(|band| dbz < band.max as f32)
        .unwrap_or(&PRECIPITATION_BANDS[PRECIPITATION_BANDS.len() - 1])
}

/// Warning levels shown in the legend, lowest first
pub fn warning_levels() -> [Severity; 3] {
    [Severity::Yellow, Severity::Orange, Severity::Red]
}
