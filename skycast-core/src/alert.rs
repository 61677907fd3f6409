//! Threshold checks that turn forecast and air quality data into
//! dashboard alerts.

use crate::forecast::DailyForecast;
use crate::model::{AirQualitySnapshot, AqiLevel};

/// What tripped the alert, in the order the dashboard lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    HeavyRain,
    PoorAirQuality,
}

/// An alert raised when a checked value crosses its configured threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardAlert {
    pub kind: AlertKind,
    pub message: String,
}

/// Checks the upcoming days for a precipitation percentage at or above
/// `min_probability_pct` and returns an alert for the worst one.
///
/// Returns `None` when every upcoming day stays below the threshold, or
/// when the forecast has no upcoming days to check.
pub fn check_rain(forecast: &DailyForecast, min_probability_pct: u32) -> Option<DashboardAlert> {
    let worst = forecast
        .upcoming_days()
        .iter()
        .max_by_key(|day| day.precipitation_probability)?;

    if worst.precipitation_probability < min_probability_pct {
        return None;
    }

    Some(DashboardAlert {
        kind: AlertKind::HeavyRain,
        message: format!(
            "High chance of rain on {} {}: {}%",
            worst.day_label, worst.date, worst.precipitation_probability
        ),
    })
}

/// Checks an air quality snapshot against the configured minimum level.
///
/// Returns `None` while the index stays below `min_level`.
pub fn check_air_quality(
    air: &AirQualitySnapshot,
    min_level: AqiLevel,
) -> Option<DashboardAlert> {
    if air.level < min_level {
        return None;
    }

    Some(DashboardAlert {
        kind: AlertKind::PoorAirQuality,
        message: format!(
            "Air quality is {}: PM2.5 at {} µg/m³",
            air.level.label(),
            air.pm2_5
        ),
    })
}
