//! Terminal output formatting for the dashboard views.

use skycast_core::{
    AirQualitySnapshot, CurrentConditions, DailyForecast, DailySummary, DashboardAlert,
    UnitSystem,
};

/// Bar width for a 100% rain chance.
const CHART_WIDTH: u32 = 20;

pub fn print_current(conditions: &CurrentConditions, units: UnitSystem) {
    let symbol = units.temperature_symbol();

    println!(
        "{}: {} {}",
        conditions.city,
        conditions.description,
        icon_glyph(&conditions.icon)
    );
    println!(
        "  Temperature: {:.1}{symbol} (feels like {:.1}{symbol})",
        conditions.temperature, conditions.feels_like
    );
    println!("  Humidity:    {}%", conditions.humidity_pct);
    println!("  Wind:        {:.1} {}", conditions.wind_speed, units.wind_speed_unit());
    println!("  Pressure:    {} hPa", conditions.pressure_hpa);
}

pub fn print_forecast(city: &str, forecast: &DailyForecast, units: UnitSystem) {
    if forecast.is_empty() {
        println!("No forecast data available for {city}.");
        return;
    }

    println!("5-day forecast for {city}:");
    for day in forecast.days() {
        println!("  {}", summary_line(day, units));
    }

    println!();
    print_rain_chart(forecast);
}

pub fn print_tomorrow(forecast: &DailyForecast, units: UnitSystem) {
    match forecast.tomorrow() {
        Some(day) => println!("Tomorrow:  {}", summary_line(day, units)),
        None => println!("No forecast beyond today yet."),
    }
}

pub fn print_upcoming(forecast: &DailyForecast, units: UnitSystem) {
    let upcoming = forecast.upcoming_days();
    if upcoming.is_empty() {
        return;
    }

    println!("Next days:");
    for day in upcoming {
        println!("  {}", summary_line(day, units));
    }
}

/// One bar per summarized day, driven by the forecast's parallel
/// label/percentage views.
pub fn print_rain_chart(forecast: &DailyForecast) {
    if forecast.is_empty() {
        return;
    }

    println!("Rain chance");
    for (label, pct) in forecast.date_labels().iter().zip(forecast.rain_probabilities()) {
        println!("  {label:<3} {:<width$} {pct:>3}%", rain_bar(pct), width = CHART_WIDTH as usize);
    }
}

pub fn print_air(city: &str, air: &AirQualitySnapshot) {
    println!("Air quality in {city}: {}", air.level.label());
    println!("  PM2.5: {:>6.1} µg/m³", air.pm2_5);
    println!("  PM10:  {:>6.1} µg/m³", air.pm10);
    println!("  NO2:   {:>6.1} µg/m³", air.no2);
    println!("  O3:    {:>6.1} µg/m³", air.o3);
}

pub fn print_alerts(alerts: &[DashboardAlert]) {
    for alert in alerts {
        println!("! {}", alert.message);
    }
}

fn summary_line(day: &DailySummary, units: UnitSystem) -> String {
    format!(
        "{} {}  {}  {:>4}{}  {:>3}% rain",
        day.day_label,
        day.date,
        icon_glyph(&day.representative_icon),
        day.average_temperature,
        units.temperature_symbol(),
        day.precipitation_probability,
    )
}

fn rain_bar(pct: u32) -> String {
    let filled = pct.min(100) * CHART_WIDTH / 100;
    "█".repeat(filled as usize)
}

/// Glyph for an OpenWeather icon code (two digits plus a day/night suffix).
fn icon_glyph(code: &str) -> &'static str {
    match code.get(..2) {
        Some("01") => "☀",
        Some("02") => "⛅",
        Some("03") | Some("04") => "☁",
        Some("09") | Some("10") => "🌧",
        Some("11") => "⛈",
        Some("13") => "❄",
        Some("50") => "🌫",
        _ => "·",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn icon_glyphs_cover_the_common_codes() {
        assert_eq!(icon_glyph("01d"), "☀");
        assert_eq!(icon_glyph("10n"), "🌧");
        assert_eq!(icon_glyph("13d"), "❄");
        assert_eq!(icon_glyph(""), "·");
        assert_eq!(icon_glyph("99x"), "·");
    }

    #[test]
    fn rain_bar_scales_with_the_percentage() {
        assert_eq!(rain_bar(0).chars().count(), 0);
        assert_eq!(rain_bar(50).chars().count(), 10);
        assert_eq!(rain_bar(100).chars().count(), 20);
    }

    #[test]
    fn rain_bar_stays_at_full_width_past_100() {
        // Volume fallbacks can push the percentage past 100.
        assert_eq!(rain_bar(250).chars().count(), 20);
    }

    #[test]
    fn summary_line_shows_label_temperature_and_rain_chance() {
        let day = DailySummary {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            day_label: "Sat".to_string(),
            average_temperature: 22,
            precipitation_probability: 30,
            representative_icon: "01d".to_string(),
        };

        let line = summary_line(&day, UnitSystem::Metric);
        assert!(line.contains("Sat 2024-06-01"), "got: {line}");
        assert!(line.contains("22°C"), "got: {line}");
        assert!(line.contains("30% rain"), "got: {line}");
        assert!(line.contains("☀"), "got: {line}");
    }
}
