//! Daily forecast aggregation.
//!
//! The upstream feed is a flat list of 3-hour [`WeatherSample`]s spanning
//! about five days. The dashboard wants one row per calendar day, so this
//! module buckets the samples by date and reduces each bucket to a
//! [`DailySummary`], plus the sliced views the dashboard renders (labels,
//! rain percentages, "tomorrow", the upcoming strip).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::WeatherSample;

/// Required sample field that was found absent during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleField {
    DateKey,
    Temperature,
}

impl std::fmt::Display for SampleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleField::DateKey => f.write_str("date key"),
            SampleField::Temperature => f.write_str("temperature"),
        }
    }
}

/// A sample could not be aggregated because a required field was absent.
///
/// `index` is the sample's position in the input sequence. Aggregation is
/// all-or-nothing: the first malformed sample aborts the whole call and no
/// partial summaries are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed forecast sample at position {index}: missing {field}")]
pub struct MalformedSampleError {
    pub index: usize,
    pub field: SampleField,
}

/// Reduction of all same-day samples into one dashboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Calendar date; summaries are ordered ascending by this key.
    pub date: NaiveDate,
    /// Abbreviated weekday name ("Mon", "Tue", ...), derived from `date`.
    pub day_label: String,
    /// Mean of the day's sample temperatures, rounded half away from zero.
    pub average_temperature: i32,
    /// Worst-case precipitation figure for the day as a rounded percentage.
    /// Volume fallbacks are not rescaled, so this can exceed 100 when the
    /// feed omitted the probability field (see
    /// [`WeatherSample::precipitation_estimate`]).
    pub precipitation_probability: u32,
    /// Icon of the first sample received for the day, in arrival order.
    pub representative_icon: String,
}

/// Ordered per-day summaries for one forecast fetch, plus the projections
/// the dashboard consumes. Built once per request; never mutated after.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    days: Vec<DailySummary>,
}

/// Width of the short-range window shown after "today".
const UPCOMING_WINDOW: usize = 5;

impl DailyForecast {
    /// Group `samples` by calendar date and reduce each group to a
    /// [`DailySummary`], sorted ascending by date.
    ///
    /// Samples of the same day are reduced in arrival order, which only
    /// matters for the representative icon; no ordering of the input is
    /// assumed otherwise. An empty input produces an empty forecast, not an
    /// error. A sample without a usable date key or temperature aborts the
    /// call with [`MalformedSampleError`]; nothing is returned for the rest.
    ///
    /// Temperature means round half away from zero (`f64::round`).
    pub fn aggregate(samples: &[WeatherSample]) -> Result<Self, MalformedSampleError> {
        let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

        for (index, sample) in samples.iter().enumerate() {
            let date = sample.date_key().ok_or(MalformedSampleError {
                index,
                field: SampleField::DateKey,
            })?;
            let temperature = sample.temperature.ok_or(MalformedSampleError {
                index,
                field: SampleField::Temperature,
            })?;

            let bucket = buckets
                .entry(date)
                .or_insert_with(|| DayBucket::first(&sample.weather_icon));
            bucket.temperature_sum += temperature;
            bucket.sample_count += 1;
            bucket.max_precipitation = bucket.max_precipitation.max(sample.precipitation_estimate());
        }

        let days = buckets
            .into_iter()
            .map(|(date, bucket)| bucket.into_summary(date))
            .collect();

        Ok(Self { days })
    }

    pub fn days(&self) -> &[DailySummary] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Weekday labels in summary order, one per day.
    pub fn date_labels(&self) -> Vec<&str> {
        self.days.iter().map(|d| d.day_label.as_str()).collect()
    }

    /// Precipitation percentages in summary order, one per day.
    pub fn rain_probabilities(&self) -> Vec<u32> {
        self.days.iter().map(|d| d.precipitation_probability).collect()
    }

    /// The day after the first summarized day, when the forecast covers one.
    pub fn tomorrow(&self) -> Option<&DailySummary> {
        self.days.get(1)
    }

    /// Up to five days following the first one; empty when the forecast
    /// holds fewer than two days.
    pub fn upcoming_days(&self) -> &[DailySummary] {
        if self.days.len() < 2 {
            return &[];
        }
        &self.days[1..self.days.len().min(1 + UPCOMING_WINDOW)]
    }
}

/// Running reduction state for one calendar day.
struct DayBucket {
    temperature_sum: f64,
    sample_count: u32,
    max_precipitation: f64,
    first_icon: String,
}

impl DayBucket {
    fn first(icon: &str) -> Self {
        Self {
            temperature_sum: 0.0,
            sample_count: 0,
            max_precipitation: 0.0,
            first_icon: icon.to_owned(),
        }
    }

    fn into_summary(self, date: NaiveDate) -> DailySummary {
        let mean = self.temperature_sum / f64::from(self.sample_count);

        DailySummary {
            day_label: date.format("%a").to_string(),
            average_temperature: mean.round() as i32,
            precipitation_probability: (self.max_precipitation * 100.0).round() as u32,
            representative_icon: self.first_icon,
            date,
        }
    }
}
