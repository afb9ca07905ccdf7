use crate::analysis::buckets::TimeBucket;
use crate::data::{codes, FieldKind, RawSeries};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Min/mean/max triple for one continuous field over a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldRange {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Everything one source says about one bucket.
///
/// Each field is independently optional: a source missing wind data still
/// reports temperature and precipitation. `None` means unavailable, which is
/// distinct from zero everywhere downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source_id: String,
    pub temperature: Option<FieldRange>,
    pub humidity: Option<FieldRange>,
    pub wind_speed: Option<FieldRange>,
    pub wind_octant: Option<&'static str>,
    /// Bucket precipitation total of the wettest member, in mm.
    pub precipitation_mm: Option<f64>,
    /// Share of member-hours exceeding the rain threshold, 0..=100.
    pub rain_probability_pct: Option<f64>,
    pub dominant_code: Option<u16>,
    pub worst_code: Option<u16>,
}

impl SourceSummary {
    /// Whether any field carries data; summaries without data are dropped
    /// from the bucket rather than emitted empty.
    pub fn has_data(&self) -> bool {
        self.temperature.is_some()
            || self.humidity.is_some()
            || self.wind_speed.is_some()
            || self.precipitation_mm.is_some()
            || self.rain_probability_pct.is_some()
            || self.dominant_code.is_some()
    }

    pub fn dominant_description(&self) -> Option<String> {
        self.dominant_code.map(codes::describe)
    }

    pub fn worst_description(&self) -> Option<String> {
        self.worst_code.map(codes::describe)
    }
}

/// Reduces raw per-member series inside one bucket into per-source statistics.
///
/// Reduction order per continuous field:
/// 1. At each timestamp, reduce across members (min/mean/max).
/// 2. Across the bucket's timestamps, collapse to a final min/mean/max triple.
///
/// Precipitation is accumulative and deliberately pessimistic: each member's
/// values are summed over the bucket and the reported total is the wettest
/// member's, not the mean. Rain probability counts members above the
/// threshold per timestamp against the source's declared member count.
#[derive(Debug, Clone)]
pub struct MemberAggregator {
    rain_threshold_mm: f64,
}

impl MemberAggregator {
    /// # Arguments
    /// * `rain_threshold_mm` - instantaneous precipitation above which a
    ///   member counts as predicting rain (0.1 and 0.5 are both in use
    ///   upstream, so this is a parameter rather than a constant)
    pub fn new(rain_threshold_mm: f64) -> Self {
        Self { rain_threshold_mm }
    }

    /// Summarize one source over one bucket.
    ///
    /// Returns `None` when the bucket holds none of the series' timestamps;
    /// a summary with no populated field is returned as-is and filtered by
    /// callers via [`SourceSummary::has_data`].
    pub fn summarize(
        &self,
        series: &RawSeries,
        bucket: &TimeBucket,
        source: usize,
    ) -> Option<SourceSummary> {
        let descriptor = series.sources().get(source)?;
        let rows = series.rows_where(|ts| bucket.contains(ts));
        if rows.is_empty() {
            return None;
        }
        let members = descriptor.member_count();

        Some(SourceSummary {
            source_id: descriptor.id.clone(),
            temperature: range_of(series, &rows, source, FieldKind::Temperature, members),
            humidity: range_of(series, &rows, source, FieldKind::Humidity, members),
            wind_speed: range_of(series, &rows, source, FieldKind::WindSpeed, members),
            wind_octant: mean_direction(series, &rows, source, members).map(codes::compass_octant),
            precipitation_mm: worst_member_total(series, &rows, source, members),
            rain_probability_pct: self.rain_probability(series, &rows, source, members),
            dominant_code: dominant_code(series, &rows, source, members),
            worst_code: worst_code(series, &rows, source, members),
        })
    }

    /// Per timestamp: members above threshold / declared count. Averaged over
    /// the bucket and reported as a percentage.
    ///
    /// The denominator is always the declared member count, even when some
    /// members are missing data for a timestamp - parity with the member
    /// counts reported upstream (51, 18, ...) matters more than correcting
    /// for silent gaps.
    fn rain_probability(
        &self,
        series: &RawSeries,
        rows: &[usize],
        source: usize,
        members: usize,
    ) -> Option<f64> {
        let mut per_row = Vec::with_capacity(rows.len());
        let mut saw_value = false;

        for &row in rows {
            let mut exceeding = 0usize;
            for m in 0..members {
                if let Some(v) = series.value(source, FieldKind::Precipitation, m, row) {
                    saw_value = true;
                    if v > self.rain_threshold_mm {
                        exceeding += 1;
                    }
                }
            }
            per_row.push(exceeding as f64 / members as f64);
        }

        // No member reported precipitation anywhere in the bucket: the
        // probability is unavailable, not 0%.
        if !saw_value {
            return None;
        }
        Some(per_row.iter().mean() * 100.0)
    }
}

/// Cross-member then cross-bucket reduction for one continuous field:
/// min of per-timestamp minima, mean of per-timestamp means, max of maxima.
fn range_of(
    series: &RawSeries,
    rows: &[usize],
    source: usize,
    field: FieldKind,
    members: usize,
) -> Option<FieldRange> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut row_means = Vec::with_capacity(rows.len());

    for &row in rows {
        let values: Vec<f64> = (0..members)
            .filter_map(|m| series.value(source, field, m, row))
            .collect();
        if values.is_empty() {
            continue; // missing rows are excluded, never zero-filled
        }
        min = values.iter().fold(min, |a, &v| a.min(v));
        max = values.iter().fold(max, |a, &v| a.max(v));
        row_means.push(values.iter().mean());
    }

    if row_means.is_empty() {
        return None;
    }
    Some(FieldRange {
        min,
        mean: row_means.iter().mean(),
        max,
    })
}

/// Wind direction reduces by mean of the per-timestamp member means.
fn mean_direction(
    series: &RawSeries,
    rows: &[usize],
    source: usize,
    members: usize,
) -> Option<f64> {
    let mut row_means = Vec::with_capacity(rows.len());
    for &row in rows {
        let values: Vec<f64> = (0..members)
            .filter_map(|m| series.value(source, FieldKind::WindDirection, m, row))
            .collect();
        if !values.is_empty() {
            row_means.push(values.iter().mean());
        }
    }
    if row_means.is_empty() {
        return None;
    }
    Some(row_means.iter().mean())
}

/// Per-member bucket totals (missing values contribute zero), then the
/// maximum across members - the worst-member scenario.
fn worst_member_total(
    series: &RawSeries,
    rows: &[usize],
    source: usize,
    members: usize,
) -> Option<f64> {
    let mut worst: Option<f64> = None;
    for m in 0..members {
        let mut total = 0.0;
        let mut saw_value = false;
        for &row in rows {
            if let Some(v) = series.value(source, FieldKind::Precipitation, m, row) {
                total += v;
                saw_value = true;
            }
        }
        if saw_value {
            worst = Some(worst.map_or(total, |w: f64| w.max(total)));
        }
    }
    worst
}

/// Statistical mode; ties break toward the lowest code for determinism.
fn mode(codes: impl IntoIterator<Item = u16>) -> Option<u16> {
    let mut counts: BTreeMap<u16, usize> = BTreeMap::new();
    for code in codes {
        *counts.entry(code).or_insert(0) += 1;
    }
    // Ascending key order means the first max seen is the lowest code.
    counts
        .into_iter()
        .fold(None, |best: Option<(u16, usize)>, (code, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((code, n)),
        })
        .map(|(code, _)| code)
}

fn codes_at(series: &RawSeries, row: usize, source: usize, members: usize) -> Vec<u16> {
    (0..members)
        .filter_map(|m| series.value(source, FieldKind::WeatherCode, m, row))
        .map(|v| v.round() as u16)
        .collect()
}

/// Mode across members at each timestamp, then mode of that series.
fn dominant_code(series: &RawSeries, rows: &[usize], source: usize, members: usize) -> Option<u16> {
    let per_row: Vec<u16> = rows
        .iter()
        .filter_map(|&row| mode(codes_at(series, row, source, members)))
        .collect();
    mode(per_row)
}

/// Highest code seen across all members and timestamps in the bucket.
fn worst_code(series: &RawSeries, rows: &[usize], source: usize, members: usize) -> Option<u16> {
    rows.iter()
        .flat_map(|&row| codes_at(series, row, source, members))
        .max()
}
