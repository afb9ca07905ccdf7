use crate::analysis::{
    AlertEngine, AlertState, ConsensusResult, ConsensusScorer, MemberAggregator, SourceSummary,
    TimeBucket, TimeBucketer,
};
use crate::data::{FieldKind, RawSeries, SourceKind};
use crate::utils::config::Config;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

/// Everything the presentation layer needs for one bucket: the window
/// itself, one summary per reporting source, the consensus signal and the
/// alert classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketReport {
    pub bucket: TimeBucket,
    pub summaries: Vec<SourceSummary>,
    pub consensus: ConsensusResult,
    pub alert: AlertState,
}

/// Orchestrates one full reduction: bucket the horizon, aggregate each
/// source per bucket, score consensus and alerts per bucket.
///
/// Stateless between runs and pure in `run`: identical series and reference
/// time produce identical reports, and nothing is retained afterwards.
pub struct Pipeline {
    bucketer: TimeBucketer,
    aggregator: MemberAggregator,
    scorer: ConsensusScorer,
    alerts: AlertEngine,
}

impl Pipeline {
    pub fn new(
        bucketer: TimeBucketer,
        aggregator: MemberAggregator,
        scorer: ConsensusScorer,
        alerts: AlertEngine,
    ) -> Self {
        Self {
            bucketer,
            aggregator,
            scorer,
            alerts,
        }
    }

    /// Wire every component from one configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TimeBucketer::new(
                config.buckets.horizon_days,
                config.buckets.grace_minutes,
                config.buckets.day_parts.clone(),
            ),
            MemberAggregator::new(config.aggregation.rain_threshold_mm),
            ConsensusScorer::new(config.consensus.clone()),
            AlertEngine::new(config.alert.clone()),
        )
    }

    /// Run the full reduction for one fetched dataset.
    ///
    /// Buckets where no source has any data are skipped rather than emitted
    /// empty; the returned list is chronological.
    pub fn run(&self, series: &RawSeries, now: NaiveDateTime) -> Vec<BucketReport> {
        let mut reports = Vec::new();

        for bucket in self.bucketer.upcoming(now) {
            let summaries: Vec<SourceSummary> = (0..series.sources().len())
                .filter_map(|source| self.aggregator.summarize(series, &bucket, source))
                .filter(|summary| summary.has_data())
                .collect();

            if summaries.is_empty() {
                debug!(
                    label = %bucket.label,
                    date = %bucket.date,
                    "no source reported data for bucket, skipping"
                );
                continue;
            }

            let agreement = self.scorer.score_agreement(&summaries);
            let spread = series
                .sources()
                .iter()
                .enumerate()
                .filter(|(_, s)| matches!(s.kind, SourceKind::Ensemble { .. }))
                .filter_map(|(idx, _)| {
                    self.scorer
                        .score_spread(series, &bucket, idx, FieldKind::Temperature)
                })
                .collect();

            let alert = self.alerts.evaluate(&summaries);

            reports.push(BucketReport {
                bucket,
                summaries,
                consensus: ConsensusResult { agreement, spread },
                alert,
            });
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawSeries, SourceDescriptor};
    use chrono::NaiveDate;

    fn two_day_index() -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..48)
            .map(|i| start + chrono::Duration::hours(i))
            .collect()
    }

    // 12:10 - past the morning bucket's grace window.
    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(12, 10, 0)
            .unwrap()
    }

    /// Two deterministic models reporting temperature and weather codes for
    /// the full 48 hours.
    fn two_model_series() -> RawSeries {
        let mut builder = RawSeries::builder(two_day_index()).unwrap();
        let a = builder.add_source(SourceDescriptor::deterministic(
            "ecmwf_ifs",
            vec![FieldKind::Temperature, FieldKind::WeatherCode, FieldKind::Precipitation],
        ));
        let b = builder.add_source(SourceDescriptor::deterministic(
            "gfs_seamless",
            vec![FieldKind::Temperature, FieldKind::WeatherCode, FieldKind::Precipitation],
        ));
        for src in [a, b] {
            builder
                .push_column(src, FieldKind::Temperature, 0, vec![Some(26.0); 48])
                .unwrap();
            builder
                .push_column(src, FieldKind::WeatherCode, 0, vec![Some(1.0); 48])
                .unwrap();
            builder
                .push_column(src, FieldKind::Precipitation, 0, vec![Some(0.0); 48])
                .unwrap();
        }
        builder.build()
    }

    fn pipeline() -> Pipeline {
        Pipeline::from_config(&Config::default())
    }

    #[test]
    fn test_reports_cover_remaining_buckets_chronologically() {
        let reports = pipeline().run(&two_model_series(), noon());
        // Midday (in progress) and evening today, plus all four tomorrow.
        assert_eq!(reports.len(), 6);
        assert!(reports
            .windows(2)
            .all(|w| w[0].bucket.start() < w[1].bucket.start()));
    }

    #[test]
    fn test_each_report_carries_both_sources() {
        let reports = pipeline().run(&two_model_series(), noon());
        for report in &reports {
            assert_eq!(report.summaries.len(), 2);
            let agreement = report.consensus.agreement.as_ref().unwrap();
            assert_eq!(agreement.valid_sources, 2);
            assert!(!report.alert.is_warning());
        }
    }

    #[test]
    fn test_run_is_idempotent() {
        let series = two_model_series();
        let p = pipeline();
        let first = p.run(&series, noon());
        let second = p.run(&series, noon());
        assert_eq!(first, second);
    }

    #[test]
    fn test_buckets_without_data_are_skipped() {
        // Series covering only today; tomorrow's buckets have no rows.
        let start = NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let index: Vec<NaiveDateTime> = (0..24)
            .map(|i| start + chrono::Duration::hours(i))
            .collect();
        let mut builder = RawSeries::builder(index).unwrap();
        let src = builder.add_source(SourceDescriptor::deterministic(
            "ecmwf_ifs",
            vec![FieldKind::Temperature],
        ));
        builder
            .push_column(src, FieldKind::Temperature, 0, vec![Some(26.0); 24])
            .unwrap();
        let series = builder.build();

        let reports = pipeline().run(&series, noon());
        assert_eq!(reports.len(), 2); // midday + evening of today only
        assert!(reports
            .iter()
            .all(|r| r.bucket.date == NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()));
    }

    #[test]
    fn test_ensemble_source_contributes_spread() {
        let mut builder = RawSeries::builder(two_day_index()).unwrap();
        let src = builder.add_source(SourceDescriptor::ensemble(
            "ecmwf_ifs025_ensemble",
            3,
            vec![FieldKind::Temperature, FieldKind::WeatherCode],
        ));
        for m in 0..3 {
            builder
                .push_column(
                    src,
                    FieldKind::Temperature,
                    m,
                    vec![Some(25.0 + m as f64 * 0.2); 48],
                )
                .unwrap();
            builder
                .push_column(src, FieldKind::WeatherCode, m, vec![Some(2.0); 48])
                .unwrap();
        }
        let series = builder.build();

        let reports = pipeline().run(&series, noon());
        assert!(!reports.is_empty());
        for report in &reports {
            assert_eq!(report.consensus.spread.len(), 1);
            assert_eq!(report.consensus.spread[0].source_id, "ecmwf_ifs025_ensemble");
        }
    }

    #[test]
    fn test_warning_propagates_from_worst_source() {
        let mut builder = RawSeries::builder(two_day_index()).unwrap();
        let calm = builder.add_source(SourceDescriptor::deterministic(
            "gfs_seamless",
            vec![FieldKind::Precipitation, FieldKind::WeatherCode],
        ));
        let wet = builder.add_source(SourceDescriptor::deterministic(
            "ecmwf_ifs",
            vec![FieldKind::Precipitation, FieldKind::WeatherCode],
        ));
        builder
            .push_column(calm, FieldKind::Precipitation, 0, vec![Some(0.0); 48])
            .unwrap();
        builder
            .push_column(calm, FieldKind::WeatherCode, 0, vec![Some(1.0); 48])
            .unwrap();
        // 1.0 mm every hour: 6 mm per bucket, over the 5 mm default.
        builder
            .push_column(wet, FieldKind::Precipitation, 0, vec![Some(1.0); 48])
            .unwrap();
        builder
            .push_column(wet, FieldKind::WeatherCode, 0, vec![Some(61.0); 48])
            .unwrap();
        let series = builder.build();

        let reports = pipeline().run(&series, noon());
        for report in &reports {
            assert!(report.alert.is_warning());
            assert_eq!(report.alert.worst_condition(), "Light Rain");
        }
    }
}
