use crate::analysis::aggregate::SourceSummary;
use crate::analysis::buckets::TimeBucket;
use crate::data::{FieldKind, RawSeries, SkyCategory, SourceKind};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Three-level confidence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// Cross-source agreement for one bucket: how many sources land in the same
/// coarse condition family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementScore {
    pub dominant: SkyCategory,
    /// Share of valid sources in the dominant category, 0..=100.
    pub agreement_pct: f64,
    pub tier: ConfidenceTier,
    pub valid_sources: usize,
}

/// Intra-ensemble spread for one bucket: member standard deviation of a
/// continuous field, averaged over the bucket's timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadScore {
    pub source_id: String,
    pub mean_std_dev: f64,
    pub tier: ConfidenceTier,
}

/// Per-bucket consensus output. A multi-model pipeline populates `agreement`,
/// an ensemble pipeline populates `spread`; both can coexist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub agreement: Option<AgreementScore>,
    pub spread: Vec<SpreadScore>,
}

/// Tier cutoffs for both confidence metrics.
///
/// The two metrics answer different questions (agreement between sources vs.
/// spread within one ensemble) and use incompatible scales, so each carries
/// its own thresholds and they are never merged into one score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCutoffs {
    /// Agreement at or above this percentage is high confidence.
    pub high_agreement_pct: f64,
    /// Agreement at or above this percentage (but below high) is medium.
    pub medium_agreement_pct: f64,
    /// Spread below this many std-dev units is high confidence.
    pub high_spread_std: f64,
    /// Spread below this (but at or above high) is medium.
    pub medium_spread_std: f64,
}

impl Default for TierCutoffs {
    fn default() -> Self {
        Self {
            high_agreement_pct: 70.0,
            medium_agreement_pct: 40.0,
            high_spread_std: 1.0,
            medium_spread_std: 2.5,
        }
    }
}

/// Scores agreement between sources and spread within ensembles.
#[derive(Debug, Clone)]
pub struct ConsensusScorer {
    cutoffs: TierCutoffs,
}

impl ConsensusScorer {
    pub fn new(cutoffs: TierCutoffs) -> Self {
        Self { cutoffs }
    }

    /// Classify each source's dominant condition into a coarse category and
    /// measure how large the majority is.
    ///
    /// Sources without a dominant code are excluded from the denominator.
    /// Ties between categories break toward the one seen first in source
    /// order, which is stable per run. Returns `None` with zero valid
    /// sources - never a division by zero, never a silent 0%.
    pub fn score_agreement(&self, summaries: &[SourceSummary]) -> Option<AgreementScore> {
        let categories: Vec<SkyCategory> = summaries
            .iter()
            .filter_map(|s| s.dominant_code.map(SkyCategory::from_code))
            .collect();
        if categories.is_empty() {
            return None;
        }

        // Tally in first-encounter order so ties resolve deterministically.
        let mut tally: Vec<(SkyCategory, usize)> = Vec::new();
        for category in &categories {
            match tally.iter_mut().find(|(c, _)| c == category) {
                Some(entry) => entry.1 += 1,
                None => tally.push((*category, 1)),
            }
        }
        let (dominant, count) = tally
            .iter()
            .copied()
            .fold(None, |best: Option<(SkyCategory, usize)>, next| match best {
                Some((_, n)) if n >= next.1 => best,
                _ => Some(next),
            })?;

        let agreement_pct = count as f64 / categories.len() as f64 * 100.0;
        let tier = if agreement_pct >= self.cutoffs.high_agreement_pct {
            ConfidenceTier::High
        } else if agreement_pct >= self.cutoffs.medium_agreement_pct {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };

        Some(AgreementScore {
            dominant,
            agreement_pct,
            tier,
            valid_sources: categories.len(),
        })
    }

    /// Mean per-timestamp member standard deviation of `field` for one
    /// ensemble source over the bucket.
    ///
    /// Deterministic sources have no spread to measure; timestamps with
    /// fewer than two reporting members contribute nothing.
    pub fn score_spread(
        &self,
        series: &RawSeries,
        bucket: &TimeBucket,
        source: usize,
        field: FieldKind,
    ) -> Option<SpreadScore> {
        let descriptor = series.sources().get(source)?;
        let members = match descriptor.kind {
            SourceKind::Ensemble { members } if members >= 2 => members,
            _ => return None,
        };

        let rows = series.rows_where(|ts| bucket.contains(ts));
        let mut per_row_std = Vec::with_capacity(rows.len());
        for row in rows {
            let values: Vec<f64> = (0..members)
                .filter_map(|m| series.value(source, field, m, row))
                .collect();
            if values.len() >= 2 {
                per_row_std.push(values.iter().std_dev());
            }
        }
        if per_row_std.is_empty() {
            return None;
        }

        let mean_std_dev = per_row_std.iter().mean();
        let tier = if mean_std_dev < self.cutoffs.high_spread_std {
            ConfidenceTier::High
        } else if mean_std_dev < self.cutoffs.medium_spread_std {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };

        Some(SpreadScore {
            source_id: descriptor.id.clone(),
            mean_std_dev,
            tier,
        })
    }
}
