use crate::analysis::aggregate::SourceSummary;
use crate::data::codes;
use serde::{Deserialize, Serialize};

/// Thresholds separating a stable outlook from an early warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Worst-case bucket precipitation (mm) at or above which a warning fires.
    pub precipitation_mm: f64,
    /// Worst-case weather code at or above which a warning fires.
    /// 61 is the lowest code of the rain family.
    pub storm_code: u16,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            precipitation_mm: 5.0,
            storm_code: 61,
        }
    }
}

/// Per-bucket alert outcome.
///
/// Both variants carry the worst-case magnitude and condition so the
/// presentation layer can phrase "worst member sees X" either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AlertState {
    Warning {
        peak_precipitation_mm: f64,
        worst_condition: String,
    },
    Stable {
        peak_precipitation_mm: f64,
        worst_condition: String,
    },
}

impl AlertState {
    pub fn is_warning(&self) -> bool {
        matches!(self, AlertState::Warning { .. })
    }

    pub fn peak_precipitation_mm(&self) -> f64 {
        match self {
            AlertState::Warning {
                peak_precipitation_mm,
                ..
            }
            | AlertState::Stable {
                peak_precipitation_mm,
                ..
            } => *peak_precipitation_mm,
        }
    }

    pub fn worst_condition(&self) -> &str {
        match self {
            AlertState::Warning {
                worst_condition, ..
            }
            | AlertState::Stable {
                worst_condition, ..
            } => worst_condition,
        }
    }
}

/// Applies fixed thresholds to a bucket's worst-case magnitudes.
///
/// Stateless across buckets and runs; a warning in one bucket says nothing
/// about the next.
#[derive(Debug, Clone, Default)]
pub struct AlertEngine {
    thresholds: AlertThresholds,
}

impl AlertEngine {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify one bucket from its source summaries.
    ///
    /// The precipitation branch looks at the maximum worst-member total
    /// across sources; the code branch at the maximum worst-case code.
    /// Either alone is enough to warn.
    pub fn evaluate(&self, summaries: &[SourceSummary]) -> AlertState {
        let peak_precipitation_mm = summaries
            .iter()
            .filter_map(|s| s.precipitation_mm)
            .fold(0.0, f64::max);
        let worst_code = summaries.iter().filter_map(|s| s.worst_code).max();

        let worst_condition = worst_code
            .map(codes::describe)
            .unwrap_or_else(|| "N/A".to_string());

        let code_triggered = worst_code.map_or(false, |c| c >= self.thresholds.storm_code);
        if peak_precipitation_mm >= self.thresholds.precipitation_mm || code_triggered {
            AlertState::Warning {
                peak_precipitation_mm,
                worst_condition,
            }
        } else {
            AlertState::Stable {
                peak_precipitation_mm,
                worst_condition,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(precipitation_mm: Option<f64>, worst_code: Option<u16>) -> SourceSummary {
        SourceSummary {
            source_id: "ecmwf_ifs".to_string(),
            temperature: None,
            humidity: None,
            wind_speed: None,
            wind_octant: None,
            precipitation_mm,
            rain_probability_pct: None,
            dominant_code: worst_code,
            worst_code,
        }
    }

    fn engine() -> AlertEngine {
        AlertEngine::new(AlertThresholds::default())
    }

    #[test]
    fn test_precipitation_at_threshold_warns() {
        let state = engine().evaluate(&[summary(Some(5.0), Some(3))]);
        assert!(state.is_warning());
        assert_eq!(state.peak_precipitation_mm(), 5.0);
    }

    #[test]
    fn test_just_below_threshold_with_cloudy_code_stays_stable() {
        let state = engine().evaluate(&[summary(Some(4.99), Some(3))]);
        assert!(!state.is_warning());
        assert_eq!(state.worst_condition(), "Overcast");
    }

    #[test]
    fn test_rain_code_alone_warns() {
        let state = engine().evaluate(&[summary(Some(0.0), Some(61))]);
        assert!(state.is_warning());
        assert_eq!(state.worst_condition(), "Light Rain");
    }

    #[test]
    fn test_worst_case_taken_across_sources() {
        let state = engine().evaluate(&[
            summary(Some(0.2), Some(2)),
            summary(Some(7.5), Some(3)),
            summary(Some(1.0), Some(1)),
        ]);
        assert!(state.is_warning());
        assert_eq!(state.peak_precipitation_mm(), 7.5);
    }

    #[test]
    fn test_storm_code_names_the_condition() {
        let state = engine().evaluate(&[summary(Some(12.0), Some(95))]);
        assert!(state.is_warning());
        assert_eq!(state.worst_condition(), "Thunderstorm");
    }

    #[test]
    fn test_sources_without_data_stay_stable() {
        let state = engine().evaluate(&[summary(None, None)]);
        assert!(!state.is_warning());
        assert_eq!(state.peak_precipitation_mm(), 0.0);
        assert_eq!(state.worst_condition(), "N/A");
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = AlertEngine::new(AlertThresholds {
            precipitation_mm: 1.0,
            storm_code: 95,
        });
        assert!(strict.evaluate(&[summary(Some(1.2), Some(2))]).is_warning());
        assert!(!strict.evaluate(&[summary(Some(0.5), Some(63))]).is_warning());
    }
}
