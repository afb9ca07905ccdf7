use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Base forecast fields a source can report.
///
/// Each field maps to exactly one Open-Meteo hourly variable; the wire
/// name is composed with the source/member suffix once, in the provider
/// layer, never by ad hoc string concatenation at access time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Temperature,
    Humidity,
    WindSpeed,
    WindDirection,
    Precipitation,
    WeatherCode,
}

impl FieldKind {
    /// All fields, in a fixed order (used when building request variable lists).
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Temperature,
        FieldKind::Humidity,
        FieldKind::WindSpeed,
        FieldKind::WindDirection,
        FieldKind::Precipitation,
        FieldKind::WeatherCode,
    ];

    /// Open-Meteo hourly variable name for this field.
    pub fn wire_name(&self) -> &'static str {
        match self {
            FieldKind::Temperature => "temperature_2m",
            FieldKind::Humidity => "relative_humidity_2m",
            FieldKind::WindSpeed => "wind_speed_10m",
            FieldKind::WindDirection => "wind_direction_10m",
            FieldKind::Precipitation => "precipitation",
            FieldKind::WeatherCode => "weather_code",
        }
    }
}

/// How a source produces values: one deterministic run, or M perturbed members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Deterministic,
    Ensemble { members: usize },
}

/// A declared forecast source: a named model or ensemble, its kind, and the
/// base fields it reports.
///
/// Sparse availability is expected - a source may declare fewer fields than
/// the full set, and the aggregator treats undeclared fields as unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub kind: SourceKind,
    pub fields: Vec<FieldKind>,
}

impl SourceDescriptor {
    /// A single-run numerical model.
    pub fn deterministic(id: impl Into<String>, fields: Vec<FieldKind>) -> Self {
        Self {
            id: id.into(),
            kind: SourceKind::Deterministic,
            fields,
        }
    }

    /// An ensemble with a declared member count.
    ///
    /// The declared count is also the denominator for probability
    /// computations, even when some members are missing data.
    pub fn ensemble(id: impl Into<String>, members: usize, fields: Vec<FieldKind>) -> Self {
        Self {
            id: id.into(),
            kind: SourceKind::Ensemble { members },
            fields,
        }
    }

    /// Number of parallel value sequences per field (1 for deterministic).
    pub fn member_count(&self) -> usize {
        match self.kind {
            SourceKind::Deterministic => 1,
            SourceKind::Ensemble { members } => members,
        }
    }

    /// Whether this source declares the given field.
    pub fn reports(&self, field: FieldKind) -> bool {
        self.fields.contains(&field)
    }
}

/// Typed address of one value column: (source index, field, member index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub source: usize,
    pub field: FieldKind,
    pub member: usize,
}

/// Errors raised while assembling a [`RawSeries`].
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("timestamps must be strictly increasing")]
    NonMonotonicIndex,

    #[error("column {field:?} for source '{source_id}' has {got} values, expected {expected}")]
    LengthMismatch {
        source_id: String,
        field: FieldKind,
        got: usize,
        expected: usize,
    },

    #[error("source '{source_id}' does not declare field {field:?}")]
    UndeclaredField { source_id: String, field: FieldKind },

    #[error("member index {member} out of range for source '{source_id}'")]
    MemberOutOfRange { source_id: String, member: usize },

    #[error("source index {0} out of range")]
    SourceOutOfRange(usize),
}

/// One fetched forecast dataset: a shared timestamp index plus one value
/// column per (source, field, member).
///
/// Every column is exactly as long as the index; a missing measurement is an
/// explicit `None`, never zero. Immutable once built - each pipeline run
/// consumes a snapshot and the snapshot is discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    timestamps: Vec<NaiveDateTime>,
    sources: Vec<SourceDescriptor>,
    columns: HashMap<ColumnKey, Vec<Option<f64>>>,
}

impl RawSeries {
    /// Start building a series over the given timestamp index.
    pub fn builder(timestamps: Vec<NaiveDateTime>) -> Result<RawSeriesBuilder, SeriesError> {
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SeriesError::NonMonotonicIndex);
        }
        Ok(RawSeriesBuilder {
            series: RawSeries {
                timestamps,
                sources: Vec::new(),
                columns: HashMap::new(),
            },
        })
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The value column for (source, field, member), if it was loaded.
    ///
    /// A source that declares a field may still lack the column when the
    /// upstream response omitted it; callers treat that as unavailable.
    pub fn column(&self, source: usize, field: FieldKind, member: usize) -> Option<&[Option<f64>]> {
        self.columns
            .get(&ColumnKey {
                source,
                field,
                member,
            })
            .map(|v| v.as_slice())
    }

    /// Single value lookup; `None` for absent columns and missing measurements alike.
    pub fn value(&self, source: usize, field: FieldKind, member: usize, row: usize) -> Option<f64> {
        self.column(source, field, member)
            .and_then(|col| col.get(row).copied().flatten())
    }

    /// Row indices whose timestamp satisfies the predicate, in index order.
    pub fn rows_where(&self, mut pred: impl FnMut(NaiveDateTime) -> bool) -> Vec<usize> {
        self.timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| pred(**ts))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Builder enforcing the series invariants: declared fields only, member
/// indices in range, column lengths equal to the index length.
pub struct RawSeriesBuilder {
    series: RawSeries,
}

impl RawSeriesBuilder {
    /// Declare a source and get its index for subsequent column pushes.
    pub fn add_source(&mut self, descriptor: SourceDescriptor) -> usize {
        self.series.sources.push(descriptor);
        self.series.sources.len() - 1
    }

    /// Attach one value column.
    pub fn push_column(
        &mut self,
        source: usize,
        field: FieldKind,
        member: usize,
        values: Vec<Option<f64>>,
    ) -> Result<(), SeriesError> {
        let descriptor = self
            .series
            .sources
            .get(source)
            .ok_or(SeriesError::SourceOutOfRange(source))?;

        if !descriptor.reports(field) {
            return Err(SeriesError::UndeclaredField {
                source_id: descriptor.id.clone(),
                field,
            });
        }
        if member >= descriptor.member_count() {
            return Err(SeriesError::MemberOutOfRange {
                source_id: descriptor.id.clone(),
                member,
            });
        }
        if values.len() != self.series.timestamps.len() {
            return Err(SeriesError::LengthMismatch {
                source_id: descriptor.id.clone(),
                field,
                got: values.len(),
                expected: self.series.timestamps.len(),
            });
        }

        self.series.columns.insert(
            ColumnKey {
                source,
                field,
                member,
            },
            values,
        );
        Ok(())
    }

    pub fn build(self) -> RawSeries {
        self.series
    }
}
