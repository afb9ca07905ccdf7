use crate::data::{FieldKind, RawSeries, SourceDescriptor, SourceKind};
use crate::provider::openmeteo::FetchError;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level Open-Meteo response, shared by the forecast and ensemble
/// endpoints. The hourly block is optional on the wire; its absence is the
/// "source data unavailable" failure.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub utc_offset_seconds: i64,
    pub hourly: Option<HourlyBlock>,
}

/// The hourly block: one `time` array plus one numeric array per variable.
///
/// Variable names are dynamic (`temperature_2m_gfs_seamless`,
/// `precipitation_member07`, ...) so everything except `time` lands in one
/// flattened map; the schema table picks out the declared columns.
#[derive(Debug, Deserialize)]
pub struct HourlyBlock {
    pub time: Vec<String>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

/// One fetched snapshot: the validated series plus the response metadata the
/// presentation layer needs (resolved timezone and UTC offset).
#[derive(Debug, Clone)]
pub struct FetchedForecast {
    pub series: RawSeries,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub utc_offset_seconds: i64,
}

impl FetchedForecast {
    /// Current wall-clock time expressed in the forecast's local timezone,
    /// as a naive timestamp comparable against the series index.
    pub fn local_now(&self) -> NaiveDateTime {
        (Utc::now() + Duration::seconds(self.utc_offset_seconds)).naive_utc()
    }
}

/// Maps every declared (source, field, member) to its wire column name.
///
/// Built exactly once per response; the rest of the crate addresses columns
/// by typed key only.
pub(crate) struct SchemaTable {
    entries: Vec<SchemaEntry>,
}

pub(crate) struct SchemaEntry {
    pub source: usize,
    pub field: FieldKind,
    pub member: usize,
    pub wire_name: String,
}

impl SchemaTable {
    pub fn build(sources: &[SourceDescriptor]) -> Self {
        let mut entries = Vec::new();
        for (source, descriptor) in sources.iter().enumerate() {
            for &field in &descriptor.fields {
                for member in 0..descriptor.member_count() {
                    let wire_name = match descriptor.kind {
                        // Multi-model responses suffix every variable with
                        // the model id.
                        SourceKind::Deterministic => {
                            format!("{}_{}", field.wire_name(), descriptor.id)
                        }
                        // Ensemble responses use the bare name for the
                        // control run and member suffixes for the rest.
                        SourceKind::Ensemble { .. } => {
                            if member == 0 {
                                field.wire_name().to_string()
                            } else {
                                format!("{}_member{:02}", field.wire_name(), member)
                            }
                        }
                    };
                    entries.push(SchemaEntry {
                        source,
                        field,
                        member,
                        wire_name,
                    });
                }
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }
}

/// Open-Meteo timestamps come as `2026-08-06T13:00`, occasionally with
/// seconds.
fn parse_wire_time(raw: &str) -> Result<NaiveDateTime, FetchError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| FetchError::MalformedTimestamp(raw.to_string()))
}

impl ForecastResponse {
    /// Validate the response against the declared sources and build the
    /// series.
    ///
    /// Declared columns absent from the response are left out (sparse
    /// availability is allowed and surfaces as unavailable fields); a
    /// missing hourly block fails the run atomically.
    pub fn into_series(self, sources: Vec<SourceDescriptor>) -> Result<FetchedForecast, FetchError> {
        let hourly = self.hourly.ok_or(FetchError::MissingSeries)?;

        let timestamps = hourly
            .time
            .iter()
            .map(|raw| parse_wire_time(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let schema = SchemaTable::build(&sources);
        let mut builder = RawSeries::builder(timestamps)?;
        for descriptor in sources {
            builder.add_source(descriptor);
        }
        for entry in schema.entries() {
            if let Some(values) = hourly.columns.get(&entry.wire_name) {
                builder.push_column(entry.source, entry.field, entry.member, values.clone())?;
            }
        }

        Ok(FetchedForecast {
            series: builder.build(),
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone,
            utc_offset_seconds: self.utc_offset_seconds,
        })
    }
}
