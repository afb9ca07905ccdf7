pub mod codes;
pub mod series;

pub use codes::{compass_octant, describe, SkyCategory, OCTANTS};
pub use series::{
    ColumnKey, FieldKind, RawSeries, RawSeriesBuilder, SeriesError, SourceDescriptor, SourceKind,
};
