pub mod analysis;
pub mod data;
pub mod pipeline;
pub mod provider;
pub mod utils;

// Re-export commonly used types
pub use analysis::{
    AgreementScore, AlertEngine, AlertState, AlertThresholds, ConfidenceTier, ConsensusResult,
    ConsensusScorer, DayPart, FieldRange, MemberAggregator, SourceSummary, SpreadScore,
    TierCutoffs, TimeBucket, TimeBucketer,
};
pub use data::{
    FieldKind, RawSeries, RawSeriesBuilder, SeriesError, SkyCategory, SourceDescriptor, SourceKind,
};
pub use pipeline::{BucketReport, Pipeline};
pub use provider::{
    FetchCache, FetchError, FetchedForecast, ForecastRequest, GeocodingClient, Location,
    OpenMeteoClient,
};
pub use utils::Config;
