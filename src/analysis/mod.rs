pub mod aggregate;
pub mod alert;
pub mod buckets;
pub mod consensus;

pub use aggregate::{FieldRange, MemberAggregator, SourceSummary};
pub use alert::{AlertEngine, AlertState, AlertThresholds};
pub use buckets::{DayPart, TimeBucket, TimeBucketer};
pub use consensus::{
    AgreementScore, ConfidenceTier, ConsensusResult, ConsensusScorer, SpreadScore, TierCutoffs,
};
