mod aggregator;
pub use aggregator::SampleAggregator;
pub mod extract;
pub use extract::{ColumnSpec, Series};
mod layout;
pub use layout::{report_repetition, ResultsLayout};
mod report;
pub use report::MeasurementSample;
mod stats;
pub use stats::{Aggregate, Rollup, SampleSet};
pub mod tables;
pub use tables::{BenchmarkRow, RollupRow};
