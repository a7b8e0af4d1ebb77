pub mod driver;
pub mod report;

pub use driver::{aggregate, AggregateError, AggregationSettings, Aggregator};
pub use report::{AggregationReport, BatchFailure};
