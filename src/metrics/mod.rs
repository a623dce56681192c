//! Metric definitions and the polling logic that feeds them.
//!
//! [`DishMetrics`] owns the Prometheus registry; [`Poller`] runs update
//! cycles against a [`DishClient`](crate::dish::DishClient) and writes the
//! results into it. Outage deduplication lives in [`outages`].

pub mod outages;
pub mod poller;
pub mod registry;

// Re-export commonly used items
pub use outages::{summarize_by_cause, CauseSummary, OutageTracker};
pub use poller::{CycleReport, Poller};
pub use registry::DishMetrics;
