//! # Starlink Exporter
//!
//! Polls a Starlink dish over its local gRPC endpoint and republishes its
//! telemetry as Prometheus metrics.
//!
//! ## Features
//!
//! - **Dish telemetry**: GPS, alerts, obstruction, throughput, latency and pointing
//! - **Outage history**: new outages counted once into a histogram, plus
//!   per-cause totals over the dish's rolling history window
//! - **Self metrics**: request, failure and timing metrics for the exporter
//! - **Graceful shutdown**: an in-flight update always completes before exit
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use starlink_exporter::{exporter, ExporterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExporterConfig::from_args("192.168.100.1:9200", "30s", "0.0.0.0:9817")?;
//!     exporter::run(config, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dish;
pub mod error;
pub mod exporter;
pub mod metrics;
pub mod web;

// Re-export public API
pub use config::ExporterConfig;
pub use dish::{
    DeviceIdentity, DeviceInfo, DishAlerts, DishClient, GrpcDishClient, HistoryWindow,
    OutageRecord, RequestKind, StatusSnapshot,
};
pub use error::{ExporterError, Result};
pub use metrics::{CycleReport, DishMetrics, Poller};
pub use web::create_app;
