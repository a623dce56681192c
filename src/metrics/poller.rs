//! One update cycle: query the dish and translate the answers into metrics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use super::outages::{summarize_by_cause, OutageTracker};
use super::registry::DishMetrics;
use crate::dish::{DeviceIdentity, DishClient, HistoryWindow, RequestKind};
use crate::error::Result;

/// Outcome of a single [`Poller::run_cycle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Calls that failed, in the order they were made
    pub failed: Vec<RequestKind>,
    /// Outages counted for the first time in this cycle
    pub new_outages: usize,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process-wide polling state: the dish connection, the metrics it feeds,
/// the identity captured at startup and the outage watermark.
pub struct Poller<C> {
    client: C,
    metrics: Arc<DishMetrics>,
    identity: DeviceIdentity,
    outages: OutageTracker,
}

impl<C: DishClient> Poller<C> {
    pub fn new(client: C, metrics: Arc<DishMetrics>, identity: DeviceIdentity) -> Self {
        Self {
            client,
            metrics,
            identity,
            outages: OutageTracker::new(),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn watermark(&self) -> i64 {
        self.outages.watermark()
    }

    pub fn metrics(&self) -> &Arc<DishMetrics> {
        &self.metrics
    }

    /// Run the info, status and history calls in sequence. A failed call
    /// only skips its own metric updates.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();

        if let Err(kind) = self.update_info().await {
            report.failed.push(kind);
        }
        if let Err(kind) = self.update_status().await {
            report.failed.push(kind);
        }
        match self.update_history().await {
            Ok(new_outages) => report.new_outages = new_outages,
            Err(kind) => report.failed.push(kind),
        }

        report.elapsed = started.elapsed();
        self.metrics.update_time.observe(report.elapsed.as_secs_f64());
        self.metrics.updates.inc();
        debug!(
            elapsed_ms = report.elapsed.as_millis() as u64,
            failed = report.failed.len(),
            new_outages = report.new_outages,
            "Update cycle complete"
        );

        report
    }

    /// Refresh the bootcount gauge.
    pub async fn update_info(&mut self) -> std::result::Result<(), RequestKind> {
        let started = Instant::now();
        let result = self.client.device_info().await;
        let info = self.account(RequestKind::DeviceInfo, started, result)?;

        // Labels stay those captured at startup even if the dish reports new ones.
        self.metrics.record_bootcount(&self.identity, info.bootcount);
        Ok(())
    }

    pub async fn update_status(&mut self) -> std::result::Result<(), RequestKind> {
        let started = Instant::now();
        let result = self.client.status().await;
        let status = self.account(RequestKind::Status, started, result)?;

        self.metrics.record_status(&status);
        Ok(())
    }

    /// Returns the number of outages counted for the first time.
    pub async fn update_history(&mut self) -> std::result::Result<usize, RequestKind> {
        let started = Instant::now();
        let result = self.client.history().await;
        let history = self.account(RequestKind::History, started, result)?;

        Ok(self.record_history(&history))
    }

    /// Count new outages into the histogram and rebuild the per-cause gauges.
    fn record_history(&mut self, history: &HistoryWindow) -> usize {
        let fresh = self.outages.advance(&history.outages);
        for outage in &fresh {
            self.metrics.outage_times.observe(outage.duration_secs());
        }

        self.metrics
            .record_cause_summaries(&summarize_by_cause(&history.outages));

        fresh.len()
    }

    /// Update request accounting for one call and log a failure.
    fn account<T>(
        &self,
        kind: RequestKind,
        started: Instant,
        result: Result<T>,
    ) -> std::result::Result<T, RequestKind> {
        self.metrics.requests.inc();
        self.metrics
            .grpc_time
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(value) => {
                self.metrics.failing.set(0);
                Ok(value)
            }
            Err(error) => {
                self.metrics.failing.set(1);
                self.metrics.failures.inc();
                if error.is_transient() {
                    warn!(request = %kind, %error, "Dish request failed");
                } else {
                    error!(request = %kind, %error, "Dish request failed");
                }
                Err(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dish::fake::FakeDish;
    use crate::dish::{DeviceInfo, OutageRecord, StatusSnapshot};
    use crate::error::ExporterError;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            id: "ut01000000-00000000-00abcdef".to_string(),
            country_code: "AU".to_string(),
            hardware_version: "rev3_proto2".to_string(),
            software_version: "5a1d0f7b.uterm.release".to_string(),
            manufactured_version: "rev3".to_string(),
        }
    }

    fn outage(start: i64, secs: u64, cause: &str) -> OutageRecord {
        OutageRecord {
            start_timestamp_ns: start,
            duration_ns: secs * 1_000_000_000,
            cause: cause.to_string(),
            did_switch: false,
        }
    }

    fn timeout(request: RequestKind) -> ExporterError {
        ExporterError::Timeout { request }
    }

    fn poller(dish: &FakeDish) -> Poller<FakeDish> {
        Poller::new(
            dish.clone(),
            Arc::new(DishMetrics::new().unwrap()),
            identity(),
        )
    }

    #[tokio::test]
    async fn test_history_failure_does_not_stop_other_calls() {
        let dish = FakeDish::new();
        dish.push_device_info(Ok(DeviceInfo {
            identity: identity(),
            bootcount: 3,
        }));
        dish.push_status(Ok(StatusSnapshot {
            gps_sats: 9,
            ..Default::default()
        }));
        dish.push_history(Err(timeout(RequestKind::History)));
        let mut poller = poller(&dish);

        let report = poller.run_cycle().await;

        assert_eq!(report.failed, vec![RequestKind::History]);
        let metrics = poller.metrics();
        assert_eq!(metrics.gps_sats.get(), 9.0);
        assert_eq!(metrics.requests.get(), 3);
        assert_eq!(metrics.failures.get(), 1);
        assert_eq!(metrics.failing.get(), 1);
        assert_eq!(metrics.updates.get(), 1);
        assert_eq!(metrics.grpc_time.get_sample_count(), 3);
        assert_eq!(metrics.update_time.get_sample_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_clears_after_successful_call() {
        let dish = FakeDish::new();
        dish.push_device_info(Err(timeout(RequestKind::DeviceInfo)));
        dish.push_status(Ok(StatusSnapshot::default()));
        dish.push_history(Ok(HistoryWindow::default()));
        let mut poller = poller(&dish);

        let report = poller.run_cycle().await;

        assert_eq!(report.failed, vec![RequestKind::DeviceInfo]);
        assert_eq!(poller.metrics().failing.get(), 0);
        assert_eq!(poller.metrics().failures.get(), 1);
    }

    #[tokio::test]
    async fn test_history_scenario_over_two_polls() {
        let window = HistoryWindow {
            outages: vec![outage(100, 5, "X"), outage(200, 10, "X"), outage(300, 3, "Y")],
            ..Default::default()
        };
        let dish = FakeDish::new();
        dish.push_history(Ok(window.clone()));
        dish.push_history(Ok(window));
        let mut poller = poller(&dish);

        assert_eq!(poller.update_history().await, Ok(3));
        assert_eq!(poller.watermark(), 300);

        let metrics = poller.metrics().clone();
        assert_eq!(metrics.outage_times.get_sample_count(), 3);
        assert!((metrics.outage_times.get_sample_sum() - 18.0).abs() < 1e-9);

        assert_eq!(poller.update_history().await, Ok(0));
        assert_eq!(poller.watermark(), 300);
        assert_eq!(metrics.outage_times.get_sample_count(), 3);

        assert_eq!(metrics.outages.with_label_values(&["X"]).get(), 2.0);
        assert_eq!(metrics.outages.with_label_values(&["Y"]).get(), 1.0);
        assert_eq!(
            metrics.outage_duration_sec_sum.with_label_values(&["X"]).get(),
            15.0
        );
        assert_eq!(
            metrics.outage_duration_sec_avg.with_label_values(&["X"]).get(),
            7.5
        );
        assert_eq!(
            metrics.outage_duration_sec_avg.with_label_values(&["Y"]).get(),
            3.0
        );
    }
}
