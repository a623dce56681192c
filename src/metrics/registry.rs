//! Prometheus metric definitions for the dish and the exporter itself.

use prometheus::{
    exponential_buckets, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use super::outages::CauseSummary;
use crate::dish::{DeviceIdentity, StatusSnapshot};
use crate::error::{ExporterError, Result};

pub const NAMESPACE: &str = "starlink";
const DISHY: &str = "dishy";
const EXPORTER: &str = "exporter";

/// Label names of the bootcount gauge, matching [`DeviceIdentity::label_values`].
pub const IDENTITY_LABELS: [&str; 5] = [
    "id",
    "hardware_version",
    "software_version",
    "manufactured_version",
    "country_code",
];

/// Every metric the exporter publishes, registered on a private registry.
pub struct DishMetrics {
    registry: Registry,

    // Device info
    pub bootcount: GaugeVec,

    // Status
    pub uptime_sec: Gauge,
    pub gps_valid: Gauge,
    pub gps_sats: Gauge,
    pub alert_status: GaugeVec,
    pub currently_obstructed: Gauge,
    pub fraction_obstructed: Gauge,
    pub avg_obstruction_duration_sec: Gauge,
    pub outage: Gauge,
    pub pop_ping_drop_rate: Gauge,
    pub pop_ping_latency_ms: Gauge,
    pub uplink_throughput_bps: Gauge,
    pub downlink_throughput_bps: Gauge,
    pub boresight_azimuth_deg: Gauge,
    pub boresight_elevation_deg: Gauge,
    pub eth_speed_mbps: Gauge,
    pub seconds_to_first_nonempty_slot: Gauge,

    // History
    pub outages: GaugeVec,
    pub outage_duration_sec_sum: GaugeVec,
    pub outage_duration_sec_avg: GaugeVec,
    pub outage_times: Histogram,

    // Exporter
    pub grpc_time: Histogram,
    pub update_time: Histogram,
    pub updates: IntCounter,
    pub requests: IntCounter,
    pub failures: IntCounter,
    pub failing: IntGauge,
}

impl DishMetrics {
    /// Create and register all metrics on a fresh registry.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let r = &registry;

        Ok(Self {
            bootcount: gauge_vec(r, DISHY, "bootcount", "Boot count of the dish", &IDENTITY_LABELS)?,

            uptime_sec: gauge(r, DISHY, "uptime_sec", "Seconds since the dish booted")?,
            gps_valid: gauge(r, DISHY, "gps_valid", "Boolean indicator for GPS valid")?,
            gps_sats: gauge(r, DISHY, "gps_sats", "Number of available GPS satellites")?,
            alert_status: gauge_vec(
                r,
                DISHY,
                "alert_status",
                "Boolean, whether the named alert is raised",
                &["alert"],
            )?,
            currently_obstructed: gauge(
                r,
                DISHY,
                "currently_obstructed",
                "Boolean, dish view currently obstructed",
            )?,
            fraction_obstructed: gauge(
                r,
                DISHY,
                "fraction_obstructed",
                "Fraction of the sky view that is obstructed",
            )?,
            avg_obstruction_duration_sec: gauge(
                r,
                DISHY,
                "avg_obstruction_duration_sec",
                "Average duration of prolonged obstructions",
            )?,
            outage: gauge(r, DISHY, "outage", "Boolean, dish is currently in an outage")?,
            pop_ping_drop_rate: gauge(r, DISHY, "pop_ping_drop_rate", "Ping drop rate to the PoP")?,
            pop_ping_latency_ms: gauge(
                r,
                DISHY,
                "pop_ping_latency_ms",
                "Ping latency to the PoP in milliseconds",
            )?,
            uplink_throughput_bps: gauge(r, DISHY, "uplink_throughput_bps", "Uplink throughput")?,
            downlink_throughput_bps: gauge(
                r,
                DISHY,
                "downlink_throughput_bps",
                "Downlink throughput",
            )?,
            boresight_azimuth_deg: gauge(
                r,
                DISHY,
                "boresight_azimuth_deg",
                "Current azimuth of the dish",
            )?,
            boresight_elevation_deg: gauge(
                r,
                DISHY,
                "boresight_elevation_deg",
                "Current elevation of the dish",
            )?,
            eth_speed_mbps: gauge(r, DISHY, "eth_speed_mbps", "Negotiated ethernet speed")?,
            seconds_to_first_nonempty_slot: gauge(
                r,
                DISHY,
                "seconds_to_first_nonempty_slot",
                "Seconds until the next scheduled satellite slot",
            )?,

            outages: gauge_vec(
                r,
                DISHY,
                "outages",
                "Outages in the current history window by cause",
                &["cause"],
            )?,
            outage_duration_sec_sum: gauge_vec(
                r,
                DISHY,
                "outage_duration_sec_sum",
                "Total outage duration in the current history window by cause",
                &["cause"],
            )?,
            outage_duration_sec_avg: gauge_vec(
                r,
                DISHY,
                "outage_duration_sec_avg",
                "Average outage duration in the current history window by cause",
                &["cause"],
            )?,
            outage_times: histogram(
                r,
                DISHY,
                "outage_times",
                "Durations of newly observed outages",
                exponential_buckets(0.25, 2.0, 15)?,
            )?,

            grpc_time: histogram(
                r,
                EXPORTER,
                "grpc_time",
                "Duration of gRPC calls to the dish",
                exponential_buckets(0.005, 2.0, 12)?,
            )?,
            update_time: histogram(
                r,
                EXPORTER,
                "update_time",
                "Duration of a full update cycle",
                exponential_buckets(0.01, 2.0, 12)?,
            )?,
            updates: int_counter(r, EXPORTER, "updates", "Completed update cycles")?,
            requests: int_counter(r, EXPORTER, "requests", "gRPC requests made to the dish")?,
            failures: int_counter(r, EXPORTER, "failures", "Failed gRPC requests")?,
            failing: int_gauge(
                r,
                EXPORTER,
                "failing",
                "Boolean, the most recent gRPC request failed",
            )?,

            registry,
        })
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ExporterError::Metrics(prometheus::Error::Msg(e.to_string())))
    }

    pub fn record_bootcount(&self, identity: &DeviceIdentity, bootcount: i32) {
        self.bootcount
            .with_label_values(&identity.label_values())
            .set(f64::from(bootcount));
    }

    pub fn record_status(&self, status: &StatusSnapshot) {
        self.uptime_sec.set(status.uptime_s as f64);
        self.gps_valid.set(flag(status.gps_valid));
        self.gps_sats.set(f64::from(status.gps_sats));

        for (alert, raised) in status.alerts.iter() {
            self.alert_status.with_label_values(&[alert]).set(flag(raised));
        }

        self.currently_obstructed.set(flag(status.currently_obstructed));
        self.fraction_obstructed.set(f64::from(status.fraction_obstructed));
        self.avg_obstruction_duration_sec
            .set(f64::from(status.avg_obstruction_duration_s));
        self.outage.set(flag(status.in_outage()));
        self.pop_ping_drop_rate.set(f64::from(status.pop_ping_drop_rate));
        self.pop_ping_latency_ms.set(f64::from(status.pop_ping_latency_ms));
        self.uplink_throughput_bps.set(f64::from(status.uplink_throughput_bps));
        self.downlink_throughput_bps.set(f64::from(status.downlink_throughput_bps));
        self.boresight_azimuth_deg.set(f64::from(status.boresight_azimuth_deg));
        self.boresight_elevation_deg.set(f64::from(status.boresight_elevation_deg));
        self.eth_speed_mbps.set(f64::from(status.eth_speed_mbps));
        self.seconds_to_first_nonempty_slot
            .set(f64::from(status.seconds_to_first_nonempty_slot));
    }

    /// Overwrite the per-cause gauges. Causes missing from `summaries` keep
    /// whatever they were last set to.
    pub fn record_cause_summaries(&self, summaries: &[CauseSummary]) {
        for summary in summaries {
            let labels = [summary.cause.as_str()];
            self.outages
                .with_label_values(&labels)
                .set(summary.count as f64);
            self.outage_duration_sec_sum
                .with_label_values(&labels)
                .set(summary.total_secs());
            self.outage_duration_sec_avg
                .with_label_values(&labels)
                .set(summary.average_secs());
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn opts(subsystem: &str, name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE).subsystem(subsystem)
}

fn gauge(registry: &Registry, subsystem: &str, name: &str, help: &str) -> Result<Gauge> {
    let gauge = Gauge::with_opts(opts(subsystem, name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn gauge_vec(
    registry: &Registry,
    subsystem: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(opts(subsystem, name, help), labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn int_gauge(registry: &Registry, subsystem: &str, name: &str, help: &str) -> Result<IntGauge> {
    let gauge = IntGauge::with_opts(opts(subsystem, name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn int_counter(registry: &Registry, subsystem: &str, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::with_opts(opts(subsystem, name, help))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn histogram(
    registry: &Registry,
    subsystem: &str,
    name: &str,
    help: &str,
    buckets: Vec<f64>,
) -> Result<Histogram> {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem(subsystem)
            .buckets(buckets),
    )?;
    registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}
