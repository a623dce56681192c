//! Decoded dish data, independent of the wire representation.

use serde::{Deserialize, Serialize};

use super::proto;

/// Identity of the dish, captured once at startup and used to label metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Serial identifier
    pub id: String,
    /// ISO country code the dish reports
    pub country_code: String,
    pub hardware_version: String,
    pub software_version: String,
    pub manufactured_version: String,
}

impl DeviceIdentity {
    /// Label values in the order the bootcount gauge declares its label names.
    pub fn label_values(&self) -> [&str; 5] {
        [
            &self.id,
            &self.hardware_version,
            &self.software_version,
            &self.manufactured_version,
            &self.country_code,
        ]
    }
}

/// Result of a device-info call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identity: DeviceIdentity,
    /// Number of times the dish has booted
    pub bootcount: i32,
}

impl From<proto::DeviceInfo> for DeviceInfo {
    fn from(info: proto::DeviceInfo) -> Self {
        Self {
            identity: DeviceIdentity {
                id: info.id,
                country_code: info.country_code,
                hardware_version: info.hardware_version,
                software_version: info.software_version,
                manufactured_version: info.manufactured_version,
            },
            bootcount: info.bootcount,
        }
    }
}

/// Alert flags raised by the dish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishAlerts {
    pub motors_stuck: bool,
    pub thermal_throttle: bool,
    pub thermal_shutdown: bool,
    pub mast_not_near_vertical: bool,
    pub unexpected_location: bool,
    pub slow_ethernet_speeds: bool,
    pub roaming: bool,
}

/// Alert name paired with the accessor that reads it.
pub type AlertAccessor = (&'static str, fn(&DishAlerts) -> bool);

/// Every alert the exporter reports, keyed by its label value.
pub const ALERTS: [AlertAccessor; 7] = [
    ("motors_stuck", |a: &DishAlerts| a.motors_stuck),
    ("thermal_throttle", |a: &DishAlerts| a.thermal_throttle),
    ("thermal_shutdown", |a: &DishAlerts| a.thermal_shutdown),
    ("mast_not_near_vertical", |a: &DishAlerts| a.mast_not_near_vertical),
    ("unexpected_location", |a: &DishAlerts| a.unexpected_location),
    ("slow_ethernet_speeds", |a: &DishAlerts| a.slow_ethernet_speeds),
    ("roaming", |a: &DishAlerts| a.roaming),
];

impl DishAlerts {
    /// Iterate over `(alert name, raised)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        ALERTS.iter().map(move |(name, get)| (*name, get(self)))
    }

    pub fn any(&self) -> bool {
        self.iter().any(|(_, raised)| raised)
    }
}

impl From<proto::DishAlerts> for DishAlerts {
    fn from(alerts: proto::DishAlerts) -> Self {
        Self {
            motors_stuck: alerts.motors_stuck,
            thermal_throttle: alerts.thermal_throttle,
            thermal_shutdown: alerts.thermal_shutdown,
            mast_not_near_vertical: alerts.mast_not_near_vertical,
            unexpected_location: alerts.unexpected_location,
            slow_ethernet_speeds: alerts.slow_ethernet_speeds,
            roaming: alerts.roaming,
        }
    }
}

/// One decoded status poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub uptime_s: u64,
    pub gps_valid: bool,
    pub gps_sats: u32,
    pub alerts: DishAlerts,
    pub currently_obstructed: bool,
    /// Fraction of the sky obstructed (0.0 to 1.0)
    pub fraction_obstructed: f32,
    pub avg_obstruction_duration_s: f32,
    /// Outage in progress, if any
    pub outage: Option<OutageRecord>,
    pub pop_ping_drop_rate: f32,
    pub pop_ping_latency_ms: f32,
    pub uplink_throughput_bps: f32,
    pub downlink_throughput_bps: f32,
    pub boresight_azimuth_deg: f32,
    pub boresight_elevation_deg: f32,
    pub eth_speed_mbps: i32,
    pub seconds_to_first_nonempty_slot: f32,
}

impl StatusSnapshot {
    pub fn in_outage(&self) -> bool {
        self.outage.is_some()
    }
}

impl From<proto::DishGetStatusResponse> for StatusSnapshot {
    fn from(status: proto::DishGetStatusResponse) -> Self {
        let gps = status.gps_stats.unwrap_or_default();
        let obstruction = status.obstruction_stats.unwrap_or_default();

        Self {
            uptime_s: status.device_state.unwrap_or_default().uptime_s,
            gps_valid: gps.gps_valid,
            gps_sats: gps.gps_sats,
            alerts: status.alerts.unwrap_or_default().into(),
            currently_obstructed: obstruction.currently_obstructed,
            fraction_obstructed: obstruction.fraction_obstructed,
            avg_obstruction_duration_s: obstruction.avg_prolonged_obstruction_duration_s,
            outage: status.outage.map(OutageRecord::from),
            pop_ping_drop_rate: status.pop_ping_drop_rate,
            pop_ping_latency_ms: status.pop_ping_latency_ms,
            uplink_throughput_bps: status.uplink_throughput_bps,
            downlink_throughput_bps: status.downlink_throughput_bps,
            boresight_azimuth_deg: status.boresight_azimuth_deg,
            boresight_elevation_deg: status.boresight_elevation_deg,
            eth_speed_mbps: status.eth_speed_mbps,
            seconds_to_first_nonempty_slot: status.seconds_to_first_nonempty_slot,
        }
    }
}

/// A single entry of the dish's outage history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageRecord {
    /// Outage start, nanoseconds since the Unix epoch
    pub start_timestamp_ns: i64,
    pub duration_ns: u64,
    /// Cause as reported by the dish, e.g. `OBSTRUCTED`
    pub cause: String,
    /// Whether the dish switched satellites during the outage
    pub did_switch: bool,
}

impl OutageRecord {
    pub fn duration_secs(&self) -> f64 {
        self.duration_ns as f64 / 1e9
    }

    /// Outage start as a UTC timestamp.
    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_nanos(self.start_timestamp_ns)
    }
}

impl From<proto::DishOutage> for OutageRecord {
    fn from(outage: proto::DishOutage) -> Self {
        Self {
            start_timestamp_ns: outage.start_timestamp_ns,
            duration_ns: outage.duration_ns,
            cause: outage.cause().as_str_name().to_string(),
            did_switch: outage.did_switch,
        }
    }
}

/// Outage history window, oldest entry first as the dish returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryWindow {
    pub outages: Vec<OutageRecord>,
    /// Recent ping drop rate samples from the dish's ring buffer
    pub pop_ping_drop_rate: Vec<f32>,
}

impl From<proto::DishGetHistoryResponse> for HistoryWindow {
    fn from(history: proto::DishGetHistoryResponse) -> Self {
        Self {
            outages: history.outages.into_iter().map(OutageRecord::from).collect(),
            pop_ping_drop_rate: history.pop_ping_drop_rate,
        }
    }
}
