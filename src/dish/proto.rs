//! Wire types for the subset of the `SpaceX.API.Device` schema the exporter reads.
//!
//! The dish exposes a single unary RPC, `Device/Handle`, which takes a
//! [`Request`] carrying one request variant and answers with a [`Response`]
//! carrying the matching response variant. Only the fields this crate turns
//! into metrics are declared; unknown fields are skipped by the decoder.

/// Fully qualified path of the dish's request handler.
pub const HANDLE_PATH: &str = "/SpaceX.API.Device.Device/Handle";

#[derive(Clone, PartialEq, prost::Message)]
pub struct Request {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(oneof = "request::Request", tags = "1004, 1007, 1008")]
    pub request: Option<request::Request>,
}

pub mod request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Request {
        #[prost(message, tag = "1004")]
        GetStatus(super::GetStatusRequest),
        #[prost(message, tag = "1007")]
        GetHistory(super::GetHistoryRequest),
        #[prost(message, tag = "1008")]
        GetDeviceInfo(super::GetDeviceInfoRequest),
    }
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GetStatusRequest {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GetHistoryRequest {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GetDeviceInfoRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Response {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "3")]
    pub api_version: u64,
    #[prost(oneof = "response::Response", tags = "1004, 2004, 2006")]
    pub response: Option<response::Response>,
}

pub mod response {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Response {
        #[prost(message, tag = "1004")]
        GetDeviceInfo(super::GetDeviceInfoResponse),
        #[prost(message, tag = "2004")]
        DishGetStatus(super::DishGetStatusResponse),
        #[prost(message, tag = "2006")]
        DishGetHistory(super::DishGetHistoryResponse),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceInfoResponse {
    #[prost(message, optional, tag = "1")]
    pub device_info: Option<DeviceInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceInfo {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub hardware_version: String,
    #[prost(string, tag = "3")]
    pub software_version: String,
    #[prost(string, tag = "4")]
    pub country_code: String,
    #[prost(bool, tag = "7")]
    pub is_dev: bool,
    #[prost(int32, tag = "8")]
    pub bootcount: i32,
    #[prost(string, tag = "11")]
    pub manufactured_version: String,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct DeviceState {
    #[prost(uint64, tag = "1")]
    pub uptime_s: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DishGetStatusResponse {
    #[prost(message, optional, tag = "1")]
    pub device_info: Option<DeviceInfo>,
    #[prost(message, optional, tag = "2")]
    pub device_state: Option<DeviceState>,
    #[prost(float, tag = "1002")]
    pub seconds_to_first_nonempty_slot: f32,
    #[prost(float, tag = "1003")]
    pub pop_ping_drop_rate: f32,
    #[prost(message, optional, tag = "1004")]
    pub obstruction_stats: Option<DishObstructionStats>,
    #[prost(message, optional, tag = "1005")]
    pub alerts: Option<DishAlerts>,
    #[prost(float, tag = "1007")]
    pub downlink_throughput_bps: f32,
    #[prost(float, tag = "1008")]
    pub uplink_throughput_bps: f32,
    #[prost(float, tag = "1009")]
    pub pop_ping_latency_ms: f32,
    #[prost(float, tag = "1011")]
    pub boresight_azimuth_deg: f32,
    #[prost(float, tag = "1012")]
    pub boresight_elevation_deg: f32,
    #[prost(message, optional, tag = "1014")]
    pub outage: Option<DishOutage>,
    #[prost(message, optional, tag = "1015")]
    pub gps_stats: Option<DishGpsStats>,
    #[prost(int32, tag = "1016")]
    pub eth_speed_mbps: i32,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct DishObstructionStats {
    #[prost(float, tag = "1")]
    pub fraction_obstructed: f32,
    #[prost(float, tag = "4")]
    pub valid_s: f32,
    #[prost(bool, tag = "5")]
    pub currently_obstructed: bool,
    #[prost(float, tag = "6")]
    pub avg_prolonged_obstruction_duration_s: f32,
    #[prost(float, tag = "7")]
    pub avg_prolonged_obstruction_interval_s: f32,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct DishAlerts {
    #[prost(bool, tag = "1")]
    pub motors_stuck: bool,
    #[prost(bool, tag = "2")]
    pub thermal_shutdown: bool,
    #[prost(bool, tag = "3")]
    pub thermal_throttle: bool,
    #[prost(bool, tag = "4")]
    pub unexpected_location: bool,
    #[prost(bool, tag = "5")]
    pub mast_not_near_vertical: bool,
    #[prost(bool, tag = "6")]
    pub slow_ethernet_speeds: bool,
    #[prost(bool, tag = "7")]
    pub roaming: bool,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct DishGpsStats {
    #[prost(bool, tag = "1")]
    pub gps_valid: bool,
    #[prost(uint32, tag = "2")]
    pub gps_sats: u32,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct DishOutage {
    #[prost(enumeration = "dish_outage::Cause", tag = "1")]
    pub cause: i32,
    #[prost(int64, tag = "2")]
    pub start_timestamp_ns: i64,
    #[prost(uint64, tag = "3")]
    pub duration_ns: u64,
    #[prost(bool, tag = "4")]
    pub did_switch: bool,
}

pub mod dish_outage {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Cause {
        Unknown = 0,
        Booting = 1,
        Stowed = 2,
        ThermalShutdown = 3,
        NoSchedule = 4,
        NoSats = 5,
        Obstructed = 6,
        NoDownlink = 7,
        NoPings = 8,
        ActuatorActivity = 9,
        CableTest = 10,
        Sleeping = 11,
    }

    impl Cause {
        /// Name of the cause as the dish reports it.
        pub fn as_str_name(self) -> &'static str {
            match self {
                Self::Unknown => "UNKNOWN",
                Self::Booting => "BOOTING",
                Self::Stowed => "STOWED",
                Self::ThermalShutdown => "THERMAL_SHUTDOWN",
                Self::NoSchedule => "NO_SCHEDULE",
                Self::NoSats => "NO_SATS",
                Self::Obstructed => "OBSTRUCTED",
                Self::NoDownlink => "NO_DOWNLINK",
                Self::NoPings => "NO_PINGS",
                Self::ActuatorActivity => "ACTUATOR_ACTIVITY",
                Self::CableTest => "CABLE_TEST",
                Self::Sleeping => "SLEEPING",
            }
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DishGetHistoryResponse {
    #[prost(uint64, tag = "1")]
    pub current: u64,
    #[prost(float, repeated, tag = "1001")]
    pub pop_ping_drop_rate: Vec<f32>,
    #[prost(float, repeated, tag = "1002")]
    pub pop_ping_latency_ms: Vec<f32>,
    #[prost(message, repeated, tag = "1009")]
    pub outages: Vec<DishOutage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_history_response_decodes_from_wrapped_response() {
        let response = Response {
            id: 7,
            api_version: 12,
            response: Some(response::Response::DishGetHistory(DishGetHistoryResponse {
                current: 900,
                pop_ping_drop_rate: vec![0.0, 0.5],
                pop_ping_latency_ms: vec![31.5, 42.0],
                outages: vec![DishOutage {
                    cause: dish_outage::Cause::Obstructed as i32,
                    start_timestamp_ns: 1_650_000_000_000_000_000,
                    duration_ns: 2_500_000_000,
                    did_switch: true,
                }],
            })),
        };

        let bytes = response.encode_to_vec();
        let decoded = Response::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_device_info_decodes_dish_field_numbers() {
        let mut bytes = vec![0x0a, 4];
        bytes.extend_from_slice(b"ut01");
        // is_dev = true, bootcount = 42
        bytes.extend_from_slice(&[0x38, 0x01, 0x40, 42]);
        bytes.extend_from_slice(&[0x5a, 11]);
        bytes.extend_from_slice(b"rev3_proto2");

        let info = DeviceInfo::decode(bytes.as_slice()).unwrap();
        assert_eq!(info.id, "ut01");
        assert!(info.is_dev);
        assert_eq!(info.bootcount, 42);
        assert_eq!(info.manufactured_version, "rev3_proto2");
    }

    #[test]
    fn test_unknown_cause_falls_back() {
        let outage = DishOutage {
            cause: 99,
            ..Default::default()
        };
        assert_eq!(outage.cause(), dish_outage::Cause::Unknown);
        assert_eq!(dish_outage::Cause::NoSats.as_str_name(), "NO_SATS");
    }
}
