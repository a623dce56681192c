//! gRPC transport to the dish.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use super::data::{DeviceInfo, HistoryWindow, StatusSnapshot};
use super::proto::{self, request, response};
use crate::error::{ExporterError, Result};

/// Default bound on connecting to the dish and on each request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// The three calls a poll cycle makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    DeviceInfo,
    Status,
    History,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeviceInfo => "device_info",
            Self::Status => "status",
            Self::History => "history",
        }
    }

    fn payload(self) -> request::Request {
        match self {
            Self::DeviceInfo => request::Request::GetDeviceInfo(proto::GetDeviceInfoRequest {}),
            Self::Status => request::Request::GetStatus(proto::GetStatusRequest {}),
            Self::History => request::Request::GetHistory(proto::GetHistoryRequest {}),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timeouts applied to the dish connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_TIMEOUT,
            request: DEFAULT_TIMEOUT,
        }
    }
}

/// Typed access to the dish.
///
/// Every call is independent: a failure carries no state into the next call.
pub trait DishClient {
    /// Fetch identity and boot count.
    fn device_info(&mut self) -> impl Future<Output = Result<DeviceInfo>> + Send;

    /// Fetch the current status.
    fn status(&mut self) -> impl Future<Output = Result<StatusSnapshot>> + Send;

    /// Fetch the rolling history window.
    fn history(&mut self) -> impl Future<Output = Result<HistoryWindow>> + Send;
}

/// [`DishClient`] over a tonic channel.
#[derive(Debug, Clone)]
pub struct GrpcDishClient {
    grpc: Grpc<Channel>,
    endpoint: String,
    timeouts: Timeouts,
    next_id: u64,
}

impl GrpcDishClient {
    /// Open the channel, failing if the dish is not reachable within the
    /// connect timeout.
    pub async fn connect(endpoint: &str, timeouts: Timeouts) -> Result<Self> {
        let target = Endpoint::from_shared(format!("http://{endpoint}"))
            .map_err(|e| ExporterError::connect_error(endpoint, e))?
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request);

        debug!(endpoint, "Connecting to dish");
        let channel = tokio::time::timeout(timeouts.connect, target.connect())
            .await
            .map_err(|_| ExporterError::connect_error(endpoint, "connection timed out"))?
            .map_err(|e| ExporterError::connect_error(endpoint, e))?;
        info!(endpoint, "Connected to dish");

        Ok(Self {
            grpc: Grpc::new(channel),
            endpoint: endpoint.to_string(),
            timeouts,
            next_id: 1,
        })
    }

    /// Issue one `Handle` call and return the response payload.
    async fn handle(&mut self, kind: RequestKind) -> Result<response::Response> {
        let message = proto::Request {
            id: self.next_id,
            request: Some(kind.payload()),
        };
        self.next_id = self.next_id.wrapping_add(1);

        let timeout = self.timeouts.request;
        let grpc = &mut self.grpc;
        let call = async move {
            grpc.ready()
                .await
                .map_err(|e| tonic::Status::unavailable(format!("channel not ready: {e}")))?;
            let codec: ProstCodec<proto::Request, proto::Response> = ProstCodec::default();
            grpc.unary(
                tonic::Request::new(message),
                PathAndQuery::from_static(proto::HANDLE_PATH),
                codec,
            )
            .await
        };

        let reply = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| {
                debug!(endpoint = %self.endpoint, request = %kind, "Request timed out");
                ExporterError::Timeout { request: kind }
            })?
            .map_err(|source| ExporterError::Request {
                request: kind,
                source,
            })?;

        reply
            .into_inner()
            .response
            .ok_or_else(|| ExporterError::unexpected_response(kind, "response carried no payload"))
    }
}

impl DishClient for GrpcDishClient {
    async fn device_info(&mut self) -> Result<DeviceInfo> {
        match self.handle(RequestKind::DeviceInfo).await? {
            response::Response::GetDeviceInfo(reply) => reply
                .device_info
                .map(DeviceInfo::from)
                .ok_or_else(|| {
                    ExporterError::unexpected_response(RequestKind::DeviceInfo, "missing device_info")
                }),
            other => Err(mismatch(RequestKind::DeviceInfo, &other)),
        }
    }

    async fn status(&mut self) -> Result<StatusSnapshot> {
        match self.handle(RequestKind::Status).await? {
            response::Response::DishGetStatus(reply) => Ok(reply.into()),
            other => Err(mismatch(RequestKind::Status, &other)),
        }
    }

    async fn history(&mut self) -> Result<HistoryWindow> {
        match self.handle(RequestKind::History).await? {
            response::Response::DishGetHistory(reply) => Ok(reply.into()),
            other => Err(mismatch(RequestKind::History, &other)),
        }
    }
}

fn mismatch(kind: RequestKind, got: &response::Response) -> ExporterError {
    let variant = match got {
        response::Response::GetDeviceInfo(_) => "get_device_info",
        response::Response::DishGetStatus(_) => "dish_get_status",
        response::Response::DishGetHistory(_) => "dish_get_history",
    };
    ExporterError::unexpected_response(kind, format!("got {variant}"))
}
