//! Dish gRPC client and decoded device data.
//!
//! The dish answers a single unary RPC; this module hides the request
//! envelope behind the [`DishClient`] trait so the poller only sees the
//! decoded [`DeviceInfo`], [`StatusSnapshot`] and [`HistoryWindow`].

pub mod client;
pub mod data;
pub mod fake;
pub mod proto;

pub use client::{DishClient, GrpcDishClient, RequestKind, Timeouts};
pub use data::{
    DeviceIdentity, DeviceInfo, DishAlerts, HistoryWindow, OutageRecord, StatusSnapshot, ALERTS,
};
