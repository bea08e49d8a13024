//! takeout-core — order orchestration core for a food-delivery
//! marketplace.
//!
//! # Modules
//!
//! - [`core_types`] - shared id/money type aliases
//! - [`config`] - environment-driven configuration
//! - [`db`] - PostgreSQL connection management (C1)
//! - [`cache`] - Redis cache, pub/sub, and work queues (C2)
//! - [`order`] - Order State Machine (C3)
//! - [`dispatch`] - Dispatch Engine (C4)
//! - [`group`] - Chat Group Provisioner (C5)
//! - [`message`] - chat persistence and send/list
//! - [`product`] - product inventory and Stock Reservation (C8)
//! - [`rider`] - courier directory
//! - [`shop`] - merchant directory
//! - [`auth`] - credential issuance and bearer-token verification
//! - [`cleanup`] - Cleanup Scheduler (C6)
//! - [`gateway`] - HTTP surface
//! - [`error`] - crate-wide API error type
//! - [`logging`] - structured logging setup

// Core types - must be first!
pub mod core_types;

// Configuration, errors, logging
pub mod config;
pub mod error;
pub mod logging;

// Durable store and cache
pub mod db;

pub mod cache;

// Domain modules
pub mod auth;
pub mod cleanup;
pub mod dispatch;
pub mod gateway;
pub mod group;
pub mod message;
pub mod order;
pub mod product;
pub mod rider;
pub mod shop;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use core_types::{GroupId, MessageId, Money, OrderId, ProductId, RiderId, ShopId, UserId};
pub use error::{ApiError, ApiErrorCode};
