//! # palisade-gateway
//!
//! Gateway service between compliance-assessment clients and the external
//! security-controls repository.
//!
//! This crate is responsible for:
//! - Serving framework/control catalogs through a cache-backed fetcher
//!   (read-through with unconditional refresh)
//! - Ingesting compliance-assessment submissions into durable per-record
//!   files, issuing a unique report identifier per submission
//! - Refreshing the framework catalog on a fixed cadence, unattended
//! - Forwarding assessment events to enterprise sinks (acknowledgment-only
//!   until a real downstream integration is specified)

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod forwarder;
pub mod routes;
pub mod scheduler;
pub mod server;
pub mod submissions;

pub use config::Config;
pub use server::{AppState, Server};
