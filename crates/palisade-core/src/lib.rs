//! # palisade-core
//!
//! Shared primitives for the Palisade compliance gateway.
//!
//! This crate provides the foundational types used across all Palisade
//! components:
//!
//! - **Error Types**: Shared error taxonomy and result alias
//! - **Storage Backends**: Keyed durable storage (filesystem, in-memory)
//! - **Observability**: Logging initialization and span helpers
//!
//! ## Crate Boundary
//!
//! `palisade-core` is the only crate allowed to define shared primitives.
//! The gateway crate builds its components on top of these contracts.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod observability;
pub mod storage;

pub use error::{Error, Result};
