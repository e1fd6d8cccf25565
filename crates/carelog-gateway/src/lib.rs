//! # carelog-gateway
//!
//! The REST seam of the carelog workspace.
//!
//! This crate provides:
//! - [`GatewaySettings`] — TOML/env configuration (base URL, timeout,
//!   frequency preset suggestions)
//! - [`HttpGateway`] — the blocking HTTP implementation of
//!   `PracticeGateway`
//! - [`InMemoryGateway`] — a deterministic in-process backend for tests and
//!   the demo CLI

pub mod http;
pub mod memory;
pub mod settings;

pub use http::HttpGateway;
pub use memory::InMemoryGateway;
pub use settings::GatewaySettings;
