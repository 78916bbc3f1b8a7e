//! REST client for the delivery platform.
//!
//! This crate is the only place that talks HTTP. It knows how to authenticate,
//! attach the account identifier to every call, and turn error responses into
//! [`PlatformError::Api`]. It deliberately knows nothing about entity kinds;
//! payloads travel as `serde_json::Value` trees or raw YAML text.
//!
//! ## Features
//!
//! - **HTTP Client**: GET/POST/DELETE helpers with JSON or YAML request bodies
//! - **Scope**: the organization+project pair every project-level call targets
//! - **Call accounting**: a running count of remote calls for run summaries

mod client;
mod error;
mod types;

pub use client::{ClientConfig, PlatformClient, Query};
pub use error::PlatformError;
pub use types::{ErrorBody, Scope, single_line};
