//! # ModKit
//!
//! Shared plumbing for Sensus modules:
//!
//! - **contracts**: the traits a module implements to contribute routes and
//!   OpenAPI paths to the ingress host
//! - **api::problem**: RFC 9457 Problem Details responses
//! - **http::client**: traced outgoing HTTP client
//! - **runtime::shutdown**: OS-signal driven shutdown

pub mod api;
pub mod contracts;
pub mod http;
pub mod runtime;

pub use api::problem::{Problem, ProblemResponse, ValidationError};
pub use contracts::RestfulModule;
pub use http::client::TracedClient;
