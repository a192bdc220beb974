//! HTTP utilities for modkit

pub mod client;
