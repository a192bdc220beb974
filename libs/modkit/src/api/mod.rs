//! HTTP API helpers shared by every REST adapter.

pub mod problem;
