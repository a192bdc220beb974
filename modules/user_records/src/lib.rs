// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === ERROR CATALOG ===
pub mod errors;

// === MODULE DEFINITION ===
pub mod module;
pub use module::UserRecords;

// === INTERNAL MODULES ===
// Exposed for integration tests; external consumers should stick to `contract`
// and `UserRecords`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
