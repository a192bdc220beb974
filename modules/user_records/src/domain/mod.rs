pub mod error;
pub mod locks;
pub mod merge;
pub mod ports;
pub mod push;
pub mod repo;
pub mod screenshots;
pub mod service;
pub mod timestamps;
