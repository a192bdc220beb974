pub mod http_gateway;
pub mod log_sender;

pub use http_gateway::HttpPushGateway;
pub use log_sender::LogPushSender;
