pub mod shutdown;

pub use shutdown::{cancel_on_shutdown, wait_for_shutdown};
