use async_trait::async_trait;
use thiserror::Error;

use crate::contract::model::{PushMessage, PushSubscription};

#[derive(Error, Debug)]
pub enum PushError {
    /// The push service reported the subscription as gone (404/410).
    #[error("subscription expired (status {status})")]
    Expired { status: u16 },

    #[error("push rejected (status {status})")]
    Rejected { status: u16 },

    #[error("push transport error: {0}")]
    Transport(String),
}

/// Outbound delivery of a notification to one browser subscription.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), PushError>;
}
