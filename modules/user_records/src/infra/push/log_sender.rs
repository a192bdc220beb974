use async_trait::async_trait;
use tracing::info;

use crate::contract::model::{PushMessage, PushSubscription};
use crate::domain::ports::{PushError, PushSender};

/// Used when no push gateway is configured: records what would have been sent.
#[derive(Debug, Default, Clone)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), PushError> {
        let host = url::Url::parse(&subscription.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_default();
        info!(
            push_host = %host,
            title = %message.title,
            "push gateway not configured; notification logged only"
        );
        Ok(())
    }
}
