use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::contract::model::{Note, PushMessage, PushSubscription};
use crate::domain::error::DomainError;
use crate::domain::ports::{PushError, PushSender};

/// Title used when the note has no name.
pub const DEFAULT_TITLE: &str = "Note updated";

/// Subscription validation and fire-and-forget delivery.
pub struct PushRegistry {
    sender: Arc<dyn PushSender>,
}

impl PushRegistry {
    pub fn new(sender: Arc<dyn PushSender>) -> Self {
        Self { sender }
    }

    pub fn validate(&self, subscription: &PushSubscription) -> Result<(), DomainError> {
        let endpoint = Url::parse(&subscription.endpoint).map_err(|e| {
            DomainError::validation("subscription.endpoint", format!("invalid URL: {e}"))
        })?;
        if !matches!(endpoint.scheme(), "https" | "http") {
            return Err(DomainError::validation(
                "subscription.endpoint",
                "endpoint must be an http(s) URL",
            ));
        }
        if subscription.p256dh.trim().is_empty() {
            return Err(DomainError::validation(
                "subscription.keys.p256dh",
                "must not be empty",
            ));
        }
        if subscription.auth.trim().is_empty() {
            return Err(DomainError::validation(
                "subscription.keys.auth",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Deliver `message`; failures are logged and never reach the caller.
    pub async fn notify(&self, user_id: &str, subscription: &PushSubscription, message: PushMessage) {
        match self.sender.send(subscription, &message).await {
            Ok(()) => info!(%user_id, title = %message.title, "push notification sent"),
            Err(PushError::Expired { status }) => {
                warn!(%user_id, status, "push subscription expired; notification dropped")
            }
            Err(e) => warn!(%user_id, error = %e, "push notification failed"),
        }
    }
}

/// Notification for a note write, or `None` when nothing worth announcing
/// changed: a field must differ from before and be non-null afterwards.
pub fn note_notification(before: &Note, after: &Note) -> Option<PushMessage> {
    let changed = |old: &Option<String>, new: &Option<String>| new.is_some() && old != new;
    if !changed(&before.note_name, &after.note_name) && !changed(&before.note_body, &after.note_body)
    {
        return None;
    }
    Some(PushMessage {
        title: after
            .note_name
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        body: after.note_body.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(name: Option<&str>, body: Option<&str>) -> Note {
        Note {
            note_name: name.map(str::to_owned),
            note_body: body.map(str::to_owned),
        }
    }

    #[test]
    fn new_body_triggers_notification() {
        let msg = note_notification(&note(None, None), &note(None, Some("Buy milk"))).unwrap();
        assert_eq!(msg.title, DEFAULT_TITLE);
        assert_eq!(msg.body, "Buy milk");
    }

    #[test]
    fn unchanged_or_cleared_note_is_silent() {
        let n = note(Some("Groceries"), Some("Buy milk"));
        assert_eq!(note_notification(&n, &n.clone()), None);
        assert_eq!(note_notification(&n, &note(None, None)), None);
    }

    #[test]
    fn name_change_uses_name_as_title() {
        let msg = note_notification(
            &note(Some("Old"), Some("Buy milk")),
            &note(Some("Groceries"), Some("Buy milk")),
        )
        .unwrap();
        assert_eq!(msg.title, "Groceries");
        assert_eq!(msg.body, "Buy milk");
    }

    struct NoopSender;

    #[async_trait::async_trait]
    impl PushSender for NoopSender {
        async fn send(&self, _: &PushSubscription, _: &PushMessage) -> Result<(), PushError> {
            Ok(())
        }
    }

    #[test]
    fn subscription_validation() {
        let registry = PushRegistry::new(Arc::new(NoopSender));
        let mut sub = PushSubscription {
            endpoint: "https://push.example.com/send/abc".into(),
            p256dh: "BNcRd".into(),
            auth: "tBHI".into(),
            expiration_time: None,
        };
        assert!(registry.validate(&sub).is_ok());

        sub.endpoint = "not a url".into();
        assert!(matches!(
            registry.validate(&sub),
            Err(DomainError::Validation { .. })
        ));

        sub.endpoint = "https://push.example.com/send/abc".into();
        sub.auth = " ".into();
        assert!(registry.validate(&sub).is_err());
    }
}
