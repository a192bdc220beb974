use std::time::Duration;

use async_trait::async_trait;
use modkit::TracedClient;
use serde::Serialize;
use url::Url;

use crate::contract::model::{PushMessage, PushSubscription};
use crate::domain::ports::{PushError, PushSender};

/// Hands notifications to a Web Push relay over HTTP.
///
/// The relay holds the VAPID private key and does the payload encryption;
/// this adapter only forwards subscription, payload and VAPID subject.
#[derive(Clone)]
pub struct HttpPushGateway {
    client: TracedClient,
    endpoint: Url,
    vapid_subject: String,
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    subscription: WireSubscription<'a>,
    payload: WirePayload<'a>,
    vapid_subject: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSubscription<'a> {
    endpoint: &'a str,
    expiration_time: Option<i64>,
    keys: WireKeys<'a>,
}

#[derive(Serialize)]
struct WireKeys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}

#[derive(Serialize)]
struct WirePayload<'a> {
    title: &'a str,
    body: &'a str,
}

impl HttpPushGateway {
    pub fn new(endpoint: Url, vapid_subject: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: TracedClient::with_timeout(timeout)?,
            endpoint,
            vapid_subject,
        })
    }
}

#[async_trait]
impl PushSender for HttpPushGateway {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), PushError> {
        let body = GatewayRequest {
            subscription: WireSubscription {
                endpoint: &subscription.endpoint,
                expiration_time: subscription.expiration_time,
                keys: WireKeys {
                    p256dh: &subscription.p256dh,
                    auth: &subscription.auth,
                },
            },
            payload: WirePayload {
                title: &message.title,
                body: &message.body,
            },
            vapid_subject: &self.vapid_subject,
        };

        let resp = self
            .client
            .post_json(self.endpoint.as_str(), &body)
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        match status {
            200..=299 => Ok(()),
            404 | 410 => Err(PushError::Expired { status }),
            _ => Err(PushError::Rejected { status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn subscription() -> PushSubscription {
        PushSubscription {
            endpoint: "https://fcm.googleapis.com/fcm/send/abc".into(),
            p256dh: "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM".into(),
            auth: "tBHItJI5svbpez7KI4CCXg".into(),
            expiration_time: None,
        }
    }

    fn message() -> PushMessage {
        PushMessage {
            title: "Groceries".into(),
            body: "Buy milk".into(),
        }
    }

    #[tokio::test]
    async fn forwards_subscription_and_payload() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST).path("/push").json_body(json!({
                "subscription": {
                    "endpoint": "https://fcm.googleapis.com/fcm/send/abc",
                    "expirationTime": null,
                    "keys": {
                        "p256dh": "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM",
                        "auth": "tBHItJI5svbpez7KI4CCXg"
                    }
                },
                "payload": { "title": "Groceries", "body": "Buy milk" },
                "vapid_subject": "mailto:admin@sensus-app.com"
            }));
            then.status(201);
        });

        let gw = HttpPushGateway::new(
            Url::parse(&server.url("/push")).unwrap(),
            "mailto:admin@sensus-app.com".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        gw.send(&subscription(), &message()).await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn gone_subscription_maps_to_expired() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/push");
            then.status(410);
        });

        let gw = HttpPushGateway::new(
            Url::parse(&server.url("/push")).unwrap(),
            "mailto:admin@sensus-app.com".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = gw.send(&subscription(), &message()).await.unwrap_err();
        assert!(matches!(err, PushError::Expired { status: 410 }));
    }

    #[tokio::test]
    async fn server_error_maps_to_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/push");
            then.status(500);
        });

        let gw = HttpPushGateway::new(
            Url::parse(&server.url("/push")).unwrap(),
            "mailto:admin@sensus-app.com".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = gw.send(&subscription(), &message()).await.unwrap_err();
        assert!(matches!(err, PushError::Rejected { status: 500 }));
    }
}
