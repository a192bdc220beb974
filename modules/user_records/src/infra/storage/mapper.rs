use anyhow::Context;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::contract::model::{Note, Profile, PushSubscription, Screen, UserRecord};
use crate::infra::storage::entity::{ActiveModel, Model as UserRecordEntity};

/// Column format of `push_subscription`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSubscription {
    endpoint: String,
    p256dh: String,
    auth: String,
    #[serde(default)]
    expiration_time: Option<i64>,
}

/// Convert a database entity to a contract model
pub fn entity_to_contract(entity: UserRecordEntity) -> UserRecord {
    let push_subscription = entity
        .push_subscription
        .as_deref()
        .and_then(|raw| match serde_json::from_str::<StoredSubscription>(raw) {
            Ok(s) => Some(PushSubscription {
                endpoint: s.endpoint,
                p256dh: s.p256dh,
                auth: s.auth,
                expiration_time: s.expiration_time,
            }),
            Err(e) => {
                warn!(user_id = %entity.user_id, error = %e, "ignoring unreadable push subscription");
                None
            }
        });

    UserRecord {
        user_id: entity.user_id,
        profile: Profile {
            first_name: entity.first_name,
            last_name: entity.last_name,
            job_title: entity.job_title,
            phone_number: entity.phone_number,
            birthday: entity.birthday,
            address: entity.address,
            days_alive: None,
        },
        note: Note {
            note_name: entity.note_name,
            note_body: entity.note_body,
        },
        screen: Screen {
            contact: entity.contact,
            url: entity.url,
            screenshot_ref: entity.screenshot_ref,
        },
        command: entity.command,
        created_at: Some(entity.created_at),
        updated_at: entity.updated_at,
        profile_updated_at: entity.profile_updated_at,
        note_updated_at: entity.note_updated_at,
        screen_updated_at: entity.screen_updated_at,
        command_updated_at: entity.command_updated_at,
        push_subscription,
    }
}

/// Full active model for insert or whole-row update.
pub fn contract_to_active(record: &UserRecord) -> anyhow::Result<ActiveModel> {
    let created_at = record
        .created_at
        .context("record must be stamped with created_at before it is persisted")?;

    let push_subscription = record
        .push_subscription
        .as_ref()
        .map(|s| {
            serde_json::to_string(&StoredSubscription {
                endpoint: s.endpoint.clone(),
                p256dh: s.p256dh.clone(),
                auth: s.auth.clone(),
                expiration_time: s.expiration_time,
            })
        })
        .transpose()
        .context("serialize push subscription")?;

    Ok(ActiveModel {
        user_id: Set(record.user_id.clone()),
        first_name: Set(record.profile.first_name.clone()),
        last_name: Set(record.profile.last_name.clone()),
        job_title: Set(record.profile.job_title.clone()),
        phone_number: Set(record.profile.phone_number.clone()),
        birthday: Set(record.profile.birthday.clone()),
        address: Set(record.profile.address.clone()),
        note_name: Set(record.note.note_name.clone()),
        note_body: Set(record.note.note_body.clone()),
        contact: Set(record.screen.contact.clone()),
        url: Set(record.screen.url.clone()),
        screenshot_ref: Set(record.screen.screenshot_ref.clone()),
        command: Set(record.command.clone()),
        push_subscription: Set(push_subscription),
        created_at: Set(created_at),
        updated_at: Set(record.updated_at),
        profile_updated_at: Set(record.profile_updated_at),
        note_updated_at: Set(record.note_updated_at),
        screen_updated_at: Set(record.screen_updated_at),
        command_updated_at: Set(record.command_updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::ActiveValue;

    #[test]
    fn unstamped_record_is_rejected() {
        assert!(contract_to_active(&UserRecord::empty("Jordan")).is_err());
    }

    #[test]
    fn subscription_is_stored_as_json() {
        let mut r = UserRecord::empty("Jordan");
        r.created_at = Some(Utc::now());
        r.push_subscription = Some(PushSubscription {
            endpoint: "https://push.example.com/abc".into(),
            p256dh: "key".into(),
            auth: "secret".into(),
            expiration_time: None,
        });

        let am = contract_to_active(&r).unwrap();
        let ActiveValue::Set(Some(raw)) = am.push_subscription else {
            panic!("push_subscription not set");
        };
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["endpoint"], "https://push.example.com/abc");
        assert_eq!(v["auth"], "secret");
    }
}
