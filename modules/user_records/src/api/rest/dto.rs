use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{
    CommandPatch, NotePatch, ProfilePatch, PushSubscription, ScreenPatch, UserRecord,
};

/// Distinguishes a missing key (`None`) from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
fn patch_field<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// ---------- responses ----------

/// Profile split (`data_peek`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub phone_number: Option<String>,
    /// `YYYY-MM-DD`
    pub birthday: Option<String>,
    pub address: Option<String>,
    /// Days since `birthday`, computed at read time.
    pub days_alive: Option<i64>,
    pub profile_updated_at: Option<DateTime<Utc>>,
}

/// Note split (`note_peek`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteDto {
    pub note_name: Option<String>,
    pub note_body: Option<String>,
    pub note_updated_at: Option<DateTime<Utc>>,
}

/// Screen split (`screen_peek`). Bytes are served from `/screen_peek/{id}/screenshot`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScreenDto {
    pub contact: Option<String>,
    pub url: Option<String>,
    pub has_screenshot: bool,
    pub screenshot_ref: Option<String>,
    pub screen_updated_at: Option<DateTime<Utc>>,
}

/// Command split (`commands`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommandDto {
    pub command: Option<String>,
    pub command_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRecordDto {
    pub user_id: String,
    pub profile: ProfileDto,
    pub note: NoteDto,
    pub screen: ScreenDto,
    pub command: CommandDto,
    /// `null` for a user that has never been written.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub push_subscribed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusDto {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VapidKeyDto {
    pub public_key: String,
}

// ---------- requests ----------

/// Partial profile update: omitted keys are kept, `null` clears.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProfileReq {
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub job_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub birthday: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateNoteReq {
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub note_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub note_body: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCommandReq {
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub command: Option<Option<String>>,
}

/// JSON form of a screen update. Multipart form-data with a `screenshot`
/// file part and `contact` / `url` text parts is accepted as well.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateScreenReq {
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub contact: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub url: Option<Option<String>>,
    /// Base64 PNG/JPEG, optionally as a `data:image/...;base64,` URL.
    #[serde(default, alias = "screenshot_base64")]
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PushKeysDto {
    pub p256dh: String,
    pub auth: String,
}

/// `PushSubscription.toJSON()` as produced by browsers.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PushSubscriptionDto {
    pub endpoint: String,
    pub keys: PushKeysDto,
    #[serde(default, rename = "expirationTime", alias = "expiration_time")]
    pub expiration_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubscribeReq {
    pub subscription: PushSubscriptionDto,
}

// Conversion implementations between REST DTOs and contract models

impl From<&UserRecord> for ProfileDto {
    fn from(r: &UserRecord) -> Self {
        Self {
            first_name: r.profile.first_name.clone(),
            last_name: r.profile.last_name.clone(),
            job_title: r.profile.job_title.clone(),
            phone_number: r.profile.phone_number.clone(),
            birthday: r.profile.birthday.clone(),
            address: r.profile.address.clone(),
            days_alive: r.profile.days_alive,
            profile_updated_at: r.profile_updated_at,
        }
    }
}

impl From<&UserRecord> for NoteDto {
    fn from(r: &UserRecord) -> Self {
        Self {
            note_name: r.note.note_name.clone(),
            note_body: r.note.note_body.clone(),
            note_updated_at: r.note_updated_at,
        }
    }
}

impl From<&UserRecord> for ScreenDto {
    fn from(r: &UserRecord) -> Self {
        Self {
            contact: r.screen.contact.clone(),
            url: r.screen.url.clone(),
            has_screenshot: r.has_screenshot(),
            screenshot_ref: r.screen.screenshot_ref.clone(),
            screen_updated_at: r.screen_updated_at,
        }
    }
}

impl From<&UserRecord> for CommandDto {
    fn from(r: &UserRecord) -> Self {
        Self {
            command: r.command.clone(),
            command_updated_at: r.command_updated_at,
        }
    }
}

impl From<&UserRecord> for UserRecordDto {
    fn from(r: &UserRecord) -> Self {
        Self {
            user_id: r.user_id.clone(),
            profile: r.into(),
            note: r.into(),
            screen: r.into(),
            command: r.into(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            push_subscribed: r.push_subscription.is_some(),
        }
    }
}

impl From<UpdateProfileReq> for ProfilePatch {
    fn from(req: UpdateProfileReq) -> Self {
        Self {
            first_name: req.first_name.into(),
            last_name: req.last_name.into(),
            job_title: req.job_title.into(),
            phone_number: req.phone_number.into(),
            birthday: req.birthday.into(),
            address: req.address.into(),
        }
    }
}

impl From<UpdateNoteReq> for NotePatch {
    fn from(req: UpdateNoteReq) -> Self {
        Self {
            note_name: req.note_name.into(),
            note_body: req.note_body.into(),
        }
    }
}

impl From<UpdateCommandReq> for CommandPatch {
    fn from(req: UpdateCommandReq) -> Self {
        Self {
            command: req.command.into(),
        }
    }
}

impl UpdateScreenReq {
    pub fn patch(&self) -> ScreenPatch {
        ScreenPatch {
            contact: self.contact.clone().into(),
            url: self.url.clone().into(),
        }
    }
}

impl From<PushSubscriptionDto> for PushSubscription {
    fn from(dto: PushSubscriptionDto) -> Self {
        Self {
            endpoint: dto.endpoint,
            p256dh: dto.keys.p256dh,
            auth: dto.keys.auth,
            expiration_time: dto.expiration_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::Patch;
    use serde_json::json;

    #[test]
    fn missing_null_and_value_are_distinct() {
        let req: UpdateProfileReq =
            serde_json::from_value(json!({ "job_title": "Magician", "address": null })).unwrap();
        let patch = ProfilePatch::from(req);

        assert_eq!(patch.first_name, Patch::Absent);
        assert_eq!(patch.address, Patch::Null);
        assert_eq!(patch.job_title, Patch::Value("Magician".to_string()));
    }

    #[test]
    fn subscription_accepts_browser_shape() {
        let req: SubscribeReq = serde_json::from_value(json!({
            "subscription": {
                "endpoint": "https://push.example.com/abc",
                "expirationTime": null,
                "keys": { "p256dh": "k", "auth": "a" }
            }
        }))
        .unwrap();
        let sub = PushSubscription::from(req.subscription);
        assert_eq!(sub.p256dh, "k");
        assert_eq!(sub.expiration_time, None);
    }

    #[test]
    fn screen_json_accepts_legacy_field_name() {
        let req: UpdateScreenReq =
            serde_json::from_value(json!({ "screenshot_base64": "iVBORw0K" })).unwrap();
        assert_eq!(req.screenshot.as_deref(), Some("iVBORw0K"));
        assert!(req.patch().contact.is_absent());
    }
}
