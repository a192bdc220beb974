use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// One row per user; the four splits are flattened into nullable columns.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    // profile
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub phone_number: Option<String>,
    pub birthday: Option<String>,
    pub address: Option<String>,

    // note
    pub note_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note_body: Option<String>,

    // screen
    pub contact: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub url: Option<String>,
    pub screenshot_ref: Option<String>,

    // command
    #[sea_orm(column_type = "Text", nullable)]
    pub command: Option<String>,

    /// Serialized push subscription JSON.
    #[sea_orm(column_type = "Text", nullable)]
    pub push_subscription: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub profile_updated_at: Option<DateTime<Utc>>,
    pub note_updated_at: Option<DateTime<Utc>>,
    pub screen_updated_at: Option<DateTime<Utc>>,
    pub command_updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
