use chrono::{DateTime, Utc};

/// One of the four independently mutable sections of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Profile,
    Note,
    Screen,
    Command,
}

impl Split {
    pub const ALL: [Split; 4] = [Split::Profile, Split::Note, Split::Screen, Split::Command];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Profile => "profile",
            Split::Note => "note",
            Split::Screen => "screen",
            Split::Command => "command",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state field of a partial update.
///
/// `Absent` leaves the stored value alone, `Null` clears it, `Value` overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Merge into a stored slot.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *slot = None,
            Patch::Value(v) => *slot = Some(v),
        }
    }
}

/// `None` = key missing, `Some(None)` = explicit null, `Some(Some(v))` = value.
impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(raw: Option<Option<T>>) -> Self {
        match raw {
            None => Patch::Absent,
            Some(None) => Patch::Null,
            Some(Some(v)) => Patch::Value(v),
        }
    }
}

/// Profile split (`data_peek` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub phone_number: Option<String>,
    /// `YYYY-MM-DD`
    pub birthday: Option<String>,
    pub address: Option<String>,
    /// Derived from `birthday` on every read; never persisted.
    pub days_alive: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub job_title: Patch<String>,
    pub phone_number: Patch<String>,
    pub birthday: Patch<String>,
    pub address: Patch<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub note_name: Option<String>,
    pub note_body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub note_name: Patch<String>,
    pub note_body: Patch<String>,
}

/// Screen split: metadata plus a weak reference to the stored screenshot asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub contact: Option<String>,
    pub url: Option<String>,
    pub screenshot_ref: Option<String>,
}

/// Metadata part of a screen update; screenshot bytes travel as [`ScreenshotUpload`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenPatch {
    pub contact: Patch<String>,
    pub url: Patch<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPatch {
    pub command: Patch<String>,
}

/// A partial update addressed to exactly one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitPatch {
    Profile(ProfilePatch),
    Note(NotePatch),
    Screen(ScreenPatch),
    Command(CommandPatch),
}

impl SplitPatch {
    pub fn split(&self) -> Split {
        match self {
            SplitPatch::Profile(_) => Split::Profile,
            SplitPatch::Note(_) => Split::Note,
            SplitPatch::Screen(_) => Split::Screen,
            SplitPatch::Command(_) => Split::Command,
        }
    }
}

/// Raw screenshot as received from a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotUpload {
    pub bytes: Vec<u8>,
    /// Content type claimed by the client; the sniffed format is authoritative.
    pub declared_content_type: Option<String>,
}

/// Screenshot read back from the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Browser push subscription (the `PushSubscription.toJSON()` shape).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub expiration_time: Option<i64>,
}

/// Notification content delivered to a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

/// Aggregate root: everything stored for one `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: String,
    pub profile: Profile,
    pub note: Note,
    pub screen: Screen,
    pub command: Option<String>,
    /// `None` only for a user that has never been written.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub profile_updated_at: Option<DateTime<Utc>>,
    pub note_updated_at: Option<DateTime<Utc>>,
    pub screen_updated_at: Option<DateTime<Utc>>,
    pub command_updated_at: Option<DateTime<Utc>>,
    pub push_subscription: Option<PushSubscription>,
}

impl UserRecord {
    /// The all-null record returned for users that were never written.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn exists(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn has_screenshot(&self) -> bool {
        self.screen.screenshot_ref.is_some()
    }

    pub fn split_updated_at(&self, split: Split) -> Option<DateTime<Utc>> {
        match split {
            Split::Profile => self.profile_updated_at,
            Split::Note => self.note_updated_at,
            Split::Screen => self.screen_updated_at,
            Split::Command => self.command_updated_at,
        }
    }
}
